//! Database configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScaffoldError;

/// Filename that keeps the embedded engine entirely in memory.
pub const MEMORY_DB_NAME: &str = ":memory:";

/// Supported database kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbKind {
    Sqlite,
    Mysql,
    Postgres,
    Oracle,
}

impl DbKind {
    /// Well-known port of the client/server engines.
    pub fn default_port(self) -> Option<u16> {
        match self {
            DbKind::Sqlite => None,
            DbKind::Mysql => Some(3306),
            DbKind::Postgres => Some(5432),
            DbKind::Oracle => Some(1521),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DbKind::Sqlite => "sqlite",
            DbKind::Mysql => "mysql",
            DbKind::Postgres => "postgres",
            DbKind::Oracle => "oracle",
        }
    }
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbKind {
    type Err = ScaffoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(DbKind::Sqlite),
            "mysql" => Ok(DbKind::Mysql),
            "postgres" => Ok(DbKind::Postgres),
            "oracle" => Ok(DbKind::Oracle),
            other => Err(ScaffoldError::Configuration(format!(
                "unknown database kind '{}'",
                other
            ))),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Database kind (DB_TYPE)
    pub kind: DbKind,
    /// Server host (DB_HOST)
    pub host: String,
    /// Server port (DB_PORT), unset for the embedded engine
    pub port: Option<u16>,
    /// User name (DB_USER)
    pub user: Option<String>,
    /// Password (DB_PASSWORD)
    pub password: Option<String>,
    /// Database or file name (DB_NAME)
    pub name: Option<String>,
    /// Character set (DB_CHARSET)
    pub charset: String,
}

impl DbConfig {
    /// Returns the configuration with every default applied for `kind`.
    pub fn for_kind(kind: DbKind) -> Self {
        let name = match kind {
            DbKind::Sqlite => Some(MEMORY_DB_NAME.to_string()),
            _ => None,
        };
        Self {
            kind,
            host: "localhost".to_string(),
            port: kind.default_port(),
            user: None,
            password: None,
            name,
            charset: "utf8".to_string(),
        }
    }

    /// Builds a configuration from `DB_*` settings, applying defaults for absent keys.
    ///
    /// Unknown keys are ignored so the whole process environment can be passed in.
    pub fn from_settings<I, K, V>(settings: I) -> Result<Self, ScaffoldError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut kind = None;
        let mut host = None;
        let mut port = None;
        let mut user = None;
        let mut password = None;
        let mut name = None;
        let mut charset = None;

        for (key, value) in settings {
            let value: String = value.into();
            match key.as_ref() {
                "DB_TYPE" => kind = Some(value.parse::<DbKind>()?),
                "DB_HOST" => host = Some(value),
                "DB_PORT" => {
                    port = Some(value.trim().parse::<u16>().map_err(|e| {
                        ScaffoldError::Configuration(format!("invalid DB_PORT '{}': {}", value, e))
                    })?)
                }
                "DB_USER" => user = Some(value),
                "DB_PASSWORD" => password = Some(value),
                "DB_NAME" => name = Some(value),
                "DB_CHARSET" => charset = Some(value),
                _ => {}
            }
        }

        let mut config = Self::for_kind(kind.unwrap_or(DbKind::Sqlite));
        if let Some(host) = host {
            config.host = host;
        }
        if port.is_some() {
            config.port = port;
        }
        if user.is_some() {
            config.user = user;
        }
        if password.is_some() {
            config.password = password;
        }
        if name.is_some() {
            config.name = name;
        }
        if let Some(charset) = charset {
            config.charset = charset;
        }
        Ok(config)
    }

    /// Connection parameters in the shape each provider expects.
    pub fn connection(&self) -> ConnectionParams {
        let name = self.name.clone().unwrap_or_default();
        let port = self.port.or(self.kind.default_port()).unwrap_or_default();
        match self.kind {
            DbKind::Sqlite => ConnectionParams::Sqlite {
                filename: if name.is_empty() {
                    MEMORY_DB_NAME.to_string()
                } else {
                    name
                },
                create_db: true,
            },
            DbKind::Mysql => ConnectionParams::Mysql {
                host: self.host.clone(),
                port,
                user: self.user.clone(),
                passwd: self.password.clone(),
                db: name,
                charset: self.charset.clone(),
            },
            DbKind::Postgres => ConnectionParams::Postgres {
                host: self.host.clone(),
                port,
                user: self.user.clone(),
                password: self.password.clone(),
                database: name,
            },
            DbKind::Oracle => ConnectionParams::Oracle {
                dsn: format!(
                    "{}/{}@{}:{}/{}",
                    self.user.as_deref().unwrap_or_default(),
                    self.password.as_deref().unwrap_or_default(),
                    self.host,
                    port,
                    name
                ),
            },
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::for_kind(DbKind::Sqlite)
    }
}

/// Provider-specific connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionParams {
    Sqlite {
        filename: String,
        create_db: bool,
    },
    Mysql {
        host: String,
        port: u16,
        user: Option<String>,
        passwd: Option<String>,
        db: String,
        charset: String,
    },
    Postgres {
        host: String,
        port: u16,
        user: Option<String>,
        password: Option<String>,
        database: String,
    },
    Oracle {
        dsn: String,
    },
}
