//! CRUD screens for every record type of a schema file.
//!
//! Loads the schema, opens the database described by the `DB_*` environment
//! settings, registers list/show/create/update/delete views for each record
//! type and serves them until Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use scaffold_api::{ApiConfig, Router, Server};
use scaffold_core::config::DbConfig;
use scaffold_core::forms::{ConverterRegistry, FormSynthesizer};
use scaffold_core::schema::Schema;
use scaffold_core::store::Database;
use tokio::signal;

/// Command-line arguments for the scaffold server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON schema file describing the record types
    schema: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Database or snapshot file name, overriding DB_NAME
    #[arg(long)]
    db_name: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt::init();

    let schema = Schema::from_json_file(&args.schema)
        .with_context(|| format!("Failed to load schema {}", args.schema.display()))?;

    let registry = Arc::new(ConverterRegistry::standard());
    registry.check_schema(&schema)?;

    let mut db_config = DbConfig::from_settings(std::env::vars())?;
    if let Some(name) = args.db_name {
        db_config.name = Some(name);
    }
    tracing::info!(kind = %db_config.kind.as_str(), name = ?db_config.name, "Opening database");
    let db = Arc::new(Database::open(schema, &db_config)?);

    let api_config = ApiConfig {
        request_timeout_ms: args.request_timeout_ms,
        ..ApiConfig::default()
    };
    let mut router = Router::new(Arc::clone(&db), api_config);
    router.register_all(&FormSynthesizer::new(registry))?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;

    Server::new(addr, router)
        .serve(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    Ok(())
}
