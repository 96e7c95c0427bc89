//! Binds a unit of work to one execution context, such as one request.

use std::sync::Arc;

use super::database::Database;
use super::session::Session;
use crate::error::ScaffoldError;

/// Opens a session on first use and closes it at teardown.
#[derive(Debug)]
pub struct SessionScope {
    db: Arc<Database>,
    session: Option<Session>,
}

impl SessionScope {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db, session: None }
    }

    /// Session of this context, opened if none is open yet.
    pub fn session(&mut self) -> &mut Session {
        let db = &self.db;
        self.session.get_or_insert_with(|| {
            tracing::debug!("Opening session");
            db.session()
        })
    }

    /// Whether a session was opened in this context.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Closes the context: commits when `failed` is false, rolls back
    /// otherwise. A context that never opened a session has nothing to do.
    ///
    /// # Returns
    /// `Result<(), ScaffoldError>` carrying a commit failure.
    pub fn teardown(mut self, failed: bool) -> Result<(), ScaffoldError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        if failed {
            session.rollback();
            Ok(())
        } else {
            session.commit()
        }
    }
}

/// Runs `f` in a fresh session, committing on `Ok` and rolling back on `Err`.
///
/// A commit failure replaces the closure's result.
pub fn with_session<T, F>(db: &Arc<Database>, f: F) -> Result<T, ScaffoldError>
where
    F: FnOnce(&mut Session) -> Result<T, ScaffoldError>,
{
    let mut session = db.session();
    match f(&mut session) {
        Ok(value) => {
            session.commit()?;
            Ok(value)
        }
        Err(e) => {
            session.rollback();
            Err(e)
        }
    }
}
