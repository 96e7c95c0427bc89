//! Schema-first record store with transactional sessions.

mod change;
mod database;
mod record;
mod scope;
mod session;
mod table;

pub use change::Change;
pub use database::Database;
pub use record::{Record, RecordKey};
pub use scope::{with_session, SessionScope};
pub use session::Session;
pub use table::{Rows, Table};
