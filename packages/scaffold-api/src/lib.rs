//! HTTP CRUD views for scaffold-core record types.
//!
//! Every registered record type gets list, show, create, update and delete
//! routes. Forms are synthesized from the record type's metadata and each
//! request runs in its own session.

pub mod config;
pub mod handlers;
pub mod render;
pub mod router;
pub mod server;
pub mod views;

pub use config::ApiConfig;
pub use render::{JsonRenderer, Renderer, ViewContext};
pub use router::{AppState, Router, RouterError};
pub use server::Server;
pub use views::{EntityViews, SuccessTarget, ViewKind};
