//! Web service for Sanchar
//!
//! Upload, download and key email endpoints around the share registry.

pub mod config;
pub mod error;
pub mod mailer;
pub mod models;
pub mod routes;
pub mod state;
pub mod sweeper;
pub mod templates;

pub use routes::create_router;
pub use state::AppState;
