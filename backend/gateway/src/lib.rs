//! SignVision Gateway HTTP API Server
//!
//! Analyze endpoints, health and model listing, and front-end static hosting.

pub mod analyze;
pub mod error;
pub mod health_api;
pub mod mime;
pub mod models_api;
pub mod server;
pub mod state;
pub mod static_files;

pub use error::ApiError;
pub use server::{build_router, run, start_server};
pub use state::{GatewayState, build_provider, load_template, provider_settings};
