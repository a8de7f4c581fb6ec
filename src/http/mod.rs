//! HTTP surface: protocol dispatch and listener lifecycle.

pub mod dispatch;
pub mod server;

pub use dispatch::HEALTH_PATH;
pub use server::{Server, ServerError};
