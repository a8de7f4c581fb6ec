//! Single-port gRPC/HTTP multiplexer library.

pub mod config;
pub mod health;
pub mod http;
pub mod net;
pub mod rpc;

pub use config::MuxConfig;
pub use health::block_until_ready;
pub use http::{Server, ServerError};
