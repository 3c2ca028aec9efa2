//! Proxy module - forwarding gateway in front of the fal API

pub mod server;
pub mod handlers;
pub mod upstream;

pub use server::{build_router, AppState, ProxyServer};
