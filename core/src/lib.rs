//! Nano Banana Proxy Core Library
//! Forwards image generation, edit and upload calls to fal, injecting the server-held key

pub mod config;
pub mod error;
pub mod proxy;

pub use error::GatewayError;
