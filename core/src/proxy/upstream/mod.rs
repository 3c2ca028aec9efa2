pub mod client;
pub mod endpoints;

pub use client::{FilePart, UpstreamClient, UpstreamReply};
pub use endpoints::{Endpoints, Variant};
