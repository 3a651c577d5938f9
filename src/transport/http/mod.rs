mod client;
mod config;
mod error;
mod models;

pub use client::HttpTransport;
pub use config::HttpTransportConfig;
pub use error::{HttpResult, HttpTransportError};
