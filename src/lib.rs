//! Library crate for the bingo operator console, exposing modules for the daemon binary and
//! integration tests.

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod transport;
