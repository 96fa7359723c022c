//! CLI command modules.

pub mod clients;
pub mod http;
