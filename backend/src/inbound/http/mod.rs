//! HTTP inbound adapter exposing the portal REST endpoints.

pub mod error;
pub mod health;
pub mod portal;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;
