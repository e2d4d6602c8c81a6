//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **supabase**: reqwest client for the hosted auth and REST endpoints.
//! - **memory**: process-local backend for development and tests.
//!
//! Adapters are thin translators that convert between domain types and
//! wire representations. They contain no business logic.

pub mod memory;
pub mod supabase;
