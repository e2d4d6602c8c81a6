//! Supabase outbound adapter.
//!
//! One reqwest client implements both driven ports: the identity half talks
//! to the GoTrue auth endpoints under `/auth/v1`, the directory half to the
//! PostgREST table under `/rest/v1`.

mod auth;
mod client;
mod dto;
mod rest;

pub use client::{SupabaseClient, SupabaseConfig};
