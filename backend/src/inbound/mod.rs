//! Inbound adapters that translate guest requests into portal calls while
//! keeping framework details at the edge.
//!
//! The browser-facing REST surface lives under [`http`].

pub mod http;
