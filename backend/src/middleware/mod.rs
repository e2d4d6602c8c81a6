//! Request middleware.
//!
//! Currently only request correlation: every portal request carries a trace
//! identifier that surfaces in logs, error payloads, and response headers.

pub mod trace;

pub use trace::{Trace, TraceId, TRACE_ID_HEADER};
