//! Rate control: inter-request pacing, backoff, and response classification
//!
//! This module is a leaf; everything above it (session manager, search
//! resolver, review paginator) consults it to decide how long to wait and
//! whether a response is worth retrying.

mod backoff;
mod classify;

pub use backoff::BackoffPolicy;
pub use classify::{challenge_indicator, classify, Signal};
