//! Transmission pacing: how often a channel may send, and how a best-effort
//! message is repeated over a lossy link.

pub mod rate_limiter;
pub mod repeat;
