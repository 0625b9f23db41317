//! Compute module - Concurrent search machinery.

pub mod evolution;
