//! Constants used throughout the Veneer library.
//!
//! This module provides central definitions for reserved engine container
//! names. Replicas must agree on these strings for their deltas to target
//! the same shared types.

/// Reserved name of the root map every bound document lives under.
pub const ROOT: &str = "_root";

/// Reserved sequence key addressing an array's length in patch paths.
pub const LENGTH_KEY: &str = "length";
