//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

/// Default maximum state age in milliseconds.
pub const MAX_AGE_MS: u64 = 250;

/// Default lookup timeout in milliseconds.
pub const LOOKUP_TIMEOUT_MS: u64 = 5_000;

/// Warnings are printed unless disabled.
pub const WARNINGS: bool = true;
