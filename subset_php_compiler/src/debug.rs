//! Environment-gated diagnostic logging
//!
//! - `SUBSET_PHP_ANALYZE_DEBUG`: per-variable facts after each function
//! - `SUBSET_PHP_CACHE_DEBUG`: compiled unit cache hits, misses and stores

use std::io::Write;
use std::sync::OnceLock;

/// Check if analysis debug logging is enabled via `SUBSET_PHP_ANALYZE_DEBUG`.
pub(crate) fn analyze_debug_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("SUBSET_PHP_ANALYZE_DEBUG").is_ok())
}

/// Check if cache debug logging is enabled via `SUBSET_PHP_CACHE_DEBUG`.
pub(crate) fn cache_debug_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("SUBSET_PHP_CACHE_DEBUG").is_ok())
}

/// Write one diagnostic line to stderr without relying on `eprintln!`.
pub(crate) fn debug_log(args: std::fmt::Arguments<'_>) {
    let _ = writeln!(std::io::stderr(), "{args}");
}
