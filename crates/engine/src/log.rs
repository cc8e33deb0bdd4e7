//! Diagnostic logging
//!
//! Lines are written to stderr with a `[Match3]` prefix when `MATCH3_LOG` is `1` or `true`.
//! The variable is read once per process.

use std::sync::OnceLock;

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if diagnostic logging is enabled via environment
pub fn enabled() -> bool {
    *ENABLED.get_or_init(|| {
        std::env::var("MATCH3_LOG")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    })
}

/// Log a diagnostic line when `MATCH3_LOG` is set.
#[macro_export]
macro_rules! match3_log {
    ($($arg:tt)*) => {
        if $crate::log::enabled() {
            eprintln!("[Match3] {}", format_args!($($arg)*));
        }
    };
}
