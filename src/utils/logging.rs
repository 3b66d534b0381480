//! Logging macros switched off per module.
//!
//! A module opts in by declaring `const ENABLE_LOGS: bool` and importing the
//! macros from the crate root:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_error, log_info};
//!
//! log_info!("Database initialized at {}", path.display());
//! ```
//!
//! Setting the flag to `false` silences the module without touching
//! `RUST_LOG`, which is handy for the noisy request log in `http`.

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Errors are gated too; `ServiceError::Internal` causes reach the log
/// through this macro.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn disabled_module_skips_formatting() {
        const ENABLE_LOGS: bool = false;
        let mut formatted = false;
        log_info!("{}", {
            formatted = true;
            "never"
        });
        assert!(!formatted);
    }
}
