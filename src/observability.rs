//! Crate-internal logging macros.
//!
//! Events go to `tracing` when the `tracing` feature is enabled, otherwise to `log` when
//! `logging` is enabled. With neither, the macros still type-check their format arguments
//! and emit nothing.

macro_rules! emit {
    ($level:ident, $($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        { tracing::$level!($($arg)*); }

        #[cfg(all(not(feature = "tracing"), feature = "logging"))]
        { log::$level!($($arg)*); }

        #[cfg(not(any(feature = "tracing", feature = "logging")))]
        { let _ = format_args!($($arg)*); }
    }};
}

macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::observability::emit!(debug, $($arg)*) };
}

macro_rules! log_info {
    ($($arg:tt)*) => { $crate::observability::emit!(info, $($arg)*) };
}

macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::observability::emit!(warn, $($arg)*) };
}

macro_rules! log_error {
    ($($arg:tt)*) => { $crate::observability::emit!(error, $($arg)*) };
}

pub(crate) use {emit, log_debug, log_error, log_info, log_warn};
