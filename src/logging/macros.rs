//! Emission macros.
//!
//! ```ignore
//! log_info!(logger, "listening on {}", addr);
//! log_warn!(logger, ctx: request.extensions(), "slow upstream: {}ms", ms);
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:expr, $logger:expr, ctx: $ctx:expr, $($arg:tt)+) => {
        $logger.emit(::core::option::Option::Some($ctx), $level, ::core::format_args!($($arg)+))
    };
    ($level:expr, $logger:expr, $($arg:tt)+) => {
        $logger.emit(::core::option::Option::None, $level, ::core::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_trace {
    ($($t:tt)+) => { $crate::__log_at!($crate::logging::Severity::Trace, $($t)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($($t:tt)+) => { $crate::__log_at!($crate::logging::Severity::Debug, $($t)+) };
}

#[macro_export]
macro_rules! log_info {
    ($($t:tt)+) => { $crate::__log_at!($crate::logging::Severity::Info, $($t)+) };
}

#[macro_export]
macro_rules! log_warn {
    ($($t:tt)+) => { $crate::__log_at!($crate::logging::Severity::Warn, $($t)+) };
}

#[macro_export]
macro_rules! log_error {
    ($($t:tt)+) => { $crate::__log_at!($crate::logging::Severity::Error, $($t)+) };
}

/// Emits at FATAL and then exits the process.
#[macro_export]
macro_rules! log_fatal {
    ($($t:tt)+) => { $crate::__log_at!($crate::logging::Severity::Fatal, $($t)+) };
}
