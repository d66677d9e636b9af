//! Internal logging shims.
//!
//! `std` routes to `tracing`, `debug-log` routes to `log` for `no_std` firmware.
//! With neither feature the arguments are type-checked and discarded.

macro_rules! fsm_trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "std")]
        ::tracing::trace!($($arg)*);
        #[cfg(all(feature = "debug-log", not(feature = "std")))]
        ::log::trace!($($arg)*);
        #[cfg(not(any(feature = "std", feature = "debug-log")))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

macro_rules! fsm_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "std")]
        ::tracing::warn!($($arg)*);
        #[cfg(all(feature = "debug-log", not(feature = "std")))]
        ::log::warn!($($arg)*);
        #[cfg(not(any(feature = "std", feature = "debug-log")))]
        let _ = ::core::format_args!($($arg)*);
    }};
}
