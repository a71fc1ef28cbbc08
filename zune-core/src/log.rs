//! Namespaced logging macros.
//!
//! Downstream crates call `zune_core::log::{trace, debug, warn, error}!(...)`
//! rather than depending on `log` directly, so that logging can be switched
//! on or off for the whole `zune` family behind this crate's `log` feature.
//! With the feature off every macro expands to nothing, which keeps the
//! engine usable in builds that don't want the `log` dependency at all.

#[repr(usize)]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Level {
    Error = 1,
    Warn,
    Info,
    Debug,
    Trace
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_enabled {
    ($lvl:expr) => {{
        #[cfg(feature = "log")]
        {
            ::log::log_enabled!($lvl)
        }
        #[cfg(not(feature = "log"))]
        {
            let _ = $lvl;
            false
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __error {
    ($($arg:tt)+) => {
        #[cfg(feature = "log")]
        { ::log::error!($($arg)+); }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __warn {
    ($($arg:tt)+) => {
        #[cfg(feature = "log")]
        { ::log::warn!($($arg)+); }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __info {
    ($($arg:tt)+) => {
        #[cfg(feature = "log")]
        { ::log::info!($($arg)+); }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __debug {
    ($($arg:tt)+) => {
        #[cfg(feature = "log")]
        { ::log::debug!($($arg)+); }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __trace {
    ($($arg:tt)+) => {
        #[cfg(feature = "log")]
        { ::log::trace!($($arg)+); }
    };
}

// #[macro_export] is required to make macros work across crates, but it
// always puts the macro in the crate root. #[doc(hidden)] + "pub use" is a
// workaround to namespace a macro under `zune_core::log::*`.
pub use crate::__debug as debug;
pub use crate::__error as error;
pub use crate::__info as info;
pub use crate::__log_enabled as log_enabled;
pub use crate::__trace as trace;
pub use crate::__warn as warn;
