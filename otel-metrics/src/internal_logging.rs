#![allow(unused_macros)]
//! Internal logging macros.
//!
//! `otel_info!`, `otel_warn!`, `otel_debug!` and `otel_error!` are meant for
//! the SDK itself and for custom batchers, selectors and exporters, not for
//! application logging. Every event carries a `name` identifying the
//! operation plus optional `key = value` attributes.
//!
//! With the `internal-logs` feature the events are emitted through `tracing`,
//! targeted at the crate that invokes the macro. Under `cfg(test)` they are
//! also printed to stdout, which shows up with `--nocapture`.

#[doc(hidden)]
#[macro_export]
macro_rules! __otel_log {
    ($level:ident, $label:literal, $name:expr $(, $key:ident = $value:expr)*) => {{
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::$level!(
                name: $name,
                target: env!("CARGO_PKG_NAME"),
                name = $name
                $(, $key = $value)*
            );
        }

        #[cfg(test)]
        {
            #[allow(unused_mut)]
            let mut line = format!("{}: name={}", $label, $name);
            $(
                line.push_str(&format!(", {}={}", stringify!($key), $value));
            )*
            println!("{line}");
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = ($name $(, $value)*);
        }
    }};
}

/// Logs at `info` level. Informational events, e.g. a batcher switching to stateful mode.
///
/// # Example:
/// ```rust
/// use otel_metrics::otel_info;
/// otel_info!(name: "batcher_built", stateful = true);
/// ```
#[macro_export]
macro_rules! otel_info {
    (name: $name:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__otel_log!(info, "otel_info", $name $(, $key = $value)*)
    };
}

/// Logs at `warn` level. Events that indicate lost data, e.g. a record that could not be merged.
///
/// # Example:
/// ```rust
/// use otel_metrics::otel_warn;
/// otel_warn!(name: "merge_failed", descriptor = "requests");
/// ```
#[macro_export]
macro_rules! otel_warn {
    (name: $name:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__otel_log!(warn, "otel_warn", $name $(, $key = $value)*)
    };
}

/// Logs at `debug` level. High-volume diagnostics, e.g. a dropped out-of-range measurement.
///
/// # Example:
/// ```rust
/// use otel_metrics::otel_debug;
/// otel_debug!(name: "measurement_dropped", reason = "NaN");
/// ```
#[macro_export]
macro_rules! otel_debug {
    (name: $name:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__otel_log!(debug, "otel_debug", $name $(, $key = $value)*)
    };
}

/// Logs at `error` level. Failures that abort a whole operation.
///
/// # Example:
/// ```rust
/// use otel_metrics::otel_error;
/// otel_error!(name: "collect_failed", error_code = 500);
/// ```
#[macro_export]
macro_rules! otel_error {
    (name: $name:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__otel_log!(error, "otel_error", $name $(, $key = $value)*)
    };
}
