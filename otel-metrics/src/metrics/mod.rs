//! # Metrics API
//!
//! Instrument metadata ([`Descriptor`]), the numeric primitives measurements
//! are recorded with ([`Number`]) and the error type shared by the SDK.

use std::borrow::Cow;
use std::result;
use std::sync::PoisonError;
use thiserror::Error;

mod descriptor;
mod instrument_kind;
mod number;

pub use descriptor::Descriptor;
pub use instrument_kind::InstrumentKind;
pub use number::{AtomicF64, AtomicNumber, AtomicTracker, Number, NumberKind};

/// A specialized `Result` type for metric operations.
pub type Result<T> = result::Result<T, MetricsError>;

/// Errors returned by the metrics API and SDK.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MetricsError {
    /// Other errors not covered by specific cases.
    #[error("Metrics error: {0}")]
    Other(String),
    /// Invalid configuration
    #[error("Config error {0}")]
    Config(String),
    /// Errors when requesting quantiles out of the 0-1 range.
    #[error("The requested quantile is out of range")]
    InvalidQuantile,
    /// Errors when recording nan values.
    #[error("NaN value is an invalid input")]
    NaNInput,
    /// Errors when recording negative values in monotonic sums.
    #[error("Negative value is out of range for this instrument")]
    NegativeInput,
    /// Errors when recording a lower value into a monotonic gauge.
    #[error("Value is lower than the last value of a monotonic gauge")]
    NonMonotoneInput,
    /// Errors when merging aggregators of incompatible types.
    #[error("Inconsistent aggregator types: {0}")]
    InconsistentAggregator(String),
    /// Errors when recording a number whose kind differs from the instrument.
    #[error("Number kind {found:?} does not match instrument kind {expected:?}")]
    InconsistentNumberKind {
        /// The number kind declared by the instrument
        expected: NumberKind,
        /// The number kind of the measurement
        found: NumberKind,
    },
    /// Errors when requesting data when no data has been collected
    #[error("No data collected by this aggregator")]
    NoDataCollected,
}

impl<T> From<PoisonError<T>> for MetricsError {
    fn from(err: PoisonError<T>) -> Self {
        MetricsError::Other(err.to_string())
    }
}

/// Units denote underlying data units tracked by instruments.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash)]
pub struct Unit(Cow<'static, str>);

impl Unit {
    /// Create a new `Unit` from an `Into<String>`
    pub fn new<S>(value: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        Unit(value.into())
    }

    /// View unit as &str
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}

impl AsRef<str> for Unit {
    #[inline]
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}
