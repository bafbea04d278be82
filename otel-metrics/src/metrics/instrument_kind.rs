/// Kinds of metric instruments
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// A synchronous instrument that adds its inputs into a sum.
    Counter,
    /// A synchronous instrument whose inputs replace the previous value.
    Gauge,
    /// A synchronous instrument recording a distribution of values.
    Measure,
    /// An asynchronous instrument, observed once per collection through a
    /// callback.
    Observer,
}

impl InstrumentKind {
    /// Whether this is a synchronous kind of instrument.
    pub fn synchronous(&self) -> bool {
        !self.asynchronous()
    }

    /// Whether this is an asynchronous kind of instrument.
    pub fn asynchronous(&self) -> bool {
        matches!(self, InstrumentKind::Observer)
    }

    /// Whether instruments of this kind are monotonic unless configured
    /// otherwise.
    pub fn default_monotonic(&self) -> bool {
        matches!(self, InstrumentKind::Counter)
    }
}
