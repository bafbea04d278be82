use crate::metrics::{InstrumentKind, NumberKind, Unit};
use crate::Key;
use fnv::FnvHasher;
use std::hash::{Hash, Hasher};

/// Descriptor contains all the settings that describe an instrument, including
/// its name, instrument kind, number kind, and the configurable options.
///
/// Two descriptors built from the same settings are equal. Share them across
/// records with `Arc<Descriptor>`.
#[derive(Clone, Debug)]
pub struct Descriptor {
    name: String,
    instrument_kind: InstrumentKind,
    number_kind: NumberKind,
    keys: Vec<Key>,
    unit: Option<Unit>,
    description: Option<String>,
    monotonic: bool,
    attribute_hash: u64,
}

impl Descriptor {
    /// Create a new descriptor
    pub fn new<T: Into<String>>(
        name: T,
        instrument_kind: InstrumentKind,
        number_kind: NumberKind,
    ) -> Self {
        let mut descriptor = Descriptor {
            name: name.into(),
            instrument_kind,
            number_kind,
            keys: Vec::new(),
            unit: None,
            description: None,
            monotonic: instrument_kind.default_monotonic(),
            attribute_hash: 0,
        };
        descriptor.rehash();
        descriptor
    }

    /// Set the human-readable description.
    pub fn with_description<T: Into<String>>(mut self, description: T) -> Self {
        self.description = Some(description.into());
        self.rehash();
        self
    }

    /// Set the unit of measure.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self.rehash();
        self
    }

    /// Set the recommended label keys, used by batchers that group by them.
    pub fn with_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self.rehash();
        self
    }

    /// Override the monotonic flag.
    pub fn with_monotonic(mut self, monotonic: bool) -> Self {
        self.monotonic = monotonic;
        self.rehash();
        self
    }

    /// The metric instrument's name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The specific kind of instrument.
    pub fn instrument_kind(&self) -> &InstrumentKind {
        &self.instrument_kind
    }

    /// Whether this instrument is declared over `i64` or `f64` values.
    pub fn number_kind(&self) -> &NumberKind {
        &self.number_kind
    }

    /// Recommended label keys.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// A human-readable description of the metric instrument.
    pub fn description(&self) -> Option<&String> {
        self.description.as_ref()
    }

    /// Unit describes the units of the metric instrument.
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_ref().map(|unit| unit.as_ref())
    }

    /// Whether the instrument only moves upwards.
    pub fn monotonic(&self) -> bool {
        self.monotonic
    }

    /// `true` for instruments whose values are summed and must never be
    /// negative: monotonic counters and monotonic observers.
    pub fn monotonic_sum(&self) -> bool {
        self.monotonic
            && matches!(
                self.instrument_kind,
                InstrumentKind::Counter | InstrumentKind::Observer
            )
    }

    /// A hash of every descriptor setting.
    pub fn attribute_hash(&self) -> u64 {
        self.attribute_hash
    }

    fn rehash(&mut self) {
        let mut hasher = FnvHasher::default();
        self.name.hash(&mut hasher);
        self.instrument_kind.hash(&mut hasher);
        self.number_kind.hash(&mut hasher);
        self.keys.hash(&mut hasher);
        self.unit.hash(&mut hasher);
        self.description.hash(&mut hasher);
        self.monotonic.hash(&mut hasher);
        self.attribute_hash = hasher.finish();
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Descriptor) -> bool {
        self.attribute_hash == other.attribute_hash
            && self.name == other.name
            && self.instrument_kind == other.instrument_kind
            && self.number_kind == other.number_kind
            && self.keys == other.keys
            && self.unit == other.unit
            && self.description == other.description
            && self.monotonic == other.monotonic
    }
}

impl Eq for Descriptor {}

impl Hash for Descriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.attribute_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(InstrumentKind::Counter, true, true)]
    #[case(InstrumentKind::Gauge, false, false)]
    #[case(InstrumentKind::Measure, false, false)]
    #[case(InstrumentKind::Observer, false, false)]
    fn default_monotonicity(
        #[case] kind: InstrumentKind,
        #[case] monotonic: bool,
        #[case] monotonic_sum: bool,
    ) {
        let descriptor = Descriptor::new("d", kind, NumberKind::I64);
        assert_eq!(descriptor.monotonic(), monotonic);
        assert_eq!(descriptor.monotonic_sum(), monotonic_sum);
    }

    #[test]
    fn monotonic_observer_is_a_monotonic_sum() {
        let observer =
            Descriptor::new("o", InstrumentKind::Observer, NumberKind::F64).with_monotonic(true);
        assert!(observer.monotonic_sum());

        let gauge =
            Descriptor::new("g", InstrumentKind::Gauge, NumberKind::F64).with_monotonic(true);
        assert!(!gauge.monotonic_sum());
    }

    #[test]
    fn equality_is_by_content() {
        let a = Descriptor::new("requests", InstrumentKind::Counter, NumberKind::I64)
            .with_keys(["A", "C"])
            .with_unit(Unit::new("1"));
        let b = Descriptor::new("requests", InstrumentKind::Counter, NumberKind::I64)
            .with_keys(["A", "C"])
            .with_unit(Unit::new("1"));
        assert_eq!(a, b);
        assert_eq!(a.attribute_hash(), b.attribute_hash());

        let c = b.clone().with_description("other");
        assert_ne!(a, c);
        assert_ne!(a.attribute_hash(), c.attribute_hash());
        assert_eq!(c.description().map(String::as_str), Some("other"));
        assert_eq!(c.keys(), &[Key::new("A"), Key::new("C")]);
        assert_eq!(c.unit(), Some("1"));
    }
}
