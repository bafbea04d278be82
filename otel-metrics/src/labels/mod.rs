//! Metric Labels
use crate::{Key, KeyValue, Value};
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

mod encoder;
pub use encoder::{default_encoder, new_encoder_id, DefaultLabelEncoder, Encoder, EncoderId};

const MAX_CONCURRENT_ENCODERS: usize = 3;
type CachedEncodings = [Option<(EncoderId, String)>; MAX_CONCURRENT_ENCODERS];

static EMPTY_SET: Lazy<LabelSet> = Lazy::new(|| LabelSet {
    inner: Arc::new(InnerSet::new(Vec::new())),
});

/// LabelSet is the representation for a distinct label set. It manages an
/// immutable set of labels, with an internal cache for storing label
/// encodings.
///
/// Labels are kept sorted by key and are unique by key; when the same key is
/// supplied more than once the last value wins. Two sets holding the same
/// labels are equal and hash identically regardless of the order in which the
/// labels were supplied.
///
/// Cloning is cheap, clones share both the labels and the encoding cache.
#[derive(Clone, Debug)]
pub struct LabelSet {
    inner: Arc<InnerSet>,
}

#[derive(Debug)]
struct InnerSet {
    labels: Vec<KeyValue>,
    hash: u64,
    cached_encodings: Mutex<CachedEncodings>,
}

impl InnerSet {
    fn new(labels: Vec<KeyValue>) -> Self {
        let mut hasher = DefaultHasher::new();
        hash_labels(&mut hasher, labels.iter());
        InnerSet {
            labels,
            hash: hasher.finish(),
            cached_encodings: Mutex::new([None, None, None]),
        }
    }
}

impl LabelSet {
    /// Construct a label set from any iterator of labels.
    pub fn from_labels<T: IntoIterator<Item = KeyValue>>(labels: T) -> Self {
        let mut sorted: Vec<KeyValue> = labels.into_iter().collect();
        if sorted.is_empty() {
            return LabelSet::default();
        }
        // stable, so duplicates keep their insertion order
        sorted.sort_by(|a, b| a.key.cmp(&b.key));

        let mut labels: Vec<KeyValue> = Vec::with_capacity(sorted.len());
        for kv in sorted {
            match labels.last_mut() {
                Some(last) if last.key == kv.key => *last = kv,
                _ => labels.push(kv),
            }
        }

        LabelSet {
            inner: Arc::new(InnerSet::new(labels)),
        }
    }

    /// The label set length.
    pub fn len(&self) -> usize {
        self.inner.labels.len()
    }

    /// Check if the set of labels is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.labels.is_empty()
    }

    /// Iterate over the label key value pairs in key order.
    pub fn iter(&self) -> std::slice::Iter<'_, KeyValue> {
        self.inner.labels.iter()
    }

    /// The value for `key`, if present.
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.inner
            .labels
            .binary_search_by(|kv| kv.key.cmp(key))
            .ok()
            .map(|idx| &self.inner.labels[idx].value)
    }

    /// Reduce the set to exactly `keys`. Keys the set does not hold are kept
    /// with an empty string value.
    pub fn project(&self, keys: &[Key]) -> LabelSet {
        LabelSet::from_labels(keys.iter().map(|key| {
            let value = self.get(key).cloned().unwrap_or_else(|| Value::from(""));
            KeyValue::new(key.clone(), value)
        }))
    }

    /// Encode the label set with the given encoder and cache the result.
    ///
    /// Up to three encoders are cached per set. Encoders with an invalid id
    /// are never cached.
    pub fn encoded(&self, encoder: Option<&dyn Encoder>) -> String {
        let encoder = match encoder {
            Some(encoder) if !self.is_empty() => encoder,
            _ => return String::new(),
        };

        let id = encoder.id();
        if !id.is_valid() {
            return encoder.encode(&mut self.iter());
        }

        let mut cached = match self.inner.cached_encodings.lock() {
            Ok(cached) => cached,
            Err(_) => return encoder.encode(&mut self.iter()),
        };

        if let Some((_, encoded)) = cached.iter().flatten().find(|(cid, _)| *cid == id) {
            return encoded.clone();
        }

        let encoded = encoder.encode(&mut self.iter());
        if let Some(slot) = cached.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some((id, encoded.clone()));
        }

        encoded
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        EMPTY_SET.clone()
    }
}

impl<T> From<T> for LabelSet
where
    T: AsRef<[KeyValue]>,
{
    fn from(kvs: T) -> Self {
        LabelSet::from_labels(kvs.as_ref().iter().cloned())
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a KeyValue;
    type IntoIter = std::slice::Iter<'a, KeyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for LabelSet {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        self.inner.hash == other.inner.hash
            && self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.key == b.key && value_eq(&a.value, &b.value))
    }
}

impl Eq for LabelSet {}

impl Hash for LabelSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.inner.hash)
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::F64(a), Value::F64(b)) => OrderedFloat(*a) == OrderedFloat(*b),
        (a, b) => a == b,
    }
}

/// Hash a sequence of labels, treating floats by their ordered representation.
pub fn hash_labels<'a, H: Hasher, I: IntoIterator<Item = &'a KeyValue>>(state: &mut H, labels: I) {
    for kv in labels {
        kv.key.hash(state);
        match &kv.value {
            Value::Bool(b) => b.hash(state),
            Value::I64(i) => i.hash(state),
            Value::F64(f) => OrderedFloat(*f).hash(state),
            Value::String(s) => s.hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn labels_are_sorted_and_unique_by_key() {
        let set = LabelSet::from(&[
            KeyValue::new("C", "D"),
            KeyValue::new("A", "x"),
            KeyValue::new("A", "B"),
        ]);
        let keys: Vec<&str> = set.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "C"]);
        assert_eq!(set.get(&Key::new("A")), Some(&Value::from("B")));
        assert_eq!(set.get(&Key::new("Z")), None);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = LabelSet::from(&[KeyValue::new("A", "B"), KeyValue::new("C", 1.5)]);
        let b = LabelSet::from(&[KeyValue::new("C", 1.5), KeyValue::new("A", "B")]);
        let c = LabelSet::from(&[KeyValue::new("C", 2.5), KeyValue::new("A", "B")]);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<LabelSet> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn empty_sets_encode_to_empty_string() {
        let encoder = default_encoder();
        assert!(LabelSet::default().is_empty());
        assert_eq!(LabelSet::default().encoded(Some(&*encoder)), "");
        assert_eq!(LabelSet::from(&[KeyValue::new("A", "B")]).encoded(None), "");
    }

    #[test]
    fn encodings_are_cached_per_encoder() {
        #[derive(Debug)]
        struct Upper(EncoderId);
        impl Encoder for Upper {
            fn encode(&self, labels: &mut dyn Iterator<Item = &KeyValue>) -> String {
                labels
                    .map(|kv| format!("{}:{}", kv.key, kv.value).to_uppercase())
                    .collect::<Vec<_>>()
                    .join(";")
            }
            fn id(&self) -> EncoderId {
                self.0
            }
        }

        let set = LabelSet::from(&[KeyValue::new("a", "b")]);
        let default = default_encoder();
        let upper = Upper(new_encoder_id());

        assert_eq!(set.encoded(Some(&*default)), "a=b");
        assert_eq!(set.encoded(Some(&upper)), "A:B");
        // served from the cache, still keyed by encoder
        assert_eq!(set.clone().encoded(Some(&*default)), "a=b");
        assert_eq!(set.encoded(Some(&upper)), "A:B");

        let uncached = Upper(EncoderId::default());
        assert_eq!(set.encoded(Some(&uncached)), "A:B");
    }

    #[test]
    fn project_keeps_only_requested_keys() {
        let set = LabelSet::from(&[
            KeyValue::new("A", "1"),
            KeyValue::new("B", "2"),
            KeyValue::new("C", "3"),
        ]);
        let projected = set.project(&[Key::new("C"), Key::new("A"), Key::new("D")]);

        let encoder = default_encoder();
        assert_eq!(projected.encoded(Some(&*encoder)), "A=1,C=3,D=");
        assert!(set.project(&[]).is_empty());
    }
}
