use crate::{KeyValue, Value};
use std::fmt;
use std::fmt::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

static ENCODER_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Encoder is a mechanism for serializing a label set into a specific string
/// representation that supports caching, to avoid repeated serialization. An
/// example could be an exporter encoding the label set into a wire
/// representation, or a batcher using the encoding as a grouping key.
pub trait Encoder: fmt::Debug {
    /// Encode returns the serialized encoding of the label set using its
    /// iterator. The result must be deterministic, and distinct label sets
    /// must produce distinct encodings.
    fn encode(&self, labels: &mut dyn Iterator<Item = &KeyValue>) -> String;

    /// A value that is unique for each class of label encoder. Label encoders
    /// allocate these using `new_encoder_id`.
    fn id(&self) -> EncoderId;
}

/// EncoderID is used to identify distinct Encoder implementations, for caching
/// encoded results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EncoderId(usize);

impl EncoderId {
    /// Check if the id is valid
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

/// Default label encoding strategy.
///
/// Labels are rendered as `key=value` pairs joined by `,`. Occurrences of `=`,
/// `,` and `\` inside keys or string values are escaped with a preceding `\`.
///
/// String values are written as is. Other values carry a type tag after an
/// unescaped `\`: `\b` for booleans, `\i` for integers and `\f` for floats,
/// so `{A="1"}` encodes as `A=1` and `{A=1}` as `A=\i1`. Two different label
/// sets therefore never share an encoding.
#[derive(Debug)]
pub struct DefaultLabelEncoder {
    id: EncoderId,
}

impl Encoder for DefaultLabelEncoder {
    fn encode(&self, labels: &mut dyn Iterator<Item = &KeyValue>) -> String {
        let mut buf = String::new();
        for (idx, kv) in labels.enumerate() {
            if idx > 0 {
                buf.push(',');
            }
            copy_and_escape(&mut buf, kv.key.as_str());
            buf.push('=');
            write_value(&mut buf, &kv.value);
        }
        buf
    }

    fn id(&self) -> EncoderId {
        self.id
    }
}

/// Build a new default encoder. Each call allocates a fresh [`EncoderId`].
pub fn default_encoder() -> Box<dyn Encoder + Send + Sync> {
    Box::new(DefaultLabelEncoder {
        id: new_encoder_id(),
    })
}

/// Build a new encoder id
pub fn new_encoder_id() -> EncoderId {
    let old_encoder_id = ENCODER_ID_COUNTER.fetch_add(1, Ordering::AcqRel);
    EncoderId(old_encoder_id + 1)
}

fn write_value(buf: &mut String, value: &Value) {
    let _ = match value {
        Value::String(s) => {
            copy_and_escape(buf, s.as_str());
            Ok(())
        }
        Value::Bool(b) => write!(buf, "\\b{b}"),
        Value::I64(i) => write!(buf, "\\i{i}"),
        // -0.0 and 0.0 are the same label value
        Value::F64(f) if *f == 0.0 => buf.write_str("\\f0"),
        Value::F64(f) => write!(buf, "\\f{f}"),
    };
}

fn copy_and_escape(buf: &mut String, val: &str) {
    for ch in val.chars() {
        if ch == '=' || ch == ',' || ch == '\\' {
            buf.push('\\');
        }
        let _ = buf.write_char(ch);
    }
}
