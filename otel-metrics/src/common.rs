use std::borrow::Cow;
use std::fmt;

/// The name of a label.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Cow<'static, str>);

impl Key {
    /// Create a new `Key`.
    ///
    /// ```
    /// use otel_metrics::Key;
    ///
    /// assert_eq!(Key::new("host"), Key::new(String::from("host")));
    /// ```
    pub fn new(value: impl Into<Key>) -> Self {
        value.into()
    }

    /// The key name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A string label value.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringValue(Cow<'static, str>);

impl StringValue {
    /// The string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! cow_newtype_impls {
    ($($ty:ident),+) => {
        $(
            impl From<&'static str> for $ty {
                fn from(s: &'static str) -> Self {
                    $ty(Cow::Borrowed(s))
                }
            }

            impl From<String> for $ty {
                fn from(s: String) -> Self {
                    $ty(Cow::Owned(s))
                }
            }

            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Debug::fmt(self.as_str(), f)
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

cow_newtype_impls!(Key, StringValue);

/// A label value. Labels are scalars only.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A boolean
    Bool(bool),
    /// A signed integer
    I64(i64),
    /// A float
    F64(f64),
    /// A string
    String(StringValue),
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<&'static str> for Value {
    fn from(s: &'static str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => fmt::Display::fmt(b, f),
            Value::I64(i) => fmt::Display::fmt(i, f),
            Value::F64(v) => fmt::Display::fmt(v, f),
            Value::String(s) => f.write_str(s.as_str()),
        }
    }
}

/// One label of a measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValue {
    /// The label name
    pub key: Key,
    /// The label value
    pub value: Value,
}

impl KeyValue {
    /// Create a new `KeyValue` pair.
    pub fn new(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_display_without_type_markers() {
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(-7i64).to_string(), "-7");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from(String::from("abc")).to_string(), "abc");
    }

    #[test]
    fn keys_order_by_name() {
        let mut keys = vec![Key::new("b"), Key::new(String::from("a"))];
        keys.sort();
        assert_eq!(keys, vec![Key::new("a"), Key::new("b")]);
        assert_eq!(format!("{:?}", keys[0]), "\"a\"");
    }
}
