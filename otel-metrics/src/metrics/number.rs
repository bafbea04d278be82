use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{self, AtomicBool, AtomicI64, AtomicU64};

/// A descriptor for the encoded data type of a [`Number`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumberKind {
    /// A Number that stores `i64` values.
    I64,
    /// A Number that stores `f64` values.
    F64,
}

/// A 64 bit cell that can be read and updated atomically.
///
/// Every operation is lock-free: integers map onto the platform atomics and
/// floats keep their IEEE-754 bits in an `AtomicU64`.
pub trait AtomicNumber<T>: Default + fmt::Debug + Send + Sync + 'static {
    /// Create a cell holding `value`.
    fn new(value: T) -> Self;

    /// Read the current value.
    fn load(&self) -> T;

    /// Replace the current value.
    fn store(&self, value: T);

    /// Add `value` to the current value, returning the previous value.
    fn fetch_add(&self, value: T) -> T;

    /// Replace the current value, returning the previous value.
    fn swap(&self, value: T) -> T;

    /// Store `new` if the cell still holds `current`. Returns whether the
    /// store happened.
    fn compare_and_swap(&self, current: T, new: T) -> bool;
}

/// A numeric type measurements can be recorded with.
///
/// The kind of a number is fixed at compile time, so a value can only ever be
/// added to or compared with values of the same kind.
pub trait Number:
    Copy + PartialOrd + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// The atomic cell used to store values of this kind.
    type Atomic: AtomicNumber<Self>;

    /// The runtime tag matching this type.
    const KIND: NumberKind;

    /// Kind-directed addition. Integers wrap on overflow.
    fn add(self, other: Self) -> Self;

    /// Total ordering between two numbers of this kind.
    fn compare(&self, other: &Self) -> Ordering;

    /// `true` if this is a floating point NaN.
    fn is_nan(&self) -> bool;

    /// `true` if the value is less than zero.
    fn is_negative(&self) -> bool;

    /// Coerce the value into an `f64`. May lose precision for large integers.
    fn into_f64(self) -> f64;
}

impl Number for i64 {
    type Atomic = AtomicI64;
    const KIND: NumberKind = NumberKind::I64;

    fn add(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn is_nan(&self) -> bool {
        false
    }

    fn is_negative(&self) -> bool {
        i64::is_negative(*self)
    }

    fn into_f64(self) -> f64 {
        self as f64
    }
}

impl Number for f64 {
    type Atomic = AtomicF64;
    const KIND: NumberKind = NumberKind::F64;

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }

    fn is_nan(&self) -> bool {
        f64::is_nan(*self)
    }

    fn is_negative(&self) -> bool {
        *self < 0.0
    }

    fn into_f64(self) -> f64 {
        self
    }
}

impl AtomicNumber<i64> for AtomicI64 {
    fn new(value: i64) -> Self {
        AtomicI64::new(value)
    }

    fn load(&self) -> i64 {
        AtomicI64::load(self, atomic::Ordering::Acquire)
    }

    fn store(&self, value: i64) {
        AtomicI64::store(self, value, atomic::Ordering::Release)
    }

    fn fetch_add(&self, value: i64) -> i64 {
        AtomicI64::fetch_add(self, value, atomic::Ordering::AcqRel)
    }

    fn swap(&self, value: i64) -> i64 {
        AtomicI64::swap(self, value, atomic::Ordering::AcqRel)
    }

    fn compare_and_swap(&self, current: i64, new: i64) -> bool {
        self.compare_exchange(
            current,
            new,
            atomic::Ordering::AcqRel,
            atomic::Ordering::Acquire,
        )
        .is_ok()
    }
}

/// An `f64` stored as its bit pattern in an `AtomicU64`.
#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicNumber<f64> for AtomicF64 {
    fn new(value: f64) -> Self {
        AtomicF64(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(atomic::Ordering::Acquire))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), atomic::Ordering::Release)
    }

    fn fetch_add(&self, value: f64) -> f64 {
        let mut current = self.0.load(atomic::Ordering::Acquire);
        loop {
            let new = (f64::from_bits(current) + value).to_bits();
            match self.0.compare_exchange_weak(
                current,
                new,
                atomic::Ordering::AcqRel,
                atomic::Ordering::Acquire,
            ) {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    fn swap(&self, value: f64) -> f64 {
        f64::from_bits(self.0.swap(value.to_bits(), atomic::Ordering::AcqRel))
    }

    fn compare_and_swap(&self, current: f64, new: f64) -> bool {
        self.0
            .compare_exchange(
                current.to_bits(),
                new.to_bits(),
                atomic::Ordering::AcqRel,
                atomic::Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Keeps track if an atomic value has had a value added since the last reset,
/// which tells "never measured" apart from "measured as zero".
#[derive(Debug, Default)]
pub struct AtomicTracker<T: Number> {
    value: T::Atomic,
    has_value: AtomicBool,
}

impl<T: Number> AtomicTracker<T> {
    /// Create an empty tracker.
    pub fn new() -> Self {
        AtomicTracker {
            value: T::Atomic::new(T::default()),
            has_value: AtomicBool::new(false),
        }
    }

    /// Atomically add `value`.
    ///
    /// The flag is raised after the value lands, so a concurrent `take` can
    /// never clear the flag while leaving the value behind. The cost is that a
    /// `take` racing between the two steps may collect the value and the next
    /// `take` then reports `Some(0)` once.
    pub fn add(&self, value: T) {
        self.value.fetch_add(value);
        self.has_value.store(true, atomic::Ordering::Release);
    }

    /// The accumulated value, if anything was added since the last reset.
    pub fn get(&self) -> Option<T> {
        if self.has_value.load(atomic::Ordering::Acquire) {
            Some(self.value.load())
        } else {
            None
        }
    }

    /// Atomically take the accumulated value and reset the tracker to empty.
    ///
    /// An `add` racing with this call is either part of the returned value or
    /// left for the next call, never both and never neither. See [`add`] for
    /// the one spurious empty reading this allows.
    ///
    /// [`add`]: AtomicTracker::add
    pub fn take(&self) -> Option<T> {
        if self.has_value.swap(false, atomic::Ordering::AcqRel) {
            Some(self.value.swap(T::default()))
        } else {
            None
        }
    }
}
