//! Bound values: the run-time association of variable names to inputs.
//!
//! A binding carries one central value plus any number of independent
//! uncertainty components ("error columns", e.g. statistical and
//! systematic). Each slot is either a scalar or a series of per-sample
//! values; mixing is allowed as long as every series in one call shares a
//! common length.

use smallvec::SmallVec;

/// One value slot: a single number or a series of per-sample numbers.
#[derive(Clone, Debug, PartialEq)]
pub enum Value<T> {
    /// A single number.
    Scalar(T),
    /// One number per sample.
    Series(Vec<T>),
}

impl<T: Copy> Value<T> {
    /// The series length, or `None` for scalars.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Scalar(_) => None,
            Value::Series(values) => Some(values.len()),
        }
    }

    /// Returns true if this slot is a series.
    #[must_use]
    pub fn is_series(&self) -> bool {
        matches!(self, Value::Series(_))
    }

    /// The value at sample `index`; scalars broadcast to every sample.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range for a series. Callers are expected
    /// to have validated lengths beforehand.
    #[must_use]
    pub fn at(&self, index: usize) -> T {
        match self {
            Value::Scalar(v) => *v,
            Value::Series(values) => values[index],
        }
    }
}

/// A bound input: a central value plus zero or more error columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding<T> {
    /// The central (measured) value.
    pub central: Value<T>,
    /// Independent uncertainty components, one per error column.
    pub errors: SmallVec<[Value<T>; 2]>,
}

impl<T: Copy> Binding<T> {
    /// A binding with no uncertainty.
    #[must_use]
    pub fn exact(value: Value<T>) -> Self {
        Self {
            central: value,
            errors: SmallVec::new(),
        }
    }

    /// A binding from a central slot and its error slots.
    #[must_use]
    pub fn with_errors(central: Value<T>, errors: impl IntoIterator<Item = Value<T>>) -> Self {
        Self {
            central,
            errors: errors.into_iter().collect(),
        }
    }

    /// Iterates over every slot, central first.
    pub(crate) fn slots(&self) -> impl Iterator<Item = &Value<T>> {
        std::iter::once(&self.central).chain(self.errors.iter())
    }
}

impl<T: Copy> From<T> for Binding<T> {
    fn from(value: T) -> Self {
        Binding::exact(Value::Scalar(value))
    }
}

impl<T: Copy> From<(T, T)> for Binding<T> {
    fn from((central, error): (T, T)) -> Self {
        Binding::with_errors(Value::Scalar(central), [Value::Scalar(error)])
    }
}

impl<T: Copy> From<(T, T, T)> for Binding<T> {
    fn from((central, stat, sys): (T, T, T)) -> Self {
        Binding::with_errors(Value::Scalar(central), [Value::Scalar(stat), Value::Scalar(sys)])
    }
}

impl<T: Copy> From<Vec<T>> for Binding<T> {
    fn from(samples: Vec<T>) -> Self {
        Binding::exact(Value::Series(samples))
    }
}

impl<T: Copy> From<(Vec<T>, Vec<T>)> for Binding<T> {
    fn from((samples, errors): (Vec<T>, Vec<T>)) -> Self {
        Binding::with_errors(Value::Series(samples), [Value::Series(errors)])
    }
}

impl<T: Copy> From<(Vec<T>, T)> for Binding<T> {
    fn from((samples, error): (Vec<T>, T)) -> Self {
        Binding::with_errors(Value::Series(samples), [Value::Scalar(error)])
    }
}

impl<T: Copy, const N: usize> From<[T; N]> for Binding<T> {
    fn from(samples: [T; N]) -> Self {
        Binding::exact(Value::Series(samples.to_vec()))
    }
}

impl<T: Copy, const N: usize> From<([T; N], [T; N])> for Binding<T> {
    fn from((samples, errors): ([T; N], [T; N])) -> Self {
        Binding::with_errors(Value::Series(samples.to_vec()), [Value::Series(errors.to_vec())])
    }
}

/// An insertion-ordered set of named bindings.
///
/// Order matters for reproducibility of dependency resolution; lookups are
/// linear, which is fine for the handful of variables a formula has.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings<T> {
    entries: Vec<(String, Binding<T>)>,
}

impl<T: Copy> Bindings<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts or replaces the binding for `name`.
    pub fn insert(&mut self, name: impl Into<String>, binding: impl Into<Binding<T>>) {
        let name = name.into();
        let binding = binding.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = binding;
        } else {
            self.entries.push((name, binding));
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, binding: impl Into<Binding<T>>) -> Self {
        self.insert(name, binding);
        self
    }

    /// Looks up a binding by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Binding<T>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b)
    }

    /// Returns true if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding<T>)> {
        self.entries.iter().map(|(n, b)| (n.as_str(), b))
    }

    /// Number of bound names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds a [`Bindings`] from `name => value` pairs.
///
/// ```
/// use secundus::bindings;
///
/// let b = bindings! {
///     a => 1.0,
///     b => (2.0, 0.1),            // central ± error
///     c => vec![1.0, 2.0, 3.0],   // per-sample series
/// };
/// assert_eq!(b.len(), 3);
/// ```
#[macro_export]
macro_rules! bindings {
    () => { $crate::Bindings::new() };
    ($($name:ident => $value:expr),+ $(,)?) => {{
        let mut set = $crate::Bindings::new();
        $( set.insert(stringify!($name), $value); )+
        set
    }};
}
