//! Change detection for synchronous input values.
//!
//! Cache decisions compare a freshly computed input value against the one
//! stored by the previous successful invocation. The comparison is identity
//! oriented, not structural: scalars and strings compare by value, shared
//! allocations compare by pointer. Two structurally equal but distinct
//! allocations count as changed, which keeps the comparison cheap and makes
//! "unchanged" mean "the very same value as last time".

use std::sync::Arc;

/// Identity-style equality used to decide whether a sync input changed.
///
/// `same` must be cheap; it runs on every invocation for every sync input.
/// Implementations for `Arc` use pointer identity, so cloning a cached value
/// keeps it "the same" while rebuilding an equal value does not.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use memo_flow::Same;
///
/// let a = Arc::new(vec![1, 2, 3]);
/// let b = a.clone();
/// let c = Arc::new(vec![1, 2, 3]);
/// assert!(a.same(&b));
/// assert!(!a.same(&c)); // equal contents, distinct allocation
/// ```
pub trait Same {
    /// Whether `self` is the same value as `other`.
    fn same(&self, other: &Self) -> bool;
}

/// Pluggable comparison for a single input, overriding the [`Same`] default.
///
/// Used with [`Input::sync_by`](crate::Input::sync_by); see [`by_eq`] and
/// [`never_same`] for ready-made comparators.
pub type Comparator<T> = fn(&T, &T) -> bool;

/// Comparator delegating to [`Same`]; the default for
/// [`Input::sync`](crate::Input::sync).
pub fn by_same<T: Same>(a: &T, b: &T) -> bool {
    a.same(b)
}

/// Comparator delegating to `PartialEq`: structural equality opt-in.
pub fn by_eq<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

/// Comparator that never reports "same": the input counts as changed on
/// every invocation, forcing the handler to run each time the input is
/// consulted.
pub fn never_same<T>(_a: &T, _b: &T) -> bool {
    false
}

macro_rules! impl_same_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Same for $ty {
                #[inline]
                fn same(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_same_by_value!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char, ()
);

// Strict-equality float semantics: NaN is never the same as itself, so an
// input producing NaN recomputes every call.
#[allow(clippy::float_cmp)]
impl Same for f32 {
    #[inline]
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

#[allow(clippy::float_cmp)]
impl Same for f64 {
    #[inline]
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

// Strings carry value semantics like scalars.
impl Same for String {
    #[inline]
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

impl Same for &'static str {
    #[inline]
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

// Shared allocations compare by identity, including unsized pointees such as
// `Arc<str>` and `Arc<[u8]>`.
impl<T: ?Sized> Same for Arc<T> {
    #[inline]
    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: Same> Same for Option<T> {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same(b),
            (None, None) => true,
            _ => false,
        }
    }
}

macro_rules! impl_same_for_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Same),+> Same for ($($name,)+) {
            fn same(&self, other: &Self) -> bool {
                $(self.$idx.same(&other.$idx))&&+
            }
        }
    };
}

impl_same_for_tuple!(A 0);
impl_same_for_tuple!(A 0, B 1);
impl_same_for_tuple!(A 0, B 1, C 2);
impl_same_for_tuple!(A 0, B 1, C 2, D 3);
