//! Invocation result carrying the cached flag.

use std::ops::Deref;

/// A value together with whether it was served from the cache.
///
/// Every successful loader invocation yields one of these: `cached` is `true`
/// when every input was unchanged and the handler was skipped, `false` when
/// the handler ran. Async inputs report the same pair upward, which is how a
/// nested loader's cache decision reaches its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loaded<T> {
    /// The produced value.
    pub value: T,
    /// Whether the value came from the cache without running the handler.
    pub cached: bool,
}

impl<T> Loaded<T> {
    /// A freshly computed value (`cached = false`).
    pub fn fresh(value: T) -> Self {
        Loaded {
            value,
            cached: false,
        }
    }

    /// A value that is unchanged since the previous invocation
    /// (`cached = true`).
    pub fn unchanged(value: T) -> Self {
        Loaded {
            value,
            cached: true,
        }
    }

    /// Discard the flag, keeping the value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Map the value, preserving the flag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        Loaded {
            value: f(self.value),
            cached: self.cached,
        }
    }
}

/// Derefs through the value for pointer-like `T`, so a
/// `Loaded<Arc<Output>>` can be used like an `&Output`.
impl<T: Deref> Deref for Loaded<T> {
    type Target = T::Target;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_constructors() {
        assert!(!Loaded::fresh(1).cached);
        assert!(Loaded::unchanged(1).cached);
        assert_eq!(Loaded::fresh(5).into_value(), 5);
    }

    #[test]
    fn test_map_preserves_flag() {
        let loaded = Loaded::unchanged(2).map(|n| n * 10);
        assert_eq!(loaded.value, 20);
        assert!(loaded.cached);
    }

    #[test]
    fn test_deref_through_arc() {
        let loaded = Loaded::fresh(Arc::new(String::from("abc")));
        assert_eq!(loaded.len(), 3);
    }
}
