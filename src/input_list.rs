//! Ordered input lists: tuples of [`Input`] resolved strictly in sequence.

use async_trait::async_trait;

use crate::error::LoadError;
use crate::input::Input;
use crate::loaded::Loaded;

/// A failed input resolution: the untouched error plus where it happened.
///
/// The error inside is exactly what the input produced; the position exists
/// for diagnostics (it feeds
/// [`InvocationResult::InputError`](crate::InvocationResult::InputError)) and
/// is dropped before the error reaches the caller.
#[derive(Debug)]
pub struct InputFailure {
    /// Zero-based position of the input that failed.
    pub index: usize,
    /// The error exactly as the input produced it.
    pub error: LoadError,
}

/// The ordered list of inputs of a loader.
///
/// Implemented for tuples of [`Input`] up to arity 8, and for `()` as the
/// zero-input list. Tuple order is evaluation order and the positional order
/// of the handler's parameters.
///
/// Resolution is strictly sequential: input *k+1* does not start until input
/// *k* has completed, and the first failure stops everything after it. The
/// previous values travel as one whole tuple, so a partially updated cache
/// cannot be observed by construction.
#[async_trait]
pub trait InputList<Args>: Send + Sync {
    /// The tuple of values the handler receives positionally.
    type Values: Clone + Send + Sync + 'static;

    /// Number of inputs in the list.
    fn len(&self) -> usize;

    /// Whether the list has no inputs.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve every input in positional order against `args`.
    ///
    /// `prev` is the value tuple from the previous successful invocation, or
    /// `None` before the first success. The returned flag is the conjunction
    /// of every input's unchanged flag.
    async fn resolve(
        &self,
        args: &Args,
        prev: Option<&Self::Values>,
    ) -> Result<Loaded<Self::Values>, InputFailure>;
}

#[async_trait]
impl<Args: Send + Sync> InputList<Args> for () {
    type Values = ();

    fn len(&self) -> usize {
        0
    }

    async fn resolve(
        &self,
        _args: &Args,
        _prev: Option<&()>,
    ) -> Result<Loaded<()>, InputFailure> {
        // Vacuously unchanged; the engine recomputes anyway for an empty
        // list, since there is nothing to compare.
        Ok(Loaded::unchanged(()))
    }
}

macro_rules! impl_input_list {
    ($($value:ident $loaded:ident $idx:tt),+) => {
        #[async_trait]
        impl<Args, $($value),+> InputList<Args> for ($(Input<Args, $value>,)+)
        where
            Args: Send + Sync,
            $($value: Clone + Send + Sync + 'static,)+
        {
            type Values = ($($value,)+);

            fn len(&self) -> usize {
                [$($idx),+].len()
            }

            async fn resolve(
                &self,
                args: &Args,
                prev: Option<&Self::Values>,
            ) -> Result<Loaded<Self::Values>, InputFailure> {
                let mut unchanged = true;
                $(
                    let $loaded = self
                        .$idx
                        .resolve(args, prev.map(|prev| &prev.$idx))
                        .await
                        .map_err(|error| InputFailure { index: $idx, error })?;
                    unchanged &= $loaded.cached;
                )+
                Ok(Loaded {
                    value: ($($loaded.value,)+),
                    cached: unchanged,
                })
            }
        }
    };
}

impl_input_list!(V0 l0 0);
impl_input_list!(V0 l0 0, V1 l1 1);
impl_input_list!(V0 l0 0, V1 l1 1, V2 l2 2);
impl_input_list!(V0 l0 0, V1 l1 1, V2 l2 2, V3 l3 3);
impl_input_list!(V0 l0 0, V1 l1 1, V2 l2 2, V3 l3 3, V4 l4 4);
impl_input_list!(V0 l0 0, V1 l1 1, V2 l2 2, V3 l3 3, V4 l4 4, V5 l5 5);
impl_input_list!(V0 l0 0, V1 l1 1, V2 l2 2, V3 l3 3, V4 l4 4, V5 l5 5, V6 l6 6);
impl_input_list!(V0 l0 0, V1 l1 1, V2 l2 2, V3 l3 3, V4 l4 4, V5 l5 5, V6 l6 6, V7 l7 7);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_list() {
        let list = ();
        assert_eq!(InputList::<u32>::len(&list), 0);
        assert!(InputList::<u32>::is_empty(&list));
        let loaded = InputList::<u32>::resolve(&list, &1, None).await.unwrap();
        assert!(loaded.cached);
    }

    #[tokio::test]
    async fn test_sequential_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let first = order.clone();
        let second = order.clone();
        let list = (
            Input::sync(move |n: &u32| {
                first.lock().unwrap().push("first");
                *n
            }),
            Input::sync(move |n: &u32| {
                second.lock().unwrap().push("second");
                *n + 1
            }),
        );

        let loaded = list.resolve(&1, None).await.unwrap();
        assert_eq!(loaded.value, (1, 2));
        assert!(!loaded.cached);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_aggregate_requires_all_unchanged() {
        let list = (
            Input::sync(|n: &u32| *n),
            Input::sync(|_: &u32| "fixed"),
        );

        let all_same = list.resolve(&5, Some(&(5, "fixed"))).await.unwrap();
        assert!(all_same.cached);

        let one_changed = list.resolve(&6, Some(&(5, "fixed"))).await.unwrap();
        assert!(!one_changed.cached);
        assert_eq!(one_changed.value, (6, "fixed"));
    }

    #[tokio::test]
    async fn test_failure_short_circuits() {
        let later_calls = Arc::new(AtomicU32::new(0));
        let counter = later_calls.clone();
        let list = (
            Input::sync(|n: &u32| *n),
            Input::try_sync(|_: &u32| -> Result<u32, LoadError> {
                Err(LoadError::msg("boom"))
            }),
            Input::sync(move |n: &u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                *n
            }),
        );

        let failure = list.resolve(&1, None).await.unwrap_err();
        assert_eq!(failure.index, 1);
        assert!(failure.error.to_string().contains("boom"));
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }
}
