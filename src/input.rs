//! Input functions: the construction-time tagged sync/async variants.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LoadError;
use crate::loaded::Loaded;
use crate::same::{by_same, Comparator, Same};

/// An asynchronous input: produces a value together with its own unchanged
/// flag.
///
/// The engine never compares an async input's value against the cache; the
/// callee reports whether it changed. [`Loader`](crate::Loader) implements
/// this trait, which is what lets one loader serve as an input of another
/// with its cache decision propagating transitively.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use memo_flow::{AsyncInput, LoadError, Loaded};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl AsyncInput<u64> for Ticker {
///     type Value = u64;
///
///     async fn load(&self, args: &u64) -> Result<Loaded<u64>, LoadError> {
///         // Always fresh: every call counts as changed.
///         Ok(Loaded::fresh(*args + 1))
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncInput<Args>: Send + Sync {
    /// The value this input supplies to the handler.
    type Value: Send;

    /// Produce the value for the current call arguments, reporting whether
    /// it is unchanged since this input's own previous invocation.
    async fn load(&self, args: &Args) -> Result<Loaded<Self::Value>, LoadError>;
}

#[async_trait]
impl<Args, A> AsyncInput<Args> for Arc<A>
where
    Args: Sync,
    A: AsyncInput<Args> + ?Sized,
{
    type Value = A::Value;

    async fn load(&self, args: &Args) -> Result<Loaded<Self::Value>, LoadError> {
        (**self).load(args).await
    }
}

type SyncFn<Args, T> = Box<dyn Fn(&Args) -> Result<T, LoadError> + Send + Sync>;

enum InputKind<Args, T> {
    /// Evaluated by the engine, compared against the previous cached value.
    Sync {
        f: SyncFn<Args, T>,
        same: Comparator<T>,
    },
    /// Evaluated by the callee, which reports its own flag.
    Async(Box<dyn AsyncInput<Args, Value = T>>),
}

/// One positional input of a loader.
///
/// The sync/async distinction is a tag fixed at construction, never inferred
/// at call time. Sync inputs are invoked once per call and compared against
/// the previously cached value at the same position (identity comparison by
/// default, see [`Same`]); async inputs report their own
/// `(value, unchanged)` pair which is trusted as-is.
pub struct Input<Args, T> {
    kind: InputKind<Args, T>,
}

impl<Args, T> Input<Args, T> {
    /// An infallible sync input, compared with the [`Same`] default.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use memo_flow::Input;
    ///
    /// struct Props { id: String }
    /// let id = Input::sync(|p: &Props| p.id.clone());
    /// ```
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Args) -> T + Send + Sync + 'static,
        T: Same,
    {
        Self::sync_by(f, by_same::<T>)
    }

    /// An infallible sync input with an explicit comparator.
    pub fn sync_by<F>(f: F, same: Comparator<T>) -> Self
    where
        F: Fn(&Args) -> T + Send + Sync + 'static,
    {
        Input {
            kind: InputKind::Sync {
                f: Box::new(move |args| Ok(f(args))),
                same,
            },
        }
    }

    /// A fallible sync input, compared with the [`Same`] default.
    ///
    /// An error stops the invocation: later inputs and the handler never
    /// run, and the error reaches the caller unchanged.
    pub fn try_sync<F>(f: F) -> Self
    where
        F: Fn(&Args) -> Result<T, LoadError> + Send + Sync + 'static,
        T: Same,
    {
        Self::try_sync_by(f, by_same::<T>)
    }

    /// A fallible sync input with an explicit comparator.
    pub fn try_sync_by<F>(f: F, same: Comparator<T>) -> Self
    where
        F: Fn(&Args) -> Result<T, LoadError> + Send + Sync + 'static,
    {
        Input {
            kind: InputKind::Sync { f: Box::new(f), same },
        }
    }

    /// An async input from any [`AsyncInput`] implementation.
    ///
    /// To share the implementation (a nested loader, typically) between the
    /// parent and direct callers, pass an `Arc` clone of it.
    pub fn from_async<A>(input: A) -> Self
    where
        A: AsyncInput<Args, Value = T> + 'static,
    {
        Input {
            kind: InputKind::Async(Box::new(input)),
        }
    }

    /// An async input from a closure.
    ///
    /// The closure receives the call arguments by clone and must report the
    /// unchanged flag itself via the returned [`Loaded`]; a plain fetch that
    /// does no comparison of its own should return [`Loaded::fresh`].
    pub fn async_fn<F, Fut>(f: F) -> Self
    where
        Args: Clone + Send + Sync + 'static,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Loaded<T>, LoadError>> + Send + 'static,
        T: Send + 'static,
    {
        Self::from_async(FnInput { f })
    }

    /// Whether this input carries the async tag.
    pub fn is_async(&self) -> bool {
        matches!(self.kind, InputKind::Async(_))
    }
}

impl<Args: Sync, T: Send> Input<Args, T> {
    /// Evaluate this input against `args`.
    ///
    /// Sync inputs run exactly once per call; the comparison uses the same
    /// value that is handed onward, and with no previous value (`prev` is
    /// `None` before the first successful invocation) the input always
    /// counts as changed. Async inputs delegate entirely to the callee.
    pub async fn resolve(&self, args: &Args, prev: Option<&T>) -> Result<Loaded<T>, LoadError> {
        match &self.kind {
            InputKind::Sync { f, same } => {
                let value = f(args)?;
                let cached = prev.map_or(false, |prev| same(&value, prev));
                Ok(Loaded { value, cached })
            }
            InputKind::Async(input) => input.load(args).await,
        }
    }
}

impl<Args, T> fmt::Debug for Input<Args, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InputKind::Sync { .. } => f.write_str("Input::Sync"),
            InputKind::Async(_) => f.write_str("Input::Async"),
        }
    }
}

/// Adapter for [`Input::async_fn`] closures.
struct FnInput<F> {
    f: F,
}

#[async_trait]
impl<Args, T, F, Fut> AsyncInput<Args> for FnInput<F>
where
    Args: Clone + Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(Args) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Loaded<T>, LoadError>> + Send,
{
    type Value = T;

    async fn load(&self, args: &Args) -> Result<Loaded<T>, LoadError> {
        (self.f)(args.clone()).await
    }
}
