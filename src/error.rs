//! Error type for loader invocations.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use crate::loaded::Loaded;

/// Error produced by an input function or a handler.
///
/// A `LoadError` is a shared handle to the original error value: it is never
/// rewrapped while it travels from the failing input or handler to the
/// outermost caller, no matter how deeply loaders are nested. Two clones of
/// the same failure compare pointer-equal via [`LoadError::ptr_eq`].
///
/// User errors can be propagated with the `?` operator, which converts any
/// `Into<anyhow::Error>` type automatically.
///
/// # Example
///
/// ```ignore
/// use memo_flow::{Input, LoadError, Loader};
///
/// let loader = Loader::new(
///     (Input::try_sync(|s: &String| Ok(s.parse::<u32>()?)),),
///     |n: u32| async move { Ok(n * 2) },
/// );
/// ```
#[derive(Debug, Clone)]
pub struct LoadError(Arc<anyhow::Error>);

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// Note: LoadError deliberately does not implement std::error::Error. Doing so
// would make it `Into<anyhow::Error>` and collide with the blanket `From`
// below under the reflexive `From<T> for T`.
impl<T: Into<anyhow::Error>> From<T> for LoadError {
    fn from(err: T) -> Self {
        LoadError(Arc::new(err.into()))
    }
}

impl LoadError {
    /// Create an error from a plain message.
    pub fn msg(msg: impl fmt::Display) -> Self {
        LoadError(Arc::new(anyhow::Error::msg(msg.to_string())))
    }

    /// The shared handle to the underlying error.
    ///
    /// The handle is the same allocation at every nesting level an error
    /// passes through, so `Arc::ptr_eq` on two results identifies a single
    /// failure observed from two places.
    pub fn as_arc(&self) -> &Arc<anyhow::Error> {
        &self.0
    }

    /// Consume the wrapper, returning the shared underlying error.
    pub fn into_arc(self) -> Arc<anyhow::Error> {
        self.0
    }

    /// Whether `self` and `other` are handles to the same failure.
    pub fn ptr_eq(&self, other: &LoadError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Attempts to downcast the underlying error to a specific type.
    ///
    /// Returns `Some(&E)` when the originally raised error was of type `E`.
    pub fn downcast_ref<E: std::error::Error + Send + Sync + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Returns `true` if the underlying error is of type `E`.
    pub fn is<E: std::error::Error + Send + Sync + 'static>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }
}

/// A typed wrapper around a load error that provides `Deref` access to the
/// concrete error type.
///
/// Constructed by [`LoadResultExt::downcast_err`]; the inner `Arc` keeps the
/// error alive for the lifetime of the wrapper.
#[derive(Clone)]
pub struct TypedErr<E> {
    arc: Arc<anyhow::Error>,
    _marker: PhantomData<E>,
}

impl<E: std::error::Error + Send + Sync + 'static> TypedErr<E> {
    fn new(arc: Arc<anyhow::Error>) -> Option<Self> {
        // Verify the downcast before constructing so `get` cannot fail.
        if arc.downcast_ref::<E>().is_some() {
            Some(Self {
                arc,
                _marker: PhantomData,
            })
        } else {
            None
        }
    }

    /// Returns a reference to the inner error.
    pub fn get(&self) -> &E {
        // Safe because we verified the type in `new`
        self.arc.downcast_ref::<E>().unwrap()
    }
}

impl<E: std::error::Error + Send + Sync + 'static> Deref for TypedErr<E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.get()
    }
}

impl<E: std::error::Error + Send + Sync + 'static> fmt::Debug for TypedErr<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.get(), f)
    }
}

impl<E: std::error::Error + Send + Sync + 'static> fmt::Display for TypedErr<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.get(), f)
    }
}

/// Extension trait for load results that provides ergonomic error
/// downcasting.
///
/// # Example
///
/// ```ignore
/// use memo_flow::LoadResultExt;
///
/// let result = loader.load(&args).await.downcast_err::<DbError>()?;
/// match result {
///     Ok(loaded) => println!("value: {:?}", *loaded),
///     Err(db_err) => eprintln!("db failure {}", db_err.code),
/// }
/// ```
pub trait LoadResultExt<T> {
    /// Attempts to downcast the error to a specific error type.
    ///
    /// # Returns
    ///
    /// - `Ok(Ok(loaded))` - the invocation succeeded
    /// - `Ok(Err(typed_err))` - the invocation failed with an error of type `E`
    /// - `Err(load_error)` - the invocation failed with an error of another type
    fn downcast_err<E: std::error::Error + Send + Sync + 'static>(
        self,
    ) -> Result<Result<Loaded<T>, TypedErr<E>>, LoadError>;
}

impl<T> LoadResultExt<T> for Result<Loaded<T>, LoadError> {
    fn downcast_err<E: std::error::Error + Send + Sync + 'static>(
        self,
    ) -> Result<Result<Loaded<T>, TypedErr<E>>, LoadError> {
        match self {
            Ok(loaded) => Ok(Ok(loaded)),
            Err(LoadError(arc)) => match TypedErr::new(arc.clone()) {
                Some(typed) => Ok(Err(typed)),
                None => Err(LoadError(arc)),
            },
        }
    }
}
