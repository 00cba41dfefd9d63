//! The handler: the function whose result a loader memoizes.

use std::future::Future;

use async_trait::async_trait;

use crate::error::LoadError;

/// The memoized function of a loader.
///
/// Implemented for `async fn`s and closures taking the input values
/// positionally (arities 0 through 8) and returning
/// `Result<Output, LoadError>`. The handler always runs through the
/// asynchronous path, even when every input is synchronous, and only when at
/// least one input changed (or the loader has no inputs at all).
///
/// # Example
///
/// ```ignore
/// use memo_flow::{Input, LoadError, Loader};
///
/// async fn render(id: String, size: u32) -> Result<String, LoadError> {
///     Ok(format!("{id}@{size}"))
/// }
///
/// let loader = Loader::new(
///     (Input::sync(|p: &Props| p.id.clone()), Input::sync(|_: &Props| 3)),
///     render,
/// );
/// ```
#[async_trait]
pub trait Handler<Values>: Send + Sync {
    /// The memoized result type.
    type Output: Send + Sync + 'static;

    /// Compute the result from the input values.
    async fn run(&self, values: Values) -> Result<Self::Output, LoadError>;
}

macro_rules! impl_handler {
    ($($value:ident $field:ident),*) => {
        #[async_trait]
        impl<F, Fut, Out $(, $value)*> Handler<($($value,)*)> for F
        where
            F: Fn($($value),*) -> Fut + Send + Sync,
            Fut: Future<Output = Result<Out, LoadError>> + Send,
            Out: Send + Sync + 'static,
            $($value: Send + 'static,)*
        {
            type Output = Out;

            async fn run(&self, ($($field,)*): ($($value,)*)) -> Result<Out, LoadError> {
                (self)($($field),*).await
            }
        }
    };
}

impl_handler!();
impl_handler!(V0 v0);
impl_handler!(V0 v0, V1 v1);
impl_handler!(V0 v0, V1 v1, V2 v2);
impl_handler!(V0 v0, V1 v1, V2 v2, V3 v3);
impl_handler!(V0 v0, V1 v1, V2 v2, V3 v3, V4 v4);
impl_handler!(V0 v0, V1 v1, V2 v2, V3 v3, V4 v4, V5 v5);
impl_handler!(V0 v0, V1 v1, V2 v2, V3 v3, V4 v4, V5 v5, V6 v6);
impl_handler!(V0 v0, V1 v1, V2 v2, V3 v3, V4 v4, V5 v5, V6 v6, V7 v7);
