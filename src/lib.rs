//! Memo-Flow: a single-slot memoizing loader combinator.
//!
//! A loader composes an ordered list of *input* functions and one *handler*
//! into a single async callable that re-runs the handler only when at least
//! one input's value changed since the previous call. Loaders nest: a loader
//! is itself an async input, so its cache decision propagates to any parent
//! loader that consumes it.
//!
//! # Key Features
//!
//! - **Single-slot memoization**: One cached result per loader instance,
//!   replaced only by a successful handler run
//! - **Identity comparison**: Sync inputs compare by [`Same`] (value equality
//!   for scalars, pointer identity for `Arc`), never by deep equality
//! - **Transitive caching**: A nested loader's unchanged flag feeds the
//!   parent's decision without re-comparison
//! - **Type-safe positional inputs**: Input tuples map positionally onto the
//!   handler's parameters, checked at compile time
//! - **Serialized invocations**: Overlapping calls on one instance cannot
//!   race the cache slot
//! - **Tracing hooks**: Observe hits, recomputes, and failures through the
//!   [`Tracer`] API
//!
//! # Example
//!
//! ```ignore
//! use memo_flow::{Input, LoadError, Loader};
//!
//! struct Params { id: String }
//!
//! async fn fetch(id: String, limit: u32) -> Result<String, LoadError> {
//!     Ok(format!("{id}:{limit}"))
//! }
//!
//! let loader = Loader::new(
//!     (Input::sync(|p: &Params| p.id.clone()), Input::sync(|_: &Params| 3)),
//!     fetch,
//! );
//!
//! let first = loader.load(&Params { id: "2".into() }).await?;
//! let second = loader.load(&Params { id: "2".into() }).await?;
//! assert!(!first.cached && second.cached); // fetch ran once
//! ```
//!
//! # Composing loaders
//!
//! Wrap a loader in an [`Arc`](std::sync::Arc) and pass a clone through
//! [`Input::from_async`] to use it as a parent's input. The parent skips its
//! handler only when the child reports its own cache hit (and every other
//! input is unchanged too), so caching composes across the whole chain.

#![deny(missing_docs)]

mod error;
mod handler;
mod input;
mod input_list;
mod loaded;
mod loader;
pub mod same;
pub mod tracer;

pub use error::{LoadError, LoadResultExt, TypedErr};
pub use handler::Handler;
pub use input::{AsyncInput, Input};
pub use input_list::{InputFailure, InputList};
pub use loaded::Loaded;
pub use loader::{Loader, LoaderBuilder};
pub use same::{Comparator, Same};
pub use tracer::{InvocationResult, NoopTracer, SpanId, Tracer};
