//! Tracer trait for observing loader invocations.
//!
//! This module defines the [`Tracer`] trait and related types for observing
//! what a loader does on each call: whether the cache was hit, which input
//! failed, whether the handler ran. The default [`NoopTracer`] provides
//! zero cost when tracing is not needed.
//!
//! # Example
//!
//! ```ignore
//! use memo_flow::{InvocationResult, SpanId, Tracer};
//!
//! struct PrintTracer;
//!
//! impl Tracer for PrintTracer {
//!     fn new_span_id(&self) -> SpanId {
//!         SpanId(1)
//!     }
//!
//!     fn on_call_end(&self, _span_id: SpanId, loader: &str, result: InvocationResult) {
//!         println!("{loader}: {result:?}");
//!     }
//! }
//!
//! loader.set_tracer(Some(std::sync::Arc::new(PrintTracer)));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Unique identifier for one loader invocation span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanId(
    /// The raw span number.
    pub u64,
);

/// Classification of how an invocation terminated.
///
/// Exactly one of these is reported per invocation, mirroring the single
/// terminal transition of the invocation state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    /// Every input was unchanged; the stored result was returned without
    /// running the handler.
    CacheHit,
    /// The handler ran and the cache slot was replaced.
    Recomputed,
    /// The input at `index` (zero-based) failed; later inputs and the
    /// handler never ran.
    InputError {
        /// Zero-based position of the failing input.
        index: usize,
    },
    /// The handler failed; the cache slot kept its previous contents.
    HandlerError,
}

/// Tracer trait for observing loader invocations.
///
/// Implementations can collect events for testing, forward to a logging
/// backend, or feed custom instrumentation. All `on_*` methods have default
/// empty implementations, so only the events of interest need overriding.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a shared loader may invoke the
/// tracer from multiple tasks.
pub trait Tracer: Send + Sync + 'static {
    /// Generate a new unique span ID.
    ///
    /// This is the only required method. Called once at the start of each
    /// invocation.
    fn new_span_id(&self) -> SpanId;

    /// Called when an invocation starts, before any input runs.
    #[inline]
    fn on_call_start(&self, _span_id: SpanId, _loader: &str) {}

    /// Called after all inputs resolved, with the aggregate decision.
    ///
    /// `cached` is `true` exactly when the handler is about to be skipped.
    #[inline]
    fn on_cache_decision(&self, _span_id: SpanId, _loader: &str, _cached: bool) {}

    /// Called immediately before the handler runs.
    ///
    /// Not called on cache hits or input errors.
    #[inline]
    fn on_handler_start(&self, _span_id: SpanId, _loader: &str) {}

    /// Called when an invocation ends, with its terminal classification.
    #[inline]
    fn on_call_end(&self, _span_id: SpanId, _loader: &str, _result: InvocationResult) {}
}

/// Zero-cost tracer that discards all events.
pub struct NoopTracer;

/// Global span counter for NoopTracer.
static NOOP_SPAN_COUNTER: AtomicU64 = AtomicU64::new(1);

impl Tracer for NoopTracer {
    #[inline(always)]
    fn new_span_id(&self) -> SpanId {
        SpanId(NOOP_SPAN_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
    // All other methods use the default empty implementations
}
