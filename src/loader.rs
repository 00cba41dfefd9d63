//! The loader: factory, cache slot, and invocation engine.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::error::LoadError;
use crate::handler::Handler;
use crate::input::AsyncInput;
use crate::input_list::InputList;
use crate::loaded::Loaded;
use crate::tracer::{InvocationResult, SpanId, Tracer};

/// State from the last successful handler invocation.
///
/// Both fields replace together or not at all; cache hits and errors never
/// touch the slot. The tuple type keeps the stored values positionally
/// parallel to the input list by construction.
struct CacheSlot<V, O> {
    inputs: V,
    result: Arc<O>,
}

/// A single-slot memoizing loader.
///
/// A loader composes an ordered tuple of [`Input`](crate::Input) functions
/// and one [`Handler`] into a single async callable. On each call the inputs
/// are evaluated in order and compared against the previous call; when every
/// input is unchanged the stored result is returned (the identical `Arc`)
/// and the handler is skipped.
///
/// A loader implements [`AsyncInput`], so it can itself be an input of
/// another loader; its cached flag then feeds the parent's decision
/// transitively.
///
/// # Example
///
/// ```ignore
/// use memo_flow::{Input, LoadError, Loader};
///
/// struct Params { id: String }
///
/// async fn fetch(id: String, limit: u32) -> Result<String, LoadError> {
///     Ok(format!("{id}:{limit}"))
/// }
///
/// let loader = Loader::new(
///     (Input::sync(|p: &Params| p.id.clone()), Input::sync(|_: &Params| 3)),
///     fetch,
/// );
///
/// let first = loader.load(&Params { id: "2".into() }).await?;
/// assert!(!first.cached);
/// let second = loader.load(&Params { id: "2".into() }).await?;
/// assert!(second.cached); // handler ran once
/// ```
pub struct Loader<Args, I, H>
where
    I: InputList<Args>,
    H: Handler<I::Values>,
{
    name: &'static str,
    inputs: I,
    handler: H,
    /// The one slot per instance, locked for the whole read-decide-write of
    /// an invocation so overlapping calls serialize instead of racing it.
    slot: Mutex<Option<CacheSlot<I::Values, H::Output>>>,
    tracer: RwLock<Option<Arc<dyn Tracer>>>,
    _args: PhantomData<fn(&Args)>,
}

impl<Args, I, H> Loader<Args, I, H>
where
    Args: Send + Sync,
    I: InputList<Args>,
    H: Handler<I::Values>,
{
    /// Create a loader from an ordered input tuple and a handler.
    ///
    /// The tuple order is both the evaluation order and the positional order
    /// of the handler's parameters. `()` builds a loader with no inputs,
    /// which recomputes on every call.
    pub fn new(inputs: I, handler: H) -> Self {
        Self::builder(inputs, handler).build()
    }

    /// Start building a loader, to set a name or install a tracer.
    pub fn builder(inputs: I, handler: H) -> LoaderBuilder<Args, I, H> {
        LoaderBuilder {
            name: "loader",
            tracer: None,
            inputs,
            handler,
            _args: PhantomData,
        }
    }

    /// The diagnostic name reported to the tracer.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of configured inputs.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Install or remove the tracer observing this loader.
    pub fn set_tracer(&self, tracer: Option<Arc<dyn Tracer>>) {
        *self.tracer.write() = tracer;
    }

    /// Invoke the loader.
    ///
    /// Evaluates the inputs strictly in order, each against its previously
    /// cached value. When the loader has at least one input, a populated
    /// slot, and every input reports unchanged, the stored result is
    /// returned with `cached = true` and the handler does not run.
    /// Otherwise the handler receives the fresh values positionally; on
    /// success both the stored inputs and the stored result are replaced
    /// together, and the new value is returned with `cached = false`.
    ///
    /// Any input or handler error is returned unchanged, the remaining
    /// inputs and the handler are skipped, and the slot keeps its previous
    /// contents.
    ///
    /// Overlapping calls on one instance are serialized in arrival order;
    /// the later call observes the earlier call's committed slot.
    ///
    /// A loader must not be reachable as one of its own transitive inputs:
    /// such a cycle would deadlock on the invocation lock.
    pub async fn load(&self, args: &Args) -> Result<Loaded<Arc<H::Output>>, LoadError> {
        let span = self.new_span();
        self.emit(|t| t.on_call_start(span, self.name));

        let mut slot = self.slot.lock().await;

        let previous = slot.as_ref().map(|state| &state.inputs);
        let resolved = match self.inputs.resolve(args, previous).await {
            Ok(resolved) => resolved,
            Err(failure) => {
                self.emit(|t| {
                    t.on_call_end(
                        span,
                        self.name,
                        InvocationResult::InputError {
                            index: failure.index,
                        },
                    )
                });
                return Err(failure.error);
            }
        };

        // An empty input list always recomputes, and a hit needs a stored
        // result to return: all-async inputs can report unchanged while this
        // instance's own slot is still empty.
        let hit = resolved.cached && !self.inputs.is_empty() && slot.is_some();
        self.emit(|t| t.on_cache_decision(span, self.name, hit));

        if let (true, Some(state)) = (hit, slot.as_ref()) {
            let result = state.result.clone();
            self.emit(|t| t.on_call_end(span, self.name, InvocationResult::CacheHit));
            return Ok(Loaded::unchanged(result));
        }

        self.emit(|t| t.on_handler_start(span, self.name));
        match self.handler.run(resolved.value.clone()).await {
            Ok(result) => {
                let result = Arc::new(result);
                *slot = Some(CacheSlot {
                    inputs: resolved.value,
                    result: result.clone(),
                });
                self.emit(|t| t.on_call_end(span, self.name, InvocationResult::Recomputed));
                Ok(Loaded::fresh(result))
            }
            Err(error) => {
                self.emit(|t| t.on_call_end(span, self.name, InvocationResult::HandlerError));
                Err(error)
            }
        }
    }

    /// Invoke the loader and return just the value.
    pub async fn get(&self, args: &Args) -> Result<Arc<H::Output>, LoadError> {
        self.load(args).await.map(Loaded::into_value)
    }

    /// The result of the last successful invocation, if any.
    ///
    /// Read-only: runs neither inputs nor handler and never changes the
    /// slot.
    pub async fn peek(&self) -> Option<Arc<H::Output>> {
        self.slot
            .lock()
            .await
            .as_ref()
            .map(|state| state.result.clone())
    }

    /// Emit an event to the tracer if one is installed.
    fn emit(&self, f: impl FnOnce(&dyn Tracer)) {
        let guard = self.tracer.read();
        if let Some(tracer) = guard.as_deref() {
            f(tracer);
        }
    }

    fn new_span(&self) -> SpanId {
        self.tracer
            .read()
            .as_deref()
            .map_or(SpanId(0), |tracer| tracer.new_span_id())
    }
}

/// Nesting: a loader is itself an async input, reporting its own cache
/// decision upward.
#[async_trait]
impl<Args, I, H> AsyncInput<Args> for Loader<Args, I, H>
where
    Args: Send + Sync,
    I: InputList<Args>,
    H: Handler<I::Values>,
{
    type Value = Arc<H::Output>;

    async fn load(&self, args: &Args) -> Result<Loaded<Self::Value>, LoadError> {
        Loader::load(self, args).await
    }
}

impl<Args, I, H> fmt::Debug for Loader<Args, I, H>
where
    I: InputList<Args>,
    H: Handler<I::Values>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("name", &self.name)
            .field("inputs", &self.inputs.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Loader`] configuration.
///
/// Obtained from [`Loader::builder`]; `name` and `tracer` are optional, the
/// inputs and handler are fixed up front.
pub struct LoaderBuilder<Args, I, H> {
    name: &'static str,
    tracer: Option<Arc<dyn Tracer>>,
    inputs: I,
    handler: H,
    _args: PhantomData<fn(&Args)>,
}

impl<Args, I, H> LoaderBuilder<Args, I, H>
where
    Args: Send + Sync,
    I: InputList<Args>,
    H: Handler<I::Values>,
{
    /// Diagnostic name reported to the tracer (default `"loader"`).
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Tracer observing this loader from construction on.
    pub fn tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Finish construction; the slot starts empty.
    pub fn build(self) -> Loader<Args, I, H> {
        Loader {
            name: self.name,
            inputs: self.inputs,
            handler: self.handler,
            slot: Mutex::new(None),
            tracer: RwLock::new(self.tracer),
            _args: PhantomData,
        }
    }
}
