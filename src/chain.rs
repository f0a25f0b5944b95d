//! Middleware composition: ordered handler lists chained through a
//! continuation.
//!
//! A [`Handler`] receives the mutable request context and a [`Next`]
//! continuation holding the rest of the chain. Calling [`Next::run`] hands
//! control downstream; not calling it short-circuits the remainder (a
//! terminal handler). [`compose`] folds an ordered handler list into a single
//! handler that splices its stack ahead of whatever continuation it is given,
//! so a composed chain behaves as one unit inside a larger chain.

use crate::context::RequestContext;
use crate::error::HttpError;
use std::collections::VecDeque;
use std::sync::Arc;

/// Outcome of one handler invocation. `Err` unwinds to the router boundary.
pub type HandlerResult = Result<(), HttpError>;

/// A single middleware handler.
pub type Handler = Arc<dyn Fn(&mut RequestContext, Next) -> HandlerResult + Send + Sync>;

/// A parameter handler, invoked with the value captured from the path before
/// the route's ordinary middleware runs.
pub type ParamHandler = Arc<dyn Fn(&mut RequestContext, Next, &str) -> HandlerResult + Send + Sync>;

/// The remainder of a handler chain.
///
/// Owned and consumed by value: a handler can run its continuation at most
/// once. Handlers are `Arc`s, so the queue clones cheaply when a caller needs
/// to retry the continuation from an error boundary.
#[derive(Clone)]
pub struct Next {
    queue: VecDeque<Handler>,
}

impl Next {
    /// An empty continuation: running it is a no-op.
    #[must_use]
    pub fn end() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Run the rest of the chain to completion.
    pub fn run(mut self, ctx: &mut RequestContext) -> HandlerResult {
        match self.queue.pop_front() {
            Some(handler) => handler(ctx, self),
            None => Ok(()),
        }
    }

    /// Splice a handler stack ahead of this continuation, keeping the
    /// stack's own order.
    pub(crate) fn prepend(&mut self, stack: &[Handler]) {
        for handler in stack.iter().rev() {
            self.queue.push_front(Arc::clone(handler));
        }
    }
}

/// Compose an ordered handler list into one handler.
///
/// The composed handler runs its stack in order and then falls through to
/// the continuation it was invoked with, so composition nests.
#[must_use]
pub fn compose(stack: Vec<Handler>) -> Handler {
    Arc::new(move |ctx, mut next| {
        next.prepend(&stack);
        next.run(ctx)
    })
}

/// Wrap a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> Handler
where
    F: Fn(&mut RequestContext, Next) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`ParamHandler`].
pub fn param_fn<F>(f: F) -> ParamHandler
where
    F: Fn(&mut RequestContext, Next, &str) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}
