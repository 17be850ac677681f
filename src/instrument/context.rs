//! Call-scoped invocation context.
//!
//! The current invocation is bound with a task-local scope whose lifetime is
//! exactly one wrapped call. Nothing is keyed by thread, so a worker thread
//! interleaving many tasks never sees another call's context.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

tokio::task_local! {
    static CURRENT: InvocationContext;
}

/// Read-only view of the invocation being executed.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub invocation_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub operation: Arc<str>,
    started: Instant,
}

impl InvocationContext {
    pub(crate) fn new(
        invocation_id: Uuid,
        parent_id: Option<Uuid>,
        operation: Arc<str>,
        started: Instant,
    ) -> Self {
        Self {
            invocation_id,
            parent_id,
            operation,
            started,
        }
    }

    /// Context of the innermost instrumented call on this task, if any.
    ///
    /// Spawned tasks do not inherit the context.
    pub fn current() -> Option<InvocationContext> {
        CURRENT.try_with(|ctx| ctx.clone()).ok()
    }

    /// Id of the innermost instrumented call, used as the parent of nested calls.
    pub fn current_id() -> Option<Uuid> {
        CURRENT.try_with(|ctx| ctx.invocation_id).ok()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

pub(crate) fn sync_scope<R>(ctx: InvocationContext, f: impl FnOnce() -> R) -> R {
    CURRENT.sync_scope(ctx, f)
}

pub(crate) async fn scope<F: Future>(ctx: InvocationContext, fut: F) -> F::Output {
    CURRENT.scope(ctx, fut).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(operation: &str) -> InvocationContext {
        InvocationContext::new(Uuid::new_v4(), None, Arc::from(operation), Instant::now())
    }

    #[test]
    fn test_no_context_outside_scope() {
        assert!(InvocationContext::current().is_none());
    }

    #[test]
    fn test_sync_scope_nesting() {
        let outer = ctx("outer");
        let outer_id = outer.invocation_id;

        sync_scope(outer, || {
            assert_eq!(InvocationContext::current_id(), Some(outer_id));
            sync_scope(ctx("inner"), || {
                let current = InvocationContext::current().unwrap();
                assert_eq!(&*current.operation, "inner");
            });
            assert_eq!(InvocationContext::current_id(), Some(outer_id));
        });

        assert!(InvocationContext::current_id().is_none());
    }

    #[tokio::test]
    async fn test_async_scopes_are_isolated() {
        let a = ctx("a");
        let b = ctx("b");
        let (a_id, b_id) = (a.invocation_id, b.invocation_id);

        let fa = scope(a, async {
            tokio::task::yield_now().await;
            InvocationContext::current_id()
        });
        let fb = scope(b, async {
            tokio::task::yield_now().await;
            InvocationContext::current_id()
        });

        let (ra, rb) = tokio::join!(fa, fb);
        assert_eq!(ra, Some(a_id));
        assert_eq!(rb, Some(b_id));
    }
}
