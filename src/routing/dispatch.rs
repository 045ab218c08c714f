//! Handler dispatch.
//!
//! # Responsibilities
//! - Resolve a request against the route table
//! - Invoke the matched handler with the captured parameters
//! - Turn "no route" into an outcome and handler failures into an error
//!
//! # Design Decisions
//! - No retries: each request resolves and invokes at most once
//! - Handler errors are wrapped, never rewritten or swallowed
//! - The handler type is opaque; callers decide how to invoke it

use std::future::Future;

use thiserror::Error;

use crate::routing::matcher::Params;
use crate::routing::router::RouteTable;

/// Result of a dispatch that did not fail.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// A route matched and its handler produced `T`.
    Handled(T),
    /// No registered route accepts this method and path.
    RouteNotFound,
}

impl<T> Outcome<T> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Outcome::RouteNotFound)
    }
}

/// A matched handler returned an error.
#[derive(Debug, Error)]
pub enum DispatchError<E> {
    #[error("handler failed: {0}")]
    Internal(#[source] E),
}

impl<E> DispatchError<E> {
    /// The handler's original error.
    pub fn into_inner(self) -> E {
        match self {
            DispatchError::Internal(e) => e,
        }
    }
}

/// Frozen route table plus the dispatch entry points.
#[derive(Debug)]
pub struct Dispatcher<H> {
    table: RouteTable<H>,
}

impl<H> Dispatcher<H> {
    /// Freeze `table`; no routes can be added afterwards.
    pub fn new(table: RouteTable<H>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RouteTable<H> {
        &self.table
    }

    /// Resolve and invoke synchronously.
    pub fn dispatch<T, E, F>(
        &self,
        path: &str,
        method: &str,
        invoke: F,
    ) -> Result<Outcome<T>, DispatchError<E>>
    where
        F: FnOnce(&H, Params) -> Result<T, E>,
    {
        let Some(matched) = self.table.resolve(path, method) else {
            tracing::debug!(method = %method, path = %path, "No route matched");
            return Ok(Outcome::RouteNotFound);
        };

        tracing::debug!(
            method = %method,
            path = %path,
            route = %matched.route.pattern().template(),
            params = matched.params.len(),
            "Route matched"
        );

        invoke(matched.route.handler(), matched.params)
            .map(Outcome::Handled)
            .map_err(DispatchError::Internal)
    }

    /// Resolve synchronously, then await the handler's future.
    ///
    /// The future returned by `invoke` must not borrow the handler; clone
    /// whatever it needs out of `&H` first.
    pub async fn dispatch_async<T, E, F, Fut>(
        &self,
        path: &str,
        method: &str,
        invoke: F,
    ) -> Result<Outcome<T>, DispatchError<E>>
    where
        F: FnOnce(&H, Params) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let future = match self.dispatch(path, method, |handler, params| {
            Ok::<_, E>(invoke(handler, params))
        })? {
            Outcome::Handled(future) => future,
            Outcome::RouteNotFound => return Ok(Outcome::RouteNotFound),
        };

        future
            .await
            .map(Outcome::Handled)
            .map_err(DispatchError::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq, Error)]
    #[error("boom: {0}")]
    struct Boom(String);

    fn dispatcher() -> Dispatcher<&'static str> {
        let mut table = RouteTable::new();
        table
            .get("/api/instance/{instanceId}/channel/{channelId}", "channel")
            .unwrap()
            .constrain("instanceId", r"\d+")
            .unwrap();
        table.delete("/api/instance/{instanceId}", "delete").unwrap();
        Dispatcher::new(table)
    }

    #[test]
    fn test_dispatch_passes_ordered_params() {
        let dispatcher = dispatcher();
        let outcome = dispatcher.dispatch("/api/instance/5/channel/cam", "GET", |handler, params| {
            Ok::<_, Boom>(format!("{handler}:{}", params.into_values().join(",")))
        });

        assert_eq!(outcome.unwrap(), Outcome::Handled("channel:5,cam".to_string()));
    }

    #[test]
    fn test_dispatch_not_found_never_invokes() {
        let dispatcher = dispatcher();
        let outcome = dispatcher.dispatch("/api/instance/x/channel/cam", "GET", |_, _| {
            Err::<(), _>(Boom("should not run".into()))
        });

        assert!(outcome.unwrap().is_not_found());
    }

    #[test]
    fn test_dispatch_wraps_handler_error() {
        let dispatcher = dispatcher();
        let err = dispatcher
            .dispatch("/api/instance/9", "delete", |_, params| {
                Err::<(), _>(Boom(params.get("instanceId").unwrap_or_default().to_string()))
            })
            .unwrap_err();

        assert_eq!(err.to_string(), "handler failed: boom: 9");
        assert_eq!(err.into_inner(), Boom("9".into()));
    }

    #[tokio::test]
    async fn test_dispatch_async() {
        let dispatcher = dispatcher();

        let outcome = dispatcher
            .dispatch_async("/api/instance/1", "DELETE", |handler, params| {
                let handler = handler.to_string();
                async move { Ok::<_, Boom>(format!("{handler}:{}", params.values().count())) }
            })
            .await;
        assert_eq!(outcome.unwrap(), Outcome::Handled("delete:1".to_string()));

        let outcome = dispatcher
            .dispatch_async("/nope", "GET", |_, _| async { Ok::<(), Boom>(()) })
            .await;
        assert!(outcome.unwrap().is_not_found());

        let err = dispatcher
            .dispatch_async("/api/instance/1", "DELETE", |_, _| async {
                Err::<(), _>(Boom("late".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(err.into_inner(), Boom("late".into()));
    }
}
