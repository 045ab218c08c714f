//! Gateway API.
//!
//! # Responsibilities
//! - Define the handler type stored in the route table
//! - Let each controller register its own routes
//! - Assemble the frozen dispatcher used by the HTTP server
//!
//! # Design Decisions
//! - Handlers receive route parameters first, then the request context
//! - Controllers are shared via `Arc`; handlers hold a clone each

pub mod error;
pub mod info;
pub mod instance;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::response::Response;
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::http::RequestContext;
use crate::instances::{InstancePool, InstanceStore};
use crate::routing::{Dispatcher, Params, PatternError, RouteTable};

pub use error::ApiError;
pub use info::{DocumentError, InfoController};
pub use instance::InstanceController;

pub type HandlerFuture = BoxFuture<'static, Result<Response, ApiError>>;

/// Type-erased endpoint stored in the route table.
#[derive(Clone)]
pub struct Handler(Arc<dyn Fn(Params, RequestContext) -> HandlerFuture + Send + Sync>);

impl Handler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Params, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
    {
        Self(Arc::new(
            move |params: Params, context: RequestContext| -> HandlerFuture {
                Box::pin(f(params, context))
            },
        ))
    }

    pub fn call(&self, params: Params, context: RequestContext) -> HandlerFuture {
        (self.0)(params, context)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

/// Build a handler that calls `f` with a clone of `controller`.
pub fn bind<C, F, Fut>(controller: &Arc<C>, f: F) -> Handler
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, Params, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    let controller = Arc::clone(controller);
    Handler::new(move |params, context| f(Arc::clone(&controller), params, context))
}

/// A group of endpoints registered together.
pub trait Controller: Send + Sync + 'static {
    fn add_routes(self: Arc<Self>, table: &mut RouteTable<Handler>) -> Result<(), PatternError>;
}

/// Errors assembling the dispatcher.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Register every controller and freeze the table.
pub fn build_dispatcher(
    store: Arc<dyn InstanceStore>,
    pool: Arc<InstancePool>,
) -> Result<Dispatcher<Handler>, BuildError> {
    let controllers: Vec<Arc<dyn Controller>> = vec![
        Arc::new(InfoController::new()?),
        Arc::new(InstanceController::new(store, pool)),
    ];

    let mut table = RouteTable::new();
    for controller in controllers {
        controller.add_routes(&mut table)?;
    }

    tracing::info!(routes = table.len(), "Routes registered");
    Ok(Dispatcher::new(table))
}
