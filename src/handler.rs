//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! Every [`Route`](crate::Route) in the table carries a handler of a
//! *different* concrete type, but the table is a single `Vec<Route>`. Handlers
//! are therefore hidden behind a trait object (`dyn ErasedHandler`) and
//! shared through an `Arc`.
//!
//! ```text
//! async fn read_item(req: BoundRequest) -> Json<Item> { … }   ← user writes this
//!        ↓ router.register(Method::Get, "/items/{id}", schema, read_item)
//! read_item.into_boxed_handler()                             ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(read_item))                             ← stored in the Route
//!        ↓  BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(bound)  once validation succeeded             ← one vtable dispatch
//!        ↓
//! Box::pin(async { read_item(bound).await.into_response() })
//! ```
//!
//! Handlers only ever see a [`BoundRequest`]. Requests that fail to route or
//! validate never reach them.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::BoundRequest;
use crate::response::{IntoResponse, Response};

// ── Internal types ───────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: BoundRequest) -> BoxFuture;
}

/// A type-erased handler shared by the route table and every in-flight
/// dispatch.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ─────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure with the shape:
///
/// ```text
/// async fn name(req: BoundRequest) -> impl IntoResponse
/// ```
///
/// Sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ──────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(BoundRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(BoundRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ─────────────────────────────────────────────────────────

/// Bridges a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(BoundRequest) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: BoundRequest) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
