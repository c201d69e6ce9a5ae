//! # tollgate
//!
//! Declarative routing with typed parameter binding for Rust services.
//!
//! Routes are declared as `(method, pattern, schema, handler)`. A request's
//! path is matched against the patterns in registration order, its path
//! captures and query string are coerced into the declared types, and every
//! constraint is checked. The handler runs only when all of that succeeds;
//! otherwise the caller gets one envelope holding *every* problem at once.
//!
//! ## What tollgate does
//!
//! - Ordered first-match routing: `/users/me` before `/users/{user_id}`
//! - `{name}` parameters, enum-constrained segments, `{name:path}` tails
//! - Coercion to int, float, bool, text, enum and unions of those
//! - Length, pattern and numeric bound constraints, nested schemas, lists
//! - Aggregated `422` errors with `type`, `loc`, `msg`, `input` and `url`
//! - `404` vs `405` with an `allow` header, `HEAD` served by `GET`
//!
//! ## What it leaves to the transport
//!
//! Sockets, HTTP parsing, request bodies, TLS. A [`Response`] converts into
//! an [`http::Response`] with [`Response::into_http`]; any server can carry it.
//!
//! ## Quick start
//!
//! ```rust
//! use tollgate::{BoundRequest, Dispatcher, Field, Json, Method, Router, Schema, StatusCode};
//!
//! async fn read_item(req: BoundRequest) -> Json<BoundRequest> {
//!     Json(req)
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let router = Router::new().on(
//!     Method::Get,
//!     "/items/{item_id}",
//!     Schema::new("ReadItem")
//!         .field("item_id", Field::int())
//!         .field("q", Field::text().optional()),
//!     read_item,
//! );
//! let app = Dispatcher::new(router);
//!
//! let ok = app.dispatch("GET", "/items/5", "q=somequery").await;
//! assert_eq!(ok.status_code(), StatusCode::OK);
//!
//! let bad = app.dispatch("GET", "/items/foo", "").await;
//! assert_eq!(bad.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
//! # });
//! ```

mod coerce;
mod config;
mod dispatch;
mod envelope;
mod error;
mod handler;
mod matcher;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod schema;
mod value;

pub mod binder;

pub use coerce::{Coercion, ScalarType, coerce, coerce_union};
pub use config::{DispatchConfig, QueryConfig, RepeatedKeys, RoutingConfig};
pub use dispatch::{Dispatcher, Resolution};
pub use envelope::{ErrorEnvelope, ErrorKind, Loc, LocSegment, ValidationError};
pub use error::Error;
pub use handler::Handler;
pub use http::StatusCode;
pub use matcher::Match;
pub use method::{Method, UnknownMethod};
pub use pattern::{RoutePattern, Segment, split_path};
pub use request::BoundRequest;
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use router::{Route, RouteId, RouteTable, Router};
pub use schema::{Bound, Constraints, Field, FieldKind, Schema};
pub use value::{RawValue, Value};
