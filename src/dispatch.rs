//! Request dispatch: match → bind → validate → handler.
//!
//! ```text
//! (method, path, query)
//!     → RouteTable::find        first matching route for the method
//!         ├─ none for method, some for others → MethodNotAllowed
//!         └─ none at all                      → NotFound
//!     → binder::bind            raw captures + query pairs → typed values
//!         └─ any error          → Invalid(envelope), handler not called
//!     → Bound(BoundRequest)     → handler
//! ```
//!
//! Every stage is a pure function of the frozen table and the request's own
//! input. A [`Dispatcher`] is cheap to clone and safe to share across
//! threads; no stage takes a lock.

use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, error, info};

use crate::binder::{bind, parse_query};
use crate::config::DispatchConfig;
use crate::envelope::ErrorEnvelope;
use crate::method::Method;
use crate::request::BoundRequest;
use crate::response::{Detail, IntoResponse, Json, Response, with_status};
use crate::router::{RouteTable, Router};

// ── Resolution ───────────────────────────────────────────────────────────────

/// The outcome of routing and validating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Bound(BoundRequest),
    Invalid(ErrorEnvelope),
    NotFound,
    /// The path matches routes for these methods only.
    MethodNotAllowed(Vec<Method>),
}

impl Resolution {
    /// Splits a successful resolution from the response every other outcome
    /// renders to.
    pub fn into_bound(self) -> Result<BoundRequest, Response> {
        match self {
            Self::Bound(req) => Ok(req),
            Self::Invalid(envelope) => Err(envelope.into_response()),
            Self::NotFound => Err(with_status(StatusCode::NOT_FOUND, Json(Detail { detail: "Not Found" }))),
            Self::MethodNotAllowed(allowed) => {
                let allow: Vec<&str> = allowed.iter().map(|m| m.as_str()).collect();
                let mut res = with_status(StatusCode::METHOD_NOT_ALLOWED, Json(Detail { detail: "Method Not Allowed" }));
                res.headers.push(("allow".to_owned(), allow.join(", ")));
                Err(res)
            }
        }
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────────────

/// Routes requests against a frozen table.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self::with_config(router, DispatchConfig::default())
    }

    pub fn with_config(router: Router, config: DispatchConfig) -> Self {
        let table = router.into_table();
        info!(routes = table.len(), "route table frozen");
        Self { table: Arc::new(table), config }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Matches, binds and validates without invoking any handler.
    ///
    /// `method` is the raw method string from the transport; `query` is the
    /// raw query string without the leading `?`.
    pub fn resolve(&self, method: &str, path: &str, query: &str) -> Resolution {
        let method = method.parse::<Method>().ok();
        let found = method.and_then(|m| {
            self.table.find(m, path).or_else(|| {
                (m == Method::Head && self.config.routing.head_falls_back_to_get)
                    .then(|| self.table.find(Method::Get, path))
                    .flatten()
            })
        });

        let (Some(method), Some(matched)) = (method, found) else {
            let allowed = self.allowed_methods(path);
            return if allowed.is_empty() {
                debug!(path, "no route");
                Resolution::NotFound
            } else {
                debug!(path, ?allowed, "method not allowed");
                Resolution::MethodNotAllowed(allowed)
            };
        };

        let route = matched.route;
        let pairs = parse_query(query, self.config.query.plus_as_space);
        match bind(&matched, &pairs, &self.config.query) {
            Ok(params) => {
                debug!(%method, path, route = %route.id(), "bound");
                Resolution::Bound(BoundRequest {
                    route: route.id(),
                    method,
                    path: path.to_owned(),
                    pattern: route.pattern().as_str().to_owned(),
                    params,
                })
            }
            Err(envelope) => {
                debug!(%method, path, route = %route.id(), errors = envelope.len(), "validation failed");
                Resolution::Invalid(envelope)
            }
        }
    }

    /// Resolves the request and, when it binds, runs the route's handler.
    pub async fn dispatch(&self, method: &str, path: &str, query: &str) -> Response {
        let req = match self.resolve(method, path, query).into_bound() {
            Ok(req) => req,
            Err(res) => return res,
        };
        let Some(route) = self.table.get(req.route()) else {
            error!(route = %req.route(), "bound route missing from table");
            return Response::status(StatusCode::INTERNAL_SERVER_ERROR);
        };
        let handler = Arc::clone(&route.handler);
        handler.call(req).await
    }

    /// Like [`dispatch`](Self::dispatch), taking a request target such as
    /// `/items/3?q=x`.
    pub async fn dispatch_target(&self, method: &str, target: &str) -> Response {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        self.dispatch(method, path, query).await
    }

    fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut allowed = self.table.allowed_methods(path);
        if self.config.routing.head_falls_back_to_get && !allowed.contains(&Method::Head) {
            if let Some(i) = allowed.iter().position(|&m| m == Method::Get) {
                allowed.insert(i + 1, Method::Head);
            }
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, Schema};

    async fn echo(req: BoundRequest) -> Json<BoundRequest> {
        Json(req)
    }

    fn dispatcher(config: DispatchConfig) -> Dispatcher {
        let mut router = Router::new();
        router
            .register(Method::Get, "/items/{item_id}", Schema::new("Item").field("item_id", Field::int()), echo)
            .unwrap();
        router.register(Method::Delete, "/items/{item_id}", Schema::default(), echo).unwrap();
        Dispatcher::with_config(router, config)
    }

    #[test]
    fn distinguishes_not_found_from_method_not_allowed() {
        let d = dispatcher(DispatchConfig::default());
        assert_eq!(d.resolve("GET", "/nothing", ""), Resolution::NotFound);
        assert_eq!(
            d.resolve("POST", "/items/3", ""),
            Resolution::MethodNotAllowed(vec![Method::Get, Method::Head, Method::Delete])
        );
        assert!(matches!(d.resolve("BREW", "/items/3", ""), Resolution::MethodNotAllowed(_)));
        assert_eq!(d.resolve("BREW", "/nothing", ""), Resolution::NotFound);
    }

    #[test]
    fn head_falls_back_to_get_unless_disabled() {
        let d = dispatcher(DispatchConfig::default());
        let Resolution::Bound(req) = d.resolve("HEAD", "/items/3", "") else {
            panic!("HEAD should be served by the GET route");
        };
        assert_eq!(req.method(), Method::Head);
        assert_eq!(req.int("item_id"), Some(3));

        let mut config = DispatchConfig::default();
        config.routing.head_falls_back_to_get = false;
        let strict = dispatcher(config);
        assert_eq!(
            strict.resolve("HEAD", "/items/3", ""),
            Resolution::MethodNotAllowed(vec![Method::Get, Method::Delete])
        );
    }

    #[test]
    fn method_not_allowed_renders_allow_header() {
        let d = dispatcher(DispatchConfig::default());
        let res = d.resolve("PUT", "/items/3", "").into_bound().unwrap_err();
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.header("allow"), Some("GET, HEAD, DELETE"));
        assert_eq!(res.body(), br#"{"detail":"Method Not Allowed"}"#);
    }

    #[tokio::test]
    async fn handler_receives_bound_request() {
        let d = dispatcher(DispatchConfig::default());
        let res = d.dispatch_target("GET", "/items/42?ignored=1").await;
        assert_eq!(res.status_code(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["params"]["item_id"], 42);
        assert_eq!(body["pattern"], "/items/{item_id}");

        let not_found = d.dispatch_target("GET", "/").await;
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.body(), br#"{"detail":"Not Found"}"#);
    }
}
