//! The typed request handed to handlers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::method::Method;
use crate::router::RouteId;
use crate::value::Value;

/// A matched, bound and validated request.
///
/// Produced only when every declared parameter coerced and passed its
/// constraints. Path and query parameters share one namespace; nested
/// schemas appear as [`Value::Object`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundRequest {
    #[serde(skip)]
    pub(crate) route: RouteId,
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) pattern: String,
    pub(crate) params: BTreeMap<String, Value>,
}

impl BoundRequest {
    pub fn route(&self) -> RouteId { self.route }
    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }

    /// The pattern of the route that matched, e.g. `/items/{item_id}`.
    pub fn pattern(&self) -> &str { &self.pattern }

    pub fn params(&self) -> &BTreeMap<String, Value> { &self.params }

    pub fn into_params(self) -> BTreeMap<String, Value> { self.params }

    /// Returns a bound parameter by name.
    ///
    /// For a route `/items/{item_id}` with `item_id` declared as an integer,
    /// `req.param("item_id")` on `/items/3` returns `Some(&Value::Int(3))`.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.param(name).and_then(Value::as_i64)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.param(name).and_then(Value::as_f64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.param(name).and_then(Value::as_bool)
    }

    /// `None` for absent optional parameters as well as non-text values.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(Value::as_str)
    }
}
