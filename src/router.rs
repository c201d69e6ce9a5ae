//! Route registry.
//!
//! Routes are declared once at startup, in order, and frozen into a
//! [`RouteTable`]. Registration is where every structural mistake surfaces:
//! malformed patterns, duplicate `(method, pattern)` pairs, parameter
//! declarations no request could satisfy. Nothing here runs per request.
//!
//! Order matters. For each method the table is scanned in registration
//! order and the first full match wins, so a literal route such as
//! `/users/me` must be registered before `/users/{user_id}` or it will never
//! be reached.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::coerce::ScalarType;
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::pattern::RoutePattern;
use crate::schema::{Field, FieldKind, Schema};

/// Position of a route in registration order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RouteId(usize);

impl RouteId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One registered route. Immutable once built.
pub struct Route {
    id: RouteId,
    method: Method,
    pattern: RoutePattern,
    path_params: Vec<(String, Field)>,
    query: Schema,
    pub(crate) handler: BoxedHandler,
}

impl Route {
    pub fn id(&self) -> RouteId { self.id }
    pub fn method(&self) -> Method { self.method }
    pub fn pattern(&self) -> &RoutePattern { &self.pattern }

    /// Path parameters in pattern order.
    pub fn path_params(&self) -> &[(String, Field)] { &self.path_params }

    /// Everything declared that is not a path parameter.
    pub fn query(&self) -> &Schema { &self.query }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("path_params", &self.path_params.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("query", &self.query.fields().map(|(n, _)| n).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// The route table under construction.
///
/// ```rust
/// use tollgate::{BoundRequest, Field, Method, Router, Schema};
///
/// async fn read_item(req: BoundRequest) -> String {
///     format!("item {}", req.int("item_id").unwrap_or_default())
/// }
///
/// let mut router = Router::new();
/// router.register(
///     Method::Get,
///     "/items/{item_id}",
///     Schema::new("ReadItem").field("item_id", Field::int()),
///     read_item,
/// )?;
/// let table = router.into_table();
/// assert_eq!(table.len(), 1);
/// # Ok::<(), tollgate::Error>(())
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a handler for a method + pattern pair.
    ///
    /// Fields of `params` named after a `{name}` segment are path
    /// parameters; the rest are query parameters. Pattern segments without a
    /// declaration bind as required text.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        params: Schema,
        handler: impl Handler,
    ) -> Result<RouteId, Error> {
        let mut parsed = RoutePattern::parse(pattern)?;

        if self.routes.iter().any(|r| r.method == method && r.pattern.as_str() == pattern) {
            return Err(Error::DuplicateRoute { method, pattern: pattern.to_owned() });
        }

        let names: Vec<String> = parsed.param_names().map(str::to_owned).collect();
        let mut path_params = Vec::with_capacity(names.len());
        for name in names {
            let field = params.get(&name).cloned().unwrap_or_else(Field::text);
            let FieldKind::Scalar(candidates) = field.kind() else {
                return Err(Error::schema(&name, "path parameters must be scalar"));
            };
            if let [ScalarType::Enum(allowed)] = candidates.as_slice() {
                parsed.constrain(&name, allowed)?;
            }
            path_params.push((name, field));
        }
        params.check()?;

        let query = params
            .fields()
            .filter(|(name, _)| !parsed.has_param(name))
            .fold(Schema::new(params.name()), |schema, (name, field)| schema.field(name, field.clone()));

        let id = RouteId(self.routes.len());
        debug!(route = %id, %method, pattern, "route registered");

        self.routes.push(Route {
            id,
            method,
            pattern: parsed,
            path_params,
            query,
            handler: handler.into_boxed_handler(),
        });
        Ok(id)
    }

    /// Chaining form of [`register`](Self::register) for static route lists.
    ///
    /// # Panics
    ///
    /// Panics if the route is invalid. Route tables are built at startup,
    /// so a bad declaration aborts the process before it serves anything.
    pub fn on(mut self, method: Method, pattern: &str, params: Schema, handler: impl Handler) -> Self {
        if let Err(e) = self.register(method, pattern, params, handler) {
            panic!("invalid route `{method} {pattern}`: {e}");
        }
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Freezes the registered routes.
    pub fn into_table(self) -> RouteTable {
        let mut by_method: HashMap<Method, Vec<usize>> = HashMap::new();
        for (i, route) in self.routes.iter().enumerate() {
            by_method.entry(route.method).or_default().push(i);
        }
        RouteTable { routes: self.routes, by_method }
    }
}

/// The immutable, ordered route table.
///
/// Shared across threads without locking. Lookups are
/// [`find`](RouteTable::find) and
/// [`allowed_methods`](RouteTable::allowed_methods).
#[derive(Debug)]
pub struct RouteTable {
    pub(crate) routes: Vec<Route>,
    pub(crate) by_method: HashMap<Method, Vec<usize>>,
}

impl RouteTable {
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(id.0)
    }

    /// All routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Routes for `method` in registration order.
    pub fn routes_for(&self, method: Method) -> impl Iterator<Item = &Route> {
        self.by_method
            .get(&method)
            .into_iter()
            .flatten()
            .map(|&i| &self.routes[i])
    }
}
