//! Path matching over a frozen [`RouteTable`].
//!
//! A pure function of the table and the request path. For one method the
//! routes are tried in registration order; the first whose pattern matches
//! every segment wins. Nothing is reordered by specificity.

use crate::method::Method;
use crate::pattern::split_path;
use crate::router::{Route, RouteTable};

/// A route selected for a request, with its raw path captures.
#[derive(Debug)]
pub struct Match<'t> {
    pub route: &'t Route,
    /// `(name, percent-decoded value)` in pattern order.
    pub captures: Vec<(&'t str, String)>,
}

impl RouteTable {
    /// Finds the first route for `method` whose pattern matches `path`.
    pub fn find(&self, method: Method, path: &str) -> Option<Match<'_>> {
        let segments = split_path(path);
        self.routes_for(method).find_map(|route| {
            route
                .pattern()
                .captures(&segments)
                .map(|captures| Match { route, captures })
        })
    }

    /// Methods with at least one route whose pattern matches `path`, in
    /// [`Method::ALL`] order.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let segments = split_path(path);
        Method::ALL
            .into_iter()
            .filter(|&m| self.routes_for(m).any(|r| r.pattern().captures(&segments).is_some()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{BoundRequest, Field, Method, Router, Schema};

    async fn noop(_req: BoundRequest) -> &'static str {
        "ok"
    }

    fn table(routes: &[(Method, &str)]) -> crate::RouteTable {
        let mut router = Router::new();
        for (method, pattern) in routes {
            router.register(*method, pattern, Schema::default(), noop).unwrap();
        }
        router.into_table()
    }

    #[test]
    fn first_registered_match_wins() {
        let me_first = table(&[(Method::Get, "/users/me"), (Method::Get, "/users/{user_id}")]);
        let m = me_first.find(Method::Get, "/users/me").unwrap();
        assert_eq!(m.route.pattern().as_str(), "/users/me");
        assert!(m.captures.is_empty());

        let param_first = table(&[(Method::Get, "/users/{user_id}"), (Method::Get, "/users/me")]);
        let m = param_first.find(Method::Get, "/users/me").unwrap();
        assert_eq!(m.route.pattern().as_str(), "/users/{user_id}");
        assert_eq!(m.captures, [("user_id", "me".to_owned())]);
    }

    #[test]
    fn other_methods_do_not_match() {
        let t = table(&[(Method::Post, "/items/{item_id}")]);
        assert!(t.find(Method::Get, "/items/3").is_none());
        assert!(t.find(Method::Post, "/items/3").is_some());
    }

    #[test]
    fn a_failed_route_falls_through_to_the_next() {
        let t = table(&[
            (Method::Get, "/users/{user_id}/items/{item_id}"),
            (Method::Get, "/users/{user_id}"),
        ]);
        let m = t.find(Method::Get, "/users/7").unwrap();
        assert_eq!(m.route.id().index(), 1);
    }

    #[test]
    fn allowed_methods_lists_matching_shapes() {
        let t = table(&[
            (Method::Delete, "/items/{item_id}"),
            (Method::Get, "/items/{item_id}"),
            (Method::Post, "/items/"),
        ]);
        assert_eq!(t.allowed_methods("/items/3"), [Method::Get, Method::Delete]);
        assert_eq!(t.allowed_methods("/items/"), [Method::Post]);
        assert!(t.allowed_methods("/nothing").is_empty());
    }

    #[test]
    fn enum_segments_match_any_value() {
        let mut router = Router::new();
        let params = Schema::new("Model").field("model_name", Field::one_of(["alexnet"]));
        router.register(Method::Get, "/models/{model_name}", params, noop).unwrap();
        let t = router.into_table();
        assert!(t.find(Method::Get, "/models/vgg").is_some());
    }
}
