//! Parameter binding: raw path captures and query pairs → validated values.
//!
//! Query keys are matched against the route's declared query schema:
//!
//! - a scalar field takes one occurrence of its key (last by default, see
//!   [`RepeatedKeys`]);
//! - a list field takes every occurrence, in order;
//! - an object field takes every key prefixed with `name.`, recursively
//!   (`address.zip_code=02134`).
//!
//! Undeclared keys are ignored. Path parameters are located under `"path"`,
//! query parameters under `"query"`, and all errors from both are collected
//! before anything is returned.

use std::collections::BTreeMap;

use crate::config::{QueryConfig, RepeatedKeys};
use crate::envelope::{ErrorEnvelope, LocSegment, child};
use crate::matcher::Match;
use crate::pattern::percent_decode;
use crate::schema::{FieldKind, Schema};
use crate::value::{RawValue, Value};

const PAIR_SEPARATOR: char = '&';
const KEY_VALUE_SEPARATOR: char = '=';
const NESTED_SEPARATOR: char = '.';

/// Splits and percent-decodes a query string into ordered `(key, value)`
/// pairs. A piece without `=` is a key with an empty value; empty pieces are
/// skipped. Invalid UTF-8 decodes to U+FFFD.
pub fn parse_query(query: &str, plus_as_space: bool) -> Vec<(String, String)> {
    query
        .split(PAIR_SEPARATOR)
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            let (k, v) = piece.split_once(KEY_VALUE_SEPARATOR).unwrap_or((piece, ""));
            (decode(k, plus_as_space), decode(v, plus_as_space))
        })
        .collect()
}

/// Binds and validates every declared parameter of the matched route.
pub fn bind(
    matched: &Match<'_>,
    query: &[(String, String)],
    config: &QueryConfig,
) -> Result<BTreeMap<String, Value>, ErrorEnvelope> {
    let mut errors = Vec::new();
    let mut params = BTreeMap::new();

    let path_loc = [LocSegment::from("path")];
    for (name, field) in matched.route.path_params() {
        let raw = matched
            .captures
            .iter()
            .find(|(n, _)| *n == name.as_str())
            .map(|(_, v)| RawValue::Text(v.clone()));
        if let Some(value) = field.validate(raw.as_ref(), &child(&path_loc, name.as_str()), &mut errors) {
            params.insert(name.clone(), value);
        }
    }

    let raw_query = collect_raw(matched.route.query(), query, "", config.repeated_keys);
    params.extend(matched.route.query().validate(&raw_query, &[LocSegment::from("query")], &mut errors));

    match ErrorEnvelope::from_errors(errors) {
        Some(envelope) => Err(envelope),
        None => Ok(params),
    }
}

/// Builds the raw mapping for `schema` from the pairs whose keys start with
/// `prefix`. Absent fields are simply left out.
fn collect_raw(
    schema: &Schema,
    pairs: &[(String, String)],
    prefix: &str,
    policy: RepeatedKeys,
) -> BTreeMap<String, RawValue> {
    let mut raw = BTreeMap::new();

    for (name, field) in schema.fields() {
        let key = format!("{prefix}{name}");
        let mut hits = pairs.iter().filter(|(k, _)| *k == key).map(|(_, v)| v);

        let value = match field.kind() {
            FieldKind::Scalar(_) => {
                let hit = match policy {
                    RepeatedKeys::First => hits.next(),
                    RepeatedKeys::Last => hits.last(),
                };
                hit.map(|v| RawValue::Text(v.clone()))
            }
            FieldKind::List(_) => {
                let items: Vec<RawValue> = hits.map(|v| RawValue::Text(v.clone())).collect();
                (!items.is_empty()).then_some(RawValue::List(items))
            }
            FieldKind::Object(nested) => {
                let nested_prefix = format!("{key}{NESTED_SEPARATOR}");
                let fields = collect_raw(nested, pairs, &nested_prefix, policy);
                match (fields.is_empty(), hits.last()) {
                    (false, _) => Some(RawValue::Map(fields)),
                    // A bare `address=…` is a shape error, not an absence.
                    (true, Some(v)) => Some(RawValue::Text(v.clone())),
                    (true, None) => None,
                }
            }
        };

        if let Some(value) = value {
            raw.insert(name.to_owned(), value);
        }
    }

    raw
}

fn decode(raw: &str, plus_as_space: bool) -> String {
    if plus_as_space && raw.contains('+') {
        percent_decode(&raw.replace('+', " "))
    } else {
        percent_decode(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ErrorKind;
    use crate::{BoundRequest, Field, Method, RouteTable, Router};

    async fn noop(_req: BoundRequest) -> &'static str {
        "ok"
    }

    fn table(pattern: &str, params: Schema) -> RouteTable {
        let mut router = Router::new();
        router.register(Method::Get, pattern, params, noop).unwrap();
        router.into_table()
    }

    fn run(t: &RouteTable, path: &str, query: &str, config: &QueryConfig) -> Result<BTreeMap<String, Value>, ErrorEnvelope> {
        let m = t.find(Method::Get, path).unwrap();
        bind(&m, &parse_query(query, config.plus_as_space), config)
    }

    #[test]
    fn parses_and_decodes_pairs() {
        assert_eq!(
            parse_query("q=hello%20world&flag&&name=a+b&x%3Dy=1", true),
            [
                ("q".to_owned(), "hello world".to_owned()),
                ("flag".to_owned(), String::new()),
                ("name".to_owned(), "a b".to_owned()),
                ("x=y".to_owned(), "1".to_owned()),
            ]
        );
        assert_eq!(parse_query("name=a+b", false), [("name".to_owned(), "a+b".to_owned())]);
        assert!(parse_query("", true).is_empty());
        assert_eq!(
            parse_query("q=%FF&r=%E2%82", true),
            [("q".to_owned(), "\u{FFFD}".to_owned()), ("r".to_owned(), "\u{FFFD}".to_owned())]
        );
    }

    #[test]
    fn repeated_scalar_keys_follow_policy() {
        let t = table("/items/", Schema::new("Q").field("skip", Field::int()));
        let last = run(&t, "/items/", "skip=1&skip=2", &QueryConfig::default()).unwrap();
        assert_eq!(last["skip"], Value::Int(2));

        let first_cfg = QueryConfig { repeated_keys: RepeatedKeys::First, ..QueryConfig::default() };
        let first = run(&t, "/items/", "skip=1&skip=2", &first_cfg).unwrap();
        assert_eq!(first["skip"], Value::Int(1));
    }

    #[test]
    fn list_fields_collect_every_occurrence() {
        let t = table("/items/", Schema::new("Q").field("tag", Field::list(Field::text()).optional()));
        let bound = run(&t, "/items/", "tag=a&other=x&tag=b", &QueryConfig::default()).unwrap();
        assert_eq!(bound["tag"], Value::List(vec![Value::from("a"), Value::from("b")]));

        let absent = run(&t, "/items/", "", &QueryConfig::default()).unwrap();
        assert_eq!(absent["tag"], Value::Null);
    }

    #[test]
    fn defaults_fill_absent_query_parameters() {
        let t = table(
            "/items/",
            Schema::new("Q").field("skip", Field::int().default(0)).field("limit", Field::int().default(10)),
        );
        let bound = run(&t, "/items/", "limit=5", &QueryConfig::default()).unwrap();
        assert_eq!(bound["skip"], Value::Int(0));
        assert_eq!(bound["limit"], Value::Int(5));
    }

    #[test]
    fn nested_objects_read_dotted_keys() {
        let address = Schema::new("Address").field("city", Field::text()).field("zip_code", Field::int());
        let t = table("/shops/", Schema::new("Q").field("address", Field::object(address)));

        let bound = run(&t, "/shops/", "address.city=Paris&address.zip_code=75001", &QueryConfig::default()).unwrap();
        assert_eq!(bound["address"].get("zip_code"), Some(&Value::Int(75001)));

        let err = run(&t, "/shops/", "address.city=Paris&address.zip_code=x", &QueryConfig::default()).unwrap_err();
        assert_eq!(err.errors()[0].loc, vec![LocSegment::from("query"), "address".into(), "zip_code".into()]);

        let missing = run(&t, "/shops/", "", &QueryConfig::default()).unwrap_err();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing.errors()[0].loc, vec![LocSegment::from("query"), "address".into()]);

        let flat = run(&t, "/shops/", "address=Paris", &QueryConfig::default()).unwrap_err();
        assert_eq!(flat.errors()[0].kind, ErrorKind::DictType);
    }

    #[test]
    fn path_errors_precede_query_errors() {
        let t = table(
            "/users/{user_id}/items/{item_id}",
            Schema::new("Q")
                .field("needy", Field::text())
                .field("user_id", Field::int())
                .field("item_id", Field::text()),
        );
        let err = run(&t, "/users/abc/items/x", "", &QueryConfig::default()).unwrap_err();
        let kinds: Vec<_> = err.iter().map(|e| (e.kind, e.loc[0].clone())).collect();
        assert_eq!(
            kinds,
            [(ErrorKind::IntParsing, LocSegment::from("path")), (ErrorKind::Missing, LocSegment::from("query"))]
        );
    }
}
