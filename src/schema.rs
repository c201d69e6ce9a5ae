//! Parameter declarations and the recursive validator.
//!
//! A [`Schema`] is plain data: an ordered list of named [`Field`]s, each a
//! scalar (possibly a union of candidate types), a list of fields, or a
//! nested schema. It is built once at registration and interpreted for every
//! request by [`Schema::validate`].
//!
//! Validation never stops early. Every field is visited, and every violated
//! constraint on every field lands in the caller's error list.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;

use regex::Regex;

use crate::coerce::{ScalarType, coerce_union};
use crate::envelope::{ErrorKind, LocSegment, ValidationError, child};
use crate::error::Error;
use crate::value::{RawValue, Value};

// ── Constraints ──────────────────────────────────────────────────────────────

/// A numeric bound, kept in the type it was declared with.
///
/// Integer values are compared against bounds exactly, including values
/// beyond 2^53 that have no exact `f64` representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Int(i64),
    Float(f64),
}

impl Bound {
    /// Orders `value` relative to this bound. `None` for non-numeric values
    /// and NaN.
    fn compare(self, value: &Value) -> Option<Ordering> {
        match (value, self) {
            (&Value::Int(n), Bound::Int(b)) => Some(n.cmp(&b)),
            (&Value::Int(n), Bound::Float(b)) => cmp_int_float(n, b),
            (&Value::Float(x), Bound::Int(b)) => cmp_int_float(b, x).map(Ordering::reverse),
            (&Value::Float(x), Bound::Float(b)) => x.partial_cmp(&b),
            _ => None,
        }
    }
}

impl From<i64> for Bound {
    fn from(n: i64) -> Self { Self::Int(n) }
}

impl From<i32> for Bound {
    fn from(n: i32) -> Self { Self::Int(n.into()) }
}

impl From<f64> for Bound {
    fn from(x: f64) -> Self { Self::Float(x) }
}

/// Whole-valued float bounds print without a fractional part.
impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) if x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{}", x as i64),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

/// Exact ordering of `n` relative to `b`.
fn cmp_int_float(n: i64, b: f64) -> Option<Ordering> {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if b.is_nan() {
        return None;
    }
    if b >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if b < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    // floor(b) is in i64 range here, so the cast is exact.
    let floor = b.floor();
    match n.cmp(&(floor as i64)) {
        Ordering::Equal if b > floor => Some(Ordering::Less),
        other => Some(other),
    }
}

/// Declarative checks applied after a successful coercion.
///
/// Checked in this order: `min_length`, `max_length`, `pattern`, `gt`, `ge`,
/// `lt`, `le`. Length bounds apply to text (in characters) and to lists (in
/// items); numeric bounds apply to integers and floats; the pattern applies to
/// text.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub gt: Option<Bound>,
    pub ge: Option<Bound>,
    pub lt: Option<Bound>,
    pub le: Option<Bound>,
}

// ── Field ────────────────────────────────────────────────────────────────────

/// The shape of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Candidate types, tried in order.
    Scalar(Vec<ScalarType>),
    List(Box<Field>),
    Object(Schema),
}

/// A single parameter: its shape, presence rules and constraints.
#[derive(Debug, Clone)]
pub struct Field {
    kind: FieldKind,
    required: bool,
    default: Option<Value>,
    constraints: Constraints,
}

impl Field {
    fn new(kind: FieldKind) -> Self {
        Self { kind, required: true, default: None, constraints: Constraints::default() }
    }

    pub fn int() -> Self {
        Self::scalar(ScalarType::Int)
    }

    pub fn float() -> Self {
        Self::scalar(ScalarType::Float)
    }

    pub fn boolean() -> Self {
        Self::scalar(ScalarType::Bool)
    }

    pub fn text() -> Self {
        Self::scalar(ScalarType::Text)
    }

    /// A text value restricted to `allowed` (case-sensitive).
    pub fn one_of<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scalar(ScalarType::one_of(allowed))
    }

    pub fn scalar(ty: ScalarType) -> Self {
        Self::new(FieldKind::Scalar(vec![ty]))
    }

    /// First candidate that coerces wins.
    pub fn union(candidates: impl IntoIterator<Item = ScalarType>) -> Self {
        Self::new(FieldKind::Scalar(candidates.into_iter().collect()))
    }

    /// Every occurrence of the key, each validated as `item`.
    pub fn list(item: Field) -> Self {
        Self::new(FieldKind::List(Box::new(item)))
    }

    pub fn object(schema: Schema) -> Self {
        Self::new(FieldKind::Object(schema))
    }

    /// Not required; binds [`Value::Null`] when absent.
    pub fn optional(self) -> Self {
        self.default(Value::Null)
    }

    /// Not required; binds `value` as-is when absent.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.constraints.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.constraints.max_length = Some(n);
        self
    }

    pub fn pattern(mut self, re: Regex) -> Self {
        self.constraints.pattern = Some(re);
        self
    }

    pub fn gt(mut self, bound: impl Into<Bound>) -> Self {
        self.constraints.gt = Some(bound.into());
        self
    }

    pub fn ge(mut self, bound: impl Into<Bound>) -> Self {
        self.constraints.ge = Some(bound.into());
        self
    }

    pub fn lt(mut self, bound: impl Into<Bound>) -> Self {
        self.constraints.lt = Some(bound.into());
        self
    }

    pub fn le(mut self, bound: impl Into<Bound>) -> Self {
        self.constraints.le = Some(bound.into());
        self
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Validates `raw` at `loc`, appending failures to `errors`.
    ///
    /// Returns the typed value when the field coerced (even if a constraint
    /// failed), or the default when absent. Returns `None` when nothing could
    /// be produced.
    pub fn validate(
        &self,
        raw: Option<&RawValue>,
        loc: &[LocSegment],
        errors: &mut Vec<ValidationError>,
    ) -> Option<Value> {
        let Some(raw) = raw else {
            if let Some(default) = &self.default {
                return Some(default.clone());
            }
            errors.push(ValidationError::missing(loc.to_vec()));
            return None;
        };

        match (&self.kind, raw) {
            (FieldKind::Scalar(candidates), RawValue::Text(text)) => match coerce_union(text, candidates) {
                Ok(value) => {
                    self.check_constraints(&value, raw, loc, errors);
                    Some(value)
                }
                Err(failure) => {
                    errors.push(ValidationError::new(failure.kind, loc.to_vec(), failure.msg, Some(raw.clone())));
                    None
                }
            },
            (FieldKind::List(item), RawValue::List(items)) => {
                let values: Vec<Value> = items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, it)| item.validate(Some(it), &child(loc, i), errors))
                    .collect();
                self.check_list_length(items.len(), raw, loc, errors);
                Some(Value::List(values))
            }
            (FieldKind::Object(schema), RawValue::Map(fields)) => {
                Some(Value::Object(schema.validate(fields, loc, errors)))
            }
            (FieldKind::Scalar(_), _) => {
                errors.push(shape_error(ErrorKind::StringType, "Input should be a valid string", raw, loc));
                None
            }
            (FieldKind::List(_), _) => {
                errors.push(shape_error(ErrorKind::ListType, "Input should be a valid list", raw, loc));
                None
            }
            (FieldKind::Object(_), _) => {
                errors.push(shape_error(ErrorKind::DictType, "Input should be a valid dictionary", raw, loc));
                None
            }
        }
    }

    fn check_constraints(&self, value: &Value, raw: &RawValue, loc: &[LocSegment], errors: &mut Vec<ValidationError>) {
        let c = &self.constraints;
        let mut fail = |kind: ErrorKind, msg: String| {
            errors.push(ValidationError::new(kind, loc.to_vec(), msg, Some(raw.clone())));
        };

        if let Value::Str(s) = value {
            let len = s.chars().count();
            if let Some(min) = c.min_length.filter(|&min| len < min) {
                fail(ErrorKind::StringTooShort, format!("String should have at least {min} {}", plural(min, "character")));
            }
            if let Some(max) = c.max_length.filter(|&max| len > max) {
                fail(ErrorKind::StringTooLong, format!("String should have at most {max} {}", plural(max, "character")));
            }
            if let Some(re) = c.pattern.as_ref().filter(|re| !re.is_match(s)) {
                fail(ErrorKind::StringPatternMismatch, format!("String should match pattern '{}'", re.as_str()));
            }
        }

        // An incomparable pair (NaN) fails every bound.
        let violates = |bound: Option<Bound>, ok: fn(Ordering) -> bool| {
            bound.filter(|b| !b.compare(value).is_some_and(ok))
        };
        if value.as_f64().is_some() {
            if let Some(b) = violates(c.gt, Ordering::is_gt) {
                fail(ErrorKind::GreaterThan, format!("Input should be greater than {b}"));
            }
            if let Some(b) = violates(c.ge, Ordering::is_ge) {
                fail(ErrorKind::GreaterThanEqual, format!("Input should be greater than or equal to {b}"));
            }
            if let Some(b) = violates(c.lt, Ordering::is_lt) {
                fail(ErrorKind::LessThan, format!("Input should be less than {b}"));
            }
            if let Some(b) = violates(c.le, Ordering::is_le) {
                fail(ErrorKind::LessThanEqual, format!("Input should be less than or equal to {b}"));
            }
        }
    }

    fn check_list_length(&self, len: usize, raw: &RawValue, loc: &[LocSegment], errors: &mut Vec<ValidationError>) {
        let c = &self.constraints;
        if let Some(min) = c.min_length.filter(|&min| len < min) {
            errors.push(ValidationError::new(
                ErrorKind::TooShort,
                loc.to_vec(),
                format!("List should have at least {min} {} after validation, not {len}", plural(min, "item")),
                Some(raw.clone()),
            ));
        }
        if let Some(max) = c.max_length.filter(|&max| len > max) {
            errors.push(ValidationError::new(
                ErrorKind::TooLong,
                loc.to_vec(),
                format!("List should have at most {max} {} after validation, not {len}", plural(max, "item")),
                Some(raw.clone()),
            ));
        }
    }

    /// Rejects declarations no request could ever satisfy.
    pub(crate) fn check(&self, name: &str) -> Result<(), Error> {
        match &self.kind {
            FieldKind::Scalar(candidates) if candidates.is_empty() => {
                Err(Error::schema(name, "union declares no candidate types"))
            }
            FieldKind::Scalar(candidates) => {
                if candidates.iter().any(|ty| matches!(ty, ScalarType::Enum(allowed) if allowed.is_empty())) {
                    return Err(Error::schema(name, "enum declares no allowed values"));
                }
                Ok(())
            }
            // Query items arrive as plain repeated values; nothing can
            // address a field inside one of them.
            FieldKind::List(item) if !matches!(item.kind, FieldKind::Scalar(_)) => {
                Err(Error::schema(name, "list items must be scalar"))
            }
            FieldKind::List(item) => item.check(name),
            FieldKind::Object(schema) => schema.check(),
        }
    }
}

// ── Schema ───────────────────────────────────────────────────────────────────

/// A named, ordered set of fields.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: String,
    fields: Vec<(String, Field)>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validates every field against `raw`, locating each under `loc`.
    pub fn validate(
        &self,
        raw: &BTreeMap<String, RawValue>,
        loc: &[LocSegment],
        errors: &mut Vec<ValidationError>,
    ) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        for (name, field) in &self.fields {
            if let Some(value) = field.validate(raw.get(name), &child(loc, name.as_str()), errors) {
                out.insert(name.clone(), value);
            }
        }
        out
    }

    pub(crate) fn check(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for (name, field) in &self.fields {
            if !seen.insert(name.as_str()) {
                return Err(Error::schema(name, format!("declared twice in `{}`", self.name)));
            }
            field.check(name)?;
        }
        Ok(())
    }
}

fn shape_error(kind: ErrorKind, msg: &str, raw: &RawValue, loc: &[LocSegment]) -> ValidationError {
    ValidationError::new(kind, loc.to_vec(), msg, Some(raw.clone()))
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 { noun.to_owned() } else { format!("{noun}s") }
}
