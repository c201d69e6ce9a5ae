//! Raw text → typed value conversion.
//!
//! Every leaf of a schema goes through [`coerce_union`]. A single declared
//! type is a one-candidate union; candidates are tried in declared order and
//! the first success wins. When all fail, the failure of the *last*
//! candidate is reported.

use std::sync::LazyLock;

use regex::Regex;

use crate::envelope::ErrorKind;
use crate::value::Value;

static FLOAT_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
        .expect("float grammar is a valid regex")
});

const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];
const FALSY: [&str; 4] = ["0", "false", "no", "off"];

/// A leaf type a raw string can be coerced into.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarType {
    Int,
    Float,
    Bool,
    Text,
    /// A closed set of allowed literals, compared case-sensitively.
    Enum(Vec<String>),
}

impl ScalarType {
    pub fn one_of<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(allowed.into_iter().map(Into::into).collect())
    }
}

/// Why a raw string could not be coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct Coercion {
    pub kind: ErrorKind,
    pub msg: String,
}

impl Coercion {
    fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self { kind, msg: msg.into() }
    }
}

/// Coerces `raw` into a single declared type.
pub fn coerce(raw: &str, ty: &ScalarType) -> Result<Value, Coercion> {
    match ty {
        ScalarType::Int => raw.parse::<i64>().map(Value::Int).map_err(|_| {
            Coercion::new(
                ErrorKind::IntParsing,
                "Input should be a valid integer, unable to parse string as an integer",
            )
        }),
        ScalarType::Float => parse_float(raw).map(Value::Float).ok_or_else(|| {
            Coercion::new(
                ErrorKind::FloatParsing,
                "Input should be a valid number, unable to parse string as a number",
            )
        }),
        ScalarType::Bool => parse_bool(raw).map(Value::Bool).ok_or_else(|| {
            Coercion::new(
                ErrorKind::BoolParsing,
                "Input should be a valid boolean, unable to interpret input",
            )
        }),
        ScalarType::Text => Ok(Value::Str(raw.to_owned())),
        ScalarType::Enum(allowed) => {
            if allowed.iter().any(|a| a == raw) {
                Ok(Value::Str(raw.to_owned()))
            } else {
                Err(Coercion::new(ErrorKind::Enum, format!("Input should be {}", expected_list(allowed))))
            }
        }
    }
}

/// Tries each candidate in order. An empty candidate list is rejected at
/// registration, so `candidates` always has at least one entry here.
pub fn coerce_union(raw: &str, candidates: &[ScalarType]) -> Result<Value, Coercion> {
    let mut last = Coercion::new(ErrorKind::StringType, "Input should be a valid string");
    for ty in candidates {
        match coerce(raw, ty) {
            Ok(v) => return Ok(v),
            Err(e) => last = e,
        }
    }
    Err(last)
}

fn parse_float(raw: &str) -> Option<f64> {
    if !FLOAT_GRAMMAR.is_match(raw) {
        return None;
    }
    raw.parse::<f64>().ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    let lowered = raw.to_ascii_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Some(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// `'a'`, `'a' or 'b'`, `'a', 'b' or 'c'`.
fn expected_list(allowed: &[String]) -> String {
    let quoted: Vec<String> = allowed.iter().map(|a| format!("'{a}'")).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {last}", rest.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_parse_whole_string_only() {
        assert_eq!(coerce("3", &ScalarType::Int), Ok(Value::Int(3)));
        assert_eq!(coerce("-42", &ScalarType::Int), Ok(Value::Int(-42)));
        for bad in ["foo", "", "3a", "3.0", " 3", "99999999999999999999"] {
            let err = coerce(bad, &ScalarType::Int).unwrap_err();
            assert_eq!(err.kind, ErrorKind::IntParsing, "input {bad:?}");
        }
    }

    #[test]
    fn floats_follow_decimal_grammar() {
        assert_eq!(coerce("2.5", &ScalarType::Float), Ok(Value::Float(2.5)));
        assert_eq!(coerce("-1e3", &ScalarType::Float), Ok(Value::Float(-1000.0)));
        assert_eq!(coerce(".5", &ScalarType::Float), Ok(Value::Float(0.5)));
        assert_eq!(coerce("7", &ScalarType::Float), Ok(Value::Float(7.0)));
        for bad in ["inf", "NaN", "1.2.3", "", "e5", "1e"] {
            let err = coerce(bad, &ScalarType::Float).unwrap_err();
            assert_eq!(err.kind, ErrorKind::FloatParsing, "input {bad:?}");
        }
    }

    #[test]
    fn booleans_accept_fixed_sets_in_any_case() {
        for raw in ["1", "true", "True", "TRUE", "yes", "YeS", "on", "ON"] {
            assert_eq!(coerce(raw, &ScalarType::Bool), Ok(Value::Bool(true)), "input {raw:?}");
        }
        for raw in ["0", "false", "False", "no", "NO", "off", "oFF"] {
            assert_eq!(coerce(raw, &ScalarType::Bool), Ok(Value::Bool(false)), "input {raw:?}");
        }
        for raw in ["", "2", "t", "y", "nope", "truee"] {
            assert_eq!(coerce(raw, &ScalarType::Bool).unwrap_err().kind, ErrorKind::BoolParsing);
        }
    }

    #[test]
    fn text_passes_through() {
        assert_eq!(coerce(" a b ", &ScalarType::Text), Ok(Value::from(" a b ")));
    }

    #[test]
    fn enum_membership_is_exact() {
        let models = ScalarType::one_of(["alexnet", "resnet", "lenet"]);
        assert_eq!(coerce("resnet", &models), Ok(Value::from("resnet")));

        let err = coerce("ResNet", &models).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Enum);
        assert_eq!(err.msg, "Input should be 'alexnet', 'resnet' or 'lenet'");

        let single = ScalarType::one_of(["only"]);
        assert_eq!(coerce("x", &single).unwrap_err().msg, "Input should be 'only'");
    }

    #[test]
    fn union_takes_first_success_and_reports_last_failure() {
        let int_or_text = [ScalarType::Int, ScalarType::Text];
        assert_eq!(coerce_union("5", &int_or_text), Ok(Value::Int(5)));
        assert_eq!(coerce_union("five", &int_or_text), Ok(Value::from("five")));

        let int_or_bool = [ScalarType::Int, ScalarType::Bool];
        assert_eq!(coerce_union("yes", &int_or_bool), Ok(Value::Bool(true)));
        assert_eq!(coerce_union("maybe", &int_or_bool).unwrap_err().kind, ErrorKind::BoolParsing);

        let bool_or_int = [ScalarType::Bool, ScalarType::Int];
        assert_eq!(coerce_union("maybe", &bool_or_int).unwrap_err().kind, ErrorKind::IntParsing);
    }
}
