//! Payload validation
//!
//! Structural constraints are declared on payload types with the
//! `validator` derive (`length(max = N)`, `range(min = N)`, `required`,
//! `nested`, ...). Enumerations are typed, so an unknown constant fails
//! deserialization with rule `enum` before any derive rule runs.
//!
//! Named enum predicates also live in a process-wide registry that feature
//! catalogs fill once at start-up. Payload decoding never consults it; it
//! serves lookups by name ([`check_enum`], [`registered_enums`]) for code
//! holding a bare string, such as configuration values or logs.
//!
//! Every failure is reported as a single [`Violation`] naming the field path
//! (JSON field names, e.g. `chargingProfile.stackLevel`), the rule that failed
//! and the expected bound.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::ErrorCode;

/// A single failed constraint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.describe())]
pub struct Violation {
    /// Dotted field path, e.g. `CallResult.Payload.data.field1`
    pub field: String,
    /// Rule name: `required`, `max`, `min`, `gte`, `gt`, `lte`, `enum`, `type`, `value`, `format`
    pub rule: String,
    /// Expected bound or shape, empty when the rule has none
    pub expected: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, rule: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            expected: expected.into(),
        }
    }

    /// Prepend a path segment (e.g. `Call.Payload`)
    pub fn prefixed(mut self, prefix: &str) -> Self {
        self.field = join_path(prefix, &self.field);
        self
    }

    /// Wire error code for this violation. `format_code` is the version
    /// specific code used when the payload is not even shaped like JSON the
    /// feature understands.
    pub fn code(&self, format_code: ErrorCode) -> ErrorCode {
        match self.rule.as_str() {
            "required" => ErrorCode::OccurrenceConstraintViolation,
            "type" => ErrorCode::TypeConstraintViolation,
            "format" => format_code,
            _ => ErrorCode::PropertyConstraintViolation,
        }
    }

    fn describe(&self) -> String {
        match (self.rule.as_str(), self.expected.is_empty()) {
            ("required", _) => format!("Field {} required but not found", self.field),
            (rule, true) => format!("Field {} failed '{}' validation", self.field, rule),
            ("type" | "enum" | "value" | "format", false) => {
                format!("Field {} failed '{}' validation: {}", self.field, self.rule, self.expected)
            }
            (rule, false) => format!(
                "Field {} failed '{}={}' validation",
                self.field, rule, self.expected
            ),
        }
    }
}

/// Validate a value against its declared constraints
pub fn validate<T: Validate>(value: &T) -> Result<(), Violation> {
    match value.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(first_violation(&errors)),
    }
}

/// Decode a JSON payload into `T` and validate it
pub fn decode<T: DeserializeOwned + Validate>(value: Value) -> Result<T, Violation> {
    let decoded: T = serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        from_serde_error(&path, err.inner())
    })?;
    validate(&decoded)?;
    Ok(decoded)
}

fn from_serde_error(path: &str, err: &serde_json::Error) -> Violation {
    let base = if path == "." { "" } else { path };
    let message = err.to_string();

    if let Some(rest) = message.strip_prefix("missing field `") {
        let field = rest.split('`').next().unwrap_or_default();
        return Violation::new(join_path(base, field), "required", "");
    }

    let rule = if message.starts_with("unknown variant") {
        "enum"
    } else if message.starts_with("invalid type") {
        "type"
    } else if message.starts_with("invalid value") || message.starts_with("invalid length") {
        "value"
    } else {
        "format"
    };
    Violation::new(base, rule, message)
}

/// Deterministic choice among several failures: the lexicographically first path
fn first_violation(errors: &ValidationErrors) -> Violation {
    let mut all = Vec::new();
    collect(String::new(), errors, &mut all);
    all.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.rule.cmp(&b.rule)));
    all.into_iter()
        .next()
        .unwrap_or_else(|| Violation::new("", "value", ""))
}

fn collect(prefix: String, errors: &ValidationErrors, out: &mut Vec<Violation>) {
    for (field, kind) in errors.errors() {
        let path = join_path(&prefix, &camel_case(&field.to_string()));
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|e| from_validation_error(&path, e)));
            }
            ValidationErrorsKind::Struct(inner) => collect(path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

fn from_validation_error(path: &str, err: &ValidationError) -> Violation {
    let param = |name: &str| err.params.get(name).map(format_bound);
    let (rule, expected) = match err.code.as_ref() {
        "required" => ("required".to_string(), String::new()),
        "length" => {
            let len = err.params.get("value").map(measure).unwrap_or(0.0);
            let max = err.params.get("max").and_then(Value::as_f64);
            match (param("max"), param("min"), param("equal")) {
                (Some(bound), _, _) if max.map_or(false, |m| len > m) => ("max".to_string(), bound),
                (_, Some(bound), _) => ("min".to_string(), bound),
                (_, _, Some(bound)) => ("len".to_string(), bound),
                (Some(bound), None, None) => ("max".to_string(), bound),
                _ => ("length".to_string(), String::new()),
            }
        }
        "range" => {
            let value = err.params.get("value").and_then(Value::as_f64);
            let max = err.params.get("max").and_then(Value::as_f64);
            let exceeds = matches!((value, max), (Some(v), Some(m)) if v > m);
            if exceeds {
                ("lte".to_string(), param("max").unwrap_or_default())
            } else if let Some(bound) = param("min") {
                ("gte".to_string(), bound)
            } else if let Some(bound) = param("exclusive_min") {
                ("gt".to_string(), bound)
            } else if let Some(bound) = param("max") {
                ("lte".to_string(), bound)
            } else {
                ("range".to_string(), String::new())
            }
        }
        other => (
            other.to_string(),
            err.message.as_ref().map(|m| m.to_string()).unwrap_or_default(),
        ),
    };
    Violation::new(path, rule, expected)
}

/// `0.0` -> `0`, leaves other values untouched
fn format_bound(value: &Value) -> String {
    match value.as_f64() {
        Some(f) if value.is_f64() && f.fract() == 0.0 => format!("{}", f as i64),
        _ => value.to_string(),
    }
}

fn measure(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.chars().count() as f64,
        Value::Array(items) => items.len() as f64,
        Value::Object(map) => map.len() as f64,
        _ => 0.0,
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    match (prefix.is_empty(), field.is_empty()) {
        (true, _) => field.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) if field.starts_with('[') => format!("{prefix}{field}"),
        (false, false) => format!("{prefix}.{field}"),
    }
}

/// `stack_level` -> `stackLevel`
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

// ============================================================================
// Enum registry (lookup by name, not used by `decode`)
// ============================================================================

/// Predicate deciding whether a string is a member of a named enumeration
pub type EnumPredicate = fn(&str) -> bool;

static ENUMS: Lazy<RwLock<HashMap<&'static str, EnumPredicate>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// An enumeration with a closed set of wire constants
pub trait OcppEnum: Sized + 'static {
    /// Registry name, e.g. `authorizationStatus`
    const NAME: &'static str;
    /// Every wire constant of the enumeration
    const VARIANTS: &'static [&'static str];

    fn as_str(&self) -> &'static str;
}

fn is_variant<E: OcppEnum>(value: &str) -> bool {
    E::VARIANTS.contains(&value)
}

/// Register a named enum predicate. The first registration of a name wins;
/// returns false if the name was already present.
pub fn register_enum(name: &'static str, predicate: EnumPredicate) -> bool {
    let mut enums = ENUMS.write();
    if enums.contains_key(name) {
        return false;
    }
    enums.insert(name, predicate);
    true
}

/// Register the predicate for a typed enumeration
pub fn register<E: OcppEnum>() -> bool {
    register_enum(E::NAME, is_variant::<E>)
}

/// Look up a registered enum predicate
pub fn enum_validator(name: &str) -> Option<EnumPredicate> {
    ENUMS.read().get(name).copied()
}

/// Check `value` against the enum registered as `name`
pub fn check_enum(name: &str, value: &str) -> Result<(), Violation> {
    match enum_validator(name) {
        Some(predicate) if predicate(value) => Ok(()),
        Some(_) => Err(Violation::new("", "enum", format!("{value} is not a valid {name}"))),
        None => Err(Violation::new("", "enum", format!("no validator registered for {name}"))),
    }
}

/// Names of all registered enum validators, sorted
pub fn registered_enums() -> Vec<&'static str> {
    let mut names: Vec<_> = ENUMS.read().keys().copied().collect();
    names.sort_unstable();
    names
}
