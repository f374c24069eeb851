use log::warn;

use crate::data::{Value, parse_float_lenient, parse_integer_lenient, parse_timestamp};
use crate::error::RemapWarning;
use crate::table::SemanticType;

/// Tokens treated as true when interpreting a string as a boolean. Anything
/// else is false; boolean interpretation never fails.
pub const TRUTHY_TOKENS: &[&str] = &["true", "1", "yes", "on"];

pub fn is_truthy(raw: &str) -> bool {
    TRUTHY_TOKENS.contains(&raw.trim().to_ascii_lowercase().as_str())
}

/// Interprets a raw string as a typed value for the declared target.
/// `factor`, `string` and `object` targets keep the text as-is; categorical
/// tagging is a column-level concern.
pub fn coerce(raw: &str, target: SemanticType) -> Result<Value, RemapWarning> {
    let failure = || RemapWarning::Coercion {
        raw: raw.to_string(),
        target,
    };
    let value = match target {
        SemanticType::Int => Value::Integer(parse_integer_lenient(raw).ok_or_else(failure)?),
        SemanticType::Float => Value::Float(parse_float_lenient(raw).ok_or_else(failure)?),
        SemanticType::Bool => Value::Boolean(is_truthy(raw)),
        SemanticType::Date => Value::Timestamp(parse_timestamp(raw).map_err(|_| failure())?),
        SemanticType::Factor | SemanticType::String | SemanticType::Object => {
            Value::Text(raw.to_string())
        }
    };
    Ok(value)
}

/// Soft-fail variant: a failed coercion keeps the raw text and reports the
/// degradation as a warning instead of an error.
pub fn coerce_or_keep(raw: &str, target: SemanticType) -> (Value, Option<RemapWarning>) {
    match coerce(raw, target) {
        Ok(value) => (value, None),
        Err(warning) => {
            warn!("{warning}");
            (Value::Text(raw.to_string()), Some(warning))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_targets_accept_fractional_literals() {
        assert_eq!(coerce("3", SemanticType::Int).unwrap(), Value::Integer(3));
        assert_eq!(coerce("3.0", SemanticType::Int).unwrap(), Value::Integer(3));
        assert!(coerce("abc", SemanticType::Int).is_err());
    }

    #[test]
    fn boolean_targets_never_fail() {
        assert_eq!(
            coerce("TRUE", SemanticType::Bool).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            coerce("on", SemanticType::Bool).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            coerce("no", SemanticType::Bool).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            coerce("anything", SemanticType::Bool).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn date_targets_use_the_format_battery() {
        let parsed = coerce("2024/02/01", SemanticType::Date).unwrap();
        assert_eq!(parsed.as_display(), "2024-02-01 00:00:00");
        assert!(coerce("not a date", SemanticType::Date).is_err());
    }

    #[test]
    fn textual_targets_keep_the_raw_string() {
        for target in [
            SemanticType::Factor,
            SemanticType::String,
            SemanticType::Object,
        ] {
            assert_eq!(
                coerce("東京都", target).unwrap(),
                Value::Text("東京都".into())
            );
        }
    }

    #[test]
    fn soft_fail_keeps_text_and_reports() {
        let (value, warning) = coerce_or_keep("abc", SemanticType::Int);
        assert_eq!(value, Value::Text("abc".into()));
        assert!(matches!(
            warning,
            Some(RemapWarning::Coercion { raw, target: SemanticType::Int }) if raw == "abc"
        ));

        let (ok, none) = coerce_or_keep("42", SemanticType::Int);
        assert_eq!(ok, Value::Integer(42));
        assert!(none.is_none());
    }
}
