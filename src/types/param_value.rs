use crate::constants::MAX_SAFE_INTEGER;
use crate::helpers;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"^([0-9]+(\.[0-9]*)?|\.[0-9]+)$").unwrap();
}

/// A decoded path parameter or query value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl ParamValue {
    /// Decodes a raw value.
    ///
    /// Unsigned decimals become numbers unless they are beyond the exactly representable
    /// integer range, in which case the raw digits are kept as text. `true` and `false`
    /// (any case) become booleans. Anything else is percent-decoded.
    pub fn parse(raw: &str) -> ParamValue {
        if NUMBER_RE.is_match(raw) {
            return match raw.parse::<f64>() {
                Ok(num) if num <= MAX_SAFE_INTEGER => ParamValue::Number(num),
                _ => ParamValue::Text(raw.to_owned()),
            };
        }

        match raw.to_ascii_lowercase().as_str() {
            "true" => ParamValue::Bool(true),
            "false" => ParamValue::Bool(false),
            _ => ParamValue::Text(helpers::decode(raw)),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(num) => Some(*num),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(num) => write!(f, "{}", num),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(text: &str) -> Self {
        ParamValue::Text(text.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(text: String) -> Self {
        ParamValue::Text(text)
    }
}

impl From<f64> for ParamValue {
    fn from(num: f64) -> Self {
        ParamValue::Number(num)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_numbers() {
        assert_eq!(ParamValue::parse("3.5"), ParamValue::Number(3.5));
        assert_eq!(ParamValue::parse("42"), ParamValue::Number(42.0));
        assert_eq!(ParamValue::parse(".5"), ParamValue::Number(0.5));
        assert_eq!(ParamValue::parse("7."), ParamValue::Number(7.0));
        assert_eq!(ParamValue::parse("-1"), ParamValue::Text("-1".to_owned()));
        assert_eq!(ParamValue::parse("1e5"), ParamValue::Text("1e5".to_owned()));
    }

    #[test]
    fn should_keep_unsafe_integers_as_text() {
        assert_eq!(
            ParamValue::parse("9007199254740991"),
            ParamValue::Number(9007199254740991.0)
        );
        assert_eq!(
            ParamValue::parse("9007199254740993"),
            ParamValue::Text("9007199254740993".to_owned())
        );
    }

    #[test]
    fn should_parse_booleans_case_insensitively() {
        assert_eq!(ParamValue::parse("true"), ParamValue::Bool(true));
        assert_eq!(ParamValue::parse("FaLsE"), ParamValue::Bool(false));
    }

    #[test]
    fn should_percent_decode_text() {
        assert_eq!(ParamValue::parse("a%20b"), ParamValue::Text("a b".to_owned()));
        assert_eq!(ParamValue::parse("caf%C3%A9").to_string(), "café");
    }
}
