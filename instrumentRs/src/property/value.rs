//! Values that are stored in the property cache and sent over the wire.

use std::fmt::Display;

use crate::InstrumentError;

/// The kind of a [`PropertyValue`]. Every property has exactly one kind, given by its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// On/off switch.
    Bool,
    /// Integer count.
    Int,
    /// Floating point number in instrument-native units.
    Float,
    /// Free-form text or an enumeration token.
    Text,
}

/// A cached property value.
///
/// Values are formatted for the instrument with [`Display`]: booleans become `on`/`off`, floats
/// are written in the shortest decimal form that reads back to the same number. No unit
/// conversion is done, values are always in the native units of the instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// On/off switch.
    Bool(bool),
    /// Integer count.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text or enumeration token.
    Text(String),
}

impl PropertyValue {
    /// Get the kind of this value.
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::Text(_) => PropertyKind::Text,
        }
    }

    /// Get the value as boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(val) => Some(*val),
            _ => None,
        }
    }

    /// Get the value as integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(val) => Some(*val),
            _ => None,
        }
    }

    /// Get the value as float, if it is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(val) => Some(*val),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(val) => Some(val.as_str()),
            _ => None,
        }
    }

    /// Convert the value into the given kind, if this is lossless.
    ///
    /// Only integers are widened to floats, everything else must already have the right kind.
    pub fn coerce(self, kind: PropertyKind) -> Option<Self> {
        match (self, kind) {
            (PropertyValue::Int(val), PropertyKind::Float) => {
                Some(PropertyValue::Float(val as f64))
            }
            (val, kind) if val.kind() == kind => Some(val),
            _ => None,
        }
    }

    /// Normalize a raw instrument response.
    ///
    /// Surrounding whitespace and double quotes are removed and the text is lowercased, such that
    /// `" \"VOLT\"\r\n"` becomes `"volt"`.
    pub fn normalize(response: &str) -> String {
        response.trim().trim_matches('"').trim().to_lowercase()
    }

    /// Parse a raw instrument response into a value of the given kind.
    ///
    /// The response is normalized first. Booleans accept `1`/`0` and `on`/`off`, integers also
    /// accept a float representation without fractional part, e.g., `+1.0E+01`.
    pub fn parse(kind: PropertyKind, response: &str) -> Result<Self, InstrumentError> {
        let token = Self::normalize(response);
        let err = || InstrumentError::ResponseParseError(response.to_string());
        match kind {
            PropertyKind::Bool => match token.as_str() {
                "1" | "on" | "true" => Ok(PropertyValue::Bool(true)),
                "0" | "off" | "false" => Ok(PropertyValue::Bool(false)),
                _ => Err(err()),
            },
            PropertyKind::Int => {
                if let Ok(val) = token.parse::<i64>() {
                    return Ok(PropertyValue::Int(val));
                }
                let val = token.parse::<f64>().map_err(|_| err())?;
                if val.fract() == 0.0 && val.abs() < i64::MAX as f64 {
                    Ok(PropertyValue::Int(val as i64))
                } else {
                    Err(err())
                }
            }
            PropertyKind::Float => token
                .parse::<f64>()
                .map(PropertyValue::Float)
                .map_err(|_| err()),
            PropertyKind::Text => Ok(PropertyValue::Text(token)),
        }
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Bool(true) => write!(f, "on"),
            PropertyValue::Bool(false) => write!(f, "off"),
            PropertyValue::Int(val) => write!(f, "{val}"),
            PropertyValue::Float(val) => write!(f, "{val}"),
            PropertyValue::Text(val) => write!(f, "{val}"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(" \"VOLT\"\r\n", "volt")]
    #[case("ON", "on")]
    #[case("\"FRES\"", "fres")]
    fn test_normalize(#[case] raw: &str, #[case] exp: &str) {
        assert_eq!(PropertyValue::normalize(raw), exp);
    }

    #[rstest]
    #[case(PropertyKind::Bool, "1", PropertyValue::Bool(true))]
    #[case(PropertyKind::Bool, "OFF", PropertyValue::Bool(false))]
    #[case(PropertyKind::Int, "+10", PropertyValue::Int(10))]
    #[case(PropertyKind::Int, "+1.00000000E+01", PropertyValue::Int(10))]
    #[case(PropertyKind::Float, "+1.00000000E-02", PropertyValue::Float(0.01))]
    #[case(PropertyKind::Text, "IMM", PropertyValue::Text("imm".to_string()))]
    fn test_parse(#[case] kind: PropertyKind, #[case] raw: &str, #[case] exp: PropertyValue) {
        assert_eq!(PropertyValue::parse(kind, raw).unwrap(), exp);
    }

    #[rstest]
    #[case(PropertyKind::Bool, "2")]
    #[case(PropertyKind::Int, "1.5")]
    #[case(PropertyKind::Float, "nan-ish")]
    fn test_parse_error(#[case] kind: PropertyKind, #[case] raw: &str) {
        match PropertyValue::parse(kind, raw) {
            Err(InstrumentError::ResponseParseError(resp)) => assert_eq!(resp, raw),
            other => panic!("Expected a parse error, got {other:?}"),
        }
    }

    #[rstest]
    fn test_display_wire_format() {
        assert_eq!(PropertyValue::Bool(true).to_string(), "on");
        assert_eq!(PropertyValue::Float(0.01).to_string(), "0.01");
        assert_eq!(PropertyValue::Float(100.0).to_string(), "100");
        assert_eq!(PropertyValue::Int(-3).to_string(), "-3");
    }

    #[rstest]
    fn test_coerce() {
        assert_eq!(
            PropertyValue::Int(2).coerce(PropertyKind::Float),
            Some(PropertyValue::Float(2.0))
        );
        assert_eq!(PropertyValue::Float(2.0).coerce(PropertyKind::Int), None);
        assert_eq!(PropertyValue::from("on").coerce(PropertyKind::Bool), None);
    }
}
