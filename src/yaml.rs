//! Scalar-tag recognition shared by the BYML text bridge (§4.7, §6).
//!
//! YAML has no native concept of the fixed-width integer and float types
//! this format distinguishes on the wire, so both directions lean on a small
//! set of explicit tags (`!u`, `!l`, `!ul`, `!f64`) layered on top of plain
//! YAML scalars. This module holds the tag vocabulary and the untagged
//! scalar sniffing used when a node carries no explicit tag.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagBasedType {
    Bool,
    Str,
    Int,
    Float,
    Null,
}

pub(crate) enum Scalar {
    Null,
    Bool(bool),
    /// Bit pattern of the parsed integer; negative values are stored as
    /// their two's-complement `i64` bits reinterpreted as `u64`.
    Int(u64),
    Float(f64),
    String(std::string::String),
}

#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum YamlError {
    #[error(transparent)]
    Parse(#[from] ryml::Error),
    #[error("cannot parse {0:?} as {1:?}")]
    BadScalar(std::string::String, TagBasedType),
}

/// Maps a YAML core-schema tag to the type it forces a plain scalar into.
#[inline]
pub(crate) fn get_tag_based_type(tag: &str) -> Option<TagBasedType> {
    match tag {
        "tag:yaml.org,2002:null" | "!!null" => Some(TagBasedType::Null),
        "tag:yaml.org,2002:bool" | "!!bool" => Some(TagBasedType::Bool),
        "tag:yaml.org,2002:int" | "!!int" => Some(TagBasedType::Int),
        "tag:yaml.org,2002:float" | "!!float" => Some(TagBasedType::Float),
        "tag:yaml.org,2002:str" | "!!str" => Some(TagBasedType::Str),
        _ => None,
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn parse_int(val: &str) -> Option<u64> {
    let (negative, digits) = match val.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, val.strip_prefix('+').unwrap_or(val)),
    };
    let magnitude: u64 = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = digits.strip_prefix("0o") {
        u64::from_str_radix(oct, 8).ok()?
    } else {
        lexical::parse(digits).ok()?
    };
    if negative {
        Some((-(magnitude as i128)) as i64 as u64)
    } else {
        Some(magnitude)
    }
}

fn parse_float(val: &str) -> Option<f64> {
    match val {
        ".inf" | ".Inf" | ".INF" | "+.inf" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ => lexical::parse(val).ok(),
    }
}

/// Resolves a scalar's runtime value from its tag (if any) and raw text.
///
/// A quoted scalar is always a string, regardless of tag: `"true"` in
/// quotes is the string "true", not a bool. An explicit core-schema tag
/// forces interpretation even for plain scalars that wouldn't otherwise
/// parse as that type. With no tag, the plain scalar is sniffed in the
/// usual YAML order: null, bool, int, float, else string.
pub(crate) fn parse_scalar(
    tag_type: Option<TagBasedType>,
    val: &str,
    quoted: bool,
) -> Result<Scalar, YamlError> {
    if quoted {
        return Ok(Scalar::String(val.to_string()));
    }
    match tag_type {
        Some(TagBasedType::Str) => Ok(Scalar::String(val.to_string())),
        Some(TagBasedType::Null) => Ok(Scalar::Null),
        Some(TagBasedType::Bool) => parse_bool(val)
            .map(Scalar::Bool)
            .ok_or_else(|| YamlError::BadScalar(val.to_string(), TagBasedType::Bool)),
        Some(TagBasedType::Int) => parse_int(val)
            .map(Scalar::Int)
            .ok_or_else(|| YamlError::BadScalar(val.to_string(), TagBasedType::Int)),
        Some(TagBasedType::Float) => parse_float(val)
            .map(Scalar::Float)
            .ok_or_else(|| YamlError::BadScalar(val.to_string(), TagBasedType::Float)),
        None => {
            if val.is_empty() || val == "~" || val.eq_ignore_ascii_case("null") {
                Ok(Scalar::Null)
            } else if let Some(b) = parse_bool(val) {
                Ok(Scalar::Bool(b))
            } else if let Some(i) = parse_int(val) {
                Ok(Scalar::Int(i))
            } else if let Some(f) = parse_float(val) {
                Ok(Scalar::Float(f))
            } else {
                Ok(Scalar::String(val.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_sniffing() {
        assert!(matches!(parse_scalar(None, "null", false).unwrap(), Scalar::Null));
        assert!(matches!(parse_scalar(None, "true", false).unwrap(), Scalar::Bool(true)));
        assert!(matches!(parse_scalar(None, "-12", false).unwrap(), Scalar::Int(_)));
        assert!(matches!(parse_scalar(None, "1.5", false).unwrap(), Scalar::Float(_)));
        assert!(matches!(parse_scalar(None, "hi", false).unwrap(), Scalar::String(_)));
    }

    #[test]
    fn quoted_overrides_sniffing() {
        assert!(matches!(parse_scalar(None, "true", true).unwrap(), Scalar::String(_)));
    }

    #[test]
    fn negative_int_round_trips_bit_pattern() {
        match parse_scalar(Some(TagBasedType::Int), "-5", false).unwrap() {
            Scalar::Int(bits) => assert_eq!(bits as i64, -5),
            _ => panic!("expected Int"),
        }
    }

    #[test]
    fn hex_int() {
        match parse_scalar(None, "0x10", false).unwrap() {
            Scalar::Int(bits) => assert_eq!(bits, 16),
            _ => panic!("expected Int"),
        }
    }
}
