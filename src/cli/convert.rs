//! JSON <-> ParamValue conversion utilities

use rust_decimal::Decimal;

use crate::{
    cli::CliError,
    value::{ParamValue, TypeTag},
};

/// Convert serde_json::Value to a ParamValue. Objects become maps.
pub fn json_to_param(v: serde_json::Value) -> ParamValue {
    match v {
        serde_json::Value::Null => ParamValue::Null,
        serde_json::Value::Bool(b) => ParamValue::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ParamValue::Integer(i)
            } else if let Some(u) = n.as_u64() {
                ParamValue::Decimal(Decimal::from(u))
            } else {
                n.as_f64().map(ParamValue::Float).unwrap_or(ParamValue::Null)
            }
        }
        serde_json::Value::String(s) => ParamValue::String(s),
        serde_json::Value::Array(arr) => {
            ParamValue::List(arr.into_iter().map(json_to_param).collect())
        }
        serde_json::Value::Object(obj) => {
            ParamValue::Map(obj.into_iter().map(|(k, v)| (k, json_to_param(v))).collect())
        }
    }
}

/// Parse a `path=type` declaration such as `member.birthdate=string`.
pub fn parse_type_declaration(text: &str) -> Result<(String, TypeTag), CliError> {
    let invalid = || CliError::InvalidType(text.to_string());
    let (path, tag) = text.split_once('=').ok_or_else(invalid)?;
    let path = path.trim();
    if path.is_empty() {
        return Err(invalid());
    }
    let tag = tag.trim().parse::<TypeTag>().map_err(|_| invalid())?;
    Ok((path.to_string(), tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_objects_become_maps() {
        let value = json_to_param(serde_json::json!({ "ids": [1, 2.5, null], "name": "x" }));
        let ParamValue::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(
            map.get("ids"),
            Some(&ParamValue::List(vec![
                ParamValue::Integer(1),
                ParamValue::Float(2.5),
                ParamValue::Null
            ]))
        );
        assert_eq!(map.get("name"), Some(&ParamValue::String("x".to_string())));
    }

    #[test]
    fn test_large_unsigned_becomes_decimal() {
        let value = json_to_param(serde_json::json!(u64::MAX));
        assert_eq!(value, ParamValue::Decimal(Decimal::from(u64::MAX)));
    }

    #[test]
    fn test_type_declaration() {
        assert_eq!(
            parse_type_declaration("member.birthdate=string").unwrap(),
            ("member.birthdate".to_string(), TypeTag::String)
        );
        assert!(matches!(parse_type_declaration("nope"), Err(CliError::InvalidType(_))));
        assert!(matches!(parse_type_declaration("a=widget"), Err(CliError::InvalidType(_))));
    }
}
