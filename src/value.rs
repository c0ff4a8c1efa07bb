use std::{collections::HashMap, fmt, str::FromStr};

use rust_decimal::{Decimal, prelude::FromPrimitive};
use serde::{Deserialize, Serialize};

/// A runtime parameter value navigated by templates.
///
/// Host types are adapted into this shape once, at the boundary; the
/// engine never reflects over user types.
///
/// # Examples
///
/// ```
/// use twoway_sql::{Bean, ParamValue};
///
/// let pmb = Bean::new("MemberPmb")
///     .with("memberId", 3)
///     .with("memberName", "Stojkovic")
///     .with("statusList", vec!["FML", "PRV"]);
///
/// let value = ParamValue::Bean(pmb);
/// assert!(value.is_bean());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// SQL/JSON null
    Null,

    /// Boolean flag
    Boolean(bool),

    /// Integer number (kept apart from floats)
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// Exact decimal number
    Decimal(Decimal),

    /// UTF-8 string
    String(String),

    /// Ordered collection
    List(Vec<ParamValue>),

    /// Key lookup container
    Map(HashMap<String, ParamValue>),

    /// Object with named properties
    Bean(Bean),
}

/// A bean-like value: a named type with a fixed set of properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bean {
    type_name: String,
    properties: HashMap<String, ParamValue>,
}

impl Bean {
    pub fn new(type_name: impl Into<String>) -> Self {
        Bean {
            type_name: type_name.into(),
            properties: HashMap::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn property(&self, name: &str) -> Option<&ParamValue> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &HashMap<String, ParamValue> {
        &self.properties
    }
}

/// The declared type attached to a bound value.
///
/// Derived from the runtime value, or from static declarations when the
/// value is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// Unknown/generic type
    Object,
    Boolean,
    Integer,
    Float,
    Decimal,
    String,
    List,
    Map,
    Bean,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Object => "object",
            TypeTag::Boolean => "boolean",
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::Decimal => "decimal",
            TypeTag::String => "string",
            TypeTag::List => "list",
            TypeTag::Map => "map",
            TypeTag::Bean => "bean",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "object" => Ok(TypeTag::Object),
            "boolean" | "bool" => Ok(TypeTag::Boolean),
            "integer" | "int" | "long" => Ok(TypeTag::Integer),
            "float" | "double" => Ok(TypeTag::Float),
            "decimal" | "bigdecimal" => Ok(TypeTag::Decimal),
            "string" | "str" => Ok(TypeTag::String),
            "list" | "array" => Ok(TypeTag::List),
            "map" => Ok(TypeTag::Map),
            "bean" => Ok(TypeTag::Bean),
            other => Err(format!("unknown type tag: {}", other)),
        }
    }
}

impl ParamValue {
    /// Runtime type of the value; `None` for null.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            ParamValue::Null => None,
            ParamValue::Boolean(_) => Some(TypeTag::Boolean),
            ParamValue::Integer(_) => Some(TypeTag::Integer),
            ParamValue::Float(_) => Some(TypeTag::Float),
            ParamValue::Decimal(_) => Some(TypeTag::Decimal),
            ParamValue::String(_) => Some(TypeTag::String),
            ParamValue::List(_) => Some(TypeTag::List),
            ParamValue::Map(_) => Some(TypeTag::Map),
            ParamValue::Bean(_) => Some(TypeTag::Bean),
        }
    }

    /// Human-readable type name, for error messages
    pub fn type_name(&self) -> &'static str {
        self.type_tag().map(|t| t.as_str()).unwrap_or("null")
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    pub fn is_bean(&self) -> bool {
        matches!(self, ParamValue::Bean(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ParamValue::Integer(_) | ParamValue::Float(_) | ParamValue::Decimal(_)
        )
    }

    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Exact numeric view used for mixed-type comparison
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            ParamValue::Integer(n) => Some(Decimal::from(*n)),
            ParamValue::Float(n) => Decimal::from_f64(*n),
            ParamValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Text form of a scalar, as spliced into SQL by embedded variables
    pub fn as_sql_text(&self) -> Option<String> {
        match self {
            ParamValue::String(s) => Some(s.clone()),
            ParamValue::Integer(n) => Some(n.to_string()),
            ParamValue::Float(n) => Some(n.to_string()),
            ParamValue::Decimal(d) => Some(d.to_string()),
            ParamValue::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Boolean(b)
    }
}

impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        ParamValue::Integer(n.into())
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Integer(n)
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Float(n)
    }
}

impl From<Decimal> for ParamValue {
    fn from(d: Decimal) -> Self {
        ParamValue::Decimal(d)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::String(s)
    }
}

impl From<Bean> for ParamValue {
    fn from(b: Bean) -> Self {
        ParamValue::Bean(b)
    }
}

impl From<HashMap<String, ParamValue>> for ParamValue {
    fn from(map: HashMap<String, ParamValue>) -> Self {
        ParamValue::Map(map)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        ParamValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(ParamValue::Null)
    }
}
