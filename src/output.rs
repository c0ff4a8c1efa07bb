//! Output rendering for [`BoundSql`].
//!
//! - [`display_sql()`] inlines bind values into the placeholders. The result
//!   is for logs and never for execution.
//! - [`to_json()`] and [`to_json_pretty()`] print the SQL and bind values as
//!   JSON. Map keys and bean properties are sorted, so output is
//!   deterministic.
//!
//! # Examples
//!
//! ```
//! use twoway_sql::{BindValue, BoundSql, ParamValue, TypeTag};
//! use twoway_sql::output::{display_sql, to_json};
//!
//! let bound = BoundSql {
//!     sql: "SELECT * FROM MEMBER WHERE MEMBER_NAME = ?".to_string(),
//!     bind_values: vec![BindValue {
//!         value: ParamValue::String("O'Neil".to_string()),
//!         declared_type: TypeTag::String,
//!     }],
//! };
//!
//! assert_eq!(display_sql(&bound), "SELECT * FROM MEMBER WHERE MEMBER_NAME = 'O''Neil'");
//! assert_eq!(
//!     to_json(&bound),
//!     r#"{"sql":"SELECT * FROM MEMBER WHERE MEMBER_NAME = ?","bind_values":[{"type":"string","value":"O'Neil"}]}"#
//! );
//! ```

use crate::{
    render::{BindValue, BoundSql},
    value::ParamValue,
};

/// Inline bind values into `?` placeholders outside quoted literals and
/// comments.
pub fn display_sql(bound: &BoundSql) -> String {
    let mut values = bound.bind_values.iter();
    let mut out = String::with_capacity(bound.sql.len());
    let mut rest = bound.sql.as_str();

    while let Some(ch) = rest.chars().next() {
        let skip = if rest.starts_with("/*") {
            rest.find("*/").map_or(rest.len(), |i| i + 2)
        } else if rest.starts_with("--") {
            rest.find('\n').unwrap_or(rest.len())
        } else if ch == '\'' {
            rest[1..].find('\'').map_or(rest.len(), |i| i + 2)
        } else if ch == '?' {
            match values.next() {
                Some(bind) => out.push_str(&sql_literal(&bind.value)),
                None => out.push(ch),
            }
            rest = &rest[1..];
            continue;
        } else {
            ch.len_utf8()
        };
        out.push_str(&rest[..skip]);
        rest = &rest[skip..];
    }
    out
}

fn sql_literal(value: &ParamValue) -> String {
    match value {
        ParamValue::Null => "null".to_string(),
        ParamValue::String(s) => format!("'{}'", s.replace('\'', "''")),
        ParamValue::List(items) => {
            let parts: Vec<String> = items.iter().map(sql_literal).collect();
            format!("({})", parts.join(", "))
        }
        ParamValue::Map(_) | ParamValue::Bean(_) => format!("<{}>", value.type_name()),
        scalar => scalar.as_sql_text().unwrap_or_default(),
    }
}

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, bound: &BoundSql) -> String {
        let binds: Vec<(String, String)> = vec![
            ("sql".to_string(), format!("\"{}\"", self.escape_string(&bound.sql))),
            ("bind_values".to_string(), self.print_binds(&bound.bind_values, 1)),
        ];
        self.print_fields(&binds, 0)
    }

    fn print_binds(&self, binds: &[BindValue], indent: usize) -> String {
        let items: Vec<String> = binds
            .iter()
            .map(|b| {
                let fields = vec![
                    ("type".to_string(), format!("\"{}\"", b.declared_type)),
                    ("value".to_string(), self.print_value(&b.value, indent + 2)),
                ];
                self.print_fields(&fields, indent + 1)
            })
            .collect();
        self.print_items(items, indent, '[', ']')
    }

    fn print_value(&self, value: &ParamValue, indent: usize) -> String {
        match value {
            ParamValue::Null => "null".to_string(),
            ParamValue::Boolean(b) => b.to_string(),
            ParamValue::Integer(n) => n.to_string(),
            ParamValue::Float(n) if n.is_finite() => n.to_string(),
            ParamValue::Float(_) => "null".to_string(),
            ParamValue::Decimal(d) => d.to_string(),
            ParamValue::String(s) => format!("\"{}\"", self.escape_string(s)),
            ParamValue::List(items) => {
                let items = items
                    .iter()
                    .map(|v| self.print_value(v, indent + 1))
                    .collect();
                self.print_items(items, indent, '[', ']')
            }
            ParamValue::Map(map) => {
                let mut keys: Vec<_> = map.keys().collect();
                keys.sort();
                let fields: Vec<(String, String)> = keys
                    .into_iter()
                    .filter_map(|k| Some((k.clone(), self.print_value(map.get(k)?, indent + 1))))
                    .collect();
                self.print_fields(&fields, indent)
            }
            ParamValue::Bean(bean) => {
                let mut names: Vec<_> = bean.properties().keys().collect();
                names.sort();
                let fields: Vec<(String, String)> = names
                    .into_iter()
                    .filter_map(|k| {
                        Some((k.clone(), self.print_value(bean.properties().get(k)?, indent + 1)))
                    })
                    .collect();
                self.print_fields(&fields, indent)
            }
        }
    }

    fn print_fields(&self, fields: &[(String, String)], indent: usize) -> String {
        let separator = if self.pretty { ": " } else { ":" };
        let items = fields
            .iter()
            .map(|(k, v)| format!("\"{}\"{}{}", self.escape_string(k), separator, v))
            .collect();
        self.print_items(items, indent, '{', '}')
    }

    fn print_items(&self, items: Vec<String>, indent: usize, open: char, close: char) -> String {
        if items.is_empty() {
            return format!("{}{}", open, close);
        }

        if self.pretty {
            let inner = self.indent(indent + 1);
            let lines: Vec<String> = items.iter().map(|i| format!("{}{}", inner, i)).collect();
            format!("{}\n{}\n{}{}", open, lines.join(",\n"), self.indent(indent), close)
        } else {
            format!("{}{}{}", open, items.join(","), close)
        }
    }

    fn indent(&self, level: usize) -> String {
        "  ".repeat(level)
    }

    fn escape_string(&self, s: &str) -> String {
        s.chars()
            .flat_map(|c| match c {
                '"' => vec!['\\', '"'],
                '\\' => vec!['\\', '\\'],
                '\n' => vec!['\\', 'n'],
                '\r' => vec!['\\', 'r'],
                '\t' => vec!['\\', 't'],
                c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
                c => vec![c],
            })
            .collect()
    }
}

/// Compact JSON for a rendered statement.
pub fn to_json(bound: &BoundSql) -> String {
    JsonPrinter::new(false).print(bound)
}

/// Pretty JSON with 2-space indentation.
pub fn to_json_pretty(bound: &BoundSql) -> String {
    JsonPrinter::new(true).print(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeTag;

    fn bind(value: ParamValue, declared_type: TypeTag) -> BindValue {
        BindValue {
            value,
            declared_type,
        }
    }

    #[test]
    fn test_display_sql_skips_quoted_and_commented_question_marks() {
        let bound = BoundSql {
            sql: "SELECT '?' /* ? */ FROM T WHERE A = ? AND B = ? -- ?".to_string(),
            bind_values: vec![
                bind(ParamValue::Integer(1), TypeTag::Integer),
                bind(ParamValue::Null, TypeTag::String),
            ],
        };
        assert_eq!(
            display_sql(&bound),
            "SELECT '?' /* ? */ FROM T WHERE A = 1 AND B = null -- ?"
        );
    }

    #[test]
    fn test_pretty_json() {
        let bound = BoundSql {
            sql: "X = ?".to_string(),
            bind_values: vec![bind(ParamValue::Boolean(true), TypeTag::Boolean)],
        };
        let expected = "{\n  \"sql\": \"X = ?\",\n  \"bind_values\": [\n    {\n      \"type\": \"boolean\",\n      \"value\": true\n    }\n  ]\n}";
        assert_eq!(to_json_pretty(&bound), expected);
    }

    #[test]
    fn test_empty_binds() {
        let bound = BoundSql {
            sql: "SELECT 1".to_string(),
            bind_values: vec![],
        };
        assert_eq!(to_json(&bound), r#"{"sql":"SELECT 1","bind_values":[]}"#);
    }
}
