use std::fmt;

/// Fixed alias referring to the innermost loop element.
pub const CURRENT_ALIAS: &str = "#current";

/// A segment in a dotted property path.
///
/// # Examples
/// - `pmb.memberId` → `[Property("pmb"), Property("memberId")]`
/// - `pmb.ids.0` → `[Property("pmb"), Property("ids"), Index(0)]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Bean property or map key
    Property(String),

    /// List element by zero-based index
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => f.write_str(name),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// A validated dotted path such as `pmb.member.memberName`.
///
/// The first segment is always a name: the root parameter, a loop alias
/// or `#current`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    head: String,
    tail: Vec<PathSegment>,
}

impl PropertyPath {
    /// Parse a dotted path, returning a description of the problem on failure.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut parts = text.split('.');

        let head = match parts.next() {
            Some(h) if h == CURRENT_ALIAS || is_identifier(h) => h.to_string(),
            Some("") | None => return Err("empty property path".to_string()),
            Some(h) => return Err(format!("invalid parameter name '{}'", h)),
        };

        let mut tail = vec![];
        for part in parts {
            if part.is_empty() {
                return Err(format!("empty segment in '{}'", text));
            }
            if part.chars().all(|c| c.is_ascii_digit()) {
                let index = part
                    .parse::<usize>()
                    .map_err(|_| format!("index out of range in '{}'", text))?;
                tail.push(PathSegment::Index(index));
            } else if is_identifier(part) {
                tail.push(PathSegment::Property(part.to_string()));
            } else {
                return Err(format!("invalid segment '{}' in '{}'", part, text));
            }
        }

        Ok(PropertyPath { head, tail })
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn tail(&self) -> &[PathSegment] {
        &self.tail
    }

    /// The path below the first segment, joined with dots (`member.name`).
    pub fn relative(&self) -> String {
        self.tail
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.head)?;
        for segment in &self.tail {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_path() {
        let path = PropertyPath::parse("pmb.member.memberName").unwrap();
        assert_eq!(path.head(), "pmb");
        assert_eq!(path.relative(), "member.memberName");
        assert_eq!(path.to_string(), "pmb.member.memberName");
    }

    #[test]
    fn test_parse_index_segment() {
        let path = PropertyPath::parse("pmb.ids.1").unwrap();
        assert_eq!(path.tail()[1], PathSegment::Index(1));
    }

    #[test]
    fn test_current_alias_only_as_head() {
        assert!(PropertyPath::parse("#current.name").is_ok());
        assert!(PropertyPath::parse("pmb.#current").is_err());
    }

    #[test]
    fn test_reject_malformed() {
        assert!(PropertyPath::parse("").is_err());
        assert!(PropertyPath::parse("pmb..id").is_err());
        assert!(PropertyPath::parse("1pmb").is_err());
        assert!(PropertyPath::parse("pmb.id-x").is_err());
    }
}
