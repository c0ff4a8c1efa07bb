//! Template parser: SQL text with directive comments → [`Node`] tree.
//!
//! Text between directives is copied verbatim. Quoted SQL literals and
//! `--` line comments are opaque, so `'/*IF*/'` inside a string is plain
//! text. Open blocks live on an explicit stack; `/*END*/` pops the top and
//! attaches it to its parent.

use std::{mem, str::FromStr};

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{Condition, Node, Variable, VariableOptions},
    lexer::Position,
    parser::{ParseError, parse_condition},
    path::{CURRENT_ALIAS, PropertyPath, is_identifier},
    render::{BoundSql, RenderError, TemplateEvaluator},
    resolver::ParameterProvider,
};

/// Errors detected while parsing a template. Always fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateSyntaxError {
    #[error("unterminated comment at {position}")]
    UnterminatedComment { position: Position },

    #[error("unterminated literal '{fragment}' at {position}")]
    UnterminatedLiteral { fragment: String, position: Position },

    #[error("/*{directive}*/ at {position} is never closed by /*END*/")]
    UnterminatedBlock { directive: String, position: Position },

    #[error("/*END*/ at {position} has no open block")]
    UnexpectedEnd { position: Position },

    #[error("misplaced ELSE at {position}: {reason}")]
    MisplacedElse {
        position: Position,
        reason: &'static str,
    },

    #[error("/*{directive}*/ at {position} is only allowed inside a FOR block")]
    LoopDirectiveOutsideFor { directive: String, position: Position },

    #[error("malformed marker /*{fragment}*/ at {position}: {reason}")]
    MalformedMarker {
        fragment: String,
        position: Position,
        reason: String,
    },

    #[error("bare '?' at {position}: placeholders come from bind variables only")]
    PlaceholderInText { position: Position },

    #[error("test value '{fragment}' at {position} contains a bare '?'")]
    PlaceholderInTestValue { fragment: String, position: Position },

    #[error("invalid condition '{fragment}' at {position}: {source}")]
    InvalidCondition {
        fragment: String,
        position: Position,
        source: ParseError,
    },
}

/// A parsed template, ready to be rendered any number of times.
///
/// # Examples
///
/// ```
/// use twoway_sql::{Bean, Parameters, Template};
///
/// let template = Template::parse(
///     "SELECT * FROM MEMBER /*BEGIN*/WHERE /*IF pmb.id != null*/MEMBER_ID = /*pmb.id*/3/*END*//*END*/",
/// ).unwrap();
///
/// let params = Parameters::new("pmb", Bean::new("MemberPmb").with("id", 7));
/// let bound = template.render(&params).unwrap();
/// assert_eq!(bound.sql, "SELECT * FROM MEMBER WHERE MEMBER_ID = ?");
/// assert_eq!(bound.bind_values.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    root: Node,
}

impl Template {
    pub fn parse(text: &str) -> Result<Self, TemplateSyntaxError> {
        let root = parse_template(text)?;
        Ok(Template {
            source: text.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The Root node of the tree.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Render with the default engine configuration.
    pub fn render(&self, params: &dyn ParameterProvider) -> Result<BoundSql, RenderError> {
        TemplateEvaluator::standard()?.evaluate(&self.root, params)
    }
}

impl FromStr for Template {
    type Err = TemplateSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::parse(s)
    }
}

/// Parse template text into its Root node.
pub fn parse_template(text: &str) -> Result<Node, TemplateSyntaxError> {
    let root = TemplateParser::new(text).parse()?;
    debug!(length = text.len(), nodes = root.count(), "parsed template");
    Ok(root)
}

enum BlockKind {
    Root,
    If {
        condition: Condition,
        /// Set once `ELSE` is seen; `children` then collects the else-branch
        then_branch: Option<Vec<Node>>,
    },
    Trim,
    For {
        alias: String,
        collection: PropertyPath,
    },
    First,
    Last,
}

struct Frame {
    kind: BlockKind,
    children: Vec<Node>,
    directive: String,
    offset: usize,
}

impl Frame {
    fn new(kind: BlockKind, directive: &str, offset: usize) -> Self {
        Frame {
            kind,
            children: vec![],
            directive: directive.to_string(),
            offset,
        }
    }

    fn into_node(self) -> Node {
        let children = self.children;
        match self.kind {
            BlockKind::Root => Node::Root(children),
            BlockKind::If {
                condition,
                then_branch: Some(then_branch),
            } => Node::If {
                condition,
                children: then_branch,
                else_branch: Some(children),
            },
            BlockKind::If {
                condition,
                then_branch: None,
            } => Node::If {
                condition,
                children,
                else_branch: None,
            },
            BlockKind::Trim => Node::Trim(children),
            BlockKind::For { alias, collection } => Node::For {
                alias,
                collection,
                children,
            },
            BlockKind::First => Node::LoopFirst(children),
            BlockKind::Last => Node::LoopLast(children),
        }
    }
}

struct TemplateParser<'a> {
    text: &'a str,
    position: usize,
    pending_text: String,
    stack: Vec<Frame>,
}

impl<'a> TemplateParser<'a> {
    fn new(text: &'a str) -> Self {
        TemplateParser {
            text,
            position: 0,
            pending_text: String::new(),
            stack: vec![Frame::new(BlockKind::Root, "ROOT", 0)],
        }
    }

    fn locate(&self, offset: usize) -> Position {
        Position::locate(self.text, offset)
    }

    fn rest(&self) -> &'a str {
        &self.text[self.position..]
    }

    fn parse(mut self) -> Result<Node, TemplateSyntaxError> {
        while self.position < self.text.len() {
            let rest = self.rest();
            if rest.starts_with("/*") {
                self.read_comment()?;
            } else if rest.starts_with('\'') {
                let end = self.quoted_end(self.position)?;
                self.pending_text.push_str(&self.text[self.position..end]);
                self.position = end;
            } else if rest.starts_with("--") {
                self.read_line_comment()?;
            } else if rest.starts_with('?') {
                return Err(TemplateSyntaxError::PlaceholderInText {
                    position: self.locate(self.position),
                });
            } else if let Some(ch) = rest.chars().next() {
                self.pending_text.push(ch);
                self.position += ch.len_utf8();
            }
        }

        self.flush_text();

        if self.stack.len() > 1
            && let Some(open) = self.stack.pop()
        {
            return Err(TemplateSyntaxError::UnterminatedBlock {
                directive: open.directive,
                position: self.locate(open.offset),
            });
        }

        match self.stack.pop() {
            Some(root) => Ok(root.into_node()),
            None => Ok(Node::Root(vec![])),
        }
    }

    fn flush_text(&mut self) {
        if !self.pending_text.is_empty() {
            let text = mem::take(&mut self.pending_text);
            self.push_node(Node::Text(text));
        }
    }

    fn push_node(&mut self, node: Node) {
        if let Some(top) = self.stack.last_mut() {
            top.children.push(node);
        }
    }

    fn in_for(&self) -> bool {
        self.stack
            .iter()
            .any(|f| matches!(f.kind, BlockKind::For { .. }))
    }

    /// End offset (exclusive) of a `'...'` literal starting at `start`.
    fn quoted_end(&self, start: usize) -> Result<usize, TemplateSyntaxError> {
        let bytes = self.text.as_bytes();
        let mut i = start + 1;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                return Ok(i + 1);
            }
            i += 1;
        }
        Err(TemplateSyntaxError::UnterminatedLiteral {
            fragment: excerpt(&self.text[start..]),
            position: self.locate(start),
        })
    }

    fn read_line_comment(&mut self) -> Result<(), TemplateSyntaxError> {
        let text = self.text;
        let start = self.position;
        let end = text[start..].find('\n').map(|i| start + i).unwrap_or(text.len());
        let line = &text[start..end];

        let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        if line[2..].trim() == "ELSE" && text[line_start..start].trim().is_empty() {
            self.flush_text();
            self.position = end;
            return self.read_else(start);
        }

        self.pending_text.push_str(line);
        self.position = end;
        Ok(())
    }

    fn read_comment(&mut self) -> Result<(), TemplateSyntaxError> {
        let text = self.text;
        let start = self.position;
        let close = match text[start + 2..].find("*/") {
            Some(i) => start + 2 + i,
            None => {
                return Err(TemplateSyntaxError::UnterminatedComment {
                    position: self.locate(start),
                });
            }
        };
        let body = &text[start + 2..close];
        self.position = close + 2;

        // Free-text comments and optimizer hints stay in the SQL
        if body.is_empty() || body.starts_with(|c: char| c.is_whitespace() || c == '+' || c == '*') {
            self.pending_text.push_str(&text[start..self.position]);
            return Ok(());
        }

        self.flush_text();

        match body {
            "BEGIN" => {
                self.stack.push(Frame::new(BlockKind::Trim, body, start));
                Ok(())
            }
            "END" => self.read_end(start),
            "ELSE" => self.read_else(start),
            "FIRST" | "LAST" => {
                if !self.in_for() {
                    return Err(TemplateSyntaxError::LoopDirectiveOutsideFor {
                        directive: body.to_string(),
                        position: self.locate(start),
                    });
                }
                let kind = if body == "FIRST" {
                    BlockKind::First
                } else {
                    BlockKind::Last
                };
                self.stack.push(Frame::new(kind, body, start));
                Ok(())
            }
            "IF" | "FOR" | "NEXT" => Err(self.malformed(body, start, "missing argument")),
            _ if body.starts_with("IF ") => self.read_if(body, start),
            _ if body.starts_with("FOR ") => self.read_for(body, start),
            _ if body.starts_with("NEXT ") => self.read_next(body, start),
            _ => match body.strip_prefix('$') {
                Some(marker) => {
                    let variable = self.read_variable(body, marker, start, true)?;
                    self.push_node(Node::EmbeddedVariable(variable));
                    Ok(())
                }
                None => {
                    let variable = self.read_variable(body, body, start, false)?;
                    self.push_node(Node::BindVariable(variable));
                    Ok(())
                }
            },
        }
    }

    fn malformed(&self, body: &str, offset: usize, reason: impl Into<String>) -> TemplateSyntaxError {
        TemplateSyntaxError::MalformedMarker {
            fragment: body.to_string(),
            position: self.locate(offset),
            reason: reason.into(),
        }
    }

    fn read_if(&mut self, body: &str, offset: usize) -> Result<(), TemplateSyntaxError> {
        let source = body["IF ".len()..].trim();
        let expr = parse_condition(source).map_err(|source_err| {
            TemplateSyntaxError::InvalidCondition {
                fragment: source.to_string(),
                position: self.locate(offset),
                source: source_err,
            }
        })?;

        let condition = Condition {
            source: source.to_string(),
            expr,
        };
        self.stack.push(Frame::new(
            BlockKind::If {
                condition,
                then_branch: None,
            },
            body,
            offset,
        ));
        Ok(())
    }

    fn read_else(&mut self, offset: usize) -> Result<(), TemplateSyntaxError> {
        let position = self.locate(offset);
        let misplaced = TemplateSyntaxError::MisplacedElse {
            position,
            reason: "ELSE must appear directly inside an IF block",
        };
        let Some(top) = self.stack.last_mut() else {
            return Err(misplaced);
        };

        match &mut top.kind {
            BlockKind::If {
                then_branch: Some(_),
                ..
            } => Err(TemplateSyntaxError::MisplacedElse {
                position,
                reason: "IF block already has an ELSE",
            }),
            BlockKind::If { then_branch, .. } => {
                *then_branch = Some(mem::take(&mut top.children));
                Ok(())
            }
            _ => Err(misplaced),
        }
    }

    fn read_for(&mut self, body: &str, offset: usize) -> Result<(), TemplateSyntaxError> {
        let spec = body["FOR ".len()..].trim();
        let (alias, path) = match spec.split_once(':') {
            Some((alias, path)) => (alias.trim(), path.trim()),
            None => (CURRENT_ALIAS, spec),
        };

        if alias != CURRENT_ALIAS && !is_identifier(alias) {
            return Err(self.malformed(body, offset, format!("invalid loop alias '{}'", alias)));
        }
        let collection =
            PropertyPath::parse(path).map_err(|reason| self.malformed(body, offset, reason))?;

        self.stack.push(Frame::new(
            BlockKind::For {
                alias: alias.to_string(),
                collection,
            },
            body,
            offset,
        ));
        Ok(())
    }

    fn read_next(&mut self, body: &str, offset: usize) -> Result<(), TemplateSyntaxError> {
        if !self.in_for() {
            return Err(TemplateSyntaxError::LoopDirectiveOutsideFor {
                directive: body.to_string(),
                position: self.locate(offset),
            });
        }

        let arg = body["NEXT ".len()..].trim();
        let text = arg
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .ok_or_else(|| self.malformed(body, offset, "NEXT expects a quoted literal"))?;

        self.push_node(Node::LoopNext(text.replace("''", "'")));
        Ok(())
    }

    fn read_end(&mut self, offset: usize) -> Result<(), TemplateSyntaxError> {
        if self.stack.len() <= 1 {
            return Err(TemplateSyntaxError::UnexpectedEnd {
                position: self.locate(offset),
            });
        }
        if let Some(frame) = self.stack.pop() {
            self.push_node(frame.into_node());
        }
        Ok(())
    }

    /// Parse `path[:options]` and consume the test value that follows.
    fn read_variable(
        &mut self,
        body: &str,
        marker: &str,
        offset: usize,
        embedded: bool,
    ) -> Result<Variable, TemplateSyntaxError> {
        let (path_text, option_text) = match marker.split_once(':') {
            Some((p, o)) => (p.trim(), Some(o)),
            None => (marker.trim(), None),
        };

        let path =
            PropertyPath::parse(path_text).map_err(|reason| self.malformed(body, offset, reason))?;
        let options = match option_text {
            Some(text) => {
                VariableOptions::parse(text).map_err(|reason| self.malformed(body, offset, reason))?
            }
            None => VariableOptions::default(),
        };
        if embedded && options.like.is_some() {
            return Err(self.malformed(body, offset, "like options apply to bind variables only"));
        }

        let (test_value, in_scope) = self.read_test_value()?;

        Ok(Variable {
            path,
            test_value,
            in_scope,
            options,
        })
    }

    /// Consume the literal test value after a variable marker.
    fn read_test_value(&mut self) -> Result<(String, bool), TemplateSyntaxError> {
        let text = self.text;
        let start = self.position;
        let bytes = text.as_bytes();

        let (end, in_scope) = match bytes.get(start) {
            Some(b'\'') => (self.quoted_end(start)?, false),
            Some(b'(') => (self.paren_end(start)?, true),
            _ => {
                let mut i = start;
                while i < bytes.len() {
                    let b = bytes[i];
                    if b.is_ascii_whitespace()
                        || matches!(b, b',' | b')' | b';')
                        || bytes[i..].starts_with(b"/*")
                        || bytes[i..].starts_with(b"--")
                    {
                        break;
                    }
                    i += 1;
                }
                (i, false)
            }
        };

        let test_value = &text[start..end];
        if contains_bare_placeholder(test_value) {
            return Err(TemplateSyntaxError::PlaceholderInTestValue {
                fragment: test_value.to_string(),
                position: self.locate(start),
            });
        }

        self.position = end;
        Ok((test_value.to_string(), in_scope))
    }

    /// End offset (exclusive) of a parenthesised group starting at `start`.
    fn paren_end(&self, start: usize) -> Result<usize, TemplateSyntaxError> {
        let bytes = self.text.as_bytes();
        let mut depth = 0usize;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'\'' => {
                    i = self.quoted_end(i)?;
                    continue;
                }
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i + 1);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(TemplateSyntaxError::UnterminatedLiteral {
            fragment: excerpt(&self.text[start..]),
            position: self.locate(start),
        })
    }
}

/// True when `text` has a `?` outside single-quoted literals and comments.
pub fn contains_bare_placeholder(text: &str) -> bool {
    count_bare_placeholders(text) > 0
}

/// Number of `?` characters outside single-quoted literals and comments.
pub fn count_bare_placeholders(text: &str) -> usize {
    let mut count = 0;
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        let skip = if rest.starts_with("/*") {
            rest.find("*/").map_or(rest.len(), |i| i + 2)
        } else if rest.starts_with("--") {
            rest.find('\n').unwrap_or(rest.len())
        } else if ch == '\'' {
            rest[1..].find('\'').map_or(rest.len(), |i| i + 2)
        } else {
            if ch == '?' {
                count += 1;
            }
            ch.len_utf8()
        };
        rest = &rest[skip..];
    }
    count
}

fn excerpt(text: &str) -> String {
    text.chars().take(20).collect()
}
