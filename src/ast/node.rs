use crate::{ast::Expr, path::PropertyPath};

/// One unit of a parsed template.
///
/// Container kinds own their children in source order. A parsed tree is
/// immutable and may be rendered any number of times, from any thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal SQL fragment, emitted verbatim
    Text(String),

    /// Bind variable: a `?` placeholder plus one bind value
    ///
    /// # Example
    /// ```text
    /// MEMBER_ID = /*pmb.memberId*/3
    /// ```
    BindVariable(Variable),

    /// Embedded variable: the value spliced into the SQL text
    ///
    /// # Example
    /// ```text
    /// ORDER BY /*$pmb.orderColumn*/MEMBER_ID
    /// ```
    EmbeddedVariable(Variable),

    /// Conditional block with an optional else-branch
    ///
    /// # Example
    /// ```text
    /// /*IF pmb.memberId != null*/ ... /*ELSE*/ ... /*END*/
    /// ```
    If {
        condition: Condition,
        children: Vec<Node>,
        else_branch: Option<Vec<Node>>,
    },

    /// Optional clause, elided when nothing inside emitted
    ///
    /// # Example
    /// ```text
    /// /*BEGIN*/WHERE /*IF ...*/ ... /*END*//*END*/
    /// ```
    Trim(Vec<Node>),

    /// Loop over a collection
    ///
    /// # Example
    /// ```text
    /// /*FOR e : pmb.ids*/ ... /*END*/
    /// ```
    For {
        alias: String,
        collection: PropertyPath,
        children: Vec<Node>,
    },

    /// Children emitted only on the first loop iteration (`/*FIRST*/`)
    LoopFirst(Vec<Node>),

    /// Children emitted only on the last loop iteration (`/*LAST*/`)
    LoopLast(Vec<Node>),

    /// Text emitted before every loop iteration but the first (`/*NEXT 'OR '*/`)
    LoopNext(String),

    /// Top-level container
    Root(Vec<Node>),
}

impl Node {
    /// Child nodes of a container, empty for leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::If { children, .. }
            | Node::For { children, .. }
            | Node::Trim(children)
            | Node::LoopFirst(children)
            | Node::LoopLast(children)
            | Node::Root(children) => children,
            _ => &[],
        }
    }

    /// Total number of nodes in this subtree, else-branches included.
    pub fn count(&self) -> usize {
        let else_count = match self {
            Node::If {
                else_branch: Some(branch),
                ..
            } => branch.iter().map(Node::count).sum(),
            _ => 0,
        };
        1 + else_count + self.children().iter().map(Node::count).sum::<usize>()
    }
}

/// A bind or embedded variable marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Property path of the value
    pub path: PropertyPath,

    /// Literal test value following the marker (never emitted)
    pub test_value: String,

    /// Test value is a parenthesised list: `IN /*pmb.ids*/(1, 2)`
    pub in_scope: bool,

    /// Pipe-separated options after `:`
    pub options: VariableOptions,
}

/// Condition of an IF block, with its source kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub source: String,
    pub expr: Expr,
}

/// LIKE search mode requested on a bind variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeSearch {
    /// `likePrefix`: `value%`
    Prefix,
    /// `likeSuffix`: `%value`
    Suffix,
    /// `likeContain`: `%value%`
    Contain,
}

/// Options written as `/*pmb.name:likePrefix|nullable*/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VariableOptions {
    /// Null values are bound instead of rejected
    pub nullable: bool,

    /// LIKE search wildcarding
    pub like: Option<LikeSearch>,

    /// Suppress LIKE escaping and the `escape` clause
    pub not_escape: bool,
}

impl VariableOptions {
    /// Parse the option list, returning the offending token on failure.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut options = VariableOptions::default();

        for token in text.split('|').map(str::trim) {
            let like = match token {
                "nullable" => {
                    options.nullable = true;
                    continue;
                }
                "notEscape" => {
                    options.not_escape = true;
                    continue;
                }
                "likePrefix" => LikeSearch::Prefix,
                "likeSuffix" => LikeSearch::Suffix,
                "likeContain" => LikeSearch::Contain,
                other => return Err(format!("unknown option '{}'", other)),
            };
            if options.like.is_some() {
                return Err(format!("conflicting like option '{}'", token));
            }
            options.like = Some(like);
        }

        Ok(options)
    }
}
