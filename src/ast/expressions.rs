use crate::{ast::BinOp, path::PropertyPath};

/// Condition expression of an `/*IF ...*/` block.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal floating point number
    Float(f64),

    /// Literal integer
    Integer(i64),

    /// String literal
    String(String),

    /// Boolean literal
    Boolean(bool),

    /// Null literal
    Null,

    // References
    /// Property path resolved against the parameters
    ///
    /// # Examples
    /// ```text
    /// pmb.memberId
    /// e.status
    /// ```
    Path(PropertyPath),

    /// Boolean method-style query on a path
    ///
    /// # Examples
    /// ```text
    /// pmb.isPaging()
    /// pmb.statusList.isEmpty()
    /// ```
    MethodCall { target: PropertyPath, method: String },

    // Operations
    /// Logical negation (`!expr`)
    Not(Box<Expr>),

    /// Comparison or logical operation
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}
