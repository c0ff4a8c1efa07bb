/// Lexical tokens of the condition language used by `/*IF ...*/`.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// ```
    Float(f64),

    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// String literal in single or double quotes
    ///
    /// # Examples
    /// ```text
    /// 'FML'
    /// "item #1"
    /// ```
    String(String),

    /// Boolean values
    Boolean(bool),

    /// Null value
    Null,

    // Identifiers and References
    /// Path segment or method name
    ///
    /// Must start with a letter or underscore. The fixed loop alias
    /// `#current` is also lexed as an identifier.
    ///
    /// # Examples
    /// ```text
    /// pmb
    /// memberName
    /// #current
    /// ```
    Identifier(String),

    // Comparison
    /// Equality operator
    EqEq,

    /// Inequality operator
    NotEq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    // Logical
    /// Logical AND (`&&` or the word `and`)
    And,

    /// Logical OR (`||` or the word `or`)
    Or,

    /// Logical NOT
    Exclamation,

    // Delimiters
    /// Left parenthesis for grouping or method calls
    LParen,

    /// Right parenthesis
    RParen,

    /// Dot between path segments
    Dot,

    /// End of input
    Eof,
}
