//! # 2-way SQL Templates - Abstract Syntax Tree
//!
//! A 2-way SQL template is plain, runnable SQL whose block comments carry
//! directives. Run as-is, the database sees the literal test values; rendered
//! through this crate, the comments drive optional clauses, loops and
//! variable substitution.
//!
//! ## Architecture Overview
//!
//! - **[node]** - Template tree: text, variables, IF/BEGIN/FOR blocks
//! - **[expressions]** - Condition expressions used by `/*IF ...*/`
//! - **[operators]** - Comparison and logical operators
//! - **[tokens]** - Lexical tokens of the condition language
//!
//! ## Quick Start
//!
//! ```text
//! SELECT * FROM MEMBER
//! /*BEGIN*/WHERE
//!   /*IF pmb.memberId != null*/MEMBER_ID = /*pmb.memberId*/3/*END*/
//!   /*IF pmb.memberName != null*/AND MEMBER_NAME LIKE /*pmb.memberName:likePrefix*/'S%'/*END*/
//! /*END*/
//! ORDER BY /*$pmb.orderColumn*/MEMBER_ID
//! ```
//!
//! ## Core Concepts
//!
//! ### Variables
//!
//! - **Bind** `/*pmb.x*/test` - replaced by `?`, value bound out-of-band
//! - **Embedded** `/*$pmb.x*/test` - value spliced into the SQL text
//!
//! The test value after the marker is dropped. A parenthesised test value,
//! as in `IN /*pmb.ids*/(1, 2)`, expands a list into `(?, ?, ...)`.
//!
//! ### Blocks
//!
//! - **IF** `/*IF cond*/ ... /*ELSE*/ ... /*END*/`
//! - **BEGIN** `/*BEGIN*/ ... /*END*/` - dropped when nothing inside emitted;
//!   the first emitted fragment loses a leading `AND`/`OR`
//! - **FOR** `/*FOR e : pmb.list*/ ... /*END*/` with `/*FIRST*/`, `/*LAST*/`
//!   and `/*NEXT 'sep'*/` helpers inside
pub mod expressions;
pub mod node;
pub mod operators;
pub mod tokens;

pub use expressions::Expr;
pub use node::{Condition, LikeSearch, Node, Variable, VariableOptions};
pub use operators::BinOp;
pub use tokens::Token;
