pub mod ast;
pub mod cli;
pub mod config;
pub mod evaluator;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod path;
pub mod render;
pub mod resolver;
pub mod template;
pub mod value;

pub use ast::{BinOp, Expr, LikeSearch, Node, Token, Variable, VariableOptions};
pub use config::{ConfigError, EngineConfig};
pub use evaluator::{EvalError, Evaluator, evaluate_condition};
pub use lexer::{LexError, Lexer, Position};
pub use output::{display_sql, to_json, to_json_pretty};
pub use parser::{ParseError, Parser, parse_condition};
pub use path::{PathSegment, PropertyPath};
pub use render::{BindValue, BoundSql, CommandContext, RenderError, TemplateEvaluator};
pub use resolver::{
    LoopContext, LoopStack, ParameterProvider, Parameters, ResolveError, Resolved, Scope, resolve,
};
pub use template::{Template, TemplateSyntaxError, parse_template};
pub use value::{Bean, ParamValue, TypeTag};
