//! Template evaluation: a parsed [`Node`] tree plus parameters → SQL and
//! ordered bind values.
//!
//! Every node evaluation returns whether it emitted anything. BEGIN blocks
//! read that result from their children instead of sharing a mutable flag.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ast::{LikeSearch, Node, Variable},
    config::{ConfigError, EngineConfig},
    evaluator::{EvalError, Evaluator},
    output::display_sql,
    resolver::{LoopContext, LoopStack, ParameterProvider, ResolveError, Resolved, Scope, resolve},
    template::{contains_bare_placeholder, count_bare_placeholders},
    value::{ParamValue, TypeTag},
};

/// One positional bind value.
#[derive(Debug, Clone, PartialEq)]
pub struct BindValue {
    pub value: ParamValue,
    pub declared_type: TypeTag,
}

/// Rendered SQL with its bind values in placeholder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundSql {
    pub sql: String,
    pub bind_values: Vec<BindValue>,
}

impl BoundSql {
    /// Number of `?` placeholders outside quoted literals.
    pub fn placeholder_count(&self) -> usize {
        count_bare_placeholders(&self.sql)
    }

    /// The SQL with bind values inlined, for logs only.
    pub fn display_sql(&self) -> String {
        display_sql(self)
    }
}

/// Errors raised while rendering. The parsed tree is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("condition '{expression}' failed: {source}")]
    Condition { expression: String, source: EvalError },

    #[error("bind variable '{path}' resolved to null (use the 'nullable' option to allow it)")]
    NullBindValue { path: String },

    #[error("collection '{path}' is empty or contains only nulls")]
    EmptyOrAllNullCollection { path: String },

    #[error("value of '{path}' contains a bare '?': {value}")]
    PlaceholderInValue { path: String, value: String },

    #[error("'{path}' is not a collection (got {type_name})")]
    NotACollection { path: String, type_name: &'static str },

    #[error("default engine configuration is invalid: {reason}")]
    Config { reason: String },

    #[error("'{path}' holds a {type_name} value, which cannot be {action}")]
    Unsupported {
        path: String,
        type_name: &'static str,
        action: &'static str,
    },
}

/// Mutable accumulator for one evaluation: SQL text and bind values.
///
/// A BEGIN block evaluates into a scratch context and commits it only when
/// something inside emitted.
#[derive(Debug, Default)]
pub struct CommandContext {
    sql: String,
    bind_values: Vec<BindValue>,
    /// Inside a BEGIN block
    in_trim: bool,
    /// Something in the current BEGIN block has already been written, so
    /// later fragments keep their connector
    scope_emitted: bool,
}

impl CommandContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn trim_scope() -> Self {
        CommandContext {
            in_trim: true,
            ..Self::default()
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn bind_values(&self) -> &[BindValue] {
        &self.bind_values
    }

    pub fn append_sql(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub fn add_bind(&mut self, value: ParamValue, declared_type: TypeTag) {
        self.bind_values.push(BindValue {
            value,
            declared_type,
        });
    }

    /// The next committed fragment is the first in its BEGIN block.
    fn strips_connector(&self) -> bool {
        self.in_trim && !self.scope_emitted
    }

    pub fn into_bound_sql(self) -> BoundSql {
        let mut sql = self.sql;
        sql.truncate(sql.trim_end().len());
        BoundSql {
            sql,
            bind_values: self.bind_values,
        }
    }
}

/// Renders parsed templates.
///
/// Holds only immutable settings, so one evaluator can serve concurrent
/// renders.
#[derive(Debug, Clone)]
pub struct TemplateEvaluator {
    connector: Regex,
    like_escape: char,
}

impl TemplateEvaluator {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(TemplateEvaluator {
            connector: config.connector_regex()?,
            like_escape: config.like_escape,
        })
    }

    /// Shared evaluator for [`EngineConfig::default`], built on first use.
    pub fn standard() -> Result<&'static TemplateEvaluator, RenderError> {
        static STANDARD: OnceLock<Result<TemplateEvaluator, String>> = OnceLock::new();
        STANDARD
            .get_or_init(|| TemplateEvaluator::new(&EngineConfig::default()).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|reason| RenderError::Config {
                reason: reason.clone(),
            })
    }

    /// Render `root` against `params`.
    pub fn evaluate(&self, root: &Node, params: &dyn ParameterProvider) -> Result<BoundSql, RenderError> {
        let mut walk = Walk {
            evaluator: self,
            params,
            loops: LoopStack::default(),
        };
        let mut ctx = CommandContext::new();
        walk.node(root, &mut ctx)?;

        let bound = ctx.into_bound_sql();
        debug!(
            sql = %bound.sql,
            bind_count = bound.bind_values.len(),
            display_sql = %bound.display_sql(),
            "rendered template"
        );
        Ok(bound)
    }

    /// Drop one leading connector keyword, keeping the whitespace before it.
    fn strip_connector(&self, sql: &str) -> String {
        self.connector.replace(sql, "$1").into_owned()
    }

    fn like_value(&self, search: LikeSearch, text: &str, escape: bool) -> String {
        let escaped = if escape {
            let mut out = String::with_capacity(text.len());
            for ch in text.chars() {
                if ch == self.like_escape || ch == '%' || ch == '_' {
                    out.push(self.like_escape);
                }
                out.push(ch);
            }
            out
        } else {
            text.to_string()
        };

        match search {
            LikeSearch::Prefix => format!("{}%", escaped),
            LikeSearch::Suffix => format!("%{}", escaped),
            LikeSearch::Contain => format!("%{}%", escaped),
        }
    }
}

/// Per-call evaluation state.
struct Walk<'a> {
    evaluator: &'a TemplateEvaluator,
    params: &'a dyn ParameterProvider,
    loops: LoopStack,
}

impl Walk<'_> {
    fn resolve(&self, variable: &Variable) -> Result<Resolved, RenderError> {
        let scope = Scope::new(self.params, &self.loops);
        Ok(resolve(&scope, &variable.path)?)
    }

    fn node(&mut self, node: &Node, ctx: &mut CommandContext) -> Result<bool, RenderError> {
        let emitted = match node {
            Node::Text(text) => {
                ctx.append_sql(text);
                false
            }
            Node::BindVariable(variable) => self.bind(variable, ctx)?,
            Node::EmbeddedVariable(variable) => self.embed(variable, ctx)?,
            Node::If {
                condition,
                children,
                else_branch,
            } => {
                let scope = Scope::new(self.params, &self.loops);
                let taken = Evaluator::new(scope)
                    .eval_condition(&condition.expr)
                    .map_err(|source| RenderError::Condition {
                        expression: condition.source.clone(),
                        source,
                    })?;
                trace!(condition = %condition.source, taken, "evaluated IF");

                if taken {
                    self.fragment(children, ctx)?;
                    true
                } else if let Some(branch) = else_branch {
                    self.fragment(branch, ctx)?;
                    true
                } else {
                    false
                }
            }
            Node::Trim(children) => {
                let mut scratch = CommandContext::trim_scope();
                if self.children(children, &mut scratch)? {
                    self.commit(scratch, ctx);
                    true
                } else {
                    false
                }
            }
            Node::For {
                alias,
                collection,
                children,
            } => {
                let scope = Scope::new(self.params, &self.loops);
                let items = match resolve(&scope, collection)?.value {
                    ParamValue::List(items) => items,
                    other => {
                        return Err(RenderError::NotACollection {
                            path: collection.to_string(),
                            type_name: other.type_name(),
                        });
                    }
                };

                let size = items.len();
                let mut emitted = false;
                for (index, element) in items.into_iter().enumerate() {
                    let declared_type = element.type_tag().unwrap_or(TypeTag::Object);
                    self.loops.push(LoopContext {
                        alias: alias.clone(),
                        element,
                        declared_type,
                        index,
                        size,
                    });
                    let result = self.children(children, ctx);
                    self.loops.pop();
                    emitted |= result?;
                }
                emitted
            }
            Node::LoopFirst(children) => {
                if self.loops.innermost().is_some_and(LoopContext::is_first) {
                    self.children(children, ctx)?
                } else {
                    false
                }
            }
            Node::LoopLast(children) => {
                if self.loops.innermost().is_some_and(LoopContext::is_last) {
                    self.children(children, ctx)?
                } else {
                    false
                }
            }
            Node::LoopNext(text) => {
                if self.loops.innermost().is_some_and(|l| !l.is_first()) {
                    ctx.append_sql(text);
                }
                false
            }
            Node::Root(children) => self.children(children, ctx)?,
        };

        if emitted {
            ctx.scope_emitted = true;
        }
        Ok(emitted)
    }

    /// Evaluate children left to right; true when any of them emitted.
    fn children(&mut self, children: &[Node], ctx: &mut CommandContext) -> Result<bool, RenderError> {
        let mut emitted = false;
        for child in children {
            emitted |= self.node(child, ctx)?;
        }
        Ok(emitted)
    }

    /// Evaluate an IF/ELSE branch. When it is the first fragment of a BEGIN
    /// block it goes through a scratch context so its connector can be
    /// stripped.
    fn fragment(&mut self, children: &[Node], ctx: &mut CommandContext) -> Result<(), RenderError> {
        if ctx.strips_connector() {
            let mut scratch = CommandContext::new();
            self.children(children, &mut scratch)?;
            self.commit(scratch, ctx);
        } else {
            self.children(children, ctx)?;
        }
        Ok(())
    }

    /// Append a scratch context, stripping a leading connector when it is
    /// the first fragment of the enclosing BEGIN block.
    fn commit(&self, scratch: CommandContext, ctx: &mut CommandContext) {
        let sql = if ctx.strips_connector() {
            self.evaluator.strip_connector(&scratch.sql)
        } else {
            scratch.sql
        };
        ctx.append_sql(&sql);
        ctx.bind_values.extend(scratch.bind_values);
    }

    fn bind(&mut self, variable: &Variable, ctx: &mut CommandContext) -> Result<bool, RenderError> {
        let Resolved {
            value,
            declared_type,
        } = self.resolve(variable)?;
        let path = || variable.path.to_string();
        trace!(path = %variable.path, declared_type = %declared_type, "bind variable");

        match value {
            ParamValue::Null => {
                if !variable.options.nullable {
                    return Err(RenderError::NullBindValue { path: path() });
                }
                ctx.append_sql(if variable.in_scope { "(?)" } else { "?" });
                ctx.add_bind(ParamValue::Null, declared_type);
                // Written but does not commit the block
                ctx.scope_emitted = true;
                Ok(false)
            }
            ParamValue::Map(_) | ParamValue::Bean(_) => Err(RenderError::Unsupported {
                path: path(),
                type_name: value.type_name(),
                action: "bound",
            }),
            ParamValue::List(items) if variable.in_scope => {
                let elements: Vec<ParamValue> = items.into_iter().filter(|v| !v.is_null()).collect();
                if elements.is_empty() {
                    return Err(RenderError::EmptyOrAllNullCollection { path: path() });
                }

                let mut placeholders = Vec::with_capacity(elements.len());
                for element in elements {
                    if matches!(element, ParamValue::Map(_) | ParamValue::Bean(_) | ParamValue::List(_)) {
                        return Err(RenderError::Unsupported {
                            path: path(),
                            type_name: element.type_name(),
                            action: "bound as a list element",
                        });
                    }
                    let tag = element.type_tag().unwrap_or(TypeTag::Object);
                    ctx.add_bind(element, tag);
                    placeholders.push("?");
                }
                ctx.append_sql(&format!("({})", placeholders.join(", ")));
                Ok(true)
            }
            value => {
                let options = variable.options;
                let value = match (options.like, value) {
                    (Some(search), ParamValue::String(text)) => {
                        ParamValue::String(self.evaluator.like_value(search, &text, !options.not_escape))
                    }
                    (Some(_), other) => {
                        return Err(RenderError::Unsupported {
                            path: path(),
                            type_name: other.type_name(),
                            action: "used for a LIKE search",
                        });
                    }
                    (None, value) => value,
                };

                ctx.append_sql(if variable.in_scope { "(?)" } else { "?" });
                if options.like.is_some() && !options.not_escape {
                    ctx.append_sql(&format!(" escape '{}'", self.evaluator.like_escape));
                }
                ctx.add_bind(value, declared_type);
                Ok(true)
            }
        }
    }

    fn embed(&mut self, variable: &Variable, ctx: &mut CommandContext) -> Result<bool, RenderError> {
        let Resolved { value, .. } = self.resolve(variable)?;
        let path = || variable.path.to_string();
        trace!(path = %variable.path, "embedded variable");

        let text = match value {
            ParamValue::Null => return Ok(false),
            ParamValue::Map(_) | ParamValue::Bean(_) => {
                return Err(RenderError::Unsupported {
                    path: path(),
                    type_name: value.type_name(),
                    action: "embedded",
                });
            }
            ParamValue::List(items) => {
                let elements: Vec<ParamValue> = items.into_iter().filter(|v| !v.is_null()).collect();
                if elements.is_empty() {
                    return Err(RenderError::EmptyOrAllNullCollection { path: path() });
                }

                let numeric = elements.iter().all(ParamValue::is_numeric);
                let mut parts = Vec::with_capacity(elements.len());
                for element in &elements {
                    let part = element.as_sql_text().ok_or_else(|| RenderError::Unsupported {
                        path: path(),
                        type_name: element.type_name(),
                        action: "embedded as a list element",
                    })?;
                    if numeric {
                        parts.push(part);
                    } else {
                        parts.push(format!("'{}'", part.replace('\'', "''")));
                    }
                }
                format!("({})", parts.join(", "))
            }
            scalar => scalar.as_sql_text().unwrap_or_default(),
        };

        if contains_bare_placeholder(&text) {
            return Err(RenderError::PlaceholderInValue {
                path: path(),
                value: text,
            });
        }

        ctx.append_sql(&text);
        Ok(!text.is_empty())
    }
}

