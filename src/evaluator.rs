use std::cmp::Ordering;

use thiserror::Error;

use crate::{
    ast::{BinOp, Expr},
    parser::{ParseError, parse_condition},
    path::PropertyPath,
    resolver::{LoopStack, ParameterProvider, ResolveError, Scope, resolve},
    value::ParamValue,
};

/// Errors that can occur while evaluating a condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Condition text is not a valid expression
    #[error("syntax error: {0}")]
    Syntax(#[from] ParseError),

    /// A referenced path does not resolve
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Type mismatch, or a non-boolean result
    #[error("type error: {0}")]
    TypeError(String),

    /// Method query not supported by the target value
    #[error("unknown method {method}() on {type_name} at '{path}'")]
    UnknownMethod {
        method: String,
        type_name: String,
        path: String,
    },
}

/// Evaluates condition expressions against a [`Scope`].
///
/// Paths resolve through the parameter resolver, so a missing property is an
/// error here too. `&&` and `||` short-circuit, which is what makes
/// `pmb.name != null && !pmb.name.isEmpty()` safe.
pub struct Evaluator<'s> {
    scope: Scope<'s>,
}

impl<'s> Evaluator<'s> {
    pub fn new(scope: Scope<'s>) -> Self {
        Evaluator { scope }
    }

    /// Evaluate an expression that must produce a boolean.
    pub fn eval_condition(&self, expr: &Expr) -> Result<bool, EvalError> {
        let value = self.eval_expr(expr)?;
        expect_bool(&value, "condition")
    }

    fn eval_expr(&self, expr: &Expr) -> Result<ParamValue, EvalError> {
        match expr {
            Expr::Float(n) => Ok(ParamValue::Float(*n)),
            Expr::Integer(n) => Ok(ParamValue::Integer(*n)),
            Expr::String(s) => Ok(ParamValue::String(s.clone())),
            Expr::Boolean(b) => Ok(ParamValue::Boolean(*b)),
            Expr::Null => Ok(ParamValue::Null),
            Expr::Path(path) => Ok(resolve(&self.scope, path)?.value),
            Expr::MethodCall { target, method } => self.eval_method_call(target, method),
            Expr::Not(operand) => {
                let value = self.eval_expr(operand)?;
                Ok(ParamValue::Boolean(!expect_bool(&value, "operand of '!'")?))
            }
            Expr::BinaryOp { op, left, right } => match op {
                BinOp::And => {
                    let left_val = self.eval_expr(left)?;
                    if !expect_bool(&left_val, "left operand of '&&'")? {
                        return Ok(ParamValue::Boolean(false));
                    }
                    let right_val = self.eval_expr(right)?;
                    Ok(ParamValue::Boolean(expect_bool(&right_val, "right operand of '&&'")?))
                }
                BinOp::Or => {
                    let left_val = self.eval_expr(left)?;
                    if expect_bool(&left_val, "left operand of '||'")? {
                        return Ok(ParamValue::Boolean(true));
                    }
                    let right_val = self.eval_expr(right)?;
                    Ok(ParamValue::Boolean(expect_bool(&right_val, "right operand of '||'")?))
                }
                _ => {
                    let left_val = self.eval_expr(left)?;
                    let right_val = self.eval_expr(right)?;
                    self.apply_comparison(*op, &left_val, &right_val)
                        .map(ParamValue::Boolean)
                }
            },
        }
    }

    fn apply_comparison(&self, op: BinOp, left: &ParamValue, right: &ParamValue) -> Result<bool, EvalError> {
        match op {
            BinOp::Equal => values_equal(left, right),
            BinOp::NotEqual => values_equal(left, right).map(|eq| !eq),
            _ => {
                let ordering = compare_values(left, right).ok_or_else(|| {
                    EvalError::TypeError(format!(
                        "cannot order {} and {} with '{}'",
                        left.type_name(),
                        right.type_name(),
                        op.symbol()
                    ))
                })?;
                Ok(match op {
                    BinOp::LessThan => ordering == Ordering::Less,
                    BinOp::GreaterThan => ordering == Ordering::Greater,
                    BinOp::LessEqual => ordering != Ordering::Greater,
                    BinOp::GreaterEqual => ordering != Ordering::Less,
                    _ => false,
                })
            }
        }
    }

    /// Dispatch boolean method queries
    fn eval_method_call(&self, target: &PropertyPath, method: &str) -> Result<ParamValue, EvalError> {
        let value = resolve(&self.scope, target)?.value;

        let unknown = || EvalError::UnknownMethod {
            method: method.to_string(),
            type_name: value.type_name().to_string(),
            path: target.to_string(),
        };

        let result = match (&value, method) {
            (ParamValue::String(s), "isEmpty") => s.is_empty(),
            (ParamValue::String(s), "isNotEmpty") => !s.is_empty(),
            (ParamValue::List(items), "isEmpty") => items.is_empty(),
            (ParamValue::List(items), "isNotEmpty") => !items.is_empty(),
            (ParamValue::Map(map), "isEmpty") => map.is_empty(),
            (ParamValue::Map(map), "isNotEmpty") => !map.is_empty(),
            (ParamValue::Null, _) => {
                return Err(EvalError::TypeError(format!(
                    "cannot call {}() on null at '{}'",
                    method, target
                )));
            }
            (ParamValue::Bean(bean), _) => {
                let property = bean_query_property(method).ok_or_else(unknown)?;
                let answer = bean
                    .property(method)
                    .or_else(|| bean.property(&property))
                    .ok_or_else(unknown)?;
                expect_bool(answer, &format!("{}.{}()", target, method))?
            }
            _ => return Err(unknown()),
        };

        Ok(ParamValue::Boolean(result))
    }
}

/// Evaluate condition source text against a parameter provider.
///
/// # Examples
///
/// ```
/// use twoway_sql::{Bean, Parameters, evaluate_condition};
///
/// let params = Parameters::new("pmb", Bean::new("MemberPmb").with("memberId", 3));
/// assert!(evaluate_condition(&params, "pmb.memberId != null && pmb.memberId > 1").unwrap());
/// ```
pub fn evaluate_condition(params: &dyn ParameterProvider, source: &str) -> Result<bool, EvalError> {
    let expr = parse_condition(source)?;
    let loops = LoopStack::default();
    Evaluator::new(Scope::new(params, &loops)).eval_condition(&expr)
}

fn expect_bool(value: &ParamValue, what: &str) -> Result<bool, EvalError> {
    match value {
        ParamValue::Boolean(b) => Ok(*b),
        other => Err(EvalError::TypeError(format!(
            "{} must be boolean, got {}",
            what,
            other.type_name()
        ))),
    }
}

/// `isPaging` → `paging`, `hasRows` → `rows`
fn bean_query_property(method: &str) -> Option<String> {
    let rest = method
        .strip_prefix("is")
        .or_else(|| method.strip_prefix("has"))?;
    let mut chars = rest.chars();
    let first = chars.next().filter(|c| c.is_uppercase())?;
    Some(first.to_lowercase().chain(chars).collect())
}

fn values_equal(left: &ParamValue, right: &ParamValue) -> Result<bool, EvalError> {
    match (left, right) {
        (ParamValue::Null, ParamValue::Null) => Ok(true),
        (ParamValue::Null, _) | (_, ParamValue::Null) => Ok(false),
        (a, b) if a.is_numeric() && b.is_numeric() => match (a.as_decimal(), b.as_decimal()) {
            (Some(x), Some(y)) => Ok(x == y),
            _ => Ok(false),
        },
        (ParamValue::String(a), ParamValue::String(b)) => Ok(a == b),
        (ParamValue::Boolean(a), ParamValue::Boolean(b)) => Ok(a == b),
        (a, b) if a.type_tag() == b.type_tag() => Ok(a == b),
        (a, b) => Err(EvalError::TypeError(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn compare_values(left: &ParamValue, right: &ParamValue) -> Option<Ordering> {
    match (left, right) {
        (a, b) if a.is_numeric() && b.is_numeric() => Some(a.as_decimal()?.cmp(&b.as_decimal()?)),
        (ParamValue::String(a), ParamValue::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
