use crate::{
    binding::Bindings,
    expr::{BinaryOperator, Expr, Method},
    value::Value,
};
use std::{cmp::Ordering, fmt, sync::Arc};
use thiserror::Error as ThisError;

///
/// EvalError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EvalError {
    #[error("invariant expression cannot be evaluated: {construct}")]
    Unsupported { construct: String },

    #[error("operator {op} is not defined for {left} and {right}")]
    Operands {
        op: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("constant slot {index} was not supplied")]
    MissingConstant { index: usize },
}

type EvalFn = dyn Fn(&[Value], &Bindings) -> Result<Value, EvalError> + Send + Sync;

///
/// Evaluator
///
/// Compiled form of one row-invariant sub-expression. It is built from the
/// expression's structure alone: constants are read by slot from the
/// per-call constant list and variables from the call-site arguments, so
/// one evaluator serves every call with the same shape.
///

#[derive(Clone)]
pub struct Evaluator {
    slots: usize,
    eval: Arc<EvalFn>,
}

impl Evaluator {
    /// Number of constant slots the evaluator reads.
    #[must_use]
    pub const fn slots(&self) -> usize {
        self.slots
    }

    pub fn evaluate(&self, constants: &[Value], args: &Bindings) -> Result<Value, EvalError> {
        (self.eval)(constants, args)
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

/// Compile an invariant expression into an evaluator.
pub fn compile_invariant(expr: &Expr) -> Result<Evaluator, EvalError> {
    let mut slots = 0;
    let eval = compile(expr, &mut slots)?;

    Ok(Evaluator { slots, eval })
}

/// Constants of `expr` in the slot order used by `compile_invariant`.
pub fn collect_leaves(expr: &Expr, out: &mut Vec<Value>) {
    match expr {
        Expr::Constant(value) => out.push(value.clone()),
        Expr::Param(_) | Expr::Variable(_) | Expr::Placeholder(_) => {}
        Expr::Member { target, .. } | Expr::Not(target) => collect_leaves(target, out),
        Expr::Binary { left, right, .. } => {
            collect_leaves(left, out);
            collect_leaves(right, out);
        }
        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => {
            collect_leaves(test, out);
            collect_leaves(if_true, out);
            collect_leaves(if_false, out);
        }
        Expr::Call { target, args, .. } => {
            collect_leaves(target, out);
            for arg in args {
                collect_leaves(arg, out);
            }
        }
        Expr::Record(fields) => {
            for (_, expr) in fields {
                collect_leaves(expr, out);
            }
        }
    }
}

fn compile(expr: &Expr, slots: &mut usize) -> Result<Arc<EvalFn>, EvalError> {
    match expr {
        Expr::Constant(_) => {
            let index = *slots;
            *slots += 1;

            Ok(Arc::new(move |constants, _| {
                constants
                    .get(index)
                    .cloned()
                    .ok_or(EvalError::MissingConstant { index })
            }))
        }

        Expr::Variable(name) => {
            let name = name.clone();

            Ok(Arc::new(move |_, args| {
                Ok(args.get(&name).cloned().unwrap_or(Value::Null))
            }))
        }

        Expr::Not(inner) => {
            let inner = compile(inner, slots)?;

            Ok(Arc::new(move |constants, args| {
                match inner(constants, args)? {
                    Value::Bool(value) => Ok(Value::Bool(!value)),
                    other => Err(EvalError::Operands {
                        op: "Not".to_string(),
                        left: other.label(),
                        right: "nothing",
                    }),
                }
            }))
        }

        Expr::Binary { op, left, right } => {
            let op = *op;
            let left = compile(left, slots)?;
            let right = compile(right, slots)?;

            Ok(Arc::new(move |constants, args| {
                let left = left(constants, args)?;
                // short-circuit like the host language
                match (op, &left) {
                    (BinaryOperator::AndAlso, Value::Bool(false)) => return Ok(Value::Bool(false)),
                    (BinaryOperator::OrElse, Value::Bool(true)) => return Ok(Value::Bool(true)),
                    _ => {}
                }
                let right = right(constants, args)?;

                apply_binary(op, &left, &right)
            }))
        }

        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => {
            let test = compile(test, slots)?;
            let if_true = compile(if_true, slots)?;
            let if_false = compile(if_false, slots)?;

            Ok(Arc::new(move |constants, args| {
                match test(constants, args)? {
                    Value::Bool(true) => if_true(constants, args),
                    Value::Bool(false) => if_false(constants, args),
                    other => Err(EvalError::Operands {
                        op: "Conditional".to_string(),
                        left: other.label(),
                        right: "nothing",
                    }),
                }
            }))
        }

        Expr::Call {
            method,
            target,
            args: call_args,
        } => {
            let method = *method;
            let target = compile(target, slots)?;
            let call_args = call_args
                .iter()
                .map(|arg| compile(arg, slots))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Arc::new(move |constants, args| {
                let target = target(constants, args)?;
                let values = call_args
                    .iter()
                    .map(|arg| arg(constants, args))
                    .collect::<Result<Vec<_>, _>>()?;

                apply_method(method, &target, &values)
            }))
        }

        Expr::Param(_) | Expr::Member { .. } | Expr::Placeholder(_) | Expr::Record(_) => {
            Err(EvalError::Unsupported {
                construct: format!("{expr:?}"),
            })
        }
    }
}

fn operands(op: impl fmt::Display, left: &Value, right: &Value) -> EvalError {
    EvalError::Operands {
        op: op.to_string(),
        left: left.label(),
        right: right.label(),
    }
}

#[expect(clippy::cast_precision_loss)]
fn apply_binary(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOperator::AndAlso | BinaryOperator::OrElse => match (left, right) {
            (Value::Bool(left), Value::Bool(right)) => Ok(Value::Bool(if op == BinaryOperator::AndAlso {
                *left && *right
            } else {
                *left || *right
            })),
            _ => Err(operands(op, left, right)),
        },

        BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul => match (left, right) {
            (Value::Int(l), Value::Int(r)) => {
                let value = match op {
                    BinaryOperator::Add => l.checked_add(*r),
                    BinaryOperator::Sub => l.checked_sub(*r),
                    _ => l.checked_mul(*r),
                };
                value.map(Value::Int).ok_or_else(|| operands(op, left, right))
            }
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let as_float = |value: &Value| match value {
                    Value::Int(value) => *value as f64,
                    Value::Float(value) => *value,
                    _ => 0.0,
                };
                let (l, r) = (as_float(left), as_float(right));

                Ok(Value::Float(match op {
                    BinaryOperator::Add => l + r,
                    BinaryOperator::Sub => l - r,
                    _ => l * r,
                }))
            }
            (Value::Text(l), Value::Text(r)) if op == BinaryOperator::Add => {
                Ok(Value::Text(format!("{l}{r}")))
            }
            _ => Err(operands(op, left, right)),
        },

        BinaryOperator::Eq => Ok(Value::Bool(left.loosely_eq(right))),
        BinaryOperator::Ne => Ok(Value::Bool(!left.loosely_eq(right))),

        BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
            let ordering = compare(left, right).ok_or_else(|| operands(op, left, right))?;

            Ok(Value::Bool(match op {
                BinaryOperator::Lt => ordering == Ordering::Less,
                BinaryOperator::Le => ordering != Ordering::Greater,
                BinaryOperator::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Int(l), Value::Float(r)) => (*l as f64).partial_cmp(r),
        (Value::Float(l), Value::Int(r)) => l.partial_cmp(&(*r as f64)),
        (Value::Float(l), Value::Float(r)) => l.partial_cmp(r),
        (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
        (Value::DateTime(l), Value::DateTime(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn apply_method(method: Method, target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let arg = args.first().unwrap_or(&Value::Null);

    match (method, target, arg) {
        (Method::IsNullOrEmpty, Value::Null, _) => Ok(Value::Bool(true)),
        (Method::IsNullOrEmpty, Value::Text(text), _) => Ok(Value::Bool(text.is_empty())),
        (Method::StartsWith, Value::Text(text), Value::Text(prefix)) => {
            Ok(Value::Bool(text.starts_with(prefix.as_str())))
        }
        (Method::Contains, Value::Text(text), Value::Text(needle)) => {
            Ok(Value::Bool(text.contains(needle.as_str())))
        }
        (Method::Contains, Value::List(items), item) => {
            Ok(Value::Bool(items.iter().any(|value| value.loosely_eq(item))))
        }
        (Method::Equals, target, arg) => Ok(Value::Bool(target.loosely_eq(arg))),
        _ => Err(operands(method, target, arg)),
    }
}
