use crate::{
    algebra::AlgebraError, binding::BindingError, execute::ExecuteError, expr::EvalError,
    translate::TranslateError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// QueryError
///
/// Crate-wide error returned by the engine. Each layer keeps its own error
/// type; this wraps them and exposes a stable classification.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum QueryError {
    #[error(transparent)]
    Algebra(#[from] AlgebraError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    Translate(#[from] TranslateError),
}

impl QueryError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Binding(_)
            | Self::Algebra(AlgebraError::Binding(_))
            | Self::Eval(EvalError::Operands { .. }) => ErrorClass::Binding,
            // negation the store grammar cannot express came from the query
            Self::Translate(TranslateError::Algebra(AlgebraError::NotNegatable { .. })) => {
                ErrorClass::Unsupported
            }
            Self::Algebra(_) | Self::Translate(TranslateError::Algebra(_)) => {
                ErrorClass::InvariantViolation
            }
            Self::Eval(EvalError::MissingConstant { .. }) => ErrorClass::InvariantViolation,
            Self::Eval(EvalError::Unsupported { .. }) | Self::Translate(_) => {
                ErrorClass::Unsupported
            }
            Self::Execute(_) => ErrorClass::Execution,
        }
    }

    /// Message prefixed with the error class, for logs.
    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}", self.class(), self)
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Unsupported,
    InvariantViolation,
    Binding,
    Execution,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
            Self::Binding => "binding",
            Self::Execution => "execution",
        };
        write!(f, "{label}")
    }
}
