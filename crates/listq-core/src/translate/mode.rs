use crate::{
    binding::{BindingError, Bindings, ValueBinding},
    expr::TerminalOp,
    value::Value,
};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// ExecutionMode
///
/// Terminal operation of a query; tells the caller how to post-process the
/// returned rows.
///

#[remain::sorted]
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
pub enum ExecutionMode {
    All,
    Any,
    Count,
    ElementAt,
    ElementAtOrDefault,
    First,
    FirstOrDefault,
    #[default]
    Select,
    Single,
    SingleOrDefault,
}

impl ExecutionMode {
    /// Mode for a terminal operator; `None` for terminals the store cannot serve.
    #[must_use]
    pub const fn from_terminal(op: TerminalOp) -> Option<Self> {
        match op {
            TerminalOp::All => Some(Self::All),
            TerminalOp::Any => Some(Self::Any),
            TerminalOp::Count => Some(Self::Count),
            TerminalOp::ElementAt => Some(Self::ElementAt),
            TerminalOp::ElementAtOrDefault => Some(Self::ElementAtOrDefault),
            TerminalOp::First => Some(Self::First),
            TerminalOp::FirstOrDefault => Some(Self::FirstOrDefault),
            TerminalOp::Single => Some(Self::Single),
            TerminalOp::SingleOrDefault => Some(Self::SingleOrDefault),
            TerminalOp::Last => None,
        }
    }

    /// Row limit implied by the mode itself.
    #[must_use]
    pub const fn implied_limit(self) -> Option<u32> {
        match self {
            Self::First | Self::FirstOrDefault | Self::Any | Self::All => Some(1),
            // two rows are enough to detect ambiguity
            Self::Single | Self::SingleOrDefault => Some(2),
            Self::Select | Self::Count | Self::ElementAt | Self::ElementAtOrDefault => None,
        }
    }

    #[must_use]
    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::ElementAt | Self::ElementAtOrDefault)
    }

    /// Modes that tolerate an empty result.
    #[must_use]
    pub const fn or_default(self) -> bool {
        matches!(
            self,
            Self::FirstOrDefault | Self::SingleOrDefault | Self::ElementAtOrDefault
        )
    }
}

///
/// Paging
///
/// Skip, take and element-index operands as translated. They stay deferred
/// so prepared queries can bind them per call.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Paging {
    pub skip: Option<ValueBinding>,
    pub take: Option<ValueBinding>,
    pub index: Option<ValueBinding>,
}

impl Paging {
    /// Resolve the row window requested from the store.
    ///
    /// `Single*` always asks for two rows; `ElementAt*` asks for
    /// `min(take, index + 1)` rows and picks the last one.
    pub fn resolve(&self, mode: ExecutionMode, bindings: &Bindings) -> Result<RowWindow, BindingError> {
        let offset = resolve_count(self.skip.as_ref(), bindings)?.unwrap_or(0);
        let take = resolve_count(self.take.as_ref(), bindings)?;

        let limit = match mode {
            ExecutionMode::Single | ExecutionMode::SingleOrDefault => mode.implied_limit(),
            ExecutionMode::ElementAt | ExecutionMode::ElementAtOrDefault => {
                let index = resolve_count(self.index.as_ref(), bindings)?.unwrap_or(0);
                min_limit(take, Some(index.saturating_add(1)))
            }
            _ => min_limit(take, mode.implied_limit()),
        };

        Ok(RowWindow { offset, limit })
    }

    /// Element index of `ElementAt*` modes, relative to the window offset.
    pub fn resolve_index(&self, bindings: &Bindings) -> Result<Option<u32>, BindingError> {
        resolve_count(self.index.as_ref(), bindings)
    }
}

const fn min_limit(left: Option<u32>, right: Option<u32>) -> Option<u32> {
    match (left, right) {
        (Some(left), Some(right)) => Some(if left < right { left } else { right }),
        (Some(limit), None) | (None, Some(limit)) => Some(limit),
        (None, None) => None,
    }
}

// negative counts behave like zero
fn resolve_count(
    binding: Option<&ValueBinding>,
    bindings: &Bindings,
) -> Result<Option<u32>, BindingError> {
    let Some(binding) = binding else {
        return Ok(None);
    };

    match binding.resolve(bindings)? {
        Value::Int(count) => Ok(Some(u32::try_from(count.max(0)).unwrap_or(u32::MAX))),
        other => Err(BindingError::TypeMismatch {
            name: binding.name().to_string(),
            expected: "integer",
            found: other.label(),
        }),
    }
}

///
/// RowWindow
/// Offset and row limit handed to the execution collaborator.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RowWindow {
    pub offset: u32,
    pub limit: Option<u32>,
}
