use crate::translate::TranslateError;

///
/// QueryShape
///
/// Set of operator categories applied so far, in chain order. Each new
/// operator is admitted against the categories that already ran.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueryShape(u8);

impl QueryShape {
    pub const NONE: Self = Self(0);
    pub const PREDICATE: Self = Self(1);
    pub const SKIP: Self = Self(1 << 1);
    pub const TAKE: Self = Self(1 << 2);
    pub const PROJECTION: Self = Self(1 << 3);
    pub const AGGREGATE: Self = Self(1 << 4);

    const ALL: [(Self, &'static str); 5] = [
        (Self::PREDICATE, "Predicate"),
        (Self::SKIP, "Skip"),
        (Self::TAKE, "Take"),
        (Self::PROJECTION, "Projection"),
        (Self::AGGREGATE, "Aggregate"),
    ];

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Categories that must not have run before `step`.
    const fn blocked_by(step: Self) -> Self {
        match step {
            Self::PREDICATE | Self::SKIP => Self::SKIP
                .union(Self::TAKE)
                .union(Self::PROJECTION)
                .union(Self::AGGREGATE),
            Self::TAKE => Self::TAKE.union(Self::PROJECTION).union(Self::AGGREGATE),
            Self::PROJECTION | Self::AGGREGATE => step.union(Self::AGGREGATE),
            _ => Self::NONE,
        }
    }

    /// Record `step` for operator `op`, rejecting out-of-order chains.
    pub fn admit(&mut self, step: Self, op: &str) -> Result<(), TranslateError> {
        let conflict = Self(self.0 & Self::blocked_by(step).0);

        if let Some(&(_, after)) = Self::ALL
            .iter()
            .find(|(category, _)| conflict.intersects(*category))
        {
            return Err(TranslateError::InvalidSequence {
                op: op.to_string(),
                after,
            });
        }
        *self = self.union(step);

        Ok(())
    }
}
