use core::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Outcome of a single-row query.
///
/// An empty result is a normal outcome of the demonstrations, so it is a
/// variant here rather than an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observation {
    Found(i32),
    NotFound,
}

impl Observation {
    #[must_use]
    pub const fn value(self) -> Option<i32> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub const fn is_found(self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl From<Option<i32>> for Observation {
    fn from(value: Option<i32>) -> Self {
        value.map_or(Self::NotFound, Self::Found)
    }
}

impl Display for Observation {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            Self::Found(value) => write!(f, "{value}"),
            Self::NotFound => write!(f, "not found"),
        }
    }
}
