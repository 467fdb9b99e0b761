//! Structural dropout methods as they name result directories.
//!
//! Only the naming is implemented here, the forward pass of each method belongs to the model code.

use anyhow::anyhow;

use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DropoutMethod {
    /// baseline, no dropout at all
    NoDrop,
    /// feature dropout
    Dropout,
    DropMessage,
    DropEdge,
    DropNode,
    DropAgg,
    DropGNN,
    DropSens,
    SkipNode,
}

impl DropoutMethod {
    pub const ALL: [DropoutMethod; 9] = [
        DropoutMethod::NoDrop,
        DropoutMethod::Dropout,
        DropoutMethod::DropMessage,
        DropoutMethod::DropEdge,
        DropoutMethod::DropNode,
        DropoutMethod::DropAgg,
        DropoutMethod::DropGNN,
        DropoutMethod::DropSens,
        DropoutMethod::SkipNode,
    ];

    /// methods compared against NoDrop in the effect size tables, in row order
    pub const TABLE_ROWS: [DropoutMethod; 6] = [
        DropoutMethod::DropEdge,
        DropoutMethod::DropNode,
        DropoutMethod::DropAgg,
        DropoutMethod::DropGNN,
        DropoutMethod::Dropout,
        DropoutMethod::DropMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DropoutMethod::NoDrop => "NoDrop",
            DropoutMethod::Dropout => "Dropout",
            DropoutMethod::DropMessage => "DropMessage",
            DropoutMethod::DropEdge => "DropEdge",
            DropoutMethod::DropNode => "DropNode",
            DropoutMethod::DropAgg => "DropAgg",
            DropoutMethod::DropGNN => "DropGNN",
            DropoutMethod::DropSens => "DropSens",
            DropoutMethod::SkipNode => "SkipNode",
        }
    }

    /// the baseline has a single configuration at drop probability 0
    pub fn is_baseline(&self) -> bool {
        *self == DropoutMethod::NoDrop
    }
} // end of impl DropoutMethod

impl fmt::Display for DropoutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DropoutMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DropoutMethod::ALL
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| anyhow!("unknown dropout method {}", s))
    }
}

//========================================================================================

// end of mod tests
