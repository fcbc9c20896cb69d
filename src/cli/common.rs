//! Shared clap helper types.

use bingocard::SelectionPolicy;
use clap::ValueEnum;

/// How a column's images are reordered between cards.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum PolicyArg {
    /// Plain uniform shuffle.
    Shuffle,
    /// Shuffle, then put the least used images first.
    #[value(name = "least-used")]
    LeastUsed,
}

impl From<PolicyArg> for SelectionPolicy {
    fn from(value: PolicyArg) -> SelectionPolicy {
        match value {
            PolicyArg::Shuffle => SelectionPolicy::Shuffle,
            PolicyArg::LeastUsed => SelectionPolicy::LeastUsed,
        }
    }
}

/// Ordered column keys given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnKeys(pub Vec<char>);
