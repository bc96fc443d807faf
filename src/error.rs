use std::error::Error;
use std::fmt::{Display, Formatter};

/// Problems with the shape of the input that make it impossible to build a grid at all. Failing to
/// find a fill is not one of these; see `FillFailure` for that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// A row's width doesn't match the width of the first row.
    RaggedRows { row: usize, expected: usize, found: usize },

    /// A structure file contained a character that is neither an open nor a blocked cell.
    InvalidCell { row: usize, col: usize, found: char },
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::RaggedRows { row, expected, found } => write!(
                f,
                "Rows in grid must all be the same length (row {row} has {found} cells, expected {expected})"
            ),
            GridError::InvalidCell { row, col, found } => {
                write!(f, "Unexpected character '{found}' at row {row}, column {col}")
            }
        }
    }
}

impl Error for GridError {}
