//! Text formats for puzzle structures and word lists. These only turn already-loaded strings into
//! the data the solver works with; reading files is up to the caller.

use crate::error::GridError;
use crate::word_list::WordList;

/// Parse a structure template into a matrix of open (`true`) and blocked (`false`) cells. `_` and
/// `.` are open, `#` and `█` are blocked. Leading and trailing whitespace on each line is ignored,
/// as are blank lines, so templates can be indented inside string literals.
pub fn parse_structure(template: &str) -> Result<Vec<Vec<bool>>, GridError> {
    template
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(row, line)| {
            line.chars()
                .enumerate()
                .map(|(col, c)| match c {
                    '_' | '.' => Ok(true),
                    '#' | '█' => Ok(false),
                    found => Err(GridError::InvalidCell { row, col, found }),
                })
                .collect::<Result<Vec<bool>, GridError>>()
        })
        .collect()
}

/// Parse a word file with one word per line. Words are uppercased, surrounding whitespace is
/// dropped, and blank lines are skipped.
pub fn parse_word_list(contents: &str) -> WordList {
    WordList::new(
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_uppercase),
    )
}
