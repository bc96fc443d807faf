pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod error;
pub mod grid;
pub mod parse;
pub mod word_list;

use log::debug;

use crate::arc_consistency::establish_arc_consistency;
use crate::backtracking_search::{find_fill, FillFailure, FillSuccess, SearchOptions};
use crate::domains::Domains;
use crate::grid::GridModel;
use crate::word_list::WordList;

/// The expected maximum number of distinct characters/rebuses/whatever appearing in a word list.
pub const MAX_GLYPH_COUNT: usize = 256;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// An identifier for a given letter or whatever, based on its index in the `WordList`'s `glyphs`
/// field.
pub type GlyphId = usize;

/// An identifier for a given variable, based on its index in the `GridModel`'s `variables` field.
pub type VariableId = usize;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// Enforce node and arc consistency, and then search for a complete assignment. An unsatisfiable
/// puzzle is reported as `FillFailure::Unsatisfiable`; if the initial propagation already empties
/// a domain we don't bother searching at all.
pub fn solve(
    grid: &GridModel,
    words: &WordList,
    options: &SearchOptions,
) -> Result<FillSuccess, FillFailure> {
    let mut domains = Domains::new(grid, words);
    domains.enforce_node_consistency(grid, words);

    if let Err(failure) = establish_arc_consistency(grid, words, &mut domains, None) {
        debug!(
            "initial arc consistency emptied the domain of {:?}",
            grid.variable(failure.emptied_variable_id)
        );
        return Err(FillFailure::Unsatisfiable);
    }

    find_fill(grid, words, &domains, options)
}
