use bit_set::BitSet;
use smallvec::SmallVec;

use crate::grid::GridModel;
use crate::word_list::WordList;
use crate::{VariableId, WordId, MAX_GLYPH_COUNT};

/// The current candidate words for each variable, stored as a set of word ids per variable. Domains
/// only ever shrink; the search engine works on its own clones rather than undoing changes.
#[derive(Debug, Clone)]
pub struct Domains {
    domains: Vec<BitSet>,
}

impl Domains {
    /// Seed every variable's domain with the whole word list.
    pub fn new(grid: &GridModel, words: &WordList) -> Domains {
        let full_domain: BitSet = (0..words.len()).collect();

        Domains { domains: (0..grid.variable_count()).map(|_| full_domain.clone()).collect() }
    }

    /// Remove any words whose length doesn't match their variable's length.
    pub fn enforce_node_consistency(&mut self, grid: &GridModel, words: &WordList) {
        for (variable_id, domain) in self.domains.iter_mut().enumerate() {
            let length = grid.variable(variable_id).length;
            let mismatched: Vec<WordId> =
                domain.iter().filter(|&word_id| words.word(word_id).len() != length).collect();

            for word_id in mismatched {
                domain.remove(word_id);
            }
        }
    }

    /// Make `x` arc consistent with `y` by removing every word from `x`'s domain that has no
    /// compatible word in `y`'s current domain. Variables that don't cross are always compatible.
    /// Return whether anything was removed.
    pub fn revise(&mut self, grid: &GridModel, words: &WordList, x: VariableId, y: VariableId) -> bool {
        let Some((x_idx, y_idx)) = grid.overlap(x, y) else {
            return false;
        };

        // Which glyphs can `y` still put in the shared cell?
        let mut available_glyphs: SmallVec<[bool; MAX_GLYPH_COUNT]> =
            SmallVec::from_elem(false, words.glyph_count());
        for word_id in &self.domains[y] {
            if let Some(&glyph) = words.word(word_id).glyphs.get(y_idx) {
                available_glyphs[glyph] = true;
            }
        }

        let unsupported: Vec<WordId> = self.domains[x]
            .iter()
            .filter(|&word_id| {
                !words.word(word_id).glyphs.get(x_idx).map_or(false, |&glyph| available_glyphs[glyph])
            })
            .collect();

        for &word_id in &unsupported {
            self.domains[x].remove(word_id);
        }

        !unsupported.is_empty()
    }

    /// Narrow a domain down to a single word.
    pub fn restrict_to(&mut self, variable_id: VariableId, word_id: WordId) {
        let domain = &mut self.domains[variable_id];
        domain.clear();
        domain.insert(word_id);
    }

    pub fn domain(&self, variable_id: VariableId) -> impl Iterator<Item = WordId> + '_ {
        self.domains[variable_id].iter()
    }

    /// The words remaining for a variable, as strings.
    pub fn words<'a>(
        &'a self,
        variable_id: VariableId,
        words: &'a WordList,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.domain(variable_id).map(move |word_id| words.word(word_id).string.as_str())
    }

    pub fn contains(&self, variable_id: VariableId, word_id: WordId) -> bool {
        self.domains[variable_id].contains(word_id)
    }

    pub fn len(&self, variable_id: VariableId) -> usize {
        self.domains[variable_id].len()
    }

    pub fn is_empty(&self, variable_id: VariableId) -> bool {
        self.domains[variable_id].is_empty()
    }

    /// Does every domain here hold only words that `other`'s matching domain also holds?
    pub fn is_subset_of(&self, other: &Domains) -> bool {
        self.domains.len() == other.domains.len()
            && self.domains.iter().zip(&other.domains).all(|(domain, other)| domain.is_subset(other))
    }

    /// The sum of all domain sizes.
    pub fn total_size(&self) -> usize {
        self.domains.iter().map(BitSet::len).sum()
    }

    pub fn variable_count(&self) -> usize {
        self.domains.len()
    }
}
