use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use crate::{GlyphId, WordId, MAX_GLYPH_COUNT, MAX_SLOT_LENGTH};

/// A struct representing a word that can be chosen for a given slot.
#[derive(Debug, Clone)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// Length in chars, which is what has to line up with a slot.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// The full set of candidate words, with each distinct char interned as a glyph id so that
/// comparing letters at an overlap is an integer comparison.
#[derive(Clone, Default)]
pub struct WordList {
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,
    pub words: Vec<Word>,
    glyph_ids_by_char: HashMap<char, GlyphId>,
    word_ids_by_string: HashMap<String, WordId>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs)
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl WordList {
    /// Build a word list from any collection of strings. Duplicates are dropped, but otherwise
    /// the input order is preserved, so the first occurrence of each word determines its id.
    pub fn new<I, S>(words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut word_list = WordList::default();
        for word in words {
            word_list.add_word(word.as_ref());
        }
        word_list
    }

    /// Add a word if it isn't already present, returning its id either way.
    pub fn add_word(&mut self, string: &str) -> WordId {
        if let Some(&word_id) = self.word_ids_by_string.get(string) {
            return word_id;
        }

        let glyphs = string.chars().map(|c| self.intern_glyph(c)).collect();
        let word_id = self.words.len();
        self.words.push(Word { string: string.to_string(), glyphs });
        self.word_ids_by_string.insert(string.to_string(), word_id);
        word_id
    }

    fn intern_glyph(&mut self, c: char) -> GlyphId {
        if let Some(&glyph_id) = self.glyph_ids_by_char.get(&c) {
            return glyph_id;
        }
        let glyph_id = self.glyphs.len();
        self.glyphs.push(c);
        self.glyph_ids_by_char.insert(c, glyph_id);
        glyph_id
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn word_id(&self, string: &str) -> Option<WordId> {
        self.word_ids_by_string.get(string).copied()
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WordId, &Word)> {
        self.words.iter().enumerate()
    }
}
