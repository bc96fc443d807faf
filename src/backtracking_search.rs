//! Depth-first search for a complete assignment. Variables are chosen by minimum remaining values
//! with a degree tiebreak, and each variable's candidates are tried in least-constraining-value
//! order. Each branch extends its own copy of the assignment, so backtracking never has to undo
//! anything.
//!
//! When `maintain_arc_consistency` is enabled, every extension also narrows a per-depth copy of the
//! domains to the chosen word and reruns AC-3 from the arcs pointing at it, so dead ends are found
//! before we recurse into them.

use instant::{Duration, Instant};
use log::{debug, trace};
use smallvec::{smallvec, SmallVec};
use std::cmp::Reverse;

use crate::arc_consistency::{arcs_into, establish_arc_consistency};
use crate::domains::Domains;
use crate::grid::{GridModel, Solution};
use crate::word_list::WordList;
use crate::{VariableId, WordId, MAX_GLYPH_COUNT};

/// Settings for a call to `find_fill`.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Rerun arc consistency after each choice, pruning branches that would empty a domain.
    pub maintain_arc_consistency: bool,

    /// Give up with `FillFailure::TimedOut` once this much time has passed.
    pub time_limit: Option<Duration>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions { maintain_arc_consistency: true, time_limit: None }
    }
}

/// A struct tracking statistics about the search.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub duration: Duration,
}

/// A partial mapping from variables to chosen words. Search never mutates an assignment in place;
/// each extension produces a new copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    word_ids: Vec<Option<WordId>>,
    assigned_count: usize,
}

impl Assignment {
    /// An empty assignment for a grid with the given number of variables.
    pub fn new(variable_count: usize) -> Assignment {
        Assignment { word_ids: vec![None; variable_count], assigned_count: 0 }
    }

    pub fn get(&self, variable_id: VariableId) -> Option<WordId> {
        self.word_ids[variable_id]
    }

    pub fn is_assigned(&self, variable_id: VariableId) -> bool {
        self.word_ids[variable_id].is_some()
    }

    /// Return a copy of this assignment with one more variable filled in.
    pub fn with(&self, variable_id: VariableId, word_id: WordId) -> Assignment {
        let mut result = self.clone();
        if result.word_ids[variable_id].replace(word_id).is_none() {
            result.assigned_count += 1;
        }
        result
    }

    pub fn len(&self) -> usize {
        self.assigned_count
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.word_ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, WordId)> + '_ {
        self.word_ids
            .iter()
            .enumerate()
            .filter_map(|(variable_id, word_id)| word_id.map(|word_id| (variable_id, word_id)))
    }

    /// Is this word already assigned to some variable other than `variable_id`?
    pub fn uses_word_elsewhere(&self, variable_id: VariableId, word_id: WordId) -> bool {
        self.iter()
            .any(|(other_id, other_word_id)| other_id != variable_id && other_word_id == word_id)
    }

    /// Resolve ids into the variable-to-string mapping that renderers consume.
    pub fn to_solution(&self, grid: &GridModel, words: &WordList) -> Solution {
        self.iter()
            .map(|(variable_id, word_id)| {
                (*grid.variable(variable_id), words.word(word_id).string.clone())
            })
            .collect()
    }
}

/// A struct representing the results of a successful search.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
    pub solution: Solution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillFailure {
    /// No assignment satisfies every constraint. This is an expected outcome, not an error.
    Unsatisfiable,

    /// The configured time limit ran out before the search finished.
    TimedOut,
}

/// Could `word_id` be assigned to `variable_id` without breaking any constraint with the variables
/// already in `assignment`? Words have to be unique across the grid, have to fit the variable, and
/// have to agree with every assigned crossing.
pub fn is_consistent_extension(
    grid: &GridModel,
    words: &WordList,
    assignment: &Assignment,
    variable_id: VariableId,
    word_id: WordId,
) -> bool {
    let word = words.word(word_id);

    if assignment.uses_word_elsewhere(variable_id, word_id) {
        return false;
    }

    if word.len() != grid.variable(variable_id).length {
        return false;
    }

    grid.neighbors(variable_id).iter().all(|&neighbor_id| {
        match (assignment.get(neighbor_id), grid.overlap(variable_id, neighbor_id)) {
            (Some(neighbor_word_id), Some((idx, neighbor_idx))) => {
                words.word(neighbor_word_id).glyphs.get(neighbor_idx) == word.glyphs.get(idx)
            }
            _ => true,
        }
    })
}

/// Check a whole assignment from scratch: every word is distinct, has the right length, and
/// agrees with its assigned crossings.
pub fn is_consistent(grid: &GridModel, words: &WordList, assignment: &Assignment) -> bool {
    assignment.iter().all(|(variable_id, word_id)| {
        is_consistent_extension(grid, words, assignment, variable_id, word_id)
    })
}

/// Choose the unassigned variable with the fewest remaining values, breaking ties by the number of
/// crossings and then by lowest id. Returns `None` if everything is assigned.
pub fn select_unassigned_variable(
    grid: &GridModel,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<VariableId> {
    (0..grid.variable_count())
        .filter(|&variable_id| !assignment.is_assigned(variable_id))
        .min_by_key(|&variable_id| (domains.len(variable_id), Reverse(grid.degree(variable_id))))
}

/// Return the words in `variable_id`'s domain, ordered by how many values they would rule out of
/// the domains of unassigned crossing variables, fewest first. Ties keep word list order.
pub fn order_domain_values(
    grid: &GridModel,
    words: &WordList,
    domains: &Domains,
    assignment: &Assignment,
    variable_id: VariableId,
) -> Vec<WordId> {
    // For each unassigned neighbor, how many of its remaining words put each glyph in the shared
    // cell? A candidate rules out everything in the neighbor's domain except the words sharing its
    // glyph there.
    let crossings: Vec<(usize, usize, SmallVec<[usize; MAX_GLYPH_COUNT]>)> = grid
        .neighbors(variable_id)
        .iter()
        .filter(|&&neighbor_id| !assignment.is_assigned(neighbor_id))
        .filter_map(|&neighbor_id| {
            let (idx, neighbor_idx) = grid.overlap(variable_id, neighbor_id)?;
            let mut glyph_counts: SmallVec<[usize; MAX_GLYPH_COUNT]> =
                smallvec![0; words.glyph_count()];
            for neighbor_word_id in domains.domain(neighbor_id) {
                if let Some(&glyph) = words.word(neighbor_word_id).glyphs.get(neighbor_idx) {
                    glyph_counts[glyph] += 1;
                }
            }
            Some((idx, domains.len(neighbor_id), glyph_counts))
        })
        .collect();

    let mut options: Vec<WordId> = domains.domain(variable_id).collect();
    options.sort_by_cached_key(|&word_id| {
        let word = words.word(word_id);
        crossings
            .iter()
            .map(|(idx, neighbor_size, glyph_counts)| {
                let compatible = word.glyphs.get(*idx).map_or(0, |&glyph| glyph_counts[glyph]);
                neighbor_size - compatible
            })
            .sum::<usize>()
    });
    options
}

/// The live state of a single search.
struct Searcher<'a> {
    grid: &'a GridModel,
    words: &'a WordList,
    options: &'a SearchOptions,
    start: Instant,
    statistics: Statistics,

    /// Domain snapshots indexed by search depth. Without arc consistency maintenance the domains
    /// never change, so only the first entry is used.
    domain_stack: Vec<Domains>,
}

impl<'a> Searcher<'a> {
    fn new(
        grid: &'a GridModel,
        words: &'a WordList,
        domains: &Domains,
        options: &'a SearchOptions,
    ) -> Searcher<'a> {
        Searcher {
            grid,
            words,
            options,
            start: Instant::now(),
            statistics: Statistics { states: 0, backtracks: 0, duration: Duration::from_millis(0) },
            domain_stack: vec![domains.clone()],
        }
    }

    /// Make `domain_stack[depth + 1]` a copy of `domain_stack[depth]`, reusing its allocation if
    /// we've been this deep before.
    fn push_snapshot(&mut self, depth: usize) {
        if self.domain_stack.len() <= depth + 1 {
            let snapshot = self.domain_stack[depth].clone();
            self.domain_stack.push(snapshot);
        } else {
            let (parents, children) = self.domain_stack.split_at_mut(depth + 1);
            children[0].clone_from(&parents[depth]);
        }
    }

    /// Narrow the snapshot below `depth` to the chosen word and propagate the change. Returns
    /// `false` if some domain was wiped out.
    fn propagate_choice(&mut self, depth: usize, variable_id: VariableId, word_id: WordId) -> bool {
        self.push_snapshot(depth);
        let (parents, children) = self.domain_stack.split_at_mut(depth + 1);
        let child_domains = &mut children[0];
        child_domains.restrict_to(variable_id, word_id);

        let consistent = establish_arc_consistency(
            self.grid,
            self.words,
            child_domains,
            Some(arcs_into(self.grid, variable_id)),
        )
        .is_ok();

        debug_assert!(child_domains.is_subset_of(&parents[depth]));

        consistent
    }

    fn backtrack(
        &mut self,
        assignment: &Assignment,
        depth: usize,
    ) -> Result<Option<Assignment>, FillFailure> {
        if assignment.is_complete() {
            return Ok(Some(assignment.clone()));
        }

        if let Some(time_limit) = self.options.time_limit {
            if self.start.elapsed() >= time_limit {
                debug!("giving up after {:?} and {} states", time_limit, self.statistics.states);
                return Err(FillFailure::TimedOut);
            }
        }

        self.statistics.states += 1;

        let Some(variable_id) =
            select_unassigned_variable(self.grid, &self.domain_stack[depth], assignment)
        else {
            return Ok(None);
        };

        let candidates = order_domain_values(
            self.grid,
            self.words,
            &self.domain_stack[depth],
            assignment,
            variable_id,
        );

        trace!(
            "depth {}: trying {:?} with {} candidates",
            depth,
            self.grid.variable(variable_id),
            candidates.len()
        );

        for word_id in candidates {
            if !is_consistent_extension(self.grid, self.words, assignment, variable_id, word_id) {
                continue;
            }

            let extended = assignment.with(variable_id, word_id);

            let child_depth = if self.options.maintain_arc_consistency {
                if !self.propagate_choice(depth, variable_id, word_id) {
                    continue;
                }
                depth + 1
            } else {
                depth
            };

            if let Some(result) = self.backtrack(&extended, child_depth)? {
                return Ok(Some(result));
            }
        }

        self.statistics.backtracks += 1;
        Ok(None)
    }
}

/// Search for a complete, consistent assignment starting from the given domains, which should
/// already be node consistent (and ideally arc consistent). The domains passed in are never
/// modified.
pub fn find_fill(
    grid: &GridModel,
    words: &WordList,
    domains: &Domains,
    options: &SearchOptions,
) -> Result<FillSuccess, FillFailure> {
    let mut searcher = Searcher::new(grid, words, domains, options);

    let result = searcher.backtrack(&Assignment::new(grid.variable_count()), 0);
    searcher.statistics.duration = searcher.start.elapsed();

    debug!("search finished: {:?}", searcher.statistics);

    match result? {
        Some(assignment) => Ok(FillSuccess {
            statistics: searcher.statistics,
            solution: assignment.to_solution(grid, words),
            assignment,
        }),
        None => Err(FillFailure::Unsatisfiable),
    }
}

#[cfg(test)]
mod tests {
    use instant::Duration;

    use crate::backtracking_search::{
        find_fill, is_consistent, is_consistent_extension, order_domain_values,
        select_unassigned_variable, Assignment, FillFailure, SearchOptions, Searcher,
    };
    use crate::domains::Domains;
    use crate::grid::GridModel;
    use crate::parse::parse_structure;
    use crate::word_list::WordList;

    fn generate_domains(template: &str, word_list: &[&str]) -> (GridModel, WordList, Domains) {
        let grid = GridModel::new(parse_structure(template).unwrap()).unwrap();
        let words = WordList::new(word_list);
        let mut domains = Domains::new(&grid, &words);
        domains.enforce_node_consistency(&grid, &words);
        (grid, words, domains)
    }

    fn without_mac() -> SearchOptions {
        SearchOptions { maintain_arc_consistency: false, ..SearchOptions::default() }
    }

    #[test]
    fn test_assignment_copies_on_extension() {
        let empty = Assignment::new(3);
        let one = empty.with(1, 7);
        let two = one.with(0, 4);

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(one.get(0), None);
        assert_eq!(two.len(), 2);
        assert!(!two.is_complete());
        assert_eq!(two.iter().collect::<Vec<_>>(), vec![(0, 4), (1, 7)]);
        assert!(two.uses_word_elsewhere(0, 7));
        assert!(!two.uses_word_elsewhere(1, 7));
        assert!(!two.uses_word_elsewhere(0, 5));
        assert!(two.with(2, 5).is_complete());
    }

    /// ____
    /// _#_#
    /// _#_#
    #[test]
    fn test_select_prefers_smallest_domain() {
        let (grid, words, mut domains) =
            generate_domains("____\n_#_#\n_#_#", &["able", "bake", "cat", "ace", "awe"]);
        assert_eq!(domains.len(0), 2);
        assert_eq!(domains.len(2), 3);

        let assignment = Assignment::new(3);
        assert_eq!(select_unassigned_variable(&grid, &domains, &assignment), Some(0));

        domains.restrict_to(2, words.word_id("ace").unwrap());
        assert_eq!(select_unassigned_variable(&grid, &domains, &assignment), Some(2));
    }

    #[test]
    fn test_select_breaks_ties_by_degree() {
        // Across crosses both downs; each down only crosses across.
        let (grid, _, domains) =
            generate_domains("____\n_#_#\n_#_#", &["able", "bake", "cat", "ace"]);
        assert_eq!(grid.degree(0), 2);
        assert_eq!(grid.degree(1), 1);
        assert_eq!(domains.len(0), 2);
        assert_eq!(domains.len(1), 2);

        let assignment = Assignment::new(3);
        assert_eq!(select_unassigned_variable(&grid, &domains, &assignment), Some(0));

        let assignment = assignment.with(0, 0);
        assert_eq!(select_unassigned_variable(&grid, &domains, &assignment), Some(1));

        let assignment = assignment.with(1, 2).with(2, 3);
        assert_eq!(select_unassigned_variable(&grid, &domains, &assignment), None);
    }

    #[test]
    fn test_order_domain_values_least_constraining_first() {
        // Across's second letter is down's first letter.
        let (grid, words, domains) =
            generate_domains("___\n#_#\n#_#", &["cat", "art", "ant", "dog"]);

        let order = order_domain_values(&grid, &words, &domains, &Assignment::new(2), 0);

        let order: Vec<&str> = order.iter().map(|&id| words.word(id).string.as_str()).collect();
        assert_eq!(order, vec!["cat", "art", "ant", "dog"]);
    }

    #[test]
    fn test_order_domain_values_ignores_assigned_neighbors() {
        let (grid, words, domains) =
            generate_domains("___\n#_#\n#_#", &["dog", "art", "ant", "cat"]);

        let assignment = Assignment::new(2).with(1, words.word_id("art").unwrap());
        let order = order_domain_values(&grid, &words, &domains, &assignment, 0);

        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_consistency_checks() {
        let (grid, words, _) = generate_domains("___\n#_#\n#_#", &["cat", "art", "tar", "at"]);
        let cat = words.word_id("cat").unwrap();
        let art = words.word_id("art").unwrap();
        let tar = words.word_id("tar").unwrap();
        let at = words.word_id("at").unwrap();

        let assignment = Assignment::new(2).with(0, cat);
        assert!(is_consistent_extension(&grid, &words, &assignment, 1, art));
        assert!(!is_consistent_extension(&grid, &words, &assignment, 1, tar), "overlap mismatch");
        assert!(!is_consistent_extension(&grid, &words, &assignment, 1, cat), "duplicate word");
        assert!(!is_consistent_extension(&grid, &words, &Assignment::new(2), 1, at), "wrong length");

        assert!(is_consistent(&grid, &words, &assignment.with(1, art)));
        assert!(!is_consistent(&grid, &words, &assignment.with(1, tar)));
    }

    #[test]
    fn test_is_consistent_rejects_repeated_words_without_crossings() {
        let (grid, words, _) = generate_domains("___\n###\n___", &["cat", "dog"]);
        let cat = words.word_id("cat").unwrap();
        let dog = words.word_id("dog").unwrap();

        assert!(is_consistent(&grid, &words, &Assignment::new(2).with(0, cat).with(1, dog)));
        assert!(!is_consistent(&grid, &words, &Assignment::new(2).with(0, cat).with(1, cat)));
        assert!(!is_consistent_extension(&grid, &words, &Assignment::new(2).with(0, cat), 1, cat));
        assert!(is_consistent_extension(&grid, &words, &Assignment::new(2).with(0, cat), 0, cat));
    }

    #[test]
    fn test_find_fill_crossing_pair() {
        let (grid, words, domains) = generate_domains("___\n#_#\n#_#", &["cat", "art"]);

        for options in [SearchOptions::default(), without_mac()] {
            let result = find_fill(&grid, &words, &domains, &options).expect("Failed to find a fill");

            assert_eq!(result.solution[grid.variable(0)], "cat");
            assert_eq!(result.solution[grid.variable(1)], "art");
            assert!(result.assignment.is_complete());
            assert!(result.statistics.states >= 2);
        }
    }

    /// ___
    /// _#_
    /// ___
    #[test]
    fn test_find_fill_backtracks_past_dead_ends() {
        let (grid, words, domains) = generate_domains(
            "___\n_#_\n___",
            &["bad", "bit", "dot", "tot", "bet", "tan", "nap", "dip"],
        );

        for options in [SearchOptions::default(), without_mac()] {
            let result = find_fill(&grid, &words, &domains, &options).expect("Failed to find a fill");

            assert!(result.assignment.is_complete());
            assert!(is_consistent(&grid, &words, &result.assignment));
        }
    }

    #[test]
    fn test_snapshots_shrink_with_depth() {
        let (grid, words, domains) = generate_domains(
            "___\n_#_\n___",
            &["bad", "bit", "dot", "tot", "bet", "tan", "nap", "dip"],
        );
        let options = SearchOptions::default();
        let mut searcher = Searcher::new(&grid, &words, &domains, &options);

        let result = searcher
            .backtrack(&Assignment::new(grid.variable_count()), 0)
            .expect("Search shouldn't time out")
            .expect("Failed to find a fill");

        // The snapshots left behind are the ones along the successful branch.
        assert_eq!(searcher.domain_stack.len(), grid.variable_count() + 1);
        for depth in 0..grid.variable_count() {
            let (parent, child) = (&searcher.domain_stack[depth], &searcher.domain_stack[depth + 1]);
            for variable_id in 0..grid.variable_count() {
                assert!(child.domain(variable_id).all(|word_id| parent.contains(variable_id, word_id)));
            }
            assert!(child.is_subset_of(parent));
        }

        let deepest = &searcher.domain_stack[grid.variable_count()];
        for (variable_id, word_id) in result.iter() {
            assert_eq!(deepest.domain(variable_id).collect::<Vec<_>>(), vec![word_id]);
        }
    }

    #[test]
    fn test_find_fill_reports_unsatisfiable() {
        // Only one word fits, but both slots need one.
        let (grid, words, domains) = generate_domains("___\n_##\n_##", &["cat", "ox"]);

        for options in [SearchOptions::default(), without_mac()] {
            let result = find_fill(&grid, &words, &domains, &options);

            assert!(matches!(result, Err(FillFailure::Unsatisfiable)));
        }
    }

    #[test]
    fn test_find_fill_for_grid_without_variables() {
        let (grid, words, domains) = generate_domains("_#\n#_", &["cat"]);

        let result = find_fill(&grid, &words, &domains, &SearchOptions::default())
            .expect("Failed to find a fill");

        assert!(result.solution.is_empty());
    }

    #[test]
    fn test_find_fill_times_out() {
        let (grid, words, domains) = generate_domains("___\n#_#\n#_#", &["cat", "art"]);
        let options =
            SearchOptions { time_limit: Some(Duration::from_millis(0)), ..SearchOptions::default() };

        let result = find_fill(&grid, &words, &domains, &options);

        assert!(matches!(result, Err(FillFailure::TimedOut)));
    }

    #[test]
    fn test_find_fill_leaves_domains_untouched() {
        let (grid, words, domains) = generate_domains("___\n___\n___", &["bat", "ace", "ten", "cat"]);
        let size_before = domains.total_size();

        let result = find_fill(&grid, &words, &domains, &SearchOptions::default());

        assert!(result.is_err(), "six slots can't be filled with four distinct words");
        assert_eq!(domains.total_size(), size_before);
    }
}
