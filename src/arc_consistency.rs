//! This module contains an implementation of the AC-3 algorithm for establishing arc consistency
//! between crossing variables. For our purposes, an arc `(x, y)` is consistent when every word
//! left in `x`'s domain has at least one word in `y`'s domain with the same letter in the shared
//! cell. We keep revising arcs until no more eliminations are possible or some domain runs dry.

use bit_set::BitSet;
use log::{debug, trace};
use std::collections::VecDeque;

use crate::domains::Domains;
use crate::grid::GridModel;
use crate::word_list::WordList;
use crate::VariableId;

/// An ordered pair of variables `(x, y)`; revising it removes words from `x`.
pub type Arc = (VariableId, VariableId);

/// Result from a successful call to `establish_arc_consistency`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arc revisions were performed.
    pub revisions: usize,

    /// How many words were removed across all domains.
    pub eliminations: usize,
}

/// Result from a failed call to `establish_arc_consistency`, naming the variable whose domain was
/// wiped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub emptied_variable_id: VariableId,
}

/// Result from a call to `establish_arc_consistency`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// FIFO queue of arcs that skips arcs that are already waiting to be revised.
#[derive(Debug)]
struct ArcQueue {
    queue: VecDeque<Arc>,
    queued: BitSet,
    variable_count: usize,
}

impl ArcQueue {
    fn with_initial_queue<Items>(variable_count: usize, items: Items) -> ArcQueue
    where
        Items: IntoIterator<Item = Arc>,
    {
        let mut queue = ArcQueue {
            queue: VecDeque::new(),
            queued: BitSet::with_capacity(variable_count * variable_count),
            variable_count,
        };
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(arc.0 * self.variable_count + arc.1);
        Some(arc)
    }

    fn enqueue(&mut self, arc: Arc) {
        if self.queued.insert(arc.0 * self.variable_count + arc.1) {
            self.queue.push_back(arc);
        }
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Every ordered pair of crossing variables in the grid.
pub fn all_arcs(grid: &GridModel) -> Vec<Arc> {
    (0..grid.variable_count())
        .flat_map(|x| grid.neighbors(x).iter().map(move |&y| (x, y)))
        .collect()
}

/// The arcs `(z, x)` for every neighbor `z` of `x`, i.e. the arcs that may need revising after
/// `x`'s domain shrinks.
pub fn arcs_into(grid: &GridModel, variable_id: VariableId) -> Vec<Arc> {
    grid.neighbors(variable_id).iter().map(|&z| (z, variable_id)).collect()
}

/// Remove words from `domains` until every arc is consistent. If `arcs` is `None` we start from
/// every arc in the grid; otherwise we start from exactly the given arcs, which lets callers
/// propagate the effects of a single change without revisiting the whole grid.
///
/// If any domain ends up empty we stop right away and report which one. The words removed before
/// that point stay removed, so callers that want to roll back should work on a clone.
pub fn establish_arc_consistency(
    grid: &GridModel,
    words: &WordList,
    domains: &mut Domains,
    arcs: Option<Vec<Arc>>,
) -> ArcConsistencyResult {
    if let Some(emptied_variable_id) =
        (0..grid.variable_count()).find(|&variable_id| domains.is_empty(variable_id))
    {
        debug!("domain of {:?} is already empty", grid.variable(emptied_variable_id));
        return Err(ArcConsistencyFailure { emptied_variable_id });
    }

    let mut queue = ArcQueue::with_initial_queue(
        grid.variable_count(),
        arcs.unwrap_or_else(|| all_arcs(grid)),
    );
    let mut success = ArcConsistencySuccess::default();

    trace!("starting arc consistency with {} arcs queued", queue.len());

    while let Some((x, y)) = queue.pop_front() {
        let size_before = domains.len(x);
        success.revisions += 1;

        if !domains.revise(grid, words, x, y) {
            continue;
        }

        let size_after = domains.len(x);
        success.eliminations += size_before - size_after;
        trace!("revising ({x}, {y}) removed {} words from {x}", size_before - size_after);

        if size_after == 0 {
            debug!(
                "arc consistency emptied the domain of {:?} after {} revisions",
                grid.variable(x),
                success.revisions
            );
            return Err(ArcConsistencyFailure { emptied_variable_id: x });
        }

        // Shrinking `x` may have removed the only support some neighbor had.
        for &z in grid.neighbors(x) {
            if z != y {
                queue.enqueue((z, x));
            }
        }
    }

    debug!(
        "arc consistency finished: {} revisions, {} eliminations",
        success.revisions, success.eliminations
    );

    Ok(success)
}
