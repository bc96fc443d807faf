//! The static description of a puzzle: which cells are open, which runs of open cells form
//! variables (slots), and where each pair of variables crosses. Nothing in here changes once the
//! `GridModel` has been built.

use log::debug;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use crate::error::GridError;
use crate::{VariableId, MAX_SLOT_LENGTH};

/// Zero-indexed coords for a cell in the grid, where row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A run of two or more open cells, identified entirely by where it starts, which way it goes, and
/// how long it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub cell: Cell,
    pub direction: Direction,
    pub length: usize,
}

impl Variable {
    /// The coords of the cell at the given index within this variable.
    pub fn cell_at(&self, cell_idx: usize) -> Cell {
        match self.direction {
            Direction::Across => Cell { row: self.cell.row, col: self.cell.col + cell_idx },
            Direction::Down => Cell { row: self.cell.row + cell_idx, col: self.cell.col },
        }
    }

    /// Generate the coords for each cell of this variable.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.length).map(move |cell_idx| self.cell_at(cell_idx))
    }
}

/// The mapping from each variable to its chosen word, as handed to renderers.
pub type Solution = HashMap<Variable, String>;

/// A struct representing the aspects of a grid that are static during solving.
pub struct GridModel {
    height: usize,
    width: usize,
    structure: Vec<Vec<bool>>,
    variables: Vec<Variable>,
    variable_ids: HashMap<Variable, VariableId>,

    /// Dense `variable_count * variable_count` table; the entry for `(x, y)` holds the index into
    /// `x`'s word and the index into `y`'s word that have to agree.
    overlaps: Vec<Option<(usize, usize)>>,

    neighbors: Vec<SmallVec<[VariableId; MAX_SLOT_LENGTH]>>,
}

impl Debug for GridModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridModel")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("variables", &self.variables)
            .finish()
    }
}

/// Find every maximal run of at least two open cells in a single line of the grid, returning the
/// start index and length of each.
fn find_runs<I: IntoIterator<Item = bool>>(line: I) -> Vec<(usize, usize)> {
    let mut result = vec![];
    let mut run_start: Option<usize> = None;
    let mut line_length = 0;

    for (idx, open) in line.into_iter().enumerate() {
        line_length = idx + 1;
        match (open, run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                if idx - start > 1 {
                    result.push((start, idx - start));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        if line_length - start > 1 {
            result.push((start, line_length - start));
        }
    }

    result
}

impl GridModel {
    /// Build a grid from a matrix of open (`true`) and blocked (`false`) cells. All rows have to be
    /// the same width; an empty matrix is a valid grid with no variables.
    pub fn new(structure: Vec<Vec<bool>>) -> Result<GridModel, GridError> {
        let height = structure.len();
        let width = structure.first().map_or(0, |row| row.len());

        for (row, cells) in structure.iter().enumerate() {
            if cells.len() != width {
                return Err(GridError::RaggedRows { row, expected: width, found: cells.len() });
            }
        }

        let mut variables: Vec<Variable> = vec![];

        for (row, cells) in structure.iter().enumerate() {
            for (col, length) in find_runs(cells.iter().copied()) {
                variables.push(Variable {
                    cell: Cell { row, col },
                    direction: Direction::Across,
                    length,
                });
            }
        }

        for col in 0..width {
            for (row, length) in find_runs(structure.iter().map(|cells| cells[col])) {
                variables.push(Variable {
                    cell: Cell { row, col },
                    direction: Direction::Down,
                    length,
                });
            }
        }

        let variable_count = variables.len();
        let variable_ids: HashMap<Variable, VariableId> =
            variables.iter().enumerate().map(|(id, &variable)| (variable, id)).collect();

        // Build a map from cell location to the variables running through it, which we can then
        // use to calculate overlaps.
        let mut entries_by_cell: HashMap<Cell, SmallVec<[(VariableId, usize); 2]>> = HashMap::new();
        for (variable_id, variable) in variables.iter().enumerate() {
            for (cell_idx, cell) in variable.cells().enumerate() {
                entries_by_cell.entry(cell).or_default().push((variable_id, cell_idx));
            }
        }

        let mut overlaps: Vec<Option<(usize, usize)>> = vec![None; variable_count * variable_count];
        let mut neighbors: Vec<SmallVec<[VariableId; MAX_SLOT_LENGTH]>> =
            (0..variable_count).map(|_| SmallVec::new()).collect();

        for entries in entries_by_cell.values() {
            // Each cell belongs to at most one across and one down variable.
            if let [(x, x_idx), (y, y_idx)] = entries[..] {
                debug_assert!(x_idx < variables[x].length && y_idx < variables[y].length);

                overlaps[x * variable_count + y] = Some((x_idx, y_idx));
                overlaps[y * variable_count + x] = Some((y_idx, x_idx));
                neighbors[x].push(y);
                neighbors[y].push(x);
            }
        }

        for variable_neighbors in &mut neighbors {
            variable_neighbors.sort_unstable();
        }

        debug!(
            "built {}x{} grid with {} variables and {} crossings",
            height,
            width,
            variable_count,
            neighbors.iter().map(|n| n.len()).sum::<usize>() / 2,
        );

        Ok(GridModel { height, width, structure, variables, variable_ids, overlaps, neighbors })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_open(&self, cell: Cell) -> bool {
        self.structure
            .get(cell.row)
            .and_then(|cells| cells.get(cell.col))
            .copied()
            .unwrap_or(false)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn variable(&self, variable_id: VariableId) -> &Variable {
        &self.variables[variable_id]
    }

    pub fn variable_id(&self, variable: &Variable) -> Option<VariableId> {
        self.variable_ids.get(variable).copied()
    }

    /// The pair of indices (into `x`'s word, then `y`'s) at which the two variables cross, or `None`
    /// if they don't.
    pub fn overlap(&self, x: VariableId, y: VariableId) -> Option<(usize, usize)> {
        self.overlaps[x * self.variables.len() + y]
    }

    /// Ids of every variable crossing this one, in ascending order.
    pub fn neighbors(&self, variable_id: VariableId) -> &[VariableId] {
        &self.neighbors[variable_id]
    }

    pub fn degree(&self, variable_id: VariableId) -> usize {
        self.neighbors[variable_id].len()
    }

    /// Return the letters placed in each cell by the given solution, or `None` for cells that are
    /// blocked or not covered by any assigned variable.
    pub fn letter_grid(&self, solution: &Solution) -> Vec<Vec<Option<char>>> {
        let mut letters: Vec<Vec<Option<char>>> = vec![vec![None; self.width]; self.height];

        for (variable, word) in solution {
            for (cell, letter) in variable.cells().zip(word.chars()) {
                if let Some(slot) = letters.get_mut(cell.row).and_then(|row| row.get_mut(cell.col)) {
                    *slot = Some(letter);
                }
            }
        }

        letters
    }

    /// Turn the given solution into a rendered string, drawing blocked cells as `█` and leaving
    /// unfilled open cells blank.
    pub fn render(&self, solution: &Solution) -> String {
        let letters = self.letter_grid(solution);

        self.structure
            .iter()
            .zip(&letters)
            .map(|(cells, row_letters)| {
                cells
                    .iter()
                    .zip(row_letters)
                    .map(|(&open, letter)| if open { letter.unwrap_or(' ') } else { '█' })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
