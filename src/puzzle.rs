//! This module describes the static shape of a crossword: which slots exist, where they sit, and
//! which pairs of them cross. None of this changes while a grid is being filled.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::iter;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Assignment, GridCoord, LetterGrid, Overlap, SlotPair};
use crate::word_list::WordList;

/// The character marking an open cell in a structure string. Anything else is a block.
pub const OPEN_CELL: char = '_';

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Across,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "across"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// A slot in the grid. Slots are compared and hashed by value, so two `Variable`s built from the
/// same coordinates are interchangeable as map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Variable {
    #[must_use]
    pub fn new(row: usize, col: usize, direction: Direction, length: usize) -> Variable {
        Variable {
            row,
            col,
            direction,
            length,
        }
    }

    /// The coords of the cell at the given index within this slot.
    #[must_use]
    pub fn cell(&self, cell_idx: usize) -> GridCoord {
        match self.direction {
            Direction::Across => (self.row, self.col + cell_idx),
            Direction::Down => (self.row + cell_idx, self.col),
        }
    }

    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length).map(|cell_idx| self.cell(cell_idx)).collect()
    }

    /// Parse a string like "1,2,down,5" into a `Variable`.
    pub fn from_key(key: &str) -> Result<Variable, String> {
        let key_parts: Vec<&str> = key.split(',').collect();
        if key_parts.len() != 4 {
            return Err(format!("invalid slot key: {key}"));
        }

        let row: Result<usize, _> = key_parts[0].parse();
        let col: Result<usize, _> = key_parts[1].parse();
        let direction: Option<Direction> = match key_parts[2] {
            "across" => Some(Direction::Across),
            "down" => Some(Direction::Down),
            _ => None,
        };
        let length: Result<usize, _> = key_parts[3].parse();

        if let (Ok(row), Ok(col), Some(direction), Ok(length)) = (row, col, direction, length) {
            Ok(Variable::new(row, col, direction, length))
        } else {
            Err(format!("invalid slot key: {key:?}"))
        }
    }

    /// Represent this slot as a string like "1,2,down,5".
    #[must_use]
    pub fn to_key(&self) -> String {
        format!(
            "{},{},{},{}",
            self.row, self.col, self.direction, self.length
        )
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

/// Serialize a `Variable` into a string key.
#[cfg(feature = "serde")]
impl Serialize for Variable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_key())
    }
}

/// Deserialize a `Variable` from a string key.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_string = String::deserialize(deserializer)?;
        Variable::from_key(&raw_string).map_err(serde::de::Error::custom)
    }
}

/// Problems with the shape of a puzzle, detected when it's constructed (or, for `letter_grid`,
/// when an assignment doesn't match the puzzle it's applied to).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    EmptyStructure,
    EmptySlot(Variable),
    SlotOutOfBounds(Variable),
    DuplicateSlot(Variable),
    ParallelOverlap(Variable, Variable),
    CrowdedCell(GridCoord),
    UnknownVariable(Variable),
    WordLengthMismatch(Variable, String),
}

impl fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleError::EmptyStructure => write!(f, "Grid must have at least one row"),
            PuzzleError::EmptySlot(variable) => write!(f, "Slot {variable} has no cells"),
            PuzzleError::SlotOutOfBounds(variable) => {
                write!(f, "Slot {variable} extends past the edge of the grid")
            }
            PuzzleError::DuplicateSlot(variable) => {
                write!(f, "Slot {variable} appears more than once")
            }
            PuzzleError::ParallelOverlap(x, y) => {
                write!(f, "Slots {x} and {y} run in the same direction but share a cell")
            }
            PuzzleError::CrowdedCell((row, col)) => {
                write!(f, "More than two slots cross at cell ({row}, {col})")
            }
            PuzzleError::UnknownVariable(variable) => {
                write!(f, "Slot {variable} isn't part of this puzzle")
            }
            PuzzleError::WordLengthMismatch(variable, word) => {
                write!(f, "Word “{word}” doesn't fit slot {variable}")
            }
        }
    }
}

impl std::error::Error for PuzzleError {}

/// A crossword to be filled: the grid geometry, the slots derived from it, the overlaps between
/// those slots, and the vocabulary to fill them from.
pub struct Puzzle {
    /// The width and height of the grid.
    pub width: usize,
    pub height: usize,

    /// `structure[row][col]` is true for cells that can hold a letter.
    structure: Vec<Vec<bool>>,

    /// Every slot in the grid, sorted, so that anything iterating over slots is reproducible.
    variables: Vec<Variable>,

    /// For every ordered pair of crossing slots `(x, y)`, the cell indices where they meet. Both
    /// `(x, y)` and `(y, x)` are present, with the offsets swapped.
    overlaps: HashMap<SlotPair, Overlap>,

    /// For every slot, the (sorted) slots that cross it.
    neighbors: HashMap<Variable, Vec<Variable>>,

    /// The words available for filling the grid.
    word_list: WordList,
}

impl Puzzle {
    /// Build a puzzle from an explicit list of slots. Every cell covered by a slot is treated as
    /// open; every other cell is a block.
    pub fn new(
        width: usize,
        height: usize,
        variables: Vec<Variable>,
        word_list: WordList,
    ) -> Result<Puzzle, PuzzleError> {
        let mut structure = vec![vec![false; width]; height];
        for variable in &variables {
            check_bounds(variable, width, height)?;
            for (row, col) in variable.cell_coords() {
                structure[row][col] = true;
            }
        }

        Puzzle::build(width, height, structure, variables, word_list)
    }

    /// Build a puzzle from a grid of open (true) and blocked (false) cells, deriving its slots
    /// from the runs of open cells. Rows shorter than the longest one are padded with blocks.
    pub fn with_structure(
        structure: Vec<Vec<bool>>,
        word_list: WordList,
    ) -> Result<Puzzle, PuzzleError> {
        if structure.is_empty() {
            return Err(PuzzleError::EmptyStructure);
        }

        let width = structure.iter().map(Vec::len).max().unwrap_or(0);
        let height = structure.len();
        let structure: Vec<Vec<bool>> = structure
            .into_iter()
            .map(|mut row| {
                row.resize(width, false);
                row
            })
            .collect();

        let variables = generate_slots_from_structure(&structure);

        Puzzle::build(width, height, structure, variables, word_list)
    }

    /// Build a puzzle from a structure string, with `_` representing open cells and anything else
    /// representing blocks. Blank lines before and after the grid are ignored.
    pub fn from_structure_str(template: &str, word_list: WordList) -> Result<Puzzle, PuzzleError> {
        let lines: Vec<&str> = template.lines().map(str::trim_end).collect();
        let first = lines.iter().position(|line| !line.is_empty());
        let last = lines.iter().rposition(|line| !line.is_empty());

        let structure: Vec<Vec<bool>> = match (first, last) {
            (Some(first), Some(last)) => lines[first..=last]
                .iter()
                .map(|line| line.chars().map(|c| c == OPEN_CELL).collect())
                .collect(),
            _ => vec![],
        };

        Puzzle::with_structure(structure, word_list)
    }

    fn build(
        width: usize,
        height: usize,
        structure: Vec<Vec<bool>>,
        mut variables: Vec<Variable>,
        word_list: WordList,
    ) -> Result<Puzzle, PuzzleError> {
        variables.sort();
        for pair in variables.windows(2) {
            if pair[0] == pair[1] {
                return Err(PuzzleError::DuplicateSlot(pair[0]));
            }
        }

        // Build a map from cell location to the slots that cover it, which we can then use to
        // calculate overlaps.
        let mut entries_by_cell: HashMap<GridCoord, Vec<(Variable, usize)>> = HashMap::new();
        for &variable in &variables {
            check_bounds(&variable, width, height)?;
            for (cell_idx, loc) in variable.cell_coords().into_iter().enumerate() {
                entries_by_cell
                    .entry(loc)
                    .or_default()
                    .push((variable, cell_idx));
            }
        }

        let mut overlaps: HashMap<SlotPair, Overlap> = HashMap::new();
        let mut neighbors: HashMap<Variable, Vec<Variable>> = variables
            .iter()
            .map(|&variable| (variable, vec![]))
            .collect();

        for (&loc, entries) in &entries_by_cell {
            match entries.as_slice() {
                [] | [_] => {}
                &[(x, x_cell), (y, y_cell)] => {
                    if x.direction == y.direction {
                        return Err(PuzzleError::ParallelOverlap(x.min(y), x.max(y)));
                    }
                    overlaps.insert((x, y), (x_cell, y_cell));
                    overlaps.insert((y, x), (y_cell, x_cell));
                    neighbors.entry(x).or_default().push(y);
                    neighbors.entry(y).or_default().push(x);
                }
                _ => return Err(PuzzleError::CrowdedCell(loc)),
            }
        }

        for slot_neighbors in neighbors.values_mut() {
            slot_neighbors.sort();
        }

        Ok(Puzzle {
            width,
            height,
            structure,
            variables,
            overlaps,
            neighbors,
            word_list,
        })
    }

    /// All slots in the puzzle, in sorted order.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    #[must_use]
    pub fn contains(&self, variable: &Variable) -> bool {
        self.neighbors.contains_key(variable)
    }

    #[must_use]
    pub fn word_list(&self) -> &WordList {
        &self.word_list
    }

    #[must_use]
    pub fn structure(&self) -> &[Vec<bool>] {
        &self.structure
    }

    /// Is the cell at the given coords able to hold a letter?
    #[must_use]
    pub fn is_open(&self, (row, col): GridCoord) -> bool {
        self.structure
            .get(row)
            .and_then(|cells| cells.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// The cell indices at which `x` and `y` cross, if they do.
    #[must_use]
    pub fn overlap(&self, x: Variable, y: Variable) -> Option<Overlap> {
        self.overlaps.get(&(x, y)).copied()
    }

    /// The slots crossing the given slot, in sorted order.
    #[must_use]
    pub fn neighbors(&self, variable: Variable) -> &[Variable] {
        self.neighbors
            .get(&variable)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every ordered pair of crossing slots, in a reproducible order.
    #[must_use]
    pub fn arcs(&self) -> Vec<SlotPair> {
        self.variables
            .iter()
            .flat_map(|&x| self.neighbors(x).iter().map(move |&y| (x, y)))
            .collect()
    }

    /// Lay out the words of an assignment in a `height` x `width` grid. Cells that no assigned
    /// slot covers are left empty.
    pub fn letter_grid(&self, assignment: &Assignment) -> Result<LetterGrid, PuzzleError> {
        let mut letters: LetterGrid = vec![vec![None; self.width]; self.height];

        for (variable, word) in assignment {
            if !self.contains(variable) {
                return Err(PuzzleError::UnknownVariable(*variable));
            }
            if word.chars().count() != variable.length {
                return Err(PuzzleError::WordLengthMismatch(*variable, word.clone()));
            }

            for (cell_idx, glyph) in word.chars().enumerate() {
                let (row, col) = variable.cell(cell_idx);
                letters[row][col] = Some(glyph);
            }
        }

        Ok(letters)
    }
}

impl Debug for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Puzzle")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("variables", &self.variables)
            .field("word_list", &self.word_list)
            .finish_non_exhaustive()
    }
}

fn check_bounds(variable: &Variable, width: usize, height: usize) -> Result<(), PuzzleError> {
    if variable.length == 0 {
        return Err(PuzzleError::EmptySlot(*variable));
    }

    // Coords far enough out to overflow are out of bounds too.
    let last_idx = variable.length - 1;
    let last_cell = match variable.direction {
        Direction::Across => variable
            .col
            .checked_add(last_idx)
            .map(|last_col| (variable.row, last_col)),
        Direction::Down => variable
            .row
            .checked_add(last_idx)
            .map(|last_row| (last_row, variable.col)),
    };

    match last_cell {
        Some((last_row, last_col)) if last_row < height && last_col < width => Ok(()),
        _ => Err(PuzzleError::SlotOutOfBounds(*variable)),
    }
}

/// Find every slot in a grid of open/blocked cells: each maximal run of at least two open cells,
/// across or down.
#[must_use]
pub fn generate_slots_from_structure(structure: &[Vec<bool>]) -> Vec<Variable> {
    fn build_runs(lines: &[Vec<bool>]) -> Vec<(usize, usize, usize)> {
        let mut result = vec![];

        for (line_idx, line) in lines.iter().enumerate() {
            let mut run_start: Option<usize> = None;

            // A trailing block closes any run still open at the end of the line.
            for (cell_idx, open) in line.iter().copied().chain(iter::once(false)).enumerate() {
                match (open, run_start) {
                    (true, None) => run_start = Some(cell_idx),
                    (false, Some(start)) => {
                        if cell_idx - start > 1 {
                            result.push((line_idx, start, cell_idx - start));
                        }
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }

        result
    }

    let width = structure.iter().map(Vec::len).max().unwrap_or(0);
    let transposed: Vec<Vec<bool>> = (0..width)
        .map(|col| {
            structure
                .iter()
                .map(|row| row.get(col).copied().unwrap_or(false))
                .collect()
        })
        .collect();

    let across = build_runs(structure)
        .into_iter()
        .map(|(row, col, length)| Variable::new(row, col, Direction::Across, length));
    let down = build_runs(&transposed)
        .into_iter()
        .map(|(col, row, length)| Variable::new(row, col, Direction::Down, length));

    across.chain(down).collect()
}

#[cfg(test)]
mod tests {
    use crate::puzzle::{Direction, Puzzle, PuzzleError, Variable};
    use crate::types::Assignment;
    use crate::word_list::WordList;

    const STRUCTURE: &str = "
#___#
#_##_
#____
#_##_
";

    fn across(row: usize, col: usize, length: usize) -> Variable {
        Variable::new(row, col, Direction::Across, length)
    }

    fn down(row: usize, col: usize, length: usize) -> Variable {
        Variable::new(row, col, Direction::Down, length)
    }

    #[test]
    fn test_slots_from_structure_string() {
        let puzzle = Puzzle::from_structure_str(STRUCTURE, WordList::from_words(&[])).unwrap();

        assert_eq!(puzzle.width, 5);
        assert_eq!(puzzle.height, 4);
        assert_eq!(
            puzzle.variables(),
            &[across(0, 1, 3), down(0, 1, 4), down(1, 4, 3), across(2, 1, 4)]
        );
        assert!(puzzle.is_open((1, 4)));
        assert!(!puzzle.is_open((1, 2)));
        assert!(!puzzle.is_open((9, 9)));
    }

    #[test]
    fn test_overlaps_are_stored_in_both_directions() {
        let puzzle = Puzzle::from_structure_str(STRUCTURE, WordList::from_words(&[])).unwrap();

        assert_eq!(puzzle.overlap(across(2, 1, 4), down(0, 1, 4)), Some((0, 2)));
        assert_eq!(puzzle.overlap(down(0, 1, 4), across(2, 1, 4)), Some((2, 0)));
        assert_eq!(puzzle.overlap(across(2, 1, 4), down(1, 4, 3)), Some((3, 1)));
        assert_eq!(puzzle.overlap(across(0, 1, 3), down(1, 4, 3)), None);
        assert_eq!(puzzle.overlap(across(0, 1, 3), across(0, 1, 3)), None);

        assert_eq!(
            puzzle.neighbors(down(0, 1, 4)),
            &[across(0, 1, 3), across(2, 1, 4)]
        );
        assert_eq!(puzzle.neighbors(across(0, 1, 3)), &[down(0, 1, 4)]);
        assert_eq!(puzzle.arcs().len(), 6);
    }

    #[test]
    fn test_slots_are_equal_by_value() {
        let puzzle = Puzzle::from_structure_str(STRUCTURE, WordList::from_words(&[])).unwrap();
        let rebuilt = Variable::from_key("0,1,down,4").unwrap();

        assert_eq!(rebuilt, down(0, 1, 4));
        assert!(puzzle.contains(&rebuilt));
        assert_eq!(rebuilt.to_key(), "0,1,down,4");
        assert!(Variable::from_key("0,1,sideways,4").is_err());
        assert!(Variable::from_key("0,1,down").is_err());
    }

    #[test]
    fn test_single_cells_are_not_slots() {
        let puzzle = Puzzle::from_structure_str("_#_\n###\n_##", WordList::from_words(&[])).unwrap();

        assert!(puzzle.variables().is_empty());
        assert!(puzzle.is_open((0, 2)));
    }

    #[test]
    fn test_rejects_malformed_grids() {
        let words = || WordList::from_words(&[]);

        assert_eq!(
            Puzzle::from_structure_str("\n\n", words()).unwrap_err(),
            PuzzleError::EmptyStructure
        );
        assert_eq!(
            Puzzle::new(3, 3, vec![across(0, 1, 3)], words()).unwrap_err(),
            PuzzleError::SlotOutOfBounds(across(0, 1, 3))
        );
        assert_eq!(
            Puzzle::new(3, 3, vec![across(0, 0, 3), across(0, 0, 3)], words()).unwrap_err(),
            PuzzleError::DuplicateSlot(across(0, 0, 3))
        );
        assert_eq!(
            Puzzle::new(4, 1, vec![across(0, 0, 3), across(0, 1, 3)], words()).unwrap_err(),
            PuzzleError::ParallelOverlap(across(0, 0, 3), across(0, 1, 3))
        );
        assert_eq!(
            Puzzle::new(3, 3, vec![down(0, 0, 0)], words()).unwrap_err(),
            PuzzleError::EmptySlot(down(0, 0, 0))
        );
    }

    #[test]
    fn test_rejects_slots_with_huge_coords() {
        let words = || WordList::from_words(&[]);

        assert_eq!(
            Puzzle::new(3, 3, vec![across(0, usize::MAX, 3)], words()).unwrap_err(),
            PuzzleError::SlotOutOfBounds(across(0, usize::MAX, 3))
        );
        assert_eq!(
            Puzzle::new(3, 3, vec![down(usize::MAX - 1, 0, 3)], words()).unwrap_err(),
            PuzzleError::SlotOutOfBounds(down(usize::MAX - 1, 0, 3))
        );
        assert_eq!(
            Puzzle::new(3, 3, vec![across(usize::MAX, 0, 2)], words()).unwrap_err(),
            PuzzleError::SlotOutOfBounds(across(usize::MAX, 0, 2))
        );
    }

    #[test]
    fn test_letter_grid_places_words() {
        let puzzle = Puzzle::from_structure_str(STRUCTURE, WordList::from_words(&[])).unwrap();

        let assignment: Assignment = [
            (across(0, 1, 3), "CAT".to_string()),
            (down(0, 1, 4), "CODE".to_string()),
            (across(2, 1, 4), "DIME".to_string()),
            (down(1, 4, 3), "RED".to_string()),
        ]
        .into_iter()
        .collect();

        let grid = puzzle.letter_grid(&assignment).unwrap();
        let rows: Vec<String> = grid
            .iter()
            .map(|row| row.iter().map(|cell| cell.unwrap_or('#')).collect())
            .collect();

        assert_eq!(rows, vec!["#CAT#", "#O##R", "#DIME", "#E##D"]);
    }

    #[test]
    fn test_letter_grid_leaves_unassigned_cells_empty() {
        let puzzle = Puzzle::from_structure_str(STRUCTURE, WordList::from_words(&[])).unwrap();

        let assignment: Assignment = [(down(1, 4, 3), "RED".to_string())].into_iter().collect();
        let grid = puzzle.letter_grid(&assignment).unwrap();

        assert_eq!(grid.len(), 4);
        assert!(grid.iter().all(|row| row.len() == 5));
        assert_eq!(grid[1][4], Some('R'));
        assert_eq!(grid[3][4], Some('D'));
        assert_eq!(grid[0][1], None);
        assert_eq!(
            grid.iter().flatten().filter(|cell| cell.is_some()).count(),
            3
        );
    }

    #[test]
    fn test_letter_grid_rejects_foreign_slots() {
        let puzzle = Puzzle::from_structure_str(STRUCTURE, WordList::from_words(&[])).unwrap();

        let unknown: Assignment = [(across(3, 0, 2), "AB".to_string())].into_iter().collect();
        assert_eq!(
            puzzle.letter_grid(&unknown).unwrap_err(),
            PuzzleError::UnknownVariable(across(3, 0, 2))
        );

        let too_long: Assignment = [(down(1, 4, 3), "REDS".to_string())].into_iter().collect();
        assert_eq!(
            puzzle.letter_grid(&too_long).unwrap_err(),
            PuzzleError::WordLengthMismatch(down(1, 4, 3), "REDS".into())
        );
    }
}
