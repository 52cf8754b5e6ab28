use std::collections::BTreeMap;

use crate::puzzle::Variable;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// Zero-indexed (row, column) coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// The cell indices `(x_cell, y_cell)` at which two crossing slots `x` and `y` share a square, so
/// that `word_x[x_cell]` has to equal `word_y[y_cell]`.
pub type Overlap = (usize, usize);

/// An ordered pair of slots `(x, y)`. In the context of arc consistency this means "revise the
/// domain of `x` against the domain of `y`".
pub type SlotPair = (Variable, Variable);

/// A partial or complete mapping from slots to the words placed in them.
pub type Assignment = BTreeMap<Variable, String>;

/// A `height` x `width` grid of letters, where `None` is a cell no assigned word covers.
pub type LetterGrid = Vec<Vec<Option<char>>>;
