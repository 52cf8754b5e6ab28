use std::collections::HashMap;
use std::fmt;

use crate::puzzle::{Puzzle, Variable};
use crate::types::Assignment;

/// The first rule a (partial) assignment was found to break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// The same word is used in two slots.
    DuplicateWord {
        word: String,
        first: Variable,
        second: Variable,
    },

    /// A word doesn't have the same number of letters as its slot.
    WrongLength { variable: Variable, word: String },

    /// Two crossing slots disagree on the letter in their shared cell.
    LetterConflict { x: Variable, y: Variable },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inconsistency::DuplicateWord {
                word,
                first,
                second,
            } => write!(f, "“{word}” is used in both {first} and {second}"),
            Inconsistency::WrongLength { variable, word } => {
                write!(f, "“{word}” doesn't fit slot {variable}")
            }
            Inconsistency::LetterConflict { x, y } => {
                write!(f, "{x} and {y} disagree where they cross")
            }
        }
    }
}

impl std::error::Error for Inconsistency {}

/// Check a partial or complete assignment against the rules of the puzzle: no word may appear
/// twice, every word must be as long as its slot, and crossing slots must agree on their shared
/// letter. Slots that haven't been assigned yet don't constrain anything.
pub fn check_assignment(puzzle: &Puzzle, assignment: &Assignment) -> Result<(), Inconsistency> {
    let mut slot_by_word: HashMap<&str, Variable> = HashMap::with_capacity(assignment.len());
    for (&variable, word) in assignment {
        if let Some(&first) = slot_by_word.get(word.as_str()) {
            return Err(Inconsistency::DuplicateWord {
                word: word.clone(),
                first,
                second: variable,
            });
        }
        slot_by_word.insert(word, variable);
    }

    for (&variable, word) in assignment {
        if word.chars().count() != variable.length {
            return Err(Inconsistency::WrongLength {
                variable,
                word: word.clone(),
            });
        }
    }

    for (&x, x_word) in assignment {
        // Each crossing is visited from both sides, so only check it from the smaller slot.
        for &y in puzzle.neighbors(x).iter().filter(|&&y| x < y) {
            let (Some(y_word), Some((x_cell, y_cell))) = (assignment.get(&y), puzzle.overlap(x, y))
            else {
                continue;
            };

            if x_word.chars().nth(x_cell) != y_word.chars().nth(y_cell) {
                return Err(Inconsistency::LetterConflict { x, y });
            }
        }
    }

    Ok(())
}

/// Does the assignment satisfy every rule checked by `check_assignment`?
#[must_use]
pub fn is_consistent(puzzle: &Puzzle, assignment: &Assignment) -> bool {
    check_assignment(puzzle, assignment).is_ok()
}
