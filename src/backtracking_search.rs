//! This module implements grid-filling as a classic constraint satisfaction search: we establish
//! node consistency (every option has the right length) and arc consistency (AC-3) up front, then
//! run a depth-first backtracking search. Slots are chosen by minimum remaining values with a
//! degree tie-break, and each slot's options are tried in least-constraining-value order.
//!
//! Arc consistency isn't maintained during the search itself; the pruned domains are only used to
//! decide what to try and in what order, and every partial assignment is checked directly.

use log::{debug, trace};
use std::cmp::Reverse;
use std::fmt;
use std::time::{Duration, Instant};

use crate::arc_consistency::{
    establish_arc_consistency, revise, ArcConsistencyFailure, ArcConsistencySuccess,
};
use crate::consistency::is_consistent;
use crate::domain::Domains;
use crate::puzzle::{Puzzle, PuzzleError, Variable};
use crate::types::{Assignment, LetterGrid, SlotPair, WordId};
use crate::util::build_glyph_counts;
use crate::{CHECK_INVARIANTS, LOG_FILL_PROCESS};

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: usize,
    pub backtracks: usize,
    pub node_consistency_eliminations: usize,
    pub arc_consistency_revisions: usize,
    pub arc_consistency_eliminations: usize,
    pub total_time: Duration,
    pub arc_consistency_time: Duration,
    pub search_time: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

/// The reason a fill operation didn't produce an assignment. None of these are errors in the
/// usual sense; they all mean the puzzle has no solution with this vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillFailure {
    /// No word in the vocabulary has the length of this slot.
    NodeConsistency(Variable),

    /// Propagating crossing constraints emptied this slot's domain.
    ArcConsistency(Variable),

    /// The search tried every candidate without finding a complete assignment.
    Exhausted,
}

impl fmt::Display for FillFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillFailure::NodeConsistency(variable) => {
                write!(f, "No words fit slot {variable}")
            }
            FillFailure::ArcConsistency(variable) => {
                write!(f, "No words fit slot {variable} given its crossings")
            }
            FillFailure::Exhausted => write!(f, "No valid fill exists"),
        }
    }
}

impl std::error::Error for FillFailure {}

/// A solver for one puzzle. It owns the domains for the duration of the solve, starting with the
/// entire vocabulary for every slot.
pub struct Solver<'a> {
    puzzle: &'a Puzzle,
    domains: Domains,
    statistics: Statistics,
}

impl<'a> Solver<'a> {
    #[must_use]
    pub fn new(puzzle: &'a Puzzle) -> Solver<'a> {
        Solver {
            puzzle,
            domains: Domains::new(puzzle),
            statistics: Statistics::default(),
        }
    }

    #[must_use]
    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    /// Stats from the most recent fill attempt.
    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Remove every option whose length doesn't match its slot, returning how many were removed.
    pub fn enforce_node_consistency(&mut self) -> usize {
        self.domains.enforce_node_consistency(self.puzzle)
    }

    /// Make `x` arc consistent with `y`; see `arc_consistency::revise`.
    pub fn revise(&mut self, x: Variable, y: Variable) -> bool {
        revise(self.puzzle, &mut self.domains, x, y)
    }

    /// Run AC-3 over the given arcs (or all arcs), returning false if any domain is wiped out.
    pub fn ac3(&mut self, arcs: Option<Vec<SlotPair>>) -> bool {
        establish_arc_consistency(self.puzzle, &mut self.domains, arcs).is_ok()
    }

    /// Does the assignment give a word to every slot in the puzzle?
    #[must_use]
    pub fn assignment_complete(&self, assignment: &Assignment) -> bool {
        self.puzzle
            .variables()
            .iter()
            .all(|variable| assignment.contains_key(variable))
    }

    #[must_use]
    pub fn consistent(&self, assignment: &Assignment) -> bool {
        is_consistent(self.puzzle, assignment)
    }

    /// Choose the unassigned slot with the fewest remaining options, preferring slots that cross
    /// more other slots when there's a tie. Any remaining tie goes to the first slot in sorted
    /// order.
    #[must_use]
    pub fn select_unassigned_variable(&self, assignment: &Assignment) -> Option<Variable> {
        self.puzzle
            .variables()
            .iter()
            .copied()
            .filter(|variable| !assignment.contains_key(variable))
            .min_by_key(|&variable| {
                (
                    self.domains.option_count(variable),
                    Reverse(self.puzzle.neighbors(variable).len()),
                    variable,
                )
            })
    }

    /// Order a slot's options by how many options they would rule out in crossing slots that
    /// haven't been assigned yet, fewest first. Options that rule out the same number keep their
    /// vocabulary order.
    #[must_use]
    pub fn order_domain_values(&self, variable: Variable, assignment: &Assignment) -> Vec<WordId> {
        let word_list = self.puzzle.word_list();

        // For each open crossing: the cell index in this slot, how many options the crossing
        // slot has, and how many of those options have each letter in the shared cell. An option
        // for this slot rules out every crossing option that doesn't share its letter.
        let crossings: Vec<_> = self
            .puzzle
            .neighbors(variable)
            .iter()
            .filter(|&&neighbor| !assignment.contains_key(&neighbor))
            .filter_map(|&neighbor| {
                let (cell_idx, neighbor_cell_idx) = self.puzzle.overlap(variable, neighbor)?;
                let neighbor_options = self.domains.options(neighbor);
                Some((
                    cell_idx,
                    neighbor_options.len(),
                    build_glyph_counts(word_list, neighbor_options, neighbor_cell_idx),
                ))
            })
            .collect();

        let mut values: Vec<WordId> = self.domains.options(variable).iter().copied().collect();

        values.sort_by_cached_key(|&word_id| {
            let word = word_list.get_word(word_id);
            crossings
                .iter()
                .map(|(cell_idx, option_count, glyph_counts)| {
                    let compatible = word
                        .glyph(*cell_idx)
                        .and_then(|glyph| glyph_counts.get(&glyph))
                        .copied()
                        .unwrap_or(0);
                    option_count - compatible
                })
                .sum::<usize>()
        });

        values
    }

    /// Extend `assignment` until it's complete, trying each candidate for the chosen slot in turn
    /// and undoing it if the rest of the grid can't be filled. Returns true if the assignment is
    /// now complete; otherwise the assignment is left exactly as it was passed in.
    pub fn backtrack(&mut self, assignment: &mut Assignment) -> bool {
        self.statistics.states += 1;

        if !self.consistent(assignment) {
            return false;
        }
        if self.assignment_complete(assignment) {
            return true;
        }

        let Some(variable) = self.select_unassigned_variable(assignment) else {
            return false;
        };

        let puzzle = self.puzzle;
        let word_list = puzzle.word_list();
        let entry_count = assignment.len();

        for word_id in self.order_domain_values(variable, assignment) {
            let word = &word_list.get_word(word_id).normalized_string;

            if LOG_FILL_PROCESS {
                trace!("depth {entry_count}: trying {word} for {variable}");
            }

            assignment.insert(variable, word.clone());
            if self.backtrack(assignment) {
                return true;
            }
            assignment.remove(&variable);
            self.statistics.backtracks += 1;

            if CHECK_INVARIANTS {
                assert_eq!(
                    assignment.len(),
                    entry_count,
                    "Backtracking left entries behind?"
                );
            }
        }

        false
    }

    /// Establish node and arc consistency, then search for a complete assignment, recording stats
    /// along the way.
    pub fn find_fill(&mut self) -> Result<FillSuccess, FillFailure> {
        let start = Instant::now();
        self.statistics = Statistics::default();

        self.statistics.node_consistency_eliminations = self.enforce_node_consistency();
        debug!(
            "node consistency removed {} options",
            self.statistics.node_consistency_eliminations
        );

        // If a slot has no words of the right length, there's no point propagating anything.
        if let Some(&variable) = self
            .puzzle
            .variables()
            .iter()
            .find(|&&variable| self.domains.is_wiped_out(variable))
        {
            debug!("no options of the right length for {variable}");
            self.statistics.total_time = start.elapsed();
            return Err(FillFailure::NodeConsistency(variable));
        }

        let arc_consistency_start = Instant::now();
        let arc_consistency_result = establish_arc_consistency(self.puzzle, &mut self.domains, None);
        self.statistics.arc_consistency_time = arc_consistency_start.elapsed();

        match arc_consistency_result {
            Ok(ArcConsistencySuccess {
                revisions,
                eliminations,
            }) => {
                self.statistics.arc_consistency_revisions = revisions;
                self.statistics.arc_consistency_eliminations = eliminations;
            }
            Err(ArcConsistencyFailure { wiped_out }) => {
                self.statistics.total_time = start.elapsed();
                return Err(FillFailure::ArcConsistency(wiped_out));
            }
        }

        let search_start = Instant::now();
        let mut assignment = Assignment::new();
        let found = self.backtrack(&mut assignment);
        self.statistics.search_time = search_start.elapsed();
        self.statistics.total_time = start.elapsed();

        debug!(
            "search {} after {} states and {} backtracks",
            if found { "succeeded" } else { "failed" },
            self.statistics.states,
            self.statistics.backtracks
        );

        if found {
            Ok(FillSuccess {
                statistics: self.statistics.clone(),
                assignment,
            })
        } else {
            Err(FillFailure::Exhausted)
        }
    }

    /// Solve the puzzle, returning a complete assignment or `None` if there's no valid fill.
    pub fn solve(&mut self) -> Option<Assignment> {
        self.find_fill().ok().map(|success| success.assignment)
    }

    /// Lay out an assignment for this solver's puzzle; see `Puzzle::letter_grid`.
    pub fn letter_grid(&self, assignment: &Assignment) -> Result<LetterGrid, PuzzleError> {
        self.puzzle.letter_grid(assignment)
    }
}
