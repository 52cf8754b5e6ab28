//! This module contains a crossword-specific implementation of the AC-3 algorithm. For our
//! purposes, a grid is arc-consistent when every option left in every slot has, for each slot
//! crossing it, at least one option in the crossing slot with the same letter in the shared cell.
//! For example, if 1D doesn't have any options starting with the letter A, we want to remove any
//! options for 1A that start with the letter A.
//!
//! Only letter agreement is propagated here. Two slots holding the same word is a conflict too,
//! but a word is never treated as supporting itself; duplicates are caught by the consistency
//! check during search instead.

use log::{debug, trace};
use std::collections::{HashSet, VecDeque};

use crate::domain::Domains;
use crate::puzzle::{Puzzle, Variable};
use crate::types::SlotPair;
use crate::util::build_glyph_counts;
use crate::{CHECK_INVARIANTS, LOG_FILL_PROCESS};

/// Result from a successful call to `establish_arc_consistency`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were processed.
    pub revisions: usize,

    /// How many options were removed across all slots.
    pub eliminations: usize,
}

/// Result from a failed call to `establish_arc_consistency`, naming the slot whose domain was
/// wiped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub wiped_out: Variable,
}

/// Result from a call to `establish_arc_consistency`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make `x` arc consistent with `y` by removing every option for `x` that doesn't share a letter
/// in the crossing cell with at least one option for `y`. Returns the number of options removed.
/// If `x` and `y` don't cross there's no constraint between them and nothing is removed.
pub fn revise_count(puzzle: &Puzzle, domains: &mut Domains, x: Variable, y: Variable) -> usize {
    let Some((x_cell, y_cell)) = puzzle.overlap(x, y) else {
        return 0;
    };
    let word_list = puzzle.word_list();

    // Any letter that some option for `y` places in the shared cell supports every option for `x`
    // with the same letter there, so we only need to know which letters are available.
    let y_glyph_counts = build_glyph_counts(word_list, domains.options(y), y_cell);

    domains.retain(x, |word_id| {
        word_list
            .get_word(word_id)
            .glyph(x_cell)
            .is_some_and(|glyph| y_glyph_counts.contains_key(&glyph))
    })
}

/// Make `x` arc consistent with `y`. Returns true if any options were removed from `x`.
pub fn revise(puzzle: &Puzzle, domains: &mut Domains, x: Variable, y: Variable) -> bool {
    revise_count(puzzle, domains, x, y) > 0
}

/// Run AC-3 over the given arcs, or over every arc in the puzzle if none are given. Arcs are
/// processed in FIFO order; whenever a slot's domain shrinks, the arcs pointing into it from its
/// other neighbors are queued again. If any domain is emptied we stop right away, since no fill
/// is possible from this state.
pub fn establish_arc_consistency(
    puzzle: &Puzzle,
    domains: &mut Domains,
    arcs: Option<Vec<SlotPair>>,
) -> ArcConsistencyResult {
    let initial_domains = if CHECK_INVARIANTS {
        Some(domains.clone())
    } else {
        None
    };

    let mut queue: VecDeque<SlotPair> = VecDeque::new();
    let mut queued: HashSet<SlotPair> = HashSet::new();
    for arc in arcs.unwrap_or_else(|| puzzle.arcs()) {
        if queued.insert(arc) {
            queue.push_back(arc);
        }
    }

    let mut result = ArcConsistencySuccess::default();

    while let Some((x, y)) = queue.pop_front() {
        queued.remove(&(x, y));
        result.revisions += 1;

        let removed = revise_count(puzzle, domains, x, y);
        if removed == 0 {
            continue;
        }
        result.eliminations += removed;

        if LOG_FILL_PROCESS {
            trace!(
                "revised {x} against {y}: removed {removed}, {} left",
                domains.option_count(x)
            );
        }

        if domains.is_wiped_out(x) {
            debug!(
                "arc consistency failed: no options left for {x} after {} revisions",
                result.revisions
            );
            return Err(ArcConsistencyFailure { wiped_out: x });
        }

        // Shrinking `x` may have removed the only support for options in the other slots that
        // cross it, so those slots need to be checked against `x` again.
        for &z in puzzle.neighbors(x) {
            if z != y && queued.insert((z, x)) {
                queue.push_back((z, x));
            }
        }
    }

    if let Some(initial_domains) = initial_domains {
        assert!(
            domains.is_subset_of(&initial_domains),
            "Arc consistency added options to a domain?"
        );
    }

    debug!(
        "arc consistency established: {} revisions, {} eliminations",
        result.revisions, result.eliminations
    );

    Ok(result)
}
