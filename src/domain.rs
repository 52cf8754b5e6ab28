use std::collections::{BTreeSet, HashMap};

use crate::puzzle::{Puzzle, Variable};
use crate::types::WordId;

static NO_OPTIONS: BTreeSet<WordId> = BTreeSet::new();

/// The live set of candidate words for each slot. Options are only ever removed, never added, so
/// every domain is a subset of what it was at any earlier point in the same solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    options: HashMap<Variable, BTreeSet<WordId>>,
}

impl Domains {
    /// Give every slot in the puzzle the whole vocabulary as its domain.
    #[must_use]
    pub fn new(puzzle: &Puzzle) -> Domains {
        let all_words: BTreeSet<WordId> = (0..puzzle.word_list().len()).collect();

        Domains {
            options: puzzle
                .variables()
                .iter()
                .map(|&variable| (variable, all_words.clone()))
                .collect(),
        }
    }

    /// The current options for a slot. A slot the domains don't know about has none.
    #[must_use]
    pub fn options(&self, variable: Variable) -> &BTreeSet<WordId> {
        self.options.get(&variable).unwrap_or(&NO_OPTIONS)
    }

    #[must_use]
    pub fn option_count(&self, variable: Variable) -> usize {
        self.options(variable).len()
    }

    #[must_use]
    pub fn is_wiped_out(&self, variable: Variable) -> bool {
        self.options(variable).is_empty()
    }

    /// Total number of options across every slot.
    #[must_use]
    pub fn total_option_count(&self) -> usize {
        self.options.values().map(BTreeSet::len).sum()
    }

    /// Keep only the options of `variable` that satisfy `keep`, returning how many were removed.
    pub fn retain(&mut self, variable: Variable, mut keep: impl FnMut(WordId) -> bool) -> usize {
        let Some(options) = self.options.get_mut(&variable) else {
            return 0;
        };

        let before = options.len();
        options.retain(|&word_id| keep(word_id));
        before - options.len()
    }

    /// Remove every option whose length differs from its slot's length. Returns the number of
    /// options removed.
    pub fn enforce_node_consistency(&mut self, puzzle: &Puzzle) -> usize {
        let word_list = puzzle.word_list();

        puzzle
            .variables()
            .iter()
            .map(|&variable| {
                self.retain(variable, |word_id| {
                    word_list.get_word(word_id).length() == variable.length
                })
            })
            .sum()
    }

    /// Is every slot's domain here contained in its domain in `other`?
    #[must_use]
    pub fn is_subset_of(&self, other: &Domains) -> bool {
        self.options
            .iter()
            .all(|(&variable, options)| options.is_subset(other.options(variable)))
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::Domains;
    use crate::puzzle::{Direction, Puzzle, Variable};
    use crate::word_list::WordList;

    fn puzzle() -> Puzzle {
        Puzzle::new(
            4,
            4,
            vec![
                Variable::new(0, 0, Direction::Across, 3),
                Variable::new(0, 0, Direction::Down, 4),
            ],
            WordList::from_words(&["cat", "dog", "cart", "door", "a", "zebra"]),
        )
        .unwrap()
    }

    #[test]
    fn test_domains_start_with_every_word() {
        let puzzle = puzzle();
        let domains = Domains::new(&puzzle);

        for &variable in puzzle.variables() {
            assert_eq!(domains.option_count(variable), 6);
        }
        assert_eq!(domains.total_option_count(), 12);
    }

    #[test]
    fn test_node_consistency_filters_by_length() {
        let puzzle = puzzle();
        let word_list = puzzle.word_list();
        let mut domains = Domains::new(&puzzle);

        let removed = domains.enforce_node_consistency(&puzzle);

        assert_eq!(removed, 8);
        for &variable in puzzle.variables() {
            assert_eq!(domains.option_count(variable), 2);
            assert!(domains
                .options(variable)
                .iter()
                .all(|&word_id| word_list.words[word_id].length() == variable.length));
        }
    }

    #[test]
    fn test_node_consistency_is_idempotent() {
        let puzzle = puzzle();
        let mut domains = Domains::new(&puzzle);

        domains.enforce_node_consistency(&puzzle);
        let once = domains.clone();
        let removed_again = domains.enforce_node_consistency(&puzzle);

        assert_eq!(removed_again, 0);
        assert_eq!(domains, once);
        assert!(once.is_subset_of(&Domains::new(&puzzle)));
    }

    #[test]
    fn test_unknown_slots_have_no_options() {
        let puzzle = puzzle();
        let mut domains = Domains::new(&puzzle);
        let stranger = Variable::new(3, 3, Direction::Across, 1);

        assert!(domains.is_wiped_out(stranger));
        assert_eq!(domains.retain(stranger, |_| false), 0);
    }
}
