use std::collections::HashMap;

use crate::types::WordId;
use crate::word_list::WordList;

/// Number of occurrences of each glyph at a single cell index across a slot's options.
pub type GlyphCounts = HashMap<char, usize>;

/// Count the glyphs that a set of options places at `cell_idx`. Options too short to reach the
/// cell don't contribute anything.
pub fn build_glyph_counts<'a>(
    word_list: &WordList,
    options: impl IntoIterator<Item = &'a WordId>,
    cell_idx: usize,
) -> GlyphCounts {
    let mut result = GlyphCounts::new();

    for &word_id in options {
        if let Some(glyph) = word_list.get_word(word_id).glyph(cell_idx) {
            *result.entry(glyph).or_insert(0) += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use crate::util::build_glyph_counts;
    use crate::word_list::WordList;

    #[test]
    fn test_build_glyph_counts() {
        let word_list = WordList::from_words(&["at", "cat", "cot", "dog"]);
        let options: Vec<usize> = (0..word_list.len()).collect();

        let counts = build_glyph_counts(&word_list, &options, 1);
        assert_eq!(counts.get(&'A'), Some(&1));
        assert_eq!(counts.get(&'O'), Some(&2));
        assert_eq!(counts.get(&'T'), Some(&1));

        // "AT" is too short to reach the third cell.
        let counts = build_glyph_counts(&word_list, &options, 2);
        assert_eq!(counts.values().sum::<usize>(), 3);
    }
}
