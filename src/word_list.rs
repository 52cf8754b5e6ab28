use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;
use std::fmt::Debug;
use std::{fmt, fs};
use unicode_normalization::UnicodeNormalization;

use crate::types::WordId;
use crate::MAX_SLOT_LENGTH;

/// We stop recording errors for a source once it has produced this many, since at that point it's
/// probably not a word list at all.
pub const MAX_SOURCE_ERRORS: usize = 100;

/// A struct representing a word in the word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// The word as it would appear in a grid: uppercase, NFC-normalized, no whitespace.
    pub normalized_string: String,

    /// The chars making up `normalized_string`, so that we can look up the letter at a given cell
    /// index in constant time.
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    #[must_use]
    pub fn new(normalized_string: String) -> Word {
        let glyphs = normalized_string.chars().collect();
        Word {
            normalized_string,
            glyphs,
        }
    }

    /// The number of cells this word occupies.
    #[must_use]
    pub fn length(&self) -> usize {
        self.glyphs.len()
    }

    /// The letter this word places at `cell_idx`, if it's long enough to reach it.
    #[must_use]
    pub fn glyph(&self, cell_idx: usize) -> Option<char> {
        self.glyphs.get(cell_idx).copied()
    }
}

/// Given a raw line from a word list, turn it into the normalized form we'll use in the grid.
#[must_use]
pub fn normalize_word(canonical: &str) -> String {
    canonical
        .trim()
        .to_uppercase()
        .nfc() // Normalize Unicode combining forms
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordListError {
    InvalidPath(String),
    InvalidWord(String),
}

impl fmt::Display for WordListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordListError::InvalidPath(path) => write!(f, "Can’t read file: “{path}”"),
            WordListError::InvalidWord(word) => {
                write!(f, "Word list contains invalid word: “{word}”")
            }
        }
    }
}

impl std::error::Error for WordListError {}

impl WordListError {
    /// Whether this error means the source couldn't be used at all. A bad line only costs us
    /// that one entry.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, WordListError::InvalidPath(_))
    }
}

/// Configuration describing a source of wordlist entries.
pub enum WordListSourceConfig {
    Memory { id: String, words: Vec<String> },
    File { id: String, path: OsString },
    FileContents { id: String, contents: &'static str },
}

impl WordListSourceConfig {
    /// The unique id of this word list, used to report errors.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            WordListSourceConfig::Memory { id, .. }
            | WordListSourceConfig::FileContents { id, .. }
            | WordListSourceConfig::File { id, .. } => id.clone(),
        }
    }
}

/// Normalize a single entry, returning `None` for blank lines and recording an error for
/// anything that can't be placed in a grid.
fn parse_entry(raw: &str, errors: &mut Vec<WordListError>) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let normalized = normalize_word(raw);
    if !normalized.chars().all(char::is_alphanumeric) {
        if errors.len() < MAX_SOURCE_ERRORS {
            errors.push(WordListError::InvalidWord(raw.trim().into()));
        }
        return None;
    }

    Some(normalized)
}

fn parse_word_list_file_contents(
    file_contents: &str,
    errors: &mut Vec<WordListError>,
) -> Vec<String> {
    file_contents
        .lines()
        .filter_map(|line| parse_entry(line, errors))
        .collect()
}

fn load_words_from_source(source: &WordListSourceConfig) -> (Vec<String>, Vec<WordListError>) {
    let mut errors = vec![];

    let entries = match source {
        WordListSourceConfig::Memory { words, .. } => words
            .iter()
            .filter_map(|word| parse_entry(word, &mut errors))
            .collect(),

        WordListSourceConfig::File { path, .. } => {
            if let Ok(contents) = fs::read_to_string(path) {
                parse_word_list_file_contents(&contents, &mut errors)
            } else {
                errors.push(WordListError::InvalidPath(path.to_string_lossy().into()));
                vec![]
            }
        }

        WordListSourceConfig::FileContents { contents, .. } => {
            parse_word_list_file_contents(contents, &mut errors)
        }
    };

    (entries, errors)
}

/// The vocabulary available for filling a grid. Words are deduplicated and sorted, so a `WordId`
/// is also a word's rank in lexicographic order; this is what makes iteration over a domain
/// reproducible from one run to the next.
pub struct WordList {
    /// All loaded words. `WordId`s used everywhere else are indices into this list.
    pub words: Vec<Word>,

    /// A map from a normalized string to the id of the Word representing it.
    pub word_id_by_string: HashMap<String, WordId>,

    /// Errors emitted by each source while loading, keyed by source id.
    pub source_errors: HashMap<String, Vec<WordListError>>,
}

impl WordList {
    /// Construct a new `WordList` from the given sources. Sources that fail to load, or lines that
    /// fail to parse, are recorded in `source_errors` rather than aborting the whole load.
    #[must_use]
    pub fn new(source_configs: Vec<WordListSourceConfig>) -> WordList {
        let mut unique_words: BTreeSet<String> = BTreeSet::new();
        let mut source_errors = HashMap::new();

        for source in &source_configs {
            let (entries, errors) = load_words_from_source(source);
            unique_words.extend(entries);
            source_errors.insert(source.id(), errors);
        }

        let words: Vec<Word> = unique_words.into_iter().map(Word::new).collect();
        let word_id_by_string = words
            .iter()
            .enumerate()
            .map(|(word_id, word)| (word.normalized_string.clone(), word_id))
            .collect();

        WordList {
            words,
            word_id_by_string,
            source_errors,
        }
    }

    /// Build a `WordList` directly from a slice of strings.
    #[must_use]
    pub fn from_words(words: &[&str]) -> WordList {
        WordList::new(vec![WordListSourceConfig::Memory {
            id: "0".into(),
            words: words.iter().map(|&word| word.to_string()).collect(),
        }])
    }

    /// Borrow an existing word using its id.
    #[must_use]
    pub fn get_word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    /// Look up the id of a word, normalizing it first.
    #[must_use]
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.word_id_by_string.get(&normalize_word(word)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// For each source provided at load time, return any errors it emitted.
    #[must_use]
    pub fn get_source_errors(&self) -> &HashMap<String, Vec<WordListError>> {
        &self.source_errors
    }
}

impl Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("word_count", &self.words.len())
            .finish_non_exhaustive()
    }
}
