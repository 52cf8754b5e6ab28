use clap::Parser;
use crossword_csp::backtracking_search::{FillFailure, Solver, Statistics};
use crossword_csp::puzzle::Puzzle;
use crossword_csp::render::{render_grid, save_image};
use crossword_csp::word_list::{WordList, WordListSourceConfig};
use env_logger::Env;
use log::{info, warn};
use std::fmt::{Debug, Formatter};
use std::fs;

/// crossword_csp: Fill a crossword grid from a word list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, with _ representing open cells and anything else a block
    structure_path: String,

    /// Path to the word list, one word per line
    words_path: String,

    /// Where to save an image of the filled grid, e.g. output.png
    output: Option<String>,

    /// Print statistics about the fill process
    #[arg(long)]
    stats: bool,
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn print_statistics(statistics: &Statistics) {
    println!();
    println!("States explored: {}", statistics.states);
    println!("Backtracks: {}", statistics.backtracks);
    println!(
        "Node consistency eliminations: {}",
        statistics.node_consistency_eliminations
    );
    println!(
        "Arc consistency: {} revisions, {} eliminations in {:?}",
        statistics.arc_consistency_revisions,
        statistics.arc_consistency_eliminations,
        statistics.arc_consistency_time
    );
    println!("Search time: {:?}", statistics.search_time);
    println!("Total time: {:?}", statistics.total_time);
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let raw_structure = fs::read_to_string(&args.structure_path)
        .map_err(|_| Error(format!("Couldn't read file '{}'", args.structure_path)))?;

    let word_list = WordList::new(vec![WordListSourceConfig::File {
        id: "0".into(),
        path: args.words_path.into(),
    }]);

    // An unreadable file is fatal, but a bad line only loses that entry.
    if let Some(errors) = word_list.get_source_errors().get("0") {
        if let Some(fatal) = errors.iter().find(|error| error.is_fatal()) {
            return Err(Error(format!("{fatal}")));
        }
        for error in errors {
            warn!("{error}, skipping it");
        }
    }

    if word_list.is_empty() {
        return Err(Error("Word list is empty".into()));
    }

    let puzzle = Puzzle::from_structure_str(&raw_structure, word_list)
        .map_err(|error| Error(format!("{error}")))?;

    let mut solver = Solver::new(&puzzle);

    match solver.find_fill() {
        Ok(result) => {
            let rendered = render_grid(&puzzle, &result.assignment)
                .map_err(|error| Error(format!("{error}")))?;
            println!("{rendered}");

            if let Some(output) = &args.output {
                save_image(&puzzle, &result.assignment, output)
                    .map_err(|error| Error(format!("{error}")))?;
            }
        }
        Err(failure) => {
            if let FillFailure::NodeConsistency(_) | FillFailure::ArcConsistency(_) = failure {
                info!("{failure}");
            }
            println!("No solution.");
        }
    }

    if args.stats {
        print_statistics(solver.statistics());
    }

    Ok(())
}
