use clap::Parser;
use crossword_csp::backtracking_search::{FillFailure, SearchOptions};
use crossword_csp::grid::GridModel;
use crossword_csp::parse::{parse_structure, parse_word_list};
use crossword_csp::solve;
use instant::Duration;
use log::info;
use std::fmt::{Debug, Formatter};
use std::fs;

/// crossword-csp: fill a crossword structure from a word list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, with _ representing open squares and # representing blocks
    structure: String,

    /// Path to the word list, one word per line
    words: String,

    /// Path to write the filled grid to
    output: Option<String>,

    /// Skip rerunning arc consistency after each choice
    #[arg(long)]
    no_mac: bool,

    /// Give up after this many milliseconds [default: none]
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Print search statistics to stderr
    #[arg(long)]
    stats: bool,
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let structure_contents = fs::read_to_string(&args.structure)
        .map_err(|_| Error(format!("Couldn't read file '{}'", args.structure)))?;
    let words_contents = fs::read_to_string(&args.words)
        .map_err(|_| Error(format!("Couldn't read file '{}'", args.words)))?;

    let structure = parse_structure(&structure_contents).map_err(|e| Error(e.to_string()))?;
    let grid = GridModel::new(structure).map_err(|e| Error(e.to_string()))?;
    let words = parse_word_list(&words_contents);

    info!("loaded {} variables and {} words", grid.variable_count(), words.len());

    let options = SearchOptions {
        maintain_arc_consistency: !args.no_mac,
        time_limit: args.time_limit_ms.map(Duration::from_millis),
    };

    let result = match solve(&grid, &words, &options) {
        Ok(result) => result,
        Err(FillFailure::Unsatisfiable) => {
            println!("No solution.");
            return Ok(());
        }
        Err(FillFailure::TimedOut) => {
            return Err(Error("Time limit reached before a fill was found".into()));
        }
    };

    if args.stats {
        eprintln!("{:?}", result.statistics);
    }

    let display_grid = grid.render(&result.solution);
    println!("{}", display_grid);

    if let Some(output) = args.output {
        fs::write(&output, display_grid + "\n")
            .map_err(|_| Error(format!("Unable to write file '{}'", output)))?;
    }

    Ok(())
}
