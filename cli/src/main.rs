//! Command-line front-end for the Connect Four perfect solver.

mod book;

use book::OpeningBook;
use clap::{Parser, Subcommand};
use connect4_solver_core::{Position, Solver};
use std::error::Error;
use std::path::PathBuf;

/// A perfect solver for Connect Four.
#[derive(Parser)]
#[command(name = "connect4-solver", version, about)]
struct Cli {
    /// Increase log verbosity; repeat for more detail (e.g. -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a position for its game-theoretic score.
    Solve {
        /// A sequence of 1-indexed column moves, e.g. "44455".
        moves: String,
        /// Only compute the sign of the score (win/draw/loss), not its exact magnitude.
        #[arg(long)]
        weak: bool,
        /// Preload an opening book before solving.
        #[arg(long)]
        book: Option<PathBuf>,
    },
    /// Score every legal next move from a position.
    Analyze {
        /// A sequence of 1-indexed column moves, e.g. "44455".
        moves: String,
        /// Only compute the sign of each score, not its exact magnitude.
        #[arg(long)]
        weak: bool,
        /// Preload an opening book before solving.
        #[arg(long)]
        book: Option<PathBuf>,
    },
    /// Generate an opening book up to a given depth and save it to disk.
    Book {
        /// Output path for the generated book.
        #[arg(long, default_value = "book.bin")]
        out: PathBuf,
        /// Maximum number of plies to enumerate. Generation time grows exponentially with depth.
        #[arg(long, default_value_t = 8)]
        depth: usize,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Solve { moves, weak, book } => solve(&moves, weak, book),
        Command::Analyze { moves, weak, book } => analyze(&moves, weak, book),
        Command::Book { out, depth } => generate_book(&out, depth),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn build_solver(book: Option<PathBuf>) -> Result<Solver, Box<dyn Error>> {
    match book {
        Some(path) => {
            let book = OpeningBook::load(&path)?;
            log::info!("loaded opening book with {} positions from {path:?}", book.len());
            Ok(Solver::with_book(book.into_map()))
        }
        None => Ok(Solver::new()),
    }
}

fn solve(moves: &str, weak: bool, book: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let position = Position::from_moves(moves)?;
    let mut solver = build_solver(book)?;

    let score = solver.solve(&position, weak);
    log::info!("explored {} nodes", solver.node_count);
    println!("{score}");
    Ok(())
}

fn analyze(moves: &str, weak: bool, book: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let position = Position::from_moves(moves)?;
    let mut solver = build_solver(book)?;

    let scores = solver.analyze(&position, weak);
    log::info!("explored {} nodes", solver.node_count);

    let rendered: Vec<String> = scores
        .iter()
        .map(|score| score.map_or_else(|| "-".to_string(), |s| s.to_string()))
        .collect();
    println!("{}", rendered.join(" "));
    Ok(())
}

fn generate_book(out: &PathBuf, depth: usize) -> Result<(), Box<dyn Error>> {
    let book = OpeningBook::generate(depth);
    book.save(out)?;
    println!("Saved {} positions to {out:?}", book.len());
    Ok(())
}
