//! Benchmarks the solver against a dataset of known positions and scores.
//!
//! Run with a path to a testing file as a command-line argument. Testing files are plain text
//! files where each line holds two whitespace-separated values: a move sequence (digits 1-7)
//! and the known strong score of the resulting position from the current player's perspective.

use connect4_solver_core::{Position, Solver};
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::str::FromStr;
use std::time::{Duration, Instant};
use std::{env, process};

/// A single parsed test case: a position and its known strong score.
struct TestCase {
    position: Position,
    expected_score: i8,
}

impl FromStr for TestCase {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let moves = parts.next().ok_or("missing move sequence")?;
        let score_str = parts.next().ok_or("missing score")?;

        let position = Position::from_moves(moves)?;
        let expected_score = score_str.parse::<i8>()?;

        Ok(TestCase { position, expected_score })
    }
}

#[derive(Default)]
struct BenchmarkResults {
    total_tests: usize,
    correct_solves: usize,
    total_duration: Duration,
    total_nodes_explored: usize,
    failures: Vec<(String, i8, i8)>,
}

impl BenchmarkResults {
    fn record(&mut self, moves: &str, expected: i8, actual: i8, duration: Duration, nodes: usize) {
        self.total_tests += 1;
        self.total_duration += duration;
        self.total_nodes_explored += nodes;

        if expected == actual {
            self.correct_solves += 1;
        } else {
            self.failures.push((moves.to_string(), expected, actual));
        }
    }
}

impl Display for BenchmarkResults {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n--- Benchmark Results ---")?;
        writeln!(
            f,
            "Accuracy: {} / {} ({:.2}%)",
            self.correct_solves,
            self.total_tests,
            (self.correct_solves as f64 / self.total_tests as f64) * 100.0
        )?;

        if self.total_tests > 0 {
            let mean_time = self.total_duration / self.total_tests as u32;
            let mean_nodes = self.total_nodes_explored as f64 / self.total_tests as f64;
            let kpos_per_sec = self.total_nodes_explored as f64 / self.total_duration.as_secs_f64() / 1000.0;

            writeln!(f, "Mean time per position: {mean_time:?}")?;
            writeln!(f, "Mean nodes explored: {mean_nodes:.0}")?;
            writeln!(f, "Solver speed: {kpos_per_sec:.2} kpos/s")?;
        }

        if !self.failures.is_empty() {
            writeln!(f, "\n--- Failures ---")?;
            for (moves, expected, actual) in &self.failures {
                writeln!(f, "Moves: '{moves}' | Expected: {expected}, Got: {actual}")?;
            }
        }

        Ok(())
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let path = env::args().nth(1).ok_or(
        "missing path argument\nusage: cargo run --release --bin benchmark -- <path/to/test_file>",
    )?;

    println!("Loading test data from '{path}'...");
    let test_cases = load_test_data(&path)?;

    println!("Running benchmark on {} positions...", test_cases.len());
    let results = run_benchmark(&test_cases);
    println!("{results}");

    Ok(())
}

fn load_test_data(path: &str) -> Result<Vec<(String, TestCase)>, Box<dyn Error>> {
    let reader = BufReader::new(File::open(path)?);
    let mut cases = Vec::new();

    for (i, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<TestCase>() {
            Ok(case) => cases.push((line, case)),
            Err(e) => return Err(format!("error parsing line {}: {e}", i + 1).into()),
        }
    }

    Ok(cases)
}

fn run_benchmark(test_cases: &[(String, TestCase)]) -> BenchmarkResults {
    let mut results = BenchmarkResults::default();
    let mut solver = Solver::new();

    let progress_bar = create_progress_bar(test_cases.len() as u64);

    for (line, test_case) in progress_bar.wrap_iter(test_cases.iter()) {
        solver.reset();

        let start = Instant::now();
        let actual_score = solver.solve(&test_case.position, false);
        let duration = start.elapsed();

        results.record(line, test_case.expected_score, actual_score, duration, solver.node_count);
    }

    results
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {human_pos}/{human_len} ({eta})",
    )
    .unwrap()
    .progress_chars("#>-");
    ProgressBar::new(len).with_style(style)
}
