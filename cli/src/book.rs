//! An opening book for Connect Four: pre-computed scores for opening positions, persisted to
//! disk so that repeated solves (or the CLI's own startup) can skip the deepest, slowest part of
//! the search tree.
//!
//! The core library stays free of file formats and parallel-generation machinery: it only ever
//! sees a plain `HashMap<u64, i8>` handed to [`connect4_solver_core::Solver::with_book`]. Parsing
//! the on-disk format and generating new entries both happen here.

use connect4_solver_core::{Position, Solver};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::{Arc, Mutex};

thread_local! {
    static THREAD_SOLVER: RefCell<Solver> = RefCell::new(Solver::new());
}

/// A cache mapping a position's key to its exact, previously-solved score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpeningBook {
    map: HashMap<u64, i8>,
}

impl OpeningBook {
    /// Creates a new, empty opening book.
    pub fn new() -> OpeningBook {
        OpeningBook::default()
    }

    /// The number of positions stored.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Consumes the book, handing its map to a [`Solver`].
    pub fn into_map(self) -> HashMap<u64, i8> {
        self.map
    }

    /// Saves the book to a file using a compact binary format.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, &self.map)?;
        Ok(())
    }

    /// Loads a book previously written by [`OpeningBook::save`].
    pub fn load(path: &Path) -> Result<OpeningBook, Box<dyn Error>> {
        let reader = BufReader::new(File::open(path)?);
        let map = bincode::deserialize_from(reader)?;
        Ok(OpeningBook { map })
    }

    /// Breadth-first enumerates every reachable position up to `max_depth` plies and solves each,
    /// in parallel, depth by depth. The `seen` set is keyed by `min(key, mirrored_key)`, so a
    /// position and its horizontal mirror collapse onto the same slot and are only ever queued
    /// once.
    pub fn generate(max_depth: usize) -> OpeningBook {
        let map = Arc::new(Mutex::new(HashMap::new()));
        let seen = Arc::new(Mutex::new(HashSet::new()));

        let start = Position::new();
        seen.lock().unwrap().insert(Self::canonical_key(&start));
        let mut current_level = vec![start];

        for depth in 0..=max_depth {
            if current_level.is_empty() {
                break;
            }

            println!("Processing depth {depth}, {} positions", current_level.len());
            let progress_bar = Self::create_progress_bar(current_level.len() as u64);

            let next_level_batches: Vec<Vec<Position>> = current_level
                .par_iter()
                .progress_with(progress_bar)
                .map(|pos| {
                    THREAD_SOLVER.with(|cell| {
                        let mut solver = cell.borrow_mut();
                        solver.reset();
                        let score = solver.solve(pos, false);
                        // Both orientations score identically, and only the canonical one is
                        // ever queued for expansion, so store both keys now or the mirrored
                        // orientation's lookup would miss.
                        let mut map = map.lock().unwrap();
                        map.insert(pos.key(), score);
                        map.insert(pos.mirrored_key(), score);
                        Self::children(pos)
                    })
                })
                .collect();

            let mut next_level = Vec::new();
            let mut seen_guard = seen.lock().unwrap();
            for batch in next_level_batches {
                for pos in batch {
                    if seen_guard.insert(Self::canonical_key(&pos)) {
                        next_level.push(pos);
                    }
                }
            }
            drop(seen_guard);
            current_level = next_level;
        }

        let map = Arc::try_unwrap(map).expect("no outstanding references").into_inner().unwrap();
        println!("Generation complete: {} positions", map.len());
        OpeningBook { map }
    }

    /// The smaller of a position's key and its mirror's, so mirror-image positions collapse to
    /// one entry in a `seen` set.
    fn canonical_key(position: &Position) -> u64 {
        position.key().min(position.mirrored_key())
    }

    fn children(position: &Position) -> Vec<Position> {
        let mut children = Vec::with_capacity(Position::WIDTH);
        let possible = position.possible();
        for col in 0..Position::WIDTH {
            if possible & Position::column_mask(col) != 0 && !position.is_winning_move(col) {
                let mut next = *position;
                next.play(col);
                children.push(next);
            }
        }
        children
    }

    fn create_progress_bar(len: u64) -> ProgressBar {
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {human_pos}/{human_len} ({eta})",
        )
        .unwrap()
        .progress_chars("#>-");
        ProgressBar::new(len).with_style(style)
    }
}
