//! A high-performance perfect solver for the game of Connect Four.
//!
//! Given a legal, non-terminal position, [`Solver::solve`] returns the
//! game-theoretic value under optimal play: positive if the side to move
//! wins, negative if they lose, zero for a draw. The magnitude encodes how
//! quickly the result is forced. [`Solver::analyze`] breaks this down
//! per-column.
//!
//! The crate has no I/O and no dependency that can fail: a [`Position`] is a
//! plain-old-data bitboard pair, cloned freely during search, and the
//! [`TranspositionTable`] is a fixed-size, always-replace cache with no
//! allocation on the hot path after construction.

mod board;
mod engine;

pub use board::{Position, PositionParsingError};
pub use engine::{MoveEntry, MoveSorter, Solver, TranspositionTable};
