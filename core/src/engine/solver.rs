//! The negamax search: alpha-beta pruning, null-window iterative deepening, and a
//! transposition-table-backed move-score cache.

use crate::{MoveSorter, Position, TranspositionTable};
use std::collections::HashMap;

/// Which kind of bound a decoded transposition-table value represents.
enum Bound {
    Lower(i8),
    Upper(i8),
}

/// A perfect solver for Connect Four positions.
///
/// Finds the game-theoretic score of any legal, non-terminal position via negamax search with
/// alpha-beta pruning, move ordering, a transposition table, and a null-window binary search
/// over the score to accelerate convergence. See the module-level documentation of
/// [`crate::Position`] for the underlying board representation.
#[derive(Debug)]
pub struct Solver {
    /// Nodes explored (negamax calls) since the last [`Solver::reset`].
    pub node_count: usize,
    transposition_table: TranspositionTable,
    /// An optional preloaded map from position key to exact score, consulted as an early-exit
    /// cache before searching. Loading and populating this map (an opening book) is entirely a
    /// caller concern; the solver only ever reads it.
    book: Option<HashMap<u64, i8>>,
}

impl Solver {
    /// Columns in search order: centre first, then alternating outward. The centre column
    /// participates in the most lines of four and dominates the move-ordering heuristic.
    const COLUMNS: [usize; Position::WIDTH] = const {
        let mut columns = [0; Position::WIDTH];
        let mut i = 0;
        while i < Position::WIDTH {
            columns[i] =
                (Position::WIDTH as i32 / 2 + (1 - 2 * (i as i32 % 2)) * (i as i32 + 1) / 2) as usize;
            i += 1;
        }
        columns
    };

    const MIN_SCORE: i32 = Position::MIN_SCORE as i32;
    const MAX_SCORE: i32 = Position::MAX_SCORE as i32;

    /// Creates a new solver with an empty transposition table and no preloaded book.
    pub fn new() -> Solver {
        Self::default()
    }

    /// Creates a new solver preloaded with a map from position key to exact score, to be
    /// consulted as an early-exit cache before searching.
    pub fn with_book(book: HashMap<u64, i8>) -> Solver {
        Solver {
            node_count: 0,
            transposition_table: TranspositionTable::new(),
            book: Some(book),
        }
    }

    /// Installs (or replaces) the preloaded score map.
    pub fn set_book(&mut self, book: HashMap<u64, i8>) {
        self.book = Some(book);
    }

    /// Clears the solver's state: the node counter and the transposition table. Does not affect
    /// the preloaded book.
    pub fn reset(&mut self) {
        self.node_count = 0;
        self.transposition_table.reset();
    }

    /// Solves a position to find its exact game-theoretic score.
    ///
    /// Assumes `position` is a legal, reachable position. Returns:
    /// - a positive score if the side to move wins: `1` if they win with their very last move,
    ///   `2` with their second-to-last, and so on, so that faster wins score higher;
    /// - `0` if the position is a draw under optimal play;
    /// - a negative score if the side to move loses, symmetrically.
    ///
    /// In `weak` mode, only the sign of the score is computed (`-1`, `0`, or `1`), which is
    /// substantially cheaper since the binary search window starts at `(-1, 1)` instead of the
    /// full score range.
    pub fn solve(&mut self, position: &Position, weak: bool) -> i8 {
        self.node_count = 0;

        if let Some(score) = self.book.as_ref().and_then(|book| book.get(&position.key())).copied() {
            return if weak { score.signum() } else { score };
        }

        // The negamax precondition is that the side to move cannot win immediately; this can be
        // violated at the root (e.g. the caller ignored a forced win), so it is handled here
        // rather than inside negamax itself. Every recursive call below only ever descends into
        // positions reached via `possible_non_losing_moves`, which guarantees the new side to
        // move has no immediate win, so the precondition holds throughout the recursion.
        if position.can_win_next() {
            let win_score = ((Position::BOARD_SIZE + 1 - position.moves()) / 2) as i8;
            return if weak { 1 } else { win_score };
        }

        let (mut min, mut max) = if weak {
            (-1i8, 1i8)
        } else {
            (
                -(((Position::BOARD_SIZE - position.moves()) / 2) as i8),
                (((Position::BOARD_SIZE + 1 - position.moves()) / 2) as i8),
            )
        };

        // Null-window binary search: repeatedly probes whether the true score is above or below
        // `mid`, halving the window each time. The `mid` adjustment below biases probes toward
        // zero, matching the fact that most reachable positions are draws or close to it.
        while min < max {
            let mut mid = min + (max - min) / 2;
            if mid <= 0 && min / 2 < mid {
                mid = min / 2;
            } else if mid >= 0 && max / 2 > mid {
                mid = max / 2;
            }

            let score = self.negamax(position, mid, mid + 1);
            if score <= mid {
                max = score;
            } else {
                min = score;
            }
        }

        min
    }

    /// Scores every possible next move in `position`.
    ///
    /// Returns a fixed-size array indexed by column: `None` if the column is full, otherwise
    /// `Some(score)` where `score` is `solve`'s value of the resulting position, negated and
    /// from the perspective of the player to move in `position` (so a positive entry means that
    /// move wins for them).
    pub fn analyze(&mut self, position: &Position, weak: bool) -> [Option<i8>; Position::WIDTH] {
        let mut scores = [None; Position::WIDTH];

        for col in 0..Position::WIDTH {
            if !position.is_playable(col) {
                continue;
            }

            if position.is_winning_move(col) {
                let win_score = ((Position::BOARD_SIZE + 1 - position.moves()) / 2) as i8;
                scores[col] = Some(if weak { 1 } else { win_score });
                continue;
            }

            let mut next_position = *position;
            next_position.play(col);
            scores[col] = Some(-self.solve(&next_position, weak));
        }

        scores
    }

    /// The negamax search with alpha-beta pruning.
    ///
    /// Precondition: `position` cannot win on this move (`!position.can_win_next()`). Violating
    /// this corrupts the result, since [`Position::possible_non_losing_moves`] (which this
    /// relies on) shares the same precondition.
    fn negamax(&mut self, position: &Position, mut alpha: i8, mut beta: i8) -> i8 {
        debug_assert!(alpha < beta);
        self.node_count += 1;
        log::trace!(
            "negamax depth={} alpha={} beta={} nodes={}",
            Position::BOARD_SIZE - position.moves(),
            alpha,
            beta,
            self.node_count
        );

        let possible_moves = position.possible_non_losing_moves();
        if possible_moves == 0 {
            // Every move hands the opponent an immediate win (or there are none left).
            return -(((Position::BOARD_SIZE - position.moves()) / 2) as i8);
        }

        if position.moves() == Position::BOARD_SIZE {
            return 0;
        }

        // Tighten alpha: we cannot lose on the very next move (`possible_moves` guarantees it).
        let min_bound = -(((Position::BOARD_SIZE - position.moves()) as i32 - 2) / 2) as i8;
        if alpha < min_bound {
            alpha = min_bound;
            if alpha >= beta {
                return alpha;
            }
        }

        // Tighten beta: we cannot win on this move (the precondition rules it out).
        let max_bound = (((Position::BOARD_SIZE - position.moves()) as i32 - 1) / 2) as i8;
        if beta > max_bound {
            beta = max_bound;
            if alpha >= beta {
                return beta;
            }
        }

        let key = position.key();
        match Self::decode_bound(self.transposition_table.get(key)) {
            Some(Bound::Lower(v)) => {
                if alpha < v {
                    alpha = v;
                    if alpha >= beta {
                        return alpha;
                    }
                }
            }
            Some(Bound::Upper(v)) => {
                if beta > v {
                    beta = v;
                    if alpha >= beta {
                        return beta;
                    }
                }
            }
            None => {}
        }

        let mut moves = MoveSorter::new();
        for &col in Self::COLUMNS.iter().rev() {
            let move_bit = possible_moves & Position::column_mask(col);
            if move_bit != 0 {
                moves.add(move_bit, position.score_move(move_bit));
            }
        }

        for move_bit in moves {
            let mut next_position = *position;
            next_position.play_bit(move_bit);

            let score = -self.negamax(&next_position, -beta, -alpha);
            if score >= beta {
                self.transposition_table.put(key, Self::encode_lower(score));
                return score;
            }
            if score > alpha {
                alpha = score;
            }
        }

        self.transposition_table.put(key, Self::encode_upper(alpha));
        alpha
    }

    /// Encodes a lower bound so it is always `> MAX_SCORE - MIN_SCORE + 1` and never 0.
    fn encode_lower(true_lower: i8) -> i8 {
        (true_lower as i32 + Self::MAX_SCORE - 2 * Self::MIN_SCORE + 2) as i8
    }

    /// Encodes an upper bound so it falls in `[1, MAX_SCORE - MIN_SCORE + 1]`, disjoint from the
    /// lower-bound range and never 0.
    fn encode_upper(true_upper: i8) -> i8 {
        (true_upper as i32 - Self::MIN_SCORE + 1) as i8
    }

    /// Decodes a raw transposition-table value (0 meaning "no entry") back into a bound, using
    /// the offset ranges to tell lower from upper.
    fn decode_bound(raw: i8) -> Option<Bound> {
        if raw == 0 {
            return None;
        }

        let threshold = Self::MAX_SCORE - Self::MIN_SCORE + 1;
        if raw as i32 > threshold {
            Some(Bound::Lower((raw as i32 - (Self::MAX_SCORE - 2 * Self::MIN_SCORE + 2)) as i8))
        } else {
            Some(Bound::Upper((raw as i32 + Self::MIN_SCORE - 1) as i8))
        }
    }
}

impl Default for Solver {
    fn default() -> Solver {
        Solver {
            node_count: 0,
            transposition_table: TranspositionTable::new(),
            book: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_encoding_round_trips() {
        for true_lower in Position::MIN_SCORE..=Position::MAX_SCORE {
            let encoded = Solver::encode_lower(true_lower);
            match Solver::decode_bound(encoded) {
                Some(Bound::Lower(v)) => assert_eq!(v, true_lower),
                _ => panic!("expected a lower bound for {true_lower}"),
            }
        }
        for true_upper in Position::MIN_SCORE..=Position::MAX_SCORE {
            let encoded = Solver::encode_upper(true_upper);
            match Solver::decode_bound(encoded) {
                Some(Bound::Upper(v)) => assert_eq!(v, true_upper),
                _ => panic!("expected an upper bound for {true_upper}"),
            }
        }
    }

    #[test]
    fn empty_board_is_a_first_player_win() {
        let mut solver = Solver::new();
        let pos = Position::new();
        assert_eq!(solver.solve(&pos, true), 1);
    }

    #[test]
    fn weak_solve_matches_sign_of_strong_solve() {
        let mut solver = Solver::new();
        for moves in ["1", "11", "121212", "44444"] {
            let pos = Position::from_moves(moves).unwrap();
            if pos.can_win_next() {
                continue;
            }
            let strong = solver.solve(&pos, false);
            let weak = solver.solve(&pos, true);
            assert_eq!(weak, strong.signum(), "mismatch for moves {moves}");
        }
    }

    #[test]
    fn analyze_is_coherent_with_solve() {
        let mut solver = Solver::new();
        let pos = Position::from_moves("33").unwrap();
        let scores = solver.analyze(&pos, false);
        for col in 0..Position::WIDTH {
            if !pos.is_playable(col) {
                assert!(scores[col].is_none());
                continue;
            }
            if pos.is_winning_move(col) {
                continue;
            }
            let mut next = pos;
            next.play(col);
            assert_eq!(scores[col], Some(-solver.solve(&next, false)));
        }
    }

    #[test]
    fn reset_clears_node_count_and_table() {
        let mut solver = Solver::new();
        solver.solve(&Position::from_moves("333").unwrap(), true);
        assert!(solver.node_count > 0);
        solver.reset();
        assert_eq!(solver.node_count, 0);
    }

    #[test]
    fn book_short_circuits_search() {
        let mut book = HashMap::new();
        let pos = Position::from_moves("33").unwrap();
        book.insert(pos.key(), 5);

        let mut solver = Solver::with_book(book);
        assert_eq!(solver.solve(&pos, false), 5);
        assert_eq!(solver.node_count, 0);
        assert_eq!(solver.solve(&pos, true), 1);
    }
}
