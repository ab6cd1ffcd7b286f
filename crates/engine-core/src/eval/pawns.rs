//! Pawn-structure cache.
//!
//! A small open-addressed table keyed by the two pawn bitboards. Entries
//! carry everything the evaluator wants to know about pawns alone, so the
//! full scan runs only when the pawn structure actually changed. There is
//! no eviction policy: a colliding structure simply overwrites.

use crate::bitboard::{tables, Bitboard};
use crate::position::Board;
use crate::types::{Color, Direction, File, Rank, Score};

use super::params;

const TABLE_SIZE_LOG2: u32 = 12;
const TABLE_SIZE: usize = 1 << TABLE_SIZE_LOG2;

/// Cached pawn facts for one pawn structure.
#[derive(Clone)]
pub struct PawnEntry {
    /// The structure this entry was computed for, for verification.
    pub pawns: [Bitboard; Color::NUM],
    pub passed: Bitboard,
    pub isolated: Bitboard,
    pub doubled: Bitboard,
    pub backward: Bitboard,
    /// [side][file + 1]: highest relative rank per file, with a sentinel
    /// file on each edge so neighbour lookups need no bounds checks.
    pub most_advanced: [[Rank; File::NUM + 2]; Color::NUM],
    /// Pawn-only tapered score per side.
    pub pawn_evaluation: [Score; Color::NUM],
    pub islands_count: [u8; Color::NUM],
    pub distortion: [u8; Color::NUM],
}

impl Default for PawnEntry {
    fn default() -> Self {
        PawnEntry {
            pawns: [Bitboard::EMPTY; Color::NUM],
            passed: Bitboard::EMPTY,
            isolated: Bitboard::EMPTY,
            doubled: Bitboard::EMPTY,
            backward: Bitboard::EMPTY,
            most_advanced: [[Rank::R1; File::NUM + 2]; Color::NUM],
            pawn_evaluation: [Score::ZERO; Color::NUM],
            islands_count: [0; Color::NUM],
            distortion: [0; Color::NUM],
        }
    }
}

pub struct PawnHashTable {
    table: Box<[PawnEntry]>,
}

impl Default for PawnHashTable {
    fn default() -> Self {
        PawnHashTable::new()
    }
}

impl PawnHashTable {
    pub fn new() -> PawnHashTable {
        PawnHashTable {
            table: vec![PawnEntry::default(); TABLE_SIZE].into_boxed_slice(),
        }
    }

    pub fn reset(&mut self) {
        for entry in self.table.iter_mut() {
            *entry = PawnEntry::default();
        }
    }

    /// Returns the cached entry for the board's pawn structure, scanning
    /// it fresh on a miss.
    pub fn get_or_scan(&mut self, board: &Board) -> &PawnEntry {
        let wpawns = board.pawns(Color::White);
        let bpawns = board.pawns(Color::Black);

        // Pawns never stand on the back ranks, so only 48 bits carry
        // information.
        let mut hash = (wpawns ^ bpawns).0 >> 8;
        hash ^= (hash >> TABLE_SIZE_LOG2)
            ^ (hash >> (TABLE_SIZE_LOG2 * 2))
            ^ (hash >> (TABLE_SIZE_LOG2 * 3));
        let index = (hash as usize) & (TABLE_SIZE - 1);

        let hit = {
            let entry = &self.table[index];
            entry.pawns[Color::White.index()] == wpawns
                && entry.pawns[Color::Black.index()] == bpawns
        };

        if !hit {
            let entry = &mut self.table[index];
            *entry = PawnEntry::default();
            entry.pawns[Color::White.index()] = wpawns;
            entry.pawns[Color::Black.index()] = bpawns;

            Self::scan_pawns(board, entry, Color::White);
            Self::scan_pawns(board, entry, Color::Black);
        }

        &self.table[index]
    }

    fn scan_pawns(board: &Board, entry: &mut PawnEntry, side: Color) {
        let opponent = side.opposite();
        let up = Direction::relative(side, Direction::Up);

        let pawns = board.pawns(side);
        let enemy_pawns = board.pawns(opponent);
        let our_pawn_attacks = pawns.pawn_attacked_squares(side);

        let mut evaluation = Score::ZERO;

        for sq in pawns.iter() {
            let file = sq.file();
            let rel_rank = Rank::relative(side, sq.rank());

            let slot = &mut entry.most_advanced[side.index()][file.index() + 1];
            if rel_rank > *slot {
                *slot = rel_rank;
            }

            // Islands are counted at their rightmost file; inside an island
            // the rank gap to the next file accumulates as distortion.
            if file == File::H
                || (Bitboard::from_file(File::from_index(file.index() + 1)) & pawns).is_empty()
            {
                entry.islands_count[side.index()] += 1;
            } else {
                let next_file_pawns =
                    Bitboard::from_file(File::from_index(file.index() + 1)) & pawns;
                let gap = (next_file_pawns.lsb().rank().index() as i32
                    - sq.rank().index() as i32)
                    .abs()
                    - 1;
                entry.distortion[side.index()] += gap.max(0) as u8;
            }

            if our_pawn_attacks.test(sq) {
                evaluation += params::DEFENDED_PAWN[rel_rank.index()];
            }

            if (tables::three_files_forward(side, sq) & enemy_pawns).is_empty()
                && (tables::ray(sq, up) & pawns).is_empty()
            {
                evaluation += params::PASSED_PAWN[rel_rank.index()];
                entry.passed.set(sq);
            }

            if (tables::adjacent_files(file) & pawns).is_empty() {
                evaluation += params::ISOLATED_PAWN;
                entry.isolated.set(sq);
            }

            if (tables::ray(sq, up) & pawns).is_not_empty() {
                evaluation += params::DOUBLE_PAWN;
                entry.doubled.set(sq);
            }

            // Backward: no own pawn can ever defend the stop square, and
            // advancing onto it walks into an enemy pawn attack.
            if (tables::adjacent_files_forward(opponent, sq.shift(up)) & pawns).is_empty()
                && (tables::pawn_attacks(side, sq.shift(up)) & enemy_pawns).is_not_empty()
            {
                evaluation += params::BACKWARD_PAWN;
                entry.backward.set(sq);
            }
        }

        // Every pawn ending an island run counts, so doubled pawns weigh
        // their island twice; clamp to the table.
        evaluation +=
            params::PAWN_ISLANDS[(entry.islands_count[side.index()] as usize).min(4)];
        evaluation += params::PAWN_DISTORTION * entry.distortion[side.index()] as i16;

        entry.pawn_evaluation[side.index()] = evaluation;
    }
}
