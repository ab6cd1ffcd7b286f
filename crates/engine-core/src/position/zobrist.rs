//! Zobrist keys for position hashing.
//!
//! The board's stored hash folds in piece placements plus a fixed key per
//! made move; side to move, en-passant file and castling rights are folded
//! in lazily by `Board::full_hash` right before a table probe. Most moves
//! touch a handful of pieces, and keeping those three contributions out of
//! the incremental hash lets the pawn table reuse the placement part.

use crate::types::{Piece, Square};

pub struct Zobrist {
    /// [piece][square]; `Piece::NONE` rows stay zero.
    pub piece: [[u64; Square::NUM]; Piece::NUM],
    /// [color]
    pub side: [u64; 2],
    /// [en-passant file]
    pub ep: [u64; 8],
    /// [castle rights byte], 6 significant bits.
    pub castling: [u64; 64],
}

/// Folded into the hash on every regular move.
pub const MOVE_KEY: u64 = 0x54ca_3eb5_b5f3_cb5b;
/// Folded into the hash on a null move instead of `MOVE_KEY`.
pub const NULL_MOVE_KEY: u64 = 0x08d9_bc25_bebf_91b1;

const fn xorshift64(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

impl Zobrist {
    const fn init() -> Zobrist {
        let mut keys = Zobrist {
            piece: [[0; Square::NUM]; Piece::NUM],
            side: [0; 2],
            ep: [0; 8],
            castling: [0; 64],
        };

        let mut seed = 0x9e37_79b9_7f4a_7c15u64;

        // Pieces; index 0 is Piece::NONE and index 1 is unused, both stay
        // zero so that xoring a vacant square is a no-op.
        let mut pc = 2;
        while pc < Piece::NUM {
            let mut sq = 0;
            while sq < Square::NUM {
                seed = xorshift64(seed);
                keys.piece[pc][sq] = seed;
                sq += 1;
            }
            pc += 1;
        }

        // The two side keys differ by exactly MOVE_KEY: every make folds
        // MOVE_KEY in and flips the side, so a position reached by any
        // number of moves hashes the same as the position loaded directly
        // from its FEN.
        keys.side[0] = MOVE_KEY;
        keys.side[1] = 0;

        let mut f = 0;
        while f < 8 {
            seed = xorshift64(seed);
            keys.ep[f] = seed;
            f += 1;
        }

        // Rights byte 0 keeps hash parity with positions that never had
        // castling rights.
        let mut r = 1;
        while r < 64 {
            seed = xorshift64(seed);
            keys.castling[r] = seed;
            r += 1;
        }

        keys
    }
}

pub static ZOBRIST: Zobrist = Zobrist::init();

#[inline]
pub fn piece_key(piece: Piece, sq: Square) -> u64 {
    ZOBRIST.piece[piece.index()][sq.index()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn keys_are_distinct_and_nonzero() {
        assert_ne!(ZOBRIST.side[0], ZOBRIST.side[1]);
        assert_ne!(piece_key(Piece::W_PAWN, Square::E2), 0);
        assert_ne!(
            piece_key(Piece::W_PAWN, Square::E2),
            piece_key(Piece::W_PAWN, Square::E4)
        );
        assert_ne!(
            piece_key(Piece::W_PAWN, Square::E2),
            piece_key(Piece::B_PAWN, Square::E2)
        );
    }

    #[test]
    fn none_piece_never_hashes() {
        for sq in Square::iter() {
            assert_eq!(piece_key(Piece::NONE, sq), 0);
        }
    }

    #[test]
    fn xor_involution() {
        let a = piece_key(Piece::new(Color::White, crate::types::PieceType::Queen), Square::D1);
        let b = piece_key(Piece::new(Color::Black, crate::types::PieceType::Queen), Square::D8);
        assert_eq!(a ^ b ^ b, a);
    }
}
