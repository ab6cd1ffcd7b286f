//! Evaluation weights.
//!
//! All weights are tapered [`Score`] pairs unless a term only ever applies
//! in one game phase. The piece-square tables are stored as half-board
//! templates (files a-d, ranks from the owner's back rank) and expanded at
//! first use with the piece values folded in.

use once_cell::sync::Lazy;

use crate::types::{Color, Piece, PieceType, Rank, Score, Square, Value};

const fn s(mg: i16, eg: i16) -> Score {
    Score::new(mg, eg)
}

const Z: Score = Score::ZERO;

pub const TEMPO: Score = s(15, 3);

// =============================================================================
// Pawn structure
// =============================================================================

/// [number of pawn islands]; a pawn island is a maximal run of occupied
/// adjacent files.
pub const PAWN_ISLANDS: [Score; 5] = [Z, Z, s(-3, -3), s(-21, -16), s(-34, -32)];

/// [relative rank] for a pawn defended by another pawn.
pub const DEFENDED_PAWN: [Score; Rank::NUM] = [
    Z,
    Z,
    s(3, 5),
    s(7, 8),
    s(13, 15),
    s(19, 23),
    s(28, 36),
    Z,
];

pub const ISOLATED_PAWN: Score = s(-7, -5);

/// A pawn that cannot be protected by its own pawns and cannot safely
/// advance.
pub const BACKWARD_PAWN: Score = s(-9, -9);

pub const DOUBLE_PAWN: Score = s(-10, -23);

/// Per unit of rank gap between pawns on adjacent files.
pub const PAWN_DISTORTION: Score = s(-1, -2);

/// [relative rank] bonus for a passed pawn.
pub const PASSED_PAWN: [Score; Rank::NUM] = [
    Z,
    s(15, 25),
    s(22, 30),
    s(30, 35),
    s(42, 48),
    s(55, 65),
    s(75, 95),
    Z,
];

pub const ROOK_BEHIND_PASSED_PAWN: Score = s(12, 28);

/// A passed pawn blockaded by an enemy minor piece.
pub const MINOR_PASSED_BLOCKED: Score = s(-14, -27);

// =============================================================================
// Pieces
// =============================================================================

pub const BISHOP_PAIR: Score = s(35, 20);

// =============================================================================
// Pawn endgames and bare-king endgames
// =============================================================================

/// A passed pawn the defending king can no longer catch.
pub const SQUARE_RULE_PASSED: Value = 200;

/// Factor for the king being near a passed pawn in a pawn endgame.
pub const KING_PASSED_TROPISM: Value = 5;

/// Factor for the king being close to any pawn in a pawn endgame.
pub const KING_PAWN_TROPISM: Value = 2;

/// Driving the lone king toward a corner when the attacker has mating
/// material.
pub const KING_PUSH_TO_CORNER: [Value; Square::NUM] = [
    100, 90, 80, 70, 70, 80, 90, 100, //
    90, 60, 50, 40, 40, 50, 60, 90, //
    80, 50, 30, 20, 20, 30, 50, 80, //
    70, 40, 20, 10, 10, 20, 40, 70, //
    70, 40, 20, 10, 10, 20, 40, 70, //
    80, 50, 30, 20, 20, 30, 50, 80, //
    90, 60, 50, 40, 40, 50, 60, 90, //
    100, 90, 80, 70, 70, 80, 90, 100,
];

// =============================================================================
// Piece values and piece-square tables
// =============================================================================

pub const PIECE_VALUE: [Score; PieceType::NUM] = [
    Z,
    s(100, 130),  // pawn
    s(320, 360),  // knight
    s(350, 390),  // bishop
    s(550, 650),  // rook
    s(1050, 1150), // queen
    Z,
];

/// Always-positive single value per piece kind, the midpoint of the
/// middlegame and endgame piece values. Used by SEE and move ordering.
#[inline]
pub const fn simplified_value(pt: PieceType) -> Value {
    let score = PIECE_VALUE[pt.index()];
    ((score.mg as Value) + (score.eg as Value)) / 2
}

/// Half-board PST templates: 8 ranks from the owner's back rank, files a-d
/// only; the e-h files mirror them. Without the piece values, which
/// `build_pst` folds in.
const PST_TEMPLATE: [[Score; 32]; PieceType::NUM] = [
    [Z; 32],
    // Pawn (rank 7 entries are large: one step from promotion)
    [
        Z, Z, Z, Z, //
        s(20, 40), s(20, 45), s(16, 45), s(25, 45), //
        s(11, 25), s(10, 25), s(10, 25), s(18, 25), //
        s(3, 15), s(2, 15), s(6, 15), s(15, 15), //
        s(0, 10), s(0, 10), s(4, 10), s(12, 10), //
        s(3, 5), s(4, 5), s(-4, 5), s(0, 5), //
        s(-2, 0), s(-3, 0), s(4, 0), s(-12, 0), //
        Z, Z, Z, Z,
    ],
    // Knight
    [
        s(-65, -40), s(-40, -20), s(-22, -20), s(-15, -15), //
        s(-45, -30), s(-15, -9), s(7, 2), s(10, 5), //
        s(-20, -14), s(3, 2), s(15, 10), s(26, 17), //
        s(-12, -8), s(10, 5), s(24, 15), s(40, 23), //
        s(-15, -10), s(5, 5), s(20, 15), s(36, 23), //
        s(-30, -20), s(0, 2), s(12, 10), s(23, 17), //
        s(-45, -30), s(-16, -9), s(2, 2), s(8, 5), //
        s(-60, -40), s(-25, -20), s(-22, -20), s(-25, -15),
    ],
    // Bishop
    [
        s(-15, -20), s(-14, -15), s(-9, -10), s(-15, -10), //
        s(-10, -15), s(5, 10), s(2, 5), s(-2, 0), //
        s(-5, -10), s(7, 5), s(5, 10), s(8, 5), //
        s(0, -10), s(-5, 0), s(10, 5), s(15, 10), //
        s(0, -10), s(-5, 0), s(10, 5), s(15, 10), //
        s(10, -10), s(5, 5), s(5, 10), s(9, 5), //
        s(5, -15), s(20, 10), s(3, 5), s(0, 0), //
        s(-5, -20), s(-12, -15), s(1, -10), s(-10, -10),
    ],
    // Rook
    [
        s(-12, -1), s(-10, 0), s(-4, 0), s(-1, 0), //
        s(-8, 0), s(4, 0), s(5, 0), s(5, 0), //
        s(-15, 0), s(-2, 0), s(-5, 0), s(-5, 0), //
        s(-20, 0), s(-5, 0), s(-10, 0), s(-20, 0), //
        s(-20, 0), s(-5, 0), s(-10, 0), s(-20, 0), //
        s(-15, 0), s(-2, 0), s(-5, 0), s(-5, 0), //
        s(-8, 0), s(0, 0), s(1, 0), s(12, 0), //
        s(-10, -1), s(-8, 0), s(2, 0), s(20, 0),
    ],
    // Queen
    [
        s(-8, -20), s(-10, -15), s(-10, -10), s(0, -5), //
        s(0, -15), s(0, -9), s(0, 0), s(10, 0), //
        s(0, -10), s(0, 0), s(0, 5), s(6, 6), //
        s(0, -5), s(0, 3), s(4, 10), s(3, 12), //
        s(0, -5), s(0, 3), s(4, 10), s(4, 12), //
        s(0, -10), s(0, 0), s(0, 5), s(0, 6), //
        s(0, -15), s(0, -9), s(0, 0), s(0, 0), //
        s(-8, -20), s(-8, -15), s(-5, -10), s(0, -5),
    ],
    // King
    [
        s(-70, -60), s(-70, -45), s(-75, -40), s(-80, -35), //
        s(-80, -45), s(-80, -25), s(-85, -20), s(-85, -15), //
        s(-80, -40), s(-80, -20), s(-85, -5), s(-85, 0), //
        s(-70, -35), s(-70, -15), s(-70, 0), s(-70, 10), //
        s(-55, -35), s(-55, -15), s(-60, 0), s(-65, 10), //
        s(-40, -40), s(-45, -20), s(-45, -5), s(-50, 0), //
        s(-5, -45), s(-5, -25), s(-25, -20), s(-30, -15), //
        s(25, -60), s(35, -45), s(7, -40), s(-5, -35),
    ],
];

fn build_pst() -> Box<[[Score; Square::NUM]; Piece::NUM]> {
    let mut pst = Box::new([[Score::ZERO; Square::NUM]; Piece::NUM]);

    for pt in PieceType::PIECES {
        let template = &PST_TEMPLATE[pt.index()];
        let white = Piece::new(Color::White, pt);
        let black = Piece::new(Color::Black, pt);

        for (i, &entry) in template.iter().enumerate() {
            let rank = Rank::from_index(i >> 2);
            let file = crate::types::File::from_index(i & 3);
            // The template rows run from black's viewpoint; white mirrors
            // the rank.
            let sq_black = Square::new(file, rank);
            let sq_white = sq_black.flip_rank();

            let score = entry + PIECE_VALUE[pt.index()];

            pst[white.index()][sq_white.index()] = score;
            pst[white.index()][sq_white.flip_file().index()] = score;
            pst[black.index()][sq_black.index()] = score;
            pst[black.index()][sq_black.flip_file().index()] = score;
        }
    }

    pst
}

static PST: Lazy<Box<[[Score; Square::NUM]; Piece::NUM]>> = Lazy::new(build_pst);

/// The tapered value of `piece` standing on `sq`, piece value included.
#[inline]
pub fn pst(piece: Piece, sq: Square) -> Score {
    PST[piece.index()][sq.index()]
}
