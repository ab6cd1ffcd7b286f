//! Static evaluation.
//!
//! The evaluator routes through specialised paths before the general one:
//! pure pawn endgames, a table of drawish piece configurations, and
//! bare-king endings (with a dedicated KBNK herding term). The general
//! path combines the incrementally kept piece-square score with the
//! cached pawn-structure terms, passed-pawn interaction bonuses and the
//! bishop pair, then collapses the tapered score by remaining material.

pub mod params;
mod pawns;

pub use pawns::{PawnEntry, PawnHashTable};

use crate::bitboard::{tables, Bitboard};
use crate::position::Board;
use crate::search::SURE_WIN;
use crate::types::{Color, Direction, Material, Piece, PieceType, Rank, Score, Square, Value};

/// Evaluates the position from the side-to-move's perspective, in
/// centipawns, tempo included.
pub fn eval(board: &Board, pawn_table: &mut PawnHashTable) -> Value {
    let sign = match board.side() {
        Color::White => 1,
        Color::Black => -1,
    };

    // Specialised endgames first.

    if !board.has_non_pawns(Color::White) && !board.has_non_pawns(Color::Black) {
        let result = eval_pawn_endgame(board, pawn_table, Color::White)
            - eval_pawn_endgame(board, pawn_table, Color::Black);
        return sign * result + params::TEMPO.eg as Value;
    }

    if is_drawish_endgame(board) {
        return 0;
    }

    if board.material(Color::White) == 0 || board.material(Color::Black) == 0 {
        return eval_sole_king_vs_pieces(board);
    }

    // General evaluation.

    let score = eval_side(board, pawn_table, Color::White)
        - eval_side(board, pawn_table, Color::Black);

    let material = Material::new(board.material(Color::White) + board.material(Color::Black));
    sign * score.collapse(material) + params::TEMPO.collapse(material)
}

// =============================================================================
// Drawish endgame classifier
// =============================================================================

/// Piece configurations (no pawns, total material counter <= 9) that are
/// book draws or dead drawish in practice.
fn is_drawish_endgame(board: &Board) -> bool {
    let w_mat = board.material(Color::White);
    let b_mat = board.material(Color::Black);
    if w_mat + b_mat > 9 {
        return false;
    }

    if board.by_piece_type(PieceType::Pawn).is_not_empty() {
        return false;
    }

    if w_mat > b_mat {
        is_drawish_for(board, Color::White, w_mat, b_mat)
    } else {
        is_drawish_for(board, Color::Black, b_mat, w_mat)
    }
}

fn is_drawish_for(board: &Board, strong: Color, strong_mat: Value, weak_mat: Value) -> bool {
    let weak = strong.opposite();

    match strong_mat + weak_mat {
        // A lone minor piece cannot mate.
        3 => true,
        6 => {
            if strong_mat == 3 {
                // Minor piece versus minor piece.
                true
            } else {
                // Two minors versus a bare king: drawn for two knights or
                // a same-colored bishop pair. Bishop plus knight mates and
                // falls through to the dedicated endgame evaluator.
                board.bishops(strong).is_empty()
                    || (board.knights(strong).is_empty()
                        && board.has_only_same_colored_bishops(strong))
            }
        }
        9 => {
            // Two minors versus one: winning chances only with the bishop
            // pair against a lone bishop.
            strong_mat == 6
                && (board.knights(strong).is_not_empty()
                    || board.bishops(weak).is_empty()
                    || board.has_only_same_colored_bishops(strong))
        }
        _ => false,
    }
}

// =============================================================================
// Bare-king endgames
// =============================================================================

/// KBNK herding term: king-king tropism against the defender's distance to
/// the mating corners of the bishop's color.
fn eval_kbnk(board: &Board, strong: Color) -> Value {
    let enemy_king = board.king(strong.opposite());
    let king_king_tropism = Square::distance(enemy_king, board.king(strong)) as Value;

    let (corner1, corner2) = if (board.bishops(strong)
        & Bitboard::from_square_color(Color::White))
    .is_not_empty()
    {
        (Square::A8, Square::H1)
    } else {
        (Square::H8, Square::A1)
    };

    let corner_distance = Square::distance(corner1, enemy_king)
        .min(Square::distance(corner2, enemy_king)) as Value;

    king_king_tropism - corner_distance * 5
}

/// One side has a bare king; the other carries mating material.
/// Returns the value from the side-to-move's perspective.
fn eval_sole_king_vs_pieces(board: &Board) -> Value {
    let result = if board.material(Color::White) == 0 {
        if board.material(Color::Black) == 6
            && board.by_piece(Piece::B_BISHOP).is_not_empty()
            && board.by_piece(Piece::B_KNIGHT).is_not_empty()
        {
            -SURE_WIN + eval_kbnk(board, Color::Black)
        } else {
            -params::KING_PUSH_TO_CORNER[board.king(Color::White).index()] - SURE_WIN
        }
    } else if board.material(Color::White) == 6
        && board.by_piece(Piece::W_BISHOP).is_not_empty()
        && board.by_piece(Piece::W_KNIGHT).is_not_empty()
    {
        SURE_WIN - eval_kbnk(board, Color::White)
    } else {
        params::KING_PUSH_TO_CORNER[board.king(Color::Black).index()] + SURE_WIN
    };

    match board.side() {
        Color::White => result,
        Color::Black => -result,
    }
}

// =============================================================================
// Pawn endgame
// =============================================================================

/// One side's endgame score when only kings and pawns remain.
fn eval_pawn_endgame(board: &Board, pawn_table: &mut PawnHashTable, side: Color) -> Value {
    let mut result = board.score_of(side).eg as Value;
    let enemy_king_sq = board.king(side.opposite());
    let our_king_sq = board.king(side);

    let entry = pawn_table.get_or_scan(board);
    result += entry.pawn_evaluation[side.index()].eg as Value;

    let pawns = entry.pawns[side.index()];
    let passed = entry.passed & pawns;

    for sq in pawns.iter() {
        if passed.test(sq) {
            // Rule of the square: an uncatchable passer is close to a new
            // queen.
            let promotion_sq = Square::new(sq.file(), Rank::relative(side, Rank::R8));
            let enemy_to_move = board.side() != side;
            let pawn_distance = Square::distance(sq, promotion_sq).min(5) as i32;
            let king_distance =
                Square::distance(enemy_king_sq, promotion_sq) as i32 - enemy_to_move as i32;
            if pawn_distance < king_distance {
                result += params::SQUARE_RULE_PASSED;
            }

            result += params::KING_PASSED_TROPISM
                * Square::manhattan_closedness(our_king_sq, sq) as Value;
            result -= params::KING_PASSED_TROPISM
                * Square::manhattan_closedness(enemy_king_sq, sq) as Value;
        } else {
            result += params::KING_PAWN_TROPISM
                * Square::manhattan_closedness(our_king_sq, sq) as Value;
            result -= params::KING_PAWN_TROPISM
                * Square::manhattan_closedness(enemy_king_sq, sq) as Value;
        }
    }

    result
}

// =============================================================================
// General evaluation
// =============================================================================

fn eval_side(board: &Board, pawn_table: &mut PawnHashTable, side: Color) -> Score {
    let opponent = side.opposite();
    let up = Direction::relative(side, Direction::Up);
    let down = Direction::relative(side, Direction::Down);

    let mut result = board.score_of(side);
    let occ = board.all_pieces();

    // Pawns: the purely structural part is cached.

    let entry = pawn_table.get_or_scan(board);
    result += entry.pawn_evaluation[side.index()];

    let passed = entry.passed & entry.pawns[side.index()];
    for sq in passed.iter() {
        // A rook supporting the passer from behind.
        let rooks_behind = board.rooks(side) & tables::ray(sq, down);
        if rooks_behind.is_not_empty() {
            let rook_sq = match side {
                Color::White => rooks_behind.msb(),
                Color::Black => rooks_behind.lsb(),
            };
            let interior =
                occ & tables::between(sq, rook_sq) & !Bitboard::from_square(rook_sq);
            if interior.is_empty() {
                result += params::ROOK_BEHIND_PASSED_PAWN;
            }
        }

        // An enemy minor piece parked on the stop square.
        let blockader = board.piece_on(sq.shift(up));
        if blockader == Piece::new(opponent, PieceType::Knight)
            || blockader == Piece::new(opponent, PieceType::Bishop)
        {
            result += params::MINOR_PASSED_BLOCKED;
        }
    }

    // Bishop pair on both color complexes.

    if board.has_different_colored_bishops(side) {
        result += params::BISHOP_PAIR;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_fen(fen: &str) -> Value {
        let board = Board::from_fen(fen).unwrap();
        let mut table = PawnHashTable::new();
        eval(&board, &mut table)
    }

    /// Mirrors the position vertically and swaps the colors.
    fn mirror_fen(fen: &str) -> String {
        let mut parts = fen.split_whitespace();
        let placement = parts.next().unwrap();
        let side = parts.next().unwrap();
        let castling: String = parts.next().unwrap().to_string();
        let rest: Vec<&str> = parts.collect();

        let mirrored_placement: Vec<String> = placement
            .split('/')
            .rev()
            .map(|rank| {
                rank.chars()
                    .map(|ch| {
                        if ch.is_ascii_alphabetic() {
                            if ch.is_ascii_uppercase() {
                                ch.to_ascii_lowercase()
                            } else {
                                ch.to_ascii_uppercase()
                            }
                        } else {
                            ch
                        }
                    })
                    .collect()
            })
            .collect();

        let mirrored_side = if side == "w" { "b" } else { "w" };
        let mirrored_castling: String = if castling == "-" {
            castling
        } else {
            let mut swapped: Vec<char> = castling
                .chars()
                .map(|ch| {
                    if ch.is_ascii_uppercase() {
                        ch.to_ascii_lowercase()
                    } else {
                        ch.to_ascii_uppercase()
                    }
                })
                .collect();
            swapped.sort_by_key(|ch| (ch.is_ascii_lowercase(), *ch));
            swapped.into_iter().collect()
        };

        let mut result = format!(
            "{} {} {}",
            mirrored_placement.join("/"),
            mirrored_side,
            mirrored_castling
        );
        for (i, field) in rest.iter().enumerate() {
            result.push(' ');
            // The en-passant square mirrors its rank.
            if i == 0 && *field != "-" {
                let mut chars = field.chars();
                let file = chars.next().unwrap();
                let rank = chars.next().unwrap();
                let mirrored_rank = (b'9' - (rank as u8 - b'0')) as char;
                result.push(file);
                result.push(mirrored_rank);
            } else {
                result.push_str(field);
            }
        }
        result
    }

    #[test]
    fn symmetric_under_color_swap() {
        let fens = [
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "4k3/p7/8/4P3/8/8/8/4K3 w - - 0 1",
        ];
        for fen in fens {
            let mirrored = mirror_fen(fen);
            assert_eq!(
                eval_fen(fen),
                eval_fen(&mirrored),
                "eval asymmetry between {fen} and {mirrored}"
            );
        }
    }

    #[test]
    fn drawish_endgames_evaluate_to_zero() {
        // King and knight versus bare king.
        assert_eq!(eval_fen("4k3/8/8/8/8/8/8/4KN2 w - - 0 1"), 0);
        // Knight versus knight.
        assert_eq!(eval_fen("4k3/5n2/8/8/8/8/8/4KN2 w - - 0 1"), 0);
        // Two knights versus bare king.
        assert_eq!(eval_fen("4k3/8/8/8/8/8/8/3NKN2 w - - 0 1"), 0);
    }

    #[test]
    fn bare_king_down_heavy_material_is_lost() {
        // White has king + rook versus bare king: huge positive score.
        let value = eval_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert!(value > SURE_WIN / 2, "got {value}");

        // From the weak side's point of view the value flips.
        let value = eval_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 1");
        assert!(value < -SURE_WIN / 2, "got {value}");
    }

    #[test]
    fn material_advantage_shows_up() {
        // White is a queen up.
        let value = eval_fen("3qk3/8/8/8/8/8/3Q4/3QK3 w - - 0 1");
        assert!(value > 500, "got {value}");
    }

    #[test]
    fn tempo_breaks_exact_symmetry_of_sides() {
        // In a mirrored position both sides evaluate identically, so the
        // value equals the tempo bonus alone.
        let board = Board::initial_position();
        let mut table = PawnHashTable::new();
        let value = eval(&board, &mut table);
        let material =
            Material::new(board.material(Color::White) + board.material(Color::Black));
        assert_eq!(value, params::TEMPO.collapse(material));
    }

    #[test]
    fn square_rule_rewards_unstoppable_passer() {
        // White pawn on b6, kings far away: the black king cannot catch it.
        let unstoppable = eval_fen("8/8/1P6/8/8/7k/8/6K1 w - - 0 1");
        // Same structure, black king adjacent to the promotion path.
        let stoppable = eval_fen("1k6/8/1P6/8/8/8/8/6K1 w - - 0 1");
        assert!(
            unstoppable > stoppable + params::SQUARE_RULE_PASSED / 2,
            "{unstoppable} vs {stoppable}"
        );
    }
}
