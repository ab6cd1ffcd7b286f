//! Board state integrity: make/unmake involution, hashing, draw rules.

use engine_core::{
    Board, Color, GenMode, Material, Move, MoveList, Piece, PieceType, Score, Square,
};

const FENS: [&str; 5] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
];

/// Everything observable about a board, for byte-for-byte comparison
/// around make/unmake.
#[derive(PartialEq, Eq, Debug)]
struct Snapshot {
    fen: String,
    hash: u64,
    full_hash: u64,
    material: [i32; 2],
    score: [Score; 2],
    check_givers: u64,
    blockers: [u64; 2],
    all: u64,
    ep: Option<Square>,
    fifty: u8,
    rights: u8,
    move_count: u32,
}

fn snapshot(board: &Board) -> Snapshot {
    Snapshot {
        fen: board.to_fen(),
        hash: board.hash(),
        full_hash: board.full_hash(),
        material: [
            board.material(Color::Black),
            board.material(Color::White),
        ],
        score: [
            board.score_of(Color::Black),
            board.score_of(Color::White),
        ],
        check_givers: board.check_givers().0,
        blockers: [
            board.check_blockers(Color::Black).0,
            board.check_blockers(Color::White).0,
        ],
        all: board.all_pieces().0,
        ep: board.ep(),
        fifty: board.fifty_rule(),
        rights: board.castle_rights(),
        move_count: board.move_count(),
    }
}

fn check_invariants(board: &Board) {
    // One king each, bitboards consistent with the square array.
    assert_eq!(board.by_piece(Piece::W_KING).count(), 1);
    assert_eq!(board.by_piece(Piece::B_KING).count(), 1);
    assert_eq!(
        (board.by_color(Color::White) & board.by_color(Color::Black)).0,
        0
    );

    let mut material = [0i32; 2];
    for sq in Square::iter() {
        let piece = board.piece_on(sq);
        if piece.is_none() {
            assert!(!board.all_pieces().test(sq), "ghost piece on {sq}");
        } else {
            assert!(board.by_piece(piece).test(sq), "missing bit for {sq}");
            material[piece.color().index()] += Material::of(piece.piece_type());
        }
    }
    assert_eq!(material[0], board.material(Color::Black));
    assert_eq!(material[1], board.material(Color::White));
}

#[test]
fn make_unmake_restores_everything() {
    for fen in FENS {
        let mut board = Board::from_fen(fen).unwrap();
        let before = snapshot(&board);

        let mut moves = MoveList::new();
        board.generate_moves(GenMode::All, &mut moves);

        for m in moves.iter().collect::<Vec<Move>>() {
            if !board.is_legal(m) {
                continue;
            }
            board.make_move(m);
            check_invariants(&board);
            board.unmake_move(m);

            assert_eq!(snapshot(&board), before, "after {m} in {fen}");
        }
    }
}

/// A deterministic pseudo-random walk with deep unmake at the end.
#[test]
fn long_walks_unwind_cleanly() {
    let mut seed = 0x2545_f491_4f6c_dd1du64;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };

    for fen in FENS {
        let mut board = Board::from_fen(fen).unwrap();
        let before = snapshot(&board);
        let mut played = Vec::new();

        for _ in 0..60 {
            let mut moves = MoveList::new();
            board.generate_moves(GenMode::All, &mut moves);
            let legal: Vec<Move> = moves.iter().filter(|m| board.is_legal(*m)).collect();
            if legal.is_empty() || board.is_draw(0) {
                break;
            }

            let m = legal[(next() % legal.len() as u64) as usize];
            board.make_move(m);
            played.push(m);
            check_invariants(&board);
        }

        for m in played.into_iter().rev() {
            board.unmake_move(m);
        }
        assert_eq!(snapshot(&board), before, "walk from {fen}");
    }
}

#[test]
fn zobrist_consistency_with_fresh_load() {
    // Odd- and even-length sequences must both agree with a direct FEN
    // load of the resulting position.
    let lines: [&[&str]; 3] = [
        &["e2e4"],
        &["e2e4", "c7c5", "g1f3"],
        &["d2d4", "d7d5", "c2c4", "e7e6", "b1c3", "g8f6"],
    ];

    for line in lines {
        let mut board = Board::initial_position();
        for text in line {
            let m = board.move_from_str(text).unwrap();
            board.make_move(m);
        }

        let reloaded = Board::from_fen(&board.to_fen()).unwrap();
        assert_eq!(
            board.full_hash(),
            reloaded.full_hash(),
            "hash mismatch after {line:?}"
        );
    }
}

#[test]
fn repetition_detection() {
    let mut board = Board::initial_position();
    let cycle = ["g1f3", "g8f6", "f3g1", "f6g8"];

    let mut play_cycle = |board: &mut Board| {
        for text in cycle {
            let m = board.move_from_str(text).unwrap();
            board.make_move(m);
        }
    };

    // The bounded backscan needs more than one cycle before it can see a
    // repetition at all.
    play_cycle(&mut board);
    assert!(!board.is_draw(0));
    assert!(!board.is_draw(1));

    // After the second cycle the search-level rule (any repetition)
    // fires, the game-level threefold does not yet.
    play_cycle(&mut board);
    assert!(board.is_draw(1));
    assert!(!board.is_draw(0));

    // The third pass through the position completes the threefold.
    play_cycle(&mut board);
    assert!(board.is_draw(0));
}

#[test]
fn fifty_rule_draw() {
    let mut board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80").unwrap();
    assert!(!board.is_draw(0));

    let m = board.move_from_str("a1a2").unwrap();
    board.make_move(m);
    assert!(board.fifty_rule() >= 100);
    assert!(board.is_draw(0));

    // A pawn move or capture resets the counter instead.
    let mut board = Board::from_fen("4k3/8/8/8/8/8/P7/R3K3 w - - 99 80").unwrap();
    let m = board.move_from_str("a2a3").unwrap();
    board.make_move(m);
    assert_eq!(board.fifty_rule(), 0);
    assert!(!board.is_draw(0));
}

#[test]
fn insufficient_material() {
    assert!(Board::from_fen("4k3/8/8/8/8/8/8/4KN2 w - - 0 1")
        .unwrap()
        .is_draw(0));
    assert!(Board::from_fen("4kb2/8/8/8/8/8/8/4K3 w - - 0 1")
        .unwrap()
        .is_draw(0));
    // A rook is mating material.
    assert!(!Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1")
        .unwrap()
        .is_draw(0));
    // Pawns always count.
    assert!(!Board::from_fen("4k3/8/8/8/8/8/P7/4K3 w - - 0 1")
        .unwrap()
        .is_draw(0));
}

#[test]
fn en_passant_round_trip() {
    let mut board = Board::initial_position();
    for text in ["e2e4", "a7a6", "e4e5", "d7d5"] {
        let m = board.move_from_str(text).unwrap();
        board.make_move(m);
    }
    assert_eq!(board.ep(), Some(Square::D6));

    let before = snapshot(&board);
    let ep = board.move_from_str("e5d6").unwrap();
    board.make_move(ep);
    assert!(board.piece_on(Square::D5).is_none(), "captured pawn gone");
    assert_eq!(board.piece_on(Square::D6).piece_type(), PieceType::Pawn);
    board.unmake_move(ep);
    assert_eq!(snapshot(&board), before);
}

#[test]
fn castling_round_trip() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let mut board = Board::from_fen(fen).unwrap();
    let before = snapshot(&board);

    for text in ["0-0", "0-0-0"] {
        let m = board.move_from_str(text).unwrap();
        board.make_move(m);
        // The rook jumped to its castled square.
        let rook_sq = if text == "0-0" { Square::F1 } else { Square::D1 };
        assert_eq!(board.piece_on(rook_sq), Piece::W_ROOK);
        board.unmake_move(m);
        assert_eq!(snapshot(&board), before, "after {text}");
    }
}
