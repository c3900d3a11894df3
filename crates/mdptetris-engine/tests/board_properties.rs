use mdptetris_engine::{BitBoard, BoardConfig, PieceCatalog, PieceGenerator, PieceSeed};

fn assert_invariants(board: &BitBoard) {
    let wall_height = board.wall_height();
    for y in wall_height..board.extended_height() {
        assert_eq!(board.row(y), board.empty_row(), "row {y} above wall height {wall_height}");
    }
    if wall_height > 0 {
        assert_ne!(board.row(wall_height - 1), board.empty_row());
    }
}

#[test]
fn random_play_keeps_board_invariants() {
    let catalog = PieceCatalog::standard();
    let mut board = BitBoard::for_catalog(BoardConfig::default(), &catalog).unwrap();
    let mut generator = PieceGenerator::with_seed(catalog.len(), PieceSeed::from(2024));

    for turn in 0..2000 {
        if board.state().is_overflowed() {
            board.reset();
        }
        let piece = &catalog.pieces()[generator.next_piece()];
        let orientation = &piece.orientations()[turn % piece.num_orientations()];
        let column = (turn * 7) % (board.width() - orientation.width() + 1);

        let before = board.clone();
        board.drop_piece(orientation, column, true).unwrap();
        assert_invariants(&board);

        let after = board.clone();
        board.cancel_last_move().unwrap();
        assert_eq!(board, before);
        assert_invariants(&board);

        board.drop_piece(orientation, column, false).unwrap();
        assert_eq!(board, after);
    }
}

#[test]
fn every_orientation_lands_on_empty_floor() {
    let catalog = PieceCatalog::standard();
    let mut board = BitBoard::for_catalog(BoardConfig::default(), &catalog).unwrap();
    for piece in catalog.pieces() {
        for orientation in piece.orientations() {
            for column in 0..=board.width() - orientation.width() {
                board.reset();
                board.drop_piece(orientation, column, false).unwrap();
                assert_eq!(board.last_drop().unwrap().landing_row, 0);
                assert_eq!(board.wall_height(), orientation.height());
                let cells = board
                    .rows()
                    .iter()
                    .map(|row| row.iter_cells(board.width()).filter(|&c| c).count())
                    .sum::<usize>();
                assert_eq!(cells, orientation.cell_count());
            }
        }
    }
}

#[test]
fn four_turns_return_to_initial_orientation() {
    for catalog in [PieceCatalog::standard(), PieceCatalog::melax()] {
        for piece in catalog.pieces() {
            if piece.num_orientations() == 4 {
                assert_eq!(&piece.orientations()[3].rotated(), &piece.orientations()[0]);
            }
        }
    }
}

#[test]
fn overflow_mode_never_exceeds_height() {
    let catalog = PieceCatalog::melax();
    let config = BoardConfig {
        width: 6,
        height: 2,
        allow_lines_after_overflow: true,
    };
    let mut board = BitBoard::for_catalog(config, &catalog).unwrap();
    let mut generator = PieceGenerator::with_seed(catalog.len(), PieceSeed::from(99));
    let mut trimmed = 0;
    for turn in 0..500 {
        let piece = &catalog.pieces()[generator.next_piece()];
        let orientation = &piece.orientations()[turn % piece.num_orientations()];
        let column = turn % (config.width - orientation.width() + 1);
        trimmed += board.drop_piece_overflow(orientation, column, false).unwrap();
        assert!(board.wall_height() <= config.height);
        assert!(!board.state().is_overflowed());
        assert_invariants(&board);
    }
    assert!(trimmed > 0);
}

#[test]
fn board_json_round_trip_after_play() {
    let catalog = PieceCatalog::standard();
    let mut board = BitBoard::for_catalog(BoardConfig::default(), &catalog).unwrap();
    let mut generator = PieceGenerator::with_seed(catalog.len(), PieceSeed::from(5));
    for turn in 0..15 {
        let piece = &catalog.pieces()[generator.next_piece()];
        let orientation = &piece.orientations()[0];
        let column = (turn * 3) % (board.width() - orientation.width() + 1);
        board.drop_piece(orientation, column, false).unwrap();
    }
    let json = serde_json::to_string(&board).unwrap();
    let restored: BitBoard = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, board);
    assert_eq!(restored.to_string(), board.to_string());
}
