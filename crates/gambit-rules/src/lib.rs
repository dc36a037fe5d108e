//! Position validation for gambit.
//!
//! The coordination core treats chess legality as an external collaborator:
//! given a position and a proposed move, produce the resulting position or
//! refuse. This crate is that boundary — a thin wrapper over the `chess`
//! crate. No chess rules live anywhere else in the workspace.

use std::str::FromStr;

use chess::{Board, ChessMove, MoveGen, Piece, Square};
use gambit_protocol::MoveDescriptor;

/// FEN of the initial position. Rooms start here and `reset` returns here.
pub const STARTING_FEN: &str =
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Why a move submission was refused.
///
/// `Malformed` and `Illegal` are both recoverable, local refusals — the
/// room reports them to the submitting channel and carries on.
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    /// The descriptor could not be interpreted as a move at all
    /// (bad square name, bad promotion piece).
    #[error("malformed move: {0}")]
    Malformed(String),

    /// A well-formed move that is not legal in the current position.
    #[error("illegal move")]
    Illegal,

    /// The stored position itself failed to parse. Should not happen for
    /// positions this crate produced; indicates a corrupted record.
    #[error("invalid position: {0}")]
    InvalidPosition(String),
}

/// Validates `mv` against `fen` and returns the resulting position.
///
/// The fold property the room relies on: replaying a sequence of accepted
/// moves through `apply` from [`STARTING_FEN`] always reproduces the
/// room's position.
pub fn apply(fen: &str, mv: &MoveDescriptor) -> Result<String, MoveError> {
    let board = Board::from_str(fen)
        .map_err(|e| MoveError::InvalidPosition(e.to_string()))?;

    let from = Square::from_str(&mv.from)
        .map_err(|_| MoveError::Malformed(format!("bad square {:?}", mv.from)))?;
    let to = Square::from_str(&mv.to)
        .map_err(|_| MoveError::Malformed(format!("bad square {:?}", mv.to)))?;

    let promotion = match mv.promotion.as_deref() {
        None => None,
        Some("q") => Some(Piece::Queen),
        Some("r") => Some(Piece::Rook),
        Some("b") => Some(Piece::Bishop),
        Some("n") => Some(Piece::Knight),
        Some(other) => {
            return Err(MoveError::Malformed(format!(
                "bad promotion piece {other:?}"
            )));
        }
    };

    let candidate = ChessMove::new(from, to, promotion);
    if !MoveGen::new_legal(&board).any(|m| m == candidate) {
        return Err(MoveError::Illegal);
    }

    let mut next = board;
    board.make_move(candidate, &mut next);
    Ok(format!("{next}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: &str, to: &str) -> MoveDescriptor {
        MoveDescriptor {
            from: from.into(),
            to: to.into(),
            promotion: None,
        }
    }

    #[test]
    fn test_apply_legal_opening_move() {
        let after = apply(STARTING_FEN, &mv("e2", "e4")).unwrap();
        assert_ne!(after, STARTING_FEN);
        // Black to move after white's first move.
        assert!(after.contains(" b "), "expected black to move: {after}");
    }

    #[test]
    fn test_apply_same_move_twice_is_illegal() {
        // After e2e4 there is no piece on e2 any more.
        let after = apply(STARTING_FEN, &mv("e2", "e4")).unwrap();
        let result = apply(&after, &mv("e2", "e4"));
        assert!(matches!(result, Err(MoveError::Illegal)));
    }

    #[test]
    fn test_apply_illegal_jump_rejected() {
        let result = apply(STARTING_FEN, &mv("e2", "e5"));
        assert!(matches!(result, Err(MoveError::Illegal)));
    }

    #[test]
    fn test_apply_malformed_square_rejected() {
        let result = apply(STARTING_FEN, &mv("zz", "e4"));
        assert!(matches!(result, Err(MoveError::Malformed(_))));
    }

    #[test]
    fn test_apply_malformed_promotion_rejected() {
        let result = apply(
            STARTING_FEN,
            &MoveDescriptor {
                from: "e2".into(),
                to: "e4".into(),
                promotion: Some("k".into()),
            },
        );
        assert!(matches!(result, Err(MoveError::Malformed(_))));
    }

    #[test]
    fn test_apply_promotion() {
        let fen = "8/P7/8/8/8/8/8/K6k w - - 0 1";
        let after = apply(
            fen,
            &MoveDescriptor {
                from: "a7".into(),
                to: "a8".into(),
                promotion: Some("q".into()),
            },
        )
        .unwrap();
        assert!(after.contains('Q'), "expected a white queen: {after}");
    }

    #[test]
    fn test_apply_invalid_position_rejected() {
        let result = apply("definitely not fen", &mv("e2", "e4"));
        assert!(matches!(result, Err(MoveError::InvalidPosition(_))));
    }

    #[test]
    fn test_apply_folds_over_a_sequence() {
        let moves = [mv("e2", "e4"), mv("e7", "e5"), mv("g1", "f3")];
        let mut fen = STARTING_FEN.to_string();
        for m in &moves {
            fen = apply(&fen, m).unwrap();
        }
        assert!(fen.contains(" b "), "three plies end with black to move");
    }
}
