//! FEN parsing for the minimal position.
//!
//! Only the piece-placement and side-to-move fields are consumed; castling,
//! en passant, and the move counters belong to the full board representation
//! and are ignored here.

use std::fmt;

use super::Position;
use crate::types::{Color, Piece, Square};

/// Error type for FEN parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// FEN string is missing the placement or side-to-move field
    TooFewParts { found: usize },
    /// Invalid piece character in the placement string
    InvalidPiece { char: char },
    /// Invalid side to move (must be 'w' or 'b')
    InvalidSideToMove { found: String },
    /// Placement string has the wrong number of ranks
    InvalidRankCount { found: usize },
    /// Too many files in a rank
    TooManyFiles { rank: usize },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewParts { found } => {
                write!(f, "FEN must have at least 2 parts, found {found}")
            }
            FenError::InvalidPiece { char } => {
                write!(f, "Invalid piece character '{char}' in FEN")
            }
            FenError::InvalidSideToMove { found } => {
                write!(f, "Invalid side to move '{found}', expected 'w' or 'b'")
            }
            FenError::InvalidRankCount { found } => {
                write!(f, "FEN placement must have 8 ranks, found {found}")
            }
            FenError::TooManyFiles { rank } => {
                write!(f, "Too many files in rank {rank}")
            }
        }
    }
}

impl std::error::Error for FenError {}

fn piece_from_char(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'p' => Some(Piece::Pawn),
        'n' => Some(Piece::Knight),
        'b' => Some(Piece::Bishop),
        'r' => Some(Piece::Rook),
        'q' => Some(Piece::Queen),
        'k' => Some(Piece::King),
        _ => None,
    }
}

impl Position {
    /// Parse a position from FEN notation (placement and side to move).
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 2 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidRankCount { found: ranks.len() });
        }

        let mut pos = Position::empty();
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else {
                    let piece =
                        piece_from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
                    if file >= 8 {
                        return Err(FenError::TooManyFiles { rank: rank_idx });
                    }
                    let color = if c.is_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    pos.put_piece(Square::make(file, rank), color, piece);
                    file += 1;
                }
            }
        }

        match parts[1] {
            "w" => pos.set_side_to_move(Color::White),
            "b" => pos.set_side_to_move(Color::Black),
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        }

        Ok(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_placement_and_side() {
        let pos = Position::from_fen("8/8/8/8/4P3/8/8/K2k4 b - - 0 1").expect("valid fen");
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(
            pos.piece_on(Square::make(4, 3)),
            Some((Color::White, Piece::Pawn))
        );
        assert_eq!(
            pos.piece_on(Square::make(0, 0)),
            Some((Color::White, Piece::King))
        );
        assert_eq!(
            pos.piece_on(Square::make(3, 0)),
            Some((Color::Black, Piece::King))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            Position::from_fen("8/8/8/8"),
            Err(FenError::TooFewParts { .. })
        ));
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8/7x w"),
            Err(FenError::InvalidPiece { .. })
        ));
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8/8 x"),
            Err(FenError::InvalidSideToMove { .. })
        ));
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8 w"),
            Err(FenError::InvalidRankCount { .. })
        ));
    }
}
