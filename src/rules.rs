use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{BoardState, Color, Move, Piece, PieceKind, ProposedMove};
use crate::position::CellAddress;

const ORTHOGONAL: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Horse jumps paired with the orthogonal leg cell that must be empty.
const HORSE_JUMPS: [((i8, i8), (i8, i8)); 8] = [
    ((-2, -1), (-1, 0)),
    ((-2, 1), (-1, 0)),
    ((2, -1), (1, 0)),
    ((2, 1), (1, 0)),
    ((-1, -2), (0, -1)),
    ((1, -2), (0, -1)),
    ((-1, 2), (0, 1)),
    ((1, 2), (0, 1)),
];

/// Reasons a proposed move is rejected, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("no piece at the source cell")]
    NoPieceAtSource,
    #[error("destination cell is not on the board")]
    DestinationCellInvalid,
    #[error("destination holds a piece of the same color")]
    SameColorDestination,
    #[error("the piece cannot move to that cell")]
    IllegalPieceMovement,
    #[error("the move leaves the mover's general under attack")]
    SelfCheckExposure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Reject moves that leave the mover's own general attacked (facing generals included).
    pub forbid_self_check: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            forbid_self_check: true,
        }
    }
}

impl Rules {
    /// Piece movement rules only; a side may leave its general hanging.
    pub fn permissive() -> Self {
        Rules {
            forbid_self_check: false,
        }
    }

    /// Every cell the piece on `from` may legally move to. Empty when `from` is empty.
    pub fn available_move_positions(&self, board: &BoardState, from: CellAddress) -> Vec<CellAddress> {
        let Some(piece) = board.piece_at(from) else {
            return Vec::new();
        };

        destinations(board, from)
            .into_iter()
            .filter(|&to| !self.exposes_general(board, piece.color, Move::new(from, to)))
            .collect()
    }

    pub fn is_valid_move(&self, board: &BoardState, from: CellAddress, to: CellAddress) -> Result<Move, MoveError> {
        self.check(board, Some(from), Some(to))
    }

    /// Validate a move whose coordinates may lie off the grid.
    pub fn validate_proposal(&self, board: &BoardState, proposal: ProposedMove) -> Result<Move, MoveError> {
        self.check(board, proposal.from_cell(), proposal.to_cell())
    }

    fn check(
        &self,
        board: &BoardState,
        from: Option<CellAddress>,
        to: Option<CellAddress>,
    ) -> Result<Move, MoveError> {
        let (from, piece) = from
            .and_then(|from| Some((from, board.piece_at(from)?)))
            .ok_or(MoveError::NoPieceAtSource)?;
        let to = to.ok_or(MoveError::DestinationCellInvalid)?;

        if board.piece_at(to).is_some_and(|target| target.color == piece.color) {
            return Err(MoveError::SameColorDestination);
        }
        if !destinations(board, from).contains(&to) {
            return Err(MoveError::IllegalPieceMovement);
        }

        let mv = Move::new(from, to);
        if self.exposes_general(board, piece.color, mv) {
            return Err(MoveError::SelfCheckExposure);
        }
        Ok(mv)
    }

    fn exposes_general(&self, board: &BoardState, color: Color, mv: Move) -> bool {
        self.forbid_self_check && is_in_check(&board.apply(mv), color)
    }

    /// All legal moves for `color`, in board order.
    pub fn legal_moves(&self, board: &BoardState, color: Color) -> Vec<Move> {
        board
            .pieces_of(color)
            .flat_map(|(from, _)| {
                self.available_move_positions(board, from)
                    .into_iter()
                    .map(move |to| Move::new(from, to))
            })
            .collect()
    }
}

/// Whether `color`'s general is attacked by any opposing piece or faces the other general.
/// A side without a general is not in check.
pub fn is_in_check(board: &BoardState, color: Color) -> bool {
    let Some(general) = board.general_of(color) else {
        return false;
    };

    generals_facing(board)
        || board
            .pieces_of(color.opponent())
            .any(|(from, _)| destinations(board, from).contains(&general))
}

fn generals_facing(board: &BoardState) -> bool {
    let (Some(red), Some(black)) = (board.general_of(Color::Red), board.general_of(Color::Black)) else {
        return false;
    };
    if red.col() != black.col() {
        return false;
    }

    let (top, bottom) = (red.row().min(black.row()), red.row().max(black.row()));
    (top + 1..bottom)
        .filter_map(|row| CellAddress::new(row, red.col()))
        .all(|cell| board.piece_at(cell).is_none())
}

/// Cells reachable by the piece on `from` under its movement rule, ignoring whether
/// the mover's own general ends up attacked. Own-color cells are never included.
pub fn destinations(board: &BoardState, from: CellAddress) -> Vec<CellAddress> {
    let Some(piece) = board.piece_at(from) else {
        return Vec::new();
    };

    let mut cells = Vec::new();
    match piece.kind {
        PieceKind::General => step_moves(board, from, piece, &ORTHOGONAL, true, &mut cells),
        PieceKind::Advisor => step_moves(board, from, piece, &DIAGONAL, true, &mut cells),
        PieceKind::Elephant => elephant_moves(board, from, piece, &mut cells),
        PieceKind::Horse => horse_moves(board, from, piece, &mut cells),
        PieceKind::Chariot => chariot_moves(board, from, piece, &mut cells),
        PieceKind::Cannon => cannon_moves(board, from, piece, &mut cells),
        PieceKind::Soldier => soldier_moves(board, from, piece, &mut cells),
    }
    cells
}

fn can_land(board: &BoardState, piece: Piece, to: CellAddress) -> bool {
    board.piece_at(to).is_none_or(|target| target.color != piece.color)
}

fn step_moves(
    board: &BoardState,
    from: CellAddress,
    piece: Piece,
    directions: &[(i8, i8)],
    palace_only: bool,
    cells: &mut Vec<CellAddress>,
) {
    for &(dr, dc) in directions {
        let Some(to) = from.offset(dr, dc) else {
            continue;
        };
        if palace_only && !piece.color.palace_contains(to) {
            continue;
        }
        if can_land(board, piece, to) {
            cells.push(to);
        }
    }
}

fn elephant_moves(board: &BoardState, from: CellAddress, piece: Piece, cells: &mut Vec<CellAddress>) {
    for &(dr, dc) in &DIAGONAL {
        let Some(eye) = from.offset(dr, dc) else {
            continue;
        };
        let Some(to) = from.offset(dr * 2, dc * 2) else {
            continue;
        };
        if board.piece_at(eye).is_some() || !piece.color.owns_row(to.row()) {
            continue;
        }
        if can_land(board, piece, to) {
            cells.push(to);
        }
    }
}

fn horse_moves(board: &BoardState, from: CellAddress, piece: Piece, cells: &mut Vec<CellAddress>) {
    for &((dr, dc), (lr, lc)) in &HORSE_JUMPS {
        let Some(to) = from.offset(dr, dc) else {
            continue;
        };
        let leg_clear = from
            .offset(lr, lc)
            .is_some_and(|leg| board.piece_at(leg).is_none());
        if leg_clear && can_land(board, piece, to) {
            cells.push(to);
        }
    }
}

fn chariot_moves(board: &BoardState, from: CellAddress, piece: Piece, cells: &mut Vec<CellAddress>) {
    for &(dr, dc) in &ORTHOGONAL {
        let mut current = from;
        while let Some(to) = current.offset(dr, dc) {
            if let Some(target) = board.piece_at(to) {
                if target.color != piece.color {
                    cells.push(to);
                }
                break;
            }
            cells.push(to);
            current = to;
        }
    }
}

fn cannon_moves(board: &BoardState, from: CellAddress, piece: Piece, cells: &mut Vec<CellAddress>) {
    for &(dr, dc) in &ORTHOGONAL {
        let mut current = from;
        let mut screened = false;
        while let Some(to) = current.offset(dr, dc) {
            current = to;
            match (board.piece_at(to), screened) {
                (None, false) => cells.push(to),
                (None, true) => {}
                (Some(_), false) => screened = true,
                (Some(target), true) => {
                    if target.color != piece.color {
                        cells.push(to);
                    }
                    break;
                }
            }
        }
    }
}

fn soldier_moves(board: &BoardState, from: CellAddress, piece: Piece, cells: &mut Vec<CellAddress>) {
    let crossed = !piece.color.owns_row(from.row());
    let mut directions = vec![(piece.color.forward(), 0)];
    if crossed {
        directions.extend([(0, -1), (0, 1)]);
    }
    step_moves(board, from, piece, &directions, false, cells);
}
