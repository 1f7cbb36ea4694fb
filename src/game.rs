use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{BoardState, Color, MalformedMove, Move, PieceKind, ProposedMove};
use crate::position::CellAddress;
use crate::protocol::BoardUpdate;
use crate::rules::{MoveError, Rules};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Invalid move: {0}")]
    InvalidMove(#[from] MoveError),
    #[error(transparent)]
    MalformedMove(#[from] MalformedMove),
    #[error("Game already over")]
    GameOver,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Piece at {0} belongs to the other side")]
    NotYourPiece(CellAddress),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    WaitingForMove(Color),
    GameOver { winner: Color },
}

/// One game: the authoritative board, whose turn it is, and the accepted moves so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: BoardState,
    turn: TurnState,
    rules: Rules,
    history: Vec<Move>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(Rules::default())
    }
}

impl Game {
    /// Opening layout, Red to move.
    pub fn new(rules: Rules) -> Self {
        Self::from_position(BoardState::initial(), Color::Red, rules)
    }

    pub fn from_position(board: BoardState, active: Color, rules: Rules) -> Self {
        Game {
            board,
            turn: TurnState::WaitingForMove(active),
            rules,
            history: Vec::new(),
        }
    }

    /// The authoritative board.
    pub fn board(&self) -> &BoardState {
        &self.board
    }

    /// Whose move it is, or who won.
    pub fn turn(&self) -> TurnState {
        self.turn
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    /// The side to move, or `None` once the game is over.
    pub fn active_color(&self) -> Option<Color> {
        match self.turn {
            TurnState::WaitingForMove(color) => Some(color),
            TurnState::GameOver { .. } => None,
        }
    }

    /// Set only in the terminal state.
    pub fn winner(&self) -> Option<Color> {
        match self.turn {
            TurnState::GameOver { winner } => Some(winner),
            TurnState::WaitingForMove(_) => None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.winner().is_some()
    }

    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    /// Accepted moves, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Legal destinations for the piece on `from`; nothing once the game is over.
    pub fn available_move_positions(&self, from: CellAddress) -> Vec<CellAddress> {
        if self.is_game_over() {
            return Vec::new();
        }
        self.rules.available_move_positions(&self.board, from)
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        match self.active_color() {
            Some(color) => self.rules.legal_moves(&self.board, color),
            None => Vec::new(),
        }
    }

    /// Parse an `"rc_rc"` move from `mover` and play it.
    pub fn submit(&mut self, mover: Color, text: &str) -> Result<BoardUpdate, GameError> {
        let proposal: ProposedMove = text.parse()?;
        self.play(mover, proposal)
    }

    /// Apply a move from `mover` if it is theirs to make and legal, then pass the turn.
    /// A rejected move leaves the game untouched.
    pub fn play(&mut self, mover: Color, proposal: ProposedMove) -> Result<BoardUpdate, GameError> {
        let active = self.active_color().ok_or(GameError::GameOver)?;
        if mover != active {
            return Err(GameError::NotYourTurn);
        }
        if let Some(from) = proposal.from_cell() {
            if self.board.piece_at(from).is_some_and(|piece| piece.color != mover) {
                return Err(GameError::NotYourPiece(from));
            }
        }

        let mv = self.rules.validate_proposal(&self.board, proposal)?;
        let captured = self.board.piece_at(mv.to);
        self.board = self.board.apply(mv);
        self.history.push(mv);

        let opponent = mover.opponent();
        let general_taken = captured.is_some_and(|piece| piece.kind == PieceKind::General);
        // under permissive rules this counts pseudo-legal moves, so a side can still be stuck
        let opponent_stuck = self.rules.legal_moves(&self.board, opponent).is_empty();

        self.turn = if general_taken || opponent_stuck {
            debug!("{} played {} and wins", mover, mv);
            TurnState::GameOver { winner: mover }
        } else {
            debug!("{} played {}", mover, mv);
            TurnState::WaitingForMove(opponent)
        };

        Ok(self.update())
    }

    /// The synchronization message for the current state.
    pub fn update(&self) -> BoardUpdate {
        BoardUpdate {
            board_status: self.board.encode(),
            next_turn_color: self.active_color(),
            winner: self.winner(),
        }
    }
}
