use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::position::{CELL_COUNT, COLS, CellAddress, ROWS, parse_digit_pair};

/// Separator between piece tokens in the board text encoding.
pub const TOKEN_DELIMITER: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
}

impl Color {
    pub fn opponent(&self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// Row delta of a forward step.
    pub fn forward(&self) -> i8 {
        match self {
            Color::Red => -1,
            Color::Black => 1,
        }
    }

    /// True when `row` lies on this color's side of the river.
    pub fn owns_row(&self, row: u8) -> bool {
        match self {
            Color::Red => row >= 5,
            Color::Black => row <= 4,
        }
    }

    pub fn palace_contains(&self, cell: CellAddress) -> bool {
        let rows = match self {
            Color::Red => 7..=9,
            Color::Black => 0..=2,
        };
        rows.contains(&cell.row()) && (3..=5).contains(&cell.col())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    General,
    Advisor,
    Elephant,
    Horse,
    Chariot,
    Cannon,
    Soldier,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::General,
        PieceKind::Advisor,
        PieceKind::Elephant,
        PieceKind::Horse,
        PieceKind::Chariot,
        PieceKind::Cannon,
        PieceKind::Soldier,
    ];

    fn letter(&self) -> char {
        match self {
            PieceKind::General => 'K',
            PieceKind::Advisor => 'A',
            PieceKind::Elephant => 'E',
            PieceKind::Horse => 'H',
            PieceKind::Chariot => 'R',
            PieceKind::Cannon => 'C',
            PieceKind::Soldier => 'P',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Piece { kind, color }
    }

    /// Kind letter, uppercase for Red and lowercase for Black.
    pub fn to_char(&self) -> char {
        let letter = self.kind.letter();
        match self.color {
            Color::Red => letter,
            Color::Black => letter.to_ascii_lowercase(),
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::Red
        } else if c.is_ascii_lowercase() {
            Color::Black
        } else {
            return None;
        };
        let upper = c.to_ascii_uppercase();
        PieceKind::ALL
            .into_iter()
            .find(|kind| kind.letter() == upper)
            .map(|kind| Piece::new(kind, color))
    }
}

/// A relocation from one cell to another. Carries no legality guarantee by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: CellAddress,
    pub to: CellAddress,
}

impl Move {
    pub fn new(from: CellAddress, to: CellAddress) -> Self {
        Move { from, to }
    }
}

/// Wire form `"rc_rc"`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.from, TOKEN_DELIMITER, self.to)
    }
}

/// A move as received from a player: digit pairs that have not yet been checked
/// against the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposedMove {
    pub from: (u8, u8),
    pub to: (u8, u8),
}

impl ProposedMove {
    pub fn from_cell(&self) -> Option<CellAddress> {
        CellAddress::new(self.from.0, self.from.1)
    }

    pub fn to_cell(&self) -> Option<CellAddress> {
        CellAddress::new(self.to.0, self.to.1)
    }
}

impl From<Move> for ProposedMove {
    fn from(mv: Move) -> Self {
        ProposedMove {
            from: (mv.from.row(), mv.from.col()),
            to: (mv.to.row(), mv.to.col()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("move {0:?} is not of the form rc_rc")]
pub struct MalformedMove(pub String);

impl FromStr for ProposedMove {
    type Err = MalformedMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MalformedMove(s.to_string());
        let (from, to) = s.split_once(TOKEN_DELIMITER).ok_or_else(malformed)?;
        Ok(ProposedMove {
            from: parse_digit_pair(from).ok_or_else(malformed)?,
            to: parse_digit_pair(to).ok_or_else(malformed)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed board encoding: {0}")]
    MalformedEncoding(String),
}

fn malformed(reason: impl Into<String>) -> DecodeError {
    DecodeError::MalformedEncoding(reason.into())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardState {
    cells: [Option<Piece>; CELL_COUNT],
}

impl Default for BoardState {
    fn default() -> Self {
        Self::initial()
    }
}

const BACK_RANK: [PieceKind; 9] = [
    PieceKind::Chariot,
    PieceKind::Horse,
    PieceKind::Elephant,
    PieceKind::Advisor,
    PieceKind::General,
    PieceKind::Advisor,
    PieceKind::Elephant,
    PieceKind::Horse,
    PieceKind::Chariot,
];

impl BoardState {
    /// A board with no pieces. Not a valid game position on its own.
    pub fn empty() -> Self {
        BoardState {
            cells: [None; CELL_COUNT],
        }
    }

    /// Standard opening layout, Black on rows 0-3 and Red on rows 6-9.
    pub fn initial() -> Self {
        let mut board = Self::empty();

        for (color, back, cannons, soldiers) in [(Color::Black, 0, 2, 3), (Color::Red, 9, 7, 6)] {
            for (col, &kind) in BACK_RANK.iter().enumerate() {
                board.place(back, col as u8, Piece::new(kind, color));
            }
            for col in [1, 7] {
                board.place(cannons, col, Piece::new(PieceKind::Cannon, color));
            }
            for col in [0, 2, 4, 6, 8] {
                board.place(soldiers, col, Piece::new(PieceKind::Soldier, color));
            }
        }

        board
    }

    fn place(&mut self, row: u8, col: u8, piece: Piece) {
        if let Some(cell) = CellAddress::new(row, col) {
            self.cells[cell.index()] = Some(piece);
        }
    }

    /// The piece on `cell`, if any.
    pub fn piece_at(&self, cell: CellAddress) -> Option<Piece> {
        self.cells[cell.index()]
    }

    /// Put `piece` (or nothing) on `cell`, replacing whatever was there.
    pub fn set(&mut self, cell: CellAddress, piece: Option<Piece>) {
        self.cells[cell.index()] = piece;
    }

    /// Occupied cells in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (CellAddress, Piece)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, piece)| Some((CellAddress::from_index(index)?, (*piece)?)))
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (CellAddress, Piece)> + '_ {
        self.pieces().filter(move |(_, piece)| piece.color == color)
    }

    /// Where `color`'s general stands; `None` after it has been captured.
    pub fn general_of(&self, color: Color) -> Option<CellAddress> {
        self.pieces_of(color)
            .find(|(_, piece)| piece.kind == PieceKind::General)
            .map(|(cell, _)| cell)
    }

    /// Relocate the piece at `mv.from` to `mv.to`, dropping whatever stood on `mv.to`.
    /// Rules are not consulted.
    pub fn apply(&self, mv: Move) -> BoardState {
        let mut next = self.clone();
        if mv.from != mv.to {
            let moving = next.cells[mv.from.index()].take();
            next.cells[mv.to.index()] = moving;
        }
        next
    }

    /// Canonical text form: one `rc` + letter token per piece, row-major, joined by `_`.
    /// Empty cells are omitted, so equal boards always encode identically.
    pub fn encode(&self) -> String {
        let mut text = String::with_capacity(CELL_COUNT * 4);
        for (cell, piece) in self.pieces() {
            if !text.is_empty() {
                text.push(TOKEN_DELIMITER);
            }
            text.push_str(&cell.to_string());
            text.push(piece.to_char());
        }
        text
    }

    /// Parse the form produced by [`BoardState::encode`]. Tokens may come in any order,
    /// but each cell may appear once and each side needs exactly one general.
    pub fn decode(text: &str) -> Result<BoardState, DecodeError> {
        let mut board = Self::empty();
        if text.is_empty() {
            return Err(malformed("empty board"));
        }

        for token in text.split(TOKEN_DELIMITER) {
            let (cell, piece) = decode_token(token)?;
            if board.piece_at(cell).is_some() {
                return Err(malformed(format!("cell {} occupied twice", cell)));
            }
            board.set(cell, Some(piece));
        }

        for color in [Color::Red, Color::Black] {
            let generals = board
                .pieces_of(color)
                .filter(|(_, piece)| piece.kind == PieceKind::General)
                .count();
            if generals != 1 {
                return Err(malformed(format!(
                    "expected one {} general, found {}",
                    color, generals
                )));
            }
        }

        Ok(board)
    }

    /// Text diagram for logs and debugging.
    pub fn display_board(&self) -> String {
        let mut result = String::from("  ");
        for col in 0..COLS {
            result.push_str(&format!("{} ", col));
        }
        result.push('\n');

        for row in 0..ROWS {
            result.push_str(&format!("{} ", row));
            for col in 0..COLS {
                let c = CellAddress::new(row, col)
                    .and_then(|cell| self.piece_at(cell))
                    .map_or('.', |piece| piece.to_char());
                result.push(c);
                result.push(' ');
            }
            result.push('\n');
            if row == 4 {
                result.push_str("  ~~~~~~~~~~~~~~~~~\n");
            }
        }

        result
    }
}

fn decode_token(token: &str) -> Result<(CellAddress, Piece), DecodeError> {
    let mut chars = token.chars();
    let digits: String = chars.by_ref().take(2).collect();
    let piece_char = chars.next();
    if chars.next().is_some() {
        return Err(malformed(format!("token {:?} is longer than 3 characters", token)));
    }

    let (row, col) = parse_digit_pair(&digits)
        .ok_or_else(|| malformed(format!("token {:?} has no row/column digits", token)))?;
    let cell = CellAddress::new(row, col)
        .ok_or_else(|| malformed(format!("token {:?} is off the board", token)))?;
    let piece = piece_char
        .and_then(Piece::from_char)
        .ok_or_else(|| malformed(format!("token {:?} has no valid piece character", token)))?;

    Ok((cell, piece))
}

impl FromStr for BoardState {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoardState::decode(s)
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
