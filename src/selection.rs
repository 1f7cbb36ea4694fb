//! Client-side interaction state: which piece a player has picked up and where it may go.
//!
//! This is a view over a board the client received; it never changes the game and is
//! never consulted when a move is validated.

use crate::board::{BoardState, Color, Move, ProposedMove};
use crate::game::Game;
use crate::position::{BoardGeometry, CellAddress};
use crate::rules::Rules;

/// What a client knows about the game: the last board it received and whose turn is next.
#[derive(Debug, Clone, Copy)]
pub struct BoardView<'a> {
    pub rules: Rules,
    pub board: &'a BoardState,
    /// `None` once the game is over.
    pub active: Option<Color>,
}

impl<'a> From<&'a Game> for BoardView<'a> {
    fn from(game: &'a Game) -> Self {
        BoardView {
            rules: game.rules(),
            board: game.board(),
            active: game.active_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Nothing to do: not our turn, an empty cell, an enemy piece that is not a target,
    /// or off the board.
    Ignored,
    Selected(CellAddress),
    Proposed(ProposedMove),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<CellAddress>,
    highlighted: Vec<CellAddress>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<CellAddress> {
        self.selected
    }

    pub fn highlighted(&self) -> &[CellAddress] {
        &self.highlighted
    }

    /// Forget the selection, e.g. once the next board update arrives.
    pub fn reset(&mut self) {
        self.selected = None;
        self.highlighted.clear();
    }

    /// Handle a click on `cell` by player `me`. Clicks are ignored unless it is `me`'s turn.
    pub fn click(&mut self, view: &BoardView<'_>, me: Color, cell: CellAddress) -> ClickOutcome {
        if view.active != Some(me) {
            return ClickOutcome::Ignored;
        }

        if let Some(from) = self.selected {
            if self.highlighted.contains(&cell) {
                return ClickOutcome::Proposed(Move::new(from, cell).into());
            }
        }

        match view.board.piece_at(cell) {
            Some(piece) if piece.color == me => {
                self.selected = Some(cell);
                self.highlighted = view.rules.available_move_positions(view.board, cell);
                ClickOutcome::Selected(cell)
            }
            _ => ClickOutcome::Ignored,
        }
    }

    /// Click at a pixel position; points off the grid are ignored.
    pub fn click_at(
        &mut self,
        geometry: &BoardGeometry,
        view: &BoardView<'_>,
        me: Color,
        x: f64,
        y: f64,
    ) -> ClickOutcome {
        match geometry.to_cell_address(x, y) {
            Ok(cell) => self.click(view, me, cell),
            Err(_) => ClickOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u8, col: u8) -> CellAddress {
        CellAddress::new(row, col).unwrap()
    }

    fn red_to_move(board: &BoardState) -> BoardView<'_> {
        BoardView {
            rules: Rules::default(),
            board,
            active: Some(Color::Red),
        }
    }

    #[test]
    fn test_select_then_propose() {
        let board = BoardState::initial();
        let view = red_to_move(&board);
        let mut selection = Selection::new();

        assert_eq!(
            selection.click(&view, Color::Red, cell(6, 0)),
            ClickOutcome::Selected(cell(6, 0))
        );
        assert_eq!(selection.highlighted(), [cell(5, 0)]);

        let outcome = selection.click(&view, Color::Red, cell(5, 0));
        assert_eq!(outcome, ClickOutcome::Proposed("60_50".parse().unwrap()));
    }

    #[test]
    fn test_clicking_another_own_piece_reselects() {
        let board = BoardState::initial();
        let view = red_to_move(&board);
        let mut selection = Selection::new();

        selection.click(&view, Color::Red, cell(6, 0));
        assert_eq!(
            selection.click(&view, Color::Red, cell(9, 1)),
            ClickOutcome::Selected(cell(9, 1))
        );
        assert_eq!(selection.highlighted().len(), 2);
    }

    #[test]
    fn test_opponent_pieces_and_empty_cells_are_ignored() {
        let board = BoardState::initial();
        let view = red_to_move(&board);
        let mut selection = Selection::new();

        assert_eq!(
            selection.click(&view, Color::Red, cell(3, 0)),
            ClickOutcome::Ignored
        );
        assert_eq!(
            selection.click(&view, Color::Red, cell(4, 4)),
            ClickOutcome::Ignored
        );
        assert_eq!(selection.selected(), None);

        selection.click(&view, Color::Red, cell(6, 0));
        assert_eq!(
            selection.click(&view, Color::Red, cell(4, 0)),
            ClickOutcome::Ignored
        );
        assert_eq!(selection.selected(), Some(cell(6, 0)));
    }

    #[test]
    fn test_clicks_ignored_when_not_my_turn() {
        let game = Game::default();
        let view = BoardView::from(&game);
        let mut selection = Selection::new();

        assert_eq!(
            selection.click(&view, Color::Black, cell(3, 0)),
            ClickOutcome::Ignored
        );
        assert_eq!(selection.selected(), None);
        assert!(selection.highlighted().is_empty());

        assert_eq!(
            selection.click(&view, Color::Red, cell(6, 0)),
            ClickOutcome::Selected(cell(6, 0))
        );
    }

    #[test]
    fn test_pending_selection_cannot_propose_out_of_turn() {
        let board = BoardState::initial();
        let mut selection = Selection::new();
        selection.click(&red_to_move(&board), Color::Red, cell(6, 0));

        let black_to_move = BoardView {
            active: Some(Color::Black),
            ..red_to_move(&board)
        };
        assert_eq!(
            selection.click(&black_to_move, Color::Red, cell(5, 0)),
            ClickOutcome::Ignored
        );
    }

    #[test]
    fn test_clicks_ignored_after_game_over() {
        let mut game = Game::from_position(
            BoardState::decode("03k_93R_95K").unwrap(),
            Color::Red,
            Rules::default(),
        );
        game.submit(Color::Red, "93_03").unwrap();
        let view = BoardView::from(&game);
        let mut selection = Selection::new();

        for me in [Color::Red, Color::Black] {
            assert_eq!(selection.click(&view, me, cell(0, 3)), ClickOutcome::Ignored);
            assert_eq!(selection.click(&view, me, cell(9, 5)), ClickOutcome::Ignored);
        }
        assert_eq!(selection.selected(), None);
        assert!(selection.highlighted().is_empty());
    }

    #[test]
    fn test_click_at_pixels() {
        let board = BoardState::initial();
        let view = red_to_move(&board);
        let geometry = BoardGeometry::default();
        let mut selection = Selection::new();

        let (x, y) = geometry.to_pixel_center(cell(9, 1));
        assert_eq!(
            selection.click_at(&geometry, &view, Color::Red, x + 3.0, y - 4.0),
            ClickOutcome::Selected(cell(9, 1))
        );
        assert_eq!(
            selection.click_at(&geometry, &view, Color::Red, -100.0, y),
            ClickOutcome::Ignored
        );

        selection.reset();
        assert_eq!(selection.selected(), None);
        assert!(selection.highlighted().is_empty());
    }
}
