use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ROWS: u8 = 10;
pub const COLS: u8 = 9;
pub const CELL_COUNT: usize = ROWS as usize * COLS as usize;

/// A board intersection. Row 0 is the top (Black) edge, row 9 the bottom (Red) edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCell", into = "RawCell")]
pub struct CellAddress {
    row: u8,
    col: u8,
}

#[derive(Serialize, Deserialize)]
struct RawCell {
    row: u8,
    col: u8,
}

impl TryFrom<RawCell> for CellAddress {
    type Error = NotOnBoard;

    fn try_from(raw: RawCell) -> Result<Self, Self::Error> {
        CellAddress::new(raw.row, raw.col).ok_or(NotOnBoard)
    }
}

impl From<CellAddress> for RawCell {
    fn from(cell: CellAddress) -> Self {
        RawCell {
            row: cell.row,
            col: cell.col,
        }
    }
}

impl CellAddress {
    pub fn new(row: u8, col: u8) -> Option<Self> {
        (row < ROWS && col < COLS).then_some(CellAddress { row, col })
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    /// Row-major index into a flat 90-cell array.
    pub fn index(&self) -> usize {
        self.row as usize * COLS as usize + self.col as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index >= CELL_COUNT {
            return None;
        }
        let cols = COLS as usize;
        Self::new((index / cols) as u8, (index % cols) as u8)
    }

    pub fn offset(&self, dr: i8, dc: i8) -> Option<Self> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if row < 0 || col < 0 {
            return None;
        }
        Self::new(row as u8, col as u8)
    }

    pub fn all() -> impl Iterator<Item = CellAddress> {
        (0..CELL_COUNT).filter_map(CellAddress::from_index)
    }
}

/// Two digits, row then column: `"90"` is the bottom-left corner.
impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.col)
    }
}

impl FromStr for CellAddress {
    type Err = NotOnBoard;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = parse_digit_pair(s).ok_or(NotOnBoard)?;
        CellAddress::new(row, col).ok_or(NotOnBoard)
    }
}

/// Parses exactly two ASCII digits without range-checking them against the grid.
pub(crate) fn parse_digit_pair(s: &str) -> Option<(u8, u8)> {
    let mut chars = s.chars();
    let row = chars.next()?.to_digit(10)?;
    let col = chars.next()?.to_digit(10)?;
    if chars.next().is_some() {
        return None;
    }
    Some((row as u8, col as u8))
}

/// The input did not land on any intersection; callers ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("point is not on the board")]
pub struct NotOnBoard;

/// Pixel layout of the drawn board: square cells separated by one-pixel grid lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardGeometry {
    pub cell_size: f64,
    /// Maximum per-axis distance, in pixels, from an intersection that still snaps to it.
    pub tolerance: f64,
}

impl Default for BoardGeometry {
    fn default() -> Self {
        BoardGeometry::with_cell_size(50.0)
    }
}

impl BoardGeometry {
    pub fn with_cell_size(cell_size: f64) -> Self {
        BoardGeometry {
            cell_size,
            tolerance: (cell_size + 1.0) / 2.0,
        }
    }

    pub fn pitch(&self) -> f64 {
        self.cell_size + 1.0
    }

    pub fn origin(&self) -> f64 {
        self.cell_size / 2.0 + 1.0
    }

    pub fn width(&self) -> f64 {
        self.pitch() * COLS as f64
    }

    pub fn height(&self) -> f64 {
        self.pitch() * ROWS as f64
    }

    /// Snap a pointer position to the nearest intersection. `x` picks the column, `y` the row.
    pub fn to_cell_address(&self, x: f64, y: f64) -> Result<CellAddress, NotOnBoard> {
        let col = self.snap_axis(x, COLS)?;
        let row = self.snap_axis(y, ROWS)?;
        CellAddress::new(row, col).ok_or(NotOnBoard)
    }

    pub fn to_pixel_center(&self, cell: CellAddress) -> (f64, f64) {
        (
            self.origin() + cell.col() as f64 * self.pitch(),
            self.origin() + cell.row() as f64 * self.pitch(),
        )
    }

    fn snap_axis(&self, value: f64, lines: u8) -> Result<u8, NotOnBoard> {
        let pitch = self.pitch();
        // a collapsed or NaN grid has no intersections to snap to
        if !value.is_finite() || !pitch.is_finite() || pitch <= 0.0 {
            return Err(NotOnBoard);
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(NotOnBoard);
        }
        let index = ((value - self.origin()) / pitch).round();
        if index < 0.0 || index >= lines as f64 {
            return Err(NotOnBoard);
        }
        let center = self.origin() + index * pitch;
        if (value - center).abs() > self.tolerance {
            return Err(NotOnBoard);
        }
        Ok(index as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u8, col: u8) -> CellAddress {
        CellAddress::new(row, col).unwrap()
    }

    #[test]
    fn test_cell_bounds() {
        assert!(CellAddress::new(9, 8).is_some());
        assert!(CellAddress::new(10, 0).is_none());
        assert!(CellAddress::new(0, 9).is_none());
    }

    #[test]
    fn test_offset_stays_on_grid() {
        assert_eq!(cell(0, 0).offset(-1, 0), None);
        assert_eq!(cell(9, 8).offset(0, 1), None);
        assert_eq!(cell(4, 4).offset(1, -2), Some(cell(5, 2)));
    }

    #[test]
    fn test_index_is_row_major() {
        assert_eq!(cell(0, 0).index(), 0);
        assert_eq!(cell(1, 0).index(), 9);
        assert_eq!(cell(9, 8).index(), CELL_COUNT - 1);
        assert_eq!(CellAddress::from_index(10), Some(cell(1, 1)));
        assert_eq!(CellAddress::all().count(), CELL_COUNT);
    }

    #[test]
    fn test_cell_text_form() {
        assert_eq!(cell(6, 0).to_string(), "60");
        assert_eq!("73".parse::<CellAddress>(), Ok(cell(7, 3)));
        assert_eq!("09".parse::<CellAddress>(), Err(NotOnBoard));
        assert_eq!("7".parse::<CellAddress>(), Err(NotOnBoard));
        assert_eq!("7a".parse::<CellAddress>(), Err(NotOnBoard));
        assert_eq!("123".parse::<CellAddress>(), Err(NotOnBoard));
    }

    #[test]
    fn test_pixel_center_round_trips() {
        let geometry = BoardGeometry::default();
        for address in CellAddress::all() {
            let (x, y) = geometry.to_pixel_center(address);
            assert_eq!(geometry.to_cell_address(x, y), Ok(address));
        }
    }

    #[test]
    fn test_snaps_to_nearest_intersection() {
        let geometry = BoardGeometry::default();
        let (x, y) = geometry.to_pixel_center(cell(3, 5));
        assert_eq!(geometry.to_cell_address(x + 20.0, y - 20.0), Ok(cell(3, 5)));
        assert_eq!(geometry.to_cell_address(x + 30.0, y), Ok(cell(3, 6)));
    }

    #[test]
    fn test_outside_grid_is_not_on_board() {
        let geometry = BoardGeometry::default();
        assert_eq!(geometry.to_cell_address(-40.0, 10.0), Err(NotOnBoard));
        assert_eq!(
            geometry.to_cell_address(10.0, geometry.height() + 60.0),
            Err(NotOnBoard)
        );
        assert_eq!(geometry.to_cell_address(f64::NAN, 10.0), Err(NotOnBoard));
    }

    #[test]
    fn test_tight_tolerance_rejects_points_between_lines() {
        let geometry = BoardGeometry {
            cell_size: 50.0,
            tolerance: 10.0,
        };
        let (x, y) = geometry.to_pixel_center(cell(0, 0));
        assert_eq!(geometry.to_cell_address(x + 9.0, y), Ok(cell(0, 0)));
        assert_eq!(geometry.to_cell_address(x + 20.0, y), Err(NotOnBoard));
        assert_eq!(geometry.to_cell_address(x, y - 11.0), Err(NotOnBoard));
    }

    #[test]
    fn test_degenerate_geometry_is_not_on_board() {
        for cell_size in [-1.0, -5.0, f64::NAN, f64::INFINITY] {
            let geometry = BoardGeometry::with_cell_size(cell_size);
            assert_eq!(geometry.to_cell_address(0.5, 0.5), Err(NotOnBoard));
            assert_eq!(geometry.to_cell_address(0.0, 0.0), Err(NotOnBoard));
        }

        let geometry = BoardGeometry {
            cell_size: 50.0,
            tolerance: f64::NAN,
        };
        let (x, y) = geometry.to_pixel_center(cell(4, 4));
        assert_eq!(geometry.to_cell_address(x, y), Err(NotOnBoard));
    }
}
