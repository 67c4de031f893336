//! Grid of cells: coordinates, neighbours, occupancy. y=0 is the top row.

use crate::error::BoardError;
use crate::tile::TileId;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Cell coordinates; `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Move direction. Up walks towards row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Unit step (dx, dy) in grid coordinates.
    #[inline]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Self::Up => 'U',
            Self::Down => 'D',
            Self::Left => 'L',
            Self::Right => 'R',
        }
    }

    /// Parse a move string such as `"LLUR d"`; whitespace is ignored.
    pub fn parse_sequence(s: &str) -> Result<Vec<Self>, BoardError> {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(Self::try_from)
            .collect()
    }
}

impl TryFrom<u8> for Direction {
    type Error = BoardError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Up),
            1 => Ok(Self::Down),
            2 => Ok(Self::Left),
            3 => Ok(Self::Right),
            _ => Err(BoardError::InvalidDirection(value.to_string())),
        }
    }
}

impl TryFrom<char> for Direction {
    type Error = BoardError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'U' => Ok(Self::Up),
            'D' => Ok(Self::Down),
            'L' => Ok(Self::Left),
            'R' => Ok(Self::Right),
            _ => Err(BoardError::InvalidDirection(c.to_string())),
        }
    }
}

impl FromStr for Direction {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u" | "up" => Ok(Self::Up),
            "d" | "down" => Ok(Self::Down),
            "l" | "left" => Ok(Self::Left),
            "r" | "right" => Ok(Self::Right),
            _ => Err(BoardError::InvalidDirection(s.to_string())),
        }
    }
}

/// Single grid position. `occupant` is a lookup back-reference; the tile's own
/// cell link is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub coord: Coord,
    occupant: Option<TileId>,
}

impl Cell {
    #[inline]
    pub fn occupant(&self) -> Option<TileId> {
        self.occupant
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Fixed `width x height` array of cells, row-major.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Result<Self, BoardError> {
        if width == 0 || height == 0 {
            return Err(BoardError::InvalidDimensions { width, height });
        }
        let cells = (0..width * height)
            .map(|i| Cell {
                coord: Coord::new(i % width, i / width),
                occupant: None,
            })
            .collect();
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn index(&self, coord: Coord) -> Option<usize> {
        (coord.x < self.width && coord.y < self.height).then(|| coord.y * self.width + coord.x)
    }

    #[inline]
    pub fn get_cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.index(Coord::new(x, y)).map(|i| &self.cells[i])
    }

    #[inline]
    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.get_cell(coord.x, coord.y)
    }

    /// Neighbour of `coord` one step in `direction`, or `None` at the edge.
    pub fn adjacent_cell(&self, coord: Coord, direction: Direction) -> Option<&Cell> {
        let (dx, dy) = direction.offset();
        let x = coord.x.checked_add_signed(dx)?;
        let y = coord.y.checked_add_signed(dy)?;
        self.get_cell(x, y)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Cell::is_occupied)
    }

    /// Scan forward from a random start index, wrapping, and return the first
    /// empty cell found. `None` iff every cell is occupied.
    pub fn random_empty_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Coord> {
        let len = self.cells.len();
        let start = rng.gen_range(0..len);
        (0..len)
            .map(|step| &self.cells[(start + step) % len])
            .find(|cell| !cell.is_occupied())
            .map(|cell| cell.coord)
    }

    /// Set the occupant back-reference. Only the paired linkage operations in
    /// `tile` call this.
    pub(crate) fn occupy(&mut self, coord: Coord, tile: TileId) {
        if let Some(i) = self.index(coord) {
            self.cells[i].occupant = Some(tile);
        }
    }

    pub(crate) fn vacate(&mut self, coord: Coord) {
        if let Some(i) = self.index(coord) {
            self.cells[i].occupant = None;
        }
    }

    pub(crate) fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.occupant = None;
        }
    }
}
