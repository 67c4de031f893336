//! Tiles and the tile arena. Every tile/cell link change goes through the
//! paired operations here so `Cell::occupant` and `Tile::cell` always agree.

use crate::grid::{Coord, Grid};
use crate::rank::Rank;
use std::fmt;

/// Handle into the tile arena. Ids of destroyed tiles may be reused by later spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u32);

impl TileId {
    #[cfg(test)]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    rank: Rank,
    /// Already a merge target this turn.
    pub locked: bool,
    /// `None` only between detaching from a cell and destruction.
    cell: Option<Coord>,
}

impl Tile {
    #[inline]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    #[inline]
    pub fn cell(&self) -> Option<Coord> {
        self.cell
    }
}

/// Live tiles, stored in reusable slots.
#[derive(Debug, Clone, Default)]
pub struct Tiles {
    slots: Vec<Option<Tile>>,
    free: Vec<TileId>,
    live: usize,
}

impl Tiles {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.slots.get(id.slot()).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.slots.get_mut(id.slot()).and_then(Option::as_mut)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.slots.iter().flatten()
    }

    /// Create a tile of `rank` and place it on `coord` (which must be empty).
    pub fn create(&mut self, grid: &mut Grid, coord: Coord, rank: Rank) -> TileId {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.slots.push(None);
                TileId((self.slots.len() - 1) as u32)
            }
        };
        self.slots[id.slot()] = Some(Tile {
            rank,
            locked: false,
            cell: None,
        });
        self.live += 1;
        self.spawn(grid, id, coord);
        id
    }

    /// Destroy a tile. It must already be detached from the grid.
    pub fn remove(&mut self, id: TileId) -> Option<Tile> {
        let tile = self.slots.get_mut(id.slot())?.take()?;
        debug_assert!(tile.cell.is_none(), "removing a tile still on the grid");
        self.free.push(id);
        self.live -= 1;
        Some(tile)
    }

    /// Drop every tile and empty every cell.
    pub fn clear(&mut self, grid: &mut Grid) {
        grid.clear();
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }

    pub fn set_rank(&mut self, id: TileId, rank: Rank) {
        if let Some(tile) = self.get_mut(id) {
            tile.rank = rank;
        }
    }

    pub fn unlock_all(&mut self) {
        for tile in self.slots.iter_mut().flatten() {
            tile.locked = false;
        }
    }

    fn detach(&mut self, grid: &mut Grid, id: TileId) -> Option<Coord> {
        let tile = self.get_mut(id)?;
        let from = tile.cell.take()?;
        grid.vacate(from);
        Some(from)
    }

    fn attach(&mut self, grid: &mut Grid, id: TileId, coord: Coord) {
        if let Some(tile) = self.get_mut(id) {
            tile.cell = Some(coord);
            grid.occupy(coord, id);
        }
    }

    /// Instant placement on `coord`, leaving any prior cell.
    pub fn spawn(&mut self, grid: &mut Grid, id: TileId, coord: Coord) {
        self.detach(grid, id);
        self.attach(grid, id, coord);
    }

    /// Move to `coord`. Returns the cell the tile left.
    pub fn slide_to(&mut self, grid: &mut Grid, id: TileId, coord: Coord) -> Option<Coord> {
        let from = self.detach(grid, id);
        self.attach(grid, id, coord);
        from
    }

    /// Leave the current cell without attaching anywhere and lock the tile on
    /// `target`. The caller upgrades the target and removes this tile.
    /// Returns the cell the tile left.
    pub fn merge_into(&mut self, grid: &mut Grid, id: TileId, target: Coord) -> Option<Coord> {
        let from = self.detach(grid, id);
        if let Some(occupant) = grid.cell(target).and_then(|c| c.occupant()) {
            if let Some(tile) = self.get_mut(occupant) {
                tile.locked = true;
            }
        }
        from
    }
}
