//! Dense slot grid holding at most one item per slot.

use merge_farm_core::{GridError, ItemId, SlotCoord};

/// Fixed-size grid of slots addressed by column and row.
#[derive(Clone, Debug)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<ItemId>>,
}

impl Grid {
    /// Creates an empty grid with the provided dimensions.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    /// Provides the dimensions of the grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Reports whether the slot holds no item.
    pub fn is_empty(&self, slot: SlotCoord) -> Result<bool, GridError> {
        self.occupant(slot).map(|occupant| occupant.is_none())
    }

    /// Returns the item occupying the slot, if any.
    pub fn occupant(&self, slot: SlotCoord) -> Result<Option<ItemId>, GridError> {
        let index = self.checked_index(slot)?;
        Ok(self.cells[index])
    }

    /// Places an item into an empty slot.
    pub fn place(&mut self, item: ItemId, slot: SlotCoord) -> Result<(), GridError> {
        let index = self.checked_index(slot)?;
        let cell = &mut self.cells[index];
        if cell.is_some() {
            return Err(GridError::SlotOccupied { slot });
        }
        *cell = Some(item);
        Ok(())
    }

    /// Clears the slot, returning the item that occupied it.
    ///
    /// Clearing an empty slot is a no-op.
    pub fn remove(&mut self, slot: SlotCoord) -> Result<Option<ItemId>, GridError> {
        let index = self.checked_index(slot)?;
        Ok(self.cells[index].take())
    }

    /// Enumerates empty slots in row-major order.
    #[must_use]
    pub fn empty_slots(&self) -> Vec<SlotCoord> {
        self.slots()
            .filter(|(_, occupant)| occupant.is_none())
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Iterates every slot with its occupant in row-major order.
    pub fn slots(&self) -> impl Iterator<Item = (SlotCoord, Option<ItemId>)> + '_ {
        let columns = self.columns.max(1);
        self.cells.iter().enumerate().map(move |(index, occupant)| {
            let index = index as u32;
            (SlotCoord::new(index % columns, index / columns), *occupant)
        })
    }

    pub(crate) fn occupy(&mut self, item: ItemId, slot: SlotCoord) {
        if let Some(index) = self.index(slot) {
            if let Some(cell) = self.cells.get_mut(index) {
                *cell = Some(item);
            }
        }
    }

    pub(crate) fn vacate(&mut self, slot: SlotCoord) {
        if let Some(index) = self.index(slot) {
            if let Some(cell) = self.cells.get_mut(index) {
                *cell = None;
            }
        }
    }

    fn checked_index(&self, slot: SlotCoord) -> Result<usize, GridError> {
        self.index(slot).ok_or(GridError::OutOfBounds { slot })
    }

    fn index(&self, slot: SlotCoord) -> Option<usize> {
        if slot.column() < self.columns && slot.row() < self.rows {
            let row = usize::try_from(slot.row()).ok()?;
            let column = usize::try_from(slot.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
