use ndarray::{Array2, ArrayView1};
use rand::prelude::*;
use serde::Deserialize;
use std::ops::{Index, IndexMut};

use crate::consts::emoji;
use crate::*;

/// Grid of cells stored row-major, the flat index is `y * width + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    cells: Array2<Cell>,
}

/// Field contents as found in storage, current saves use the bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCells {
    Bare(Vec<Cell>),
    Wrapped { cells: Vec<Cell> },
}

pub(crate) fn sample_food<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    emoji::FOOD[rng.random_range(0..emoji::FOOD.len())]
}

impl Field {
    pub const MIN_SIDE: Coord = 3;

    /// Creates a field of plain cells, see [`Field::reset`] for decorated ones.
    pub fn new((width, height): Coord2) -> Result<Self> {
        Self::validate_dims(width, height)?;
        Ok(Self {
            cells: Array2::from_shape_fn((height, width), |_| Cell::default()),
        })
    }

    fn validate_dims(width: Coord, height: Coord) -> Result<()> {
        if width < Self::MIN_SIDE || height < Self::MIN_SIDE {
            Err(GameError::InvalidDimensions(width, height))
        } else {
            Ok(())
        }
    }

    pub fn width(&self) -> Coord {
        self.cells.ncols()
    }

    pub fn height(&self) -> Coord {
        self.cells.nrows()
    }

    pub fn dims(&self) -> Coord2 {
        (self.width(), self.height())
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn set_size<R: Rng + ?Sized>(&mut self, (width, height): Coord2, rng: &mut R) -> Result<&mut Self> {
        Self::validate_dims(width, height)?;
        self.cells = Array2::from_shape_fn((height, width), |_| Cell::default());
        Ok(self.reset(rng))
    }

    /// Replaces every cell with a fresh one showing a random food emoji.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        for cell in self.cells.iter_mut() {
            *cell = Cell::new(sample_food(rng));
        }
        self
    }

    pub fn clear(&mut self, content: &str, with_clicks: bool) -> &mut Self {
        for cell in self.cells.iter_mut() {
            cell.clear(content, with_clicks);
        }
        self
    }

    /// Enables every cell that is not locked.
    pub fn enable_cells(&mut self) -> &mut Self {
        for cell in self.cells.iter_mut() {
            cell.enabled = !cell.locked;
        }
        self
    }

    pub fn disable_cells(&mut self) -> &mut Self {
        for cell in self.cells.iter_mut() {
            cell.enabled = false;
        }
        self
    }

    pub fn show_cells(&mut self) -> &mut Self {
        for cell in self.cells.iter_mut() {
            cell.visible = true;
        }
        self
    }

    pub fn hide_cells(&mut self) -> &mut Self {
        for cell in self.cells.iter_mut() {
            cell.visible = false;
        }
        self
    }

    pub fn total_clicks(&self) -> u32 {
        self.cells.iter().map(|cell| cell.clicks).sum()
    }

    pub fn coords_of(&self, index: CellIndex) -> Coord2 {
        (index % self.width(), index / self.width())
    }

    pub fn index_of(&self, (x, y): Coord2) -> CellIndex {
        y * self.width() + x
    }

    pub fn validate_index(&self, index: CellIndex) -> Result<CellIndex> {
        if index < self.size() {
            Ok(index)
        } else {
            Err(GameError::InvalidCellIndex(index))
        }
    }

    pub fn get(&self, index: CellIndex) -> Option<&Cell> {
        (index < self.size()).then(|| &self.cells[self.coords_of(index).to_nd_index()])
    }

    pub fn get_mut(&mut self, index: CellIndex) -> Option<&mut Cell> {
        if index < self.size() {
            let nd_index = self.coords_of(index).to_nd_index();
            Some(&mut self.cells[nd_index])
        } else {
            None
        }
    }

    /// Cells in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    pub fn position(&self, predicate: impl Fn(&Cell) -> bool) -> Option<CellIndex> {
        self.cells.iter().position(predicate)
    }

    pub fn all(&self, predicate: impl Fn(&Cell) -> bool) -> bool {
        self.cells.iter().all(predicate)
    }

    pub fn row(&self, y: Coord) -> ArrayView1<'_, Cell> {
        self.cells.row(y)
    }

    pub fn column(&self, x: Coord) -> ArrayView1<'_, Cell> {
        self.cells.column(x)
    }

    /// Exchanges the contents of two slots.
    pub fn swap(&mut self, a: CellIndex, b: CellIndex) {
        let a = self.coords_of(a).to_nd_index();
        let b = self.coords_of(b).to_nd_index();
        self.cells.swap(a, b);
    }

    /// Fisher-Yates over the whole field.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in (1..self.size()).rev() {
            let j = rng.random_range(0..=i);
            self.swap(i, j);
        }
    }

    /// Base click on a cell, false when the cell does not accept clicks.
    pub fn press(&mut self, index: CellIndex) -> bool {
        self.get_mut(index).is_some_and(Cell::press)
    }

    pub fn neighbors(&self, index: CellIndex) -> impl Iterator<Item = CellIndex> + use<> {
        let width = self.width();
        NeighborIter::new(self.coords_of(index), self.dims()).map(move |(x, y)| y * width + x)
    }

    /// Whether `b` is directly above, below, left or right of `a`.
    pub fn is_orthogonal_neighbor(&self, a: CellIndex, b: CellIndex) -> bool {
        let width = self.width();
        let size = self.size();
        if a >= size || b >= size {
            return false;
        }

        match b as isize - a as isize {
            1 => a % width != width - 1,
            -1 => a % width != 0,
            delta if delta == width as isize => a + width < size,
            delta if delta == -(width as isize) => a >= width,
            _ => false,
        }
    }

    /// Display state of every cell, in index order.
    pub fn snapshot(&self) -> Vec<Cell> {
        self.cells.iter().cloned().collect()
    }

    /// Overwrites cells from a stored snapshot, returns how many were restored.
    pub fn restore_cells(&mut self, stored: Vec<Cell>) -> usize {
        let mut restored = 0;
        for (slot, cell) in self.cells.iter_mut().zip(stored) {
            let puzzle_id = slot.puzzle_id;
            *slot = Cell { puzzle_id, ..cell };
            restored += 1;
        }
        restored
    }

    /// Accepts both the bare array and the older `{ "cells": [...] }` shape.
    pub fn cells_from_value(value: serde_json::Value) -> serde_json::Result<Vec<Cell>> {
        Ok(match serde_json::from_value(value)? {
            StoredCells::Bare(cells) => cells,
            StoredCells::Wrapped { cells } => cells,
        })
    }
}

impl Index<CellIndex> for Field {
    type Output = Cell;

    fn index(&self, index: CellIndex) -> &Self::Output {
        &self.cells[self.coords_of(index).to_nd_index()]
    }
}

impl IndexMut<CellIndex> for Field {
    fn index_mut(&mut self, index: CellIndex) -> &mut Self::Output {
        let nd_index = self.coords_of(index).to_nd_index();
        &mut self.cells[nd_index]
    }
}
