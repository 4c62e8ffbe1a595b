//! Bounded ring buffer for lines scrolled off the top of the viewport.

use std::collections::VecDeque;

use crate::cell::Cell;

/// One line captured from the grid as it scrolled away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollbackLine {
    pub cells: Vec<Cell>,
}

/// FIFO ring of scrolled-off lines.
///
/// Index 0 is the oldest line. When full, pushing evicts the oldest.
/// Capacity 0 disables scrollback entirely.
#[derive(Debug, Clone, Default)]
pub struct Scrollback {
    lines: VecDeque<ScrollbackLine>,
    capacity: usize,
}

impl Scrollback {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a row copied out of the grid, evicting the oldest line if full.
    pub fn push_row(&mut self, cells: &[Cell]) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(ScrollbackLine {
            cells: cells.to_vec(),
        });
    }

    /// Line by age: 0 is oldest, `len() - 1` is newest.
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&ScrollbackLine> {
        self.lines.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScrollbackLine> {
        self.lines.iter()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Change capacity, dropping oldest lines if the new bound is smaller.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.lines.len() > capacity {
            self.lines.pop_front();
        }
    }
}
