//! Nibble-addressed program/data memory.

/// Number of cells in the reference Micro4 memory (8-bit address bus).
pub const MEMORY_CELLS: usize = 256;
/// Mask applied to every stored cell value.
pub const CELL_MASK: u8 = 0x0F;

/// Fixed-size memory of 4-bit cells, exclusively owned by the ISA core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    cells: Box<[u8]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(MEMORY_CELLS)
    }
}

impl Memory {
    /// Creates a zeroed memory with `cells` cells, clamped to `1..=256`.
    #[must_use]
    pub fn new(cells: usize) -> Self {
        Self {
            cells: vec![0; cells.clamp(1, MEMORY_CELLS)].into_boxed_slice(),
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; memory has at least one cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns true when `addr` names a cell.
    #[must_use]
    pub fn contains(&self, addr: usize) -> bool {
        addr < self.cells.len()
    }

    /// Reads one cell; `None` past the end.
    #[must_use]
    pub fn read(&self, addr: usize) -> Option<u8> {
        self.cells.get(addr).map(|cell| cell & CELL_MASK)
    }

    /// Writes one cell, masking to a nibble. Returns `false` past the end.
    pub fn write(&mut self, addr: usize, value: u8) -> bool {
        self.cells.get_mut(addr).map_or(false, |cell| {
            *cell = value & CELL_MASK;
            true
        })
    }

    /// Copies `words` into memory from `start`, masking each to a nibble.
    ///
    /// Words that would land past the end are dropped. Returns the number of
    /// cells written.
    pub fn load(&mut self, words: &[u8], start: usize) -> usize {
        let Some(dest) = self.cells.get_mut(start..) else {
            return 0;
        };
        let count = words.len().min(dest.len());
        for (cell, word) in dest.iter_mut().zip(&words[..count]) {
            *cell = word & CELL_MASK;
        }
        count
    }

    /// Zeroes every cell.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Bulk copy-out of the whole memory image.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.cells.to_vec()
    }

    /// Read-only view for disassembly and snapshots.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}
