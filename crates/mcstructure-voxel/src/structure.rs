//! Fixed-size two-layer voxel structure backed by a shared [`Palette`].
//!
//! Every cell of each [`Layer`] is either void or a reference to a palette entry.
//! Palette entries are created on first use and dropped as soon as no cell in
//! either layer points at them. Block entity data and entities are stored next to
//! the grid and are never touched implicitly by block edits.
//!
//! Coordinates outside the structure are a caller bug: every per-cell method
//! panics on them rather than returning an error.

use mcstructure_coords::{Coordinate, Region, Size};
use quartz_nbt::NbtCompound;
use rustc_hash::FxHashMap;

use crate::block_state::BlockState;
use crate::palette::{Palette, PaletteId};

/// Which of the two block grids an operation addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Layer {
    /// The main block layer.
    #[default]
    Primary,
    /// The overlay layer (e.g. water inside waterlogged blocks).
    Secondary,
}

/// Cell content used when writing: void or a concrete block state.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Block {
    /// No block ("structure void").
    Void,
    /// A block state.
    State(BlockState),
}

impl Block {
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    pub fn as_state(&self) -> Option<&BlockState> {
        match self {
            Self::Void => None,
            Self::State(state) => Some(state),
        }
    }

    /// Returns `true` if a cell currently holding `current` holds this block.
    pub fn matches(&self, current: Option<&BlockState>) -> bool {
        self.as_state() == current
    }
}

impl From<BlockState> for Block {
    fn from(state: BlockState) -> Self {
        Self::State(state)
    }
}

impl From<Option<BlockState>> for Block {
    fn from(state: Option<BlockState>) -> Self {
        state.map_or(Self::Void, Self::State)
    }
}

/// A fixed-size voxel volume with two block layers, block entity data, and entities.
#[derive(Clone, Debug)]
pub struct Structure {
    pub(crate) size: Size,
    pub(crate) world_origin: Coordinate,
    pub(crate) palette: Palette,
    pub(crate) primary: Vec<Option<PaletteId>>,
    pub(crate) secondary: Vec<Option<PaletteId>>,
    /// Block entity payloads keyed by flat cell index.
    pub(crate) block_entity_data: FxHashMap<usize, NbtCompound>,
    pub(crate) entities: Vec<NbtCompound>,
}

impl Structure {
    /// Creates an all-void structure.
    ///
    /// # Panics
    ///
    /// Panics if any axis of `size` is not positive.
    pub fn new(size: Size) -> Self {
        assert!(size.is_valid(), "structure size must be positive on every axis, got {size:?}");
        let volume = size.volume();
        Self {
            size,
            world_origin: Coordinate::default(),
            palette: Palette::new(),
            primary: vec![None; volume],
            secondary: vec![None; volume],
            block_entity_data: FxHashMap::default(),
            entities: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn world_origin(&self) -> Coordinate {
        self.world_origin
    }

    /// Sets the informational world origin. Does not affect cell indexing.
    pub fn set_world_origin(&mut self, origin: Coordinate) {
        self.world_origin = origin;
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Number of distinct block states in use.
    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    /// Returns `true` if at least one cell in either layer holds `state`.
    pub fn exists_in_palette(&self, state: &BlockState) -> bool {
        self.palette.contains(state)
    }

    /// Number of cells across both layers holding `state`.
    pub fn reference_count(&self, state: &BlockState) -> usize {
        self.palette.ref_count(state)
    }

    // --- Cells ---

    /// Returns the block at `point`, or `None` if the cell is void.
    ///
    /// # Panics
    ///
    /// Panics if `point` lies outside the structure.
    pub fn get_block(&self, point: Coordinate, layer: Layer) -> Option<&BlockState> {
        let index = self.flat_index(point);
        self.block_at_index(index, layer)
    }

    /// Writes `block` at `point`. Returns `true` if the cell changed.
    ///
    /// Writing the block a cell already holds (or void onto void) is a no-op and
    /// leaves reference counts untouched.
    ///
    /// # Panics
    ///
    /// Panics if `point` lies outside the structure.
    pub fn set_block(&mut self, point: Coordinate, block: &Block, layer: Layer) -> bool {
        let index = self.flat_index(point);
        let slots = match layer {
            Layer::Primary => &mut self.primary,
            Layer::Secondary => &mut self.secondary,
        };
        let current = slots[index];

        if block.matches(current.and_then(|id| self.palette.get(id))) {
            return false;
        }

        // Release first: the old entry may be removed, never the one we point at next.
        if let Some(id) = current {
            self.palette.release(id);
        }
        slots[index] = block.as_state().map(|state| self.palette.acquire(state));
        true
    }

    /// Writes `block` into every cell of the inclusive box spanned by `from` and `to`.
    ///
    /// Returns the number of cells that changed.
    ///
    /// # Panics
    ///
    /// Panics if either corner lies outside the structure.
    pub fn fill(&mut self, from: Coordinate, to: Coordinate, block: &Block, layer: Layer) -> usize {
        let region = self.region(from, to);
        let mut changed = 0;
        for point in region {
            if self.set_block(point, block, layer) {
                changed += 1;
            }
        }
        changed
    }

    /// Like [`fill`](Self::fill) but only writes cells on the six faces of the box.
    ///
    /// Axes one cell thick contribute no faces: a `5x1x5` box gets its 16-cell
    /// ring, a straight line only its two end cells, and a single cell itself.
    ///
    /// # Panics
    ///
    /// Panics if either corner lies outside the structure.
    pub fn fill_outline(
        &mut self,
        from: Coordinate,
        to: Coordinate,
        block: &Block,
        layer: Layer,
    ) -> usize {
        let region = self.region(from, to);
        let mut changed = 0;
        for point in region {
            if region.is_on_boundary(point) && self.set_block(point, block, layer) {
                changed += 1;
            }
        }
        changed
    }

    /// Writes `block` only into cells of the box currently holding `old`.
    ///
    /// `old` may be [`Block::Void`] to fill empty cells. Returns the number of
    /// cells that changed.
    ///
    /// # Panics
    ///
    /// Panics if either corner lies outside the structure.
    pub fn fill_replace(
        &mut self,
        from: Coordinate,
        to: Coordinate,
        block: &Block,
        old: &Block,
        layer: Layer,
    ) -> usize {
        let region = self.region(from, to);
        let mut changed = 0;
        for point in region {
            if old.matches(self.get_block(point, layer)) && self.set_block(point, block, layer) {
                changed += 1;
            }
        }
        changed
    }

    /// Calls `visit` with the block and position of every cell in the box.
    ///
    /// # Panics
    ///
    /// Panics if either corner lies outside the structure.
    pub fn for_each<F>(&self, from: Coordinate, to: Coordinate, layer: Layer, mut visit: F)
    where
        F: FnMut(Option<&BlockState>, Coordinate),
    {
        for point in self.region(from, to) {
            visit(self.get_block(point, layer), point);
        }
    }

    /// Replaces every occurrence of `old` in both layers with `new`.
    ///
    /// Returns `false` if `old` is not in the palette. When `new` is already in
    /// use the two entries are merged.
    pub fn replace_in_palette(&mut self, new: &BlockState, old: &BlockState) -> bool {
        let Some(old_id) = self.palette.id_of(old) else {
            return false;
        };
        if new == old {
            return true;
        }

        match self.palette.id_of(new) {
            None => self.palette.rename(old_id, new.clone()),
            Some(new_id) => {
                for slot in self.primary.iter_mut().chain(self.secondary.iter_mut()) {
                    if *slot == Some(old_id) {
                        *slot = Some(new_id);
                    }
                }
                self.palette.merge(old_id, new_id);
            }
        }
        true
    }

    // --- Block entity data ---

    /// Returns the block entity payload stored at `point`.
    ///
    /// # Panics
    ///
    /// Panics if `point` lies outside the structure.
    pub fn block_entity_data(&self, point: Coordinate) -> Option<&NbtCompound> {
        let index = self.flat_index(point);
        self.block_entity_data.get(&index)
    }

    /// # Panics
    ///
    /// Panics if `point` lies outside the structure.
    pub fn has_block_entity_data(&self, point: Coordinate) -> bool {
        let index = self.flat_index(point);
        self.block_entity_data.contains_key(&index)
    }

    /// Stores `data` at `point`, replacing any previous payload.
    ///
    /// # Panics
    ///
    /// Panics if `point` lies outside the structure.
    pub fn set_block_entity_data(&mut self, point: Coordinate, data: NbtCompound) {
        let index = self.flat_index(point);
        self.block_entity_data.insert(index, data);
    }

    /// Removes the payload at `point`. Returns whether one existed.
    ///
    /// # Panics
    ///
    /// Panics if `point` lies outside the structure.
    pub fn remove_block_entity_data(&mut self, point: Coordinate) -> bool {
        let index = self.flat_index(point);
        self.block_entity_data.remove(&index).is_some()
    }

    // --- Entities ---

    /// Entities in insertion order.
    pub fn entities(&self) -> &[NbtCompound] {
        &self.entities
    }

    pub fn add_entity(&mut self, entity: NbtCompound) {
        self.entities.push(entity);
    }

    /// Removes and returns the entity at `index`, shifting later entities down.
    pub fn remove_entity(&mut self, index: usize) -> Option<NbtCompound> {
        (index < self.entities.len()).then(|| self.entities.remove(index))
    }

    // --- Internals ---

    pub(crate) fn block_at_index(&self, index: usize, layer: Layer) -> Option<&BlockState> {
        let slots = match layer {
            Layer::Primary => &self.primary,
            Layer::Secondary => &self.secondary,
        };
        slots[index].and_then(|id| self.palette.get(id))
    }

    fn flat_index(&self, point: Coordinate) -> usize {
        match self.size.index_of(point) {
            Some(index) => index,
            None => panic!("{point:?} is outside structure of size {:?}", self.size),
        }
    }

    fn region(&self, from: Coordinate, to: Coordinate) -> Region {
        for corner in [from, to] {
            assert!(
                self.size.contains(corner),
                "{corner:?} is outside structure of size {:?}",
                self.size
            );
        }
        Region::new(from, to)
    }

    fn same_layer(&self, other: &Self, layer: Layer) -> bool {
        (0..self.size.volume()).all(|i| self.block_at_index(i, layer) == other.block_at_index(i, layer))
    }
}

/// Observational equality: size, origin, per-cell blocks in both layers, block
/// entity data, and entities. Palette ids and arena layout are not compared.
impl PartialEq for Structure {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size
            && self.world_origin == other.world_origin
            && self.palette.len() == other.palette.len()
            && self.block_entity_data == other.block_entity_data
            && self.entities == other.entities
            && self.same_layer(other, Layer::Primary)
            && self.same_layer(other, Layer::Secondary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
