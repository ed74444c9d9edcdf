//! Reference-counted block state palette shared by both layers of a structure.
//!
//! Entries live in a dense arena addressed by [`PaletteId`], so ids held in cell
//! slots stay valid while other entries are added or removed. A sorted reverse
//! lookup maps each [`BlockState`] to its id and defines the palette order used
//! when encoding.

use std::collections::BTreeMap;

use crate::block_state::BlockState;

/// Stable handle to a palette entry. Freed ids are reused by later insertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaletteId(pub u32);

impl PaletteId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct PaletteEntry {
    state: BlockState,
    ref_count: usize,
}

/// Deduplicated set of block states, each with the number of cells using it.
///
/// Entries whose count drops to zero are removed immediately. The only exception
/// is the window during decoding, where entries are inserted unreferenced and then
/// either picked up by cell indices or purged.
#[derive(Clone, Debug, Default)]
pub struct Palette {
    /// Arena where `index == PaletteId.0`; `None` marks a free slot.
    entries: Vec<Option<PaletteEntry>>,
    /// Free arena slots, reused before the arena grows.
    free: Vec<PaletteId>,
    /// Reverse lookup in block state order.
    lookup: BTreeMap<BlockState, PaletteId>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct block states.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Returns the block state behind `id`, or `None` for a freed id.
    pub fn get(&self, id: PaletteId) -> Option<&BlockState> {
        self.entry(id).map(|entry| &entry.state)
    }

    /// Returns the id of an entry equal to `state`.
    pub fn id_of(&self, state: &BlockState) -> Option<PaletteId> {
        self.lookup.get(state).copied()
    }

    /// Returns `true` if an entry equal to `state` is referenced by at least one cell.
    pub fn contains(&self, state: &BlockState) -> bool {
        self.ref_count(state) > 0
    }

    /// Number of cells (across both layers) referencing `state`.
    pub fn ref_count(&self, state: &BlockState) -> usize {
        self.id_of(state)
            .and_then(|id| self.entry(id))
            .map_or(0, |entry| entry.ref_count)
    }

    /// Entries in block state order with their reference counts.
    ///
    /// This is the order in which the palette is written to the tag tree.
    pub fn iter(&self) -> impl Iterator<Item = (&BlockState, usize)> {
        self.lookup
            .values()
            .filter_map(|&id| self.entry(id))
            .map(|entry| (&entry.state, entry.ref_count))
    }

    /// Table mapping arena slot to encode position (`-1` for free slots).
    ///
    /// Built once per encode so each cell resolves its position in O(1).
    pub(crate) fn positions(&self) -> Vec<i32> {
        let mut table = vec![-1; self.entries.len()];
        for (position, id) in self.lookup.values().enumerate() {
            table[id.index()] = position as i32;
        }
        table
    }

    /// Finds or creates the entry for `state` and adds one reference.
    pub(crate) fn acquire(&mut self, state: &BlockState) -> PaletteId {
        let id = match self.id_of(state) {
            Some(id) => id,
            None => self.insert(state.clone()),
        };
        self.add_ref(id);
        id
    }

    /// Finds or creates the entry for `state` without adding a reference.
    pub(crate) fn insert_unreferenced(&mut self, state: BlockState) -> PaletteId {
        match self.id_of(&state) {
            Some(id) => id,
            None => self.insert(state),
        }
    }

    pub(crate) fn add_ref(&mut self, id: PaletteId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.ref_count += 1;
        }
    }

    /// Drops one reference, removing the entry when none remain.
    pub(crate) fn release(&mut self, id: PaletteId) {
        let Some(entry) = self.entry_mut(id) else {
            return;
        };
        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count == 0 {
            self.remove(id);
        }
    }

    /// Removes every entry no cell references. Returns how many were removed.
    pub(crate) fn purge_unreferenced(&mut self) -> usize {
        let unused: Vec<PaletteId> = self
            .lookup
            .values()
            .copied()
            .filter(|&id| self.entry(id).is_some_and(|entry| entry.ref_count == 0))
            .collect();
        for &id in &unused {
            self.remove(id);
        }
        unused.len()
    }

    /// Swaps the block state stored under `id` for `state`, keeping the id and count.
    ///
    /// `state` must not already be in the palette.
    pub(crate) fn rename(&mut self, id: PaletteId, state: BlockState) {
        debug_assert!(!self.lookup.contains_key(&state), "rename target already present");
        let Some(entry) = self.entries.get_mut(id.index()).and_then(Option::as_mut) else {
            return;
        };
        self.lookup.remove(&entry.state);
        self.lookup.insert(state.clone(), id);
        entry.state = state;
    }

    /// Folds the references of `from` into `into` and removes `from`.
    ///
    /// Callers must already have retargeted every cell from `from` to `into`.
    pub(crate) fn merge(&mut self, from: PaletteId, into: PaletteId) {
        let moved = self.entry(from).map_or(0, |entry| entry.ref_count);
        if let Some(entry) = self.entry_mut(into) {
            entry.ref_count += moved;
        }
        self.remove(from);
    }

    fn insert(&mut self, state: BlockState) -> PaletteId {
        tracing::trace!("palette: adding {}", state.name());
        let entry = PaletteEntry {
            state: state.clone(),
            ref_count: 0,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.entries[id.index()] = Some(entry);
                id
            }
            None => {
                self.entries.push(Some(entry));
                PaletteId((self.entries.len() - 1) as u32)
            }
        };
        self.lookup.insert(state, id);
        id
    }

    fn remove(&mut self, id: PaletteId) {
        if let Some(entry) = self.entries.get_mut(id.index()).and_then(Option::take) {
            tracing::trace!("palette: removing {}", entry.state.name());
            self.lookup.remove(&entry.state);
            self.free.push(id);
        }
    }

    fn entry(&self, id: PaletteId) -> Option<&PaletteEntry> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }

    fn entry_mut(&mut self, id: PaletteId) -> Option<&mut PaletteEntry> {
        self.entries.get_mut(id.index()).and_then(Option::as_mut)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stone() -> BlockState {
        BlockState::new("minecraft:stone")
    }

    fn dirt() -> BlockState {
        BlockState::new("minecraft:dirt")
    }

    #[test]
    fn test_acquire_deduplicates() {
        let mut palette = Palette::new();
        let a = palette.acquire(&stone());
        let b = palette.acquire(&stone());
        assert_eq!(a, b);
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.ref_count(&stone()), 2);
    }

    #[test]
    fn test_release_removes_at_zero() {
        let mut palette = Palette::new();
        let id = palette.acquire(&stone());
        palette.acquire(&stone());

        palette.release(id);
        assert!(palette.contains(&stone()));
        palette.release(id);
        assert!(!palette.contains(&stone()));
        assert!(palette.is_empty());
        assert_eq!(palette.get(id), None);
    }

    #[test]
    fn test_freed_ids_are_reused() {
        let mut palette = Palette::new();
        let stone_id = palette.acquire(&stone());
        let dirt_id = palette.acquire(&dirt());
        palette.release(stone_id);

        let glass_id = palette.acquire(&BlockState::new("minecraft:glass"));
        assert_eq!(glass_id, stone_id);
        // Other entries are unaffected by the reuse.
        assert_eq!(palette.get(dirt_id), Some(&dirt()));
    }

    #[test]
    fn test_iter_follows_block_state_order() {
        let mut palette = Palette::new();
        palette.acquire(&stone());
        palette.acquire(&dirt());
        palette.acquire(&BlockState::new("minecraft:andesite"));

        let names: Vec<_> = palette.iter().map(|(state, _)| state.name().to_string()).collect();
        assert_eq!(names, ["minecraft:andesite", "minecraft:dirt", "minecraft:stone"]);
    }

    #[test]
    fn test_positions_match_iteration_order() {
        let mut palette = Palette::new();
        let stone_id = palette.acquire(&stone());
        let dirt_id = palette.acquire(&dirt());
        let positions = palette.positions();
        assert_eq!(positions[dirt_id.index()], 0);
        assert_eq!(positions[stone_id.index()], 1);

        palette.release(dirt_id);
        let positions = palette.positions();
        assert_eq!(positions[dirt_id.index()], -1);
        assert_eq!(positions[stone_id.index()], 0);
    }

    #[test]
    fn test_purge_unreferenced() {
        let mut palette = Palette::new();
        let kept = palette.insert_unreferenced(stone());
        palette.insert_unreferenced(dirt());
        palette.add_ref(kept);

        assert_eq!(palette.purge_unreferenced(), 1);
        assert_eq!(palette.len(), 1);
        assert!(palette.contains(&stone()));
        assert_eq!(palette.id_of(&dirt()), None);
    }

    #[test]
    fn test_rename_keeps_id_and_count() {
        let mut palette = Palette::new();
        let id = palette.acquire(&stone());
        palette.acquire(&stone());

        palette.rename(id, dirt());
        assert_eq!(palette.id_of(&dirt()), Some(id));
        assert_eq!(palette.ref_count(&dirt()), 2);
        assert_eq!(palette.id_of(&stone()), None);
    }

    #[test]
    fn test_merge_sums_counts() {
        let mut palette = Palette::new();
        let stone_id = palette.acquire(&stone());
        let dirt_id = palette.acquire(&dirt());
        palette.acquire(&dirt());

        palette.merge(stone_id, dirt_id);
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.ref_count(&dirt()), 3);
        assert!(!palette.contains(&stone()));
    }
}
