//! Mapping between [`Structure`] and the `.mcstructure` tag tree.
//!
//! ```text
//! root
//! ├── format_version: Int (1)
//! ├── size: List[Int; 3]
//! ├── structure_world_origin: List[Int; 3]
//! └── structure
//!     ├── block_indices: List[List[Int]; 2]   (primary, secondary)
//!     ├── entities: List[Compound]
//!     └── palette
//!         └── default
//!             ├── block_palette: List[Compound]
//!             └── block_position_data: Compound  ("<flat index>" -> {block_entity_data})
//! ```
//!
//! Decoding validates everything it reads and fails on the first problem; the
//! error carries the dotted path of the offending key.

use mcstructure_config::CodecConfig;
use mcstructure_coords::{Coordinate, Size};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};

use crate::block_state::BlockState;
use crate::error::StructureError;
use crate::palette::PaletteId;
use crate::structure::{Layer, Structure};

/// Value written to `format_version`. Not checked on decode.
pub const FORMAT_VERSION: i32 = 1;

const BLOCK_PALETTE_PATH: &str = "structure.palette.default.block_palette";
const BLOCK_POSITION_DATA_PATH: &str = "structure.palette.default.block_position_data";

impl Structure {
    /// Decodes a structure with the default [`CodecConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::InvalidSchema`] for any missing key, wrong tag kind,
    /// wrong list length or out-of-range value.
    pub fn from_nbt(root: &NbtCompound) -> Result<Self, StructureError> {
        Self::from_nbt_with(root, &CodecConfig::default())
    }

    /// Decodes a structure using `config`.
    ///
    /// # Errors
    ///
    /// Same as [`from_nbt`](Self::from_nbt). Additionally fails when the declared
    /// volume exceeds [`CodecConfig::max_volume`], and, with
    /// [`CodecConfig::strict_block_position_data`], on `block_position_data`
    /// entries without a `block_entity_data` compound.
    pub fn from_nbt_with(root: &NbtCompound, config: &CodecConfig) -> Result<Self, StructureError> {
        let [x, y, z] = int_triple(root, "", "size")?;
        if x <= 0 || y <= 0 || z <= 0 {
            return Err(StructureError::schema(
                "size",
                format!("dimensions must be positive, got [{x}, {y}, {z}]"),
            ));
        }
        let size = Size::new(x, y, z);
        let [ox, oy, oz] = int_triple(root, "", "structure_world_origin")?;

        let volume = match size.checked_volume() {
            Some(volume) if (volume as u64) <= config.max_volume => volume,
            _ => {
                return Err(StructureError::schema(
                    "size",
                    format!("volume exceeds the limit of {} cells", config.max_volume),
                ));
            }
        };

        let body = required_compound(root, "", "structure")?;
        let palettes = required_compound(body, "structure", "palette")?;
        let default = required_compound(palettes, "structure.palette", "default")?;
        let block_palette = required_list(default, "structure.palette.default", "block_palette")?;
        // Shape-check the index lists before allocating `volume` slots per layer.
        let layers = layer_lists(body, volume)?;

        let mut structure = Structure::new(size);
        structure.world_origin = Coordinate::new(ox, oy, oz);

        // Palette position -> arena id. Duplicate nodes share one entry.
        let mut ids = Vec::with_capacity(block_palette.len());
        for (i, tag) in block_palette.iter().enumerate() {
            let path = format!("{BLOCK_PALETTE_PATH}[{i}]");
            let NbtTag::Compound(node) = tag else {
                return Err(StructureError::schema(
                    path,
                    format!("expected compound, found {}", tag_kind(tag)),
                ));
            };
            let state = BlockState::decode_at(node, &path)?;
            ids.push(structure.palette.insert_unreferenced(state));
        }

        for (i, (indices, layer)) in layers.into_iter().zip([Layer::Primary, Layer::Secondary]).enumerate() {
            let path = format!("structure.block_indices[{i}]");
            structure.decode_layer(indices, layer, &ids, &path)?;
        }

        let purged = structure.palette.purge_unreferenced();
        if purged > 0 {
            tracing::debug!("Dropped {} unreferenced palette entries", purged);
        }

        let positions = required_compound(default, "structure.palette.default", "block_position_data")?;
        for (key, value) in positions.inner() {
            let path = join_path(BLOCK_POSITION_DATA_PATH, key);
            let index = parse_flat_index(key, volume).ok_or_else(|| {
                StructureError::schema(
                    path.clone(),
                    format!("key must be a decimal cell index below {volume}"),
                )
            })?;
            match value {
                NbtTag::Compound(entry) => match entry.inner().get("block_entity_data") {
                    Some(NbtTag::Compound(data)) => {
                        structure.block_entity_data.insert(index, data.clone());
                    }
                    _ => skip_position_entry(&path, "no block_entity_data compound", config)?,
                },
                other => skip_position_entry(
                    &path,
                    &format!("expected compound, found {}", tag_kind(other)),
                    config,
                )?,
            }
        }

        let entities = required_list(body, "structure", "entities")?;
        for (i, tag) in entities.iter().enumerate() {
            let NbtTag::Compound(entity) = tag else {
                return Err(StructureError::schema(
                    format!("structure.entities[{i}]"),
                    format!("expected compound, found {}", tag_kind(tag)),
                ));
            };
            structure.entities.push(entity.clone());
        }

        tracing::debug!(
            "Decoded structure {}x{}x{}: {} palette entries, {} block entities, {} entities",
            x,
            y,
            z,
            structure.palette.len(),
            structure.block_entity_data.len(),
            structure.entities.len()
        );
        Ok(structure)
    }

    /// Encodes the structure as a tag tree.
    ///
    /// Palette entries are written in ascending [`BlockState`] order and
    /// `block_indices` refer to positions in that order (`-1` for void).
    pub fn to_nbt(&self) -> NbtCompound {
        let positions = self.palette.positions();
        let encode_layer = |slots: &[Option<PaletteId>]| -> NbtTag {
            let indices: Vec<NbtTag> = slots
                .iter()
                .map(|slot| NbtTag::Int(slot.map_or(-1, |id| positions[id.0 as usize])))
                .collect();
            NbtTag::List(NbtList::from(indices))
        };

        let block_palette: Vec<NbtTag> = self
            .palette
            .iter()
            .map(|(state, _)| NbtTag::Compound(state.to_nbt()))
            .collect();

        let mut block_position_data = NbtCompound::new();
        for (index, data) in &self.block_entity_data {
            let mut entry = NbtCompound::new();
            entry.insert("block_entity_data", NbtTag::Compound(data.clone()));
            block_position_data.insert(index.to_string(), NbtTag::Compound(entry));
        }

        let mut default = NbtCompound::new();
        default.insert("block_palette", NbtTag::List(NbtList::from(block_palette)));
        default.insert("block_position_data", NbtTag::Compound(block_position_data));

        let mut palettes = NbtCompound::new();
        palettes.insert("default", NbtTag::Compound(default));

        let entities: Vec<NbtTag> = self.entities.iter().cloned().map(NbtTag::Compound).collect();

        let mut body = NbtCompound::new();
        body.insert(
            "block_indices",
            NbtTag::List(NbtList::from(vec![
                encode_layer(&self.primary),
                encode_layer(&self.secondary),
            ])),
        );
        body.insert("entities", NbtTag::List(NbtList::from(entities)));
        body.insert("palette", NbtTag::Compound(palettes));

        let mut root = NbtCompound::new();
        root.insert("format_version", NbtTag::Int(FORMAT_VERSION));
        root.insert("size", int_list([self.size.x, self.size.y, self.size.z]));
        root.insert(
            "structure_world_origin",
            int_list([self.world_origin.x, self.world_origin.y, self.world_origin.z]),
        );
        root.insert("structure", NbtTag::Compound(body));
        root
    }

    /// Points every slot of `layer` at the palette entry its index names.
    ///
    /// `indices` must already hold exactly one entry per cell.
    fn decode_layer(
        &mut self,
        indices: &NbtList,
        layer: Layer,
        ids: &[PaletteId],
        path: &str,
    ) -> Result<(), StructureError> {
        let slots = match layer {
            Layer::Primary => &mut self.primary,
            Layer::Secondary => &mut self.secondary,
        };
        for (cell, tag) in indices.iter().enumerate() {
            let NbtTag::Int(value) = *tag else {
                return Err(StructureError::schema(
                    format!("{path}[{cell}]"),
                    format!("expected int, found {}", tag_kind(tag)),
                ));
            };
            if value == -1 {
                continue;
            }
            let Some(&id) = usize::try_from(value).ok().and_then(|i| ids.get(i)) else {
                return Err(StructureError::schema(
                    format!("{path}[{cell}]"),
                    format!("palette index {value} out of range for {} entries", ids.len()),
                ));
            };
            slots[cell] = Some(id);
            self.palette.add_ref(id);
        }
        Ok(())
    }
}

/// Returns the primary and secondary index lists after checking their count,
/// kind and length.
fn layer_lists(body: &NbtCompound, volume: usize) -> Result<[&NbtList; 2], StructureError> {
    let layers = required_list(body, "structure", "block_indices")?;
    if layers.len() != 2 {
        return Err(StructureError::schema(
            "structure.block_indices",
            format!("expected 2 layers, found {}", layers.len()),
        ));
    }
    let mut lists = Vec::with_capacity(2);
    for (i, tag) in layers.iter().enumerate() {
        let path = format!("structure.block_indices[{i}]");
        let NbtTag::List(indices) = tag else {
            return Err(StructureError::schema(
                path,
                format!("expected list, found {}", tag_kind(tag)),
            ));
        };
        if indices.len() != volume {
            return Err(StructureError::schema(
                path,
                format!("expected {volume} entries, found {}", indices.len()),
            ));
        }
        lists.push(indices);
    }
    Ok([lists[0], lists[1]])
}

fn skip_position_entry(path: &str, reason: &str, config: &CodecConfig) -> Result<(), StructureError> {
    if config.strict_block_position_data {
        return Err(StructureError::schema(path, reason));
    }
    tracing::debug!("Skipping {}: {}", path, reason);
    Ok(())
}

/// Accepts plain decimal digits only, so `"+3"` and `" 3"` are rejected.
fn parse_flat_index(key: &str, volume: usize) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<usize>().ok().filter(|&index| index < volume)
}

fn int_list(values: [i32; 3]) -> NbtTag {
    NbtTag::List(NbtList::from(Vec::from(values.map(NbtTag::Int))))
}

// --- Lookup helpers shared with the block state codec ---

/// Appends `key` to a dotted path.
pub(crate) fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Human-readable tag kind for error messages.
pub(crate) fn tag_kind(tag: &NbtTag) -> &'static str {
    match tag {
        NbtTag::Byte(_) => "byte",
        NbtTag::Short(_) => "short",
        NbtTag::Int(_) => "int",
        NbtTag::Long(_) => "long",
        NbtTag::Float(_) => "float",
        NbtTag::Double(_) => "double",
        NbtTag::ByteArray(_) => "byte array",
        NbtTag::String(_) => "string",
        NbtTag::List(_) => "list",
        NbtTag::Compound(_) => "compound",
        NbtTag::IntArray(_) => "int array",
        NbtTag::LongArray(_) => "long array",
    }
}

fn required<'a>(compound: &'a NbtCompound, path: &str, key: &str) -> Result<&'a NbtTag, StructureError> {
    compound
        .inner()
        .get(key)
        .ok_or_else(|| StructureError::schema(join_path(path, key), "missing"))
}

fn mistyped(path: &str, key: &str, expected: &str, found: &NbtTag) -> StructureError {
    StructureError::schema(
        join_path(path, key),
        format!("expected {expected}, found {}", tag_kind(found)),
    )
}

pub(crate) fn required_compound<'a>(
    compound: &'a NbtCompound,
    path: &str,
    key: &str,
) -> Result<&'a NbtCompound, StructureError> {
    match required(compound, path, key)? {
        NbtTag::Compound(inner) => Ok(inner),
        other => Err(mistyped(path, key, "compound", other)),
    }
}

pub(crate) fn required_list<'a>(
    compound: &'a NbtCompound,
    path: &str,
    key: &str,
) -> Result<&'a NbtList, StructureError> {
    match required(compound, path, key)? {
        NbtTag::List(list) => Ok(list),
        other => Err(mistyped(path, key, "list", other)),
    }
}

pub(crate) fn required_int(compound: &NbtCompound, path: &str, key: &str) -> Result<i32, StructureError> {
    match required(compound, path, key)? {
        NbtTag::Int(value) => Ok(*value),
        other => Err(mistyped(path, key, "int", other)),
    }
}

pub(crate) fn required_string<'a>(
    compound: &'a NbtCompound,
    path: &str,
    key: &str,
) -> Result<&'a str, StructureError> {
    match required(compound, path, key)? {
        NbtTag::String(value) => Ok(value),
        other => Err(mistyped(path, key, "string", other)),
    }
}

/// Reads a list of exactly three Int tags.
fn int_triple(compound: &NbtCompound, path: &str, key: &str) -> Result<[i32; 3], StructureError> {
    let list = required_list(compound, path, key)?;
    let full = join_path(path, key);
    if list.len() != 3 {
        return Err(StructureError::schema(
            full,
            format!("expected 3 ints, found {} entries", list.len()),
        ));
    }
    let mut out = [0; 3];
    for (i, tag) in list.iter().enumerate() {
        match tag {
            NbtTag::Int(value) => out[i] = *value,
            other => {
                return Err(StructureError::schema(
                    format!("{full}[{i}]"),
                    format!("expected int, found {}", tag_kind(other)),
                ));
            }
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
