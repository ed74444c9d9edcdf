//! Block states: a named, versioned, typed attribute bag identifying one block variant.
//!
//! [`BlockState`] is the unit stored in a structure palette, so it carries a total
//! order (`name`, then `version`, then attributes key-by-key) and is used as a
//! deduplication key. It is immutable once built.

use std::collections::BTreeMap;

use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};

use crate::error::StructureError;
use crate::structure_nbt::{join_path, required_compound, required_int, required_string, tag_kind};

/// Block state schema version written when none is given (1.16.100 era).
pub const COMPATIBILITY_VERSION: i32 = 17_959_425;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Value of a single block state attribute.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlockStateValue {
    /// Stored as a `Byte` tag (0 or 1).
    Bool(bool),
    /// Stored as an `Int` tag.
    Int(i32),
    /// Stored as a `String` tag.
    String(String),
}

/// A block variant: `name`, schema `version`, and ordered attributes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockState {
    name: String,
    version: i32,
    states: BTreeMap<String, BlockStateValue>,
}

impl BlockStateValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn to_tag(&self) -> NbtTag {
        match self {
            Self::Bool(b) => NbtTag::Byte(i8::from(*b)),
            Self::Int(i) => NbtTag::Int(*i),
            Self::String(s) => NbtTag::String(s.clone()),
        }
    }

    fn from_tag(tag: &NbtTag, path: &str) -> Result<Self, StructureError> {
        match tag {
            NbtTag::Byte(b) => Ok(Self::Bool(*b != 0)),
            NbtTag::Int(i) => Ok(Self::Int(*i)),
            NbtTag::String(s) => Ok(Self::String(s.clone())),
            other => Err(StructureError::schema(
                path,
                format!("expected byte, int or string, found {}", tag_kind(other)),
            )),
        }
    }
}

impl From<bool> for BlockStateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for BlockStateValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for BlockStateValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for BlockStateValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// ---------------------------------------------------------------------------
// BlockState
// ---------------------------------------------------------------------------

impl BlockState {
    /// Creates a block state with no attributes and [`COMPATIBILITY_VERSION`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: COMPATIBILITY_VERSION,
            states: BTreeMap::new(),
        }
    }

    /// Creates a block state with the given attributes and [`COMPATIBILITY_VERSION`].
    ///
    /// A key given twice keeps its last value.
    pub fn with_states<I, K, V>(name: impl Into<String>, states: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BlockStateValue>,
    {
        Self::with_version(name, states, COMPATIBILITY_VERSION)
    }

    /// Creates a block state with an explicit schema version.
    pub fn with_version<I, K, V>(name: impl Into<String>, states: I, version: i32) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BlockStateValue>,
    {
        Self {
            name: name.into(),
            version,
            states: states
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns this block state with one more attribute set.
    pub fn with_state(mut self, key: impl Into<String>, value: impl Into<BlockStateValue>) -> Self {
        self.states.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Returns the attribute stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::NotFound`] if the attribute is absent.
    pub fn value(&self, key: &str) -> Result<&BlockStateValue, StructureError> {
        self.states
            .get(key)
            .ok_or_else(|| StructureError::NotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.states.contains_key(key)
    }

    /// Attributes in ascending key order.
    pub fn states(&self) -> impl Iterator<Item = (&str, &BlockStateValue)> {
        self.states.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encodes as `{name: String, states: Compound, version: Int}`.
    pub fn to_nbt(&self) -> NbtCompound {
        let mut states = NbtCompound::new();
        for (key, value) in &self.states {
            states.insert(key.clone(), value.to_tag());
        }

        let mut tag = NbtCompound::new();
        tag.insert("name", NbtTag::String(self.name.clone()));
        tag.insert("states", NbtTag::Compound(states));
        tag.insert("version", NbtTag::Int(self.version));
        tag
    }

    /// Decodes a block state node.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::InvalidSchema`] if `name`, `states` or `version` is
    /// missing or mistyped, or if an attribute is not a byte, int or string.
    pub fn from_nbt(tag: &NbtCompound) -> Result<Self, StructureError> {
        Self::decode_at(tag, "")
    }

    /// Decodes a block state node located at `path`, used to build error paths.
    pub(crate) fn decode_at(tag: &NbtCompound, path: &str) -> Result<Self, StructureError> {
        let name = required_string(tag, path, "name")?;
        let states_path = join_path(path, "states");
        let nbt_states = required_compound(tag, path, "states")?;

        let mut states = BTreeMap::new();
        for (key, value) in nbt_states.inner() {
            let value = BlockStateValue::from_tag(value, &join_path(&states_path, key))?;
            states.insert(key.clone(), value);
        }

        let version = required_int(tag, path, "version")?;

        Ok(Self {
            name: name.to_string(),
            version,
            states,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stairs() -> BlockState {
        BlockState::with_states(
            "minecraft:oak_stairs",
            [
                ("upside_down_bit", BlockStateValue::Bool(false)),
                ("weirdo_direction", BlockStateValue::Int(2)),
            ],
        )
    }

    #[test]
    fn test_default_version() {
        let stone = BlockState::new("minecraft:stone");
        assert_eq!(stone.version(), COMPATIBILITY_VERSION);
        assert_eq!(stone.states().count(), 0);
    }

    #[test]
    fn test_value_lookup() {
        let block = stairs();
        assert_eq!(block.value("weirdo_direction").unwrap().as_int(), Some(2));
        assert_eq!(block.value("upside_down_bit").unwrap().as_bool(), Some(false));
        assert!(block.contains("upside_down_bit"));
    }

    #[test]
    fn test_value_missing_key_is_not_found() {
        let block = stairs();
        let result = block.value("facing_direction");
        assert_eq!(result, Err(StructureError::NotFound("facing_direction".to_string())));
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = BlockState::new("minecraft:wool")
            .with_state("color", "red")
            .with_state("lit", true);
        let b = BlockState::new("minecraft:wool")
            .with_state("lit", true)
            .with_state("color", "red");
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_version_participates_in_identity() {
        let a = BlockState::with_version("minecraft:stone", [("x", 1)], 1);
        let b = BlockState::with_version("minecraft:stone", [("x", 1)], 2);
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_order_is_name_then_version_then_states() {
        let a = BlockState::with_version("minecraft:a", [("z", 9)], 5);
        let b = BlockState::with_version("minecraft:b", [("a", 0)], 1);
        assert!(a < b, "name dominates");

        let c = BlockState::new("minecraft:a").with_state("a", 1);
        let d = BlockState::new("minecraft:a").with_state("b", 0);
        assert!(c < d, "first differing key decides");

        let e = BlockState::new("minecraft:a").with_state("a", 1);
        let f = BlockState::new("minecraft:a").with_state("a", 2);
        assert!(e < f, "same key compares values");
    }

    #[test]
    fn test_to_nbt_uses_native_tag_kinds() {
        let block = BlockState::new("minecraft:lever")
            .with_state("open_bit", true)
            .with_state("lever_direction", "north")
            .with_state("power", 15);
        let tag = block.to_nbt();

        assert_eq!(tag.inner().get("name"), Some(&NbtTag::String("minecraft:lever".into())));
        assert_eq!(tag.inner().get("version"), Some(&NbtTag::Int(COMPATIBILITY_VERSION)));
        let Some(NbtTag::Compound(states)) = tag.inner().get("states") else {
            panic!("states should be a compound");
        };
        assert_eq!(states.inner().get("open_bit"), Some(&NbtTag::Byte(1)));
        assert_eq!(states.inner().get("power"), Some(&NbtTag::Int(15)));
        assert_eq!(
            states.inner().get("lever_direction"),
            Some(&NbtTag::String("north".into()))
        );
    }

    #[test]
    fn test_nbt_roundtrip() {
        let block = stairs().with_state("wood_type", "spruce");
        assert_eq!(BlockState::from_nbt(&block.to_nbt()).unwrap(), block);
    }

    #[test]
    fn test_from_nbt_byte_decodes_to_bool() {
        let mut states = NbtCompound::new();
        states.insert("a", NbtTag::Byte(0));
        states.insert("b", NbtTag::Byte(7));
        let mut tag = NbtCompound::new();
        tag.insert("name", NbtTag::String("minecraft:test".into()));
        tag.insert("states", NbtTag::Compound(states));
        tag.insert("version", NbtTag::Int(3));

        let block = BlockState::from_nbt(&tag).unwrap();
        assert_eq!(block.value("a").unwrap(), &BlockStateValue::Bool(false));
        assert_eq!(block.value("b").unwrap(), &BlockStateValue::Bool(true));
        assert_eq!(block.version(), 3);
    }

    #[test]
    fn test_from_nbt_missing_name() {
        let mut tag = NbtCompound::new();
        tag.insert("states", NbtTag::Compound(NbtCompound::new()));
        tag.insert("version", NbtTag::Int(COMPATIBILITY_VERSION));
        let err = BlockState::from_nbt(&tag).unwrap_err();
        assert_eq!(err.path(), Some("name"));
    }

    #[test]
    fn test_from_nbt_mistyped_version() {
        let mut tag = BlockState::new("minecraft:stone").to_nbt();
        tag.insert("version", NbtTag::String("17959425".into()));
        let err = BlockState::from_nbt(&tag).unwrap_err();
        assert_eq!(err.path(), Some("version"));
    }

    #[test]
    fn test_from_nbt_rejects_unsupported_state_kind() {
        let mut states = NbtCompound::new();
        states.insert("age", NbtTag::Long(3));
        let mut tag = BlockState::new("minecraft:wheat").to_nbt();
        tag.insert("states", NbtTag::Compound(states));

        let err = BlockState::from_nbt(&tag).unwrap_err();
        assert_eq!(err.path(), Some("states.age"));
    }
}
