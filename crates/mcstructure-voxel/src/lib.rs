//! Palette-backed voxel structures and their mapping to the `.mcstructure` tag tree.
//!
//! A [`Structure`] is a fixed-size volume with two block layers that share one
//! reference-counted [`Palette`] of [`BlockState`] values, plus sparse block entity
//! data and an ordered entity list. [`Structure::to_nbt`] and [`Structure::from_nbt`]
//! convert it to and from the tag tree that a binary NBT writer persists.

pub mod block_state;
pub mod error;
pub mod palette;
pub mod structure;
pub mod structure_nbt;

pub use block_state::{BlockState, BlockStateValue, COMPATIBILITY_VERSION};
pub use error::StructureError;
pub use mcstructure_coords::{Coordinate, Region, Size};
pub use palette::{Palette, PaletteId};
pub use structure::{Block, Layer, Structure};
pub use structure_nbt::FORMAT_VERSION;
