//! Anvil world persistence: region containers, chunk sections, and lazy
//! block access for Minecraft Java Edition saves.
//!
//! A world directory holds a gzip-compressed `level.dat` document plus a
//! `region/` directory of `r.<x>.<z>.mca` containers, each storing up to
//! 32x32 chunks on 4096-byte sector boundaries. Chunks are NBT documents;
//! their block contents live in 16x16x16 sections addressed through a
//! palette and a bit-packed index array. [`WorldReader`] ties it together,
//! streaming blocks out of an area with a single region resident at a time.

pub mod coord;
pub mod cuboid;
pub mod error;
pub mod level;
pub mod reader;
pub mod region;
pub mod section;

pub use coord::{ChunkPos, Location, RegionPos};
pub use cuboid::Cuboid;
pub use error::WorldError;
pub use level::read_level_file;
pub use reader::{Blocks, WorldReader};
pub use region::{Chunk, Compression, RegionFile};
pub use section::{Section, SectionBlocks};
