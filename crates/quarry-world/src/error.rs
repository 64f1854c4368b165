//! World persistence error types.

use quarry_nbt::NbtError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Nbt(#[from] NbtError),

    #[error("region file for ({x}, {z}) does not exist")]
    MissingRegion { x: i32, z: i32 },

    #[error("{0:?} does not match the r.<x>.<z>.mca naming scheme")]
    BadRegionName(String),

    #[error("unknown compression type: {0}")]
    UnknownCompression(u8),

    #[error("chunk payload length {0} is invalid")]
    BadPayloadLength(u32),

    #[error("chunk body of {0} bytes does not fit a region slot")]
    OversizedChunk(usize),

    #[error("region has no backing path")]
    NoBackingPath,

    #[error("chunk is missing the {0:?} field")]
    MissingField(&'static str),

    #[error("packed index {index} is outside the palette ({len} entries)")]
    PaletteIndexOutOfRange { index: usize, len: usize },

    #[error("packed data array has {len} words, section needs {needed}")]
    ShortPackedArray { len: usize, needed: usize },
}
