//! NBT (Named Binary Tag) implementation for Minecraft Java Edition.
//!
//! The self-describing binary document format used by the Anvil world
//! container: 12 tag kinds, named compound fields, big-endian wire format.
//! Compounds keep their field order, and the common two-layer root wrapper
//! (an unnamed root with a single compound field) is transparent to lookups.

pub mod error;
mod io;
pub mod tag;

pub use error::NbtError;
pub use tag::{NbtCompound, NbtRoot, NbtTag};

use bytes::{Buf, BufMut};

/// Read an NBT document from a buffer.
pub fn read_nbt(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    io::read_nbt(buf)
}

/// Write an NBT document to a buffer.
pub fn write_nbt(buf: &mut impl BufMut, root: &NbtRoot) {
    io::write_nbt(buf, root)
}
