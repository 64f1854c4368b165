//! Section (sub-chunk) decoding.
//!
//! A section is a 16x16x16 sub-volume of a chunk. Block states live in an
//! ordered palette of compounds; positions map to palette indices through a
//! bit-packed array of 64-bit words. Indices use the minimum width needed
//! to address the palette (at least 4 bits) and never cross from one word
//! into the next, so each word may end with unused padding bits.

use std::sync::Arc;

use quarry_nbt::NbtCompound;

use crate::coord::{ChunkPos, Location};
use crate::cuboid::{Cuboid, Locations};
use crate::error::WorldError;

/// Bits per packed index for a palette of `len` entries.
fn bits_for_palette(len: usize) -> u32 {
    let needed = if len <= 1 {
        0
    } else {
        usize::BITS - (len - 1).leading_zeros()
    };
    needed.max(4)
}

/// A decoded section, self-contained: palette entries are shared handles
/// and the packed words are copied out of the chunk document.
#[derive(Debug, Clone)]
pub struct Section {
    bounds: Cuboid,
    y_index: i8,
    palette: Vec<Arc<NbtCompound>>,
    data: Option<Vec<i64>>,
    entry_bits: u32,
    entries_per_word: u32,
}

impl Section {
    /// Decode one entry of a chunk's `sections` list. The `Y` sub-index is
    /// taken as-is; callers wanting only the supported vertical band filter
    /// before constructing.
    pub fn from_tag(chunk: ChunkPos, tag: &NbtCompound) -> Result<Self, WorldError> {
        let y_index = tag
            .get("Y")
            .ok_or(WorldError::MissingField("Y"))?
            .as_byte()?;

        let (bx, bz) = chunk.block_origin();
        let min = Location::new(bx, y_index as i32 * 16, bz);
        let bounds = Cuboid::new(min, min + Location::new(15, 15, 15));

        let states = tag
            .get("block_states")
            .ok_or(WorldError::MissingField("block_states"))?
            .as_compound()?;
        let palette = states
            .get("palette")
            .ok_or(WorldError::MissingField("palette"))?
            .as_list()?
            .iter()
            .map(|t| Ok(Arc::new(t.as_compound()?.clone())))
            .collect::<Result<Vec<_>, WorldError>>()?;
        let entry_bits = bits_for_palette(palette.len());
        let entries_per_word = 64 / entry_bits;

        // No data array means the whole section is palette entry 0. A
        // present one must hold a word for every block position.
        let data = match states.get("data") {
            Some(t) => {
                let words = t.as_long_array()?;
                let needed = 4096usize.div_ceil(entries_per_word as usize);
                if words.len() < needed {
                    return Err(WorldError::ShortPackedArray {
                        len: words.len(),
                        needed,
                    });
                }
                Some(words.to_vec())
            }
            None => None,
        };

        Ok(Self {
            bounds,
            y_index,
            palette,
            data,
            entry_bits,
            entries_per_word,
        })
    }

    pub fn y_index(&self) -> i8 {
        self.y_index
    }

    /// The cuboid of absolute block positions this section covers.
    pub fn bounds(&self) -> Cuboid {
        self.bounds
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    pub fn entry_bits(&self) -> u32 {
        self.entry_bits
    }

    /// Palette index of the block at section-local coordinates (0..16).
    pub fn palette_index(&self, x: i32, y: i32, z: i32) -> usize {
        let Some(data) = &self.data else { return 0 };
        let flat = (y * 256 + z * 16 + x) as usize;
        let word = data[flat / self.entries_per_word as usize] as u64;
        let shift = (flat % self.entries_per_word as usize) as u32 * self.entry_bits;
        ((word >> shift) & ((1u64 << self.entry_bits) - 1)) as usize
    }

    /// Lazily enumerate `(location, block state)` pairs for every position
    /// in the intersection of this section and `clip` (the whole section if
    /// no clip is given).
    pub fn into_blocks(self, clip: Option<&Cuboid>) -> SectionBlocks {
        let overlap = match clip {
            Some(c) => c.intersection(&self.bounds),
            None => Some(self.bounds),
        };
        SectionBlocks {
            locations: overlap.map(|c| c.locations()),
            section: self,
        }
    }
}

/// Iterator over a section's blocks, clipped to a query cuboid.
pub struct SectionBlocks {
    section: Section,
    locations: Option<Locations>,
}

impl Iterator for SectionBlocks {
    type Item = Result<(Location, Arc<NbtCompound>), WorldError>;

    fn next(&mut self) -> Option<Self::Item> {
        let loc = self.locations.as_mut()?.next()?;
        let local = loc - self.section.bounds.min();
        let index = self.section.palette_index(local.x, local.y, local.z);
        match self.section.palette.get(index) {
            Some(state) => Some(Ok((loc, Arc::clone(state)))),
            None => Some(Err(WorldError::PaletteIndexOutOfRange {
                index,
                len: self.section.palette.len(),
            })),
        }
    }
}
