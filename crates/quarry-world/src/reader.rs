//! Lazy world access over a directory of region files.
//!
//! The reader keeps exactly one region and one chunk position resident at a
//! time. Block queries group their chunks by owning region before loading,
//! so each region file is parsed once per pass even though the cache is a
//! single slot.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::vec::IntoIter;

use tracing::debug;

use quarry_nbt::NbtCompound;

use crate::coord::{ChunkPos, Location, RegionPos};
use crate::cuboid::Cuboid;
use crate::error::WorldError;
use crate::region::{parse_file_name, Chunk, RegionFile};
use crate::section::{Section, SectionBlocks};

/// Reads chunks and blocks out of a world directory on demand.
#[derive(Debug)]
pub struct WorldReader {
    region_dir: PathBuf,
    current_region: Option<RegionFile>,
    current_chunk: Option<ChunkPos>,
}

impl WorldReader {
    /// A reader over the world rooted at `world_dir`; region files are
    /// expected under its `region` subdirectory.
    pub fn new(world_dir: impl AsRef<Path>) -> Self {
        Self {
            region_dir: world_dir.as_ref().join("region"),
            current_region: None,
            current_chunk: None,
        }
    }

    pub fn region_dir(&self) -> &Path {
        &self.region_dir
    }

    /// The resident region, if any.
    pub fn current_region(&self) -> Option<&RegionFile> {
        self.current_region.as_ref()
    }

    /// Mutable access to the resident region, for in-place edits before a
    /// save.
    pub fn current_region_mut(&mut self) -> Option<&mut RegionFile> {
        self.current_region.as_mut()
    }

    /// Position of the most recently loaded chunk, if any.
    pub fn current_chunk(&self) -> Option<ChunkPos> {
        self.current_chunk
    }

    /// Make `pos` the resident region, loading its file unless it already
    /// is. A region whose file does not exist is an error, not an empty
    /// region.
    pub fn load_region(&mut self, pos: RegionPos) -> Result<&RegionFile, WorldError> {
        match &self.current_region {
            Some(region) if region.pos() == pos => {}
            _ => {
                let path = self.region_dir.join(pos.file_name());
                if !path.is_file() {
                    return Err(WorldError::MissingRegion { x: pos.x, z: pos.z });
                }
                debug!("region cache miss, loading {pos}");
                self.current_region = Some(RegionFile::open(&path)?);
                self.current_chunk = None;
            }
        }
        self.current_region
            .as_ref()
            .ok_or(WorldError::MissingRegion { x: pos.x, z: pos.z })
    }

    /// Load the region owning `pos` and return its slot for that chunk.
    pub fn load_chunk(&mut self, pos: ChunkPos) -> Result<&Chunk, WorldError> {
        self.load_region(pos.region())?;
        self.current_chunk = Some(pos);
        self.current_region
            .as_ref()
            .map(|region| region.chunk(pos))
            .ok_or(WorldError::MissingRegion {
                x: pos.region().x,
                z: pos.region().z,
            })
    }

    /// Decode the sections of one chunk. With `drop_out_of_band` set,
    /// sections whose `Y` sub-index falls outside 0..=15 are skipped rather
    /// than decoded. An empty slot has no sections.
    pub fn chunk_sections(
        &mut self,
        pos: ChunkPos,
        drop_out_of_band: bool,
    ) -> Result<Vec<Section>, WorldError> {
        let chunk = self.load_chunk(pos)?;
        let Some(root) = &chunk.root else {
            return Ok(Vec::new());
        };
        let Some(list) = root.get("sections") else {
            return Ok(Vec::new());
        };

        let mut sections = Vec::new();
        for tag in list.as_list()? {
            let entry = tag.as_compound()?;
            let y = entry
                .get("Y")
                .ok_or(WorldError::MissingField("Y"))?
                .as_byte()?;
            if drop_out_of_band && !(0..=15).contains(&y) {
                continue;
            }
            sections.push(Section::from_tag(pos, entry)?);
        }
        Ok(sections)
    }

    /// Lazily enumerate every block inside `area`. Chunks are visited
    /// grouped by owning region so the single-slot cache never thrashes; the
    /// iterator ends after yielding its first error.
    pub fn read_blocks(&mut self, area: Cuboid) -> Blocks<'_> {
        let mut chunks: Vec<ChunkPos> = area.chunks().collect();
        // stable sort keeps the x-major chunk order within each region
        chunks.sort_by_key(|c| c.region());
        Blocks {
            reader: self,
            area,
            chunks: chunks.into_iter(),
            sections: Vec::new().into_iter(),
            active: None,
            failed: false,
        }
    }

    /// Every region present on disk, sorted by x then z. Files that do not
    /// match the region naming scheme are ignored.
    pub fn list_regions(&self) -> Result<Vec<RegionPos>, WorldError> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.region_dir)? {
            let entry = entry?;
            if let Some(pos) = entry.file_name().to_str().and_then(parse_file_name) {
                out.push(pos);
            }
        }
        out.sort_by_key(|p| (p.x, p.z));
        Ok(out)
    }
}

/// Streaming iterator over the blocks of an area, produced by
/// [`WorldReader::read_blocks`]. Fused: after the first `Err` it yields
/// `None` forever.
pub struct Blocks<'w> {
    reader: &'w mut WorldReader,
    area: Cuboid,
    chunks: IntoIter<ChunkPos>,
    sections: IntoIter<Section>,
    active: Option<SectionBlocks>,
    failed: bool,
}

impl Iterator for Blocks<'_> {
    type Item = Result<(Location, Arc<NbtCompound>), WorldError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(active) = &mut self.active {
                match active.next() {
                    Some(Ok(item)) => return Some(Ok(item)),
                    Some(Err(e)) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                    None => self.active = None,
                }
            }
            if let Some(section) = self.sections.next() {
                self.active = Some(section.into_blocks(Some(&self.area)));
                continue;
            }
            let chunk = self.chunks.next()?;
            match self.reader.chunk_sections(chunk, true) {
                Ok(sections) => self.sections = sections.into_iter(),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
