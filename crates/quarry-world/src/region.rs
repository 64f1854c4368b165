//! Sector-addressed region container files.
//!
//! One file holds up to 32x32 chunk payloads. The first 8 KiB are two
//! parallel tables indexed by `z*32 + x`: a packed `offset << 8 | sectors`
//! entry and a u32 timestamp, both big-endian. Payloads live on 4096-byte
//! sector boundaries as `(u32 length, compression byte, compressed body)`,
//! where the length counts the compression byte plus the body.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use rayon::prelude::*;
use tracing::debug;

use quarry_nbt::NbtRoot;

use crate::coord::{ChunkPos, RegionPos};
use crate::error::WorldError;

/// Fixed allocation unit within a region file.
pub const SECTOR_BYTES: usize = 4096;

/// Offset + timestamp tables.
pub const HEADER_BYTES: usize = 2 * SECTOR_BYTES;

/// Chunks per region along one axis.
pub const REGION_CHUNKS: usize = 32;

/// Per-slot payload compression schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip = 1,
    Zlib = 2,
}

impl Compression {
    pub fn from_byte(b: u8) -> Result<Self, WorldError> {
        match b {
            1 => Ok(Self::Gzip),
            2 => Ok(Self::Zlib),
            other => Err(WorldError::UnknownCompression(other)),
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>, WorldError> {
        let mut out = Vec::new();
        match self {
            Self::Gzip => GzDecoder::new(data).read_to_end(&mut out)?,
            Self::Zlib => ZlibDecoder::new(data).read_to_end(&mut out)?,
        };
        Ok(out)
    }
}

/// Compress a serialized chunk body for storage (always zlib, kind 2).
fn compress_zlib(data: &[u8]) -> Result<Vec<u8>, WorldError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// One chunk slot of a region container.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub pos: ChunkPos,
    /// Unix seconds, raw bookkeeping only.
    pub timestamp: u32,
    pub compression: Compression,
    /// Compressed payload as last read or written; dropped fields force a
    /// re-encode on save.
    pub raw: Option<Vec<u8>>,
    pub root: Option<NbtRoot>,
    pub dirty: bool,
}

impl Chunk {
    fn empty(pos: ChunkPos) -> Self {
        Self {
            pos,
            timestamp: 0,
            compression: Compression::Zlib,
            raw: None,
            root: None,
            dirty: false,
        }
    }

    /// A slot with no payload on disk and no decoded document.
    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.raw.is_none()
    }
}

/// An in-memory region: 1024 chunk slots plus the backing path, if any.
#[derive(Debug)]
pub struct RegionFile {
    pos: RegionPos,
    chunks: Vec<Chunk>,
    path: Option<PathBuf>,
    pub dirty: bool,
}

fn slot(x: usize, z: usize) -> usize {
    z * REGION_CHUNKS + x
}

/// Parse `r.<x>.<z>.mca` into a region position.
pub(crate) fn parse_file_name(name: &str) -> Option<RegionPos> {
    let rest = name.strip_prefix("r.")?.strip_suffix(".mca")?;
    let (x, z) = rest.split_once('.')?;
    Some(RegionPos::new(x.parse().ok()?, z.parse().ok()?))
}

impl RegionFile {
    /// A fresh region with every slot empty, not backed by any file.
    pub fn new(pos: RegionPos) -> Self {
        let origin = pos.chunk_origin();
        let mut chunks = Vec::with_capacity(REGION_CHUNKS * REGION_CHUNKS);
        for z in 0..REGION_CHUNKS as i32 {
            for x in 0..REGION_CHUNKS as i32 {
                chunks.push(Chunk::empty(ChunkPos::new(origin.x + x, origin.z + z)));
            }
        }
        Self {
            pos,
            chunks,
            path: None,
            dirty: false,
        }
    }

    /// Open and fully load a region file; the position is taken from the
    /// `r.<x>.<z>.mca` file name.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        let path = path.as_ref();
        let pos = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_file_name)
            .ok_or_else(|| WorldError::BadRegionName(path.display().to_string()))?;
        let mut region = Self::load_from(BufReader::new(File::open(path)?), pos)?;
        region.path = Some(path.to_path_buf());
        Ok(region)
    }

    /// Read a full region image: header tables, then every non-empty slot's
    /// payload. Decompression and document decode fan out across the worker
    /// pool; the call returns only once every slot has finished, so the
    /// container is never observable in a half-loaded state.
    pub fn load_from<R: Read + Seek>(mut reader: R, pos: RegionPos) -> Result<Self, WorldError> {
        let mut header = [0u8; HEADER_BYTES];
        reader.read_exact(&mut header)?;

        let origin = pos.chunk_origin();
        let mut chunks = Vec::with_capacity(REGION_CHUNKS * REGION_CHUNKS);
        let mut occupied = 0usize;
        for z in 0..REGION_CHUNKS {
            for x in 0..REGION_CHUNKS {
                let i = 4 * slot(x, z);
                let entry =
                    u32::from_be_bytes([header[i], header[i + 1], header[i + 2], header[i + 3]]);
                let offset = (entry >> 8) as u64;
                let sectors = entry & 0xFF;
                let t = SECTOR_BYTES + i;
                let timestamp =
                    u32::from_be_bytes([header[t], header[t + 1], header[t + 2], header[t + 3]]);

                let mut chunk =
                    Chunk::empty(ChunkPos::new(origin.x + x as i32, origin.z + z as i32));
                chunk.timestamp = timestamp;

                if offset == 0 && sectors == 0 {
                    chunks.push(chunk);
                    continue;
                }

                reader.seek(SeekFrom::Start(offset * SECTOR_BYTES as u64))?;
                let mut len = [0u8; 4];
                reader.read_exact(&mut len)?;
                let len = u32::from_be_bytes(len);
                if len == 0 {
                    return Err(WorldError::BadPayloadLength(len));
                }
                let mut kind = [0u8; 1];
                reader.read_exact(&mut kind)?;
                chunk.compression = Compression::from_byte(kind[0])?;

                let mut raw = vec![0u8; len as usize - 1];
                reader.read_exact(&mut raw)?;
                chunk.raw = Some(raw);
                occupied += 1;
                chunks.push(chunk);
            }
        }

        // Structured join over the decompression tasks: each worker touches
        // only its own slot, and the first failure aborts the whole load.
        chunks.par_iter_mut().try_for_each(|chunk| {
            let Some(raw) = &chunk.raw else { return Ok(()) };
            let body = chunk.compression.decompress(raw)?;
            chunk.root = Some(quarry_nbt::read_nbt(&mut &body[..])?);
            Ok::<(), WorldError>(())
        })?;

        debug!("loaded region {pos} ({occupied} occupied slots)");
        Ok(Self {
            pos,
            chunks,
            path: None,
            dirty: false,
        })
    }

    pub fn pos(&self) -> RegionPos {
        self.pos
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The slot holding the given chunk. The chunk must belong to this
    /// region; only the region-relative part of the position is used.
    pub fn chunk(&self, pos: ChunkPos) -> &Chunk {
        debug_assert_eq!(pos.region(), self.pos);
        let (x, z) = pos.region_relative();
        &self.chunks[slot(x, z)]
    }

    /// Mutable slot access; marks the region dirty.
    pub fn chunk_mut(&mut self, pos: ChunkPos) -> &mut Chunk {
        debug_assert_eq!(pos.region(), self.pos);
        self.dirty = true;
        let (x, z) = pos.region_relative();
        &mut self.chunks[slot(x, z)]
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Write back to the backing path. A clean region is skipped unless
    /// `force` is set.
    pub fn save(&mut self, force: bool) -> Result<(), WorldError> {
        let Some(path) = self.path.clone() else {
            return Err(WorldError::NoBackingPath);
        };
        self.save_to(&path, force)
    }

    /// Write to `path`, truncating whatever was there.
    pub fn save_to(&mut self, path: &Path, force: bool) -> Result<(), WorldError> {
        if !force && !self.dirty {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        self.write_to(&mut file, force)?;
        file.flush()?;
        debug!("saved region {} to {}", self.pos, path.display());
        Ok(())
    }

    /// Serialize the full region image. Slots are laid out sequentially
    /// from sector 2; each slot's offset depends on the accumulated size of
    /// everything before it, so this is never parallelized.
    ///
    /// A slot's recorded sector count covers every byte it occupies on disk
    /// (the 4-byte length prefix included), so offsets always match the
    /// file and a body ending exactly on a sector boundary claims no extra
    /// pad sector.
    pub fn write_to<W: Write + Seek>(&mut self, w: &mut W, force: bool) -> Result<(), WorldError> {
        let mut header = [0u8; HEADER_BYTES];
        let mut sector: u32 = (HEADER_BYTES / SECTOR_BYTES) as u32;

        w.seek(SeekFrom::Start(0))?;
        w.write_all(&header)?;

        for x in 0..REGION_CHUNKS {
            for z in 0..REGION_CHUNKS {
                let chunk = &mut self.chunks[slot(x, z)];
                let i = 4 * slot(x, z);
                let t = SECTOR_BYTES + i;
                header[t..t + 4].copy_from_slice(&chunk.timestamp.to_be_bytes());

                if chunk.root.is_none() {
                    continue; // offset entry stays zero: empty slot
                }

                if chunk.raw.is_none() || force || chunk.dirty {
                    let mut body = Vec::new();
                    if let Some(root) = &chunk.root {
                        quarry_nbt::write_nbt(&mut body, root);
                    }
                    chunk.raw = Some(compress_zlib(&body)?);
                    chunk.compression = Compression::Zlib;
                }
                let Some(raw) = &chunk.raw else { continue };

                let total = raw.len() + 5;
                let sectors = total.div_ceil(SECTOR_BYTES);
                if sectors > 0xFF {
                    return Err(WorldError::OversizedChunk(raw.len()));
                }

                w.write_all(&(raw.len() as u32 + 1).to_be_bytes())?;
                w.write_all(&[chunk.compression.to_byte()])?;
                w.write_all(raw)?;
                w.write_all(&vec![0u8; sectors * SECTOR_BYTES - total])?;

                let entry = (sector << 8) | sectors as u32;
                header[i..i + 4].copy_from_slice(&entry.to_be_bytes());
                sector += sectors as u32;
                chunk.dirty = false;
            }
        }

        w.seek(SeekFrom::Start(0))?;
        w.write_all(&header)?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_nbt::{NbtCompound, NbtTag};
    use std::io::Cursor;

    fn block_doc(name: &str) -> NbtRoot {
        let mut c = NbtCompound::new();
        c.insert("Name", NbtTag::String(name.into()));
        c.insert("count", NbtTag::Int(7));
        NbtRoot::new("", c)
    }

    #[test]
    fn compression_bytes() {
        assert_eq!(Compression::from_byte(1).unwrap(), Compression::Gzip);
        assert_eq!(Compression::from_byte(2).unwrap(), Compression::Zlib);
        assert!(matches!(
            Compression::from_byte(3),
            Err(WorldError::UnknownCompression(3))
        ));
        assert_eq!(Compression::Gzip.to_byte(), 1);
        assert_eq!(Compression::Zlib.to_byte(), 2);
    }

    #[test]
    fn file_name_parsing() {
        assert_eq!(parse_file_name("r.0.0.mca"), Some(RegionPos::new(0, 0)));
        assert_eq!(parse_file_name("r.-3.12.mca"), Some(RegionPos::new(-3, 12)));
        assert_eq!(parse_file_name("r.1.mca"), None);
        assert_eq!(parse_file_name("level.dat"), None);
    }

    #[test]
    fn fresh_region_is_all_empty() {
        let region = RegionFile::new(RegionPos::new(1, -1));
        assert_eq!(region.chunks().count(), 1024);
        assert!(region.chunks().all(|c| c.is_empty()));
        assert_eq!(
            region.chunk(ChunkPos::new(32, -32)).pos,
            ChunkPos::new(32, -32)
        );
        assert_eq!(
            region.chunk(ChunkPos::new(63, -1)).pos,
            ChunkPos::new(63, -1)
        );
    }

    #[test]
    fn write_then_read_roundtrip() {
        let pos = RegionPos::new(0, 0);
        let mut region = RegionFile::new(pos);

        let a = region.chunk_mut(ChunkPos::new(0, 0));
        a.root = Some(block_doc("minecraft:stone"));
        a.timestamp = 1_700_000_000;
        a.dirty = true;

        let b = region.chunk_mut(ChunkPos::new(5, 7));
        b.root = Some(block_doc("minecraft:dirt"));
        b.timestamp = 42;
        b.dirty = true;

        let mut buf = Cursor::new(Vec::new());
        region.write_to(&mut buf, false).unwrap();
        assert!(!region.dirty);
        assert_eq!(buf.get_ref().len() % SECTOR_BYTES, 0);

        buf.set_position(0);
        let loaded = RegionFile::load_from(buf, pos).unwrap();

        let a = loaded.chunk(ChunkPos::new(0, 0));
        assert_eq!(a.root, Some(block_doc("minecraft:stone")));
        assert_eq!(a.timestamp, 1_700_000_000);
        assert_eq!(a.compression, Compression::Zlib);

        let b = loaded.chunk(ChunkPos::new(5, 7));
        assert_eq!(b.root, Some(block_doc("minecraft:dirt")));
        assert_eq!(b.timestamp, 42);

        // an untouched slot stays empty
        assert!(loaded.chunk(ChunkPos::new(9, 9)).is_empty());
    }

    #[test]
    fn clean_region_save_is_skipped() {
        let mut region = RegionFile::new(RegionPos::new(0, 0));
        region.dirty = false;
        // no backing path, but the dirty check short-circuits first
        assert!(region
            .save_to(Path::new("/nonexistent/r.0.0.mca"), false)
            .is_ok());
    }

    /// Hand-built file image: one slot at sector 2 with a zlib payload.
    #[test]
    fn reads_handwritten_zlib_slot() {
        let mut doc = Vec::new();
        quarry_nbt::write_nbt(&mut doc, &block_doc("minecraft:bedrock"));
        let compressed = compress_zlib(&doc).unwrap();

        let mut image = vec![0u8; HEADER_BYTES];
        // slot (0,0): offset 2, one sector
        image[0..4].copy_from_slice(&((2u32 << 8) | 1).to_be_bytes());
        // timestamp table
        image[SECTOR_BYTES..SECTOR_BYTES + 4].copy_from_slice(&123u32.to_be_bytes());
        // payload at sector 2
        image.resize(2 * SECTOR_BYTES + SECTOR_BYTES, 0);
        let at = 2 * SECTOR_BYTES;
        image[at..at + 4].copy_from_slice(&(compressed.len() as u32 + 1).to_be_bytes());
        image[at + 4] = 2;
        image[at + 5..at + 5 + compressed.len()].copy_from_slice(&compressed);

        let region = RegionFile::load_from(Cursor::new(image), RegionPos::new(0, 0)).unwrap();
        let chunk = region.chunk(ChunkPos::new(0, 0));
        assert_eq!(chunk.timestamp, 123);
        let root = chunk.root.as_ref().unwrap();
        assert_eq!(root["Name"].as_string().unwrap(), "minecraft:bedrock");
    }

    #[test]
    fn reads_gzip_slot() {
        use flate2::write::GzEncoder;

        let mut doc = Vec::new();
        quarry_nbt::write_nbt(&mut doc, &block_doc("minecraft:sand"));
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&doc).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut image = vec![0u8; HEADER_BYTES];
        image[0..4].copy_from_slice(&((2u32 << 8) | 1).to_be_bytes());
        image.resize(3 * SECTOR_BYTES, 0);
        let at = 2 * SECTOR_BYTES;
        image[at..at + 4].copy_from_slice(&(compressed.len() as u32 + 1).to_be_bytes());
        image[at + 4] = 1;
        image[at + 5..at + 5 + compressed.len()].copy_from_slice(&compressed);

        let region = RegionFile::load_from(Cursor::new(image), RegionPos::new(0, 0)).unwrap();
        let chunk = region.chunk(ChunkPos::new(0, 0));
        assert_eq!(chunk.compression, Compression::Gzip);
        assert_eq!(
            chunk.root.as_ref().unwrap()["Name"].as_string().unwrap(),
            "minecraft:sand"
        );
    }

    #[test]
    fn unknown_compression_aborts_load() {
        let mut image = vec![0u8; HEADER_BYTES];
        image[0..4].copy_from_slice(&((2u32 << 8) | 1).to_be_bytes());
        image.resize(3 * SECTOR_BYTES, 0);
        let at = 2 * SECTOR_BYTES;
        image[at..at + 4].copy_from_slice(&2u32.to_be_bytes());
        image[at + 4] = 9; // not gzip or zlib
        image[at + 5] = 0;

        assert!(matches!(
            RegionFile::load_from(Cursor::new(image), RegionPos::new(0, 0)),
            Err(WorldError::UnknownCompression(9))
        ));
    }

    #[test]
    fn sector_allocation_is_sequential() {
        let pos = RegionPos::new(0, 0);
        let mut region = RegionFile::new(pos);
        // a payload guaranteed to span more than one sector once written
        let mut big = NbtCompound::new();
        big.insert(
            "noise",
            NbtTag::LongArray(
                (0..2048i64)
                    .map(|i| i.wrapping_mul(0x9E37_79B9_7F4A_7C15u64 as i64).rotate_left(17))
                    .collect(),
            ),
        );
        let a = region.chunk_mut(ChunkPos::new(0, 0));
        a.root = Some(NbtRoot::new("", big));
        a.dirty = true;
        let b = region.chunk_mut(ChunkPos::new(1, 0));
        b.root = Some(block_doc("minecraft:stone"));
        b.dirty = true;

        let mut buf = Cursor::new(Vec::new());
        region.write_to(&mut buf, false).unwrap();
        let image = buf.into_inner();

        let first = u32::from_be_bytes([image[0], image[1], image[2], image[3]]);
        let second_i = 4 * slot(1, 0);
        let second = u32::from_be_bytes([
            image[second_i],
            image[second_i + 1],
            image[second_i + 2],
            image[second_i + 3],
        ]);
        assert_eq!(first >> 8, 2);
        // the second slot starts right after the first one's sectors
        assert_eq!(second >> 8, 2 + (first & 0xFF));
        assert_eq!(
            image.len(),
            SECTOR_BYTES * (2 + (first & 0xFF) as usize + (second & 0xFF) as usize)
        );
    }
}
