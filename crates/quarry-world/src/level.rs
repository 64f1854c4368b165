//! World metadata (`level.dat`).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::debug;

use quarry_nbt::NbtRoot;

use crate::error::WorldError;

/// Read a gzip-compressed document file such as `level.dat`. The decoded
/// root is returned as-is; single-field wrapper roots already forward
/// lookups to their inner compound.
pub fn read_level_file(path: impl AsRef<Path>) -> Result<NbtRoot, WorldError> {
    let path = path.as_ref();
    let mut body = Vec::new();
    GzDecoder::new(File::open(path)?).read_to_end(&mut body)?;
    let root = quarry_nbt::read_nbt(&mut &body[..])?;
    debug!("read level file {}", path.display());
    Ok(root)
}
