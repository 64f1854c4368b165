//! NBT tag types.

use std::fmt;
use std::ops::Index;

use crate::error::NbtError;

/// A compound tag: ordered map of name -> tag.
///
/// Field order is preserved exactly as decoded (and round-trips through
/// encode), names are unique within one compound.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NbtCompound {
    entries: Vec<(String, NbtTag)>,
}

impl NbtCompound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&NbtTag> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut NbtTag> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Insert a field, returning the previous value if the name was already
    /// present. A replaced field keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, tag: NbtTag) -> Option<NbtTag> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, tag)),
            None => {
                self.entries.push((name, tag));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<NbtTag> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NbtTag)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }
}

impl Index<&str> for NbtCompound {
    type Output = NbtTag;

    fn index(&self, name: &str) -> &NbtTag {
        match self.get(name) {
            Some(tag) => tag,
            None => panic!("no field named {name:?} in compound"),
        }
    }
}

impl FromIterator<(String, NbtTag)> for NbtCompound {
    fn from_iter<I: IntoIterator<Item = (String, NbtTag)>>(iter: I) -> Self {
        let mut c = NbtCompound::new();
        for (name, tag) in iter {
            c.insert(name, tag);
        }
        c
    }
}

/// A named root document (the root always carries a name, often empty).
///
/// Lookups and rendering transparently unwrap the common pattern of an
/// unnamed root holding a single compound field: `root["Seed"]` on a
/// document shaped `{"" -> {"Data" -> {"Seed": ...}}}` resolves without
/// the caller naming `"Data"`.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtRoot {
    pub name: String,
    pub compound: NbtCompound,
}

impl NbtRoot {
    pub fn new(name: impl Into<String>, compound: NbtCompound) -> Self {
        Self {
            name: name.into(),
            compound,
        }
    }

    /// The compound lookups actually target: the sole compound child when
    /// the root is an unnamed single-field wrapper, otherwise the root
    /// compound itself.
    fn lookup_target(&self) -> &NbtCompound {
        if self.name.is_empty() && self.compound.len() == 1 {
            if let Some((_, NbtTag::Compound(inner))) = self.compound.iter().next() {
                return inner;
            }
        }
        &self.compound
    }

    pub fn get(&self, name: &str) -> Option<&NbtTag> {
        self.lookup_target().get(name)
    }
}

impl Index<&str> for NbtRoot {
    type Output = NbtTag;

    fn index(&self, name: &str) -> &NbtTag {
        match self.get(name) {
            Some(tag) => tag,
            None => panic!("no field named {name:?} in root document"),
        }
    }
}

impl fmt::Display for NbtRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // An unnamed single-field root renders as its single entry; the
        // same check is applied once more one level down, so a two-layer
        // wrapper is invisible in the output.
        let mut name = self.name.as_str();
        let mut compound = &self.compound;
        for _ in 0..2 {
            if !name.is_empty() || compound.len() != 1 {
                break;
            }
            match compound.iter().next() {
                Some((n, NbtTag::Compound(inner))) => {
                    name = n;
                    compound = inner;
                }
                Some((_, tag)) => return write!(f, "{tag}"),
                None => break,
            }
        }
        if name.is_empty() {
            write!(f, "{{{} entries}}", compound.len())
        } else {
            write!(f, "{name}: {{{} entries}}", compound.len())
        }
    }
}

/// Represents any NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtTag>),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtTag {
    /// Returns the numeric tag type ID (1-12). TAG_End is 0 but not
    /// representable here.
    pub fn tag_type_id(&self) -> u8 {
        match self {
            NbtTag::Byte(_) => 1,
            NbtTag::Short(_) => 2,
            NbtTag::Int(_) => 3,
            NbtTag::Long(_) => 4,
            NbtTag::Float(_) => 5,
            NbtTag::Double(_) => 6,
            NbtTag::ByteArray(_) => 7,
            NbtTag::String(_) => 8,
            NbtTag::List(_) => 9,
            NbtTag::Compound(_) => 10,
            NbtTag::IntArray(_) => 11,
            NbtTag::LongArray(_) => 12,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            NbtTag::Byte(_) => "TAG_Byte",
            NbtTag::Short(_) => "TAG_Short",
            NbtTag::Int(_) => "TAG_Int",
            NbtTag::Long(_) => "TAG_Long",
            NbtTag::Float(_) => "TAG_Float",
            NbtTag::Double(_) => "TAG_Double",
            NbtTag::ByteArray(_) => "TAG_Byte_Array",
            NbtTag::String(_) => "TAG_String",
            NbtTag::List(_) => "TAG_List",
            NbtTag::Compound(_) => "TAG_Compound",
            NbtTag::IntArray(_) => "TAG_Int_Array",
            NbtTag::LongArray(_) => "TAG_Long_Array",
        }
    }

    fn mismatch(&self, expected: &'static str) -> NbtError {
        NbtError::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }

    pub fn as_byte(&self) -> Result<i8, NbtError> {
        match self {
            NbtTag::Byte(v) => Ok(*v),
            _ => Err(self.mismatch("TAG_Byte")),
        }
    }

    pub fn as_short(&self) -> Result<i16, NbtError> {
        match self {
            NbtTag::Short(v) => Ok(*v),
            _ => Err(self.mismatch("TAG_Short")),
        }
    }

    /// Extract an int. A string payload holding a base-10 integer also
    /// succeeds; this narrow coercion is relied on by older world data
    /// where numeric fields were stored as strings.
    pub fn as_int(&self) -> Result<i32, NbtError> {
        match self {
            NbtTag::Int(v) => Ok(*v),
            NbtTag::String(s) => s.parse().map_err(|_| self.mismatch("TAG_Int")),
            _ => Err(self.mismatch("TAG_Int")),
        }
    }

    pub fn as_long(&self) -> Result<i64, NbtError> {
        match self {
            NbtTag::Long(v) => Ok(*v),
            _ => Err(self.mismatch("TAG_Long")),
        }
    }

    pub fn as_float(&self) -> Result<f32, NbtError> {
        match self {
            NbtTag::Float(v) => Ok(*v),
            _ => Err(self.mismatch("TAG_Float")),
        }
    }

    pub fn as_double(&self) -> Result<f64, NbtError> {
        match self {
            NbtTag::Double(v) => Ok(*v),
            _ => Err(self.mismatch("TAG_Double")),
        }
    }

    pub fn as_string(&self) -> Result<&str, NbtError> {
        match self {
            NbtTag::String(v) => Ok(v),
            _ => Err(self.mismatch("TAG_String")),
        }
    }

    pub fn as_byte_array(&self) -> Result<&[i8], NbtError> {
        match self {
            NbtTag::ByteArray(v) => Ok(v),
            _ => Err(self.mismatch("TAG_Byte_Array")),
        }
    }

    pub fn as_int_array(&self) -> Result<&[i32], NbtError> {
        match self {
            NbtTag::IntArray(v) => Ok(v),
            _ => Err(self.mismatch("TAG_Int_Array")),
        }
    }

    pub fn as_long_array(&self) -> Result<&[i64], NbtError> {
        match self {
            NbtTag::LongArray(v) => Ok(v),
            _ => Err(self.mismatch("TAG_Long_Array")),
        }
    }

    pub fn as_list(&self) -> Result<&[NbtTag], NbtError> {
        match self {
            NbtTag::List(v) => Ok(v),
            _ => Err(self.mismatch("TAG_List")),
        }
    }

    pub fn as_compound(&self) -> Result<&NbtCompound, NbtError> {
        match self {
            NbtTag::Compound(v) => Ok(v),
            _ => Err(self.mismatch("TAG_Compound")),
        }
    }
}

impl fmt::Display for NbtTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtTag::Byte(v) => write!(f, "{v}b"),
            NbtTag::Short(v) => write!(f, "{v}s"),
            NbtTag::Int(v) => write!(f, "{v}"),
            NbtTag::Long(v) => write!(f, "{v}L"),
            NbtTag::Float(v) => write!(f, "{v}f"),
            NbtTag::Double(v) => write!(f, "{v}d"),
            NbtTag::ByteArray(v) => write!(f, "[B; {} elements]", v.len()),
            NbtTag::String(v) => write!(f, "\"{v}\""),
            NbtTag::List(v) => write!(f, "[{} elements]", v.len()),
            NbtTag::Compound(v) => write!(f, "{{{} entries}}", v.len()),
            NbtTag::IntArray(v) => write!(f, "[I; {} elements]", v.len()),
            NbtTag::LongArray(v) => write!(f, "[L; {} elements]", v.len()),
        }
    }
}
