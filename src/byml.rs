//! The core binary tree and its tag model (§3, §4.1).
//!
//! [`Byml`] is the typed in-memory tree. The binary parser and writer live in
//! the [`parser`] and [`writer`] submodules; this module owns the tag
//! enumeration, the error type, and the value-coercion smart constructors
//! shared by both directions.

mod parser;
#[cfg(feature = "yaml")]
mod yaml;
mod writer;

use enum_as_inner::EnumAsInner;
use smartstring::alias::String;
use std::ops::{Index, IndexMut};

/// One-byte node tag, exactly as laid out on the wire (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[binrw::binrw]
#[brw(repr = u8)]
#[repr(u8)]
pub(crate) enum NodeType {
    String = 0xa0,
    Array = 0xc0,
    Hash = 0xc1,
    StringTable = 0xc2,
    Bool = 0xd0,
    Int = 0xd1,
    Float = 0xd2,
    UInt = 0xd3,
    Int64 = 0xd4,
    UInt64 = 0xd5,
    Double = 0xd6,
    Null = 0xff,
}

impl NodeType {
    pub(crate) fn try_from_u8(byte: u8) -> Result<Self, BymlError> {
        Ok(match byte {
            0xa0 => Self::String,
            0xc0 => Self::Array,
            0xc1 => Self::Hash,
            0xc2 => Self::StringTable,
            0xd0 => Self::Bool,
            0xd1 => Self::Int,
            0xd2 => Self::Float,
            0xd3 => Self::UInt,
            0xd4 => Self::Int64,
            0xd5 => Self::UInt64,
            0xd6 => Self::Double,
            0xff => Self::Null,
            other => return Err(BymlError::UnknownTag(other)),
        })
    }
}

/// A tag is a value type if its payload fits inline in the 4-byte slot.
#[inline(always)]
pub(crate) const fn is_container_type(node_type: NodeType) -> bool {
    matches!(node_type, NodeType::Array | NodeType::Hash)
}

/// Int64, UInt64, and Double are boxed: their 4-byte slot is an offset to an
/// 8-byte payload, not the payload itself.
#[inline(always)]
pub(crate) const fn is_long_type(node_type: NodeType) -> bool {
    matches!(
        node_type,
        NodeType::Int64 | NodeType::UInt64 | NodeType::Double
    )
}

#[inline(always)]
pub(crate) const fn is_non_inline_type(node_type: NodeType) -> bool {
    is_container_type(node_type) || is_long_type(node_type)
}

#[inline(always)]
pub(crate) const fn is_valid_version(version: u16) -> bool {
    version >= 1 && version <= 3
}

/// Errors from parsing or writing a BYML document (§7).
#[derive(Debug, thiserror::Error)]
pub enum BymlError {
    #[error("invalid BYML magic, expected `BY` or `YB`, found {0:02x?}")]
    BadMagic([u8; 2]),
    #[error("unsupported BYML version {0}, expected 1-3")]
    BadVersion(u16),
    #[error("version 1 BYML documents must be little-endian")]
    EndianVersionMismatch,
    #[error("unexpected end of data at offset {0:#x}")]
    Truncated(u64),
    #[error("unknown node tag {0:#04x}")]
    UnknownTag(u8),
    #[error("{0} index {1} out of range")]
    IndexOutOfRange(&'static str, u32),
    #[error("expected a string table tag (0xc2) at offset {0:#x}")]
    BadStringTableTag(u64),
    #[error("invalid UTF-8 in string table entry at offset {0:#x}")]
    BadUtf8(u64),
    #[error("root node has tag {0:?}, expected Array or Hash")]
    RootNotContainer(NodeType),
    #[error("cannot represent `{0}` as a BYML value")]
    BadValueType(std::string::String),
    #[error("integer {0} requires more than 64 bits")]
    IntegerTooWide(i128),
    #[error(transparent)]
    BinRw(#[from] binrw::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A BYML hash node. Unordered in memory; the writer sorts entries by key at
/// emission time (§4.5) so wire output is deterministic regardless.
pub type Hash = rustc_hash::FxHashMap<String, Byml>;

/// Convenience type used for indexing into [`Byml`]s with `[]`.
pub enum BymlIndex<'a> {
    HashIdx(&'a str),
    ArrayIdx(usize),
}

impl<'a> From<&'a str> for BymlIndex<'a> {
    fn from(s: &'a str) -> Self {
        Self::HashIdx(s)
    }
}

impl<'a> From<usize> for BymlIndex<'a> {
    fn from(idx: usize) -> Self {
        Self::ArrayIdx(idx)
    }
}

/// The typed in-memory BYML tree (§3).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Byml {
    String(String),
    Array(Vec<Byml>),
    Hash(Hash),
    Bool(bool),
    Int(i32),
    Float(f32),
    UInt(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    Null,
}

impl Default for Byml {
    fn default() -> Self {
        Self::Null
    }
}

impl<'a, I: Into<BymlIndex<'a>>> Index<I> for Byml {
    type Output = Byml;

    fn index(&self, index: I) -> &Self::Output {
        match (self, index.into()) {
            (Self::Array(a), BymlIndex::ArrayIdx(idx)) => &a[idx],
            (Self::Hash(h), BymlIndex::HashIdx(key)) => &h[key],
            (Self::Array(_), BymlIndex::HashIdx(_)) => {
                panic!("cannot index a Byml::Array with a string key")
            }
            (Self::Hash(_), BymlIndex::ArrayIdx(_)) => {
                panic!("cannot index a Byml::Hash with an integer index")
            }
            _ => panic!("cannot index a Byml that is not Array or Hash"),
        }
    }
}

impl<'a, I: Into<BymlIndex<'a>>> IndexMut<I> for Byml {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        match (self, index.into()) {
            (Self::Array(a), BymlIndex::ArrayIdx(idx)) => &mut a[idx],
            (Self::Hash(h), BymlIndex::HashIdx(key)) => h.get_mut(key).unwrap(),
            (Self::Array(_), BymlIndex::HashIdx(_)) => {
                panic!("cannot index a Byml::Array with a string key")
            }
            (Self::Hash(_), BymlIndex::ArrayIdx(_)) => {
                panic!("cannot index a Byml::Hash with an integer index")
            }
            _ => panic!("cannot index a Byml that is not Array or Hash"),
        }
    }
}

impl FromIterator<Byml> for Byml {
    fn from_iter<T: IntoIterator<Item = Byml>>(iter: T) -> Self {
        Self::Array(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, Byml)> for Byml {
    fn from_iter<T: IntoIterator<Item = (&'a str, Byml)>>(iter: T) -> Self {
        Self::Hash(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl FromIterator<(String, Byml)> for Byml {
    fn from_iter<T: IntoIterator<Item = (String, Byml)>>(iter: T) -> Self {
        Self::Hash(iter.into_iter().collect())
    }
}

impl Byml {
    #[inline]
    pub(crate) fn get_node_type(&self) -> NodeType {
        match self {
            Byml::String(_) => NodeType::String,
            Byml::Array(_) => NodeType::Array,
            Byml::Hash(_) => NodeType::Hash,
            Byml::Bool(_) => NodeType::Bool,
            Byml::Int(_) => NodeType::Int,
            Byml::Float(_) => NodeType::Float,
            Byml::UInt(_) => NodeType::UInt,
            Byml::Int64(_) => NodeType::Int64,
            Byml::UInt64(_) => NodeType::UInt64,
            Byml::Double(_) => NodeType::Double,
            Byml::Null => NodeType::Null,
        }
    }

    #[inline(always)]
    pub(crate) fn is_non_inline_type(&self) -> bool {
        matches!(
            self,
            Byml::Array(_) | Byml::Hash(_) | Byml::Int64(_) | Byml::UInt64(_) | Byml::Double(_)
        )
    }

    /// Builds an `Int`/`UInt`/`Int64`/`UInt64` node from a 64-bit signed
    /// integer: negative values classify as `Int`/`Int64`, non-negative
    /// values as `UInt`/`UInt64`, each demoted to 32 bits when it fits
    /// losslessly (§4.5, §4.6).
    pub fn from_i64(value: i64) -> Self {
        if value.is_negative() {
            i32::try_from(value)
                .map(Byml::Int)
                .unwrap_or(Byml::Int64(value))
        } else {
            u32::try_from(value)
                .map(Byml::UInt)
                .unwrap_or(Byml::UInt64(value as u64))
        }
    }

    /// Builds a `UInt`/`UInt64` node from a 64-bit unsigned integer, demoting
    /// to `UInt` when it fits in 32 bits (§4.5, §4.6).
    pub fn from_u64(value: u64) -> Self {
        if let Ok(v) = u32::try_from(value) {
            Byml::UInt(v)
        } else {
            Byml::UInt64(value)
        }
    }

    /// Builds a `Float`/`Double` node, choosing `Float` when the value
    /// round-trips losslessly through `f32` (§4.5, §4.6).
    pub fn from_f64(value: f64) -> Self {
        let as_f32 = value as f32;
        if (as_f32 as f64) == value {
            Byml::Float(as_f32)
        } else {
            Byml::Double(value)
        }
    }

    /// Parses a BYML document from its binary representation (§4.4).
    pub fn from_binary(data: impl AsRef<[u8]>) -> Result<Self, BymlError> {
        parser::parse(data.as_ref())
    }

    /// Serializes the document to a seekable sink (§4.5). Only `Array` and
    /// `Hash` are valid roots (§3).
    pub fn write<W: std::io::Write + std::io::Seek>(
        &self,
        writer: &mut W,
        endian: crate::Endian,
        version: u16,
    ) -> Result<(), BymlError> {
        self::writer::write(self, writer, endian, version)
    }

    /// Serializes the document to a byte vector using format version 2.
    pub fn to_binary(&self, endian: crate::Endian) -> Vec<u8> {
        self.to_binary_with_version(endian, 2)
    }

    /// Serializes the document to a byte vector using the given version.
    pub fn to_binary_with_version(&self, endian: crate::Endian, version: u16) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write(&mut std::io::Cursor::new(&mut buf), endian, version)
            .expect("a typed Byml tree should always serialize without error");
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_demotion() {
        assert_eq!(Byml::from_i64(1), Byml::UInt(1));
        assert_eq!(Byml::from_i64(-1), Byml::Int(-1));
        assert_eq!(Byml::from_i64(5_000_000_000), Byml::UInt64(5_000_000_000));
        assert_eq!(Byml::from_i64(-5_000_000_000), Byml::Int64(-5_000_000_000));
        assert_eq!(Byml::from_u64(1), Byml::UInt(1));
        assert_eq!(Byml::from_u64(5_000_000_000), Byml::UInt64(5_000_000_000));
    }

    #[test]
    fn float_vs_double() {
        assert_eq!(Byml::from_f64(0.5), Byml::Float(0.5));
        assert_eq!(Byml::from_f64(0.1), Byml::Double(0.1));
    }

    #[test]
    fn indexing() {
        let mut hash = Hash::default();
        hash.insert("a".into(), Byml::Array(vec![Byml::Int(1), Byml::Int(2)]));
        let mut doc = Byml::Hash(hash);
        assert_eq!(*doc["a"][1].as_int().unwrap(), 2);
        doc["a"][0] = Byml::Int(9);
        assert_eq!(*doc["a"][0].as_int().unwrap(), 9);
    }

    #[test]
    fn empty_hash_round_trip() {
        let doc = Byml::Hash(Hash::default());
        let bytes = doc.to_binary(crate::Endian::Little);
        assert_eq!(
            bytes,
            vec![b'Y', b'B', 0x02, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 16, 0, 0, 0, 0xc1, 0, 0, 0]
        );
        assert_eq!(Byml::from_binary(&bytes).unwrap(), doc);
    }
}
