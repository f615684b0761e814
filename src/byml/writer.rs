//! Binary writer (§4.5): harvests strings, lays out the header and tables,
//! then emits the node graph with placeholder-then-backpatch offsets.

use std::io::{Seek, SeekFrom, Write};

use binrw::BinWrite;
use rustc_hash::FxHashMap;
use smartstring::alias::String;

use super::{is_container_type, is_valid_version, Byml, BymlError, NodeType};
use crate::{
    util::{align, u24},
    Endian,
};

pub(super) fn write<'a, W: Write + Seek>(
    byml: &'a Byml,
    writer: &mut W,
    endian: Endian,
    version: u16,
) -> Result<(), BymlError> {
    if !is_valid_version(version) {
        return Err(BymlError::BadVersion(version));
    }
    if version == 1 && endian == Endian::Big {
        return Err(BymlError::EndianVersionMismatch);
    }
    if !matches!(byml, Byml::Array(_) | Byml::Hash(_)) {
        return Err(BymlError::BadValueType(format!("{byml:?}")));
    }

    let mut ctx = WriteContext::new(byml, writer, endian);
    ctx.write(match endian {
        Endian::Little => *b"YB",
        Endian::Big => *b"BY",
    })?;
    ctx.write(version)?;
    ctx.write(0u32)?; // hash-key table offset placeholder
    ctx.write(0u32)?; // value string table offset placeholder
    ctx.write(0u32)?; // root node offset placeholder

    if !ctx.hash_key_table.is_empty() {
        let pos = ctx.writer.stream_position()? as u32;
        ctx.write_at(pos, 4)?;
        ctx.write_string_table(Table::HashKey)?;
        ctx.align()?;
    }
    if !ctx.string_table.is_empty() {
        let pos = ctx.writer.stream_position()? as u32;
        ctx.write_at(pos, 8)?;
        ctx.write_string_table(Table::ValueString)?;
        ctx.align()?;
    }

    let pos = ctx.writer.stream_position()? as u32;
    ctx.write_at(pos, 12)?;
    ctx.write_container_node(byml)?;
    ctx.align()?;
    ctx.writer.flush()?;
    Ok(())
}

enum Table {
    HashKey,
    ValueString,
}

struct NonInlineNode<'a> {
    data: &'a Byml,
    offset: u32,
}

#[derive(Debug, Default)]
struct StringTable<'a> {
    table: FxHashMap<&'a String, u32>,
    sorted_strings: Vec<&'a String>,
}

impl<'a> StringTable<'a> {
    fn add(&mut self, s: &'a String) {
        self.table.insert(s, 0);
    }

    fn get_index(&self, s: &String) -> u32 {
        *self
            .table
            .get(s)
            .expect("every string was harvested before the writer looks it up")
    }

    fn build(&mut self) {
        self.sorted_strings = self.table.keys().copied().collect();
        self.sorted_strings.sort();
        self.table = self
            .sorted_strings
            .iter()
            .enumerate()
            .map(|(i, s)| (*s, i as u32))
            .collect();
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

struct WriteContext<'a, W: Write + Seek> {
    writer: W,
    opts: binrw::WriteOptions,
    hash_key_table: StringTable<'a>,
    string_table: StringTable<'a>,
}

impl<'a, W: Write + Seek> WriteContext<'a, W> {
    fn new(byml: &'a Byml, writer: W, endian: Endian) -> Self {
        let mut string_table = StringTable::default();
        let mut hash_key_table = StringTable::default();

        fn traverse<'a>(
            byml: &'a Byml,
            string_table: &mut StringTable<'a>,
            hash_key_table: &mut StringTable<'a>,
        ) {
            match byml {
                Byml::String(s) => string_table.add(s),
                Byml::Array(arr) => {
                    for node in arr {
                        traverse(node, string_table, hash_key_table);
                    }
                }
                Byml::Hash(hash) => {
                    for (key, node) in hash {
                        hash_key_table.add(key);
                        traverse(node, string_table, hash_key_table);
                    }
                }
                _ => {}
            }
        }
        traverse(byml, &mut string_table, &mut hash_key_table);
        string_table.build();
        hash_key_table.build();

        WriteContext {
            writer,
            opts: binrw::WriteOptions::default().with_endian(endian.into()),
            hash_key_table,
            string_table,
        }
    }

    #[inline(always)]
    fn write<T>(&mut self, val: T) -> Result<(), BymlError>
    where
        T: BinWrite,
        T::Args: Default,
    {
        val.write_options(&mut self.writer, &self.opts, T::Args::default())?;
        Ok(())
    }

    fn align(&mut self) -> Result<(), BymlError> {
        let pos = self.writer.stream_position()? as u32;
        self.writer.seek(SeekFrom::Start(align(pos, 4) as u64))?;
        Ok(())
    }

    fn write_at<T>(&mut self, val: T, offset: u32) -> Result<(), BymlError>
    where
        T: BinWrite,
        T::Args: Default,
    {
        let old_pos = self.writer.stream_position()?;
        self.writer.seek(SeekFrom::Start(offset as u64))?;
        self.write(val)?;
        self.writer.seek(SeekFrom::Start(old_pos))?;
        Ok(())
    }

    fn write_value_node(&mut self, node: &Byml) -> Result<(), BymlError> {
        match node {
            Byml::Null => self.write(0u32),
            Byml::String(s) => {
                let idx = self.string_table.get_index(s);
                self.write(idx)
            }
            Byml::Bool(b) => self.write(*b as u32),
            Byml::Int(i) => self.write(*i),
            Byml::UInt(u) => self.write(*u),
            Byml::Float(f) => self.write(f.to_bits()),
            _ => unreachable!("write_value_node called on a non-inline node"),
        }
    }

    fn write_boxed_scalar(&mut self, node: &Byml) -> Result<(), BymlError> {
        match node {
            Byml::Int64(i) => self.write(*i),
            Byml::UInt64(u) => self.write(*u),
            Byml::Double(d) => self.write(d.to_bits()),
            _ => unreachable!("write_boxed_scalar called on a non-boxed-scalar node"),
        }
    }

    fn write_container_node(&mut self, node: &'a Byml) -> Result<(), BymlError> {
        let mut deferred = Vec::new();

        fn queue_or_write<'a, W: Write + Seek>(
            ctx: &mut WriteContext<'a, W>,
            item: &'a Byml,
            deferred: &mut Vec<NonInlineNode<'a>>,
        ) -> Result<(), BymlError> {
            if item.is_non_inline_type() {
                deferred.push(NonInlineNode {
                    data: item,
                    offset: ctx.writer.stream_position()? as u32,
                });
                ctx.write(0u32)
            } else {
                ctx.write_value_node(item)
            }
        }

        match node {
            Byml::Array(arr) => {
                deferred.reserve(arr.len());
                self.write(NodeType::Array)?;
                self.write(u24(arr.len() as u32))?;
                let tags_pos = self.writer.stream_position()? as u32;
                self.writer.seek(SeekFrom::Current(arr.len() as i64))?;
                self.align()?;
                for (i, item) in arr.iter().enumerate() {
                    self.write_at(item.get_node_type(), tags_pos + i as u32)?;
                    queue_or_write(self, item, &mut deferred)?;
                }
            }
            Byml::Hash(hash) => {
                deferred.reserve(hash.len());
                self.write(NodeType::Hash)?;
                self.write(u24(hash.len() as u32))?;
                let mut sorted: Vec<_> = hash.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(b.0));
                for (key, item) in sorted {
                    self.write(u24(self.hash_key_table.get_index(key)))?;
                    self.write(item.get_node_type())?;
                    queue_or_write(self, item, &mut deferred)?;
                }
            }
            _ => unreachable!("write_container_node called on a value node"),
        }

        for pending in deferred {
            self.align()?;
            let offset = self.writer.stream_position()? as u32;
            self.write_at(offset, pending.offset)?;
            if is_container_type(pending.data.get_node_type()) {
                self.write_container_node(pending.data)?;
            } else {
                self.write_boxed_scalar(pending.data)?;
            }
        }

        Ok(())
    }

    fn write_string_table(&mut self, which: Table) -> Result<(), BymlError> {
        let (len, sorted): (usize, Vec<&String>) = match which {
            Table::HashKey => (
                self.hash_key_table.len(),
                self.hash_key_table.sorted_strings.clone(),
            ),
            Table::ValueString => (
                self.string_table.len(),
                self.string_table.sorted_strings.clone(),
            ),
        };

        let start = self.writer.stream_position()? as u32;
        self.write(NodeType::StringTable)?;
        self.write(u24(len as u32))?;

        let offsets_pos = self.writer.stream_position()? as u32;
        self.writer
            .seek(SeekFrom::Start((offsets_pos as usize + 4 * (len + 1)) as u64))?;

        for (i, s) in sorted.iter().enumerate() {
            let pos = self.writer.stream_position()? as u32;
            self.write_at(pos - start, offsets_pos + 4 * i as u32)?;
            self.write(s.as_bytes())?;
            self.write(0u8)?;
        }

        let end = self.writer.stream_position()? as u32;
        self.write_at(end - start, offsets_pos + 4 * len as u32)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::Byml;
    use crate::Endian;

    #[test]
    fn round_trip_one_key() {
        let mut hash = crate::byml::Hash::default();
        hash.insert("a".into(), Byml::String("b".into()));
        let doc = Byml::Hash(hash);
        let bytes = doc.to_binary(Endian::Little);
        let back = Byml::from_binary(&bytes).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn null_root_rejected() {
        let mut buf = Vec::new();
        let err = Byml::Null
            .write(&mut std::io::Cursor::new(&mut buf), Endian::Little, 2)
            .unwrap_err();
        assert!(matches!(err, crate::byml::BymlError::BadValueType(_)));
    }

    #[test]
    fn integer_classification() {
        let mut hash = crate::byml::Hash::default();
        hash.insert("n".into(), Byml::from_i64(-1));
        hash.insert("u".into(), Byml::from_i64(1));
        hash.insert("big".into(), Byml::from_i64(5_000_000_000));
        hash.insert("neg".into(), Byml::from_i64(-5_000_000_000));
        let doc = Byml::Hash(hash);
        let bytes = doc.to_binary(Endian::Little);
        let back = Byml::from_binary(&bytes).unwrap();
        assert_eq!(doc, back);
        let back_hash = back.as_hash().unwrap();
        assert!(matches!(back_hash["n"], Byml::Int(-1)));
        assert!(matches!(back_hash["u"], Byml::UInt(1)));
        assert!(matches!(back_hash["big"], Byml::UInt64(5_000_000_000)));
        assert!(matches!(back_hash["neg"], Byml::Int64(-5_000_000_000)));
    }

    #[test]
    fn nested_arrays_round_trip() {
        let doc = Byml::Hash({
            let mut h = crate::byml::Hash::default();
            h.insert(
                "xs".into(),
                Byml::Array(vec![
                    Byml::Int(1),
                    Byml::String("two".into()),
                    Byml::Array(vec![Byml::Int(3), Byml::Int(4)]),
                    Byml::Null,
                    Byml::Bool(true),
                ]),
            );
            h
        });
        let le = doc.to_binary(Endian::Little);
        assert_eq!(Byml::from_binary(&le).unwrap(), doc);
        let be = doc.to_binary_with_version(Endian::Big, 3);
        assert_eq!(be[0..2], *b"BY");
        assert_eq!(Byml::from_binary(&be).unwrap(), doc);
    }

    #[test]
    fn canonicalization_idempotent() {
        let mut hash = crate::byml::Hash::default();
        hash.insert("z".into(), Byml::Int(1));
        hash.insert("a".into(), Byml::String("hi".into()));
        let doc = Byml::Hash(hash);
        let once = doc.to_binary(Endian::Little);
        let parsed = Byml::from_binary(&once).unwrap();
        let twice = parsed.to_binary(Endian::Little);
        assert_eq!(once, twice);
    }
}
