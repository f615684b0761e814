//! YAML text bridge (§4.7, §6): `Byml::from_text`/`to_text`, built on the
//! same scalar-tag vocabulary the aamp text bridge would use, via `ryml`.

use ryml::{NodeRef, Tree};

use super::*;
use crate::yaml::{get_tag_based_type, parse_scalar, Scalar, TagBasedType, YamlError};

impl Byml {
    /// Parses a document from its YAML text representation (§6).
    pub fn from_text(text: impl AsRef<str>) -> Result<Byml, crate::Error> {
        Ok(Parser::new(text.as_ref())?.parse()?)
    }

    /// Serializes the document to YAML. Only `Null`, `Array`, and `Hash`
    /// nodes can be roots.
    pub fn to_text(&self) -> Result<std::string::String, crate::Error> {
        Ok(Emitter::new(self).emit()?)
    }
}

#[inline]
fn recognize_tag(tag: &str) -> Option<TagBasedType> {
    match tag {
        "!f64" => Some(TagBasedType::Float),
        "!u" | "!l" | "!ul" => Some(TagBasedType::Int),
        _ => None,
    }
}

/// An untagged integer scalar always maps to `Int` (§6), demoted to
/// `Int64` only if it doesn't fit — unlike [`Byml::from_i64`], it never
/// classifies by sign into `UInt`/`UInt64`, since that distinction is only
/// reachable here via the explicit `!u`/`!ul` tags.
#[inline]
fn default_int(bits: i64) -> Byml {
    match i32::try_from(bits) {
        Ok(v) => Byml::Int(v),
        Err(_) => Byml::Int64(bits),
    }
}

struct Parser<'a>(Tree<'a>);

impl<'a> Parser<'a> {
    fn new(text: &str) -> Result<Self, YamlError> {
        Ok(Self(Tree::parse(text)?))
    }

    fn parse_node(&self, node: NodeRef<'a, '_, '_, &Tree<'a>>) -> Result<Byml, YamlError> {
        if node.is_map()? {
            Ok(Byml::Hash(
                node.iter()?
                    .map(|child| {
                        let key = child.key()?;
                        let value = self.parse_node(child.clone())?;
                        Ok((key.into(), value))
                    })
                    .collect::<Result<_, YamlError>>()?,
            ))
        } else if node.is_seq()? {
            Ok(Byml::Array(
                node.iter()?
                    .map(|child| self.parse_node(child.clone()))
                    .collect::<Result<_, YamlError>>()?,
            ))
        } else {
            let tag = node.val_tag().unwrap_or("");
            let tag_type = get_tag_based_type(tag).or_else(|| recognize_tag(tag));
            let scalar = parse_scalar(tag_type, node.val()?, node.is_quoted()?)?;
            Ok(match scalar {
                Scalar::Bool(b) => Byml::Bool(b),
                Scalar::Float(f) => match tag {
                    "!f64" => Byml::Double(f),
                    _ => Byml::from_f64(f),
                },
                Scalar::Int(bits) => match tag {
                    "!u" => Byml::UInt(bits as u32),
                    "!ul" => Byml::UInt64(bits),
                    "!l" => Byml::Int64(bits as i64),
                    _ => default_int(bits as i64),
                },
                Scalar::Null => Byml::Null,
                Scalar::String(s) => Byml::String(s.into()),
            })
        }
    }

    fn parse(self) -> Result<Byml, YamlError> {
        let root = self.0.root_ref()?;
        self.parse_node(root)
    }
}

struct Emitter<'a, 'b>(&'a Byml, Tree<'b>);

impl<'a, 'b> Emitter<'a, 'b> {
    fn new(byml: &'a Byml) -> Self {
        let mut tree = Tree::default();
        tree.reserve(256);
        Self(byml, tree)
    }

    fn build_node<'e>(
        byml: &Byml,
        mut dest_node: NodeRef<'b, 'e, '_, &'e mut Tree<'b>>,
    ) -> Result<(), YamlError> {
        match byml {
            Byml::Array(array) => {
                dest_node.set_type_flags(ryml::NodeType::Seq)?;
                for item in array {
                    let node = dest_node.append_child()?;
                    Self::build_node(item, node)?;
                }
            }
            Byml::Hash(hash) => {
                dest_node.set_type_flags(ryml::NodeType::Map)?;
                // Keys are emitted sorted, matching the binary writer, so
                // text output is deterministic regardless of hash order.
                let mut entries: Vec<_> = hash.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                for (key, value) in entries {
                    let mut node = dest_node.append_child()?;
                    node.set_key(key)?;
                    Self::build_node(value, node)?;
                }
            }
            Byml::String(s) => dest_node.set_val(s)?,
            Byml::Bool(b) => dest_node.set_val(if *b { "true" } else { "false" })?,
            Byml::Float(f) => dest_node.set_val(&lexical::to_string(*f))?,
            Byml::Double(d) => {
                dest_node.set_val_tag("!f64")?;
                dest_node.set_val(&lexical::to_string(*d))?;
            }
            Byml::Int(i) => dest_node.set_val(&lexical::to_string(*i))?,
            Byml::UInt(u) => {
                dest_node.set_val_tag("!u")?;
                dest_node.set_val(&format!("0x{u:08x}"))?;
            }
            Byml::Int64(i) => {
                dest_node.set_val_tag("!l")?;
                dest_node.set_val(&lexical::to_string(*i))?;
            }
            Byml::UInt64(u) => {
                dest_node.set_val_tag("!ul")?;
                dest_node.set_val(&lexical::to_string(*u))?;
            }
            Byml::Null => dest_node.set_val("null")?,
        }
        Ok(())
    }

    fn emit(self) -> Result<std::string::String, crate::Error> {
        let Self(byml, mut tree) = self;
        match byml {
            Byml::Hash(_) => tree.to_map(0).map_err(YamlError::from)?,
            Byml::Array(_) => tree.to_seq(0).map_err(YamlError::from)?,
            Byml::Null => return Ok("null".to_string()),
            _ => return Err(BymlError::BadValueType(format!("{byml:?}")).into()),
        };
        Self::build_node(byml, tree.root_ref_mut().map_err(YamlError::from)?)
            .map_err(crate::Error::from)?;
        Ok(tree.emit().map_err(YamlError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_tags_round_trip() {
        let mut hash = Hash::default();
        hash.insert("name".into(), Byml::String("link".into()));
        hash.insert("hp".into(), Byml::UInt(100));
        hash.insert("seed".into(), Byml::Int64(-5_000_000_000));
        hash.insert("mass".into(), Byml::UInt64(18_000_000_000));
        hash.insert("scale".into(), Byml::Double(0.1));
        hash.insert("speed".into(), Byml::Float(1.5));
        hash.insert("alive".into(), Byml::Bool(true));
        hash.insert("extra".into(), Byml::Null);
        let doc = Byml::Hash(hash);

        let text = doc.to_text().unwrap();
        let back = Byml::from_text(&text).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn null_root_emits_bare_null() {
        assert_eq!(Byml::Null.to_text().unwrap(), "null");
    }

    #[test]
    fn array_round_trip() {
        let doc = Byml::Array(vec![Byml::Int(1), Byml::Int(2), Byml::Int(3)]);
        let text = doc.to_text().unwrap();
        assert_eq!(Byml::from_text(&text).unwrap(), doc);
    }

    #[test]
    fn scalar_root_rejected() {
        assert!(Byml::Int(1).to_text().is_err());
    }
}
