//! A native Rust codec for Nintendo's BYML (binary YAML) tree format.
//!
//! ```
//! # use byml::{Byml, Endian};
//! let doc = Byml::Hash(Default::default());
//! let bytes = doc.to_binary(Endian::Little);
//! assert_eq!(Byml::from_binary(&bytes).unwrap(), doc);
//! ```
//!
//! The binary codec (parsing and writing, in the [`byml`] module) is the
//! core of this crate and has no optional dependencies. The `yaml` feature
//! (enabled by default) adds a YAML⇄BYML text bridge, a pure-Rust Yaz0
//! decompression/compression envelope, and two CLI binaries,
//! `byml_to_yml` and `yml_to_byml` — none of which are part of the core
//! binary format.

pub mod byml;
pub(crate) mod util;
#[cfg(feature = "yaml")]
mod yaml;
pub mod yaz0;

pub use byml::{Byml, BymlError, Hash};

/// Byte order of a BYML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl From<Endian> for binrw::Endian {
    fn from(e: Endian) -> Self {
        match e {
            Endian::Big => binrw::Endian::Big,
            Endian::Little => binrw::Endian::Little,
        }
    }
}

/// Top-level error type for this crate. Wraps the core codec's errors
/// together with the ambient, non-core collaborators (YAML bridging, Yaz0
/// decompression) used by the CLI binaries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Byml(#[from] byml::BymlError),
    #[cfg(feature = "yaml")]
    #[error(transparent)]
    Yaml(#[from] yaml::YamlError),
    #[error(transparent)]
    Yaz0(#[from] yaz0::Yaz0Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
