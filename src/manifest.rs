//! Reads the OPF package document produced by the transformer.
//!
//! Only the manifest is of interest here: it lists every resource the
//! generated content references, relative to the OEBPS root.

use std::fs;
use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::xmlutils::{self, XMLError};

/// Namespace of the OPF package document.
pub const OPF_NS: &str = "http://www.idpf.org/2007/opf";

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("I/O Error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("XML Error: {0}")]
    XmlError(#[from] XMLError),
    #[error("Package document has no manifest")]
    NoManifest,
}

/// One `item` of the OPF manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: Option<String>,
    /// the href as written in the package document
    pub href: String,
    pub media_type: Option<String>,
}

impl ManifestItem {
    /// Relative filesystem path of this resource below the OEBPS root.
    ///
    /// Returns [`None`] for hrefs that can't be resolved locally: remote
    /// URLs, absolute paths and paths climbing out of the root.
    pub fn local_path(&self) -> Option<PathBuf> {
        let href = self.href.split('#').next().unwrap_or_default();
        if href.is_empty() || href.contains("://") || href.starts_with("data:") {
            return None;
        }

        let decoded = percent_decode_str(href).decode_utf8().ok()?;
        let mut path = PathBuf::new();
        for c in Path::new(decoded.as_ref()).components() {
            match c {
                Component::Normal(s) => path.push(s),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !path.pop() {
                        return None;
                    }
                }
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }
}

/// The manifest of an OPF package document, in document order.
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    pub items: Vec<ManifestItem>,
}

impl Manifest {
    /// Parses the package document at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't a package
    /// document with a manifest.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let content = fs::read(path)?;
        Self::from_bytes(&content)
    }

    /// Parses a package document from memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the content isn't well formed or has no manifest.
    pub fn from_bytes(content: &[u8]) -> Result<Self, ManifestError> {
        let root = xmlutils::XMLReader::parse(content)?;
        let manifest = root
            .borrow()
            .find(OPF_NS, "manifest")
            .ok_or(ManifestError::NoManifest)?;

        let items = manifest
            .borrow()
            .find_all(OPF_NS, "item")
            .iter()
            .filter_map(|node| {
                let node = node.borrow();
                let href = node.get_attr("href")?;
                Some(ManifestItem {
                    id: node.get_attr("id"),
                    href,
                    media_type: node.get_attr("media-type"),
                })
            })
            .collect();

        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
