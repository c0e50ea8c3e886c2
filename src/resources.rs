//! Completes the generated tree with the files its manifest references.
//!
//! The stylesheet only writes the documents it generates. Images,
//! stylesheets and other resources the source points to still live next to
//! the source and have to be copied below `OEBPS`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::manifest::{Manifest, ManifestError, ManifestItem};
use crate::status::StatusReporter;

/// Directory of the generated content, relative to the output tree.
pub const OEBPS: &str = "OEBPS";
/// Package document name, relative to [`OEBPS`].
pub const PACKAGE_DOCUMENT: &str = "content.opf";

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Manifest Error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("Could not copy '{href}': {source}")]
    Copy {
        href: String,
        source: std::io::Error,
    },
}

/// How missing manifest resources are found.
#[derive(Clone, Debug)]
pub struct ResolvePolicy {
    /// Directory the source document was selected from.
    pub source_dir: PathBuf,
    /// Manifest href of the stylesheet linked from the generated pages.
    pub stylesheet_href: String,
    /// Stylesheet shipped with the tool, used when the source has none.
    pub default_stylesheet: Option<PathBuf>,
}

/// What a resolution pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// hrefs copied from the source directory
    pub copied: Vec<String>,
    /// hrefs filled with the tool's default stylesheet
    pub fallbacks: Vec<String>,
    /// hrefs that could not be found anywhere
    pub skipped: Vec<String>,
}

/// Copies every manifest resource missing under `output_dir/OEBPS`.
///
/// Missing resources don't fail the pass: they are reported through
/// `reporter` and listed in [`Resolution::skipped`].
///
/// # Errors
///
/// Returns an error if the package document can't be read, or if a file
/// that exists can't be copied.
pub fn resolve(
    output_dir: &Path,
    policy: &ResolvePolicy,
    reporter: &dyn StatusReporter,
) -> Result<Resolution, ResolveError> {
    let oebps = output_dir.join(OEBPS);
    let manifest = Manifest::from_file(oebps.join(PACKAGE_DOCUMENT))?;
    let mut resolution = Resolution::default();

    for item in &manifest.items {
        let Some(rel) = item.local_path() else {
            reporter.warn(&format!("Skipping non local resource '{}'", item.href));
            resolution.skipped.push(item.href.clone());
            continue;
        };

        let target = oebps.join(&rel);
        if target.exists() {
            continue;
        }

        if let Some(from) = locate(item, &rel, policy, &mut resolution) {
            reporter.report(&format!("Copying '{}' into content folder", item.href));
            log::debug!("copying {} to {}", from.display(), target.display());
            copy(&from, &target).map_err(|e| ResolveError::Copy {
                href: item.href.clone(),
                source: e,
            })?;
        } else {
            reporter.warn(&format!(
                "Resource '{}' not found in '{}', skipping",
                item.href,
                policy.source_dir.display()
            ));
            resolution.skipped.push(item.href.clone());
        }
    }

    Ok(resolution)
}

fn locate(
    item: &ManifestItem,
    rel: &Path,
    policy: &ResolvePolicy,
    resolution: &mut Resolution,
) -> Option<PathBuf> {
    let from = policy.source_dir.join(rel);
    if from.is_file() {
        resolution.copied.push(item.href.clone());
        return Some(from);
    }

    if item.href != policy.stylesheet_href {
        return None;
    }
    let fallback = policy.default_stylesheet.as_ref().filter(|p| p.is_file())?;
    resolution.fallbacks.push(item.href.clone());
    Some(fallback.clone())
}

fn copy(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    Ok(())
}
