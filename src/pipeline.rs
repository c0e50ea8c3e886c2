//! The conversion, step by step.
//!
//! 1. the output tree next to the source is wiped and recreated
//! 2. bibliography entries are stripped from the source, which is then
//!    copied into the output tree
//! 3. the stylesheet generates the OEBPS tree
//! 4. resources listed in the manifest are copied in
//! 5. `mimetype` is written and the tree zipped
//! 6. the archive is moved next to the output tree

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::{self, ArchiveError};
use crate::config::Config;
use crate::preprocess::{self, PreprocessError};
use crate::resources::{self, Resolution, ResolveError, ResolvePolicy};
use crate::status::StatusReporter;
use crate::transform::{TransformError, Transformer, XsltProc};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Preprocess Error: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("Transform Error: {0}")]
    Transform(#[from] TransformError),
    #[error("Resource Error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("Archive Error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("I/O Error on '{}': {source}", .path.display())]
    IOError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid source '{0}'")]
    InvalidSource(PathBuf),
}

/// Result of a finished conversion.
#[derive(Clone, Debug)]
pub struct Outcome {
    /// Where the archive ended up.
    pub archive: PathBuf,
    pub resolution: Resolution,
    /// `false` if the archive couldn't be moved out of the output tree.
    pub moved: bool,
}

impl Outcome {
    /// File name of the archive.
    pub fn archive_name(&self) -> String {
        self.archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub struct Pipeline {
    config: Config,
    transformer: Box<dyn Transformer>,
}

impl Pipeline {
    pub fn new(config: Config, transformer: Box<dyn Transformer>) -> Self {
        Self {
            config,
            transformer,
        }
    }

    /// A pipeline running `xsltproc` as configured.
    pub fn with_xsltproc(config: Config) -> Self {
        let xslt = XsltProc::new(&config.docbook_xsl)
            .program(&config.xsltproc)
            .access(config.access);
        Self::new(config, Box::new(xslt))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Converts the DocBook document at `source` into an EPUB written next
    /// to it.
    ///
    /// Missing resources and a failed final move are reported through
    /// `reporter` and don't fail the run.
    ///
    /// # Errors
    ///
    /// Malformed sources, stylesheet failures, unreadable manifests and
    /// archive write failures abort the run.
    pub fn run(
        &self,
        source: &Path,
        reporter: &dyn StatusReporter,
    ) -> Result<Outcome, PipelineError> {
        let source = fs::canonicalize(source).map_err(|e| io_err(source, e))?;
        let (source_dir, file_name) = match (source.parent(), source.file_name()) {
            (Some(dir), Some(name)) if source.is_file() => (dir.to_path_buf(), name.to_owned()),
            _ => return Err(PipelineError::InvalidSource(source.clone())),
        };

        let output_dir = source_dir.join(&self.config.output_dir_name);
        let previous = source_dir.join(format!("{}.epub", self.config.output_dir_name));
        clean(&output_dir, &previous)?;

        reporter.report(&format!("Converting '{}'", source.display()));
        preprocess::strip_bibliography(&source)?;

        let work_copy = output_dir.join(&file_name);
        fs::copy(&source, &work_copy).map_err(|e| io_err(&work_copy, e))?;

        reporter.report("Applying DocBook stylesheet");
        let params = self.config.stylesheet_params();
        self.transformer.transform(&work_copy, &output_dir, &params)?;

        let policy = ResolvePolicy {
            source_dir: source_dir.clone(),
            stylesheet_href: self.config.stylesheet_href.clone(),
            default_stylesheet: Some(self.config.default_stylesheet.clone()),
        };
        let resolution = resources::resolve(&output_dir, &policy, reporter)?;

        archive::write_mimetype(&output_dir)?;
        let built = archive::create_archive(&output_dir, &work_copy)?;

        let (archive, moved) = match archive::move_archive(&built, &source_dir) {
            Ok(to) => (to, true),
            Err(e) => {
                reporter.warn(&e.to_string());
                (built, false)
            }
        };

        let outcome = Outcome {
            archive,
            resolution,
            moved,
        };
        let line = format!("Created epub archive as '{}'", outcome.archive_name());
        log::info!("archive written to {}", outcome.archive.display());
        reporter.report(&line);

        Ok(outcome)
    }
}

fn io_err(path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::IOError {
        path: path.to_path_buf(),
        source,
    }
}

// Every run starts from an empty output tree.
fn clean(output_dir: &Path, previous: &Path) -> Result<(), PipelineError> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir).map_err(|e| io_err(output_dir, e))?;
    }
    // anything else in the way is left for the final move to report
    if previous.is_file() {
        fs::remove_file(previous).map_err(|e| io_err(previous, e))?;
    }
    fs::create_dir_all(output_dir).map_err(|e| io_err(output_dir, e))
}
