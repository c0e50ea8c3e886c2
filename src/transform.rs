//! Applies the DocBook XSL stylesheet to a source document.
//!
//! The transformation itself belongs to the stylesheet; this crate only
//! drives it. [`Transformer`] is the seam: [`XsltProc`] runs the `xsltproc`
//! executable, tests and embedders can plug their own implementation.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

/// Stylesheet parameters, passed as strings, in insertion order.
pub type Params = Vec<(String, String)>;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Stylesheet not found: {0}")]
    MissingStylesheet(PathBuf),
    #[error("Could not run '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Transformation failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Unsupported access control: {0}")]
    Unsupported(&'static str),
}

/// What the stylesheet is allowed to touch while it runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccessControl {
    pub read_file: bool,
    pub write_file: bool,
    pub create_dir: bool,
    pub read_network: bool,
    pub write_network: bool,
}

impl Default for AccessControl {
    fn default() -> Self {
        Self {
            read_file: true,
            write_file: true,
            create_dir: true,
            read_network: true,
            write_network: false,
        }
    }
}

pub trait Transformer: Send + Sync {
    /// Transforms `source`, writing the generated tree into `work_dir`.
    ///
    /// # Errors
    ///
    /// Any stylesheet or parser failure aborts the conversion.
    fn transform(&self, source: &Path, work_dir: &Path, params: &Params)
        -> Result<(), TransformError>;
}

/// Runs the `xsltproc` command line processor.
#[derive(Clone, Debug)]
pub struct XsltProc {
    pub program: PathBuf,
    pub stylesheet: PathBuf,
    pub access: AccessControl,
}

impl XsltProc {
    pub fn new<P: Into<PathBuf>>(stylesheet: P) -> Self {
        Self {
            program: PathBuf::from("xsltproc"),
            stylesheet: stylesheet.into(),
            access: AccessControl::default(),
        }
    }

    #[must_use]
    pub fn program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    #[must_use]
    pub fn access(mut self, access: AccessControl) -> Self {
        self.access = access;
        self
    }

    /// The argument list handed to the executable, before the source path.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Unsupported`] for permissions xsltproc
    /// can't express.
    pub fn args(&self, params: &Params) -> Result<Vec<String>, TransformError> {
        if self.access.write_network {
            return Err(TransformError::Unsupported("network writes"));
        }
        if !self.access.read_file {
            return Err(TransformError::Unsupported("denying file reads"));
        }

        let mut args = vec![];
        if !self.access.write_file {
            args.push("--nowrite".to_string());
        }
        if !self.access.create_dir {
            args.push("--nomkdir".to_string());
        }
        if !self.access.read_network {
            args.push("--nonet".to_string());
        }
        for (name, value) in params {
            args.push("--stringparam".to_string());
            args.push(name.clone());
            args.push(value.clone());
        }
        args.push(self.stylesheet.to_string_lossy().into_owned());

        Ok(args)
    }
}

impl Transformer for XsltProc {
    fn transform(
        &self,
        source: &Path,
        work_dir: &Path,
        params: &Params,
    ) -> Result<(), TransformError> {
        if !self.stylesheet.is_file() {
            return Err(TransformError::MissingStylesheet(self.stylesheet.clone()));
        }

        let args = self.args(params)?;
        log::debug!("running {} {:?} {}", self.program.display(), args, source.display());

        let output = Command::new(&self.program)
            .args(&args)
            .arg(source)
            .current_dir(work_dir)
            .output()
            .map_err(|e| TransformError::Spawn {
                program: self.program.display().to_string(),
                source: e,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(TransformError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
