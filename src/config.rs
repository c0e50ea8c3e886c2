//! Conversion settings.
//!
//! Every field has a default; a TOML file only needs the keys it changes:
//!
//! ```toml
//! docbook_xsl = "/usr/share/xml/docbook/stylesheet/docbook-xsl/epub/docbook.xsl"
//! stylesheet_href = "css/book.css"
//!
//! [params]
//! "chunk.section.depth" = "0"
//!
//! [access]
//! read_network = false
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::transform::{AccessControl, Params};

/// DocBook XSL release the tool ships with.
pub const DOCBOOK_XSL_VERSION: &str = "1.79.1";
/// Href of the stylesheet linked from every generated page.
pub const DEFAULT_STYLESHEET_HREF: &str = "css/stylesheets.css";
/// Name of the directory the stylesheet writes into.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "output";
/// Stylesheet parameter overriding the generated pages' stylesheet link.
pub const HTML_STYLESHEET_PARAM: &str = "html.stylesheet";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O Error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("TOML Error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid output directory name '{0}'")]
    OutputDirName(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The DocBook XSL EPUB stylesheet.
    pub docbook_xsl: PathBuf,
    /// The xsltproc executable.
    pub xsltproc: PathBuf,
    pub stylesheet_href: String,
    /// Copied in place of `stylesheet_href` when the source has none.
    pub default_stylesheet: PathBuf,
    pub output_dir_name: String,
    /// Extra stylesheet parameters.
    pub params: BTreeMap<String, String>,
    pub access: AccessControl,
}

impl Default for Config {
    fn default() -> Self {
        let base = install_dir();
        Self {
            docbook_xsl: base
                .join(format!("docbook-xsl-{}", DOCBOOK_XSL_VERSION))
                .join("epub")
                .join("docbook.xsl"),
            xsltproc: PathBuf::from("xsltproc"),
            stylesheet_href: DEFAULT_STYLESHEET_HREF.to_string(),
            default_stylesheet: base.join(DEFAULT_STYLESHEET_HREF),
            output_dir_name: DEFAULT_OUTPUT_DIR_NAME.to_string(),
            params: BTreeMap::new(),
            access: AccessControl::default(),
        }
    }
}

impl Config {
    /// Reads a configuration file, relative paths in it are taken from the
    /// file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or parsed.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_toml_str(&fs::read_to_string(path)?)?;
        if let Some(base) = path.parent() {
            config.docbook_xsl = base.join(&config.docbook_xsl);
            config.default_stylesheet = base.join(&config.default_stylesheet);
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if `s` isn't a valid configuration.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::OutputDirName`] if the output directory name
    /// is not a single plain path component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.output_dir_name;
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if plain {
            Ok(())
        } else {
            Err(ConfigError::OutputDirName(name.clone()))
        }
    }

    /// Parameters handed to the stylesheet.
    ///
    /// [`HTML_STYLESHEET_PARAM`] always points at `stylesheet_href`.
    pub fn stylesheet_params(&self) -> Params {
        let mut params: Params = self
            .params
            .iter()
            .filter(|(k, _)| k.as_str() != HTML_STYLESHEET_PARAM)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params.push((
            HTML_STYLESHEET_PARAM.to_string(),
            self.stylesheet_href.clone(),
        ));
        params
    }
}

/// Directory of the running executable, or the working directory when it
/// can't be found.
pub fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
