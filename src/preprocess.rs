//! Source cleanup run before the transformation.
//!
//! Bibliography entries are cut out of the DocBook source. The document is
//! not re-serialized: the byte spans of the removed elements are dropped and
//! every other byte is kept as it was.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::xmlutils::{XMLError, XMLReader};

/// Namespace of DocBook 5 documents.
pub const DOCBOOK_NS: &str = "http://docbook.org/ns/docbook";

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("I/O Error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Malformed XML: {0}")]
    Malformed(String),
    #[error("Unsupported encoding: {0}")]
    Encoding(String),
}

impl From<quick_xml::Error> for PreprocessError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

impl From<XMLError> for PreprocessError {
    fn from(e: XMLError) -> Self {
        Self::Malformed(e.to_string())
    }
}

/// Removes the `biblioentry` children of every `bibliography` in the file at
/// `path`, rewriting it in place.
///
/// # Errors
///
/// Returns [`PreprocessError::Malformed`] if the file isn't well formed XML
/// and [`PreprocessError::Encoding`] if its bytes aren't UTF-8, whatever
/// encoding it declares. The file is left untouched in both cases.
pub fn strip_bibliography<P: AsRef<Path>>(path: P) -> Result<PathBuf, PreprocessError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let source = String::from_utf8(bytes).map_err(|e| {
        PreprocessError::Encoding(format!("{} is not UTF-8: {}", path.display(), e))
    })?;

    let (cleaned, removed) = strip_bibliography_str(&source)?;
    if removed > 0 {
        fs::write(path, cleaned)?;
    }
    log::debug!("removed {} biblioentry elements from {}", removed, path.display());

    Ok(path.to_path_buf())
}

/// In memory version of [`strip_bibliography`].
///
/// Returns the cleaned document and the number of removed entries.
///
/// # Errors
///
/// Returns [`PreprocessError::Malformed`] if `source` isn't well formed.
pub fn strip_bibliography_str(source: &str) -> Result<(String, usize), PreprocessError> {
    XMLReader::check(source.as_bytes())?;
    let spans = biblioentry_spans(source)?;
    if spans.is_empty() {
        return Ok((source.to_string(), 0));
    }

    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for span in &spans {
        out.push_str(&source[last..span.start]);
        last = span.end;
    }
    out.push_str(&source[last..]);

    Ok((out, spans.len()))
}

// Byte ranges of every biblioentry element directly inside a bibliography.
fn biblioentry_spans(source: &str) -> Result<Vec<Range<usize>>, PreprocessError> {
    let mut reader = NsReader::from_str(source);
    reader.config_mut().check_end_names = true;

    // one flag per open element: is it a docbook bibliography
    let mut stack: Vec<bool> = vec![];
    let mut open_entry: Option<(usize, usize)> = None;
    let mut spans = vec![];
    let mut seen_root = false;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let docbook =
            matches!(ns, ResolveResult::Bound(Namespace(n)) if n == DOCBOOK_NS.as_bytes());
        let pos = reader.buffer_position() as usize;
        let in_bibliography = stack.last().copied().unwrap_or(false);

        match event {
            Event::Start(e) => {
                seen_root = true;
                let local = e.local_name();
                if open_entry.is_none()
                    && in_bibliography
                    && docbook
                    && local.as_ref() == b"biblioentry"
                {
                    open_entry = Some((tag_start(source, pos)?, stack.len()));
                }
                stack.push(docbook && local.as_ref() == b"bibliography");
            }
            Event::Empty(e) => {
                seen_root = true;
                if open_entry.is_none()
                    && in_bibliography
                    && docbook
                    && e.local_name().as_ref() == b"biblioentry"
                {
                    spans.push(tag_start(source, pos)?..pos);
                }
            }
            Event::End(_) => {
                if stack.pop().is_none() {
                    return Err(PreprocessError::Malformed("unexpected end tag".into()));
                }
                if let Some((start, depth)) = open_entry {
                    if depth == stack.len() {
                        spans.push(start..pos);
                        open_entry = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(PreprocessError::Malformed("no root element".into()));
    }
    if !stack.is_empty() {
        return Err(PreprocessError::Malformed(format!(
            "{} unclosed element(s) at end of document",
            stack.len()
        )));
    }

    Ok(spans)
}

// `end` points just past the `>` of a start tag. Attribute values can't
// hold a literal `<`, so the tag opens at the last one before it.
fn tag_start(source: &str, end: usize) -> Result<usize, PreprocessError> {
    source[..end]
        .rfind('<')
        .ok_or_else(|| PreprocessError::Malformed("start tag without '<'".into()))
}
