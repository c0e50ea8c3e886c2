#![allow(dead_code)]

use std::fs;
use std::path::Path;

use docbook2epub::transform::{Params, TransformError, Transformer};

pub const BOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<book xmlns="http://docbook.org/ns/docbook" version="5.0">
  <title>Main</title>
  <chapter><title>One</title><para>Hello <emphasis>world</emphasis>.</para></chapter>
  <bibliography>
    <title>References</title>
    <biblioentry xml:id="knuth"><title>TAOCP</title></biblioentry>
    <biblioentry xml:id="dijkstra"><title>EWD</title></biblioentry>
  </bibliography>
</book>
"#;

/// Writes the tree the DocBook EPUB stylesheet would, without running it.
///
/// The single page embeds the source as is so tests can look for leftovers.
pub struct FakeXslt {
    pub resources: Vec<&'static str>,
}

impl FakeXslt {
    pub fn new(resources: &[&'static str]) -> Self {
        Self {
            resources: resources.to_vec(),
        }
    }
}

impl Transformer for FakeXslt {
    fn transform(
        &self,
        source: &Path,
        work_dir: &Path,
        params: &Params,
    ) -> Result<(), TransformError> {
        let failed = |e: std::io::Error| TransformError::Failed {
            status: "1".into(),
            stderr: e.to_string(),
        };
        let source = fs::read_to_string(source).map_err(failed)?;
        let css = params
            .iter()
            .find(|(k, _)| k == "html.stylesheet")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();

        let oebps = work_dir.join("OEBPS");
        fs::create_dir_all(work_dir.join("META-INF")).map_err(failed)?;
        fs::create_dir_all(&oebps).map_err(failed)?;
        fs::write(work_dir.join("mimetype"), "application/epub+zip").map_err(failed)?;
        fs::write(work_dir.join("META-INF/container.xml"), CONTAINER).map_err(failed)?;
        fs::write(
            oebps.join("index.html"),
            format!("<html><head><link href=\"{css}\"/></head><body>{source}</body></html>"),
        )
        .map_err(failed)?;
        fs::write(oebps.join("content.opf"), opf(&self.resources)).map_err(failed)?;

        Ok(())
    }
}

const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#;

pub fn opf(resources: &[&str]) -> String {
    let items: String = resources
        .iter()
        .enumerate()
        .map(|(i, href)| format!("    <item id=\"r{i}\" href=\"{href}\" media-type=\"application/octet-stream\"/>\n"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Main</dc:title></metadata>
  <manifest>
    <item id="html" href="index.html" media-type="application/xhtml+xml"/>
{items}  </manifest>
  <spine><itemref idref="html"/></spine>
</package>
"#
    )
}

pub fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
