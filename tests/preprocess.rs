mod common;

use docbook2epub::preprocess::{strip_bibliography, strip_bibliography_str, PreprocessError};
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn strips_every_biblioentry() {
    let (out, removed) = strip_bibliography_str(common::BOOK).unwrap();
    assert_eq!(2, removed);
    assert!(!out.contains("biblioentry"));
    assert!(out.contains("<title>References</title>"));
}

#[test]
fn keeps_everything_else_byte_for_byte() {
    let (out, _) = strip_bibliography_str(common::BOOK).unwrap();
    let expected = common::BOOK
        .replace(
            r#"<biblioentry xml:id="knuth"><title>TAOCP</title></biblioentry>"#,
            "",
        )
        .replace(
            r#"<biblioentry xml:id="dijkstra"><title>EWD</title></biblioentry>"#,
            "",
        );
    assert_eq!(expected, out);
}

#[test]
fn untouched_without_bibliography() {
    let doc = "<?xml version=\"1.0\"?>\n<article xmlns=\"http://docbook.org/ns/docbook\">\n  <para>&amp; no refs</para>\n</article>\n";
    let (out, removed) = strip_bibliography_str(doc).unwrap();
    assert_eq!(0, removed);
    assert_eq!(doc, out);
}

#[test]
fn nested_entries_are_not_direct_children() {
    let doc = concat!(
        r#"<book xmlns="http://docbook.org/ns/docbook"><bibliography>"#,
        r#"<bibliodiv><biblioentry/></bibliodiv>"#,
        r#"<biblioentry><biblioentry/></biblioentry>"#,
        r#"</bibliography></book>"#
    );
    let (out, removed) = strip_bibliography_str(doc).unwrap();
    assert_eq!(1, removed);
    assert_eq!(
        concat!(
            r#"<book xmlns="http://docbook.org/ns/docbook"><bibliography>"#,
            r#"<bibliodiv><biblioentry/></bibliodiv>"#,
            r#"</bibliography></book>"#
        ),
        out
    );
}

#[test]
fn rewrites_the_file_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.xml");
    fs::write(&path, common::BOOK).unwrap();

    let returned = strip_bibliography(&path).unwrap();
    assert_eq!(path, returned);
    let content = fs::read_to_string(&path).unwrap();
    assert!(!content.contains("biblioentry"));
    assert!(content.contains("<chapter>"));
}

#[test]
fn malformed_file_is_fatal_and_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xml");
    let broken = r#"<book xmlns="http://docbook.org/ns/docbook"><bibliography><biblioentry/></book>"#;
    fs::write(&path, broken).unwrap();

    let res = strip_bibliography(&path);
    assert!(matches!(res, Err(PreprocessError::Malformed(_))));
    assert_eq!(broken, fs::read_to_string(&path).unwrap());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let res = strip_bibliography(dir.path().join("nope.xml"));
    assert!(matches!(res, Err(PreprocessError::IOError(_))));
}

#[test]
fn second_root_is_fatal_and_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.xml");
    let doc = format!("{}<appendix/>\n", common::BOOK);
    fs::write(&path, &doc).unwrap();

    let res = strip_bibliography(&path);
    assert!(matches!(res, Err(PreprocessError::Malformed(_))));
    assert_eq!(doc, fs::read_to_string(&path).unwrap());
}

#[test]
fn latin1_bytes_are_an_encoding_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.xml");
    let mut doc = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<book xmlns=\"http://docbook.org/ns/docbook\"><title>Caf".to_vec();
    doc.push(0xe9);
    doc.extend_from_slice(b"</title></book>");
    fs::write(&path, &doc).unwrap();

    let res = strip_bibliography(&path);
    assert!(matches!(res, Err(PreprocessError::Encoding(_))));
    assert_eq!(doc, fs::read(&path).unwrap());
}

#[test]
fn declared_latin1_with_ascii_content_is_accepted() {
    let doc = concat!(
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n",
        r#"<book xmlns="http://docbook.org/ns/docbook"><bibliography>"#,
        r#"<biblioentry/></bibliography></book>"#
    );
    let (_, removed) = strip_bibliography_str(doc).unwrap();
    assert_eq!(1, removed);
}
