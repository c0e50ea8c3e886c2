use docbook2epub::config::{Config, ConfigError, DEFAULT_STYLESHEET_HREF, HTML_STYLESHEET_PARAM};
use docbook2epub::transform::AccessControl;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

#[test]
fn defaults() {
    let config = Config::default();
    assert_eq!(DEFAULT_STYLESHEET_HREF, config.stylesheet_href);
    assert_eq!("output", config.output_dir_name);
    assert_eq!(PathBuf::from("xsltproc"), config.xsltproc);
    assert!(config
        .docbook_xsl
        .ends_with("docbook-xsl-1.79.1/epub/docbook.xsl"));
    assert!(config.default_stylesheet.ends_with("css/stylesheets.css"));
    assert_eq!(AccessControl::default(), config.access);
    assert!(!config.access.write_network);
}

#[test]
fn toml_overrides_only_given_keys() {
    let config = Config::from_toml_str(
        r#"
        stylesheet_href = "css/book.css"
        output_dir_name = "epub"

        [params]
        "chunk.section.depth" = "0"

        [access]
        read_network = false
        "#,
    )
    .unwrap();

    assert_eq!("css/book.css", config.stylesheet_href);
    assert_eq!("epub", config.output_dir_name);
    assert_eq!(Some(&"0".to_string()), config.params.get("chunk.section.depth"));
    assert!(!config.access.read_network);
    assert!(config.access.write_file);
    assert_eq!(Config::default().docbook_xsl, config.docbook_xsl);
}

#[test]
fn stylesheet_param_follows_href() {
    let mut config = Config::default();
    config
        .params
        .insert(HTML_STYLESHEET_PARAM.to_string(), "ignored.css".to_string());
    config.params.insert("a".to_string(), "1".to_string());
    config.stylesheet_href = "css/book.css".to_string();

    assert_eq!(
        vec![
            ("a".to_string(), "1".to_string()),
            (HTML_STYLESHEET_PARAM.to_string(), "css/book.css".to_string()),
        ],
        config.stylesheet_params()
    );
}

#[test]
fn output_dir_name_must_be_plain() {
    for name in ["", "..", "a/b", "a\\b"] {
        let toml = format!("output_dir_name = {:?}", name);
        assert!(matches!(
            Config::from_toml_str(&toml),
            Err(ConfigError::OutputDirName(_))
        ));
    }
}

#[test]
fn config_file_paths_are_relative_to_the_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("docbook2epub.toml");
    std::fs::write(&path, "docbook_xsl = \"xsl/epub/docbook.xsl\"\n").unwrap();

    let config = Config::from_toml_file(&path).unwrap();
    assert_eq!(tmp.path().join("xsl/epub/docbook.xsl"), config.docbook_xsl);
}

#[test]
fn unknown_types_are_rejected() {
    assert!(matches!(
        Config::from_toml_str("output_dir_name = 3"),
        Err(ConfigError::Toml(_))
    ));
}
