use docbook2epub::{
    config::Config,
    executor::SingleSlot,
    pipeline::Pipeline,
    status::{ChannelReporter, Status},
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, warn};
use std::{path::PathBuf, process::exit, sync::mpsc};

/// Convert a DocBook XML document into an EPUB archive.
///
/// The archive is written next to the source, named after the output
/// directory the stylesheet works in (`output.epub` by default).
#[derive(Debug, Clone, Parser)]
#[command(about, long_about, version)]
struct Cli {
    /// DocBook document to convert, usually Main.xml.
    #[arg(value_name = "source")]
    pub source: PathBuf,

    /// TOML file with conversion settings.
    #[arg(short, long, value_name = "file")]
    pub config: Option<PathBuf>,

    /// DocBook XSL epub/docbook.xsl stylesheet.
    #[arg(long, value_name = "path")]
    pub xsl: Option<PathBuf>,

    /// The xsltproc executable.
    #[arg(long, value_name = "path")]
    pub xsltproc: Option<PathBuf>,

    /// Stylesheet linked from the generated pages.
    #[arg(long, value_name = "href")]
    pub stylesheet_href: Option<String>,

    /// Stylesheet copied in when the source has none.
    #[arg(long, value_name = "path")]
    pub default_stylesheet: Option<PathBuf>,

    /// Directory the stylesheet writes into, next to the source.
    #[arg(long, value_name = "name")]
    pub output_dir_name: Option<String>,

    /// Extra stylesheet parameter.
    #[arg(short, long = "param", value_name = "name=value", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Show every copied resource and archived file.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_toml_file(path)
                .with_context(|| format!("cannot load config '{}'", path.display()))?,
            None => Config::default(),
        };

        if let Some(xsl) = &self.xsl {
            config.docbook_xsl.clone_from(xsl);
        }
        if let Some(xsltproc) = &self.xsltproc {
            config.xsltproc.clone_from(xsltproc);
        }
        if let Some(href) = &self.stylesheet_href {
            config.stylesheet_href.clone_from(href);
        }
        if let Some(css) = &self.default_stylesheet {
            config.default_stylesheet.clone_from(css);
        }
        if let Some(name) = &self.output_dir_name {
            config.output_dir_name.clone_from(name);
        }
        config.params.extend(self.params.iter().cloned());
        config.validate()?;

        Ok(config)
    }

    fn run(self) -> Result<()> {
        let pipeline = Pipeline::with_xsltproc(self.config()?);
        let (tx, rx) = mpsc::channel();
        let reporter = ChannelReporter::new(tx);
        let source = self.source;

        let slot = SingleSlot::new();
        let job = slot.submit(move || pipeline.run(&source, &reporter))?;

        for status in rx {
            match status {
                Status::Info(line) => println!("{line}"),
                Status::Warning(line) => println!("warning: {line}"),
            }
        }

        let outcome = job.join()?.context("conversion failed")?;
        if !outcome.moved {
            warn!("archive left at '{}'", outcome.archive.display());
        }
        Ok(())
    }
}

fn parse_param(s: &str) -> Result<(String, String)> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got '{s}'"))?;
    if name.is_empty() {
        return Err(anyhow!("empty parameter name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(error) = cli.run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}
