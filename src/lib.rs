#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::let_underscore_drop,

    // for MSRV
    clippy::uninlined_format_args,
    clippy::missing_const_for_fn,
)]

//! DocBook to EPUB converter
//! lib to turn a DocBook XML document into an EPUB archive
//!
//! The markup is transformed by the DocBook XSL stylesheets; this crate
//! cleans the source, drives the stylesheet, completes the generated tree
//! with the resources it references and packs it into an EPUB container.
//!
//! # Examples
//!
//! ## Converting
//!
//! ```no_run
//! use docbook2epub::config::Config;
//! use docbook2epub::pipeline::Pipeline;
//! use docbook2epub::status::LogReporter;
//! use std::path::Path;
//!
//! let pipeline = Pipeline::with_xsltproc(Config::default());
//! let outcome = pipeline.run(Path::new("book/main.xml"), &LogReporter);
//! assert!(outcome.is_ok());
//! // book/output.epub
//! ```
//!
//! ## Converting in the background
//!
//! Only one conversion runs at a time, a second one is refused until the
//! first is done.
//!
//! ```no_run
//! use docbook2epub::config::Config;
//! use docbook2epub::executor::SingleSlot;
//! use docbook2epub::pipeline::Pipeline;
//! use docbook2epub::status::{ChannelReporter, Status};
//! use std::path::PathBuf;
//! use std::sync::mpsc;
//!
//! let (tx, rx) = mpsc::channel();
//! let slot = SingleSlot::new();
//! let pipeline = Pipeline::with_xsltproc(Config::default());
//! let reporter = ChannelReporter::new(tx);
//! let job = slot
//!     .submit(move || pipeline.run(&PathBuf::from("main.xml"), &reporter))
//!     .unwrap();
//!
//! for status in rx {
//!     println!("{}", status.message());
//! }
//! let outcome = job.join().unwrap();
//! ```
//!
//! ## Checking an archive
//!
//! ```no_run
//! use docbook2epub::archive::EpubArchive;
//!
//! let mut epub = EpubArchive::new("output.epub").unwrap();
//! assert!(epub.check_container().is_ok());
//! assert_eq!("mimetype", epub.files[0]);
//! ```

mod xmlutils;

pub mod archive;
pub mod config;
pub mod executor;
pub mod manifest;
pub mod pipeline;
pub mod preprocess;
pub mod resources;
pub mod status;
pub mod transform;
