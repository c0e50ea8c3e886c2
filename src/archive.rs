//! Manages the zip component part of the epub.
//!
//! Packs an output tree into an EPUB container and reads finished
//! containers back to check them.

use std::fs;
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the first entry of every EPUB.
pub const MIMETYPE: &str = "mimetype";
/// Content of the [`MIMETYPE`] entry.
pub const MIMETYPE_CONTENT: &str = "application/epub+zip";

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("I/O Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Zip Error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Walk Error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid UTF-8 in entry: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Invalid container: {0}")]
    InvalidContainer(String),
    #[error("Could not move '{}' to '{}': {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// Writes the [`MIMETYPE`] file at the top of `dir`.
///
/// # Errors
///
/// Returns an error if the file can't be written.
pub fn write_mimetype<P: AsRef<Path>>(dir: P) -> Result<PathBuf, ArchiveError> {
    let path = dir.as_ref().join(MIMETYPE);
    fs::write(&path, MIMETYPE_CONTENT)?;
    Ok(path)
}

/// Zips the tree under `dir` into `dir/<dir name>.epub`.
///
/// The [`MIMETYPE`] entry comes first and is stored. The rest of the tree
/// follows in file name order, deflated. `.epub` files, the `exclude`d
/// file and any other file with the same name are left out.
///
/// # Errors
///
/// Returns an error if the tree can't be walked or the archive written.
pub fn create_archive<P: AsRef<Path>>(dir: P, exclude: &Path) -> Result<PathBuf, ArchiveError> {
    let dir = dir.as_ref();
    let name = dir
        .file_name()
        .ok_or_else(|| ArchiveError::InvalidContainer(format!("no name for {}", dir.display())))?;
    let epub = dir.join(format!("{}.epub", name.to_string_lossy()));
    let excluded_name = exclude.file_name();
    let exclude = fs::canonicalize(exclude).unwrap_or_else(|_| exclude.to_path_buf());

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut zip = ZipWriter::new(File::create(&epub)?);
    zip.start_file(MIMETYPE, stored)?;
    zip.write_all(MIMETYPE_CONTENT.as_bytes())?;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(dir) else {
            continue;
        };
        if rel == Path::new(MIMETYPE)
            || is_epub(path)
            || path.file_name() == excluded_name
            || same_file(path, &exclude)
        {
            continue;
        }

        let name = entry_name(rel);
        log::debug!("Writing file '{}'", name);
        zip.start_file(name, deflated)?;
        let mut f = File::open(path)?;
        std::io::copy(&mut f, &mut zip)?;
    }

    zip.finish()?;
    Ok(epub)
}

/// Moves `built` into `dest_dir`, replacing a file of the same name.
///
/// # Errors
///
/// Returns [`ArchiveError::Move`] if the archive can't be put in place.
pub fn move_archive(built: &Path, dest_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let name = built
        .file_name()
        .ok_or_else(|| ArchiveError::InvalidContainer(format!("no name for {}", built.display())))?;
    let to = dest_dir.join(name);
    let move_err = |source| ArchiveError::Move {
        from: built.to_path_buf(),
        to: to.clone(),
        source,
    };

    if to.exists() {
        fs::remove_file(&to).map_err(move_err)?;
    }
    if fs::rename(built, &to).is_err() {
        // rename can't cross filesystems
        fs::copy(built, &to).map_err(move_err)?;
        fs::remove_file(built).map_err(move_err)?;
    }

    Ok(to)
}

fn is_epub(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"))
}

fn same_file(path: &Path, canonical: &Path) -> bool {
    fs::canonicalize(path).is_ok_and(|p| p == canonical)
}

// zip entries always use forward slashes
fn entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Epub archive struct. Here it's stored the file path and the list of
/// files in the zip archive.
#[derive(Clone, Debug)]
pub struct EpubArchive<R: Read + Seek> {
    zip: ZipArchive<R>,
    pub path: PathBuf,
    pub files: Vec<String>,
}

impl EpubArchive<BufReader<File>> {
    /// Opens the epub file in `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the zip is broken or if the file doesn't
    /// exists.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = Self::from_reader(BufReader::new(file))?;
        archive.path = path.to_path_buf();
        Ok(archive)
    }
}

impl<R: Read + Seek> EpubArchive<R> {
    /// Opens the epub contained in `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if the zip is broken.
    pub fn from_reader(reader: R) -> Result<Self, ArchiveError> {
        let mut zip = ZipArchive::new(reader)?;
        let mut files = vec![];

        for i in 0..zip.len() {
            let file = zip.by_index(i)?;
            files.push(String::from(file.name()));
        }

        Ok(Self {
            zip,
            path: PathBuf::new(),
            files,
        })
    }

    /// Returns the content of the file by the `name` as `Vec<u8>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name doesn't exists in the zip archive.
    pub fn get_entry(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let mut entry: Vec<u8> = vec![];
        self.zip.by_name(name)?.read_to_end(&mut entry)?;
        Ok(entry)
    }

    /// Returns the content of the file by the `name` as `String`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name doesn't exists in the zip archive or
    /// isn't UTF-8.
    pub fn get_entry_as_str(&mut self, name: &str) -> Result<String, ArchiveError> {
        let content = self.get_entry(name)?;
        Ok(String::from_utf8(content)?)
    }

    /// Compression used for the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if there's no such entry.
    pub fn compression(&mut self, index: usize) -> Result<CompressionMethod, ArchiveError> {
        Ok(self.zip.by_index(index)?.compression())
    }

    /// Checks the container rules readers rely on: the first entry is
    /// [`MIMETYPE`], stored, holding exactly [`MIMETYPE_CONTENT`].
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidContainer`] describing the first
    /// violation found.
    pub fn check_container(&mut self) -> Result<(), ArchiveError> {
        let invalid = |m: &str| Err(ArchiveError::InvalidContainer(m.to_string()));

        match self.files.first() {
            Some(first) if first == MIMETYPE => {}
            Some(_) => return invalid("mimetype is not the first entry"),
            None => return invalid("empty archive"),
        }
        if self.compression(0)? != CompressionMethod::Stored {
            return invalid("mimetype is compressed");
        }
        if self.get_entry(MIMETYPE)? != MIMETYPE_CONTENT.as_bytes() {
            return invalid("unexpected mimetype content");
        }
        Ok(())
    }
}
