use std::{
    fmt,
    fs::File,
    io::{Read, Seek, SeekFrom},
};

use camino::Utf8PathBuf;

use super::FileError;

/// A read-only resource addressable by byte ranges.
///
/// Implementations must be shareable between threads: handles cloned with
/// [`super::VirtualFile::try_clone`] keep their own cursor but read through the same source.
pub trait RandomAccessSource: Send + Sync + fmt::Debug {
    /// Path or URL of the resource
    fn name(&self) -> &str;

    /// Total size in bytes when the backend knows it
    fn size(&self) -> Option<u64>;

    /// Read up to `len` bytes starting at `offset`.
    ///
    /// Fewer bytes than requested are returned when the resource ends before `offset + len`;
    /// the caller decides how to report the short read.
    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>, FileError>;
}

/// A file on the local file system.
///
/// The file is reopened for each read, so concurrent handles never share an OS cursor.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    path: Utf8PathBuf,
    size: u64,
}

impl LocalFileSource {
    /// Probe a local file.
    ///
    /// Return
    /// ------
    /// * the source, [`FileError::NotFound`] when nothing exists at `path`, or
    ///   [`FileError::Invalid`] when it is not a regular file
    pub fn open(path: Utf8PathBuf) -> Result<Self, FileError> {
        let metadata = std::fs::metadata(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound(path.to_string()),
            _ => FileError::from(err),
        })?;
        if !metadata.is_file() {
            return Err(FileError::Invalid(format!("{path} is not a regular file")));
        }
        Ok(LocalFileSource {
            path,
            size: metadata.len(),
        })
    }
}

impl RandomAccessSource for LocalFileSource {
    fn name(&self) -> &str {
        self.path.as_str()
    }

    fn size(&self) -> Option<u64> {
        Some(self.size)
    }

    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>, FileError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}
