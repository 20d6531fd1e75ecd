use std::sync::Arc;

use super::{source::RandomAccessSource, FileError, FileErrorKind, HandleSlot};

/// Reference point of [`VirtualFile::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    Start,
    Current,
    /// Always rejected with [`FileError::UnsupportedSeek`]
    End,
}

/// Read-only handle with a cursor over a [`RandomAccessSource`].
///
/// Each call to [`VirtualFile::read`] or [`VirtualFile::read_exact`] issues exactly one range
/// request. Nothing is buffered between calls: reading the same bytes twice fetches them twice.
///
/// The error of the last failed operation stays available through [`VirtualFile::last_error`]
/// until [`VirtualFile::clear_error`]. A failed operation never moves the cursor.
#[derive(Debug)]
pub struct VirtualFile {
    source: Arc<dyn RandomAccessSource>,
    position: u64,
    last_error: FileErrorKind,
    eof: bool,
    _slot: HandleSlot,
}

impl VirtualFile {
    pub(crate) fn new(source: Arc<dyn RandomAccessSource>, slot: HandleSlot) -> Self {
        VirtualFile {
            source,
            position: 0,
            last_error: FileErrorKind::None,
            eof: false,
            _slot: slot,
        }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn size(&self) -> Option<u64> {
        self.source.size()
    }

    /// Current cursor position
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// True once a read came back shorter than requested
    pub fn eof(&self) -> bool {
        self.eof
    }

    pub fn last_error(&self) -> FileErrorKind {
        self.last_error
    }

    pub fn clear_error(&mut self) {
        self.last_error = FileErrorKind::None;
        self.eof = false;
    }

    fn record<T>(&mut self, result: Result<T, FileError>) -> Result<T, FileError> {
        if let Err(err) = &result {
            self.last_error = err.kind();
        }
        result
    }

    fn past_known_end(&self) -> bool {
        self.source.size().is_some_and(|size| self.position >= size)
    }

    /// Read up to `len` bytes at the cursor.
    ///
    /// Return
    /// ------
    /// * the bytes received; the cursor advances by their count. A short answer sets the
    ///   end-of-file flag and records [`FileErrorKind::ShortRead`] but is not an error.
    /// * an error from the source, cursor unchanged
    pub fn read(&mut self, len: usize) -> Result<Vec<u8>, FileError> {
        if len == 0 {
            return Ok(Vec::new());
        }
        if self.past_known_end() {
            self.eof = true;
            self.last_error = FileErrorKind::ShortRead;
            return Ok(Vec::new());
        }

        let fetched = self.source.read_at(self.position, len);
        let bytes = self.record(fetched)?;
        if bytes.len() < len {
            self.eof = true;
            self.last_error = FileErrorKind::ShortRead;
        }
        self.position += bytes.len() as u64;
        Ok(bytes)
    }

    /// Read exactly `len` bytes at the cursor.
    ///
    /// A short answer is [`FileError::ShortRead`] and leaves the cursor where it was.
    pub fn read_exact(&mut self, len: usize) -> Result<Vec<u8>, FileError> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let fetched = if self.past_known_end() {
            Ok(Vec::new())
        } else {
            self.source.read_at(self.position, len)
        };
        let bytes = self.record(fetched)?;

        if bytes.len() < len {
            self.eof = true;
            return self.record(Err(FileError::ShortRead {
                requested: len,
                received: bytes.len(),
            }));
        }
        self.position += len as u64;
        Ok(bytes)
    }

    /// Seek to `offset`, then [`VirtualFile::read_exact`].
    pub fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, FileError> {
        let previous = self.position;
        self.seek(offset as i64, SeekOrigin::Start)?;
        self.read_exact(len).inspect_err(|_| self.position = previous)
    }

    /// Move the cursor.
    ///
    /// Return
    /// ------
    /// * the new position
    /// * [`FileError::UnsupportedSeek`] for [`SeekOrigin::End`], [`FileError::Invalid`] for a
    ///   negative target or one beyond a known size
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64, FileError> {
        let target = match origin {
            SeekOrigin::Start => Some(offset as i128),
            SeekOrigin::Current => Some(self.position as i128 + offset as i128),
            SeekOrigin::End => None,
        };

        let result = match target {
            None => Err(FileError::UnsupportedSeek),
            Some(pos) if pos < 0 => Err(FileError::Invalid(format!(
                "seek to negative position {pos} in {}",
                self.name()
            ))),
            Some(pos) => match self.source.size() {
                Some(size) if pos as u64 > size => Err(FileError::Invalid(format!(
                    "seek to {pos} beyond the end of {} ({size} bytes)",
                    self.name()
                ))),
                _ => Ok(pos as u64),
            },
        };

        let position = self.record(result)?;
        self.position = position;
        self.eof = false;
        Ok(position)
    }

    /// New handle on the same resource, starting at the same position.
    ///
    /// Takes a slot from the pool: fails with [`FileError::TooManyOpenFiles`] when it is full.
    pub fn try_clone(&self) -> Result<VirtualFile, FileError> {
        Ok(VirtualFile {
            source: Arc::clone(&self.source),
            position: self.position,
            last_error: FileErrorKind::None,
            eof: self.eof,
            _slot: self._slot.try_clone()?,
        })
    }

    /// Release the handle and its pool slot.
    pub fn close(self) {}
}

#[cfg(test)]
mod virtual_file_test {
    use super::*;
    use crate::remote_file::{remote_file_test::MockTransport, VirtualFs};
    use std::io::Write;

    const URL: &str = "https://host/data.bin";

    fn content() -> Vec<u8> {
        (0..200u8).collect()
    }

    fn remote(mock: MockTransport) -> (Arc<MockTransport>, VirtualFile) {
        let mock = Arc::new(mock);
        let fs = VirtualFs::with_transport("https://host", mock.clone());
        let file = fs.open("data.bin").unwrap();
        (mock, file)
    }

    #[test]
    fn test_sequential_reads() {
        let (mock, mut file) = remote(MockTransport::serving(URL, content()));
        assert_eq!(file.name(), URL);
        assert_eq!(file.read(4).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(file.tell(), 4);
        assert_eq!(file.read_exact(3).unwrap(), vec![4, 5, 6]);
        assert_eq!(file.tell(), 7);

        // One GET per call, no caching
        file.seek(0, SeekOrigin::Start).unwrap();
        file.read(4).unwrap();
        assert_eq!(mock.get_count(), 3);
        assert_eq!(file.last_error(), FileErrorKind::None);
    }

    #[test]
    fn test_short_read() {
        let (_, mut file) = remote(MockTransport::serving(URL, content()));
        file.seek(195, SeekOrigin::Start).unwrap();

        let bytes = file.read(10).unwrap();
        assert_eq!(bytes, vec![195, 196, 197, 198, 199]);
        assert_eq!(file.tell(), 200);
        assert!(file.eof());
        assert_eq!(file.last_error(), FileErrorKind::ShortRead);

        // At the end nothing is requested any more
        assert!(file.read(10).unwrap().is_empty());

        file.clear_error();
        assert!(!file.eof());
        assert_eq!(file.last_error(), FileErrorKind::None);
    }

    #[test]
    fn test_read_exact_short_keeps_cursor() {
        let (_, mut file) = remote(MockTransport::serving(URL, content()));
        file.seek(190, SeekOrigin::Start).unwrap();
        let err = file.read_exact(20).unwrap_err();
        assert_eq!(
            err,
            FileError::ShortRead {
                requested: 20,
                received: 10
            }
        );
        assert_eq!(file.tell(), 190);
        assert_eq!(file.last_error(), FileErrorKind::ShortRead);
    }

    #[test]
    fn test_read_exact_at() {
        let (_, mut file) = remote(MockTransport::serving(URL, content()));
        file.seek(10, SeekOrigin::Start).unwrap();
        assert!(file.read_exact_at(199, 2).is_err());
        assert_eq!(file.tell(), 10);
        assert_eq!(file.read_exact_at(100, 2).unwrap(), vec![100, 101]);
        assert_eq!(file.tell(), 102);
    }

    #[test]
    fn test_seek_rules() {
        let (_, mut file) = remote(MockTransport::serving(URL, content()));
        assert_eq!(file.seek(50, SeekOrigin::Start).unwrap(), 50);
        assert_eq!(file.seek(-20, SeekOrigin::Current).unwrap(), 30);
        assert_eq!(file.seek(200, SeekOrigin::Start).unwrap(), 200);

        assert_eq!(file.seek(0, SeekOrigin::End).unwrap_err(), FileError::UnsupportedSeek);
        assert_eq!(file.last_error(), FileErrorKind::Unsupported);
        assert_eq!(file.tell(), 200);

        file.clear_error();
        assert!(file.seek(-1, SeekOrigin::Start).is_err());
        assert_eq!(file.last_error(), FileErrorKind::Invalid);
        assert!(file.seek(201, SeekOrigin::Start).is_err());
        assert!(file.seek(-201, SeekOrigin::Current).is_err());
        assert_eq!(file.tell(), 200);
    }

    #[test]
    fn test_seek_unknown_size() {
        let mut mock = MockTransport::serving(URL, content());
        mock.advertise_length = false;
        let (_, mut file) = remote(mock);
        assert_eq!(file.size(), None);
        assert_eq!(file.seek(10_000, SeekOrigin::Start).unwrap(), 10_000);

        // The server answers 416 past the end
        let err = file.read(4).unwrap_err();
        assert_eq!(err.kind(), FileErrorKind::Network);
        assert_eq!(file.tell(), 10_000);
    }

    #[test]
    fn test_failed_get_keeps_cursor() {
        let mut mock = MockTransport::serving(URL, content());
        mock.forced_get_status = Some(500);
        let (_, mut file) = remote(mock);
        file.seek(8, SeekOrigin::Start).unwrap();
        assert!(file.read(4).is_err());
        assert_eq!(file.tell(), 8);
        assert_eq!(file.last_error(), FileErrorKind::Network);
    }

    #[test]
    fn test_clone_has_own_cursor() {
        let (_, mut file) = remote(MockTransport::serving(URL, content()));
        file.seek(20, SeekOrigin::Start).unwrap();
        let mut other = file.try_clone().unwrap();
        assert_eq!(other.tell(), 20);

        other.read(5).unwrap();
        assert_eq!(other.tell(), 25);
        assert_eq!(file.tell(), 20);
        assert_eq!(file.read(1).unwrap(), vec![20]);
    }

    #[test]
    fn test_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.bin");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&content())
            .unwrap();

        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let fs = VirtualFs::local(&root);
        let mut file = fs.open("local.bin").unwrap();
        assert_eq!(file.size(), Some(200));
        file.seek(100, SeekOrigin::Start).unwrap();
        assert_eq!(file.read_exact(3).unwrap(), vec![100, 101, 102]);

        assert_eq!(
            fs.open("absent.bin").unwrap_err().kind(),
            FileErrorKind::NotFound
        );
    }
}
