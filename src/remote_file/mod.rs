//! # Random-access file layer
//!
//! Emulates a read-only binary file on top of an immutable resource that can only be read by
//! byte ranges. A [`VirtualFs`] resolves names against either a local directory or an HTTP base
//! URL and hands out [`VirtualFile`] handles with a cursor, `seek`/`tell`, and `read` calls that
//! each turn into exactly one synchronous range request.
//!
//! ## Backends
//!
//! | Backend | Source | Existence probe | Read |
//! |---|---|---|---|
//! | local | [`LocalFileSource`] | file metadata | positional read |
//! | http | [`HttpRangeSource`] | `HEAD` (2xx / 404) | `GET` with `Range: bytes=a-b`, `206` only |
//!
//! The HTTP source talks through the [`RangeTransport`] trait. [`UreqTransport`] is the
//! production implementation; tests plug an in-memory transport to exercise status handling.
//!
//! ## Handle pool
//!
//! A [`VirtualFs`] allows at most [`MAX_OPEN_FILES`] simultaneous handles (configurable with
//! [`VirtualFs::with_max_handles`]). The existence probe runs before a slot is taken, so a missing
//! file never consumes one. Handles give their slot back when closed or dropped.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ephemera::remote_file::{SeekOrigin, VirtualFs};
//!
//! let fs = VirtualFs::http("https://example.org/ephemerides", None);
//! let mut file = fs.open("linux_p1550p2650.440").unwrap();
//! file.seek(2652, SeekOrigin::Start).unwrap();
//! let bytes = file.read_exact(24).unwrap();
//! assert_eq!(file.tell(), 2676);
//! # let _ = bytes;
//! ```
pub mod http_source;
pub mod source;
pub mod virtual_file;

use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

pub use http_source::{HttpRangeSource, RangeTransport, TransportResponse, UreqTransport};
pub use source::{LocalFileSource, RandomAccessSource};
pub use virtual_file::{SeekOrigin, VirtualFile};

/// Default bound on simultaneously open handles per [`VirtualFs`].
pub const MAX_OPEN_FILES: usize = 16;

/// Default global timeout of a single range request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Error code recorded on a handle after a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileErrorKind {
    #[default]
    None,
    NotFound,
    Network,
    Timeout,
    Invalid,
    ShortRead,
    Unsupported,
}

impl fmt::Display for FileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            FileErrorKind::None => "No error",
            FileErrorKind::NotFound => "File not found",
            FileErrorKind::Network => "Network error",
            FileErrorKind::Timeout => "Operation timed out",
            FileErrorKind::Invalid => "Invalid operation",
            FileErrorKind::ShortRead => "Short read",
            FileErrorKind::Unsupported => "Unsupported operation",
        };
        f.write_str(message)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Invalid operation: {0}")]
    Invalid(String),

    #[error("Short read: requested {requested} bytes, received {received}")]
    ShortRead { requested: usize, received: usize },

    #[error("Seeking relative to the end of a remote file is not supported")]
    UnsupportedSeek,

    #[error("Too many open files (limit: {0})")]
    TooManyOpenFiles(usize),
}

impl FileError {
    pub fn kind(&self) -> FileErrorKind {
        match self {
            FileError::NotFound(_) => FileErrorKind::NotFound,
            FileError::Network(_) => FileErrorKind::Network,
            FileError::Timeout(_) => FileErrorKind::Timeout,
            FileError::Invalid(_) | FileError::TooManyOpenFiles(_) => FileErrorKind::Invalid,
            FileError::ShortRead { .. } => FileErrorKind::ShortRead,
            FileError::UnsupportedSeek => FileErrorKind::Unsupported,
        }
    }
}

impl From<ureq::Error> for FileError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => FileError::Timeout(err.to_string()),
            ureq::Error::Io(ref io) if io.kind() == std::io::ErrorKind::TimedOut => {
                FileError::Timeout(err.to_string())
            }
            other => FileError::Network(other.to_string()),
        }
    }
}

impl From<std::io::Error> for FileError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound(err.to_string()),
            std::io::ErrorKind::TimedOut => FileError::Timeout(err.to_string()),
            _ => FileError::Invalid(err.to_string()),
        }
    }
}

/// A slot of the handle pool, released on drop.
#[derive(Debug)]
pub(crate) struct HandleSlot {
    counter: Arc<AtomicUsize>,
    max: usize,
}

impl HandleSlot {
    fn acquire(counter: &Arc<AtomicUsize>, max: usize) -> Result<Self, FileError> {
        counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |open| {
                (open < max).then_some(open + 1)
            })
            .map_err(|_| FileError::TooManyOpenFiles(max))?;
        Ok(HandleSlot {
            counter: Arc::clone(counter),
            max,
        })
    }

    pub(crate) fn try_clone(&self) -> Result<Self, FileError> {
        HandleSlot::acquire(&self.counter, self.max)
    }
}

impl Drop for HandleSlot {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Clone)]
enum Backend {
    Local {
        root: Utf8PathBuf,
    },
    Http {
        base_url: String,
        transport: Arc<dyn RangeTransport>,
    },
}

/// Factory and pool of [`VirtualFile`] handles.
///
/// Cloning a `VirtualFs` shares the pool: clones count against the same limit.
#[derive(Debug, Clone)]
pub struct VirtualFs {
    backend: Backend,
    open_handles: Arc<AtomicUsize>,
    max_handles: usize,
}

impl VirtualFs {
    /// Files resolved relative to a local directory. Absolute names are used as they are.
    pub fn local(root: impl AsRef<Utf8Path>) -> Self {
        Self::with_backend(Backend::Local {
            root: root.as_ref().to_path_buf(),
        })
    }

    /// Files resolved relative to an HTTP(S) base URL, fetched with a blocking `ureq` agent.
    ///
    /// Arguments
    /// ---------
    /// * `base_url`: prefix joined with the names given to [`VirtualFs::open`]; a name that is
    ///   itself a full URL bypasses it
    /// * `timeout`: global timeout of each request, [`DEFAULT_TIMEOUT`] when `None`
    pub fn http(base_url: &str, timeout: Option<Duration>) -> Self {
        let transport = UreqTransport::new(Some(timeout.unwrap_or(DEFAULT_TIMEOUT)));
        Self::with_transport(base_url, Arc::new(transport))
    }

    /// Same as [`VirtualFs::http`] with a caller-provided transport.
    pub fn with_transport(base_url: &str, transport: Arc<dyn RangeTransport>) -> Self {
        Self::with_backend(Backend::Http {
            base_url: base_url.to_string(),
            transport,
        })
    }

    /// Pick the backend from a location: `http://` and `https://` prefixes select the HTTP
    /// backend, anything else is a local path.
    ///
    /// Return
    /// ------
    /// * the file system and the name to give to [`VirtualFs::open`]
    pub fn for_location(location: &str, timeout: Option<Duration>) -> (Self, String) {
        if is_url(location) {
            (VirtualFs::http("", timeout), location.to_string())
        } else {
            (VirtualFs::local("."), location.to_string())
        }
    }

    fn with_backend(backend: Backend) -> Self {
        VirtualFs {
            backend,
            open_handles: Arc::new(AtomicUsize::new(0)),
            max_handles: MAX_OPEN_FILES,
        }
    }

    pub fn with_max_handles(mut self, max_handles: usize) -> Self {
        self.max_handles = max_handles;
        self
    }

    /// Number of handles currently open on this pool.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::Acquire)
    }

    /// Open `name` for reading.
    ///
    /// The existence probe runs first: a missing file returns [`FileError::NotFound`] without
    /// taking a pool slot. A full pool returns [`FileError::TooManyOpenFiles`].
    pub fn open(&self, name: &str) -> Result<VirtualFile, FileError> {
        let source: Arc<dyn RandomAccessSource> = match &self.backend {
            Backend::Local { root } => Arc::new(LocalFileSource::open(root.join(name))?),
            Backend::Http {
                base_url,
                transport,
            } => {
                let url = join_url(base_url, name);
                Arc::new(HttpRangeSource::open(url, Arc::clone(transport))?)
            }
        };

        let slot = HandleSlot::acquire(&self.open_handles, self.max_handles)?;
        log::debug!("opened {} ({:?} bytes)", source.name(), source.size());
        Ok(VirtualFile::new(source, slot))
    }
}

fn is_url(name: &str) -> bool {
    name.starts_with("http://") || name.starts_with("https://")
}

fn join_url(base_url: &str, name: &str) -> String {
    if is_url(name) || base_url.is_empty() {
        name.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            name.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
pub(crate) mod remote_file_test {
    use super::*;
    use std::{collections::HashMap, sync::Mutex};

    /// In-memory HTTP server answering HEAD and ranged GET requests.
    #[derive(Debug, Default)]
    pub(crate) struct MockTransport {
        pub files: HashMap<String, Vec<u8>>,
        /// Status forced on every GET when set
        pub forced_get_status: Option<u16>,
        pub advertise_length: bool,
        pub requests: Mutex<Vec<String>>,
    }

    impl MockTransport {
        pub(crate) fn serving(url: &str, content: Vec<u8>) -> Self {
            MockTransport {
                files: HashMap::from([(url.to_string(), content)]),
                advertise_length: true,
                ..Default::default()
            }
        }

        pub(crate) fn get_count(&self) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.starts_with("GET"))
                .count()
        }
    }

    impl RangeTransport for MockTransport {
        fn head(&self, url: &str) -> Result<TransportResponse, FileError> {
            self.requests.lock().unwrap().push(format!("HEAD {url}"));
            Ok(match self.files.get(url) {
                Some(content) => TransportResponse {
                    status: 200,
                    content_length: self.advertise_length.then_some(content.len() as u64),
                    body: Vec::new(),
                },
                None => TransportResponse {
                    status: 404,
                    content_length: None,
                    body: Vec::new(),
                },
            })
        }

        fn get_range(
            &self,
            url: &str,
            first: u64,
            last: u64,
        ) -> Result<TransportResponse, FileError> {
            self.requests
                .lock()
                .unwrap()
                .push(format!("GET {url} bytes={first}-{last}"));
            if let Some(status) = self.forced_get_status {
                return Ok(TransportResponse {
                    status,
                    content_length: None,
                    body: Vec::new(),
                });
            }
            let content = self.files.get(url).ok_or_else(|| FileError::NotFound(url.into()))?;
            let start = (first as usize).min(content.len());
            let end = (last as usize + 1).min(content.len());
            Ok(TransportResponse {
                status: if start < content.len() { 206 } else { 416 },
                content_length: Some((end - start) as u64),
                body: content[start..end].to_vec(),
            })
        }
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(FileError::NotFound("x".into()).kind(), FileErrorKind::NotFound);
        assert_eq!(FileError::UnsupportedSeek.kind(), FileErrorKind::Unsupported);
        assert_eq!(
            FileError::ShortRead {
                requested: 4,
                received: 2
            }
            .kind(),
            FileErrorKind::ShortRead
        );
        assert_eq!(FileErrorKind::default(), FileErrorKind::None);
        assert_eq!(FileErrorKind::Timeout.to_string(), "Operation timed out");

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(FileError::from(io).kind(), FileErrorKind::NotFound);
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://a.org/eph/", "/de.440"), "https://a.org/eph/de.440");
        assert_eq!(join_url("https://a.org/eph", "de.440"), "https://a.org/eph/de.440");
        assert_eq!(join_url("https://a.org", "http://b.org/x"), "http://b.org/x");
        assert_eq!(join_url("", "http://b.org/x"), "http://b.org/x");
    }

    #[test]
    fn test_open_not_found_takes_no_slot() {
        let transport = MockTransport::serving("https://host/de.bin", vec![0u8; 64]);
        let fs = VirtualFs::with_transport("https://host", Arc::new(transport));

        let err = fs.open("missing.bin").unwrap_err();
        assert_eq!(err, FileError::NotFound("https://host/missing.bin".into()));
        assert_eq!(fs.open_handles(), 0);

        let file = fs.open("de.bin").unwrap();
        assert_eq!(fs.open_handles(), 1);
        assert_eq!(file.size(), Some(64));
        file.close();
        assert_eq!(fs.open_handles(), 0);
    }

    #[test]
    fn test_handle_pool_limit() {
        let transport = MockTransport::serving("https://host/de.bin", vec![1u8; 8]);
        let fs = VirtualFs::with_transport("https://host", Arc::new(transport)).with_max_handles(2);

        let a = fs.open("de.bin").unwrap();
        let b = a.try_clone().unwrap();
        assert_eq!(fs.open_handles(), 2);
        assert_eq!(fs.open("de.bin").unwrap_err(), FileError::TooManyOpenFiles(2));
        assert!(b.try_clone().is_err());

        drop(a);
        assert_eq!(fs.open_handles(), 1);
        let c = fs.open("de.bin").unwrap();
        assert_eq!(fs.open_handles(), 2);
        drop((b, c));
        assert_eq!(fs.open_handles(), 0);
    }

    #[test]
    fn test_head_other_status_is_network_error() {
        #[derive(Debug)]
        struct Forbidden;
        impl RangeTransport for Forbidden {
            fn head(&self, _url: &str) -> Result<TransportResponse, FileError> {
                Ok(TransportResponse {
                    status: 403,
                    content_length: None,
                    body: Vec::new(),
                })
            }
            fn get_range(&self, _: &str, _: u64, _: u64) -> Result<TransportResponse, FileError> {
                Err(FileError::Timeout("never".into()))
            }
        }

        let fs = VirtualFs::with_transport("https://host", Arc::new(Forbidden));
        let err = fs.open("de.bin").unwrap_err();
        assert_eq!(err.kind(), FileErrorKind::Network);
        assert_eq!(fs.open_handles(), 0);
    }
}
