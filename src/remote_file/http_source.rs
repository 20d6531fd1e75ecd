use std::{fmt, sync::Arc, time::Duration};

use ureq::Agent;

use super::{source::RandomAccessSource, FileError};

/// Status, advertised length and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Vec<u8>,
}

/// Blocking HTTP exchanges needed by [`HttpRangeSource`].
///
/// Transport failures (DNS, connection, timeout) are errors; any HTTP status, including 4xx and
/// 5xx, is a successful exchange that the source interprets.
pub trait RangeTransport: Send + Sync + fmt::Debug {
    fn head(&self, url: &str) -> Result<TransportResponse, FileError>;

    /// `GET url` with `Range: bytes={first}-{last}` (inclusive bounds)
    fn get_range(&self, url: &str, first: u64, last: u64) -> Result<TransportResponse, FileError>;
}

/// [`RangeTransport`] over a shared `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build();
        UreqTransport {
            agent: config.into(),
        }
    }
}

fn content_length<B>(response: &ureq::http::Response<B>) -> Option<u64> {
    response
        .headers()
        .get("content-length")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

impl RangeTransport for UreqTransport {
    fn head(&self, url: &str) -> Result<TransportResponse, FileError> {
        let response = self.agent.head(url).call()?;
        Ok(TransportResponse {
            status: response.status().as_u16(),
            content_length: content_length(&response),
            body: Vec::new(),
        })
    }

    fn get_range(&self, url: &str, first: u64, last: u64) -> Result<TransportResponse, FileError> {
        let mut response = self
            .agent
            .get(url)
            .header("Range", format!("bytes={first}-{last}"))
            .call()?;

        let status = response.status().as_u16();
        let content_length = content_length(&response);
        let body = if status == 206 {
            response.body_mut().read_to_vec()?
        } else {
            Vec::new()
        };

        Ok(TransportResponse {
            status,
            content_length,
            body,
        })
    }
}

/// A remote resource read with HTTP range requests.
#[derive(Debug, Clone)]
pub struct HttpRangeSource {
    url: String,
    size: Option<u64>,
    transport: Arc<dyn RangeTransport>,
}

impl HttpRangeSource {
    /// Probe `url` with a `HEAD` request.
    ///
    /// Return
    /// ------
    /// * the source when the status is 2xx (size from `Content-Length` when present)
    /// * [`FileError::NotFound`] on 404, [`FileError::Network`] on any other status
    pub fn open(url: String, transport: Arc<dyn RangeTransport>) -> Result<Self, FileError> {
        let response = transport.head(&url)?;
        match response.status {
            200..=299 => Ok(HttpRangeSource {
                url,
                size: response.content_length,
                transport,
            }),
            404 => Err(FileError::NotFound(url)),
            status => Err(FileError::Network(format!(
                "HEAD {url} answered with status {status}"
            ))),
        }
    }
}

impl RandomAccessSource for HttpRangeSource {
    fn name(&self) -> &str {
        &self.url
    }

    fn size(&self) -> Option<u64> {
        self.size
    }

    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>, FileError> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let last = offset + len as u64 - 1;
        let response = self.transport.get_range(&self.url, offset, last)?;

        if response.status != 206 {
            return Err(FileError::Network(format!(
                "GET {} bytes={offset}-{last} answered with status {} instead of 206",
                self.url, response.status
            )));
        }
        if response.body.len() > len {
            return Err(FileError::Invalid(format!(
                "GET {} bytes={offset}-{last} returned {} bytes",
                self.url,
                response.body.len()
            )));
        }
        log::debug!("fetched {} bytes at offset {offset} from {}", response.body.len(), self.url);
        Ok(response.body)
    }
}
