// src/resource.rs
// =============================================================================
// The outcome of one fetch that reached a server.
//
// A Resource is built once by the fetcher and then moved, never mutated, to
// whoever reads it from the completion channel. The body is the still-open
// HTTP response: the reader owns it, and dropping the Resource (or calling
// Body::close) releases the connection on every code path.
// =============================================================================

use crate::error::ScanError;
use reqwest::{Response, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};

#[derive(Debug)]
pub struct Resource {
    /// The fully-qualified URL that was fetched
    pub name: String,
    /// True only for an exact 200 response
    pub found: bool,
    /// The HTTP status the server answered with
    pub status: StatusCode,
    /// The open response body
    pub body: Body,
}

impl Resource {
    pub fn from_response(name: impl Into<String>, response: Response) -> Self {
        let status = response.status();
        Self {
            name: name.into(),
            found: status == StatusCode::OK,
            status,
            body: Body { response },
        }
    }
}

/// Streaming response body, owned by the receiver of the Resource
#[derive(Debug)]
pub struct Body {
    response: Response,
}

impl Body {
    /// Streams the remaining body into `writer`, returning the byte count
    pub async fn copy_to<W>(&mut self, writer: &mut W) -> Result<u64, ScanError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let url = self.response.url().to_string();
        let mut written = 0u64;
        while let Some(chunk) = self
            .response
            .chunk()
            .await
            .map_err(|e| ScanError::transport(url.as_str(), e))?
        {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }

    /// Reads the whole body into memory
    pub async fn into_bytes(self) -> Result<Vec<u8>, ScanError> {
        let url = self.response.url().to_string();
        let bytes = self
            .response
            .bytes()
            .await
            .map_err(|e| ScanError::transport(url, e))?;
        Ok(bytes.to_vec())
    }

    /// Releases the underlying connection without reading the rest
    pub fn close(self) {
        drop(self.response);
    }
}
