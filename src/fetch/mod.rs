// src/fetch/mod.rs
// =============================================================================
// The Fetcher capability: fetch one URL, report the outcome.
//
// Submodules:
// - http: the reqwest-backed implementation used by the CLI
//
// The trait is the seam between the pipeline and the network, so the worker
// pool only ever sees "a thing that turns a URL into a Resource".
// =============================================================================

mod http;

pub use http::HttpFetcher;

use crate::error::ScanError;
use crate::resource::Resource;
use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs one GET. Any HTTP response (404 included) is a Resource;
    /// only transport failures are errors. The body is left open.
    async fn fetch(&self, url: &Url) -> Result<Resource, ScanError>;

    /// Fetches `url` and places the Resource on `sink`.
    ///
    /// On error nothing is sent. Ownership of the body moves to whoever
    /// receives from the channel.
    async fn fetch_into(
        &self,
        url: &Url,
        sink: &mpsc::Sender<Resource>,
    ) -> Result<(), ScanError> {
        let resource = self.fetch(url).await?;
        sink.send(resource)
            .await
            .map_err(|_| ScanError::ChannelClosed(url.to_string()))
    }
}
