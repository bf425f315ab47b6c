/*
[INPUT]:  Backlog and stream URLs built from the filter state
[OUTPUT]: Backlog entries and open entry streams
[POS]:    Transport seam - network I/O behind traits so sessions can run on fakes
[UPDATE]: When adding transport operations or changing the network client setup
*/

use async_trait::async_trait;
use minink_client::{
    BacklogClient, ClientConfig, ClientError, LiveStream, LogEntry, StreamFrame,
};
use url::Url;

/// One open streaming connection
#[async_trait]
pub trait EntryStream: Send {
    /// Next data frame; `None` once the remote side closed normally
    async fn next_frame(&mut self) -> Option<Result<StreamFrame, ClientError>>;

    /// Close the connection; closing twice is a no-op
    async fn close(&mut self) -> Result<(), ClientError>;
}

/// Network operations used by a live session
#[async_trait]
pub trait LogTransport: Send + Sync {
    async fn fetch_backlog(&self, url: Url) -> Result<Vec<LogEntry>, ClientError>;

    async fn open_stream(&self, url: Url) -> Result<Box<dyn EntryStream>, ClientError>;
}

#[async_trait]
impl EntryStream for LiveStream {
    async fn next_frame(&mut self) -> Option<Result<StreamFrame, ClientError>> {
        LiveStream::next_frame(self).await
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        LiveStream::close(self).await
    }
}

/// HTTP backlog client plus WebSocket streams
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    backlog: BacklogClient,
}

impl NetworkTransport {
    pub fn new() -> Result<Self, ClientError> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            backlog: BacklogClient::with_config(config)?,
        })
    }
}

#[async_trait]
impl LogTransport for NetworkTransport {
    async fn fetch_backlog(&self, url: Url) -> Result<Vec<LogEntry>, ClientError> {
        self.backlog.fetch_url(url).await
    }

    async fn open_stream(&self, url: Url) -> Result<Box<dyn EntryStream>, ClientError> {
        let stream = LiveStream::connect(url).await?;
        Ok(Box::new(stream))
    }
}
