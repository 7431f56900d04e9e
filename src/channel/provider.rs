//! The channel-access provider contract.
//!
//! The wire protocol of the remote control network is out of scope; the core
//! depends only on the four capabilities below: one-shot get, one-shot
//! acknowledged put, a subscribable stream of cached updates, and a bounded
//! connection timeout. Concrete providers (the production gateway client, the
//! in-memory mock) implement this trait.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

use super::value::{ChannelUpdate, ChannelValue, PutStatus};

/// Transient faults reported by a provider. The channel layer retries these;
/// they never reach callers directly.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("connection to {0} timed out")]
    ConnectionTimeout(String),
    #[error("{0} returned no valid value")]
    NoValue(String),
    #[error("write to {0} rejected: {1}")]
    WriteRejected(String, String),
    #[error("provider fault: {0}")]
    Fault(String),
}

/// A live subscription to one named channel.
///
/// `initial` carries the cached value known at subscription time, if any;
/// `updates` delivers every subsequent value/severity change. Updates are
/// produced on a provider-managed delivery context that runs concurrently
/// with the caller's task.
pub struct Subscription {
    pub initial: Option<ChannelUpdate>,
    pub updates: broadcast::Receiver<ChannelUpdate>,
}

/// Remote channel-access provider.
///
/// All methods take `&self`; implementations use interior mutability and must
/// be safe to share across tasks.
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    /// One-shot synchronous get-by-name.
    async fn fetch(&self, name: &str) -> Result<ChannelValue, ProviderError>;

    /// Put-by-name, waiting for the provider's acknowledgment.
    async fn put(&self, name: &str, value: ChannelValue) -> Result<PutStatus, ProviderError>;

    /// Simpler one-shot put primitive, used as the fallback write strategy
    /// after the acknowledged path is exhausted.
    async fn put_oneshot(&self, name: &str, value: ChannelValue)
        -> Result<PutStatus, ProviderError>;

    /// Subscribe to asynchronous value/severity updates for `name`.
    async fn subscribe(&self, name: &str) -> Result<Subscription, ProviderError>;

    /// Bounded connection timeout applied to the operations above.
    fn connection_timeout(&self) -> Duration;
}
