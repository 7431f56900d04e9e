//! Resilient named-channel access.
//!
//! `Channel` wraps an unreliable remote provider with a bounded
//! retry/fallback policy and gives callers plain get/put semantics. Reads
//! support two strategies selectable per call (`ReadMode`): a one-shot
//! network query and a cached-subscription read that returns the most recent
//! asynchronously-delivered value. Writes wait for acknowledgment, retry with
//! backoff, and may fall back to the simpler one-shot put primitive before
//! giving up.
//!
//! Hardware targets behind these channels are set-points, not counters, so a
//! retried write is safe to issue multiple times.

use std::sync::{Arc, Mutex, RwLock};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{LinacError, LinacResult};

use super::policy::{ReadMode, RetryPolicy};
use super::provider::ChannelProvider;
use super::value::{AlarmSeverity, ChannelState, ChannelUpdate, ChannelValue};

/// Callback invoked on every asynchronous value/severity update.
///
/// Runs on the subscription delivery task and must not block it; callbacks
/// that need to issue channel operations should `tokio::spawn` them.
pub type ChangeCallback = Arc<dyn Fn(&ChannelUpdate) + Send + Sync>;

struct ChannelInner {
    name: String,
    provider: Arc<dyn ChannelProvider>,
    policy: RetryPolicy,
    state: RwLock<ChannelState>,
    /// Last update delivered by the subscription, if one is running.
    cache: RwLock<Option<ChannelUpdate>>,
    /// At most one active change callback per channel.
    callback: Mutex<Option<ChangeCallback>>,
    /// Guards one-time subscription startup.
    monitor_started: tokio::sync::Mutex<bool>,
}

/// A named remote parameter with synchronous read/write and asynchronous
/// change notification.
///
/// Channels are shared by name and cheap to clone; all clones observe the
/// same cache, state, and subscription.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

impl Channel {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn ChannelProvider>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                name: name.into(),
                provider,
                policy,
                state: RwLock::new(ChannelState::Unconnected),
                cache: RwLock::new(None),
                callback: Mutex::new(None),
                monitor_started: tokio::sync::Mutex::new(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> ChannelState {
        *self
            .inner
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: ChannelState) {
        *self
            .inner
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    /// Read the channel's current value using the given strategy.
    ///
    /// Transient provider faults are retried with backoff up to the policy's
    /// attempt budget, then surface as `ChannelInvalid`.
    pub async fn get(&self, mode: ReadMode) -> LinacResult<ChannelValue> {
        if mode == ReadMode::Cached {
            match self.ensure_monitor().await {
                Ok(()) => {
                    let cached = self
                        .inner
                        .cache
                        .read()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .clone();
                    match cached {
                        // A cached update with invalid severity is not a
                        // usable value; re-query the provider instead.
                        Some(update) if update.severity != AlarmSeverity::Invalid => {
                            return Ok(update.value);
                        }
                        Some(_) => {
                            warn!(channel = %self.inner.name, "cached value is stale, falling back to fetch");
                        }
                        None => {
                            debug!(channel = %self.inner.name, "no cached value yet, falling back to fetch");
                        }
                    }
                }
                Err(err) => {
                    warn!(channel = %self.inner.name, %err, "subscription unavailable, falling back to fetch");
                }
            }
        }
        self.fetch_with_retry().await
    }

    /// Numeric read; non-numeric values surface as `ChannelInvalid`.
    pub async fn get_f64(&self, mode: ReadMode) -> LinacResult<f64> {
        let value = self.get(mode).await?;
        value.as_f64().ok_or_else(|| {
            LinacError::channel_invalid(&self.inner.name, 1, format!("non-numeric value {value:?}"))
        })
    }

    /// Integer read; non-numeric values surface as `ChannelInvalid`.
    pub async fn get_i64(&self, mode: ReadMode) -> LinacResult<i64> {
        let value = self.get(mode).await?;
        value.as_i64().ok_or_else(|| {
            LinacError::channel_invalid(&self.inner.name, 1, format!("non-numeric value {value:?}"))
        })
    }

    async fn fetch_with_retry(&self) -> LinacResult<ChannelValue> {
        let policy = &self.inner.policy;
        let mut last_fault = String::new();
        for attempt in 1..=policy.max_attempts {
            match self.inner.provider.fetch(&self.inner.name).await {
                Ok(value) => {
                    self.set_state(ChannelState::Connected);
                    return Ok(value);
                }
                Err(err) => {
                    warn!(
                        channel = %self.inner.name,
                        attempt,
                        max_attempts = policy.max_attempts,
                        %err,
                        "read failed, retrying"
                    );
                    last_fault = err.to_string();
                    if attempt < policy.max_attempts {
                        sleep(policy.backoff).await;
                    }
                }
            }
        }
        self.set_state(ChannelState::Unconnected);
        Err(LinacError::channel_invalid(
            &self.inner.name,
            policy.max_attempts,
            last_fault,
        ))
    }

    /// Write a value and wait for acknowledgment.
    ///
    /// Non-success acknowledgments and provider faults are retried with
    /// backoff; once the primary strategy is exhausted, one fallback one-shot
    /// put is attempted (if the policy allows) before raising
    /// `ChannelInvalid`.
    pub async fn put(&self, value: impl Into<ChannelValue>) -> LinacResult<()> {
        let value = value.into();
        let policy = &self.inner.policy;
        let mut last_fault = String::new();

        for attempt in 1..=policy.max_attempts {
            match self.inner.provider.put(&self.inner.name, value.clone()).await {
                Ok(status) if status.is_acked() => {
                    self.set_state(ChannelState::Connected);
                    return Ok(());
                }
                Ok(_) => {
                    warn!(
                        channel = %self.inner.name,
                        attempt,
                        "write not acknowledged, retrying"
                    );
                    last_fault = "write not acknowledged".into();
                }
                Err(err) => {
                    warn!(channel = %self.inner.name, attempt, %err, "write failed, retrying");
                    last_fault = err.to_string();
                }
            }
            if attempt < policy.max_attempts {
                sleep(policy.backoff).await;
            }
        }

        if policy.write_fallback {
            debug!(channel = %self.inner.name, "acknowledged write exhausted, trying one-shot put");
            match self
                .inner
                .provider
                .put_oneshot(&self.inner.name, value)
                .await
            {
                Ok(status) if status.is_acked() => {
                    self.set_state(ChannelState::Connected);
                    return Ok(());
                }
                Ok(_) => last_fault = "fallback write not acknowledged".into(),
                Err(err) => last_fault = err.to_string(),
            }
        }

        self.set_state(ChannelState::Unconnected);
        Err(LinacError::channel_invalid(
            &self.inner.name,
            policy.max_attempts,
            last_fault,
        ))
    }

    /// Register a callback for asynchronous value/severity updates.
    ///
    /// At most one callback is active per channel; registering again replaces
    /// the previous one. Starts the subscription if it is not running yet.
    pub async fn on_change(
        &self,
        callback: impl Fn(&ChannelUpdate) + Send + Sync + 'static,
    ) -> LinacResult<()> {
        {
            let mut slot = self
                .inner
                .callback
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if slot.is_some() {
                warn!(channel = %self.inner.name, "replacing existing change callback");
            }
            *slot = Some(Arc::new(callback));
        }
        self.ensure_monitor().await
    }

    /// Start the subscription forwarder task exactly once.
    async fn ensure_monitor(&self) -> LinacResult<()> {
        let mut started = self.inner.monitor_started.lock().await;
        if *started {
            return Ok(());
        }

        let subscription = self
            .inner
            .provider
            .subscribe(&self.inner.name)
            .await
            .map_err(|err| LinacError::channel_invalid(&self.inner.name, 1, err.to_string()))?;

        if let Some(initial) = subscription.initial {
            self.apply_update(&initial);
        }

        let channel = self.clone();
        let mut updates = subscription.updates;
        tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(update) => channel.deliver(update),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(
                            channel = %channel.inner.name,
                            missed,
                            "subscription lagged, updates dropped"
                        );
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        channel.set_state(ChannelState::Unconnected);
                        break;
                    }
                }
            }
        });

        *started = true;
        Ok(())
    }

    fn apply_update(&self, update: &ChannelUpdate) {
        let state = if update.severity == AlarmSeverity::Invalid {
            ChannelState::Stale
        } else {
            ChannelState::Connected
        };
        self.set_state(state);
        *self
            .inner
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(update.clone());
    }

    fn deliver(&self, update: ChannelUpdate) {
        self.apply_update(&update);
        let callback = self
            .inner
            .callback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if let Some(callback) = callback {
            callback(&update);
        }
    }
}
