//! In-memory channel-access provider for tests and offline development.
//!
//! `MockProvider` keeps a name/value map, records every put it receives,
//! supports scripted read sequences and injected transient failures, and can
//! publish asynchronous updates to subscribers. Acknowledged puts echo the
//! written value to subscribers the way the real control network does.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::provider::{ChannelProvider, ProviderError, Subscription};
use super::value::{ChannelUpdate, ChannelValue, PutStatus};

const UPDATE_BUFFER: usize = 128;

#[derive(Default)]
struct FaultInjection {
    /// Remaining fetches per name that fail before succeeding.
    failing_fetches: HashMap<String, u32>,
    /// Remaining acknowledged puts per name that fail before succeeding.
    failing_puts: HashMap<String, u32>,
    /// Names whose acknowledged puts are always rejected (exercises the
    /// one-shot fallback path).
    rejecting_puts: Vec<String>,
}

pub struct MockProvider {
    values: RwLock<HashMap<String, ChannelValue>>,
    /// Scripted read sequences, consumed before the value map is consulted.
    scripts: Mutex<HashMap<String, VecDeque<ChannelValue>>>,
    puts: Mutex<Vec<(String, ChannelValue)>>,
    faults: Mutex<FaultInjection>,
    subscribers: Mutex<HashMap<String, broadcast::Sender<ChannelUpdate>>>,
    connection_timeout: Duration,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            scripts: Mutex::new(HashMap::new()),
            puts: Mutex::new(Vec::new()),
            faults: Mutex::new(FaultInjection::default()),
            subscribers: Mutex::new(HashMap::new()),
            connection_timeout: Duration::from_millis(10),
        }
    }

    /// Set the current value for a name without recording a put.
    pub fn set(&self, name: &str, value: impl Into<ChannelValue>) {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_owned(), value.into());
    }

    /// Queue a read sequence for `name`; each fetch consumes one entry before
    /// falling back to the current value.
    pub fn script_reads(&self, name: &str, values: impl IntoIterator<Item = ChannelValue>) {
        self.scripts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(name.to_owned())
            .or_default()
            .extend(values);
    }

    /// Make the next `count` fetches of `name` fail.
    pub fn fail_next_fetches(&self, name: &str, count: u32) {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .failing_fetches
            .insert(name.to_owned(), count);
    }

    /// Make the next `count` acknowledged puts to `name` fail.
    pub fn fail_next_puts(&self, name: &str, count: u32) {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .failing_puts
            .insert(name.to_owned(), count);
    }

    /// Reject every acknowledged put to `name`; only `put_oneshot` succeeds.
    pub fn reject_acked_puts(&self, name: &str) {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .rejecting_puts
            .push(name.to_owned());
    }

    /// Every put recorded against `name`, in order.
    pub fn puts_for(&self, name: &str) -> Vec<ChannelValue> {
        self.puts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Every recorded put, in order.
    pub fn all_puts(&self) -> Vec<(String, ChannelValue)> {
        self.puts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Publish an asynchronous update, as the remote delivery context would.
    pub fn publish(&self, name: &str, update: ChannelUpdate) {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_owned(), update.value.clone());
        let sender = self.sender_for(name);
        // No receivers yet is fine; the cache picks the value up on subscribe.
        let _ = sender.send(update);
    }

    fn sender_for(&self, name: &str) -> broadcast::Sender<ChannelUpdate> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(name.to_owned())
            .or_insert_with(|| broadcast::channel(UPDATE_BUFFER).0)
            .clone()
    }

    fn record_put(&self, name: &str, value: &ChannelValue) {
        self.puts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((name.to_owned(), value.clone()));
    }

    fn commit_put(&self, name: &str, value: ChannelValue) {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_owned(), value.clone());
        let sender = self.sender_for(name);
        let _ = sender.send(ChannelUpdate::new(value));
    }

    fn take_fetch_fault(&self, name: &str) -> bool {
        let mut faults = self
            .faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match faults.failing_fetches.get_mut(name) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn take_put_fault(&self, name: &str) -> bool {
        let mut faults = self
            .faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if faults.rejecting_puts.iter().any(|n| n == name) {
            return true;
        }
        match faults.failing_puts.get_mut(name) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl ChannelProvider for MockProvider {
    async fn fetch(&self, name: &str) -> Result<ChannelValue, ProviderError> {
        if self.take_fetch_fault(name) {
            return Err(ProviderError::NoValue(name.to_owned()));
        }
        {
            let mut scripts = self
                .scripts
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(queue) = scripts.get_mut(name) {
                if let Some(value) = queue.pop_front() {
                    return Ok(value);
                }
            }
        }
        self.values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::NoValue(name.to_owned()))
    }

    async fn put(&self, name: &str, value: ChannelValue) -> Result<PutStatus, ProviderError> {
        if self.take_put_fault(name) {
            return Ok(PutStatus::Failed);
        }
        self.record_put(name, &value);
        self.commit_put(name, value);
        Ok(PutStatus::Acked)
    }

    async fn put_oneshot(
        &self,
        name: &str,
        value: ChannelValue,
    ) -> Result<PutStatus, ProviderError> {
        self.record_put(name, &value);
        self.commit_put(name, value);
        Ok(PutStatus::Acked)
    }

    async fn subscribe(&self, name: &str) -> Result<Subscription, ProviderError> {
        let initial = self
            .values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
            .map(ChannelUpdate::new);
        let updates = self.sender_for(name).subscribe();
        Ok(Subscription { initial, updates })
    }

    fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_reads_consume_before_current_value() {
        let provider = MockProvider::new();
        provider.set("STAT", 0i64);
        provider.script_reads("STAT", [ChannelValue::Int(1), ChannelValue::Int(1)]);

        assert_eq!(provider.fetch("STAT").await.ok(), Some(ChannelValue::Int(1)));
        assert_eq!(provider.fetch("STAT").await.ok(), Some(ChannelValue::Int(1)));
        assert_eq!(provider.fetch("STAT").await.ok(), Some(ChannelValue::Int(0)));
    }

    #[tokio::test]
    async fn put_echoes_to_subscribers() {
        let provider = MockProvider::new();
        let mut sub = provider.subscribe("ADES").await.unwrap();
        provider.put("ADES", ChannelValue::Float(16.6)).await.unwrap();
        let update = sub.updates.recv().await.unwrap();
        assert_eq!(update.value, ChannelValue::Float(16.6));
    }

    #[tokio::test]
    async fn injected_fetch_faults_are_transient() {
        let provider = MockProvider::new();
        provider.set("LVL", 92.0);
        provider.fail_next_fetches("LVL", 1);
        assert!(provider.fetch("LVL").await.is_err());
        assert!(provider.fetch("LVL").await.is_ok());
    }
}
