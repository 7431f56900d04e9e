//! Shared-by-name channel registry.
//!
//! No hardware object exclusively owns a channel: vacuum channels, for
//! example, appear in both a cryomodule and its linac's aggregated list. The
//! registry hands out clones of one `Channel` per fully-qualified name, so
//! cache, state, and subscription are shared by every referent. Channels are
//! created lazily at device construction and live until process teardown.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::channel::Channel;
use super::policy::RetryPolicy;
use super::provider::ChannelProvider;

pub struct ChannelRegistry {
    provider: Arc<dyn ChannelProvider>,
    policy: RetryPolicy,
    channels: RwLock<HashMap<String, Channel>>,
}

impl ChannelRegistry {
    pub fn new(provider: Arc<dyn ChannelProvider>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// The channel for `name`, creating it on first lookup.
    pub fn channel(&self, name: impl Into<String>) -> Channel {
        let name = name.into();
        {
            let channels = self
                .channels
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(channel) = channels.get(&name) {
                return channel.clone();
            }
        }
        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        channels
            .entry(name.clone())
            .or_insert_with(|| Channel::new(name, self.provider.clone(), self.policy.clone()))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn provider(&self) -> Arc<dyn ChannelProvider> {
        self.provider.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::MockProvider;

    #[tokio::test]
    async fn same_name_yields_same_channel() {
        let provider = Arc::new(MockProvider::new());
        let registry = ChannelRegistry::new(provider, RetryPolicy::immediate(1));

        let a = registry.channel("ACCL:L1B:0210:ADES");
        let b = registry.channel("ACCL:L1B:0210:ADES");
        let c = registry.channel("ACCL:L1B:0220:ADES");

        assert_eq!(registry.len(), 2);
        assert_eq!(a.name(), b.name());
        assert_ne!(a.name(), c.name());
    }
}
