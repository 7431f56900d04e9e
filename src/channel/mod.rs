//! Resilient named-channel access layer.
//!
//! Everything the device model does to the machine goes through a [`Channel`]:
//! a named remote parameter with synchronous get/put and asynchronous change
//! notification, wrapping an unreliable [`ChannelProvider`] with a bounded
//! retry/fallback [`RetryPolicy`]. Channels are shared by name through the
//! [`ChannelRegistry`] and never duplicated.

mod channel;
pub mod mock;
mod policy;
mod provider;
mod registry;
mod value;

pub use channel::{Channel, ChangeCallback};
pub use policy::{ReadMode, RetryPolicy};
pub use provider::{ChannelProvider, ProviderError, Subscription};
pub use registry::ChannelRegistry;
pub use value::{AlarmSeverity, ChannelState, ChannelUpdate, ChannelValue, PutStatus};
