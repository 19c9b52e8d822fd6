//! Infrastructure - concrete price source, notifiers, push hub and HTTP front end

pub mod broadcast;
pub mod http;
pub mod notify;
pub mod source;

pub use broadcast::ChannelBroadcaster;
pub use notify::{LogNotifier, MailApiNotifier};
pub use source::{FieldRule, HttpPriceSource};
