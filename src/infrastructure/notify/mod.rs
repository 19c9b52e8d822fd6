//! Notifier adapters

mod log_notifier;
mod mail_api;

pub use log_notifier::LogNotifier;
pub use mail_api::MailApiNotifier;
