//! Notification system for pipeline status updates.
//!
//! Notifications are best-effort: a failed send is logged and never affects
//! the ledger or the outcome of a stage.
mod abstraction;
mod ntfy;

pub use abstraction::{NotificationSender, NotificationType};
pub use ntfy::NtfyNotificationSender;

pub(crate) use ntfy::parse_topic_url;

/// Sends `notification` if a sender is configured, logging any failure.
pub fn dispatch(sender: Option<&dyn NotificationSender>, notification: NotificationType) {
    let Some(sender) = sender else {
        return;
    };
    if let Err(e) = sender.send_notification(&notification) {
        log::warn!("Failed to send '{}' notification: {}", notification.get_title(), e);
    }
}
