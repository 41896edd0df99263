// ============================================================================
// autorip-core/src/notifications/ntfy.rs
// ============================================================================
//
// NTFY IMPLEMENTATION: Notification Delivery Through ntfy.sh
//
// Sends notifications to an ntfy topic using the blocking client of the ntfy
// crate. The topic is configured as a full URL (`https://host/topic`).
//
// AI-ASSISTANT-INFO: ntfy.sh implementation for sending notifications

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::notifications::{NotificationSender, NotificationType};

// ---- External crate imports ----
use ntfy::DispatcherBuilder;
use ntfy::payload::{Payload, Priority as NtfyPriority};

/// Sends notifications to an ntfy server.
#[derive(Debug, Clone)]
pub struct NtfyNotificationSender {
    base_url: String,
    topic: String,
}

impl NtfyNotificationSender {
    /// Creates a sender for `topic_url`.
    ///
    /// # Returns
    ///
    /// * `Err(CoreError::NotificationError)` - If the URL is not `https://host/topic`
    pub fn new(topic_url: &str) -> CoreResult<Self> {
        let (base_url, topic) = parse_topic_url(topic_url)?;
        Ok(Self { base_url, topic })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl NotificationSender for NtfyNotificationSender {
    fn send_notification(&self, notification: &NotificationType) -> CoreResult<()> {
        let dispatcher = DispatcherBuilder::new(&self.base_url)
            .build_blocking()
            .map_err(|e| {
                CoreError::NotificationError(format!(
                    "Failed to build ntfy dispatcher for {}: {}",
                    self.base_url, e
                ))
            })?;

        let priority = match map_priority(notification.get_priority()) {
            Some(p) => p,
            None => {
                log::warn!(
                    "Invalid ntfy priority value provided: {}",
                    notification.get_priority()
                );
                NtfyPriority::Default
            }
        };

        let payload = Payload::new(&self.topic)
            .message(notification.get_message())
            .title(notification.get_title())
            .priority(priority)
            .tags(vec!["autorip".to_string(), notification.tag().to_string()]);

        dispatcher.send(&payload).map_err(|e| {
            CoreError::NotificationError(format!(
                "Failed to send ntfy notification to {}/{}: {}",
                self.base_url, self.topic, e
            ))
        })?;
        log::debug!("Sent '{}' notification", notification.get_title());
        Ok(())
    }
}

/// Splits `https://host/topic` into base URL and topic.
pub(crate) fn parse_topic_url(topic_url: &str) -> CoreResult<(String, String)> {
    let Some(after_scheme) = topic_url.strip_prefix("https://") else {
        return Err(CoreError::NotificationError(format!(
            "Invalid ntfy topic URL '{}': must start with https://",
            topic_url
        )));
    };

    let (host, topic) = after_scheme.split_once('/').unwrap_or((after_scheme, ""));
    if host.is_empty() {
        return Err(CoreError::NotificationError(format!(
            "URL '{}' must have a non-empty host",
            topic_url
        )));
    }
    let topic = topic.trim_end_matches('/');
    if topic.is_empty() {
        return Err(CoreError::NotificationError(format!(
            "URL '{}' is missing topic path",
            topic_url
        )));
    }

    Ok((format!("https://{}", host), topic.to_string()))
}

/// Maps a numeric priority (1-5) to the ntfy priority enum.
fn map_priority(p: u8) -> Option<NtfyPriority> {
    match p {
        1 => Some(NtfyPriority::Min),
        2 => Some(NtfyPriority::Low),
        3 => Some(NtfyPriority::Default),
        4 => Some(NtfyPriority::High),
        5 => Some(NtfyPriority::Max),
        _ => None,
    }
}
