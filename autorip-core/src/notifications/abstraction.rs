// ============================================================================
// autorip-core/src/notifications/abstraction.rs
// ============================================================================
//
// NOTIFICATION ABSTRACTION: Notification Types and Sender Trait
//
// Defines what the pipeline announces (a rip finished, a compression
// finished, a title was finalized, a stage failed for a title) and the trait
// backends implement to deliver it.
//
// AI-ASSISTANT-INFO: Notification system abstractions

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use crate::error::CoreResult;
use crate::stage::Stage;
use crate::utils::{calculate_size_reduction, format_bytes, format_duration};

// ============================================================================
// NOTIFICATION TYPES
// ============================================================================

/// Represents different types of notifications that can be sent.
#[derive(Debug, Clone)]
pub enum NotificationType {
    /// The feature of a disc was extracted
    RipComplete {
        title: String,
        duration: Duration,
        hostname: String,
    },

    /// A title was transcoded
    CompressComplete {
        title: String,
        input_size: u64,
        output_size: u64,
        duration: Duration,
        hostname: String,
    },

    /// All configured work for a title is done
    TitleFinalized {
        title: String,
        /// Final artifact location
        path: PathBuf,
        hostname: String,
    },

    /// A stage attempt failed for a title
    StageFailed {
        stage: Stage,
        title: String,
        message: String,
        hostname: String,
    },
}

impl NotificationType {
    /// Gets the title for this notification type.
    pub fn get_title(&self) -> String {
        match self {
            NotificationType::RipComplete { .. } => "Rip Complete".to_string(),
            NotificationType::CompressComplete { .. } => "Compression Complete".to_string(),
            NotificationType::TitleFinalized { .. } => "Title Finalized".to_string(),
            NotificationType::StageFailed { stage, .. } => {
                let name = stage.name();
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => format!("{}{} Failed", first.to_uppercase(), chars.as_str()),
                    None => "Stage Failed".to_string(),
                }
            }
        }
    }

    /// Gets the message body for this notification type.
    pub fn get_message(&self) -> String {
        match self {
            NotificationType::RipComplete {
                title,
                duration,
                hostname,
            } => format!(
                "Ripped {} on {} in {}",
                title,
                hostname,
                format_duration(duration.as_secs())
            ),
            NotificationType::CompressComplete {
                title,
                input_size,
                output_size,
                duration,
                hostname,
            } => format!(
                "Compressed {} on {} in {}. Reduced by {}% ({} to {})",
                title,
                hostname,
                format_duration(duration.as_secs()),
                calculate_size_reduction(*input_size, *output_size),
                format_bytes(*input_size),
                format_bytes(*output_size)
            ),
            NotificationType::TitleFinalized {
                title,
                path,
                hostname,
            } => format!("{} is ready at {} on {}", title, path.display(), hostname),
            NotificationType::StageFailed {
                stage,
                title,
                message,
                hostname,
            } => format!("{} of {} failed on {}: {}", stage, title, hostname, message),
        }
    }

    /// Gets the priority level for this notification type (1-5, 5 highest).
    pub fn get_priority(&self) -> u8 {
        match self {
            NotificationType::RipComplete { .. } => 3,
            NotificationType::CompressComplete { .. } => 3,
            NotificationType::TitleFinalized { .. } => 4,
            NotificationType::StageFailed { .. } => 5,
        }
    }

    /// Short tag identifying the kind of notification.
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationType::RipComplete { .. } => "rip",
            NotificationType::CompressComplete { .. } => "compress",
            NotificationType::TitleFinalized { .. } => "complete",
            NotificationType::StageFailed { .. } => "error",
        }
    }
}

// ============================================================================
// NOTIFICATION SENDER
// ============================================================================

/// Trait for notification backends.
pub trait NotificationSender: Send + Sync {
    /// Sends a notification.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the notification was sent successfully
    /// * `Err(CoreError)` - If an error occurred while sending the notification
    fn send_notification(&self, notification: &NotificationType) -> CoreResult<()>;
}
