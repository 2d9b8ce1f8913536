//! Message id generation.

use chrono::Utc;

/// Generate a message id from the current time plus a random suffix.
///
/// Ids sort roughly by creation time; the suffix keeps ids distinct when
/// several messages are created within the same millisecond.
pub fn generate_message_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..9])
}
