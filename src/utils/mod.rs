use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a unique request ID for log correlation
pub fn generate_request_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let random = rand::random::<u32>();
    format!("req_{timestamp:x}_{random:x}")
}
