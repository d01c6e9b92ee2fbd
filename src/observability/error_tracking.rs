use tracing::error;
use uuid::Uuid;

/// Records an unexpected 5xx response and returns the event id, or `None`
/// when `status` is not a server error.
pub fn capture_unexpected_5xx(
    path: &str,
    method: &str,
    status: u16,
    request_id: &str,
) -> Option<Uuid> {
    if !(500..=599).contains(&status) {
        return None;
    }

    let event_id = Uuid::new_v4();
    error!(
        tracking_backend = "log",
        event_id = %event_id,
        request_id = %request_id,
        method = %method,
        path = %path,
        status = status,
        transient = matches!(status, 503 | 504),
        "error-tracking capture for unexpected 5xx"
    );
    Some(event_id)
}
