//! Notification port.

/// Delivery is best effort: implementations log failures instead of
/// returning them.
pub trait Notifier: Send + Sync {
    fn send(&self, message: &str);
}
