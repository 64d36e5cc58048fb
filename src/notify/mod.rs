/// Outbound chat/bot channel informed of settlement and cancellation
/// outcomes. Strictly fire-and-forget: a delivery failure is logged and
/// never rolls back or fails the core operation.
pub trait NotificationChannel: Send + Sync {
    fn notify(&self, message: &str) -> Result<(), String>;
}

/// Default channel that just writes to the application log. The real
/// chat-bot transport lives with the route layer and plugs in here.
pub struct LogNotifier;

impl NotificationChannel for LogNotifier {
    fn notify(&self, message: &str) -> Result<(), String> {
        log::info!("📨 {}", message);
        Ok(())
    }
}

pub fn notify_best_effort(channel: &dyn NotificationChannel, message: &str) {
    if let Err(e) = channel.notify(message) {
        log::warn!("Notification delivery failed (ignored): {}", e);
    }
}
