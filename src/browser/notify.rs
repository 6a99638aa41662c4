// browser/notify.rs - User-visible notifications
//
// The browser reports failures through a notifier instead of returning
// errors; the owning view decides how to show them (snackbar, toast, log).

/// Channel for user-visible feedback
pub trait Notifier: Send + Sync {
    fn error_notification(&self, message: &str);
    fn success_notification(&self, message: &str);
}

/// Notifier that only writes to the log
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error_notification(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn success_notification(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn error_notification(&self, message: &str) {
        (**self).error_notification(message);
    }

    fn success_notification(&self, message: &str) {
        (**self).success_notification(message);
    }
}
