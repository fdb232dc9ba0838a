use super::phase::Phase;

pub type NotifyError = Box<dyn std::error::Error + Send + Sync>;

/// Tells the user that a phase has ended.
///
/// Called off the timer loop; an error is logged and never reaches the
/// timer state.
pub trait Notifier: Send + Sync {
    fn notify(&self, completed: Phase, next: Phase) -> Result<(), NotifyError>;
}

/// Writes completions to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, completed: Phase, next: Phase) -> Result<(), NotifyError> {
        tracing::info!(
            completed = %completed,
            next = %next,
            "{} finished, {} is up next",
            completed.label(),
            next.label()
        );
        Ok(())
    }
}

/// Swallows notifications (notifications disabled in config).
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _completed: Phase, _next: Phase) -> Result<(), NotifyError> {
        Ok(())
    }
}
