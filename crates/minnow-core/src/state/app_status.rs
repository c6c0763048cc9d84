use crate::events::CoreEvent;

pub const DEFAULT_STATUS_TEXT: &str = "Please wait...";

/// Blocking-action flag and loading-screen status text, independent of any
/// per-project data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppStatusState {
    pub blocking_action_active: bool,
    pub status_text: String,
}

impl Default for AppStatusState {
    fn default() -> Self {
        Self {
            blocking_action_active: false,
            status_text: DEFAULT_STATUS_TEXT.to_owned(),
        }
    }
}

impl AppStatusState {
    /// Recognizes six event kinds. Every other event restores the initial
    /// sub-state wholesale; the reinstall-failure path relies on this reset
    /// to clear the blocking flag.
    pub fn apply(&mut self, event: &CoreEvent) {
        match event {
            CoreEvent::ProjectDeleteStarted { .. } | CoreEvent::ReinstallStarted { .. } => {
                self.blocking_action_active = true;
            }
            CoreEvent::ProjectDeleted { .. } | CoreEvent::ReinstallFinished => {
                self.blocking_action_active = false;
            }
            CoreEvent::StatusTextSet { text } => {
                // An empty string is a no-op, not a clear.
                if !text.is_empty() {
                    self.status_text = text.clone();
                }
            }
            CoreEvent::StatusTextReset => {
                self.status_text = DEFAULT_STATUS_TEXT.to_owned();
            }
            _ => *self = Self::default(),
        }
    }
}
