pub mod app_status;
pub mod projects;
pub mod queue;
pub mod slices;

pub use app_status::{AppStatusState, DEFAULT_STATUS_TEXT};
pub use projects::ProjectsState;
pub use queue::{OperationKind, OperationQueueState, QueuedOperation};
pub use slices::{DependenciesState, PathsState, TasksState};

use crate::events::CoreEvent;

/// The whole core state. Every slice reducer independently matches the same
/// event; this `apply` is the single mutation entry point for all of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub projects: ProjectsState,
    pub tasks: TasksState,
    pub dependencies: DependenciesState,
    pub paths: PathsState,
    pub status: AppStatusState,
    pub queue: OperationQueueState,
}

impl AppState {
    pub fn apply(&mut self, event: &CoreEvent) {
        self.projects.apply(event);
        self.tasks.apply(event);
        self.dependencies.apply(event);
        self.paths.apply(event);
        self.status.apply(event);
        self.queue.apply(event);
    }
}
