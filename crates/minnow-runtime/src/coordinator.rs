use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use minnow_core::events::CoreEvent;
use minnow_core::project::{Dependency, Project};
use minnow_core::selectors::{blocking_status, status_text, Selectors};
use minnow_core::state::{AppState, OperationKind, QueuedOperation};
use minnow_protocol::backend::{PackageManagerBackend, PackageStream};
use minnow_protocol::error::{PackageManagerError, PackageManagerResult};
use minnow_protocol::event::{DependencyRequest, PackageStreamMessage};
use minnow_protocol::ids::{DependencyName, ProjectId};
use tokio::sync::Mutex;

use crate::bus::CoreEventBus;

enum OperationOutcome {
    Installed(BTreeMap<DependencyName, String>),
    Uninstalled,
}

/// The long-lived controller behind every dependency intent. It owns the
/// store, consults the per-project queue, invokes the package-manager
/// backend, and turns outcomes back into store events published on the bus.
///
/// Store mutation and bus publication always happen inside one lock scope,
/// so observers see events in exactly the order the store applied them and
/// queue handover (release active, activate next) is atomic.
#[derive(Clone)]
pub struct DependencyCoordinator {
    backend: Arc<dyn PackageManagerBackend>,
    state: Arc<Mutex<AppState>>,
    bus: Arc<CoreEventBus>,
    selectors: Arc<Selectors>,
}

impl DependencyCoordinator {
    pub fn new(backend: Arc<dyn PackageManagerBackend>, bus: Arc<CoreEventBus>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(AppState::default())),
            bus,
            selectors: Arc::new(Selectors::default()),
        }
    }

    /// Applies a store-owned transition that originates outside the
    /// coordinator: project creation/import/selection/deletion, refresh
    /// results fed back by the disk services, resets.
    pub async fn apply_external(&self, event: CoreEvent) {
        let mut state = self.state.lock().await;
        self.apply_and_publish(&mut state, event);
    }

    pub async fn add_dependency(
        &self,
        project_id: ProjectId,
        name: impl Into<DependencyName>,
        version: impl Into<String>,
    ) {
        let event = CoreEvent::DependencyInstallQueued {
            project_id: project_id.clone(),
            dependency: DependencyRequest {
                name: name.into(),
                version: version.into(),
            },
            is_update: false,
        };
        self.queue_operation(project_id, event).await;
    }

    /// Updates travel the install path with `is_update` set; the queue and
    /// the backend make no other distinction.
    pub async fn update_dependency(
        &self,
        project_id: ProjectId,
        name: impl Into<DependencyName>,
        latest_version: impl Into<String>,
    ) {
        let event = CoreEvent::DependencyInstallQueued {
            project_id: project_id.clone(),
            dependency: DependencyRequest {
                name: name.into(),
                version: latest_version.into(),
            },
            is_update: true,
        };
        self.queue_operation(project_id, event).await;
    }

    pub async fn delete_dependency(&self, project_id: ProjectId, name: impl Into<DependencyName>) {
        let event = CoreEvent::DependencyUninstallQueued {
            project_id: project_id.clone(),
            dependency_name: name.into(),
        };
        self.queue_operation(project_id, event).await;
    }

    /// Full reinstall: clear the dependency cache, then stream the package
    /// manager's output into status-text updates until its exit message.
    /// Runs to completion before returning; concurrent calls for different
    /// projects interleave at await points only.
    pub async fn reinstall_dependencies(&self, project_id: Option<ProjectId>) {
        // A reinstall request without a project id is silently ignored.
        let Some(project_id) = project_id else {
            return;
        };

        let path = {
            let mut state = self.state.lock().await;
            self.apply_and_publish(
                &mut state,
                CoreEvent::ReinstallStarted {
                    project_id: project_id.clone(),
                },
            );
            state.paths.path_for(&project_id).cloned()
        };

        match self.run_reinstall(&project_id, path).await {
            Ok(_exit_code) => {
                let mut state = self.state.lock().await;
                self.apply_and_publish(&mut state, CoreEvent::ReinstallFinished);
                self.apply_and_publish(&mut state, CoreEvent::StatusTextReset);
                // Reinstalling may have changed installed versions anywhere
                // in the tree; have the surrounding system re-read all
                // projects from disk.
                self.apply_and_publish(&mut state, CoreEvent::RefreshRequested);
            }
            Err(error) => {
                tracing::error!(
                    error = %error,
                    project_id = %project_id,
                    "failed to reinstall dependencies"
                );
                let mut state = self.state.lock().await;
                self.apply_and_publish(&mut state, CoreEvent::ReinstallFailed { project_id });
            }
        }
    }

    pub async fn all_projects(&self) -> Arc<Vec<Project>> {
        let state = self.state.lock().await;
        self.selectors.all_projects(&state)
    }

    pub async fn project_by_id(&self, project_id: &ProjectId) -> Option<Arc<Project>> {
        let state = self.state.lock().await;
        self.selectors.project_by_id(&state, project_id)
    }

    pub async fn selected_project(&self) -> Option<Arc<Project>> {
        let state = self.state.lock().await;
        self.selectors.selected_project(&state)
    }

    pub async fn dependencies_for_selected(&self) -> Vec<Dependency> {
        let state = self.state.lock().await;
        self.selectors.dependencies_for_selected(&state)
    }

    pub async fn status_text(&self) -> String {
        let state = self.state.lock().await;
        status_text(&state).to_owned()
    }

    pub async fn blocking_status(&self) -> bool {
        let state = self.state.lock().await;
        blocking_status(&state)
    }

    pub async fn pending_operation_count(&self, project_id: &ProjectId) -> usize {
        let state = self.state.lock().await;
        state.queue.pending_len(project_id)
    }

    pub async fn has_active_operation(&self, project_id: &ProjectId) -> bool {
        let state = self.state.lock().await;
        state.queue.active_for_project(project_id).is_some()
    }

    async fn queue_operation(&self, project_id: ProjectId, queued: CoreEvent) {
        let mut state = self.state.lock().await;
        let busy = state.queue.has_work(&project_id);
        self.apply_and_publish(&mut state, queued);
        if busy {
            // An operation is already pending or running for this project;
            // the new entry waits its turn in the queue.
            return;
        }
        if let Some((operation, path)) = self.activate_next_locked(&mut state, &project_id) {
            let coordinator = self.clone();
            let driver_project = project_id.clone();
            tokio::spawn(async move {
                coordinator
                    .drive_project_queue(driver_project, operation, path)
                    .await;
            });
        }
    }

    /// Runs one project's queue to exhaustion. Finishing an operation and
    /// activating the successor happen in the same lock scope, so exactly
    /// one driver exists per project at any time: intents only spawn a
    /// driver when the project had no work, and this loop only exits after
    /// observing an empty queue under the lock.
    async fn drive_project_queue(
        self,
        project_id: ProjectId,
        mut operation: QueuedOperation,
        mut path: Option<PathBuf>,
    ) {
        loop {
            let outcome = self.execute_operation(&operation, path).await;
            let next = {
                let mut state = self.state.lock().await;
                self.finish_operation_locked(&mut state, &operation, outcome);
                self.activate_next_locked(&mut state, &project_id)
            };
            match next {
                Some((next_operation, next_path)) => {
                    operation = next_operation;
                    path = next_path;
                }
                None => break,
            }
        }
    }

    fn activate_next_locked(
        &self,
        state: &mut AppState,
        project_id: &ProjectId,
    ) -> Option<(QueuedOperation, Option<PathBuf>)> {
        let operation = state.queue.next_pending_for_project(project_id)?.clone();
        let started = match operation.kind {
            OperationKind::Install => CoreEvent::InstallStarted {
                project_id: project_id.clone(),
                dependencies: vec![operation.install_request()],
            },
            OperationKind::Uninstall => CoreEvent::UninstallStarted {
                project_id: project_id.clone(),
                dependencies: vec![operation.dependency_name.clone()],
            },
        };
        self.apply_and_publish(state, started);
        let path = state.paths.path_for(project_id).cloned();
        Some((operation, path))
    }

    async fn execute_operation(
        &self,
        operation: &QueuedOperation,
        path: Option<PathBuf>,
    ) -> PackageManagerResult<OperationOutcome> {
        let path = path.ok_or_else(|| {
            PackageManagerError::ProjectPathUnknown(operation.project_id.as_str().to_owned())
        })?;
        match operation.kind {
            OperationKind::Install => {
                let requests = vec![operation.install_request()];
                self.backend.install_dependencies(&path, &requests).await?;
                let installed = self
                    .backend
                    .read_installed_dependencies(&path, &requests)
                    .await?;
                Ok(OperationOutcome::Installed(installed))
            }
            OperationKind::Uninstall => {
                let names = vec![operation.dependency_name.clone()];
                self.backend.uninstall_dependencies(&path, &names).await?;
                Ok(OperationOutcome::Uninstalled)
            }
        }
    }

    fn finish_operation_locked(
        &self,
        state: &mut AppState,
        operation: &QueuedOperation,
        outcome: PackageManagerResult<OperationOutcome>,
    ) {
        let project_id = operation.project_id.clone();
        match outcome {
            Ok(OperationOutcome::Installed(installed)) => {
                self.apply_and_publish(
                    state,
                    CoreEvent::InstallFinished {
                        project_id,
                        installed,
                    },
                );
            }
            Ok(OperationOutcome::Uninstalled) => {
                self.apply_and_publish(
                    state,
                    CoreEvent::UninstallFinished {
                        project_id,
                        dependencies: vec![operation.dependency_name.clone()],
                    },
                );
            }
            Err(error) => {
                let event = match operation.kind {
                    OperationKind::Install => {
                        tracing::error!(
                            error = %error,
                            project_id = %project_id,
                            "failed to install dependencies"
                        );
                        CoreEvent::InstallFailed {
                            project_id,
                            dependencies: vec![operation.install_request()],
                        }
                    }
                    OperationKind::Uninstall => {
                        tracing::error!(
                            error = %error,
                            project_id = %project_id,
                            "failed to uninstall dependencies"
                        );
                        CoreEvent::UninstallFailed {
                            project_id,
                            dependencies: vec![operation.dependency_name.clone()],
                        }
                    }
                };
                self.apply_and_publish(state, event);
            }
        }
    }

    async fn run_reinstall(
        &self,
        project_id: &ProjectId,
        path: Option<PathBuf>,
    ) -> PackageManagerResult<i32> {
        let path = path.ok_or_else(|| {
            PackageManagerError::ProjectPathUnknown(project_id.as_str().to_owned())
        })?;

        // The cache clear must complete before the reinstall starts; both
        // mutate the same directory.
        self.backend.clear_dependency_cache(&path).await?;

        let mut stream = self.backend.reinstall_dependencies(&path).await?;
        self.consume_reinstall_stream(&mut stream).await
    }

    /// Forwards every data message as a status-text update and returns the
    /// exit code from the terminal message. The producer keeps the channel
    /// open after its exit message; the consumer-side `close` here is what
    /// releases it.
    async fn consume_reinstall_stream(
        &self,
        stream: &mut PackageStream,
    ) -> PackageManagerResult<i32> {
        loop {
            match stream.next_message().await? {
                Some(PackageStreamMessage::Data { text }) => {
                    let mut state = self.state.lock().await;
                    self.apply_and_publish(&mut state, CoreEvent::StatusTextSet { text });
                }
                Some(PackageStreamMessage::Exit { code }) => {
                    stream.close();
                    return Ok(code);
                }
                None => {
                    return Err(PackageManagerError::Protocol(
                        "reinstall stream ended before its exit message".to_owned(),
                    ))
                }
            }
        }
    }

    fn apply_and_publish(&self, state: &mut AppState, event: CoreEvent) {
        state.apply(&event);
        self.bus.publish(event);
    }
}
