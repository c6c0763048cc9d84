use std::collections::{HashMap, VecDeque};

use minnow_protocol::event::DependencyRequest;
use minnow_protocol::ids::{DependencyName, ProjectId};
use serde::{Deserialize, Serialize};

use crate::events::CoreEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Install,
    Uninstall,
}

/// A pending dependency operation awaiting execution for one project.
/// Updates travel as installs with `is_update` set, so the queue knows only
/// two operation kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub project_id: ProjectId,
    pub kind: OperationKind,
    pub dependency_name: DependencyName,
    pub version: Option<String>,
    pub is_update: bool,
}

impl QueuedOperation {
    pub fn install_request(&self) -> DependencyRequest {
        DependencyRequest {
            name: self.dependency_name.clone(),
            version: self.version.clone().unwrap_or_default(),
        }
    }
}

/// Per-project FIFO of pending operations plus an explicit active marker.
/// The `active` map being keyed by project id is what makes
/// at-most-one-active-operation-per-project structural rather than checked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationQueueState {
    pending: HashMap<ProjectId, VecDeque<QueuedOperation>>,
    active: HashMap<ProjectId, QueuedOperation>,
}

impl OperationQueueState {
    pub fn apply(&mut self, event: &CoreEvent) {
        match event {
            CoreEvent::DependencyInstallQueued {
                project_id,
                dependency,
                is_update,
            } => self.enqueue(QueuedOperation {
                project_id: project_id.clone(),
                kind: OperationKind::Install,
                dependency_name: dependency.name.clone(),
                version: Some(dependency.version.clone()),
                is_update: *is_update,
            }),
            CoreEvent::DependencyUninstallQueued {
                project_id,
                dependency_name,
            } => self.enqueue(QueuedOperation {
                project_id: project_id.clone(),
                kind: OperationKind::Uninstall,
                dependency_name: dependency_name.clone(),
                version: None,
                is_update: false,
            }),
            CoreEvent::InstallStarted { project_id, .. }
            | CoreEvent::UninstallStarted { project_id, .. } => self.activate_next(project_id),
            CoreEvent::InstallFinished { project_id, .. }
            | CoreEvent::InstallFailed { project_id, .. }
            | CoreEvent::UninstallFinished { project_id, .. }
            | CoreEvent::UninstallFailed { project_id, .. } => {
                self.release_active(project_id);
            }
            CoreEvent::StateReset => self.clear(),
            _ => {}
        }
    }

    pub fn next_pending_for_project(&self, project_id: &ProjectId) -> Option<&QueuedOperation> {
        self.pending.get(project_id).and_then(VecDeque::front)
    }

    pub fn active_for_project(&self, project_id: &ProjectId) -> Option<&QueuedOperation> {
        self.active.get(project_id)
    }

    pub fn pending_len(&self, project_id: &ProjectId) -> usize {
        self.pending.get(project_id).map_or(0, VecDeque::len)
    }

    /// Whether anything is queued or in flight for the project. This is the
    /// check the intent handlers make before starting the next operation.
    pub fn has_work(&self, project_id: &ProjectId) -> bool {
        self.active.contains_key(project_id) || self.pending_len(project_id) > 0
    }

    pub fn enqueue(&mut self, operation: QueuedOperation) {
        self.pending
            .entry(operation.project_id.clone())
            .or_default()
            .push_back(operation);
    }

    /// Moves the head of the pending queue into the active slot. No-op when
    /// nothing is pending or an operation is already active.
    pub fn activate_next(&mut self, project_id: &ProjectId) {
        if self.active.contains_key(project_id) {
            return;
        }
        let Some(queue) = self.pending.get_mut(project_id) else {
            return;
        };
        if let Some(operation) = queue.pop_front() {
            self.active.insert(project_id.clone(), operation);
        }
        if queue.is_empty() {
            self.pending.remove(project_id);
        }
    }

    pub fn release_active(&mut self, project_id: &ProjectId) -> Option<QueuedOperation> {
        self.active.remove(project_id)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.active.clear();
    }
}
