use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use minnow_protocol::event::DependencyRequest;
use minnow_protocol::ids::{DependencyName, ProjectId};
use serde::{Deserialize, Serialize};

use crate::project::ProjectRecord;

/// Every state transition and every externally visible signal in the core is
/// one of these events. Reducers consume them; the runtime publishes them on
/// the event bus after applying them to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CoreEvent {
    /// Full snapshot re-read from disk replaces the project and path maps.
    ProjectsRefreshed {
        projects: HashMap<ProjectId, ProjectRecord>,
        paths: HashMap<ProjectId, PathBuf>,
    },
    ProjectAdded {
        project: ProjectRecord,
        path: PathBuf,
        onboarding_completed: bool,
    },
    ProjectImported {
        project: ProjectRecord,
        path: PathBuf,
        onboarding_completed: bool,
    },
    ProjectSelected {
        project_id: ProjectId,
    },
    ProjectSettingsSaved {
        project: ProjectRecord,
    },
    ProjectDeleteStarted {
        project_id: ProjectId,
    },
    ProjectDeleted {
        project_id: ProjectId,
    },
    DependencyInstallQueued {
        project_id: ProjectId,
        dependency: DependencyRequest,
        is_update: bool,
    },
    DependencyUninstallQueued {
        project_id: ProjectId,
        dependency_name: DependencyName,
    },
    InstallStarted {
        project_id: ProjectId,
        dependencies: Vec<DependencyRequest>,
    },
    /// Carries the authoritative read-back from disk, never the requested
    /// versions.
    InstallFinished {
        project_id: ProjectId,
        installed: BTreeMap<DependencyName, String>,
    },
    InstallFailed {
        project_id: ProjectId,
        dependencies: Vec<DependencyRequest>,
    },
    UninstallStarted {
        project_id: ProjectId,
        dependencies: Vec<DependencyName>,
    },
    UninstallFinished {
        project_id: ProjectId,
        dependencies: Vec<DependencyName>,
    },
    UninstallFailed {
        project_id: ProjectId,
        dependencies: Vec<DependencyName>,
    },
    ReinstallStarted {
        project_id: ProjectId,
    },
    ReinstallFinished,
    ReinstallFailed {
        project_id: ProjectId,
    },
    /// Signals the surrounding system to re-read all projects from disk.
    RefreshRequested,
    StatusTextSet {
        text: String,
    },
    StatusTextReset,
    StateReset,
}

impl CoreEvent {
    /// The project an event concerns, when it concerns exactly one. Used by
    /// the event bus for per-project subscription routing.
    pub fn project_id(&self) -> Option<&ProjectId> {
        match self {
            Self::ProjectAdded { project, .. }
            | Self::ProjectImported { project, .. }
            | Self::ProjectSettingsSaved { project } => Some(&project.id),
            Self::ProjectSelected { project_id }
            | Self::ProjectDeleteStarted { project_id }
            | Self::ProjectDeleted { project_id }
            | Self::DependencyInstallQueued { project_id, .. }
            | Self::DependencyUninstallQueued { project_id, .. }
            | Self::InstallStarted { project_id, .. }
            | Self::InstallFinished { project_id, .. }
            | Self::InstallFailed { project_id, .. }
            | Self::UninstallStarted { project_id, .. }
            | Self::UninstallFinished { project_id, .. }
            | Self::UninstallFailed { project_id, .. }
            | Self::ReinstallStarted { project_id }
            | Self::ReinstallFailed { project_id } => Some(project_id),
            Self::ProjectsRefreshed { .. }
            | Self::ReinstallFinished
            | Self::RefreshRequested
            | Self::StatusTextSet { .. }
            | Self::StatusTextReset
            | Self::StateReset => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_round_trip() {
        let event = CoreEvent::DependencyInstallQueued {
            project_id: ProjectId::new("proj-1"),
            dependency: DependencyRequest::new("lodash", "4.17.21"),
            is_update: false,
        };

        let json = serde_json::to_string(&event).expect("serialize event");
        let parsed: CoreEvent = serde_json::from_str(&json).expect("deserialize event");
        assert_eq!(parsed, event);
    }

    #[test]
    fn project_id_routing_covers_per_project_events() {
        let project_id = ProjectId::new("proj-1");
        let event = CoreEvent::ReinstallStarted {
            project_id: project_id.clone(),
        };
        assert_eq!(event.project_id(), Some(&project_id));

        assert_eq!(CoreEvent::ReinstallFinished.project_id(), None);
        assert_eq!(CoreEvent::RefreshRequested.project_id(), None);
    }
}
