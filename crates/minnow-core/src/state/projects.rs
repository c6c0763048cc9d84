use std::collections::HashMap;

use minnow_protocol::ids::ProjectId;

use crate::events::CoreEvent;
use crate::project::ProjectRecord;

/// The derived state store: project records by id plus the selection pointer.
/// Mutated only through [`ProjectsState::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectsState {
    by_id: HashMap<ProjectId, ProjectRecord>,
    selected_id: Option<ProjectId>,
    version: u64,
}

impl ProjectsState {
    pub fn by_id(&self) -> &HashMap<ProjectId, ProjectRecord> {
        &self.by_id
    }

    pub fn record(&self, project_id: &ProjectId) -> Option<&ProjectRecord> {
        self.by_id.get(project_id)
    }

    pub fn selected_id(&self) -> Option<&ProjectId> {
        self.selected_id.as_ref()
    }

    /// Bumped whenever the record map changes. Selection moves do not count:
    /// the selection pointer is not an input to the project join.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn apply(&mut self, event: &CoreEvent) {
        match event {
            CoreEvent::ProjectsRefreshed { projects, .. } => {
                self.by_id = projects.clone();
                // The selected project may no longer exist on disk (the user
                // deleted the folder and refreshed). Un-select it then.
                if let Some(selected) = &self.selected_id {
                    if !self.by_id.contains_key(selected) {
                        self.selected_id = None;
                    }
                }
                self.version += 1;
            }
            CoreEvent::ProjectAdded {
                project,
                onboarding_completed,
                ..
            }
            | CoreEvent::ProjectImported {
                project,
                onboarding_completed,
                ..
            } => {
                // A new project is generally selected right away. The only
                // exception is onboarding, where the user should click the
                // icon themselves.
                self.selected_id = onboarding_completed.then(|| project.id.clone());
                self.by_id.insert(project.id.clone(), project.clone());
                self.version += 1;
            }
            CoreEvent::InstallFinished {
                project_id,
                installed,
            } => {
                if let Some(record) = self.by_id.get_mut(project_id) {
                    for (name, version) in installed {
                        record
                            .dependencies
                            .insert(name.clone(), version.clone());
                    }
                    self.version += 1;
                }
            }
            CoreEvent::ProjectDeleted { project_id } => {
                self.by_id.remove(project_id);
                // Only the currently selected project can be deleted today;
                // the condition guards against future changes.
                if self.selected_id.as_ref() == Some(project_id) {
                    self.selected_id = None;
                }
                self.version += 1;
            }
            CoreEvent::ProjectSettingsSaved { project } => {
                self.selected_id = Some(project.id.clone());
                self.by_id.insert(project.id.clone(), project.clone());
                self.version += 1;
            }
            CoreEvent::ProjectSelected { project_id } => {
                self.selected_id = Some(project_id.clone());
            }
            CoreEvent::StateReset => {
                let version = self.version + 1;
                *self = Self::default();
                self.version = version;
            }
            _ => {}
        }
    }
}
