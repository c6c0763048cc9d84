use std::collections::HashMap;
use std::path::PathBuf;

use minnow_protocol::ids::ProjectId;

use crate::events::CoreEvent;
use crate::project::{Dependency, DependencyStatus, ProjectRecord, Task};

fn tasks_from_record(record: &ProjectRecord) -> Vec<Task> {
    record
        .scripts
        .iter()
        .map(|(name, command)| Task {
            name: name.clone(),
            command: command.clone(),
        })
        .collect()
}

fn dependencies_from_record(record: &ProjectRecord) -> Vec<Dependency> {
    record
        .dependencies
        .iter()
        .map(|(name, version)| Dependency {
            name: name.clone(),
            version: version.clone(),
            status: DependencyStatus::Idle,
        })
        .collect()
}

/// Ordered task list per project, rebuilt from the raw script map whenever a
/// record enters the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TasksState {
    by_project: HashMap<ProjectId, Vec<Task>>,
    version: u64,
}

impl TasksState {
    pub fn for_project(&self, project_id: &ProjectId) -> Option<&Vec<Task>> {
        self.by_project.get(project_id)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn apply(&mut self, event: &CoreEvent) {
        match event {
            CoreEvent::ProjectsRefreshed { projects, .. } => {
                self.by_project = projects
                    .iter()
                    .map(|(id, record)| (id.clone(), tasks_from_record(record)))
                    .collect();
                self.version += 1;
            }
            CoreEvent::ProjectAdded { project, .. }
            | CoreEvent::ProjectImported { project, .. }
            | CoreEvent::ProjectSettingsSaved { project } => {
                self.by_project
                    .insert(project.id.clone(), tasks_from_record(project));
                self.version += 1;
            }
            CoreEvent::ProjectDeleted { project_id } => {
                self.by_project.remove(project_id);
                self.version += 1;
            }
            CoreEvent::StateReset => {
                self.by_project.clear();
                self.version += 1;
            }
            _ => {}
        }
    }
}

/// Ordered dependency list per project, carrying the per-dependency
/// lifecycle status the UI renders while operations are queued or running.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependenciesState {
    by_project: HashMap<ProjectId, Vec<Dependency>>,
    version: u64,
}

impl DependenciesState {
    pub fn for_project(&self, project_id: &ProjectId) -> Option<&Vec<Dependency>> {
        self.by_project.get(project_id)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn apply(&mut self, event: &CoreEvent) {
        match event {
            CoreEvent::ProjectsRefreshed { projects, .. } => {
                self.by_project = projects
                    .iter()
                    .map(|(id, record)| (id.clone(), dependencies_from_record(record)))
                    .collect();
                self.version += 1;
            }
            CoreEvent::ProjectAdded { project, .. }
            | CoreEvent::ProjectImported { project, .. } => {
                self.by_project
                    .insert(project.id.clone(), dependencies_from_record(project));
                self.version += 1;
            }
            CoreEvent::ProjectDeleted { project_id } => {
                self.by_project.remove(project_id);
                self.version += 1;
            }
            CoreEvent::StateReset => {
                self.by_project.clear();
                self.version += 1;
            }
            CoreEvent::DependencyInstallQueued {
                project_id,
                dependency,
                is_update,
            } => {
                let entries = self.by_project.entry(project_id.clone()).or_default();
                match entries.iter_mut().find(|entry| entry.name == dependency.name) {
                    Some(entry) => {
                        entry.status = if *is_update {
                            DependencyStatus::Updating
                        } else {
                            DependencyStatus::Installing
                        };
                    }
                    None => entries.push(Dependency {
                        name: dependency.name.clone(),
                        version: dependency.version.clone(),
                        status: DependencyStatus::Installing,
                    }),
                }
                self.version += 1;
            }
            CoreEvent::DependencyUninstallQueued {
                project_id,
                dependency_name,
            } => {
                if let Some(entries) = self.by_project.get_mut(project_id) {
                    if let Some(entry) =
                        entries.iter_mut().find(|entry| &entry.name == dependency_name)
                    {
                        entry.status = DependencyStatus::Deleting;
                        self.version += 1;
                    }
                }
            }
            CoreEvent::InstallFinished {
                project_id,
                installed,
            } => {
                let entries = self.by_project.entry(project_id.clone()).or_default();
                for (name, version) in installed {
                    match entries.iter_mut().find(|entry| &entry.name == name) {
                        Some(entry) => {
                            entry.version = version.clone();
                            entry.status = DependencyStatus::Idle;
                        }
                        None => entries.push(Dependency {
                            name: name.clone(),
                            version: version.clone(),
                            status: DependencyStatus::Idle,
                        }),
                    }
                }
                self.version += 1;
            }
            CoreEvent::InstallFailed {
                project_id,
                dependencies,
            } => {
                // A failed fresh install disappears; a failed update reverts
                // to the version already on disk.
                if let Some(entries) = self.by_project.get_mut(project_id) {
                    for request in dependencies {
                        if let Some(index) =
                            entries.iter().position(|entry| entry.name == request.name)
                        {
                            match entries[index].status {
                                DependencyStatus::Installing => {
                                    entries.remove(index);
                                }
                                _ => entries[index].status = DependencyStatus::Idle,
                            }
                        }
                    }
                    self.version += 1;
                }
            }
            CoreEvent::UninstallFinished {
                project_id,
                dependencies,
            } => {
                if let Some(entries) = self.by_project.get_mut(project_id) {
                    entries.retain(|entry| !dependencies.contains(&entry.name));
                    self.version += 1;
                }
            }
            CoreEvent::UninstallFailed {
                project_id,
                dependencies,
            } => {
                if let Some(entries) = self.by_project.get_mut(project_id) {
                    for name in dependencies {
                        if let Some(entry) = entries.iter_mut().find(|entry| &entry.name == name) {
                            entry.status = DependencyStatus::Idle;
                        }
                    }
                    self.version += 1;
                }
            }
            _ => {}
        }
    }
}

/// Project id to on-disk path. The read side of this slice is the path
/// lookup the orchestration process uses before invoking the package
/// manager.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathsState {
    by_project: HashMap<ProjectId, PathBuf>,
    version: u64,
}

impl PathsState {
    pub fn path_for(&self, project_id: &ProjectId) -> Option<&PathBuf> {
        self.by_project.get(project_id)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn apply(&mut self, event: &CoreEvent) {
        match event {
            CoreEvent::ProjectsRefreshed { paths, .. } => {
                self.by_project = paths.clone();
                self.version += 1;
            }
            CoreEvent::ProjectAdded { project, path, .. }
            | CoreEvent::ProjectImported { project, path, .. } => {
                self.by_project.insert(project.id.clone(), path.clone());
                self.version += 1;
            }
            CoreEvent::ProjectDeleted { project_id } => {
                self.by_project.remove(project_id);
                self.version += 1;
            }
            CoreEvent::StateReset => {
                self.by_project.clear();
                self.version += 1;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use minnow_protocol::event::DependencyRequest;
    use minnow_protocol::ids::{DependencyName, ProjectId};

    use super::{DependenciesState, PathsState, TasksState};
    use crate::events::CoreEvent;
    use crate::project::{DependencyStatus, ProjectKind, ProjectRecord};

    fn record_with(id: &str, dependencies: &[(&str, &str)], scripts: &[(&str, &str)]) -> ProjectRecord {
        ProjectRecord {
            id: ProjectId::new(id),
            name: id.to_owned(),
            kind: ProjectKind::Gatsby,
            color: "#3a6eeb".to_owned(),
            icon: "wave".to_owned(),
            created_at: 1_700_000_000_000,
            dependencies: dependencies
                .iter()
                .map(|(name, version)| (DependencyName::new(*name), (*version).to_owned()))
                .collect(),
            scripts: scripts
                .iter()
                .map(|(name, command)| ((*name).to_owned(), (*command).to_owned()))
                .collect(),
        }
    }

    fn added(record: ProjectRecord) -> CoreEvent {
        CoreEvent::ProjectAdded {
            path: format!("/projects/{}", record.id).into(),
            project: record,
            onboarding_completed: true,
        }
    }

    #[test]
    fn tasks_are_rebuilt_from_scripts_in_name_order() {
        let mut state = TasksState::default();
        state.apply(&added(record_with(
            "app",
            &[],
            &[("start", "react-scripts start"), ("build", "react-scripts build")],
        )));

        let tasks = state.for_project(&ProjectId::new("app")).expect("tasks");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "build");
        assert_eq!(tasks[1].name, "start");
    }

    #[test]
    fn queued_install_tracks_status_until_read_back() {
        let project_id = ProjectId::new("app");
        let mut state = DependenciesState::default();
        state.apply(&added(record_with("app", &[("react", "18.2.0")], &[])));

        state.apply(&CoreEvent::DependencyInstallQueued {
            project_id: project_id.clone(),
            dependency: DependencyRequest::new("lodash", "4.17.21"),
            is_update: false,
        });
        let entries = state.for_project(&project_id).expect("entries");
        let lodash = entries
            .iter()
            .find(|entry| entry.name == DependencyName::new("lodash"))
            .expect("queued entry");
        assert_eq!(lodash.status, DependencyStatus::Installing);

        let mut installed = BTreeMap::new();
        installed.insert(DependencyName::new("lodash"), "4.17.20".to_owned());
        state.apply(&CoreEvent::InstallFinished {
            project_id: project_id.clone(),
            installed,
        });
        let entries = state.for_project(&project_id).expect("entries");
        let lodash = entries
            .iter()
            .find(|entry| entry.name == DependencyName::new("lodash"))
            .expect("installed entry");
        assert_eq!(lodash.status, DependencyStatus::Idle);
        // Read-back wins over the requested version.
        assert_eq!(lodash.version, "4.17.20");
    }

    #[test]
    fn failed_fresh_install_disappears_and_failed_update_reverts() {
        let project_id = ProjectId::new("app");
        let mut state = DependenciesState::default();
        state.apply(&added(record_with("app", &[("react", "18.2.0")], &[])));

        state.apply(&CoreEvent::DependencyInstallQueued {
            project_id: project_id.clone(),
            dependency: DependencyRequest::new("lodash", "4.17.21"),
            is_update: false,
        });
        state.apply(&CoreEvent::DependencyInstallQueued {
            project_id: project_id.clone(),
            dependency: DependencyRequest::new("react", "18.3.0"),
            is_update: true,
        });

        state.apply(&CoreEvent::InstallFailed {
            project_id: project_id.clone(),
            dependencies: vec![DependencyRequest::new("lodash", "4.17.21")],
        });
        state.apply(&CoreEvent::InstallFailed {
            project_id: project_id.clone(),
            dependencies: vec![DependencyRequest::new("react", "18.3.0")],
        });

        let entries = state.for_project(&project_id).expect("entries");
        assert!(entries
            .iter()
            .all(|entry| entry.name != DependencyName::new("lodash")));
        let react = entries
            .iter()
            .find(|entry| entry.name == DependencyName::new("react"))
            .expect("react entry");
        assert_eq!(react.status, DependencyStatus::Idle);
    }

    #[test]
    fn uninstall_lifecycle_marks_then_removes_or_reverts() {
        let project_id = ProjectId::new("app");
        let mut state = DependenciesState::default();
        state.apply(&added(record_with(
            "app",
            &[("react", "18.2.0"), ("lodash", "4.17.21")],
            &[],
        )));

        state.apply(&CoreEvent::DependencyUninstallQueued {
            project_id: project_id.clone(),
            dependency_name: DependencyName::new("react"),
        });
        let entries = state.for_project(&project_id).expect("entries");
        assert_eq!(
            entries
                .iter()
                .find(|entry| entry.name == DependencyName::new("react"))
                .expect("react entry")
                .status,
            DependencyStatus::Deleting
        );

        state.apply(&CoreEvent::UninstallFailed {
            project_id: project_id.clone(),
            dependencies: vec![DependencyName::new("react")],
        });
        let entries = state.for_project(&project_id).expect("entries");
        assert_eq!(
            entries
                .iter()
                .find(|entry| entry.name == DependencyName::new("react"))
                .expect("react entry")
                .status,
            DependencyStatus::Idle
        );

        state.apply(&CoreEvent::UninstallFinished {
            project_id: project_id.clone(),
            dependencies: vec![DependencyName::new("react")],
        });
        let entries = state.for_project(&project_id).expect("entries");
        assert!(entries
            .iter()
            .all(|entry| entry.name != DependencyName::new("react")));
    }

    #[test]
    fn paths_follow_project_lifecycle() {
        let mut state = PathsState::default();
        state.apply(&added(record_with("app", &[], &[])));
        assert_eq!(
            state.path_for(&ProjectId::new("app")),
            Some(&std::path::PathBuf::from("/projects/app"))
        );

        state.apply(&CoreEvent::ProjectDeleted {
            project_id: ProjectId::new("app"),
        });
        assert_eq!(state.path_for(&ProjectId::new("app")), None);
    }
}
