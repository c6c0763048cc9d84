use std::sync::{Arc, Mutex};

use minnow_protocol::ids::ProjectId;

use crate::project::{Dependency, Project, ProjectRecord};
use crate::state::AppState;

/// Version counters of the four slices a project join reads. Serves as the
/// memoization key: equal versions guarantee equal join output.
type SliceVersions = (u64, u64, u64, u64);

fn slice_versions(state: &AppState) -> SliceVersions {
    (
        state.projects.version(),
        state.tasks.version(),
        state.dependencies.version(),
        state.paths.version(),
    )
}

fn join_project(state: &AppState, record: &ProjectRecord) -> Project {
    Project {
        id: record.id.clone(),
        name: record.name.clone(),
        kind: record.kind,
        color: record.color.clone(),
        icon: record.icon.clone(),
        created_at: record.created_at,
        tasks: state
            .tasks
            .for_project(&record.id)
            .cloned()
            .unwrap_or_default(),
        dependencies: state
            .dependencies
            .for_project(&record.id)
            .cloned()
            .unwrap_or_default(),
        path: state.paths.path_for(&record.id).cloned(),
    }
}

/// Memoized cross-slice joins. Repeated calls with unchanged slices return
/// the identical `Arc`, so UI layers can use pointer equality to skip
/// re-renders.
#[derive(Debug, Default)]
pub struct Selectors {
    all_projects: Mutex<Option<(SliceVersions, Arc<Vec<Project>>)>>,
    project_by_id: Mutex<Option<(ProjectId, SliceVersions, Option<Arc<Project>>)>>,
}

impl Selectors {
    /// Every project joined with its tasks, dependencies, and path, newest
    /// first. Equal creation timestamps fall back to id order so the result
    /// is stable across map iteration orders.
    pub fn all_projects(&self, state: &AppState) -> Arc<Vec<Project>> {
        let current = slice_versions(state);
        let mut cache = self
            .all_projects
            .lock()
            .expect("selector cache lock poisoned");
        if let Some((cached_versions, cached)) = cache.as_ref() {
            if *cached_versions == current {
                return Arc::clone(cached);
            }
        }

        let mut projects: Vec<Project> = state
            .projects
            .by_id()
            .values()
            .map(|record| join_project(state, record))
            .collect();
        projects.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let shared = Arc::new(projects);
        *cache = Some((current, Arc::clone(&shared)));
        shared
    }

    pub fn project_by_id(&self, state: &AppState, project_id: &ProjectId) -> Option<Arc<Project>> {
        let current = slice_versions(state);
        let mut cache = self
            .project_by_id
            .lock()
            .expect("selector cache lock poisoned");
        if let Some((cached_id, cached_versions, cached)) = cache.as_ref() {
            if cached_id == project_id && *cached_versions == current {
                return cached.clone();
            }
        }

        let joined = state
            .projects
            .record(project_id)
            .map(|record| Arc::new(join_project(state, record)));
        *cache = Some((project_id.clone(), current, joined.clone()));
        joined
    }

    pub fn selected_project(&self, state: &AppState) -> Option<Arc<Project>> {
        let selected = state.projects.selected_id()?.clone();
        self.project_by_id(state, &selected)
    }

    pub fn dependencies_for_selected(&self, state: &AppState) -> Vec<Dependency> {
        match state.projects.selected_id() {
            Some(project_id) => state
                .dependencies
                .for_project(project_id)
                .cloned()
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

pub fn blocking_status(state: &AppState) -> bool {
    state.status.blocking_action_active
}

pub fn status_text(state: &AppState) -> &str {
    &state.status.status_text
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use minnow_protocol::event::DependencyRequest;
    use minnow_protocol::ids::{DependencyName, ProjectId};

    use super::Selectors;
    use crate::events::CoreEvent;
    use crate::project::{ProjectKind, ProjectRecord};
    use crate::state::AppState;

    fn record(id: &str, created_at: u64) -> ProjectRecord {
        ProjectRecord {
            id: ProjectId::new(id),
            name: id.to_owned(),
            kind: ProjectKind::CreateReactApp,
            color: "#823aeb".to_owned(),
            icon: "fish".to_owned(),
            created_at,
            dependencies: BTreeMap::new(),
            scripts: BTreeMap::new(),
        }
    }

    fn add(state: &mut AppState, id: &str, created_at: u64) {
        state.apply(&CoreEvent::ProjectAdded {
            project: record(id, created_at),
            path: format!("/projects/{id}").into(),
            onboarding_completed: true,
        });
    }

    #[test]
    fn all_projects_is_reference_stable_until_a_slice_changes() {
        let selectors = Selectors::default();
        let mut state = AppState::default();
        add(&mut state, "app", 10);

        let first = selectors.all_projects(&state);
        let second = selectors.all_projects(&state);
        assert!(Arc::ptr_eq(&first, &second));

        state.apply(&CoreEvent::DependencyInstallQueued {
            project_id: ProjectId::new("app"),
            dependency: DependencyRequest::new("lodash", "4.17.21"),
            is_update: false,
        });
        let third = selectors.all_projects(&state);
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(third[0].dependencies.len(), 1);
    }

    #[test]
    fn selection_moves_do_not_invalidate_the_project_list() {
        let selectors = Selectors::default();
        let mut state = AppState::default();
        add(&mut state, "a", 10);
        add(&mut state, "b", 20);

        let before = selectors.all_projects(&state);
        state.apply(&CoreEvent::ProjectSelected {
            project_id: ProjectId::new("a"),
        });
        let after = selectors.all_projects(&state);
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn projects_sort_newest_first_with_stable_tie_order() {
        let selectors = Selectors::default();
        let mut state = AppState::default();
        add(&mut state, "older", 10);
        add(&mut state, "newer", 30);
        add(&mut state, "tie-b", 20);
        add(&mut state, "tie-a", 20);

        let projects = selectors.all_projects(&state);
        let ids: Vec<&str> = projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "tie-a", "tie-b", "older"]);
    }

    #[test]
    fn project_by_id_joins_all_slices_and_misses_on_absent_ids() {
        let selectors = Selectors::default();
        let mut state = AppState::default();
        let mut with_script = record("app", 10);
        with_script
            .scripts
            .insert("start".to_owned(), "react-scripts start".to_owned());
        with_script
            .dependencies
            .insert(DependencyName::new("react"), "18.2.0".to_owned());
        state.apply(&CoreEvent::ProjectAdded {
            project: with_script,
            path: "/projects/app".into(),
            onboarding_completed: true,
        });

        let project = selectors
            .project_by_id(&state, &ProjectId::new("app"))
            .expect("project view");
        assert_eq!(project.tasks.len(), 1);
        assert_eq!(project.dependencies.len(), 1);
        assert_eq!(
            project.path.as_deref(),
            Some(std::path::Path::new("/projects/app"))
        );

        assert!(selectors
            .project_by_id(&state, &ProjectId::new("missing"))
            .is_none());
    }

    #[test]
    fn selected_project_follows_the_selection_pointer() {
        let selectors = Selectors::default();
        let mut state = AppState::default();
        assert!(selectors.selected_project(&state).is_none());
        assert!(selectors.dependencies_for_selected(&state).is_empty());

        add(&mut state, "app", 10);
        state.apply(&CoreEvent::DependencyInstallQueued {
            project_id: ProjectId::new("app"),
            dependency: DependencyRequest::new("lodash", "4.17.21"),
            is_update: false,
        });

        let selected = selectors.selected_project(&state).expect("selected");
        assert_eq!(selected.id, ProjectId::new("app"));
        assert_eq!(selectors.dependencies_for_selected(&state).len(), 1);
    }
}
