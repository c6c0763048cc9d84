use std::collections::BTreeMap;
use std::path::PathBuf;

use minnow_protocol::ids::{DependencyName, ProjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectKind {
    CreateReactApp,
    Gatsby,
}

/// The raw project record as read from disk. Essentially a database row for
/// the on-disk package manifest; the UI never consumes this directly, only
/// the joined [`Project`] view produced by the selector layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
    pub kind: ProjectKind,
    pub color: String,
    pub icon: String,
    /// Creation time in epoch milliseconds, as stamped by the disk services.
    pub created_at: u64,
    /// Raw dependency map, name to installed version.
    pub dependencies: BTreeMap<DependencyName, String>,
    /// Raw task script map, name to shell command.
    pub scripts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyStatus {
    Idle,
    Installing,
    Updating,
    Deleting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: DependencyName,
    pub version: String,
    pub status: DependencyStatus,
}

/// The consumable project view: record metadata joined with the task,
/// dependency, and path slices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub kind: ProjectKind,
    pub color: String,
    pub icon: String,
    pub created_at: u64,
    pub tasks: Vec<Task>,
    pub dependencies: Vec<Dependency>,
    pub path: Option<PathBuf>,
}
