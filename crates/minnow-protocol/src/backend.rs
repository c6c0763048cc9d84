use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;

use crate::error::PackageManagerResult;
use crate::event::{DependencyRequest, PackageStreamMessage};
use crate::ids::DependencyName;

#[async_trait]
pub trait PackageStreamSubscription: Send {
    async fn next_message(&mut self) -> PackageManagerResult<Option<PackageStreamMessage>>;

    /// Consumer-driven close. The producer never terminates the channel on
    /// its own; dropping the subscription without calling this leaks the
    /// producer side until the process exits.
    fn close(&mut self);
}

pub type PackageStream = Box<dyn PackageStreamSubscription>;

#[async_trait]
pub trait PackageManagerBackend: Send + Sync {
    async fn install_dependencies(
        &self,
        path: &Path,
        dependencies: &[DependencyRequest],
    ) -> PackageManagerResult<()>;

    async fn uninstall_dependencies(
        &self,
        path: &Path,
        dependencies: &[DependencyName],
    ) -> PackageManagerResult<()>;

    /// Full reinstall of every dependency at `path`. Yields a live stream of
    /// incremental output lines terminated by an explicit exit message.
    async fn reinstall_dependencies(&self, path: &Path) -> PackageManagerResult<PackageStream>;

    /// Authoritative read-back of installed versions after an install has
    /// written to disk.
    async fn read_installed_dependencies(
        &self,
        path: &Path,
        dependencies: &[DependencyRequest],
    ) -> PackageManagerResult<BTreeMap<DependencyName, String>>;

    /// Destructive removal of the dependency cache directory. Must be awaited
    /// to completion before a reinstall proceeds.
    async fn clear_dependency_cache(&self, path: &Path) -> PackageManagerResult<()>;
}
