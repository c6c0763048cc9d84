//! Pure project state for the minnow desktop tool: reducer-style slices,
//! the per-project operation queue, and the memoized selector layer that
//! joins them into consumable project views. No I/O lives here; the
//! `minnow-runtime` crate drives these reducers from its event loop.

pub mod events;
pub mod project;
pub mod selectors;
pub mod state;

pub use events::CoreEvent;
pub use project::{Dependency, DependencyStatus, Project, ProjectKind, ProjectRecord, Task};
pub use selectors::Selectors;
pub use state::AppState;
