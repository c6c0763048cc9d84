//! Shared contracts between the minnow state core and the package-manager
//! services that own subprocess invocation and on-disk reads.

pub mod backend;
pub mod error;
pub mod event;
pub mod ids;
