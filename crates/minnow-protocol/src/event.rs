use serde::{Deserialize, Serialize};

use crate::ids::DependencyName;

/// A dependency paired with the version the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRequest {
    pub name: DependencyName,
    pub version: String,
}

impl DependencyRequest {
    pub fn new(name: impl Into<DependencyName>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// One message on a reinstall output stream. The producer emits zero or more
/// `Data` messages followed by exactly one `Exit`; it does not close the
/// channel afterwards, so consumers must.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PackageStreamMessage {
    Data { text: String },
    Exit { code: i32 },
}

impl PackageStreamMessage {
    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exit { .. })
    }
}
