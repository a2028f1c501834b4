use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Package;

/// Row identifier assigned by the store.
pub type ProjectId = i64;

/// A named development environment.
///
/// Names are not unique. Lookups by name resolve to the live project with the
/// lowest identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Working directory for the launched shell. `None` means the caller's directory.
    pub path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    pub path: Option<String>,
}

/// Input for updating an existing project. Fields left as `None` keep their stored value;
/// an empty `path` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub path: Option<String>,
}

/// A project with its packages in insertion order, used when launching a shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectWithPackages {
    #[serde(flatten)]
    pub project: Project,
    pub packages: Vec<Package>,
}

impl ProjectWithPackages {
    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(|p| p.name.as_str())
    }
}
