use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProjectId;

pub type PackageId = i64;

/// A package attached to exactly one project.
///
/// `name` is passed verbatim to the package-shell executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub project_id: ProjectId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
