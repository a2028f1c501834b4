mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::config::Settings;
use crate::models::*;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database path has no parent directory: {}", .0.display())]
    NoParentDirectory(PathBuf),

    #[error("failed to create data directory {}: {source}", path.display())]
    DataDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to apply migration {version} ({name}): {source}")]
    Migration {
        version: &'static str,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("project {0} does not exist")]
    UnknownProject(ProjectId),
}

pub type StoreResult<T> = Result<T, StoreError>;

const PROJECT_COLUMNS: &str = "id, name, path, created_at, updated_at";
const PACKAGE_COLUMNS: &str = "id, project_id, name, created_at";

/// Single-file SQLite store for projects and their packages.
///
/// Deletes are soft: rows get a `deleted_at` stamp and disappear from every query.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::NoParentDirectory(path.to_path_buf()))?;
        std::fs::create_dir_all(parent).map_err(|source| StoreError::DataDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    /// Opens the database at the configured location.
    pub fn open_default(settings: &Settings) -> StoreResult<Self> {
        Self::open(&settings.database_path)
    }

    pub fn open_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> StoreResult<()> {
        schema::run_migrations(&self.conn)
    }

    // ============================================================
    // Project operations
    // ============================================================

    /// All live projects ordered by name, then by id.
    pub fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE deleted_at IS NULL ORDER BY name, id"
        ))?;

        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    pub fn get_project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                &format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects
                     WHERE id = ? AND deleted_at IS NULL"
                ),
                [id],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    /// Exact-name lookup. When several live projects share the name, the lowest id wins.
    pub fn find_project_by_name(&self, name: &str) -> StoreResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                &format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects
                     WHERE name = ? AND deleted_at IS NULL ORDER BY id LIMIT 1"
                ),
                [name],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    pub fn create_project(&self, input: CreateProjectInput) -> StoreResult<Project> {
        let now = Utc::now();
        let path = normalize_path(input.path);

        self.conn.execute(
            "INSERT INTO projects (name, path, created_at, updated_at) VALUES (?, ?, ?, ?)",
            (&input.name, &path, now.to_rfc3339(), now.to_rfc3339()),
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, name = %input.name, "created project");

        Ok(Project {
            id,
            name: input.name,
            path,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_project(
        &self,
        id: ProjectId,
        input: UpdateProjectInput,
    ) -> StoreResult<Option<Project>> {
        let Some(existing) = self.get_project(id)? else {
            return Ok(None);
        };

        let now = Utc::now();
        let name = input.name.unwrap_or(existing.name);
        let path = match input.path {
            Some(path) => normalize_path(Some(path)),
            None => existing.path,
        };

        self.conn.execute(
            "UPDATE projects SET name = ?, path = ?, updated_at = ? WHERE id = ?",
            (&name, &path, now.to_rfc3339(), id),
        )?;
        tracing::debug!(id, "updated project");

        Ok(Some(Project {
            id,
            name,
            path,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Soft-deletes the project. Its packages are left untouched.
    pub fn delete_project(&self, id: ProjectId) -> StoreResult<bool> {
        let now = Utc::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE projects SET deleted_at = ?1, updated_at = ?1
             WHERE id = ?2 AND deleted_at IS NULL",
            (&now, id),
        )?;
        tracing::debug!(id, deleted = rows > 0, "delete project");
        Ok(rows > 0)
    }

    pub fn get_project_with_packages(
        &self,
        id: ProjectId,
    ) -> StoreResult<Option<ProjectWithPackages>> {
        match self.get_project(id)? {
            Some(project) => self.with_packages(project).map(Some),
            None => Ok(None),
        }
    }

    pub fn find_project_with_packages(
        &self,
        name: &str,
    ) -> StoreResult<Option<ProjectWithPackages>> {
        match self.find_project_by_name(name)? {
            Some(project) => self.with_packages(project).map(Some),
            None => Ok(None),
        }
    }

    fn with_packages(&self, project: Project) -> StoreResult<ProjectWithPackages> {
        let packages = self.list_packages(project.id)?;
        Ok(ProjectWithPackages { project, packages })
    }

    // ============================================================
    // Package operations
    // ============================================================

    /// Live packages of a project in insertion order.
    pub fn list_packages(&self, project_id: ProjectId) -> StoreResult<Vec<Package>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM project_packages
             WHERE project_id = ? AND deleted_at IS NULL ORDER BY id"
        ))?;

        let packages = stmt
            .query_map([project_id], package_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(packages)
    }

    /// Attaches a package to a live project. The same name may be added more than once.
    pub fn add_package(&self, project_id: ProjectId, name: &str) -> StoreResult<Package> {
        if self.get_project(project_id)?.is_none() {
            return Err(StoreError::UnknownProject(project_id));
        }

        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO project_packages (name, project_id, created_at, updated_at)
             VALUES (?, ?, ?, ?)",
            (name, project_id, now.to_rfc3339(), now.to_rfc3339()),
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, project_id, name, "added package");

        Ok(Package {
            id,
            project_id,
            name: name.to_string(),
            created_at: now,
        })
    }

    /// Soft-deletes the oldest live package matching `project_id` and `name`.
    /// Returns `false` when nothing matched.
    pub fn remove_package(&self, project_id: ProjectId, name: &str) -> StoreResult<bool> {
        let now = Utc::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE project_packages SET deleted_at = ?1, updated_at = ?1
             WHERE id = (
                 SELECT id FROM project_packages
                 WHERE project_id = ?2 AND name = ?3 AND deleted_at IS NULL
                 ORDER BY id LIMIT 1
             )",
            (&now, project_id, name),
        )?;
        tracing::debug!(project_id, name, removed = rows > 0, "remove package");
        Ok(rows > 0)
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        path: normalize_path(row.get(2)?),
        created_at: parse_datetime(row.get(3)?),
        updated_at: parse_datetime(row.get(4)?),
    })
}

fn package_from_row(row: &Row<'_>) -> rusqlite::Result<Package> {
    Ok(Package {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        created_at: parse_datetime(row.get(3)?),
    })
}

/// The earlier tool stored "no path" as an empty string.
fn normalize_path(path: Option<String>) -> Option<String> {
    path.filter(|p| !p.is_empty())
}

/// Accepts RFC 3339 as well as the `YYYY-MM-DD HH:MM:SS.fff+ZZ:ZZ` form found in
/// databases written by the earlier tool.
fn parse_datetime(s: Option<String>) -> DateTime<Utc> {
    let Some(s) = s else {
        return DateTime::<Utc>::UNIX_EPOCH;
    };
    DateTime::parse_from_rfc3339(&s)
        .or_else(|_| DateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            tracing::warn!(value = %s, error = %e, "unreadable timestamp, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        })
}
