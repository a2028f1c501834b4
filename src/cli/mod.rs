pub mod args;

use std::fmt;
use std::io::Write;

use crate::config::LaunchSettings;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::launcher::{ProcessLauncher, ShellCommand};
use crate::models::*;

pub use self::args::{Cli, Command};

/// How a command addresses a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Id(ProjectId),
    Name(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Id(id) => write!(f, "{id}"),
            Target::Name(name) => f.write_str(name),
        }
    }
}

/// Picks the project a command addresses. A non-zero `--id` wins; otherwise the
/// first positional is the project name and the rest are returned untouched.
pub fn resolve_target(
    id: Option<ProjectId>,
    mut args: Vec<String>,
) -> Result<(Target, Vec<String>)> {
    if let Some(id) = id.filter(|id| *id != 0) {
        return Ok((Target::Id(id), args));
    }
    if args.is_empty() {
        return Err(Error::Argument("project name or --id required".to_string()));
    }
    let name = args.remove(0);
    Ok((Target::Name(name), args))
}

/// Runs one parsed command against the store, writing its report to `out`.
pub struct Dispatcher<'a, L> {
    db: &'a Database,
    launch: &'a LaunchSettings,
    launcher: L,
}

impl<'a, L: ProcessLauncher> Dispatcher<'a, L> {
    pub fn new(db: &'a Database, launch: &'a LaunchSettings, launcher: L) -> Self {
        Self {
            db,
            launch,
            launcher,
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::List => self.cmd_list(out),
            Command::New { name, path } => self.cmd_new(out, name, path),
            Command::ListPackages { id, project } => {
                let (target, _) = resolve_target(id, project.into_iter().collect())?;
                self.cmd_list_packages(out, &target)
            }
            Command::AddPackage { id, args } => {
                let (target, packages) = resolve_target(id, args)?;
                self.cmd_add_packages(out, &target, &packages)
            }
            Command::RemovePackage { id, args } => {
                let (target, packages) = resolve_target(id, args)?;
                self.cmd_remove_packages(out, &target, &packages)
            }
            Command::Delete { id, project } => {
                let (target, _) = resolve_target(id, project.into_iter().collect())?;
                self.cmd_delete(out, &target)
            }
            Command::Shell { name } => self.cmd_shell(&name),
            Command::Edit {
                id,
                project,
                rename,
                path,
            } => {
                let (target, _) = resolve_target(id, project.into_iter().collect())?;
                self.cmd_edit(out, &target, UpdateProjectInput { name: rename, path })
            }
        }
    }

    fn find(&self, target: &Target) -> Result<Option<Project>> {
        let project = match target {
            Target::Id(id) => self.db.get_project(*id)?,
            Target::Name(name) => self.db.find_project_by_name(name)?,
        };
        Ok(project)
    }

    fn require(&self, target: &Target) -> Result<Project> {
        self.find(target)?
            .ok_or_else(|| Error::NotFound(target.to_string()))
    }

    fn cmd_list<W: Write>(&self, out: &mut W) -> Result<()> {
        for p in self.db.list_projects()? {
            match &p.path {
                Some(path) => writeln!(out, "{}: {} ({})", p.id, p.name, path)?,
                None => writeln!(out, "{}: {}", p.id, p.name)?,
            }
        }
        Ok(())
    }

    fn cmd_new<W: Write>(&self, out: &mut W, name: String, path: Option<String>) -> Result<()> {
        let project = self.db.create_project(CreateProjectInput { name, path })?;
        tracing::info!(id = project.id, name = %project.name, "created project");
        writeln!(out, "Created {}", project.id)?;
        Ok(())
    }

    fn cmd_list_packages<W: Write>(&self, out: &mut W, target: &Target) -> Result<()> {
        let Some(project) = self.find(target)? else {
            tracing::debug!(%target, "no such project, nothing to list");
            return Ok(());
        };
        for pkg in self.db.list_packages(project.id)? {
            writeln!(out, "{}", pkg.name)?;
        }
        Ok(())
    }

    fn cmd_add_packages<W: Write>(
        &self,
        out: &mut W,
        target: &Target,
        packages: &[String],
    ) -> Result<()> {
        if packages.is_empty() {
            return Err(Error::Argument("package name required".to_string()));
        }
        let project = self.require(target)?;
        for name in packages {
            self.db.add_package(project.id, name)?;
            writeln!(out, "Added {} to {}", name, project.id)?;
        }
        Ok(())
    }

    fn cmd_remove_packages<W: Write>(
        &self,
        out: &mut W,
        target: &Target,
        packages: &[String],
    ) -> Result<()> {
        if packages.is_empty() {
            return Err(Error::Argument("package name required".to_string()));
        }
        let project = self.require(target)?;
        for name in packages {
            if !self.db.remove_package(project.id, name)? {
                tracing::info!(project = project.id, package = %name, "package was not in project");
            }
            writeln!(out, "Removed {} from {}", name, project.id)?;
        }
        Ok(())
    }

    fn cmd_delete<W: Write>(&self, out: &mut W, target: &Target) -> Result<()> {
        let project = self.require(target)?;
        if !self.db.delete_project(project.id)? {
            return Err(Error::NotFound(target.to_string()));
        }
        tracing::info!(id = project.id, name = %project.name, "deleted project");
        writeln!(out, "Deleted {}", project.id)?;
        Ok(())
    }

    fn cmd_edit<W: Write>(
        &self,
        out: &mut W,
        target: &Target,
        input: UpdateProjectInput,
    ) -> Result<()> {
        if input.name.is_none() && input.path.is_none() {
            return Err(Error::Argument(
                "nothing to change: pass --name and/or --path".to_string(),
            ));
        }
        let project = self.require(target)?;
        let updated = self
            .db
            .update_project(project.id, input)?
            .ok_or_else(|| Error::NotFound(target.to_string()))?;
        writeln!(out, "Updated {}", updated.id)?;
        Ok(())
    }

    fn cmd_shell(&mut self, name: &str) -> Result<()> {
        let project = self
            .db
            .find_project_with_packages(name)?
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        let command = ShellCommand::for_project(&project, self.launch);
        tracing::info!(
            project = %project.project.name,
            program = %command.program,
            args = ?command.args,
            "launching project shell"
        );

        let status = self.launcher.run(&command).map_err(|source| Error::Launch {
            program: command.program.clone(),
            source,
        })?;
        if !status.success() {
            tracing::warn!(code = ?status.code, "project shell exited unsuccessfully");
        }
        Ok(())
    }
}
