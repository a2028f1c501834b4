//! Starting the external package shell.

use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::config::LaunchSettings;
use crate::models::ProjectWithPackages;

/// A fully built invocation of the package-shell executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Added on top of the caller's environment.
    pub env: Vec<(String, String)>,
    /// `None` keeps the caller's working directory.
    pub current_dir: Option<PathBuf>,
}

impl ShellCommand {
    /// Builds `<package_shell> -p <pkg>... --run <interactive_shell>` for a project.
    pub fn for_project(project: &ProjectWithPackages, launch: &LaunchSettings) -> Self {
        let mut args = vec!["-p".to_string()];
        if project.packages.is_empty() {
            args.push(launch.placeholder_package.clone());
        } else {
            args.extend(project.package_names().map(str::to_string));
        }
        args.push("--run".to_string());
        args.push(launch.interactive_shell.clone());

        Self {
            program: launch.package_shell.clone(),
            args,
            env: vec![(
                launch.project_env_var.clone(),
                project.project.name.clone(),
            )],
            current_dir: project.project.path.as_ref().map(PathBuf::from),
        }
    }
}

/// Exit status of a launched shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchStatus {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl LaunchStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a [`ShellCommand`] to completion.
pub trait ProcessLauncher {
    fn run(&mut self, command: &ShellCommand) -> io::Result<LaunchStatus>;
}

/// Spawns the command with inherited stdio and blocks until it exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn run(&mut self, command: &ShellCommand) -> io::Result<LaunchStatus> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(program = %command.program, args = ?command.args, "spawning");
        let status = cmd.status()?;
        Ok(LaunchStatus {
            code: status.code(),
        })
    }
}

/// Test support: records commands instead of running them and returns `exit_code`
/// for every call. The binary always uses [`SystemLauncher`].
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    pub commands: Vec<ShellCommand>,
    pub exit_code: i32,
}

impl ProcessLauncher for RecordingLauncher {
    fn run(&mut self, command: &ShellCommand) -> io::Result<LaunchStatus> {
        self.commands.push(command.clone());
        Ok(LaunchStatus {
            code: Some(self.exit_code),
        })
    }
}
