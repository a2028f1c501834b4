//! Dispatcher tests.
//!
//! Commands are parsed with the real argument parser and run against an
//! in-memory database; the shell command goes to a recording launcher.

use std::path::PathBuf;

use clap::Parser;
use nix_go::cli::{resolve_target, Cli, Dispatcher, Target};
use nix_go::config::LaunchSettings;
use nix_go::db::Database;
use nix_go::launcher::RecordingLauncher;
use nix_go::Error;

fn setup() -> Database {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    db
}

/// Parse `args` and run them, returning stdout.
fn run(
    dispatcher: &mut Dispatcher<'_, RecordingLauncher>,
    args: &[&str],
) -> Result<String, Error> {
    let cli = Cli::try_parse_from(std::iter::once("nix-go").chain(args.iter().copied()))
        .expect("Failed to parse arguments");
    let mut out = Vec::new();
    dispatcher.execute(cli.command, &mut out)?;
    Ok(String::from_utf8(out).expect("Output was not UTF-8"))
}

fn ok(dispatcher: &mut Dispatcher<'_, RecordingLauncher>, args: &[&str]) -> String {
    run(dispatcher, args).expect("Command failed")
}

mod list {
    use super::*;

    #[test]
    fn prints_nothing_for_an_empty_store() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        assert_eq!(ok(&mut d, &["list"]), "");
    }

    #[test]
    fn prints_path_when_set() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "web", "--path", "/srv/web"]);
        ok(&mut d, &["new", "api"]);

        assert_eq!(ok(&mut d, &["ls"]), "2: api\n1: web (/srv/web)\n");
    }

    #[test]
    fn accepts_short_alias() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo"]);
        assert_eq!(ok(&mut d, &["l"]), "1: demo\n");
    }
}

mod new {
    use super::*;

    #[test]
    fn reports_created_id() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        assert_eq!(ok(&mut d, &["new", "demo", "--path", "/tmp/demo"]), "Created 1\n");
        assert_eq!(ok(&mut d, &["new", "other"]), "Created 2\n");
    }

    #[test]
    fn allows_duplicate_names() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        assert_eq!(ok(&mut d, &["new", "x"]), "Created 1\n");
        assert_eq!(ok(&mut d, &["new", "x"]), "Created 2\n");
    }
}

mod packages {
    use super::*;

    #[test]
    fn add_and_list_by_id() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo"]);
        assert_eq!(
            ok(&mut d, &["add-package", "--id", "1", "hello", "cowsay"]),
            "Added hello to 1\nAdded cowsay to 1\n"
        );
        assert_eq!(ok(&mut d, &["list-packages", "--id", "1"]), "hello\ncowsay\n");
    }

    #[test]
    fn add_and_list_by_name() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo"]);
        assert_eq!(ok(&mut d, &["ap", "demo", "ripgrep"]), "Added ripgrep to 1\n");
        assert_eq!(ok(&mut d, &["lp", "demo"]), "ripgrep\n");
    }

    #[test]
    fn zero_id_falls_back_to_name() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo"]);
        assert_eq!(
            ok(&mut d, &["add-package", "--id", "0", "demo", "jq"]),
            "Added jq to 1\n"
        );
    }

    #[test]
    fn remove_reports_each_package() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo"]);
        ok(&mut d, &["ap", "--id", "1", "hello", "cowsay", "jq"]);

        assert_eq!(
            ok(&mut d, &["remove-package", "demo", "hello", "jq"]),
            "Removed hello from 1\nRemoved jq from 1\n"
        );
        assert_eq!(ok(&mut d, &["lp", "--id", "1"]), "cowsay\n");
    }

    #[test]
    fn removing_an_absent_package_is_a_no_op() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo"]);
        ok(&mut d, &["ap", "demo", "hello"]);

        assert_eq!(ok(&mut d, &["rp", "demo", "nope"]), "Removed nope from 1\n");
        assert_eq!(ok(&mut d, &["lp", "demo"]), "hello\n");
    }

    #[test]
    fn listing_an_unknown_project_is_empty() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        assert_eq!(ok(&mut d, &["lp", "--id", "7"]), "");
        assert_eq!(ok(&mut d, &["lp", "ghost"]), "");
    }

    #[test]
    fn adding_to_an_unknown_project_fails() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        let err = run(&mut d, &["ap", "--id", "7", "hello"]).unwrap_err();
        assert!(matches!(err, Error::NotFound(ref t) if t == "7"));

        let err = run(&mut d, &["ap", "ghost", "hello"]).unwrap_err();
        assert_eq!(err.to_string(), "cannot find project: ghost");
    }

    #[test]
    fn package_names_are_required() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo"]);
        assert!(matches!(run(&mut d, &["ap", "demo"]), Err(Error::Argument(_))));
        assert!(matches!(run(&mut d, &["rp", "--id", "1"]), Err(Error::Argument(_))));
        assert!(matches!(run(&mut d, &["ap"]), Err(Error::Argument(_))));
    }

    #[test]
    fn non_numeric_id_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["nix-go", "lp", "--id", "abc"]).is_err());
        assert!(Cli::try_parse_from(["nix-go", "lp", "--id", "-3"]).is_err());
    }
}

mod delete {
    use super::*;

    #[test]
    fn deletes_by_id() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo"]);
        assert_eq!(ok(&mut d, &["delete", "--id", "1"]), "Deleted 1\n");
        assert_eq!(ok(&mut d, &["list"]), "");
    }

    #[test]
    fn deletes_lowest_id_among_duplicates() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "x"]);
        ok(&mut d, &["new", "x"]);

        assert_eq!(ok(&mut d, &["rm", "x"]), "Deleted 1\n");
        assert_eq!(ok(&mut d, &["list"]), "2: x\n");
    }

    #[test]
    fn deleted_project_behaves_as_not_found() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo"]);
        ok(&mut d, &["ap", "demo", "hello"]);
        ok(&mut d, &["del", "--id", "1"]);

        assert!(matches!(run(&mut d, &["delete", "--id", "1"]), Err(Error::NotFound(_))));
        assert!(matches!(run(&mut d, &["ap", "--id", "1", "jq"]), Err(Error::NotFound(_))));
        assert!(matches!(run(&mut d, &["rp", "--id", "1", "hello"]), Err(Error::NotFound(_))));
        assert!(matches!(run(&mut d, &["shell", "demo"]), Err(Error::NotFound(_))));
        assert_eq!(ok(&mut d, &["lp", "--id", "1"]), "");
    }

    #[test]
    fn missing_project_is_fatal() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        let err = run(&mut d, &["remove", "ghost"]).unwrap_err();
        assert_eq!(err.to_string(), "cannot find project: ghost");
    }
}

mod edit {
    use super::*;

    #[test]
    fn renames_and_keeps_path() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo", "--path", "/tmp/demo"]);
        assert_eq!(ok(&mut d, &["edit", "demo", "--name", "web"]), "Updated 1\n");
        assert_eq!(ok(&mut d, &["list"]), "1: web (/tmp/demo)\n");
    }

    #[test]
    fn clears_path() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo", "--path", "/tmp/demo"]);
        ok(&mut d, &["e", "--id", "1", "--path", ""]);
        assert_eq!(ok(&mut d, &["list"]), "1: demo\n");
    }

    #[test]
    fn missing_project_is_fatal() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        let err = run(&mut d, &["edit", "ghost", "--name", "y"]).unwrap_err();
        assert!(matches!(err, Error::NotFound(ref t) if t == "ghost"));
        assert!(matches!(
            run(&mut d, &["edit", "--id", "3", "--name", "y"]),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn requires_a_change() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo"]);
        assert!(matches!(run(&mut d, &["edit", "demo"]), Err(Error::Argument(_))));
    }
}

mod shell {
    use std::io;

    use nix_go::launcher::{LaunchStatus, ProcessLauncher, ShellCommand};

    use super::*;

    #[test]
    fn launches_with_project_packages_and_path() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo", "--path", "/tmp/demo"]);
        ok(&mut d, &["add-package", "--id", "1", "hello", "cowsay"]);

        assert_eq!(ok(&mut d, &["shell", "demo"]), "");

        let commands = &d.launcher().commands;
        assert_eq!(commands.len(), 1);
        let cmd = &commands[0];
        assert_eq!(cmd.program, "nix-shell");
        assert_eq!(cmd.args, ["-p", "hello", "cowsay", "--run", "zsh"]);
        assert_eq!(cmd.env, [("NIX_ENV".to_string(), "demo".to_string())]);
        assert_eq!(cmd.current_dir, Some(PathBuf::from("/tmp/demo")));
    }

    #[test]
    fn empty_project_uses_placeholder() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "bare"]);
        ok(&mut d, &["go", "bare"]);

        let cmd = &d.launcher().commands[0];
        assert_eq!(cmd.args, ["-p", "hello", "--run", "zsh"]);
        assert_eq!(cmd.current_dir, None);
    }

    #[test]
    fn uses_configured_shell() {
        let db = setup();
        let launch = LaunchSettings {
            interactive_shell: "bash".to_string(),
            ..LaunchSettings::default()
        };
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        ok(&mut d, &["new", "demo"]);
        ok(&mut d, &["run", "demo"]);

        assert_eq!(d.launcher().commands[0].args, ["-p", "hello", "--run", "bash"]);
    }

    #[test]
    fn failed_shell_exit_is_not_fatal() {
        let db = setup();
        let launch = LaunchSettings::default();
        let launcher = RecordingLauncher {
            exit_code: 1,
            ..RecordingLauncher::default()
        };
        let mut d = Dispatcher::new(&db, &launch, launcher);

        ok(&mut d, &["new", "demo"]);
        assert!(run(&mut d, &["shell", "demo"]).is_ok());
    }

    /// Fails every spawn the way a missing executable does.
    struct MissingExecutable;

    impl ProcessLauncher for MissingExecutable {
        fn run(&mut self, _command: &ShellCommand) -> io::Result<LaunchStatus> {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }
    }

    #[test]
    fn spawn_failure_is_fatal() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, MissingExecutable);

        let cli = Cli::try_parse_from(["nix-go", "new", "demo"]).expect("Failed to parse");
        d.execute(cli.command, &mut Vec::new()).expect("Failed to create");

        let cli = Cli::try_parse_from(["nix-go", "shell", "demo"]).expect("Failed to parse");
        let err = d.execute(cli.command, &mut Vec::new()).unwrap_err();
        match err {
            Error::Launch { program, source } => {
                assert_eq!(program, "nix-shell");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected launch error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_project_is_fatal_and_launches_nothing() {
        let db = setup();
        let launch = LaunchSettings::default();
        let mut d = Dispatcher::new(&db, &launch, RecordingLauncher::default());

        let err = run(&mut d, &["shell", "ghost"]).unwrap_err();
        assert_eq!(err.to_string(), "cannot find project: ghost");
        assert!(d.launcher().commands.is_empty());
    }
}

mod resolution {
    use super::*;

    #[test]
    fn explicit_id_keeps_all_positionals() {
        let (target, rest) = resolve_target(Some(4), vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(target, Target::Id(4));
        assert_eq!(rest, ["a", "b"]);
    }

    #[test]
    fn name_consumes_first_positional() {
        let (target, rest) = resolve_target(None, vec!["demo".into(), "jq".into()]).unwrap();
        assert_eq!(target, Target::Name("demo".to_string()));
        assert_eq!(rest, ["jq"]);
    }

    #[test]
    fn nothing_to_resolve_is_an_argument_error() {
        assert!(matches!(resolve_target(Some(0), vec![]), Err(Error::Argument(_))));
    }
}
