//! clap command definition.

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command as ClapCommand, value_parser};

/// Program name used in diagnostics and help output.
pub const PROGRAM_NAME: &str = "bak";

pub(crate) fn clap_command() -> ClapCommand {
    ClapCommand::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Versioned delta backups for individual files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("Backup root directory (defaults to $BAK_HOME, then ~/.local/share/backtrack)"),
        )
        .arg(
            Arg::new("compression")
                .long("compression")
                .value_name("ALGO")
                .value_parser(["zstd", "gzip"])
                .global(true)
                .help("Compression for newly written versions"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase diagnostic output; repeat for more"),
        )
        .subcommand(
            ClapCommand::new("track")
                .about("Start tracking a file and print its backup index")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_name("PATH")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(ClapCommand::new("list").about("List tracked files"))
        .subcommand(
            ClapCommand::new("create")
                .about("Record the current content of a tracked file as a new version")
                .arg(index_arg())
                .arg(
                    Arg::new("message")
                        .short('m')
                        .long("message")
                        .value_name("MSG")
                        .help("Message stored with the version"),
                ),
        )
        .subcommand(
            ClapCommand::new("log")
                .about("Show the versions of a tracked file")
                .arg(index_arg()),
        )
        .subcommand(
            ClapCommand::new("restore")
                .about("Rewrite a tracked file with the content of an earlier version")
                .arg(index_arg())
                .arg(timestamp_arg().required(true))
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Discard unsaved changes in the live file"),
                ),
        )
        .subcommand(
            ClapCommand::new("verify")
                .about("Replay the version chain and compare against recorded checksums")
                .arg(index_arg())
                .arg(timestamp_arg()),
        )
        .subcommand(
            ClapCommand::new("message")
                .about("Replace the message of a version")
                .arg(index_arg())
                .arg(timestamp_arg().required(true))
                .arg(Arg::new("text").required(true).value_name("MESSAGE")),
        )
}

fn index_arg() -> Arg {
    Arg::new("index")
        .required(true)
        .value_name("INDEX")
        .value_parser(value_parser!(u32))
        .help("Backup index printed by `track`")
}

fn timestamp_arg() -> Arg {
    Arg::new("timestamp")
        .value_name("TIMESTAMP")
        .value_parser(value_parser!(u64))
        .help("Version timestamp as printed by `log`")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        clap_command().debug_assert();
    }

    #[test]
    fn parses_restore_with_force() {
        let matches = clap_command()
            .try_get_matches_from(["bak", "--root", "/b", "restore", "3", "42", "--force"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "restore");
        assert_eq!(sub.get_one::<u32>("index"), Some(&3));
        assert_eq!(sub.get_one::<u64>("timestamp"), Some(&42));
        assert!(sub.get_flag("force"));
    }

    #[test]
    fn rejects_non_numeric_index() {
        let err = clap_command()
            .try_get_matches_from(["bak", "create", "notes"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
