#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `bak` command-line front-end for the backtrack
//! version store. It parses arguments with a [`clap`](https://docs.rs/clap/)
//! builder definition, opens a [`store::VersionStore`] rooted at the
//! selected backup directory and dispatches to one subcommand:
//!
//! | command | effect |
//! |---------|--------|
//! | `track PATH` | register a file, print its backup index |
//! | `list` | list tracked files |
//! | `create INDEX [-m MSG]` | record a new version, print its timestamp |
//! | `log INDEX` | list versions, `*` marks the active one |
//! | `restore INDEX TIMESTAMP [--force]` | rewrite the file with an earlier version |
//! | `verify INDEX [TIMESTAMP]` | replay the chain and compare checksums |
//! | `message INDEX TIMESTAMP TEXT` | replace a version's message |
//!
//! # Design
//!
//! [`run`] takes the argument list and the two output handles explicitly so
//! tests can drive the whole front-end in-process. The backup root comes
//! from `--root`, then `BAK_HOME`, then `$HOME/.local/share/backtrack`.
//!
//! # Errors
//!
//! [`run`] never panics. It returns [`EXIT_USAGE`] for argument errors,
//! [`EXIT_CONDITION`] for recoverable store conditions such as "no changes"
//! or "unsaved changes", and [`EXIT_FAILURE`] for I/O and format failures
//! or a failed verification.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["bak", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(status, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("bak "));
//! ```

mod command;
mod render;

use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgMatches;
use clap::error::ErrorKind;
use container::Compression;
use logging::{VerbosityConfig, init_tracing};
use store::{StoreConfig, StoreError, Timestamp, VersionStore};

pub use command::PROGRAM_NAME;

/// Exit status for success.
pub const EXIT_OK: i32 = 0;
/// Exit status for invalid command-line usage.
pub const EXIT_USAGE: i32 = 1;
/// Exit status for a recoverable store condition.
pub const EXIT_CONDITION: i32 = 2;
/// Exit status for I/O, format or verification failures.
pub const EXIT_FAILURE: i32 = 3;

/// Environment variable naming the backup root.
pub const ROOT_ENV: &str = "BAK_HOME";

/// Parses `arguments`, runs the selected subcommand and returns the exit status.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
    Out: Write,
    Err: Write,
{
    let matches = match command::clap_command().try_get_matches_from(arguments) {
        Ok(matches) => matches,
        Err(error) => return report_parse_error(&error, stdout, stderr),
    };
    let Some((name, sub)) = matches.subcommand() else {
        let _ = writeln!(stderr, "{PROGRAM_NAME}: a subcommand is required");
        return EXIT_USAGE;
    };

    init_tracing(VerbosityConfig::from_verbose_level(sub.get_count("verbose")));

    let Some(root) = resolve_root(sub) else {
        let _ = writeln!(
            stderr,
            "{PROGRAM_NAME}: no backup root; pass --root or set {ROOT_ENV}"
        );
        return EXIT_USAGE;
    };
    tracing::debug!(target: "backtrack::cli", root = %root.display(), command = name, "dispatching");
    let mut config = StoreConfig::new(root);
    if let Some(compression) = sub
        .get_one::<String>("compression")
        .and_then(|name| name.parse::<Compression>().ok())
    {
        config = config.with_compression(compression);
    }

    let outcome = VersionStore::open(config).and_then(|store| execute(&store, name, sub, stdout));
    match outcome {
        Ok(status) => status,
        Err(error) => {
            tracing::debug!(target: "backtrack::cli", ?error, "command failed");
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
            if error.is_condition() {
                EXIT_CONDITION
            } else {
                EXIT_FAILURE
            }
        }
    }
}

/// Converts a status returned by [`run`] into a process exit code.
#[must_use]
pub fn exit_code_from(status: i32) -> ExitCode {
    ExitCode::from(clamp_status(status))
}

fn clamp_status(status: i32) -> u8 {
    u8::try_from(status.clamp(0, i32::from(u8::MAX))).unwrap_or(u8::MAX)
}

fn report_parse_error<Out: Write, Err: Write>(
    error: &clap::Error,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32 {
    let rendered = error.render().to_string();
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = stdout.write_all(rendered.as_bytes());
            EXIT_OK
        }
        _ => {
            let _ = stderr.write_all(rendered.as_bytes());
            EXIT_USAGE
        }
    }
}

fn resolve_root(matches: &ArgMatches) -> Option<PathBuf> {
    if let Some(root) = matches.get_one::<PathBuf>("root") {
        return Some(root.clone());
    }
    if let Some(root) = env::var_os(ROOT_ENV).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(root));
    }
    env::var_os("HOME")
        .filter(|value| !value.is_empty())
        .map(|home| PathBuf::from(home).join(".local/share/backtrack"))
}

fn index(matches: &ArgMatches) -> u32 {
    matches.get_one::<u32>("index").copied().unwrap_or_default()
}

fn timestamp(matches: &ArgMatches) -> Option<Timestamp> {
    matches
        .get_one::<u64>("timestamp")
        .map(|nanos| Timestamp::from_nanos(*nanos))
}

fn execute<Out: Write>(
    store: &VersionStore,
    name: &str,
    matches: &ArgMatches,
    stdout: &mut Out,
) -> Result<i32, StoreError> {
    match name {
        "track" => {
            let path = matches.get_one::<PathBuf>("path").cloned().unwrap_or_default();
            let index = store.track(&path)?;
            writeln!(stdout, "{index}")?;
        }
        "list" => render::write_tracked(stdout, &store.tracked()?)?,
        "create" => {
            let message = matches.get_one::<String>("message").map(String::as_str);
            let created = store.create_version(index(matches), message)?;
            writeln!(stdout, "{}", created.timestamp)?;
        }
        "log" => render::write_versions(stdout, &store.versions(index(matches))?)?,
        "restore" => {
            let index = index(matches);
            let target = timestamp(matches).unwrap_or(Timestamp::from_nanos(0));
            store.restore_version(index, target, matches.get_flag("force"))?;
            writeln!(
                stdout,
                "restored backup {index} to {target} ({})",
                render::format_date(target)
            )?;
        }
        "verify" => return verify(store, index(matches), timestamp(matches), stdout),
        "message" => {
            let target = timestamp(matches).unwrap_or(Timestamp::from_nanos(0));
            let text = matches.get_one::<String>("text").map_or("", String::as_str);
            store.set_message(index(matches), target, text)?;
        }
        other => {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("unknown subcommand `{other}`"),
            )));
        }
    }
    Ok(EXIT_OK)
}

fn verify<Out: Write>(
    store: &VersionStore,
    index: u32,
    only: Option<Timestamp>,
    stdout: &mut Out,
) -> Result<i32, StoreError> {
    let targets = match only {
        Some(timestamp) => vec![timestamp],
        None => store.chain(index)?,
    };
    let mut status = EXIT_OK;
    for target in targets {
        let verdict = if store.verify(index, target)? {
            "ok"
        } else {
            status = EXIT_FAILURE;
            "MISMATCH"
        };
        writeln!(stdout, "{target} {verdict}")?;
    }
    Ok(status)
}
