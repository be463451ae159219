//! Command-line front end.
//!
//! [`run`] parses the arguments, drives one dispatch through a
//! [`RunnerClient`] and writes the outcome. It takes its IO handles as
//! parameters so tests can capture both streams.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;
use serde_json::{Map, Value};

use crate::args::JobArgs;
use crate::auth::Credentials;
use crate::config::parse_seconds;
use crate::docs::{lookup_docs, render_docs};
use crate::error::{ArgumentError, DocError, Error};
use crate::functions::FunctionDoc;
use crate::job::{JobHandle, JobOutcome};
use crate::output::{self, OutputFormat};
use crate::runner::RunnerClient;

pub const EX_OK: u8 = 0;
pub const EX_GENERIC: u8 = 1;
pub const EX_USAGE: u8 = 64;
pub const EX_CONFIG: u8 = 78;

/// Run named functions and wait for their results.
#[derive(Parser, Debug)]
#[command(name = "jobrun", version)]
pub struct Cli {
    /// Show documentation for all functions, one module or one function.
    #[arg(short = 'd', long = "doc", visible_alias = "documentation")]
    pub doc: bool,

    /// External authentication backend (`auto` tries each one).
    #[arg(
        short = 'a',
        long = "eauth",
        visible_aliases = ["auth", "external-auth"],
        value_name = "BACKEND",
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub eauth: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Seconds to wait for the job before giving up on it.
    #[arg(short = 't', long, value_name = "SECONDS", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// How results are printed.
    #[arg(long = "out", value_enum, default_value_t = OutputFormat::Nested)]
    pub out: OutputFormat,

    /// The function to run, for example `test.arg`.
    #[arg(value_name = "FUNCTION")]
    pub function: Option<String>,

    /// Positional (`value`) and keyword (`key=value`) arguments.
    #[arg(
        value_name = "ARG",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub arguments: Vec<String>,
}

fn parse_timeout(raw: &str) -> Result<Duration, ArgumentError> {
    parse_seconds("--timeout", raw).map_err(|_| ArgumentError::InvalidTimeout {
        value: raw.to_string(),
    })
}

/// Parse `args` and run one invocation against `client`.
pub async fn run<I, T, W, E>(
    args: I,
    client: &RunnerClient,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = write!(stdout, "{e}");
                    ExitCode::from(EX_OK)
                }
                _ => {
                    let _ = write!(stderr, "{e}");
                    ExitCode::from(EX_USAGE)
                }
            };
        }
    };

    if cli.doc {
        return show_docs(&cli, client, stdout, stderr);
    }

    let credentials = match credentials(&cli, client) {
        Ok(credentials) => credentials,
        Err(Error::Argument(e)) => {
            let _ = writeln!(stderr, "{e}");
            return ExitCode::from(EX_USAGE);
        }
        Err(e) => {
            let _ = writeln!(stdout, "{e}");
            return ExitCode::from(EX_GENERIC);
        }
    };

    let Some(function) = cli.function.as_deref() else {
        let _ = writeln!(stderr, "Usage: jobrun [OPTIONS] FUNCTION [ARG]...");
        let _ = writeln!(stderr, "Try 'jobrun --help' or 'jobrun -d' for more information.");
        return ExitCode::from(EX_OK);
    };

    let args = JobArgs::from_tokens(&cli.arguments);
    let handle = match client
        .start(function, args, credentials.as_ref(), cli.timeout)
        .await
    {
        Ok(handle) => handle,
        Err(e) => {
            let _ = writeln!(stdout, "{e}");
            return ExitCode::from(EX_GENERIC);
        }
    };

    let timeout = client.effective_timeout(cli.timeout);
    let outcome = tokio::select! {
        outcome = client.wait(&handle, timeout) => outcome,
        Ok(()) = tokio::signal::ctrl_c() => {
            interrupted(&handle, stderr);
            return ExitCode::from(EX_GENERIC);
        }
    };
    print_outcome(outcome, cli.out, stdout)
}

/// Credentials from the eauth flags, if any were given. The backend name is
/// checked before the username and password so a misspelt backend is
/// reported as such.
fn credentials(cli: &Cli, client: &RunnerClient) -> Result<Option<Credentials>, Error> {
    let Some(backend) = cli.eauth.as_deref() else {
        return Ok(None);
    };
    client.auth().check_backend(backend)?;
    if cli.function.is_none() {
        return Err(ArgumentError::MissingFunction.into());
    }
    let username = cli
        .username
        .as_deref()
        .ok_or(ArgumentError::MissingCredential { flag: "username" })?;
    let password = cli
        .password
        .as_deref()
        .ok_or(ArgumentError::MissingCredential { flag: "password" })?;
    Ok(Some(Credentials::new(backend, username, password)))
}

fn show_docs<W: Write, E: Write>(
    cli: &Cli,
    client: &RunnerClient,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode {
    let names: Vec<&str> = cli
        .function
        .iter()
        .chain(cli.arguments.iter())
        .map(String::as_str)
        .collect();
    match lookup_docs(client.registry(), &names) {
        Ok(docs) => {
            let _ = match cli.out {
                OutputFormat::Nested => write!(stdout, "{}", render_docs(&docs)),
                OutputFormat::Json => write_lines(stdout, &docs_value(&docs), cli.out),
            };
            ExitCode::from(EX_OK)
        }
        Err(e @ DocError::TooManyArguments { .. }) => {
            let _ = writeln!(stderr, "{e}");
            ExitCode::from(EX_USAGE)
        }
        Err(e) => {
            let _ = writeln!(stdout, "{e}");
            ExitCode::from(EX_GENERIC)
        }
    }
}

fn docs_value(docs: &[FunctionDoc]) -> Value {
    let map: Map<String, Value> = docs
        .iter()
        .map(|doc| (doc.name.clone(), Value::String(doc.summary.clone())))
        .collect();
    Value::Object(map)
}

fn print_outcome<W: Write>(outcome: JobOutcome, format: OutputFormat, stdout: &mut W) -> ExitCode {
    match outcome {
        JobOutcome::Completed(value) => {
            let _ = write_lines(stdout, &value, format);
            ExitCode::from(EX_OK)
        }
        // Giving up on the wait is still a normal round trip.
        JobOutcome::TimedOut(e) => {
            let _ = writeln!(stdout, "{e}");
            ExitCode::from(EX_OK)
        }
        JobOutcome::Failed(reason) => {
            let _ = writeln!(stdout, "{reason}");
            ExitCode::from(EX_GENERIC)
        }
    }
}

fn write_lines<W: Write>(stdout: &mut W, value: &Value, format: OutputFormat) -> std::io::Result<()> {
    for line in output::render(value, format) {
        writeln!(stdout, "{line}")?;
    }
    Ok(())
}

fn interrupted<E: Write>(handle: &JobHandle, stderr: &mut E) {
    tracing::info!(job_id = %handle.job_id, "Wait interrupted");
    let _ = writeln!(stderr, "Exiting gracefully on Ctrl-c");
    let _ = writeln!(stderr, "This job's jid is: {}", handle.job_id);
    let _ = writeln!(
        stderr,
        "The job may still be running; check its result later with: jobrun jobs.lookup_jid {}",
        handle.job_id
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn eauth_aliases() {
        for flag in ["-a", "--eauth", "--auth", "--external-auth"] {
            let cli = Cli::try_parse_from(["jobrun", flag, "pam", "test.arg"]).unwrap();
            assert_eq!(cli.eauth.as_deref(), Some("pam"));
            assert_eq!(cli.function.as_deref(), Some("test.arg"));
        }
    }

    #[test]
    fn eauth_without_value_is_empty_backend() {
        let cli = Cli::try_parse_from(["jobrun", "--username", "saltdev", "--eauth"]).unwrap();
        assert_eq!(cli.eauth.as_deref(), Some(""));
        assert_eq!(cli.function, None);
    }

    #[test]
    fn trailing_arguments_keep_hyphens_and_equals() {
        let cli = Cli::try_parse_from(["jobrun", "test.arg", "-x", "pip==1.1", "a=b"]).unwrap();
        assert_eq!(cli.arguments, vec!["-x", "pip==1.1", "a=b"]);
    }

    #[test]
    fn timeout_parsing() {
        let cli = Cli::try_parse_from(["jobrun", "--timeout=1.5", "test.arg"]).unwrap();
        assert_eq!(cli.timeout, Some(Duration::from_millis(1500)));
        assert!(Cli::try_parse_from(["jobrun", "--timeout=-1", "test.arg"]).is_err());
        assert!(Cli::try_parse_from(["jobrun", "--timeout=soon", "test.arg"]).is_err());
    }

    #[test]
    fn out_format() {
        let cli = Cli::try_parse_from(["jobrun", "--out", "json", "test.arg"]).unwrap();
        assert_eq!(cli.out, OutputFormat::Json);
        let cli = Cli::try_parse_from(["jobrun", "test.arg"]).unwrap();
        assert_eq!(cli.out, OutputFormat::Nested);
    }
}
