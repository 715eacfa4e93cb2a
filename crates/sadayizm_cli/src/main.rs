//! Command-line front end for the troll store.
//!
//! # Responsibility
//! - Verify `sadayizm_core` linkage (`ping`, `version`).
//! - Run the store self-test or dump records from a store file, without
//!   starting the HTTP server. `list` and `search` never create a store.
//!
//! Store paths ending in `.json` open the JSON file backend; anything else
//! is treated as a SQLite database.

use sadayizm_core::db::open_db;
use sadayizm_core::{
    core_version, ping, run_diagnostics, JsonFileTrollRepository, RepoError,
    SqliteTrollRepository, TrollRepository, TrollService, TrollServiceError,
};
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::process::ExitCode;

const USAGE: &str = "usage: sadayizm_cli [ping | version | diagnose <store> | list <store> | search <store> <query>]";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Ping,
    Version,
    Diagnose(String),
    List(String),
    Search { store: String, query: String },
}

#[derive(Debug)]
enum CliError {
    Usage(String),
    Store(RepoError),
    Service(TrollServiceError),
    Encode(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage(message) => write!(f, "{message}\n{USAGE}"),
            Self::Store(err) => write!(f, "failed to open store: {err}"),
            Self::Service(err) => write!(f, "store operation failed: {err}"),
            Self::Encode(err) => write!(f, "failed to encode output: {err}"),
        }
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

impl From<TrollServiceError> for CliError {
    fn from(value: TrollServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Outcome of one command: text for stdout and whether it counts as success.
struct Output {
    text: String,
    ok: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = parse_args(&args).and_then(|command| execute(&command));

    match result {
        Ok(output) => {
            println!("{}", output.text);
            if output.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}

fn parse_args(args: &[String]) -> Result<Command, CliError> {
    let words: Vec<&str> = args.iter().map(String::as_str).collect();
    match words.as_slice() {
        [] | ["ping"] => Ok(Command::Ping),
        ["version"] => Ok(Command::Version),
        ["diagnose", store] => Ok(Command::Diagnose((*store).to_string())),
        ["list", store] => Ok(Command::List((*store).to_string())),
        ["search", store, query @ ..] if !query.is_empty() => Ok(Command::Search {
            store: (*store).to_string(),
            query: query.join(" "),
        }),
        [other, ..] => Err(CliError::Usage(format!("unrecognized arguments at `{other}`"))),
    }
}

fn execute(command: &Command) -> Result<Output, CliError> {
    match command {
        Command::Ping => Ok(Output {
            text: format!("sadayizm_core ping={}", ping()),
            ok: true,
        }),
        Command::Version => Ok(Output {
            text: format!("sadayizm_core version={}", core_version()),
            ok: true,
        }),
        Command::Diagnose(store) => {
            let service = open_service(store, StoreAccess::CreateIfMissing)?;
            let report = run_diagnostics(&service);
            Ok(Output {
                text: serde_json::to_string_pretty(&report)?,
                ok: report.is_healthy(),
            })
        }
        Command::List(store) => {
            let trolls = open_service(store, StoreAccess::ExistingOnly)?.list()?;
            Ok(Output {
                text: serde_json::to_string_pretty(&trolls)?,
                ok: true,
            })
        }
        Command::Search { store, query } => {
            let trolls = open_service(store, StoreAccess::ExistingOnly)?.search(query)?;
            Ok(Output {
                text: serde_json::to_string_pretty(&trolls)?,
                ok: true,
            })
        }
    }
}

/// Whether a command may create the store it is pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreAccess {
    CreateIfMissing,
    /// Read commands refuse a missing path instead of creating an empty store.
    ExistingOnly,
}

fn open_service(
    store: &str,
    access: StoreAccess,
) -> Result<TrollService<Box<dyn TrollRepository>>, CliError> {
    let path = Path::new(store);
    if access == StoreAccess::ExistingOnly && !path.is_file() {
        return Err(CliError::Usage(format!("store `{store}` does not exist")));
    }
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let repo: Box<dyn TrollRepository> = if is_json {
        Box::new(JsonFileTrollRepository::new(path))
    } else {
        let conn = open_db(path).map_err(RepoError::from)?;
        Box::new(SqliteTrollRepository::try_new(conn)?)
    };
    Ok(TrollService::new(repo))
}
