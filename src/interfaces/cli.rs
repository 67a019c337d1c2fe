//! Command-line front end.
//!
//! Usage: `apsflow <command> [args...]`

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::application::{TracingProgress, TypeParametersUseCase};
use crate::domain::acc::FileRef;
use crate::domain::error::{AppError, Result};
use crate::domain::job::{IfcExportJob, TypeParametersJob};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::ConfigService;
use crate::interfaces::http::start_server;

pub const USAGE: &str = "\
Usage: apsflow <command> [args...]

Commands:
  add-parameters <job.json>        Add type parameters to a Revit model in ACC
  export-ifc <job.json>            Export views of a Revit model in ACC to IFC
  preview <job.json>               Print the grouped parameter configuration
  views <project_id> <item_id>     List view names available for IFC export
  viewables <project_id> <item_id> List viewables of the latest version
  inspect <project_id> <item_id>   Show manifest status and Revit version
  serve                            Run the local HTTP API
  token set <token>                Store the APS access token in the keyring
  token clear                      Remove the stored access token
  help                             Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddParameters(PathBuf),
    ExportIfc(PathBuf),
    Preview(PathBuf),
    Views(FileArgs),
    Viewables(FileArgs),
    Inspect(FileArgs),
    Serve,
    TokenSet(String),
    TokenClear,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArgs {
    pub project_id: String,
    pub item_id: String,
}

impl From<FileArgs> for FileRef {
    fn from(args: FileArgs) -> Self {
        FileRef {
            project_id: args.project_id,
            item_id: args.item_id,
        }
    }
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some(first) = args.first() else {
            return Ok(Command::Help);
        };
        let rest = &args[1..];

        match first.as_str() {
            "add-parameters" => Ok(Command::AddParameters(single_path(first, rest)?)),
            "export-ifc" => Ok(Command::ExportIfc(single_path(first, rest)?)),
            "preview" => Ok(Command::Preview(single_path(first, rest)?)),
            "views" => Ok(Command::Views(file_args(first, rest)?)),
            "viewables" => Ok(Command::Viewables(file_args(first, rest)?)),
            "inspect" => Ok(Command::Inspect(file_args(first, rest)?)),
            "serve" => Ok(Command::Serve),
            "token" => match rest {
                [action, token] if action == "set" => Ok(Command::TokenSet(token.clone())),
                [action] if action == "clear" => Ok(Command::TokenClear),
                _ => Err(AppError::ValidationError(
                    "Usage: apsflow token set <token> | apsflow token clear".to_string(),
                )),
            },
            "help" | "--help" | "-h" => Ok(Command::Help),
            other => Err(AppError::ValidationError(format!(
                "Unknown command '{}'",
                other
            ))),
        }
    }
}

fn single_path(command: &str, rest: &[String]) -> Result<PathBuf> {
    match rest {
        [path] => Ok(PathBuf::from(path)),
        _ => Err(AppError::ValidationError(format!(
            "Usage: apsflow {} <job.json>",
            command
        ))),
    }
}

fn file_args(command: &str, rest: &[String]) -> Result<FileArgs> {
    match rest {
        [project_id, item_id] => Ok(FileArgs {
            project_id: project_id.clone(),
            item_id: item_id.clone(),
        }),
        _ => Err(AppError::ValidationError(format!(
            "Usage: apsflow {} <project_id> <item_id>",
            command
        ))),
    }
}

pub fn read_job<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::IoError(format!("Failed to read {}: {}", path.display(), err))
    })?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::ParseError(format!("Invalid job file {}: {}", path.display(), err))
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn execute(command: Command) -> Result<()> {
    match command {
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        Command::Preview(path) => {
            let job: TypeParametersJob = read_job(&path)?;
            print_json(&TypeParametersUseCase::preview(&job)?)
        }
        Command::TokenSet(token) => {
            ConfigService::new().save_access_token(&token)?;
            println!("Access token stored in the keyring.");
            Ok(())
        }
        Command::TokenClear => {
            ConfigService::new().delete_access_token()?;
            println!("Access token removed from the keyring.");
            Ok(())
        }
        Command::AddParameters(path) => {
            let job: TypeParametersJob = read_job(&path)?;
            let state = bootstrap::setup()?;
            let summary = state.type_parameters.execute(&job, &TracingProgress).await?;
            println!("{}", summary.message);
            Ok(())
        }
        Command::ExportIfc(path) => {
            let job: IfcExportJob = read_job(&path)?;
            let state = bootstrap::setup()?;
            let summary = state.ifc_export.execute(&job, &TracingProgress).await?;
            println!("{}", summary.message);
            Ok(())
        }
        Command::Views(args) => {
            let state = bootstrap::setup()?;
            print_json(&state.views.view_names(&args.into()).await)
        }
        Command::Viewables(args) => {
            let state = bootstrap::setup()?;
            print_json(&state.views.viewables(&args.into()).await?)
        }
        Command::Inspect(args) => {
            let state = bootstrap::setup()?;
            print_json(&state.views.inspect(&args.into()).await?)
        }
        Command::Serve => {
            let state = bootstrap::setup()?;
            let logs = Arc::new(Mutex::new(Vec::new()));
            let server = start_server(state, logs)?;
            server.await?;
            info!("HTTP API stopped");
            Ok(())
        }
    }
}
