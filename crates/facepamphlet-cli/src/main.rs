use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use facepamphlet_api::{
    AddProfileOutcome, DeleteProfileOutcome, FacePamphlet, FriendOutcome, PictureOutcome,
    StatusOutcome,
};
use facepamphlet_core::{FileError, FsImageLoader, PamphletError, Profile};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const CLI_CONTRACT_VERSION: &str = "cli.v1";

type Pamphlet = FacePamphlet<FsImageLoader>;

#[derive(Debug, Parser)]
#[command(name = "fp")]
#[command(about = "FacePamphlet profile network CLI")]
struct Cli {
    /// Network file the session is loaded from and saved back to.
    #[arg(long, default_value = "./facepamphlet.txt")]
    data: PathBuf,

    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    Status {
        #[command(subcommand)]
        command: StatusCommand,
    },
    Picture {
        #[command(subcommand)]
        command: PictureCommand,
    },
    Friend {
        #[command(subcommand)]
        command: FriendCommand,
    },
    File {
        #[command(subcommand)]
        command: FileCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    Add(NameArgs),
    Delete(NameArgs),
    Show(NameArgs),
    List,
}

#[derive(Debug, Args)]
struct NameArgs {
    #[arg(long)]
    name: String,
}

#[derive(Debug, Subcommand)]
enum StatusCommand {
    Set(StatusSetArgs),
}

#[derive(Debug, Args)]
struct StatusSetArgs {
    /// Name of the profile being edited.
    #[arg(long)]
    profile: String,
    #[arg(long, allow_hyphen_values = true)]
    text: String,
}

#[derive(Debug, Subcommand)]
enum PictureCommand {
    Set(PictureSetArgs),
}

#[derive(Debug, Args)]
struct PictureSetArgs {
    #[arg(long)]
    profile: String,
    #[arg(long)]
    file: String,
}

#[derive(Debug, Subcommand)]
enum FriendCommand {
    Add(FriendAddArgs),
}

#[derive(Debug, Args)]
struct FriendAddArgs {
    #[arg(long)]
    profile: String,
    #[arg(long)]
    friend: String,
}

#[derive(Debug, Subcommand)]
enum FileCommand {
    /// Replace the network with the contents of another network file.
    Load(FileLoadArgs),
    /// Write the network to another file.
    Save(FileSaveArgs),
}

#[derive(Debug, Args)]
struct FileLoadArgs {
    #[arg(long = "in")]
    input: PathBuf,
}

#[derive(Debug, Args)]
struct FileSaveArgs {
    #[arg(long)]
    out: PathBuf,
}

/// JSON payload of one command and whether the network must be persisted.
struct CommandOutput {
    payload: Value,
    mutated: bool,
}

impl CommandOutput {
    fn unchanged(payload: Value) -> Self {
        Self {
            payload,
            mutated: false,
        }
    }

    fn changed(payload: Value, mutated: bool) -> Self {
        Self { payload, mutated }
    }
}

fn with_contract_version(value: Value) -> Value {
    match value {
        Value::Object(mut object) => {
            object.insert(
                "contract_version".to_string(),
                Value::String(CLI_CONTRACT_VERSION.to_string()),
            );
            Value::Object(object)
        }
        other => serde_json::json!({
            "contract_version": CLI_CONTRACT_VERSION,
            "payload": other
        }),
    }
}

fn emit_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&with_contract_version(value))?);
    Ok(())
}

fn outcome_json<T: Serialize>(outcome: &T, message: String) -> Result<Value> {
    let mut value = serde_json::to_value(outcome).context("failed to serialize outcome")?;
    if let Value::Object(object) = &mut value {
        object.insert("message".to_string(), Value::String(message));
    }
    Ok(value)
}

fn file_failure(err: FileError) -> anyhow::Error {
    let message = err.message();
    anyhow::Error::new(err).context(message)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).without_time())
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut pamphlet = FacePamphlet::open(&cli.data, FsImageLoader)
        .map_err(file_failure)
        .with_context(|| format!("failed to open network file {}", cli.data.display()))?;

    let output = match cli.command {
        Command::Profile { command } => run_profile(command, &mut pamphlet)?,
        Command::Status { command } => run_status(command, &mut pamphlet)?,
        Command::Picture { command } => run_picture(command, &mut pamphlet)?,
        Command::Friend { command } => run_friend(command, &mut pamphlet)?,
        Command::File { command } => run_file(command, &mut pamphlet)?,
    };

    if output.mutated {
        pamphlet
            .persist(&cli.data)
            .map_err(file_failure)
            .with_context(|| format!("failed to persist network file {}", cli.data.display()))?;
    }
    emit_json(output.payload)
}

fn run_profile(command: ProfileCommand, pamphlet: &mut Pamphlet) -> Result<CommandOutput> {
    match command {
        ProfileCommand::Add(args) => {
            let outcome = pamphlet
                .add_profile(&args.name)
                .with_context(|| format!("failed to add profile {:?}", args.name))?;
            let created = matches!(outcome, AddProfileOutcome::Created { .. });
            Ok(CommandOutput::changed(outcome_json(&outcome, outcome.message())?, created))
        }
        ProfileCommand::Delete(args) => {
            let outcome = pamphlet.delete_profile(&args.name);
            let deleted = matches!(outcome, DeleteProfileOutcome::Deleted { .. });
            Ok(CommandOutput::changed(outcome_json(&outcome, outcome.message())?, deleted))
        }
        ProfileCommand::Show(args) => {
            let outcome = pamphlet.lookup_profile(&args.name);
            Ok(CommandOutput::unchanged(outcome_json(&outcome, outcome.message())?))
        }
        ProfileCommand::List => {
            let profiles: Vec<&Profile> = pamphlet.list_profiles().collect();
            Ok(CommandOutput::unchanged(serde_json::json!({
                "count": profiles.len(),
                "profiles": profiles
            })))
        }
    }
}

fn run_status(command: StatusCommand, pamphlet: &mut Pamphlet) -> Result<CommandOutput> {
    match command {
        StatusCommand::Set(args) => {
            let outcome = pamphlet.change_status(&args.profile, &args.text);
            let updated = matches!(outcome, StatusOutcome::Updated { .. });
            Ok(CommandOutput::changed(outcome_json(&outcome, outcome.message())?, updated))
        }
    }
}

fn run_picture(command: PictureCommand, pamphlet: &mut Pamphlet) -> Result<CommandOutput> {
    match command {
        PictureCommand::Set(args) => {
            let outcome = match pamphlet.change_picture(&args.profile, &args.file) {
                Ok(outcome) => outcome,
                Err(PamphletError::ImageLoad(err)) => {
                    let message = err.message();
                    return Err(anyhow::Error::new(err).context(message));
                }
                Err(err) => return Err(anyhow!(err)),
            };
            let updated = matches!(outcome, PictureOutcome::Updated { .. });
            Ok(CommandOutput::changed(outcome_json(&outcome, outcome.message())?, updated))
        }
    }
}

fn run_friend(command: FriendCommand, pamphlet: &mut Pamphlet) -> Result<CommandOutput> {
    match command {
        FriendCommand::Add(args) => {
            let outcome = pamphlet.add_friend(&args.profile, &args.friend);
            let added = matches!(outcome, FriendOutcome::Added { .. });
            Ok(CommandOutput::changed(outcome_json(&outcome, outcome.message())?, added))
        }
    }
}

fn run_file(command: FileCommand, pamphlet: &mut Pamphlet) -> Result<CommandOutput> {
    match command {
        FileCommand::Load(args) => {
            let outcome = pamphlet.load_file(&args.input).map_err(file_failure)?;
            Ok(CommandOutput::changed(outcome_json(&outcome, outcome.message())?, true))
        }
        FileCommand::Save(args) => {
            let outcome = pamphlet.save_file(&args.out).map_err(file_failure)?;
            Ok(CommandOutput::unchanged(outcome_json(&outcome, outcome.message())?))
        }
    }
}
