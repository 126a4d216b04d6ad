mod config;
mod shell;
mod view;

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use platform_api::RestCollection;
use platform_obs::{ObsConfig, init_tracing};
use products_hr::{Employee, Field, FormError, RosterController};
use tracing::{debug, info};
use url::Url;

use crate::{config::AppConfig, shell::Shell};

type Controller = RosterController<RestCollection<Employee>>;

#[derive(Parser, Debug)]
#[command(name = "roster", version, about = "Employee roster client for the SME suite")]
struct Cli {
    /// Base URL of the record service; overrides ROSTER_API_URL.
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<Url>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every employee.
    List,
    /// Look an employee up by ID.
    Search { id: String },
    /// Add a new employee.
    Add(AddCommand),
    /// Update an existing employee; omitted fields keep their values.
    Update(UpdateCommand),
    /// Delete an employee by ID.
    Delete { id: String },
    /// Interactive form session.
    Shell,
}

#[derive(Args, Debug)]
struct AddCommand {
    #[arg(long)]
    id: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    position: String,
    #[arg(long, value_name = "FILE")]
    photo: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct UpdateCommand {
    id: String,
    /// Value for the ID field. The stored ID is never changed.
    #[arg(long)]
    new_id: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    position: Option<String>,
    #[arg(long, value_name = "FILE")]
    photo: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let dotenv = dotenvy::dotenv();
    let _obs = init_tracing(ObsConfig::default())?;
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }
    let cli = Cli::parse();
    let config = AppConfig::load()?.with_base_url(cli.base_url);
    info!(base_url = %config.base_url, collection = %config.collection, "using record service");

    let store = RestCollection::from_config(&config.collection_config())
        .context("failed to build record service client")?;
    let mut controller = RosterController::new(store);
    // Load failures are logged by the controller; the roster just stays empty.
    let _ = controller.load_roster().await;

    match cli.command {
        Command::List => list(&controller),
        Command::Search { id } => search(&mut controller, id),
        Command::Add(cmd) => add(&mut controller, cmd).await,
        Command::Update(cmd) => update(&mut controller, cmd).await,
        Command::Delete { id } => delete(&mut controller, &id).await,
        Command::Shell => run_shell(controller).await,
    }
}

fn list(controller: &Controller) -> Result<ExitCode> {
    for line in view::roster_lines(controller.roster()) {
        println!("{line}");
    }
    Ok(ExitCode::SUCCESS)
}

fn search(controller: &mut Controller, id: String) -> Result<ExitCode> {
    match controller.search(id.as_str()) {
        Some(found) => {
            println!("{}", view::employee_details(found));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("no employee with ID {id}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn add(controller: &mut Controller, cmd: AddCommand) -> Result<ExitCode> {
    controller.set_field(Field::Id, cmd.id);
    controller.set_field(Field::FirstName, cmd.first_name);
    controller.set_field(Field::LastName, cmd.last_name);
    controller.set_field(Field::Email, cmd.email);
    controller.set_field(Field::Position, cmd.position);
    select_photo(controller, cmd.photo)?;
    submit(controller).await
}

async fn update(controller: &mut Controller, cmd: UpdateCommand) -> Result<ExitCode> {
    if !controller.begin_edit(&cmd.id) {
        bail!("no employee with ID {}", cmd.id);
    }
    let overrides = [
        (Field::Id, cmd.new_id),
        (Field::FirstName, cmd.first_name),
        (Field::LastName, cmd.last_name),
        (Field::Email, cmd.email),
        (Field::Position, cmd.position),
    ];
    for (field, value) in overrides {
        if let Some(value) = value {
            controller.set_field(field, value);
        }
    }
    select_photo(controller, cmd.photo)?;
    submit(controller).await
}

fn select_photo(controller: &mut Controller, photo: Option<PathBuf>) -> Result<()> {
    if let Some(path) = photo {
        if !view::is_image(&path) {
            bail!("{} is not an image file", path.display());
        }
        controller.select_photo([path]);
    }
    Ok(())
}

async fn submit(controller: &mut Controller) -> Result<ExitCode> {
    match controller.submit().await {
        Ok(notice) => {
            println!("{notice}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ FormError::Incomplete(_)) => {
            println!("{err}");
            Ok(ExitCode::FAILURE)
        }
        Err(FormError::Service(_)) => Ok(ExitCode::FAILURE),
    }
}

async fn delete(controller: &mut Controller, id: &str) -> Result<ExitCode> {
    match controller.delete(id).await {
        Ok(notice) => {
            println!("{notice}");
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

async fn run_shell(controller: Controller) -> Result<ExitCode> {
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut shell = Shell::new(controller, std::io::stdout());
    shell.run(input).await?;
    info!("shell closed");
    Ok(ExitCode::SUCCESS)
}
