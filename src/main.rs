use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vehicle_importer::draft::{RecordDraft, UuidGenerator};
use vehicle_importer::flatten::flat_row;
use vehicle_importer::io::excel_write::XlsxSink;
use vehicle_importer::io::store::{JsonFileStore, RecordStore};
use vehicle_importer::model::ClosedSet;
use vehicle_importer::session::WorkingList;
use vehicle_importer::{Result, ToolError, schema, sync};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose).and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let store = JsonFileStore::new(&cli.store);
    let mut list = WorkingList::new(store.load()?);

    match cli.command {
        Command::Add { input } => {
            let draft: RecordDraft = load_json(&input)?;
            let record = draft.into_record(&mut UuidGenerator)?;
            println!("{}", record.id);
            list.push(record);
            store.save(list.records())?;
            info!(count = list.len(), "vehicle queued");
        }
        Command::Sample { output } => {
            let json = serde_json::to_string_pretty(&RecordDraft::sample())?;
            std::fs::write(&output, json)?;
            info!(output = %output.display(), "sample draft written");
        }
        Command::List => print_list(&list),
        Command::Remove { id } => {
            if !list.remove(&id) {
                return Err(ToolError::RecordNotFound(id));
            }
            store.save(list.records())?;
            info!(count = list.len(), "vehicle removed");
        }
        Command::Clear => {
            list.clear();
            store.clear()?;
            info!("working list cleared");
        }
        Command::Export { output } => {
            let output =
                output.unwrap_or_else(|| PathBuf::from(sync::todays_export_file_name()));
            let sink = XlsxSink::new(&output);
            let exported = sync::export_working_list(&mut list, &store, &sink)?;
            println!("exported {exported} vehicles to {}", output.display());
        }
        Command::Import { input } => {
            let imported =
                sync::import_workbook(&input, &mut list, &store, &mut UuidGenerator)?;
            println!("imported {imported} vehicles from {}", input.display());
        }
    }

    Ok(())
}

fn print_list(list: &WorkingList) {
    if list.is_empty() {
        println!("no vehicles queued");
        return;
    }
    for record in list.records() {
        let row = flat_row(record);
        let cell = |column: &str| row.get(column).map(String::as_str).unwrap_or("");
        println!(
            "{}\t{} {} {}\t{}\taccessories: {}\ttires: {}",
            record.id,
            cell("brand"),
            cell("model"),
            cell("trim"),
            record
                .vehicle
                .condition
                .map(ClosedSet::as_str)
                .unwrap_or("-"),
            cell(schema::ACCESSORIES_COLUMN),
            cell(schema::TIRE_OPTIONS_COLUMN),
        );
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Queue vehicle records and export them as an import workbook."
)]
struct Cli {
    /// JSON file holding the working list between runs.
    #[arg(
        long,
        global = true,
        env = "VEHICLE_IMPORTER_STORE",
        default_value = "vehicle-importer-records.json"
    )]
    store: PathBuf,

    /// Log at debug level regardless of RUST_LOG.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a JSON draft and append it to the working list.
    Add {
        #[arg(long)]
        input: PathBuf,
    },
    /// Write a fully populated example draft.
    Sample {
        #[arg(long)]
        output: PathBuf,
    },
    /// Show the queued vehicles.
    List,
    /// Drop one vehicle from the working list.
    Remove {
        #[arg(long)]
        id: String,
    },
    /// Drop every queued vehicle.
    Clear,
    /// Write the working list as a workbook and clear it.
    Export {
        /// Defaults to whipair-import-<date>.xlsx in the current directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Append the vehicles of a previously exported workbook.
    Import {
        #[arg(long)]
        input: PathBuf,
    },
}
