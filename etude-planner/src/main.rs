use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use etude_planner::api::{fetch_study_summary, group_enrollment, ApiClient, StudyBackend};
use etude_planner::config::{get_config, Config};
use etude_planner::display::{
    print_batch_outcome, print_capacity, print_slot_preview, print_summary, write_export_to_file,
};
use etude_planner::error::{AppResult, ValidationError};
use etude_planner::export::{export_common_volunteers, export_study, ExportFormat, ExportKind};
use etude_planner::mailto::compose_group_mailto;
use etude_planner::schedule::{
    calculate_requested_slots, classify_batch_response, generate_time_slots, parse_time,
    reconcile_capacity, BatchForm, Interval, TimeOfDay,
};
use etude_planner::web;

#[derive(Parser)]
#[command(name = "etude-planner")]
#[command(version)]
#[command(about = "Appointment planning and exports for study volunteers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serves the planning page and JSON API
    Web {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Lists the time slots generated for a window
    Slots {
        /// Start time, e.g. 08:00 or 08h00
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Gap between appointments, e.g. 00:30
        #[arg(long, default_value = "00:00")]
        interval: String,
    },
    /// Compares requested slots with a group's enrolled subjects
    Capacity {
        #[arg(long)]
        requested: u32,
        #[arg(long)]
        enrolled: u32,
        #[arg(long)]
        no_group: bool,
    },
    /// Submits the batch described in a JSON form file
    Batch {
        file: PathBuf,
        /// Acknowledge a capacity warning
        #[arg(long)]
        confirm: bool,
    },
    /// Exports one study's volunteer x visit matrix
    Export {
        #[arg(long)]
        study: i64,
        /// appointments | recruitment
        #[arg(long, default_value = "appointments")]
        kind: ExportKind,
        #[arg(long, default_value = "xlsx")]
        format: ExportFormat,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Exports the volunteers shared by several studies
    CommonExport {
        #[arg(long, value_delimiter = ',', num_args = 2..)]
        studies: Vec<i64>,
        #[arg(long, default_value = "xlsx")]
        format: ExportFormat,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Prints a mailto: link for every volunteer of a group
    Mailto {
        #[arg(long)]
        study: i64,
        #[arg(long)]
        group: i64,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Prints headline counts for a study
    Summary {
        #[arg(long)]
        study: i64,
    },
}

fn parse_clock(value: &str) -> AppResult<TimeOfDay> {
    parse_time(value).ok_or_else(|| ValidationError::InvalidTime(value.to_string()).into())
}

fn backend(config: &Config) -> AppResult<ApiClient> {
    ApiClient::new(&config.api_url)
}

async fn run(command: Commands, config: Config) -> AppResult<()> {
    let today = Local::now().date_naive();
    match command {
        Commands::Web { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            web::start_server(config).await?;
        }
        Commands::Slots {
            start,
            end,
            interval,
        } => {
            let interval = parse_clock(&interval)?;
            let labels = generate_time_slots(
                parse_clock(&start)?,
                parse_clock(&end)?,
                Interval::new(interval.hour, interval.minute),
            );
            print_slot_preview(&labels, &[]);
        }
        Commands::Capacity {
            requested,
            enrolled,
            no_group,
        } => {
            let status = reconcile_capacity(requested, enrolled, !no_group);
            print_capacity(&status, requested, enrolled);
        }
        Commands::Batch { file, confirm } => {
            let mut form: BatchForm = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            form.confirmed |= confirm;

            let client = backend(&config)?;
            let enrolled = group_enrollment(&client, form.study_id, form.group_id).await?;

            let labels = form.window.labels();
            print_slot_preview(&labels, &form.dates);
            let capacity = form.capacity(&labels, enrolled);
            let requested = calculate_requested_slots(&form.dates, labels.len());
            print_capacity(&capacity, requested, enrolled);

            let requests = form.build_requests(enrolled)?;
            println!("Submitting {} appointment(s)...", requests.len());
            let response = client.create_appointments(&requests).await?;
            print_batch_outcome(&classify_batch_response(&response));
        }
        Commands::Export {
            study,
            kind,
            format,
            out,
        } => {
            let client = backend(&config)?;
            let document =
                export_study(&client, study, kind, config.fetch_concurrency, today).await?;
            let path = out.unwrap_or_else(|| PathBuf::from(document.file_name(format.extension())));
            write_export_to_file(&format.render(&document)?, &path)?;
            println!("{} row(s) written to {}", document.table.rows.len(), path.display());
        }
        Commands::CommonExport {
            studies,
            format,
            out,
        } => {
            let client = backend(&config)?;
            let document =
                export_common_volunteers(&client, &studies, config.fetch_concurrency, today)
                    .await?;
            let path = out.unwrap_or_else(|| PathBuf::from(document.file_name(format.extension())));
            write_export_to_file(&format.render(&document)?, &path)?;
            println!("{} row(s) written to {}", document.table.rows.len(), path.display());
        }
        Commands::Mailto {
            study,
            group,
            subject,
            body,
        } => {
            let client = backend(&config)?;
            let uri = compose_group_mailto(
                &client,
                study,
                group,
                &subject,
                &body,
                config.fetch_concurrency,
            )
            .await?;
            println!("{}", uri);
        }
        Commands::Summary { study } => {
            let client = backend(&config)?;
            let summary = fetch_study_summary(&client, study, config.summary_timeout()).await?;
            print_summary(&summary);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match get_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
