use anyhow::Context;
use clap::Parser;
use dataset_loader::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_DATABASE, DEFAULT_HOST, DEFAULT_PROTOCOL, DEFAULT_USER,
};
use dataset_loader::dataset::Dataset;
use dataset_loader::loader::LoaderOptionsBuilder;
use dataset_loader::runner::{ImportArgs, plan_import, run_import};
use std::path::PathBuf;

/// Replace-load the customers, restaurants, riders, orders and deliveries
/// CSV files into database tables
#[derive(Parser, Clone, Debug)]
#[command(version, about)]
struct Args {
    /// Database protocol (mysql, postgres, sqlite)
    #[arg(long, env = "DB_PROTOCOL", default_value = DEFAULT_PROTOCOL)]
    protocol: String,

    /// Database host
    #[arg(long, env = "DB_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Database port (driver default if not specified)
    #[arg(long, env = "DB_PORT")]
    port: Option<u16>,

    /// Database user
    #[arg(short, long, env = "DB_USER", default_value = DEFAULT_USER)]
    user: String,

    /// Database password
    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Database name
    #[arg(long, env = "DB_NAME", default_value = DEFAULT_DATABASE)]
    database: String,

    /// Full connection string; overrides protocol, host, port, user, password and database
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Directory containing the CSV files
    #[arg(short, long, env = "DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Rows per INSERT statement
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Parse the files and print the generated DDL without touching the database
    #[arg(long)]
    dry_run: bool,

    /// Quiet mode - minimal output, only show summary
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.quiet);

    // Every failure is reported; the exit status stays 0
    if let Err(err) = run(args).await {
        println!();
        println!("ERROR: {err:#}");
    }

    Ok(())
}

fn init_tracing(quiet: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter = if quiet {
        EnvFilter::new("dataset_loader=warn,sqlx=off")
    } else {
        EnvFilter::new("dataset_loader=info,sqlx=off")
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

async fn run(args: Args) -> anyhow::Result<()> {
    if args.batch_size == 0 {
        anyhow::bail!("--batch-size must be at least 1");
    }

    let database_url = cli::database_url(&args)?;
    let options = LoaderOptionsBuilder::default()
        .batch_size(args.batch_size)
        .build()
        .context("invalid loader options")?;

    let import_args = ImportArgs {
        database_url,
        dataset: Dataset::default_tables(&args.data_dir),
        options,
    };

    if args.dry_run {
        return dry_run(&import_args).await;
    }

    if !args.quiet {
        println!("Dataset Loader");
        println!("==============");
        println!(
            "Database: {}",
            dataset_loader::db::pool::redact_url(&import_args.database_url)
        );
        println!("Data directory: {}", args.data_dir.display());
        println!();
    }

    let quiet = args.quiet;
    let report = run_import(import_args, |event| {
        if !quiet && let Some(line) = cli::describe_event(event) {
            println!("{line}");
        }
    })
    .await
    .context("import aborted")?;

    println!();
    println!("{}", report.summary_line());

    Ok(())
}

async fn dry_run(import_args: &ImportArgs) -> anyhow::Result<()> {
    println!("DRY RUN MODE - No data will be loaded");
    println!();

    for plan in plan_import(import_args).await? {
        match plan.result {
            Ok(planned) => {
                println!(
                    "{} <- {} ({} rows)",
                    plan.table,
                    plan.source.display(),
                    planned.rows
                );
                println!("{};", planned.ddl);
            }
            Err(err) => println!("{}: {err}", plan.table),
        }
        println!();
    }

    println!("To execute, run without --dry-run");
    Ok(())
}

/// CLI utility functions
mod cli {
    use dataset_loader::db::ConnectionSettingsBuilder;
    use dataset_loader::telemetry::TelemetryEvent;

    /// Connection string from `--database-url`, or assembled from the individual flags
    pub fn database_url(args: &super::Args) -> anyhow::Result<String> {
        if let Some(url) = &args.database_url {
            return Ok(url.clone());
        }

        let mut builder = ConnectionSettingsBuilder::default();
        builder
            .protocol(args.protocol.as_str())
            .host(args.host.as_str())
            .user(args.user.as_str())
            .password(args.password.as_str())
            .database(args.database.as_str());
        if let Some(port) = args.port {
            builder.port(port);
        }

        Ok(builder.build()?.connection_url()?)
    }

    /// Progress line for an event, if it warrants one
    pub fn describe_event(event: &TelemetryEvent) -> Option<String> {
        match event {
            TelemetryEvent::Connected { database } => Some(format!("Connected to {database}")),
            TelemetryEvent::TableStarted { table, source } => {
                Some(format!("Importing {} -> {table}", source.display()))
            }
            TelemetryEvent::BatchWritten { .. } => None,
            TelemetryEvent::TableLoaded { table, rows } => {
                Some(format!("Imported {table} ({rows} rows)"))
            }
            TelemetryEvent::TableSkipped { source, .. } => {
                Some(format!("File not found: {}", source.display()))
            }
            TelemetryEvent::TableFailed { error, .. } => Some(format!("Error: {error}")),
        }
    }
}
