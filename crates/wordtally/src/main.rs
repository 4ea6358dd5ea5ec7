use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::{broadcast, mpsc};

use wordtally::broadcast::{JobEventKind, JobProgressBroadcaster, JobProgressEvent};
use wordtally::config::{load_config, Config};
use wordtally::db::JobDatabase;
use wordtally::engine::{
    AnalysisSettings, JobId, JobManager, JobStatus, LogProgress, ObserverSet, ProgressObserver,
};
use wordtally::error::{JobError, StoreError, WordtallyError};
use wordtally::logging::{init_tracing, LogFormat};
use wordtally::store::{ProcessStore, SqliteProcessStore};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "wordtally")]
#[command(about = "Word and line statistics for folders of text files", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, global = true, env = "WORDTALLY_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database holding job records
    #[arg(long, global = true, env = "WORDTALLY_DATABASE")]
    database: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a folder and wait for the result
    Run {
        /// Folder to analyze (defaults to the configured root directory)
        path: Option<PathBuf>,

        /// File extensions to include
        #[arg(long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// Maximum number of files analyzed at once
        #[arg(long)]
        max_concurrent: Option<NonZeroUsize>,

        /// Pause after each file, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Do not print per-file progress
        #[arg(short, long)]
        quiet: bool,
    },
    /// List every recorded job
    List,
    /// Show the status of a job
    Status { id: u64 },
    /// Show the full record of a job, including results
    Results { id: u64 },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Json => LogFormat::Json,
    });

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, WordtallyError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::with_root("."),
    };
    if let Some(database) = &cli.database {
        config.database_path = Some(database.to_string_lossy().into_owned());
    }

    let store = Arc::new(open_store(&config)?);

    match cli.command {
        Commands::Run {
            path,
            extensions,
            max_concurrent,
            delay_ms,
            quiet,
        } => {
            if let Some(extensions) = extensions {
                config.file_extensions = extensions;
            }
            if let Some(limit) = max_concurrent {
                config.max_concurrent_files = Some(limit.get());
            }
            if let Some(delay_ms) = delay_ms {
                config.file_delay_ms = delay_ms;
            }
            let root = path.unwrap_or_else(|| PathBuf::from(&config.root_directory));
            run_job(&config, store, root, quiet).await
        }
        Commands::List => {
            let manager = JobManager::new(store.clone(), AnalysisSettings::from_config(&config))?;
            let jobs = manager.list()?;
            println!("{}", serde_json::to_string_pretty(&jobs)?);
            for status in [JobStatus::Completed, JobStatus::Failed, JobStatus::Stopped] {
                log::debug!("{} jobs: {}", status, store.count_by_status(status)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status { id } => {
            let manager = JobManager::new(store, AnalysisSettings::from_config(&config))?;
            let view = manager.status(JobId::new(id))?;
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Results { id } => {
            let manager = JobManager::new(store, AnalysisSettings::from_config(&config))?;
            let job = manager.results(JobId::new(id))?;
            println!("{}", serde_json::to_string_pretty(&job)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_store(config: &Config) -> Result<SqliteProcessStore, WordtallyError> {
    let db = match config.resolved_database_path() {
        Some(path) => JobDatabase::open(&path),
        None => {
            log::warn!("No home directory found, job records will not outlive this process");
            JobDatabase::open_in_memory()
        }
    }
    .map_err(StoreError::from)?;
    Ok(SqliteProcessStore::new(db))
}

async fn run_job(
    config: &Config,
    store: Arc<dyn ProcessStore>,
    root: PathBuf,
    quiet: bool,
) -> Result<ExitCode, WordtallyError> {
    let broadcaster = JobProgressBroadcaster::new(config.progress_channel_capacity.max(1));
    let observer = ObserverSet::new(vec![
        Arc::new(LogProgress) as Arc<dyn ProgressObserver>,
        Arc::new(broadcaster.clone()) as Arc<dyn ProgressObserver>,
    ]);
    let manager = JobManager::with_observer(
        store,
        AnalysisSettings::from_config(config),
        Arc::new(observer),
    )?;

    let (interrupt_tx, mut interrupt_rx) = mpsc::unbounded_channel();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(());
    }) {
        log::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let events = broadcaster.subscribe();
    let job = manager.submit(&root)?;
    let id = job.id;
    eprintln!("Started job {} for {}", id, root.display());

    let printer = (!quiet).then(|| tokio::spawn(print_progress(events, id)));

    let job = tokio::select! {
        done = manager.wait(id) => done?,
        Some(()) = interrupt_rx.recv() => {
            eprintln!("Cancelling job {}...", id);
            match manager.cancel(id).await {
                Ok(job) => job,
                Err(JobError::NotFound(_)) | Err(JobError::NotStopped { .. }) => {
                    manager.wait(id).await?
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    if let Some(printer) = printer {
        printer.abort();
    }

    println!("{}", serde_json::to_string_pretty(&job)?);

    Ok(if job.status == JobStatus::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn print_progress(mut events: broadcast::Receiver<JobProgressEvent>, id: JobId) {
    loop {
        match events.recv().await {
            Ok(event) if event.job_id == id => {
                match (event.kind, event.progress, event.status) {
                    (JobEventKind::Progress, Some(progress), _) => eprintln!(
                        "[{}] {}/{} files ({:.0}%)",
                        id, progress.processed_files, progress.total_files, progress.percentage
                    ),
                    (JobEventKind::Status, _, Some(status)) => eprintln!("[{}] {}", id, status),
                    _ => {}
                }
                if event.is_terminal() {
                    break;
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::debug!("Progress printer skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
