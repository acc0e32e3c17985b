// crates/cli/src/main.rs
//! Thin terminal frontend over the monitoring core: submit a batch, watch a
//! job live, list jobs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use autologin_client::{ApiClient, ResultKind, SubmitRequest};
use autologin_monitor::{MonitorEvent, MonitorSession};
use autologin_types::{Job, LogLevel};

/// Default server address, matching the batch server's default port.
const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "autologin", about = "Batch account-login job client")]
struct Cli {
    /// Server base URL (falls back to AUTOLOGIN_SERVER, then the default).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit an account file as a new batch job.
    Submit {
        /// Account file (Excel) to process.
        file: PathBuf,
        /// Concurrent login workers (1-10).
        #[arg(long, default_value_t = 5)]
        workers: u32,
        /// Optional proxy list file.
        #[arg(long)]
        proxy: Option<PathBuf>,
        /// Watch the job after submitting.
        #[arg(long)]
        watch: bool,
    },
    /// Watch a job's live progress and logs.
    Watch {
        /// Job id returned at submission.
        job_id: String,
    },
    /// List all jobs known to the server.
    Jobs,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,autologin=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let server = cli
        .server
        .clone()
        .or_else(|| std::env::var("AUTOLOGIN_SERVER").ok())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());
    let client = ApiClient::new(server);

    match cli.command {
        Command::Submit {
            file,
            workers,
            proxy,
            watch,
        } => {
            let job_id = submit(&client, &file, workers, proxy.as_deref()).await?;
            println!("job submitted: {job_id}");
            if watch {
                watch_job(&client, &job_id).await?;
            } else {
                println!("watch it with: autologin watch {job_id}");
            }
        }
        Command::Watch { job_id } => watch_job(&client, &job_id).await?,
        Command::Jobs => list_jobs(&client).await?,
    }

    Ok(())
}

async fn submit(
    client: &ApiClient,
    file: &Path,
    workers: u32,
    proxy: Option<&Path>,
) -> Result<String> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let name = file_name(file)?;

    let mut request = SubmitRequest::new(name, bytes, workers);
    if let Some(proxy_path) = proxy {
        let proxy_bytes = tokio::fs::read(proxy_path)
            .await
            .with_context(|| format!("reading {}", proxy_path.display()))?;
        request = request.with_proxy(file_name(proxy_path)?, proxy_bytes);
    }

    client.submit(request).await.context("submitting job")
}

async fn watch_job(client: &ApiClient, job_id: &str) -> Result<()> {
    let ws_base = ws_base_url(client.base_url())?;
    let mut session = MonitorSession::open(client, &ws_base, job_id)
        .await
        .context("opening job stream")?;

    println!("watching job {job_id} (ctrl-c to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("stopping");
                break;
            }
            event = session.next_event() => {
                let Some(event) = event else { break };
                match event {
                    MonitorEvent::SnapshotApplied(job) | MonitorEvent::JobUpdated(job) => {
                        print_progress(&job);
                    }
                    MonitorEvent::LogAppended(event) => {
                        let time = event
                            .time
                            .map(|t| format!("[{}] ", t.format("%H:%M:%S")))
                            .unwrap_or_default();
                        println!("{time}{}: {}", level_str(event.level), event.message);
                    }
                    MonitorEvent::SnapshotFailed(e) => eprintln!("snapshot fetch failed: {e}"),
                    MonitorEvent::StreamClosed => println!("stream closed by server"),
                    MonitorEvent::StreamFailed(e) => {
                        eprintln!("stream failed: {e} (showing last known state; reload to retry)");
                    }
                    MonitorEvent::Navigate(navigation) => {
                        println!("job {} finished, results:", navigation.job_id);
                        println!("  success: {}", client.download_url(ResultKind::Success, &navigation.job_id));
                        println!("  fail:    {}", client.download_url(ResultKind::Fail, &navigation.job_id));
                        break;
                    }
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}

async fn list_jobs(client: &ApiClient) -> Result<()> {
    let jobs = client.fetch_jobs().await.context("listing jobs")?;
    if jobs.is_empty() {
        println!("no jobs");
        return Ok(());
    }
    for job in jobs {
        print_progress(&job);
    }
    Ok(())
}

fn print_progress(job: &Job) {
    println!(
        "{} {:>10?} {:>3}%  total {}  ok {}  fail {}  in-flight {}",
        job.id,
        job.status,
        job.progress_percent(),
        job.total_accounts,
        job.success_count,
        job.fail_count,
        job.processing_count,
    );
}

fn level_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

fn file_name(path: &Path) -> Result<String> {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => Ok(name.to_string()),
        None => bail!("bad file name: {}", path.display()),
    }
}

/// Derive the WebSocket base from the HTTP base: http -> ws, https -> wss.
fn ws_base_url(base: &str) -> Result<String> {
    if let Some(rest) = base.strip_prefix("https://") {
        Ok(format!("wss://{rest}"))
    } else if let Some(rest) = base.strip_prefix("http://") {
        Ok(format!("ws://{rest}"))
    } else {
        bail!("server URL must start with http:// or https://, got {base}")
    }
}
