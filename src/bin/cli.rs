//! CLI binary for youpic-wallpaper.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use youpic_wallpaper::{FetchOutcome, WallpaperConfig, WallpaperService};

/// Keep the wallpaper in sync with the YouPic featured image.
#[derive(Parser)]
#[command(name = "youpic-wallpaper", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, env = "YOUPIC_WALLPAPER_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Fetch and apply the current image once.
    Fetch,

    /// Start the periodic schedule and keep running until Ctrl+C.
    Start,

    /// Stop the schedule, including one served by another process.
    Stop,

    /// Resume the schedule if it was left running. Meant for login/boot.
    Run,

    /// Show schedule and last applied image.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => WallpaperConfig::from_file(path)?,
        None => WallpaperConfig::load_or_default(&WallpaperConfig::default_config_path())?,
    };

    // Guard must outlive the command or buffered file logs are dropped.
    let _log_guard = youpic_wallpaper::logging::init(&config.logging);

    let service = WallpaperService::from_config(&config)?;

    match cli.command {
        Command::Fetch => run_fetch(&service).await,
        Command::Start => run_start(&service, &config).await,
        Command::Stop => run_stop(&service),
        Command::Run => run_resume(&service, &config).await,
        Command::Status => show_status(&service, &config),
    }
}

async fn run_fetch(service: &WallpaperService) -> anyhow::Result<()> {
    let outcome = service.pipeline().run().await;
    println!("{}", outcome.user_notice());

    if let FetchOutcome::Failed(e) = outcome {
        anyhow::bail!("fetch failed ({}): {e}", e.kind());
    }
    Ok(())
}

async fn run_start(service: &WallpaperService, config: &WallpaperConfig) -> anyhow::Result<()> {
    service.scheduler().start()?;
    println!("Service started");
    serve(service, config).await
}

fn run_stop(service: &WallpaperService) -> anyhow::Result<()> {
    service.scheduler().stop()?;
    println!("Service stopped");
    Ok(())
}

async fn run_resume(service: &WallpaperService, config: &WallpaperConfig) -> anyhow::Result<()> {
    if !service.scheduler().handle_restart()? {
        println!("Scheduling is disabled. Use `youpic-wallpaper start` to enable it.");
        return Ok(());
    }
    println!("Service resumed");
    serve(service, config).await
}

/// Keep the process alive for scheduled ticks until Ctrl+C or until
/// `youpic-wallpaper stop` clears the re-arm flag.
///
/// Ctrl+C leaves the flag set so the next `run` resumes the schedule.
async fn serve(service: &WallpaperService, config: &WallpaperConfig) -> anyhow::Result<()> {
    let scheduler = service.scheduler();
    println!(
        "Updating every {}. Press Ctrl+C to quit.",
        format_interval(scheduler.period().as_secs())
    );

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("received Ctrl+C, shutting down...");
        }
        () = scheduler.run_until_disabled(config.schedule.poll()) => {
            println!("Service stopped");
        }
    }
    Ok(())
}

fn show_status(service: &WallpaperService, config: &WallpaperConfig) -> anyhow::Result<()> {
    let rearm = if service.rearm_enabled()? { "yes" } else { "no" };
    match service.rearm_changed_at()? {
        Some(at) => println!("Re-arm on restart: {rearm} (since {})", at.to_rfc3339()),
        None => println!("Re-arm on restart: {rearm}"),
    }
    println!(
        "Interval:          {}",
        format_interval(config.schedule.interval_secs)
    );
    match service.last_applied()? {
        Some(url) => println!("Last image:        {url}"),
        None => println!("Last image:        none"),
    }
    println!(
        "Output:            {}",
        config.sink.effective_output_dir().display()
    );
    Ok(())
}

/// Render seconds as `3h`, `1h 30m`, `45s` and similar.
fn format_interval(secs: u64) -> String {
    let (hours, rem) = (secs / 3600, secs % 3600);
    let (minutes, seconds) = (rem / 60, rem % 60);

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}
