mod operator;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use engine::config::{load_playlist, load_settings, save_settings};
use engine::{Event, Settings, spawn_headless_coordinator};

use operator::{HELP, Input, Operator, parse_line};

#[derive(Parser)]
#[command(name = "projector")]
#[command(about = "Drive a projector session from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON array of items to project.
    #[arg(long)]
    playlist: PathBuf,

    /// Settings file; missing files fall back to defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long = "loop")]
    loop_playback: bool,

    #[arg(long)]
    random: bool,

    /// Enables auto-advance with this interval in milliseconds.
    #[arg(long)]
    auto_advance_ms: Option<u64>,

    /// Seed for reproducible shuffles.
    #[arg(long)]
    seed: Option<u64>,

    /// Also print timer and video progress.
    #[arg(long)]
    progress: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => load_settings(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Settings::default(),
        };
        if self.loop_playback {
            settings.loop_playback = true;
        }
        if self.random {
            settings.random = true;
        }
        if let Some(interval) = self.auto_advance_ms {
            settings.enable_auto_advance = true;
            settings.auto_advance_interval_ms = interval;
        }
        Ok(settings.normalized())
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let settings = cli.settings()?;
    let items = load_playlist(&cli.playlist)
        .with_context(|| format!("loading playlist from {}", cli.playlist.display()))?;

    let (command_tx, event_rx) = spawn_headless_coordinator(cli.seed);
    let show_progress = cli.progress;
    let printer = thread::spawn(move || {
        for event in event_rx {
            if event.is_telemetry() && !show_progress {
                continue;
            }
            println!("{}", format_event(&event));
        }
    });

    let mut operator = Operator::new(items, settings);
    println!("{HELP}");
    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let input = match parse_line(&line) {
            Ok(input) => input,
            Err(error) => {
                eprintln!("{error:#}");
                continue;
            }
        };

        match input {
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Save => match &cli.settings {
                Some(path) => save_settings(&operator.settings(), path)
                    .with_context(|| format!("saving settings to {}", path.display()))?,
                None => eprintln!("no --settings file to save to"),
            },
            input => {
                if let Some(command) = operator.command_for(input) {
                    command_tx
                        .send(command)
                        .context("coordinator thread stopped")?;
                }
            }
        }
    }

    drop(command_tx);
    if printer.join().is_err() {
        eprintln!("event printer panicked");
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_writer(io::stderr).try_init();
}

fn format_event(event: &Event) -> String {
    match event {
        Event::Navigate { item: Some(item) } => format!("navigate item={item}"),
        Event::Navigate { item: None } => String::from("navigate background"),
        Event::PlayPause { playing } => format!("play-pause playing={playing}"),
        Event::DisplayStatus { open } => format!("display open={open}"),
        Event::FullscreenChanged { fullscreen } => format!("fullscreen {fullscreen}"),
        Event::VideoProgress(progress) => format!(
            "video {:.1}s/{:.1}s",
            progress.current_time, progress.duration
        ),
        Event::TimerProgress(progress) => {
            format!("timer {}ms/{}ms", progress.elapsed_ms, progress.total_ms)
        }
        Event::Error(error) => format!("error ({:?}): {}", error.kind, error.message),
        other => format!("{other:?}"),
    }
}
