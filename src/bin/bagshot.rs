use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};

use bagshot::{
    BagStats, DEFAULT_PREFIX, ImageBagProcessor, ImageSaver, ProgressCallback, ProgressInfo,
    SaverConfig,
};

const CLI_AFTER_HELP: &str = "Examples:\n  bagshot /tmp jpg /stereo_down/left/image_raw bag1.bag bag2.bag\n  bagshot frames png /camera/image_raw run.bag --prefix left_ --progress";

#[derive(Debug, Parser)]
#[command(
    name = "bagshot",
    version,
    about = "Extract image frames from ROS bag files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Existing directory the images are written to.
    out_dir: Option<PathBuf>,

    /// Output image extension (png, jpg, bmp, tiff, ...).
    file_type: Option<String>,

    /// Topic whose sensor_msgs/Image messages are extracted.
    image_topic: Option<String>,

    /// Bag files, processed in the order given.
    bags: Vec<PathBuf>,

    /// Filename prefix placed before the timestamp.
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress spinner per bag.
    #[arg(long)]
    progress: bool,

    /// Print a machine-readable report once all bags are processed.
    #[arg(long)]
    json: bool,
}

/// Everything needed to run a batch, once the positional arguments are known.
#[derive(Debug)]
struct Job {
    config: SaverConfig,
    topic: String,
    bags: Vec<PathBuf>,
}

impl Cli {
    /// `None` when fewer than three positional arguments were given.
    fn job(&self) -> Option<Job> {
        let (Some(out_dir), Some(file_type), Some(topic)) =
            (&self.out_dir, &self.file_type, &self.image_topic)
        else {
            return None;
        };
        Some(Job {
            config: SaverConfig::new(out_dir, file_type).with_prefix(&self.prefix),
            topic: topic.clone(),
            bags: self.bags.clone(),
        })
    }
}

fn print_usage() {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "bagshot".to_string());
    println!(
        "{} {program} OUT_DIR FILETYPE IMAGE_TOPIC BAGFILE [BAGFILE...]",
        "Usage:".bold()
    );
    println!("  Example: {program} /tmp jpg /stereo_down/left/image_raw bag1.bag bag2.bag");
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "error,bagshot=debug" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
    style: ProgressStyle,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            bar: Mutex::new(None),
            style: ProgressStyle::with_template("{spinner:.green} {pos} frame(s) {msg}")?,
        })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };
        let bar = slot.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(self.style.clone());
            bar
        });
        bar.set_position(info.dispatched);
        bar.set_message(info.bag.display().to_string());
        if info.finished {
            bar.finish_with_message(format!("{} done", info.bag.display()));
            *slot = None;
        }
    }
}

fn stats_report(stats: &BagStats) -> Value {
    json!({
        "messages": stats.messages,
        "dispatched": stats.dispatched,
        "skipped": stats.skipped,
    })
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(job) = cli.job() else {
        print_usage();
        return Ok(());
    };

    let mut saver = ImageSaver::new(job.config);
    let mut reports = Vec::with_capacity(job.bags.len());
    {
        let mut processor = ImageBagProcessor::new(job.topic);
        if cli.progress {
            processor = processor.with_progress(Arc::new(TerminalProgress::new()?));
        }
        processor.register_callback(|frame| saver.save(frame));

        for bag in &job.bags {
            match processor.process_bag(bag) {
                Ok(stats) => {
                    let mut report = stats_report(&stats);
                    report["bag"] = json!(bag.display().to_string());
                    reports.push(report);
                }
                Err(error) => {
                    eprintln!("{} {error}", "error:".red().bold());
                    reports.push(json!({
                        "bag": bag.display().to_string(),
                        "error": error.to_string(),
                    }));
                }
            }
        }
    }

    log::info!("Saved {} image(s)", saver.num_saved());

    if cli.json {
        let report = json!({
            "out_dir": saver.config().save_dir().display().to_string(),
            "bags": reports,
            "saved": saver.num_saved(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

/// Exit status is 0 even when `run` fails; the failure is reported on stderr.
fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
    }
}
