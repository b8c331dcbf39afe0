//! # CLI Module
//!
//! Command-line front end for image clustering.
//!
//! ## Usage
//! ```bash
//! # Group similar images
//! image-cluster cluster ~/dataset/images
//!
//! # Stricter matching with a different hash
//! image-cluster cluster ~/dataset/images --preset strict --algorithm dhash
//!
//! # JSON output
//! image-cluster cluster ~/dataset/images --output json
//!
//! # Show what would be deleted, then delete it (labels follow their images)
//! image-cluster dedupe ~/dataset/images --labels-dir
//! image-cluster dedupe ~/dataset/images --labels-dir --yes --trash
//!
//! # Inspect the labels of one image
//! image-cluster labels ~/dataset/images/cat.jpg --classes classes.txt
//!
//! # Change the saved defaults
//! image-cluster config --preset loose --algorithm phash --save
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use image_cluster::config::Settings;
use image_cluster::core::cluster::{Cluster, Threshold, ThresholdPreset};
use image_cluster::core::hasher::HashAlgorithmKind;
use image_cluster::core::labels::{ClassNames, LabelLayout, LabelStore};
use image_cluster::core::pipeline::Pipeline;
use image_cluster::core::review::{ClusterSet, DeleteMode, DeleteReport, Deleter};
use image_cluster::core::runner::ClusterRunner;
use image_cluster::core::scanner::ScanOrder;
use image_cluster::error::{ConfigError, Result};
use image_cluster::events::{ClusterEvent, Event, RunSummary};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::warn;

/// Group visually similar images and clean up duplicates
#[derive(Parser, Debug)]
#[command(name = "image-cluster")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Cluster the images below a folder
    Cluster {
        #[command(flatten)]
        run: RunArgs,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Cluster, then delete every image except the first of each cluster
    Dedupe {
        #[command(flatten)]
        run: RunArgs,

        /// Actually delete (otherwise only list what would go)
        #[arg(long)]
        yes: bool,

        /// Move to the trash instead of deleting permanently
        #[arg(long)]
        trash: bool,

        /// Labels live in ../labels/ rather than next to the images
        #[arg(long)]
        labels_dir: bool,
    },

    /// Print the YOLO labels of one image
    Labels {
        /// Image whose labels to show
        image: PathBuf,

        /// Class name file, one name per line
        #[arg(long)]
        classes: Option<PathBuf>,

        /// Labels live in ../labels/ rather than next to the image
        #[arg(long)]
        labels_dir: bool,
    },

    /// Show the default settings, optionally changing and saving them
    Config(ConfigArgs),
}

/// Overrides for the persisted settings
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Default threshold (0-64)
    #[arg(short, long, conflicts_with = "preset")]
    threshold: Option<u32>,

    /// Default threshold by name: strict, normal or loose
    #[arg(short, long, value_parser = parse_preset)]
    preset: Option<ThresholdPreset>,

    /// Default hash algorithm: average, phash or dhash
    #[arg(short, long, value_parser = parse_algorithm)]
    algorithm: Option<HashAlgorithmKind>,

    /// Hide clusters of a single image by default
    #[arg(long)]
    skip_single: Option<bool>,

    /// Where label files live
    #[arg(long)]
    label_layout: Option<LayoutArg>,

    /// Write the settings file
    #[arg(long)]
    save: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    /// Next to the image
    Sibling,
    /// In ../labels/
    LabelsDir,
}

impl From<LayoutArg> for LabelLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Sibling => LabelLayout::Sibling,
            LayoutArg::LabelsDir => LabelLayout::LabelsDir,
        }
    }
}

/// Options shared by every command that runs a clustering pass
#[derive(Args, Debug)]
struct RunArgs {
    /// Folder to scan (recursively)
    folder: PathBuf,

    /// Maximum Hamming distance from a cluster's seed (0-64)
    #[arg(short, long, conflicts_with = "preset")]
    threshold: Option<u32>,

    /// Named threshold: strict (2), normal (5) or loose (10)
    #[arg(short, long, value_parser = parse_preset)]
    preset: Option<ThresholdPreset>,

    /// Hash algorithm: average, phash or dhash
    #[arg(short, long, value_parser = parse_algorithm)]
    algorithm: Option<HashAlgorithmKind>,

    /// Hide clusters of a single image
    #[arg(long, conflicts_with = "keep_single")]
    skip_single: bool,

    /// Show clusters of a single image
    #[arg(long)]
    keep_single: bool,

    /// Hash on one thread
    #[arg(long)]
    sequential: bool,

    /// Use filesystem order instead of sorting by name
    #[arg(long)]
    traversal_order: bool,
}

fn parse_preset(s: &str) -> std::result::Result<ThresholdPreset, String> {
    s.parse()
}

fn parse_algorithm(s: &str) -> std::result::Result<HashAlgorithmKind, String> {
    s.parse().map_err(|e: image_cluster::error::HashError| e.to_string())
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (duplicate paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    image_cluster::init_tracing(cli.verbose);

    let settings = load_settings()?;

    match cli.command {
        Commands::Cluster { run, output } => run_cluster(&settings, &run, output),
        Commands::Dedupe {
            run,
            yes,
            trash,
            labels_dir,
        } => {
            let layout = if labels_dir {
                LabelLayout::LabelsDir
            } else {
                settings.label_layout
            };
            let mode = if trash {
                DeleteMode::Trash
            } else {
                DeleteMode::Permanent
            };
            run_dedupe(&settings, &run, Deleter::new(layout, mode), yes)
        }
        Commands::Labels {
            image,
            classes,
            labels_dir,
        } => {
            let layout = if labels_dir {
                LabelLayout::LabelsDir
            } else {
                settings.label_layout
            };
            show_labels(&image, classes.as_deref(), layout)
        }
        Commands::Config(args) => run_config(settings, &args),
    }
}

/// Apply command-line overrides to loaded settings
fn apply_config(mut settings: Settings, args: &ConfigArgs) -> Result<Settings> {
    if let Some(value) = args.threshold {
        settings.threshold = Threshold::new(value)?;
    } else if let Some(preset) = args.preset {
        settings.threshold = preset.threshold();
    }
    if let Some(algorithm) = args.algorithm {
        settings.algorithm = algorithm;
    }
    if let Some(skip_single) = args.skip_single {
        settings.skip_single = skip_single;
    }
    if let Some(layout) = args.label_layout {
        settings.label_layout = layout.into();
    }
    Ok(settings)
}

fn run_config(settings: Settings, args: &ConfigArgs) -> Result<ExitCode> {
    let settings = apply_config(settings, args)?;

    match serde_json::to_string_pretty(&settings) {
        Ok(text) => println!("{text}"),
        Err(e) => warn!(error = %e, "Failed to render JSON"),
    }

    if args.save {
        let path = settings.save()?;
        Term::stderr()
            .write_line(&format!(
                "{} Saved to {}",
                style("✓").green().bold(),
                display_path(&path)
            ))
            .ok();
    }

    Ok(ExitCode::SUCCESS)
}

fn load_settings() -> Result<Settings> {
    match Settings::load() {
        Ok(settings) => Ok(settings),
        Err(ConfigError::NoConfigDir) => {
            warn!("No configuration directory, using default settings");
            Ok(Settings::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Clusters collected from one run, and how it ended
struct Collected {
    clusters: ClusterSet,
    summary: Option<RunSummary>,
    failure: Option<String>,
}

fn collect_clusters(settings: &Settings, args: &RunArgs, show_progress: bool) -> Result<Collected> {
    let threshold = match (args.threshold, args.preset) {
        (Some(value), _) => Threshold::new(value)?,
        (None, Some(preset)) => preset.threshold(),
        (None, None) => settings.threshold,
    };
    let skip_single = if args.skip_single {
        true
    } else if args.keep_single {
        false
    } else {
        settings.skip_single
    };
    let order = if args.traversal_order {
        ScanOrder::Traversal
    } else {
        ScanOrder::Sorted
    };

    let builder = Pipeline::builder()
        .folder(&args.folder)
        .threshold(threshold.value())
        .algorithm(args.algorithm.unwrap_or(settings.algorithm))
        .skip_single(skip_single)
        .parallel_hashing(!args.sequential)
        .order(order);

    let (mut runner, receiver) = ClusterRunner::new();
    runner.start_with(builder)?;

    let progress = show_progress.then(|| {
        let pb = ProgressBar::new(100);
        if let Ok(bar_style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        pb
    });

    let mut collected = Collected {
        clusters: ClusterSet::new(),
        summary: None,
        failure: None,
    };

    loop {
        let event = match receiver.recv_timeout(Duration::from_millis(100)) {
            Some(event) => event,
            None if runner.is_running() => continue,
            None => match receiver.try_recv() {
                Some(event) => event,
                // Worker ended without a terminal event
                None => break,
            },
        };

        let Event::Cluster(event) = event else {
            continue;
        };
        match event {
            ClusterEvent::Progress(update) => {
                if let Some(ref pb) = progress {
                    pb.set_position(u64::from(update.percent));
                    pb.set_message(update.message);
                }
            }
            ClusterEvent::ClusterFound(cluster) => collected.clusters.push(cluster),
            ClusterEvent::Finished(summary) => {
                collected.summary = Some(summary);
                break;
            }
            ClusterEvent::Cancelled => break,
            ClusterEvent::Failed { message } => {
                collected.failure = Some(message);
                break;
            }
        }
    }

    runner.wait();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(collected)
}

fn run_cluster(settings: &Settings, args: &RunArgs, output: OutputFormat) -> Result<ExitCode> {
    let term = Term::stderr();
    let pretty = matches!(output, OutputFormat::Pretty);

    if pretty {
        print_header(&term);
    }

    let collected = collect_clusters(settings, args, pretty)?;
    if let Some(message) = &collected.failure {
        term.write_line(&format!("{} {}", style("✗").red().bold(), message))
            .ok();
        return Ok(ExitCode::FAILURE);
    }

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &collected),
        OutputFormat::Json => print_json_results(&collected),
        OutputFormat::Minimal => print_minimal_results(&collected.clusters),
    }

    Ok(ExitCode::SUCCESS)
}

fn run_dedupe(settings: &Settings, args: &RunArgs, deleter: Deleter, confirmed: bool) -> Result<ExitCode> {
    let term = Term::stderr();
    print_header(&term);

    let mut collected = collect_clusters(settings, args, true)?;
    if let Some(message) = &collected.failure {
        term.write_line(&format!("{} {}", style("✗").red().bold(), message))
            .ok();
        return Ok(ExitCode::FAILURE);
    }
    if collected.summary.is_none() {
        term.write_line(&format!(
            "{}",
            style("Clustering did not finish; nothing deleted.").yellow()
        ))
        .ok();
        return Ok(ExitCode::FAILURE);
    }

    let duplicates = collected.clusters.duplicate_count();
    if duplicates == 0 {
        term.write_line(&format!("  {} No duplicates found!", style("✓").green()))
            .ok();
        return Ok(ExitCode::SUCCESS);
    }

    if !confirmed {
        for cluster in &collected.clusters {
            for image in cluster.duplicates() {
                println!("{}", display_path(image));
            }
        }
        term.write_line("").ok();
        term.write_line(&format!(
            "{} {} images would be deleted. Re-run with {} to delete them.",
            style("Dry run:").bold(),
            style(duplicates).cyan(),
            style("--yes").bold()
        ))
        .ok();
        return Ok(ExitCode::SUCCESS);
    }

    let report = deleter.delete_all_duplicates(&mut collected.clusters);
    print_delete_report(&term, &report, deleter.mode());

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn show_labels(image: &Path, classes: Option<&Path>, layout: LabelLayout) -> Result<ExitCode> {
    let store = LabelStore::new(layout);
    let names = match classes {
        Some(path) => ClassNames::load(path)?,
        None => ClassNames::default(),
    };
    let labels = store.load(image)?;
    let label_path = store.path_for(image)?;

    if labels.is_empty() {
        println!("No labels ({})", display_path(&label_path));
        return Ok(ExitCode::SUCCESS);
    }

    let dimensions = image::image_dimensions(image).ok();
    println!("{} ({} labels)", display_path(&label_path), labels.len());

    for label in &labels {
        let mut line = format!(
            "  {} center ({:.4}, {:.4}) size {:.4} x {:.4}",
            style(names.display_name(label.class.class_id())).bold(),
            label.x_center,
            label.y_center,
            label.width,
            label.height
        );
        if let Some(confidence) = label.class.confidence() {
            line.push_str(&format!(" conf {confidence:.2}"));
        }
        if let Some((w, h)) = dimensions {
            let (left, top, right, bottom) = label.to_pixel_rect(w, h);
            line.push_str(&format!(" px [{left:.0}, {top:.0}, {right:.0}, {bottom:.0}]"));
        }
        if !label.is_normalized() {
            line.push_str(&format!(" {}", style("(out of range)").yellow()));
        }
        println!("{line}");
    }

    Ok(ExitCode::SUCCESS)
}

fn print_header(term: &Term) {
    term.write_line(&format!(
        "{} {}",
        style("Image Cluster").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();
}

fn print_pretty_results(term: &Term, collected: &Collected) {
    let clusters = &collected.clusters;

    if let Some(summary) = &collected.summary {
        term.write_line(&format!("{} Clustering Complete", style("✓").green().bold()))
            .ok();
        term.write_line("").ok();
        term.write_line(&format!(
            "  {} images hashed in {:.1}s",
            style(summary.hashed_images).cyan(),
            summary.duration_ms as f64 / 1000.0
        ))
        .ok();
        if summary.skipped_images > 0 {
            term.write_line(&format!(
                "  {} unreadable images skipped",
                style(summary.skipped_images).yellow()
            ))
            .ok();
        }
    } else {
        term.write_line(&format!("{} Clustering Cancelled", style("!").yellow().bold()))
            .ok();
    }

    term.write_line(&format!("  {} clusters", style(clusters.len()).cyan()))
        .ok();
    term.write_line(&format!(
        "  {} duplicate images",
        style(clusters.duplicate_count()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    if clusters.is_empty() {
        term.write_line("  No clusters found matching your criteria.").ok();
        return;
    }

    for (i, cluster) in clusters.iter().enumerate() {
        term.write_line(&format!(
            "  {} ({} images)",
            style(format!("Cluster {}:", i + 1)).bold(),
            cluster.len()
        ))
        .ok();
        print_cluster_images(term, cluster);
        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{}",
        style("No files were deleted. Use `dedupe` to remove duplicates.").dim()
    ))
    .ok();
}

fn print_cluster_images(term: &Term, cluster: &Cluster) {
    for (idx, image) in cluster.images().iter().enumerate() {
        let marker = if idx == 0 {
            style("★").green().to_string()
        } else {
            style("○").dim().to_string()
        };
        term.write_line(&format!("    {} {}", marker, display_path(image)))
            .ok();
    }
}

fn print_json_results(collected: &Collected) {
    let output = serde_json::json!({
        "finished": collected.summary.is_some(),
        "summary": collected.summary,
        "cluster_count": collected.clusters.len(),
        "duplicate_count": collected.clusters.duplicate_count(),
        "clusters": collected.clusters.iter().map(|c| {
            serde_json::json!({
                "representative": c.representative(),
                "images": c.images(),
            })
        }).collect::<Vec<_>>()
    });

    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{text}"),
        Err(e) => warn!(error = %e, "Failed to render JSON"),
    }
}

fn print_minimal_results(clusters: &ClusterSet) {
    for cluster in clusters {
        for image in cluster.duplicates() {
            println!("{}", image.display());
        }
    }
}

fn print_delete_report(term: &Term, report: &DeleteReport, mode: DeleteMode) {
    let verb = match mode {
        DeleteMode::Permanent => "Deleted",
        DeleteMode::Trash => "Moved to trash",
    };
    term.write_line(&format!(
        "{} {} {} images and {} label files",
        style("✓").green().bold(),
        verb,
        style(report.deleted.len()).cyan(),
        style(report.labels_removed).cyan()
    ))
    .ok();

    for failure in &report.failures {
        term.write_line(&format!("  {} {}", style("✗").red(), failure.error))
            .ok();
    }
}

/// Shorten paths under the home directory to `~/...`
fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}
