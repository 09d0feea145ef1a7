//! # CLI Module
//!
//! Command-line interface for the camera-trap sorter.
//!
//! ## Usage
//! ```bash
//! # Scan directories and summarize trigger events
//! trap-sort scan ~/traps/2019 ~/traps/2020
//!
//! # Wider merge window, JSON output
//! trap-sort scan ~/traps/2019 --window 30 --output json
//!
//! # Read an already sorted collection and report duplicates
//! trap-sort labeled ~/training --class Cheetah --class Leopard
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use trap_sorter::core::consolidate::DEFAULT_MERGE_WINDOW_SECS;
use trap_sorter::core::pipeline::Pipeline;
use trap_sorter::core::scanner::{read_labeled_directories, DirectoryScanner, ScanConfig};
use trap_sorter::core::table::{DuplicateFlag, EventTable};
use trap_sorter::core::worktree::{ItemSnapshot, ProcessState};
use trap_sorter::error::{Result, TrapError};
use trap_sorter::events::{Event, EventChannel, ItemEvent, PipelineEvent};

/// Camera-trap sorter - group trigger events and sort images by species
#[derive(Parser, Debug)]
#[command(name = "trap-sort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan camera-trap directories and summarize their events
    Scan {
        /// Directories to scan (immediate subdirectories are scanned separately)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Merge events from the same camera closer than this many seconds
        #[arg(short, long, default_value_t = DEFAULT_MERGE_WINDOW_SECS)]
        window: i64,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// List every event
        #[arg(short, long)]
        verbose: bool,
    },
    /// Read a collection sorted into one folder per class
    Labeled {
        /// Folder holding one subdirectory per class
        root: PathBuf,

        /// Class names; a subdirectory belongs to the first name it contains
        #[arg(short, long = "class", required = true)]
        classes: Vec<String>,

        /// Merge events from the same camera closer than this many seconds
        #[arg(short, long, default_value_t = DEFAULT_MERGE_WINDOW_SECS)]
        window: i64,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// One tab-separated line per directory
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            paths,
            window,
            output,
            include_hidden,
            verbose,
        } => run_scan(paths, window, output, include_hidden, verbose),
        Commands::Labeled {
            root,
            classes,
            window,
            output,
        } => run_labeled(root, classes, window, output),
    }
}

fn run_scan(
    paths: Vec<PathBuf>,
    window: i64,
    output: OutputFormat,
    include_hidden: bool,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output);

    let config = ScanConfig {
        merge_window_secs: window,
        include_hidden,
        ..ScanConfig::default()
    };
    let (sender, receiver) = EventChannel::new();
    let controller = Pipeline::builder()
        .scan_config(config)
        .events(sender)
        .spawn()?;

    let mut added = 0;
    for path in &paths {
        match controller.add_dir(path) {
            Ok(Some(_)) => added += 1,
            Ok(None) => {}
            Err(err) => {
                term.write_line(&format!("{} {}", style("✗").red().bold(), err)).ok();
            }
        }
    }
    if added == 0 {
        return Err(TrapError::Config("no directories to scan".to_string()));
    }

    let progress = matches!(output, OutputFormat::Pretty).then(|| {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb
    });

    for event in receiver.iter() {
        match event {
            Event::Progress(p) => {
                if let Some(pb) = &progress {
                    pb.set_position(u64::from(p.percent));
                    if let Some(item) = controller.tree().get(p.id) {
                        pb.set_message(display_path(item.path()));
                    }
                }
            }
            Event::Item(ItemEvent::Error { path, message, .. }) => {
                if let Some(pb) = &progress {
                    pb.println(format!(
                        "{} {}: {}",
                        style("!").yellow().bold(),
                        display_path(&path),
                        message
                    ));
                }
            }
            Event::Pipeline(PipelineEvent::Idle) if !controller.tree().has_queued() => break,
            Event::Pipeline(PipelineEvent::Stopped) => break,
            _ => {}
        }
    }
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let snapshot = controller.snapshot();
    match output {
        OutputFormat::Pretty => print_pretty_scan(&term, &controller, &snapshot, verbose),
        OutputFormat::Json => {
            let tables: BTreeMap<String, _> = controller
                .tree()
                .leaves()
                .iter()
                .filter_map(|item| {
                    item.table()
                        .map(|t| (item.path().display().to_string(), t.summary()))
                })
                .collect();
            print_json(&serde_json::json!({
                "directories": snapshot,
                "summaries": tables,
            }))?;
        }
        OutputFormat::Minimal => {
            for item in flatten(&snapshot) {
                println!(
                    "{}\t{}\t{}\t{}",
                    item.path.display(),
                    item.state,
                    item.images,
                    item.events
                );
            }
        }
    }

    controller.shutdown();
    Ok(())
}

fn run_labeled(
    root: PathBuf,
    classes: Vec<String>,
    window: i64,
    output: OutputFormat,
) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output);

    let scanner = DirectoryScanner::new(ScanConfig {
        merge_window_secs: window,
        ..ScanConfig::default()
    });
    let table = read_labeled_directories(&scanner, &root, &classes)?;

    match output {
        OutputFormat::Pretty => print_pretty_labeled(&term, &root, &table, &classes),
        OutputFormat::Json => print_json(&serde_json::json!({
            "root": root,
            "summary": table.summary(),
            "per_class": per_class_counts(&table, &classes),
        }))?,
        OutputFormat::Minimal => {
            for record in table.iter().filter(|r| r.duplicate != DuplicateFlag::Unique) {
                println!("{}\t{}", record.path.display(), record.duplicate.code());
            }
        }
    }
    Ok(())
}

fn print_header(term: &Term, output: OutputFormat) {
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Camera Trap Sorter").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }
}

fn print_pretty_scan(
    term: &Term,
    controller: &trap_sorter::core::pipeline::PipelineController,
    snapshot: &[ItemSnapshot],
    verbose: bool,
) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    for root in snapshot {
        print_item(term, root, 1);
        for child in &root.children {
            print_item(term, child, 2);
        }

        if verbose {
            let leaves = std::iter::once(root).chain(root.children.iter());
            for leaf in leaves {
                if let Some(table) = controller.table(leaf.id) {
                    print_events(term, &table);
                }
            }
        }
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "{}",
        style("No files were modified. Classification output is written only on request.").dim()
    ))
    .ok();
}

fn print_item(term: &Term, item: &ItemSnapshot, depth: usize) {
    let marker = match item.state {
        ProcessState::Read | ProcessState::Classified => style("●").green(),
        ProcessState::Failed => style("●").red(),
        _ => style("○").dim(),
    };
    term.write_line(&format!(
        "{}{} {}  {}",
        "  ".repeat(depth),
        marker,
        style(display_path(&item.path)).bold(),
        style(&item.status).dim()
    ))
    .ok();
}

fn print_events(term: &Term, table: &EventTable) {
    let mut events: BTreeMap<&str, (usize, DuplicateFlag)> = BTreeMap::new();
    for record in table.iter() {
        let entry = events
            .entry(record.event_key.as_str())
            .or_insert((0, DuplicateFlag::Unique));
        entry.0 += 1;
        if record.duplicate.code() > entry.1.code() {
            entry.1 = record.duplicate;
        }
    }

    for (key, (images, duplicate)) in events {
        let flag = match duplicate {
            DuplicateFlag::Unique => String::new(),
            DuplicateFlag::Redundant => style(" redundant copies").yellow().to_string(),
            DuplicateFlag::Conflict => style(" conflicting labels").red().to_string(),
        };
        term.write_line(&format!("      {} ({} images){}", key, images, flag))
            .ok();
    }
}

fn print_pretty_labeled(term: &Term, root: &Path, table: &EventTable, classes: &[String]) {
    let summary = table.summary();
    term.write_line(&format!(
        "{} Read {}",
        style("✓").green().bold(),
        display_path(root)
    ))
    .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} images in {} events ({} after merging)",
        style(summary.images).cyan(),
        style(summary.events).cyan(),
        style(summary.extended_events).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} redundant copies, {} with conflicting labels",
        style(summary.redundant).yellow(),
        style(summary.conflicts).red()
    ))
    .ok();
    term.write_line("").ok();

    for (class, count) in per_class_counts(table, classes) {
        term.write_line(&format!("  {:<20} {}", class, count)).ok();
    }
}

fn per_class_counts(table: &EventTable, classes: &[String]) -> BTreeMap<String, usize> {
    classes
        .iter()
        .map(|class| {
            let count = table
                .iter()
                .filter(|r| r.label.as_deref() == Some(class.as_str()))
                .count();
            (class.clone(), count)
        })
        .collect()
}

fn flatten(snapshot: &[ItemSnapshot]) -> Vec<&ItemSnapshot> {
    snapshot
        .iter()
        .flat_map(|root| std::iter::once(root).chain(root.children.iter()))
        .collect()
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| TrapError::Config(format!("failed to render JSON: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Shorten paths under the home directory to `~/...`
fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}
