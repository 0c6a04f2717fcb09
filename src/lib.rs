//! Vocsort: curation for category-partitioned Pascal VOC datasets.
//!
//! A dataset is a directory tree where each category directory holds image
//! files and same-stem `.xml` annotations. Vocsort indexes such trees and
//! sorts, samples, cleans and reconciles them.
//!
//! # Modules
//!
//! - [`annotation`]: VOC annotation records, XML reading and writing
//! - [`index`]: Sample index builder and category keys
//! - [`reclassify`]: Re-derive categories from annotation content
//! - [`curate`]: Merging, cleanup and in-place annotation fixes
//! - [`sample`]: Per-category random sampling
//! - [`transfer`]: Gathering, extension conversion and pool redistribution
//! - [`stats`]: Dataset statistics
//! - [`reconcile`]: Classification result reconciliation
//! - [`error`]: Error types for vocsort operations

pub mod annotation;
pub mod curate;
pub mod error;
pub mod fsops;
pub mod index;
pub mod reclassify;
pub mod reconcile;
pub mod sample;
pub mod stats;
pub mod transfer;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

pub use error::VocsortError;

use crate::curate::MergeSpec;
use crate::index::{CategoryKey, IndexOptions, Layout, SampleIndex, DEFAULT_IMAGE_EXT};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "VOCSORT_LOG";

/// The vocsort CLI application.
#[derive(Parser)]
#[command(name = "vocsort")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Image extension, matched case-sensitively ('.jpg' and 'jpg' are equivalent).
    #[arg(
        long,
        global = true,
        env = "VOCSORT_IMAGE_EXT",
        default_value = DEFAULT_IMAGE_EXT
    )]
    image_ext: String,

    /// Output format for reports.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Index a dataset and print per-category sample counts.
    Index(IndexArgs),
    /// Compute statistics from a dataset's annotations.
    Stats(StatsArgs),
    /// Randomly sample N samples per category into <root>_<suffix>.
    Sample(SampleArgs),
    /// Delete annotations that hold no objects.
    DeleteEmpty(IndexArgs),
    /// Move files without a complete sample pair into <root>_lack_info.
    RelocateIncomplete(IndexArgs),
    /// Move samples holding objects of another category into <root>_multiDefect.
    IsolateMismatched(IndexArgs),
    /// Rename the objects labelled as a category to another label, in place.
    RenameLabel(RenameLabelArgs),
    /// Stretch the single object of each sample in a category over the whole frame.
    FullFrame(CategoryArgs),
    /// Clear every difficult flag.
    ResetDifficult(IndexArgs),
    /// Copy samples into the category their largest object names.
    Reclassify(ReclassifyArgs),
    /// Copy every sample into <root>_gather/all.
    Gather(IndexArgs),
    /// Rename image extensions (e.g. '.JPG' to '.jpg') under a directory.
    ConvertExt(ConvertExtArgs),
    /// Move the samples listed in this dataset out of another tree.
    ExtractListed(ExtractListedArgs),
    /// Sort a flat pool of files into <pool>_new/<category>/.
    Redistribute(RedistributeArgs),
    /// Reconcile a <ground_truth>/<predicted>/ classification result tree.
    Reconcile(ReconcileArgs),
}

/// Arguments shared by every command that indexes a dataset.
#[derive(clap::Args)]
struct IndexArgs {
    /// Dataset root.
    root: PathBuf,

    /// Treat every directory below the root that holds files as a category.
    #[arg(long)]
    recursive: bool,

    /// Admit images without an annotation.
    #[arg(long)]
    image_only: bool,
}

impl IndexArgs {
    fn options(&self, image_ext: &str) -> IndexOptions {
        IndexOptions {
            image_ext: image_ext.to_string(),
            require_annotation: !self.image_only,
            layout: if self.recursive {
                Layout::Recursive
            } else {
                Layout::Flat
            },
        }
    }

    fn build(&self, image_ext: &str) -> Result<SampleIndex, VocsortError> {
        SampleIndex::build(&self.root, &self.options(image_ext))
    }
}

#[derive(clap::Args)]
struct StatsArgs {
    #[command(flatten)]
    index: IndexArgs,

    /// Merge categories before computing, as NEW=OLD1,OLD2. Repeatable.
    #[arg(long = "merge", value_name = "NEW=OLD,...")]
    merges: Vec<MergeSpec>,
}

#[derive(clap::Args)]
struct SampleArgs {
    #[command(flatten)]
    index: IndexArgs,

    /// Samples to keep per category.
    #[arg(short = 'n', long = "count")]
    count: usize,

    /// Category-specific count, as CATEGORY=N. Repeatable.
    #[arg(long = "override", value_name = "CATEGORY=N", value_parser = sample::parse_override)]
    overrides: Vec<(CategoryKey, usize)>,

    /// Seed for the shuffle; a random seed is drawn and reported if omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Suffix of the selected tree.
    #[arg(long, default_value = sample::DEFAULT_SAMPLE_SUFFIX)]
    suffix: String,

    /// Merge categories before sampling, as NEW=OLD1,OLD2. Repeatable.
    #[arg(long = "merge", value_name = "NEW=OLD,...")]
    merges: Vec<MergeSpec>,
}

#[derive(clap::Args)]
struct CategoryArgs {
    #[command(flatten)]
    index: IndexArgs,

    /// Category to operate on, e.g. 'scratch' or 'difficult/scratch'.
    #[arg(long)]
    category: CategoryKey,
}

#[derive(clap::Args)]
struct RenameLabelArgs {
    #[command(flatten)]
    target: CategoryArgs,

    /// Label that replaces the category's label.
    #[arg(long = "to")]
    replacement: String,
}

#[derive(clap::Args)]
struct ReclassifyArgs {
    #[command(flatten)]
    index: IndexArgs,

    /// Destination root (default: <root>_correct).
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Skip annotations without objects instead of failing.
    #[arg(long)]
    skip_empty: bool,
}

#[derive(clap::Args)]
struct ConvertExtArgs {
    /// Directory to walk.
    root: PathBuf,

    /// Extension to rename from. Repeatable.
    #[arg(long = "from", default_value = ".JPG")]
    from: Vec<String>,

    /// Extension to rename to.
    #[arg(long = "to", default_value = DEFAULT_IMAGE_EXT)]
    to: String,
}

#[derive(clap::Args)]
struct ExtractListedArgs {
    #[command(flatten)]
    index: IndexArgs,

    /// Tree to move the listed samples out of.
    #[arg(long)]
    target: PathBuf,
}

#[derive(clap::Args)]
struct RedistributeArgs {
    #[command(flatten)]
    index: IndexArgs,

    /// Flat directory holding the files to sort.
    #[arg(long)]
    pool: PathBuf,
}

#[derive(clap::Args)]
struct ReconcileArgs {
    /// Result root, shaped <ground_truth>/<predicted>/<image>.
    root: PathBuf,

    /// What to do with the predictions.
    #[arg(long, value_enum, default_value_t = ReconcileMode::Reconstruct)]
    mode: ReconcileMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReconcileMode {
    /// Count correct and incorrect predictions without copying.
    Summary,
    /// Copy wrong predictions into <root>_incorrect.
    MergeIncorrect,
    /// Copy every prediction into <root>_correct or <root>_incorrect.
    Reconstruct,
}

/// Run the vocsort CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), VocsortError> {
    let cli = Cli::parse();
    init_tracing();

    let Some(command) = cli.command else {
        println!("vocsort {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Curation for category-partitioned Pascal VOC datasets.");
        println!();
        println!("Run 'vocsort --help' for usage information.");
        return Ok(());
    };

    let ext = cli.image_ext.as_str();
    let out = cli.output;

    match command {
        Commands::Index(args) => emit(&args.build(ext)?.report(), out),
        Commands::Stats(args) => {
            let mut index = args.index.build(ext)?;
            curate::merge_categories(&mut index, &args.merges);
            emit(&stats::stats_dataset(&index)?, out)
        }
        Commands::Sample(args) => run_sample(args, ext, out),
        Commands::DeleteEmpty(args) => {
            let mut index = args.build(ext)?;
            emit(&curate::delete_empty_annotations(&mut index)?, out)
        }
        Commands::RelocateIncomplete(args) => {
            emit(&curate::relocate_incomplete(&args.build(ext)?)?, out)
        }
        Commands::IsolateMismatched(args) => {
            let mut index = args.build(ext)?;
            emit(&curate::isolate_mismatched(&mut index)?, out)
        }
        Commands::RenameLabel(args) => {
            let index = args.target.index.build(ext)?;
            let report = curate::correct_label(&index, &args.target.category, &args.replacement)?;
            emit(&report, out)
        }
        Commands::FullFrame(args) => {
            let index = args.index.build(ext)?;
            emit(&curate::normalize_full_frame(&index, &args.category)?, out)
        }
        Commands::ResetDifficult(args) => emit(&curate::reset_difficult(&args.build(ext)?)?, out),
        Commands::Reclassify(args) => {
            let index = args.index.build(ext)?;
            let opts = reclassify::ReclassifyOptions {
                dest: args.dest,
                on_empty: if args.skip_empty {
                    reclassify::EmptyAnnotationPolicy::Skip
                } else {
                    reclassify::EmptyAnnotationPolicy::Fail
                },
            };
            emit(&reclassify::reclassify(&index, &opts)?, out)
        }
        Commands::Gather(args) => emit(&transfer::gather_all(&args.build(ext)?)?, out),
        Commands::ConvertExt(args) => {
            let report = transfer::convert_image_extension(&args.root, &args.from, &args.to)?;
            emit(&report, out)
        }
        Commands::ExtractListed(args) => {
            let index = args.index.build(ext)?;
            emit(&transfer::extract_listed(&index, &args.target)?, out)
        }
        Commands::Redistribute(args) => {
            let index = args.index.build(ext)?;
            emit(&transfer::redistribute(&index, &args.pool)?, out)
        }
        Commands::Reconcile(args) => {
            let mut index = reconcile::build_result_index(&args.root, ext)?;
            let report = match args.mode {
                ReconcileMode::Summary => reconcile::filter_correct(&mut index)?,
                ReconcileMode::MergeIncorrect => reconcile::merge_incorrect(&mut index)?,
                ReconcileMode::Reconstruct => reconcile::reconstruct_result(&index)?,
            };
            emit(&report, out)
        }
    }
}

fn run_sample(args: SampleArgs, ext: &str, out: OutputFormat) -> Result<(), VocsortError> {
    let mut index = args.index.build(ext)?;
    curate::merge_categories(&mut index, &args.merges);

    let opts = sample::SampleOptions {
        per_category: args.count,
        overrides: args.overrides.into_iter().collect::<BTreeMap<_, _>>(),
        seed: args.seed,
        suffix: args.suffix,
    };
    emit(&sample::sample_dataset(&index, &opts)?, out)
}

/// Print a report as text or pretty JSON.
fn emit<R: Serialize + fmt::Display>(report: &R, output: OutputFormat) -> Result<(), VocsortError> {
    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .map_err(|source| VocsortError::ReportJson { source })?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{report}"),
    }
    Ok(())
}

/// Install the stderr log subscriber, filtered by `VOCSORT_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be set when the CLI is driven in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
