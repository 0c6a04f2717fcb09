//! Per-category random sampling into fresh trees.
//!
//! Each category's samples are shuffled and split into a selected part of
//! at most `n` samples and an overflow part holding the rest. The selected
//! part is copied into `<root>_<suffix>` and the overflow into
//! `<root>_<suffix>_others`, both mirroring the category layout.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, RngExt, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::VocsortError;
use crate::fsops;
use crate::index::{validate_segment, CategoryKey, SampleIndex};

/// Default suffix of the selected tree.
pub const DEFAULT_SAMPLE_SUFFIX: &str = "sample";

/// Sampling options.
#[derive(Clone, Debug)]
pub struct SampleOptions {
    /// Samples kept per category unless overridden.
    pub per_category: usize,
    /// Category-specific counts, checked before `per_category`.
    pub overrides: BTreeMap<CategoryKey, usize>,
    pub seed: Option<u64>,
    /// The selected tree is `<root>_<suffix>`.
    pub suffix: String,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            per_category: 0,
            overrides: BTreeMap::new(),
            seed: None,
            suffix: DEFAULT_SAMPLE_SUFFIX.to_string(),
        }
    }
}

impl SampleOptions {
    /// Target count for one category.
    pub fn target_for(&self, key: &CategoryKey) -> usize {
        self.overrides
            .get(key)
            .copied()
            .unwrap_or(self.per_category)
    }
}

/// Counts for one category.
#[derive(Clone, Debug, Serialize)]
pub struct CategorySample {
    pub category: CategoryKey,
    pub total: usize,
    pub selected: usize,
    pub overflow: usize,
}

/// Outcome of [`sample_dataset`].
#[derive(Clone, Debug, Serialize)]
pub struct SampleReport {
    pub selected_root: PathBuf,
    pub overflow_root: PathBuf,
    /// Seed the shuffle used; pass it back to repeat the run.
    pub seed: u64,
    pub categories: Vec<CategorySample>,
}

impl SampleReport {
    pub fn selected_total(&self) -> usize {
        self.categories.iter().map(|row| row.selected).sum()
    }

    pub fn overflow_total(&self) -> usize {
        self.categories.iter().map(|row| row.overflow).sum()
    }
}

impl fmt::Display for SampleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Sampled {} into {}",
            self.selected_total(),
            self.selected_root.display()
        )?;
        writeln!(
            f,
            "  {} overflow into {}",
            self.overflow_total(),
            self.overflow_root.display()
        )?;
        writeln!(f, "  seed: {}", self.seed)?;
        for row in &self.categories {
            writeln!(
                f,
                "  {}: {} of {} selected, {} overflow",
                row.category, row.selected, row.total, row.overflow
            )?;
        }
        Ok(())
    }
}

/// Validate sampling options before running.
pub fn validate_sample_options(opts: &SampleOptions) -> Result<(), VocsortError> {
    if opts.per_category == 0 {
        return Err(VocsortError::InvalidSampleParams {
            message: "per-category count must be at least 1".to_string(),
        });
    }
    validate_segment(&opts.suffix).map_err(|reason| VocsortError::InvalidSampleParams {
        message: format!("suffix '{}': {reason}", opts.suffix),
    })
}

/// Parse a `CATEGORY=N` override.
pub fn parse_override(raw: &str) -> Result<(CategoryKey, usize), VocsortError> {
    let (key, count) = raw
        .split_once('=')
        .ok_or_else(|| VocsortError::InvalidSampleParams {
            message: format!("override '{raw}' must look like CATEGORY=N"),
        })?;
    let count = count
        .trim()
        .parse::<usize>()
        .map_err(|_| VocsortError::InvalidSampleParams {
            message: format!("override '{raw}': '{count}' is not a count"),
        })?;
    if count == 0 {
        return Err(VocsortError::InvalidSampleParams {
            message: format!("override '{raw}': count must be at least 1"),
        });
    }
    Ok((key.trim().parse()?, count))
}

/// Shuffle `items` and split them into at most `n` selected and the rest.
///
/// The two parts are disjoint and together hold every input item once.
pub fn partition_random<T: Clone, R: Rng + ?Sized>(
    items: &[T],
    n: usize,
    rng: &mut R,
) -> (Vec<T>, Vec<T>) {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);
    let overflow = shuffled.split_off(n.min(shuffled.len()));
    (shuffled, overflow)
}

/// Sample every category of `index` into two fresh trees.
///
/// Fails with [`VocsortError::DestinationExists`] before copying anything if
/// either tree already exists.
pub fn sample_dataset(
    index: &SampleIndex,
    opts: &SampleOptions,
) -> Result<SampleReport, VocsortError> {
    validate_sample_options(opts)?;

    let selected_root = fsops::sibling_root(index.root(), &opts.suffix)?;
    let overflow_root = fsops::sibling_root(&selected_root, "others")?;
    fsops::ensure_absent(&selected_root)?;
    fsops::ensure_absent(&overflow_root)?;

    for key in opts.overrides.keys() {
        if !index.contains_category(key) {
            warn!("sample override for unknown category '{key}' is ignored");
        }
    }

    // Unseeded runs draw their seed up front; the report carries it.
    let seed = opts.seed.unwrap_or_else(|| rand::rng().random::<u64>());
    let mut rng = StdRng::seed_from_u64(seed);

    let mut report = SampleReport {
        selected_root: selected_root.clone(),
        overflow_root: overflow_root.clone(),
        seed,
        categories: Vec::new(),
    };

    for (key, entries) in index.categories() {
        let target = opts.target_for(key);
        let (selected, overflow) = partition_random(entries, target, &mut rng);

        let selected_dir = key.dir_under(&selected_root);
        let overflow_dir = key.dir_under(&overflow_root);
        fs::create_dir_all(&selected_dir).map_err(VocsortError::Io)?;
        fs::create_dir_all(&overflow_dir).map_err(VocsortError::Io)?;

        index.copy_samples_into(&selected, &selected_dir)?;
        index.copy_samples_into(&overflow, &overflow_dir)?;

        info!(
            "sampled category {key}: {} selected, {} overflow",
            selected.len(),
            overflow.len()
        );
        report.categories.push(CategorySample {
            category: key.clone(),
            total: entries.len(),
            selected: selected.len(),
            overflow: overflow.len(),
        });
    }

    Ok(report)
}
