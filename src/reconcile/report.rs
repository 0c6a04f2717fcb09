//! Reconciliation report types.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// One (ground truth, predicted) cell with its sample count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfusionCell {
    pub ground_truth: String,
    pub predicted: String,
    pub count: usize,
}

/// Outcome of a reconciliation step.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReconcileReport {
    pub correct: usize,
    pub incorrect: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incorrect_root: Option<PathBuf>,
    /// Cells of the confusion matrix that hold samples, in key order.
    pub cells: Vec<ConfusionCell>,
}

impl ReconcileReport {
    /// Share of correct predictions, if there were any samples.
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.correct + self.incorrect;
        (total > 0).then(|| self.correct as f64 / total as f64)
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} correct, {} incorrect prediction(s)",
            self.correct, self.incorrect
        )?;
        if let Some(accuracy) = self.accuracy() {
            writeln!(f, "  accuracy: {:.2}%", accuracy * 100.0)?;
        }
        if let Some(root) = &self.correct_root {
            writeln!(f, "  correct -> {}", root.display())?;
        }
        if let Some(root) = &self.incorrect_root {
            writeln!(f, "  incorrect -> {}", root.display())?;
        }
        for cell in &self.cells {
            let marker = if cell.ground_truth == cell.predicted {
                ' '
            } else {
                '!'
            };
            writeln!(
                f,
                "  {marker} {} -> {}: {}",
                cell.ground_truth, cell.predicted, cell.count
            )?;
        }
        Ok(())
    }
}
