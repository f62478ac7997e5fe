//! Parameter sweep: exhaustive grid search over discrete candidates.
//!
//! Each candidate assignment is applied to a copy of the raw document,
//! normalized, run on a fresh engine and scored on one target variable.
//! The engine knows nothing about sweeps.

use crate::{
    calibration::{self, ReferenceTable, VariableMapping},
    config::{ConfigSection, RawConfig, SimConfig},
    error::{SimError, SimResult},
};
use serde::{Deserialize, Serialize};

/// One swept key and the values to try for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepAxis {
    pub section: ConfigSection,
    pub key: String,
    pub candidates: Vec<f64>,
}

impl SweepAxis {
    pub fn new(section: ConfigSection, key: &str, candidates: &[f64]) -> Self {
        Self {
            section,
            key: key.to_string(),
            candidates: candidates.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    /// `(key, value)` per axis, in axis order.
    pub best_assignment: Vec<(String, f64)>,
    pub best_error: f64,
    pub evaluated: usize,
    pub best_config: RawConfig,
}

/// Every combination of candidate indices, first axis slowest.
fn combinations(axes: &[SweepAxis]) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new()];
    for axis in axes {
        out = out
            .into_iter()
            .flat_map(|prefix| {
                (0..axis.candidates.len()).map(move |i| {
                    let mut next = prefix.clone();
                    next.push(i);
                    next
                })
            })
            .collect();
    }
    out
}

/// Try every assignment and keep the one with the lowest error on
/// `target`. Ties keep the earliest assignment.
pub fn grid_search(
    base: &RawConfig,
    axes: &[SweepAxis],
    reference: &ReferenceTable,
    target: &VariableMapping,
) -> SimResult<SweepOutcome> {
    if let Some(empty) = axes.iter().find(|a| a.candidates.is_empty()) {
        return Err(SimError::Other(anyhow::anyhow!(
            "sweep axis '{}' has no candidates",
            empty.key
        )));
    }

    let mut best: Option<SweepOutcome> = None;
    let mut evaluated = 0;

    for (n, combo) in combinations(axes).into_iter().enumerate() {
        let mut raw = base.clone();
        let assignment: Vec<(String, f64)> = axes
            .iter()
            .zip(&combo)
            .map(|(axis, &i)| {
                raw.set(axis.section, &axis.key, axis.candidates[i]);
                (axis.key.clone(), axis.candidates[i])
            })
            .collect();

        let config = SimConfig::from_raw(&raw)?;
        let report = calibration::calibrate(
            format!("sweep-{n}"),
            &config,
            reference,
            std::slice::from_ref(target),
        )?;
        let error = report.scores.first().map_or(f64::INFINITY, |s| s.mape);
        evaluated += 1;

        if best.as_ref().map_or(true, |b| error < b.best_error) {
            log::debug!("sweep: new best {error:.2}% at {assignment:?}");
            best = Some(SweepOutcome {
                best_assignment: assignment,
                best_error: error,
                evaluated: 0,
                best_config: raw,
            });
        }
    }

    let mut outcome = best.ok_or(SimError::EmptyReference)?;
    outcome.evaluated = evaluated;
    log::info!(
        "sweep: {evaluated} candidates, best {:.2}% at {:?}",
        outcome.best_error,
        outcome.best_assignment
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinations_enumerate_cartesian_product() {
        let axes = vec![
            SweepAxis::new(ConfigSection::Params, "a", &[1.0, 2.0]),
            SweepAxis::new(ConfigSection::Params, "b", &[1.0, 2.0, 3.0]),
        ];
        let combos = combinations(&axes);
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0], vec![0, 0]);
        assert_eq!(combos[1], vec![0, 1]);
        assert_eq!(combos[5], vec![1, 2]);
    }

    #[test]
    fn no_axes_evaluates_base_once() {
        assert_eq!(combinations(&[]), vec![Vec::<usize>::new()]);
    }
}
