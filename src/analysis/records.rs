use itertools::izip;

use crate::analysis::PipelineError;
use crate::domain::MarketCondition;
use crate::models::SummaryRecord;

/// Zip the per-window outputs into records with sequential ids starting at 0.
/// Any length mismatch aborts; nothing is truncated to the shortest input.
pub fn build_summary_records(
    entropies: &[f64],
    volatilities: &[f64],
    conditions: &[MarketCondition],
) -> Result<Vec<SummaryRecord>, PipelineError> {
    if entropies.len() != volatilities.len() || entropies.len() != conditions.len() {
        return Err(PipelineError::MisalignedSequences {
            entropy_len: entropies.len(),
            volatility_len: volatilities.len(),
            condition_len: conditions.len(),
        });
    }

    Ok(izip!(entropies, volatilities, conditions)
        .enumerate()
        .map(|(window_id, (&entropy, &volatility, &condition))| {
            SummaryRecord::new(window_id, entropy, volatility, condition)
        })
        .collect())
}
