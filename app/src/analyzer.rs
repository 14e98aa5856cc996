// In app/src/analyzer.rs

use crate::optimizer::OptimizationRun;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct RankedReport {
    pub score: f64,
    pub run: OptimizationRun,
}

/// Ranks the results of an optimization job, best first.
///
/// Runs with fewer than `min_trades` round trips are dropped before scoring.
pub fn analyze_and_rank_results(runs: Vec<OptimizationRun>, min_trades: u32) -> Vec<RankedReport> {
    let total_reports = runs.len();

    let mut ranked_reports: Vec<RankedReport> = runs
        .into_iter()
        .filter(|run| run.report.total_trades >= min_trades)
        .map(|run| RankedReport {
            score: run.report.net_pnl_percentage,
            run,
        })
        .collect();

    tracing::info!(
        total_reports,
        passing_reports = ranked_reports.len(),
        min_trades,
        "Finished scoring reports."
    );

    // Higher is better.
    ranked_reports.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked_reports
}
