//! # Analyzer
//!
//! Post-run statistics over a set of ranked strategy summaries. Its one job
//! is answering "holding everything else equal, how did parameter X move
//! the results?" by averaging performance and drawdown per distinct value
//! of a parameter across the permutation-expanded variants of one strategy.

use backtester::StrategySummary;
use rust_decimal::Decimal;
use serde_json::Value;
use std::cmp::Ordering;

pub mod error;

pub use error::AnalyzerError;

/// Averaged results for one distinct value of the examined parameter.
#[derive(Debug, Clone)]
pub struct ParamBucket {
    pub value: Value,
    pub mean_performance_pct: Decimal,
    pub mean_drawdown_pct: Decimal,
    pub runs: usize,
}

/// Groups the summaries of one strategy type by the value a parameter took
/// and averages each group's performance and max drawdown.
///
/// Summaries of other strategies, and summaries whose parameters lack the
/// key, are ignored. The buckets come back sorted by parameter value,
/// numerically where both values are numbers.
pub fn bucket_by_parameter(
    summaries: &[StrategySummary],
    strategy: &str,
    parameter: &str,
) -> Result<Vec<ParamBucket>, AnalyzerError> {
    let mut buckets: Vec<(Value, Vec<Decimal>, Vec<Decimal>)> = Vec::new();

    for summary in summaries {
        let matches = summary
            .parameters
            .get("strategy")
            .and_then(Value::as_str)
            .map(|name| name == strategy)
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let value = match summary.parameters.get(parameter) {
            Some(value) => value,
            None => continue,
        };
        match buckets.iter_mut().find(|(key, _, _)| key == value) {
            Some((_, performances, drawdowns)) => {
                performances.push(summary.performance_pct);
                drawdowns.push(summary.max_drawdown_pct);
            }
            None => buckets.push((
                value.clone(),
                vec![summary.performance_pct],
                vec![summary.max_drawdown_pct],
            )),
        }
    }

    if buckets.is_empty() {
        return Err(AnalyzerError::NoMatchingRuns {
            strategy: strategy.to_string(),
            parameter: parameter.to_string(),
        });
    }

    buckets.sort_by(|(a, _, _), (b, _, _)| compare_values(a, b));
    let buckets = buckets
        .into_iter()
        .map(|(value, performances, drawdowns)| {
            let runs = performances.len();
            let count = Decimal::from(runs as u64);
            let bucket = ParamBucket {
                value,
                mean_performance_pct: performances.iter().sum::<Decimal>() / count,
                mean_drawdown_pct: drawdowns.iter().sum::<Decimal>() / count,
                runs,
            };
            tracing::info!(
                "{} val {} avg_performance {:.2} avg_maxdrawdown {:.2}",
                parameter,
                bucket.value,
                bucket.mean_performance_pct,
                bucket.mean_drawdown_pct
            );
            bucket
        })
        .collect();
    Ok(buckets)
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
