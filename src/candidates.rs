//! Bounded, ordered search over alternative parameters.
//!
//! Scripts that "try another range" or "try another price limit" when a
//! transaction reverts walk a fixed candidate list here instead of looping.

use std::{fmt::Debug, future::Future};

use alloy::primitives::U256;
use tracing::{info, warn};

use crate::{
    error::{SearchError, TickMathError},
    tick_math::sqrt_price_limit,
    tick_range::{compute_range_for_percent_band, TickRange},
};

/// Tries `candidates` in order and returns the first that `attempt` accepts,
/// together with its result.
pub async fn first_viable<T, R, E, F, Fut>(
    candidates: impl IntoIterator<Item = T>,
    mut attempt: F,
) -> Result<(T, R), SearchError<E>>
where
    T: Clone + Debug,
    E: Debug,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let mut attempts = 0;
    let mut last_error = None;
    for candidate in candidates {
        attempts += 1;
        match attempt(candidate.clone()).await {
            Ok(result) => {
                info!(attempts, ?candidate, "candidate accepted");
                return Ok((candidate, result));
            }
            Err(err) => {
                warn!(attempts, ?candidate, error = ?err, "candidate rejected");
                last_error = Some(err);
            }
        }
    }
    Err(SearchError::NoViableCandidate {
        attempts,
        last_error,
    })
}

/// Blocking twin of [`first_viable`].
pub fn first_viable_sync<T, R, E, F>(
    candidates: impl IntoIterator<Item = T>,
    mut attempt: F,
) -> Result<(T, R), SearchError<E>>
where
    T: Clone + Debug,
    E: Debug,
    F: FnMut(T) -> Result<R, E>,
{
    let mut attempts = 0;
    let mut last_error = None;
    for candidate in candidates {
        attempts += 1;
        match attempt(candidate.clone()) {
            Ok(result) => return Ok((candidate, result)),
            Err(err) => {
                warn!(attempts, ?candidate, error = ?err, "candidate rejected");
                last_error = Some(err);
            }
        }
    }
    Err(SearchError::NoViableCandidate {
        attempts,
        last_error,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RangeCandidate {
    pub label: String,
    pub range: TickRange,
}

/// Percent bands tried, narrowest first, before falling back to full range.
pub const DEFAULT_BAND_PERCENTS: &[f64] = &[1.0, 5.0, 20.0];

/// Ranges around `current_tick` from narrow to wide, ending with the full
/// range. Bands that collapse onto an earlier range are dropped.
pub fn range_candidates(
    current_tick: i32,
    spacing: i32,
    percents: &[f64],
) -> Result<Vec<RangeCandidate>, TickMathError> {
    let mut candidates: Vec<RangeCandidate> = Vec::with_capacity(percents.len() + 1);
    for percent in percents {
        let range = compute_range_for_percent_band(current_tick, spacing, *percent)?;
        if candidates.iter().all(|c| c.range != range) {
            candidates.push(RangeCandidate {
                label: format!("±{percent}% around tick {current_tick}"),
                range,
            });
        }
    }
    let full = TickRange::full(spacing)?;
    if candidates.iter().all(|c| c.range != full) {
        candidates.push(RangeCandidate {
            label: "full range".to_string(),
            range: full,
        });
    }
    Ok(candidates)
}

/// Sqrt price limits for each of `limits_bps`, in the given order.
pub fn price_limit_candidates(
    current_sqrt_price_x96: U256,
    limits_bps: &[u32],
    zero_for_one: bool,
) -> Result<Vec<U256>, TickMathError> {
    limits_bps
        .iter()
        .map(|bps| sqrt_price_limit(current_sqrt_price_x96, *bps, zero_for_one))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tick_math::Q96;

    #[tokio::test]
    async fn first_success_wins() -> eyre::Result<()> {
        let mut seen = Vec::new();
        let (candidate, result) = first_viable(vec![1, 2, 3, 4], |n| {
            seen.push(n);
            async move {
                if n >= 3 {
                    Ok(n * 10)
                } else {
                    Err(format!("{n} reverted"))
                }
            }
        })
        .await?;
        assert_eq!((candidate, result), (3, 30));
        assert_eq!(seen, vec![1, 2, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn exhausted_search_reports_last_error() {
        let err = first_viable(vec!["a", "b"], |c| async move { Err::<(), _>(format!("{c} failed")) })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SearchError::NoViableCandidate {
                attempts: 2,
                last_error: Some("b failed".to_string())
            }
        );
    }

    #[test]
    fn empty_search_has_no_error() {
        let err = first_viable_sync(Vec::<i32>::new(), |_| Ok::<_, ()>(())).unwrap_err();
        assert_eq!(
            err,
            SearchError::NoViableCandidate {
                attempts: 0,
                last_error: None
            }
        );
    }

    #[test]
    fn sync_search_stops_at_first_success() -> eyre::Result<()> {
        let mut calls = 0;
        let (candidate, _) = first_viable_sync([10, 20, 30], |n| {
            calls += 1;
            if n == 20 {
                Ok(())
            } else {
                Err(())
            }
        })
        .map_err(|e| eyre::eyre!("{e:?}"))?;
        assert_eq!(candidate, 20);
        assert_eq!(calls, 2);
        Ok(())
    }

    #[test]
    fn range_candidates_widen_and_end_full() -> eyre::Result<()> {
        let candidates = range_candidates(51299, 60, DEFAULT_BAND_PERCENTS)?;
        assert_eq!(candidates.len(), 4);
        for pair in candidates.windows(2) {
            assert!(pair[0].range.lower() >= pair[1].range.lower());
            assert!(pair[0].range.upper() <= pair[1].range.upper());
        }
        let last = candidates.last().map(|c| c.range);
        assert_eq!(last, Some(TickRange::full(60)?));
        Ok(())
    }

    #[test]
    fn duplicate_bands_collapse() -> eyre::Result<()> {
        // with a huge spacing every band rounds onto the same grid points
        let candidates = range_candidates(0, 200_000, &[0.01, 0.02])?;
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].label, "full range");
        Ok(())
    }

    #[test]
    fn price_limits_follow_bps_order() -> eyre::Result<()> {
        let limits = price_limit_candidates(Q96, &[100, 500, 1000], true)?;
        assert!(limits.windows(2).all(|w| w[0] > w[1]));
        assert!(limits.iter().all(|l| *l < Q96));
        Ok(())
    }
}
