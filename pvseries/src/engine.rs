use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use crate::error::QueryError;
use crate::store::{RangeEnd, SampleStore};
use crate::value::{Bucket, Sample, PAGE_MINUTES};

const MINUTE_SECONDS: i64 = 60;
const HOUR_SECONDS: i64 = 3600;

/// Read-only aggregation queries over one sample store. Engines carry no
/// per-query state and are cheap to construct, so handlers build one per
/// request.
pub struct QueryEngine<S> {
    store: Arc<S>,
}

impl<S: SampleStore> QueryEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Total produced wattage over `[from, from + duration_minutes]`,
    /// inclusive on both ends. An empty interval sums to zero.
    pub async fn produced_sum(
        &self,
        installation_id: u64,
        from: OffsetDateTime,
        duration_minutes: i64,
    ) -> Result<f32, QueryError> {
        if !self.store.installation_exists(installation_id).await? {
            return Err(QueryError::NotFound(installation_id));
        }
        let to = offset(from, duration_minutes, MINUTE_SECONDS)?;
        let samples = self
            .store
            .fetch_samples(installation_id, from, to, RangeEnd::Inclusive)
            .await?;
        Ok(samples.iter().map(|s| s.produced_wattage).sum())
    }

    /// One page of the per-minute production timeline of a window starting
    /// at `window_start` and spanning `duration_minutes`. Pages are
    /// 1-indexed and advance in fixed one-hour strides from the window
    /// start; every page holds 60 buckets except the last, which holds the
    /// minute remainder of the window. Minutes without samples stay at the
    /// zero vector.
    #[tracing::instrument(skip_all)]
    pub async fn timeline(
        &self,
        installation_id: u64,
        window_start: OffsetDateTime,
        duration_minutes: i64,
        page: i64,
    ) -> Result<Vec<Bucket>, QueryError> {
        if page < 1 {
            return Err(QueryError::InvalidArgument(
                "`page` number must be greater than 0".to_owned(),
            ));
        }
        if duration_minutes < 1 {
            return Err(QueryError::InvalidArgument(
                "`duration` must be greater than 0".to_owned(),
            ));
        }

        let elements = page_len(duration_minutes, page);
        if elements <= 0 {
            return Err(QueryError::OutOfRange(
                "this page contains no elements".to_owned(),
            ));
        }

        let page_start = offset(window_start, page - 1, HOUR_SECONDS)?;
        let page_end = offset(page_start, elements, MINUTE_SECONDS)?;
        let samples = self
            .store
            .fetch_samples(installation_id, page_start, page_end, RangeEnd::Exclusive)
            .await?;
        tracing::debug!(nr_samples = samples.len(), %page_start, "loaded samples");

        Ok(bucketize(&samples, page_start, elements as usize))
    }
}

/// Number of minute slots on `page`: 60 for every full page, the window
/// remainder for the last one, zero or negative past the window end.
fn page_len(duration_minutes: i64, page: i64) -> i64 {
    PAGE_MINUTES.min(duration_minutes.saturating_sub((page - 1).saturating_mul(PAGE_MINUTES)))
}

/// `base + amount * unit_seconds`, or `InvalidArgument` when the result
/// falls outside the representable time range.
fn offset(base: OffsetDateTime, amount: i64, unit_seconds: i64) -> Result<OffsetDateTime, QueryError> {
    amount
        .checked_mul(unit_seconds)
        .map(Duration::seconds)
        .and_then(|delta| base.checked_add(delta))
        .ok_or_else(|| QueryError::InvalidArgument("time window out of range".to_owned()))
}

/// Folds samples into `len` one-minute buckets starting at `page_start`.
/// Samples sharing a minute accumulate into the same bucket.
fn bucketize(samples: &[Sample], page_start: OffsetDateTime, len: usize) -> Vec<Bucket> {
    samples
        .iter()
        .fold(vec![Bucket::default(); len], |mut timeline, sample| {
            let slot = (sample.timestamp - page_start).whole_minutes() as usize;
            debug_assert!(slot < len, "sample outside of the fetched page");
            timeline[slot] += sample;
            timeline
        })
}
