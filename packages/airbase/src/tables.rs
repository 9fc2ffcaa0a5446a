//! Named accessors binding the generic fetcher to one table each, so
//! call sites read `fetch_people` instead of a magic string.

use tracing::debug;

use crate::client::Store;
use crate::error::StoreError;
use crate::fallback;
use crate::fetch::ResiliencePolicy;
use crate::types::{Query, RecordSet};

pub const PEOPLE: &str = "People";
pub const CASE_STUDIES: &str = "Case study forms";
pub const LANDSCAPE_TOPICS: &str = "Landscape topics";
pub const BIBLIOGRAPHY: &str = "Bibliography";
pub const METRICS: &str = "Metrics";

impl Store {
    pub async fn fetch_people(
        &self,
        query: &Query,
        policy: ResiliencePolicy,
    ) -> Result<RecordSet, StoreError> {
        self.fetch(PEOPLE, query, policy).await
    }

    /// Case study content is slow to regenerate downstream, so a
    /// deployment can pin it to sample data independently of the rest.
    pub async fn fetch_case_studies(
        &self,
        query: &Query,
        policy: ResiliencePolicy,
    ) -> Result<RecordSet, StoreError> {
        if self.config().force_sample_case_studies {
            debug!("Case study fetch pinned to sample data");
            return Ok(RecordSet::sample(fallback::sample_records(CASE_STUDIES)));
        }
        self.fetch(CASE_STUDIES, query, policy).await
    }

    pub async fn fetch_landscape_topics(
        &self,
        query: &Query,
        policy: ResiliencePolicy,
    ) -> Result<RecordSet, StoreError> {
        self.fetch(LANDSCAPE_TOPICS, query, policy).await
    }

    pub async fn fetch_bibliography(
        &self,
        query: &Query,
        policy: ResiliencePolicy,
    ) -> Result<RecordSet, StoreError> {
        self.fetch(BIBLIOGRAPHY, query, policy).await
    }

    pub async fn fetch_metrics(
        &self,
        query: &Query,
        policy: ResiliencePolicy,
    ) -> Result<RecordSet, StoreError> {
        self.fetch(METRICS, query, policy).await
    }
}
