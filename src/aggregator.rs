//! Report aggregation across all resource kinds

use crate::data::{Report, ResourceKind};
use crate::error::{Error, Result};
use crate::identifier::RepositoryIdentifier;
use crate::normalize;
use crate::provider::{FetchResult, ResourceProvider};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Fetch every resource kind concurrently and assemble a [`Report`].
///
/// Section failures never abort the analysis. Only a failing
/// [`ResourceProvider::prepare`] or a transport failure on every single kind
/// returns an error.
pub async fn analyze(provider: &dyn ResourceProvider, id: &RepositoryIdentifier) -> Result<Report> {
    info!("Analyzing {} via {}", id, provider.name());
    provider.prepare(id).await?;

    let (details, commits, contributors, languages, issues, release, frequency) = tokio::join!(
        provider.fetch(id, ResourceKind::Details),
        provider.fetch(id, ResourceKind::Commits),
        provider.fetch(id, ResourceKind::Contributors),
        provider.fetch(id, ResourceKind::Languages),
        provider.fetch(id, ResourceKind::Issues),
        provider.fetch(id, ResourceKind::Release),
        provider.fetch(id, ResourceKind::Frequency),
    );

    let raw: [&FetchResult; 7] = [
        &details,
        &commits,
        &contributors,
        &languages,
        &issues,
        &release,
        &frequency,
    ];
    if raw.iter().all(|r| matches!(r, Err(e) if e.is_transport())) {
        let reason = match &details {
            Err(e) => e.to_string(),
            Ok(_) => String::new(),
        };
        return Err(Error::UnreachableError(reason));
    }

    let report = Report {
        repository: id.clone(),
        generated_at: Utc::now(),
        details: normalize::details(details),
        commits: normalize::commits(commits),
        contributors: normalize::contributors(contributors),
        languages: normalize::languages(languages),
        issues: normalize::issues(issues),
        release: normalize::release(release),
        frequency: normalize::frequency(frequency),
    };

    for (kind, state) in report.section_states() {
        debug!("{} section for {}: {}", kind, id, state);
    }
    let errors = report.error_count();
    if errors > 0 {
        warn!("{} of 7 sections for {} failed", errors, id);
    }

    Ok(report)
}

/// Runs analyses against one provider and keeps the most recent report.
///
/// Starting an analysis clears the current report. A finished analysis only
/// becomes current if no newer analysis was started in the meantime.
pub struct ReportAggregator {
    provider: Arc<dyn ResourceProvider>,
    current: RwLock<Option<Report>>,
    generation: AtomicU64,
}

impl ReportAggregator {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self {
            provider,
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Analyze a repository and publish the result as the current report
    pub async fn analyze(&self, id: &RepositoryIdentifier) -> Result<Report> {
        // Clear and bump under one lock so starts and publishes stay ordered
        let generation = {
            let mut current = self.current.write().await;
            *current = None;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let report = analyze(self.provider.as_ref(), id).await?;

        let mut current = self.current.write().await;
        if self.generation.load(Ordering::SeqCst) == generation {
            *current = Some(report.clone());
        } else {
            debug!("Discarding stale report for {}", id);
        }

        Ok(report)
    }

    /// The most recently published report, if any
    pub async fn current(&self) -> Option<Report> {
        self.current.read().await.clone()
    }
}
