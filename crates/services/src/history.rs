use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use exam_core::model::{TestResult, UserId};
use storage::repository::ResultRepository;

use crate::Clock;
use crate::error::HistoryError;

/// Number of recent results the dashboard summarises.
pub const RECENT_WINDOW: u32 = 5;

/// Headline numbers for a user's recent attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardStats {
    pub total_tests: usize,
    pub average_score: f64,
    pub best_score: f64,
    /// Attempts submitted within the last seven days.
    pub tests_this_week: usize,
}

impl DashboardStats {
    /// Summarise the given results as of `now`. Empty input yields all zeros.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_results(results: &[TestResult], now: DateTime<Utc>) -> Self {
        let total_tests = results.len();
        let average_score = if total_tests == 0 {
            0.0
        } else {
            results.iter().map(TestResult::score).sum::<f64>() / total_tests as f64
        };
        let best_score = results.iter().map(TestResult::score).fold(0.0, f64::max);
        let week_ago = now - Duration::days(7);
        let tests_this_week = results
            .iter()
            .filter(|r| r.submitted_at() > week_ago)
            .count();

        Self {
            total_tests,
            average_score,
            best_score,
            tests_this_week,
        }
    }
}

/// Read side over stored results.
#[derive(Clone)]
pub struct ResultHistoryService {
    clock: Clock,
    results: Arc<dyn ResultRepository>,
}

impl ResultHistoryService {
    #[must_use]
    pub fn new(clock: Clock, results: Arc<dyn ResultRepository>) -> Self {
        Self { clock, results }
    }

    /// Most recent results for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` if results cannot be read.
    pub async fn recent_results(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<TestResult>, HistoryError> {
        Ok(self.results.list_results_for_user(user_id, limit).await?)
    }

    /// Stats over the last [`RECENT_WINDOW`] results.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` if results cannot be read.
    pub async fn dashboard_stats(&self, user_id: &UserId) -> Result<DashboardStats, HistoryError> {
        let recent = self.recent_results(user_id, RECENT_WINDOW).await?;
        Ok(DashboardStats::from_results(&recent, self.clock.now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::TestId;
    use exam_core::time::fixed_now;
    use std::collections::BTreeMap;
    use storage::repository::InMemoryRepository;

    fn result(user: &str, score: f64, days_ago: i64) -> TestResult {
        let correct = u32::try_from((score / 20.0) as i64).unwrap();
        TestResult::from_persisted(
            None,
            UserId::new(user),
            TestId::new("t"),
            score,
            5,
            correct,
            0,
            5 - correct,
            60,
            BTreeMap::new(),
            fixed_now() - Duration::days(days_ago),
        )
        .unwrap()
    }

    #[test]
    fn empty_history_is_all_zero() {
        let stats = DashboardStats::from_results(&[], fixed_now());
        assert_eq!(stats.total_tests, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.best_score, 0.0);
        assert_eq!(stats.tests_this_week, 0);
    }

    #[tokio::test]
    async fn stats_cover_only_the_recent_window() {
        let repo = InMemoryRepository::new();
        // Oldest first; only the five newest count.
        for (score, days_ago) in [(100.0, 30), (20.0, 10), (40.0, 8), (60.0, 6), (80.0, 2), (40.0, 1)] {
            repo.create_result(&result("u1", score, days_ago)).await.unwrap();
        }
        repo.create_result(&result("u2", 100.0, 0)).await.unwrap();

        let service = ResultHistoryService::new(Clock::fixed(fixed_now()), Arc::new(repo));
        let stats = service.dashboard_stats(&UserId::new("u1")).await.unwrap();

        assert_eq!(stats.total_tests, 5);
        assert!((stats.average_score - 48.0).abs() < 1e-9);
        assert!((stats.best_score - 80.0).abs() < 1e-9);
        assert_eq!(stats.tests_this_week, 3);

        let recent = service
            .recent_results(&UserId::new("u1"), 2)
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
        assert!((recent[0].score() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn exactly_seven_days_ago_is_not_this_week() {
        let stats = DashboardStats::from_results(&[result("u", 20.0, 7)], fixed_now());
        assert_eq!(stats.tests_this_week, 0);
    }
}
