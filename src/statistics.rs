use crate::security::require_any_role;
use crate::services::{
    JournalContext, JournalService, RoleAssignment, RolePath, ServiceResult, SubmissionRecord,
    SubmissionStage, SubmissionStatus,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StatusBreakdown {
    pub published: usize,
    pub declined: usize,
    pub accepted: usize,
    #[serde(rename = "inReview")]
    pub in_review: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StageBreakdown {
    pub submission: usize,
    pub review: usize,
    pub copyediting: usize,
    pub production: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsReport {
    pub total_submissions: usize,
    pub by_status: StatusBreakdown,
    pub by_stage: StageBreakdown,
    // TODO: derive both averages from review round / publication timestamps
    // once the workflow engine records them
    pub average_review_time: i64,
    pub average_publication_time: i64,
    pub total_users: usize,
    pub role_distribution: HashMap<String, usize>,
}

fn count_status(submissions: &[SubmissionRecord], status: SubmissionStatus) -> usize {
    submissions
        .iter()
        .filter(|record| record.status == status)
        .count()
}

fn count_stage(submissions: &[SubmissionRecord], stage: SubmissionStage) -> usize {
    submissions
        .iter()
        .filter(|record| record.current_stage == stage)
        .count()
}

/// Each bucket is an independent filter-count over the same rows. Buckets
/// overlap: `in_review` counts by stage while the other status buckets count by
/// status, so an accepted submission still in the review stage lands in both.
/// Dashboards consume the buckets independently and rely on the overlap.
pub fn aggregate_submissions(submissions: &[SubmissionRecord]) -> (StatusBreakdown, StageBreakdown) {
    let by_status = StatusBreakdown {
        published: count_status(submissions, SubmissionStatus::Published),
        declined: count_status(submissions, SubmissionStatus::Declined),
        accepted: count_status(submissions, SubmissionStatus::Accepted),
        in_review: count_stage(submissions, SubmissionStage::Review),
    };
    let by_stage = StageBreakdown {
        submission: count_stage(submissions, SubmissionStage::Submission),
        review: count_stage(submissions, SubmissionStage::Review),
        copyediting: count_stage(submissions, SubmissionStage::Copyediting),
        production: count_stage(submissions, SubmissionStage::Production),
    };
    (by_status, by_stage)
}

pub fn aggregate_roles(roles: &[RoleAssignment]) -> HashMap<String, usize> {
    let mut distribution = HashMap::new();
    for assignment in roles {
        *distribution
            .entry(assignment.role.as_str().to_string())
            .or_insert(0) += 1;
    }
    distribution
}

pub fn build_report(
    submissions: &[SubmissionRecord],
    roles: &[RoleAssignment],
) -> StatisticsReport {
    let (by_status, by_stage) = aggregate_submissions(submissions);
    StatisticsReport {
        total_submissions: submissions.len(),
        by_status,
        by_stage,
        average_review_time: 0,
        average_publication_time: 0,
        total_users: roles.len(),
        role_distribution: aggregate_roles(roles),
    }
}

pub struct StatisticsController<S: JournalService> {
    service: S,
}

impl<S: JournalService> StatisticsController<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Manager statistics page. Requires manager or admin; renders whatever
    /// report loading produces, degraded to zeros on any service failure.
    pub fn view_statistics(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        require_any_role(ctx, &[RolePath::Manager, RolePath::Admin])?;
        let report = self.report_for(ctx.request.int("journal").or(ctx.journal_id));
        ctx.context.set("statistics", &report);
        Ok(())
    }

    /// Load rows and reduce them. Any error collapses to the all-zero report:
    /// the page always renders, partial failures are not distinguished and
    /// nothing retries.
    pub fn report_for(&self, journal_id: Option<i64>) -> StatisticsReport {
        match self.load_report(journal_id) {
            Ok(report) => report,
            Err(error) => {
                warn!(%error, "statistics load failed, rendering zeroed report");
                StatisticsReport::default()
            }
        }
    }

    fn load_report(&self, journal_id: Option<i64>) -> ServiceResult<StatisticsReport> {
        let submissions = self.service.all_submissions(journal_id)?;
        let roles = self.service.list_role_assignments(journal_id)?;
        Ok(build_report(&submissions, &roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::load_user;
    use crate::services::{InMemoryService, JournalContext, SubmissionStatus};
    use chrono::Utc;

    fn record(id: i64, status: SubmissionStatus, stage: SubmissionStage) -> SubmissionRecord {
        SubmissionRecord {
            id,
            journal_id: 1,
            author_id: 1,
            title: format!("Submission {id}"),
            status,
            current_stage: stage,
            submitted_at: Utc::now(),
            updated_at: Utc::now(),
            is_archived: false,
        }
    }

    #[test]
    fn total_always_matches_input_length() {
        let rows = vec![
            record(1, SubmissionStatus::Published, SubmissionStage::Production),
            record(2, SubmissionStatus::Declined, SubmissionStage::Review),
            record(3, SubmissionStatus::Published, SubmissionStage::Production),
        ];
        let report = build_report(&rows, &[]);
        assert_eq!(report.total_submissions, rows.len());
        assert_eq!(report.by_status.published, 2);
        assert_eq!(report.by_status.declined, 1);
    }

    #[test]
    fn empty_input_yields_zeroed_report() {
        let report = build_report(&[], &[]);
        assert_eq!(report, StatisticsReport::default());
        assert!(report.role_distribution.is_empty());
    }

    #[test]
    fn accepted_rows_in_review_stage_count_twice() {
        let rows = vec![record(
            1,
            SubmissionStatus::Accepted,
            SubmissionStage::Review,
        )];
        let (by_status, by_stage) = aggregate_submissions(&rows);
        assert_eq!(by_status.accepted, 1);
        assert_eq!(by_status.in_review, 1);
        assert_eq!(by_stage.review, 1);
    }

    #[test]
    fn role_distribution_counts_per_role() {
        let roles = vec![
            RoleAssignment {
                user_id: 1,
                role: RolePath::Author,
                context_id: Some(1),
            },
            RoleAssignment {
                user_id: 2,
                role: RolePath::Author,
                context_id: Some(1),
            },
            RoleAssignment {
                user_id: 3,
                role: RolePath::Reviewer,
                context_id: Some(1),
            },
        ];
        let distribution = aggregate_roles(&roles);
        assert_eq!(distribution.get("author"), Some(&2));
        assert_eq!(distribution.get("reviewer"), Some(&1));
        assert_eq!(distribution.len(), 2);
    }

    #[test]
    fn statistics_view_requires_manager_or_admin() {
        let service = InMemoryService::default();
        let controller = StatisticsController::new(service.clone());
        let mut ctx = JournalContext::default();
        load_user(&service, &mut ctx, 4).unwrap();
        assert!(controller.view_statistics(&mut ctx).is_err());

        let mut ctx = JournalContext::default();
        load_user(&service, &mut ctx, 2).unwrap();
        controller.view_statistics(&mut ctx).unwrap();
        let rendered = ctx.context.get("statistics").unwrap();
        assert_eq!(rendered["totalSubmissions"], 5);
    }

    #[test]
    fn site_wide_report_covers_every_journal() {
        let service = InMemoryService::default();
        let controller = StatisticsController::new(service);
        let report = controller.report_for(None);
        assert_eq!(report.total_submissions, 7);
        assert_eq!(report.by_status.published, 1);
        assert_eq!(report.by_status.declined, 1);
        // three rows sit in the review stage, one of them already declined
        assert_eq!(report.by_status.in_review, 3);
    }
}
