use crate::security::{require_any_role, require_role};
use crate::services::{
    JournalContext, JournalService, RolePath, ServiceResult, SubmissionFilter, SubmissionQueue,
    SubmissionStage,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

/// Editor landing-page counters. Every field is a count over the same
/// submissions table under a different filter.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorDashboardStats {
    pub my_queue: usize,
    pub unassigned: usize,
    pub submission: usize,
    pub in_review: usize,
    pub copyediting: usize,
    pub production: usize,
    pub all_active: usize,
    pub archived: usize,
    pub tasks: usize,
}

pub struct DashboardController<S: JournalService> {
    service: S,
}

impl<S: JournalService> DashboardController<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn editor_dashboard(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        require_any_role(ctx, &[RolePath::Editor, RolePath::Manager, RolePath::Admin])?;
        let stats = self.editor_stats(ctx.user.id, ctx.journal_id);
        ctx.context.set("dashboard_stats", &stats);
        Ok(())
    }

    /// Load errors degrade to all-zero counters; the dashboard always renders.
    pub fn editor_stats(&self, editor_id: i64, journal_id: Option<i64>) -> EditorDashboardStats {
        match self.load_editor_stats(editor_id, journal_id) {
            Ok(stats) => stats,
            Err(error) => {
                warn!(%error, "editor dashboard stats failed, rendering zeros");
                EditorDashboardStats::default()
            }
        }
    }

    fn load_editor_stats(
        &self,
        editor_id: i64,
        journal_id: Option<i64>,
    ) -> ServiceResult<EditorDashboardStats> {
        let base = SubmissionFilter {
            journal_id,
            ..Default::default()
        };
        let count = |filter: SubmissionFilter| self.service.count_submissions(&filter);
        let stage = |stage: SubmissionStage| {
            count(SubmissionFilter {
                stage: Some(stage),
                ..base.clone()
            })
        };
        Ok(EditorDashboardStats {
            my_queue: count(SubmissionFilter {
                queue: SubmissionQueue::My,
                editor_id: Some(editor_id),
                ..base.clone()
            })?,
            unassigned: count(SubmissionFilter {
                queue: SubmissionQueue::Unassigned,
                ..base.clone()
            })?,
            submission: stage(SubmissionStage::Submission)?,
            in_review: stage(SubmissionStage::Review)?,
            copyediting: stage(SubmissionStage::Copyediting)?,
            production: stage(SubmissionStage::Production)?,
            all_active: count(base.clone())?,
            archived: count(SubmissionFilter {
                queue: SubmissionQueue::Archived,
                ..base.clone()
            })?,
            tasks: self.service.open_task_count(editor_id)?,
        })
    }

    pub fn manager_dashboard(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        require_any_role(ctx, &[RolePath::Manager, RolePath::Admin])?;
        let journal_id = ctx.journal_id;
        let active = self.service.count_submissions(&SubmissionFilter {
            journal_id,
            ..Default::default()
        })?;
        let archived = self.service.count_submissions(&SubmissionFilter {
            journal_id,
            queue: SubmissionQueue::Archived,
            ..Default::default()
        })?;
        let users = self.service.list_role_assignments(journal_id)?.len();
        ctx.context.set(
            "manager_overview",
            json!({
                "active_submissions": active,
                "archived_submissions": archived,
                "enrolled_users": users,
            }),
        );
        Ok(())
    }

    pub fn author_dashboard(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        require_role(ctx, RolePath::Author)?;
        let submissions = self.service.list_submissions(&SubmissionFilter {
            author_id: Some(ctx.user.id),
            ..Default::default()
        })?;
        let now = Utc::now();
        let mut rows = Vec::with_capacity(submissions.len());
        for record in &submissions {
            let journal = self
                .service
                .get_journal(record.journal_id)?
                .map(|journal| journal.title)
                .unwrap_or_else(|| "Unknown Journal".into());
            rows.push(json!({
                "id": record.id,
                "title": record.title,
                "journal": journal,
                "stage": record.current_stage.as_str(),
                "status": record.status.as_str(),
                "date_submitted": record.submitted_at.date_naive().to_string(),
                "days_in_stage": (now - record.updated_at).num_days().max(0),
                "can_delete": record.current_stage == SubmissionStage::Submission,
            }));
        }
        ctx.context.set("author_submissions", rows);
        Ok(())
    }

    pub fn reviewer_dashboard(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        require_role(ctx, RolePath::Reviewer)?;
        let assignments = self.service.list_review_assignments(ctx.user.id)?;
        let mut rows = Vec::with_capacity(assignments.len());
        for assignment in &assignments {
            let title = self
                .service
                .get_submission(assignment.submission_id)?
                .map(|record| record.title)
                .unwrap_or_default();
            rows.push(json!({
                "id": assignment.id,
                "submission_id": assignment.submission_id,
                "title": title,
                "due": assignment.due_at.date_naive().to_string(),
                "accepted": assignment.accepted,
                "completed": assignment.completed,
            }));
        }
        ctx.context.set("review_assignments", rows);
        Ok(())
    }
}
