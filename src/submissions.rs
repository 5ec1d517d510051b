use crate::security::require_any_role;
use crate::services::{
    JournalContext, JournalService, RolePath, ServiceResult, SubmissionFilter, SubmissionQueue,
    SubmissionStage,
};
use serde_json::json;

const DEFAULT_PAGE_SIZE: usize = 20;

pub struct SubmissionController<S: JournalService> {
    service: S,
}

impl<S: JournalService> SubmissionController<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Editor submission list. Request vars: `queue` (my|unassigned|all|archived),
    /// `stage`, `search`, `offset`, `limit`. Unknown queue/stage values fall back
    /// to the defaults rather than erroring.
    pub fn list(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        require_any_role(ctx, &[RolePath::Editor, RolePath::Manager, RolePath::Admin])?;
        let filter = self.filter_from(ctx);
        let total = self.service.count_submissions(&SubmissionFilter {
            offset: 0,
            limit: None,
            ..filter.clone()
        })?;
        let rows = self.service.list_submissions(&filter)?;
        let mut entries = Vec::with_capacity(rows.len());
        for record in &rows {
            let journal = self
                .service
                .get_journal(record.journal_id)?
                .map(|journal| journal.title)
                .unwrap_or_else(|| "Unknown Journal".into());
            entries.push(json!({
                "id": record.id,
                "title": record.title,
                "journal": journal,
                "status": record.status.as_str(),
                "stage": record.current_stage.as_str(),
                "submitted_at": record.submitted_at,
                "updated_at": record.updated_at,
                "is_archived": record.is_archived,
            }));
        }
        ctx.context.set("submissions", entries);
        ctx.context.set("submissions_total", total as i64);
        ctx.context.set("submissions_offset", filter.offset as i64);
        Ok(())
    }

    fn filter_from(&self, ctx: &JournalContext) -> SubmissionFilter {
        let queue = ctx
            .request
            .string("queue")
            .and_then(|raw| SubmissionQueue::parse(&raw))
            .unwrap_or_default();
        SubmissionFilter {
            journal_id: ctx.journal_id,
            queue,
            editor_id: if queue == SubmissionQueue::My {
                Some(ctx.user.id)
            } else {
                None
            },
            author_id: None,
            stage: ctx
                .request
                .string("stage")
                .and_then(|raw| SubmissionStage::parse(&raw)),
            search: ctx.request.string("search"),
            offset: ctx.request.int("offset").unwrap_or(0).max(0) as usize,
            limit: Some(
                ctx.request
                    .int("limit")
                    .filter(|limit| *limit > 0)
                    .unwrap_or(DEFAULT_PAGE_SIZE as i64) as usize,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::load_user;
    use crate::services::{InMemoryService, JournalContext};

    fn editor_ctx(service: &InMemoryService) -> JournalContext {
        let mut ctx = JournalContext::default();
        load_user(service, &mut ctx, 3).unwrap();
        ctx
    }

    #[test]
    fn default_listing_excludes_archived() {
        let service = InMemoryService::default();
        let controller = SubmissionController::new(service.clone());
        let mut ctx = editor_ctx(&service);
        controller.list(&mut ctx).unwrap();
        let rows = ctx.context.get("submissions").unwrap().as_array().unwrap().clone();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row["is_archived"] == false));
    }

    #[test]
    fn my_queue_uses_the_acting_editor() {
        let service = InMemoryService::default();
        let controller = SubmissionController::new(service.clone());
        let mut ctx = editor_ctx(&service);
        ctx.request.set("queue", "my");
        controller.list(&mut ctx).unwrap();
        let rows = ctx.context.get("submissions").unwrap().as_array().unwrap().clone();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn stage_filter_and_search_combine() {
        let service = InMemoryService::default();
        let controller = SubmissionController::new(service.clone());
        let mut ctx = editor_ctx(&service);
        ctx.request.set("stage", "review");
        ctx.request.set("search", "social media");
        controller.list(&mut ctx).unwrap();
        let rows = ctx.context.get("submissions").unwrap().as_array().unwrap().clone();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 1);
    }

    #[test]
    fn pagination_reports_the_unpaged_total() {
        let service = InMemoryService::default();
        let controller = SubmissionController::new(service.clone());
        let mut ctx = editor_ctx(&service);
        ctx.request.set("limit", 2);
        ctx.request.set("offset", 2);
        controller.list(&mut ctx).unwrap();
        let rows = ctx.context.get("submissions").unwrap().as_array().unwrap().clone();
        assert_eq!(rows.len(), 2);
        assert_eq!(ctx.context.int("submissions_total"), Some(4));
    }

    #[test]
    fn unknown_queue_falls_back_to_all() {
        let service = InMemoryService::default();
        let controller = SubmissionController::new(service.clone());
        let mut ctx = editor_ctx(&service);
        ctx.request.set("queue", "starred");
        controller.list(&mut ctx).unwrap();
        let rows = ctx.context.get("submissions").unwrap().as_array().unwrap().clone();
        assert_eq!(rows.len(), 4);
    }
}
