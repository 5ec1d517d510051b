use crate::logging::log_action;
use crate::security::{require_any_role, resolve_journal};
use crate::services::{
    JournalContext, JournalError, JournalService, NewReviewForm, ReviewForm, ReviewFormPatch,
    RolePath, ServiceResult, ensure,
};
use serde_json::json;

pub struct ReviewFormController<S: JournalService> {
    service: S,
}

impl<S: JournalService> ReviewFormController<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn list(&self, ctx: &mut JournalContext) -> ServiceResult<Vec<ReviewForm>> {
        self.authorize(ctx)?;
        let journal_id = resolve_journal(ctx)?;
        let forms = self.service.list_review_forms(journal_id)?;
        ctx.context.set("review_forms", &forms);
        Ok(forms)
    }

    pub fn create(&self, ctx: &mut JournalContext) -> ServiceResult<ReviewForm> {
        self.authorize(ctx)?;
        let journal_id = resolve_journal(ctx)?;
        // validation runs before the service sees anything
        let title = parse_title(ctx.post_vars.string("title"))?;
        let questions = parse_questions(ctx)?.unwrap_or(0);
        let form = self.service.create_review_form(NewReviewForm {
            journal_id,
            title,
            description: ctx
                .post_vars
                .string("description")
                .map(|text| text.trim().to_string())
                .unwrap_or_default(),
            is_active: ctx.post_vars.bool("is_active"),
            questions,
        })?;
        log_action(
            &self.service,
            ctx,
            "review_form.create",
            json!({"form_id": form.id, "journal_id": journal_id}),
        )?;
        ctx.context.set("saved_form", &form);
        Ok(form)
    }

    pub fn update(&self, ctx: &mut JournalContext, form_id: i64) -> ServiceResult<ReviewForm> {
        self.authorize(ctx)?;
        let journal_id = resolve_journal(ctx)?;
        self.owned_form(journal_id, form_id)?;
        let title = match ctx.post_vars.string("title") {
            Some(raw) => Some(parse_title(Some(raw))?),
            None => None,
        };
        let patch = ReviewFormPatch {
            title,
            description: ctx
                .post_vars
                .string("description")
                .map(|text| text.trim().to_string()),
            is_active: if ctx.post_vars.contains("is_active") {
                Some(ctx.post_vars.bool("is_active"))
            } else {
                None
            },
            questions: parse_questions(ctx)?,
        };
        let form = self.service.update_review_form(form_id, patch)?;
        log_action(
            &self.service,
            ctx,
            "review_form.update",
            json!({"form_id": form_id, "journal_id": journal_id}),
        )?;
        ctx.context.set("saved_form", &form);
        Ok(form)
    }

    pub fn delete(&self, ctx: &mut JournalContext, form_id: i64) -> ServiceResult<()> {
        self.authorize(ctx)?;
        let journal_id = resolve_journal(ctx)?;
        self.owned_form(journal_id, form_id)?;
        self.service.delete_review_form(form_id)?;
        log_action(
            &self.service,
            ctx,
            "review_form.delete",
            json!({"form_id": form_id, "journal_id": journal_id}),
        )
    }

    /// Flip `is_active` and nothing else.
    pub fn toggle_active(&self, ctx: &mut JournalContext, form_id: i64) -> ServiceResult<ReviewForm> {
        self.authorize(ctx)?;
        let journal_id = resolve_journal(ctx)?;
        let current = self.owned_form(journal_id, form_id)?;
        let form = self.service.update_review_form(
            form_id,
            ReviewFormPatch {
                is_active: Some(!current.is_active),
                ..Default::default()
            },
        )?;
        log_action(
            &self.service,
            ctx,
            "review_form.toggle",
            json!({"form_id": form_id, "is_active": form.is_active}),
        )?;
        ctx.context.set("saved_form", &form);
        Ok(form)
    }

    fn authorize(&self, ctx: &JournalContext) -> ServiceResult<()> {
        require_any_role(ctx, &[RolePath::Editor, RolePath::Manager, RolePath::Admin])
    }

    /// A form is only addressable through its own journal; a matching id in
    /// another journal is reported as missing, not forbidden.
    fn owned_form(&self, journal_id: i64, form_id: i64) -> ServiceResult<ReviewForm> {
        let form = self
            .service
            .get_review_form(form_id)?
            .ok_or_else(|| JournalError::NotFound(format!("review form {form_id}")))?;
        ensure(
            form.journal_id == journal_id,
            JournalError::NotFound(format!("review form {form_id}")),
        )?;
        Ok(form)
    }
}

fn parse_title(raw: Option<String>) -> ServiceResult<String> {
    let title = raw.unwrap_or_default().trim().to_string();
    ensure(
        !title.is_empty(),
        JournalError::Validation("title_required".into()),
    )?;
    Ok(title)
}

/// `questions` arrives as either a number or a numeric string from the form.
/// Missing or blank means "leave alone" on update and "default to zero" on
/// create; anything non-numeric or negative is rejected.
fn parse_questions(ctx: &JournalContext) -> ServiceResult<Option<i64>> {
    if !ctx.post_vars.contains("questions") {
        return Ok(None);
    }
    let parsed = match ctx.post_vars.int("questions") {
        Some(value) => Some(value),
        None => match ctx.post_vars.string("questions") {
            Some(raw) if raw.trim().is_empty() => return Ok(None),
            Some(raw) => raw.trim().parse::<i64>().ok(),
            None => None,
        },
    };
    match parsed {
        Some(value) if value >= 0 => Ok(Some(value)),
        _ => Err(JournalError::Validation("questions_not_a_count".into())),
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

    fn build() -> (ReviewFormController<InMemoryService>, InMemoryService) {
        let service = InMemoryService::default();
        (ReviewFormController::new(service.clone()), service)
    }

    #[test]
    fn list_is_scoped_to_the_journal() {
        let (controller, service) = build();
        let mut ctx = editor_ctx(&service);
        let forms = controller.list(&mut ctx).unwrap();
        assert_eq!(forms.len(), 2);
        assert!(forms.iter().all(|form| form.journal_id == 1));
    }

    #[test]
    fn create_requires_a_title() {
        let (controller, service) = build();
        let mut ctx = editor_ctx(&service);
        ctx.post_vars.set("title", "   ");
        let result = controller.create(&mut ctx);
        assert!(matches!(result, Err(JournalError::Validation(_))));
        // nothing reached the store
        assert_eq!(service.list_review_forms(1).unwrap().len(), 2);
    }

    #[test]
    fn create_defaults_questions_to_zero() {
        let (controller, service) = build();
        let mut ctx = editor_ctx(&service);
        ctx.post_vars.set("title", "  Layout Check  ");
        let form = controller.create(&mut ctx).unwrap();
        assert_eq!(form.title, "Layout Check");
        assert_eq!(form.questions, 0);
        assert!(!form.is_active);
        assert_eq!(service.list_review_forms(1).unwrap().len(), 3);
    }

    #[test]
    fn negative_question_count_is_rejected() {
        let (controller, service) = build();
        let mut ctx = editor_ctx(&service);
        let baseline = service.list_review_forms(1).unwrap().len();
        ctx.post_vars.set("title", "Broken");
        ctx.post_vars.set("questions", -4);
        assert!(matches!(
            controller.create(&mut ctx),
            Err(JournalError::Validation(_))
        ));
        assert_eq!(service.list_review_forms(1).unwrap().len(), baseline);
    }

    #[test]
    fn questions_accepts_numeric_strings() {
        let (controller, service) = build();
        let mut ctx = editor_ctx(&service);
        ctx.post_vars.set("title", "From Form Input");
        ctx.post_vars.set("questions", "12");
        let form = controller.create(&mut ctx).unwrap();
        assert_eq!(form.questions, 12);
        assert_eq!(service.get_review_form(form.id).unwrap().unwrap().questions, 12);
    }

    #[test]
    fn toggle_flips_only_the_active_flag() {
        let (controller, service) = build();
        let mut ctx = editor_ctx(&service);
        let before = service.get_review_form(1).unwrap().unwrap();
        let after = controller.toggle_active(&mut ctx, 1).unwrap();
        assert_eq!(after.is_active, !before.is_active);
        assert_eq!(after.title, before.title);
        assert_eq!(after.description, before.description);
        assert_eq!(after.questions, before.questions);
    }

    #[test]
    fn update_keeps_absent_fields() {
        let (controller, service) = build();
        let mut ctx = editor_ctx(&service);
        ctx.post_vars.set("description", "Tightened wording");
        let form = controller.update(&mut ctx, 2).unwrap();
        assert_eq!(form.description, "Tightened wording");
        assert_eq!(form.title, "Short Communication Review");
        assert_eq!(form.questions, 3);
    }

    #[test]
    fn delete_removes_exactly_one_form() {
        let (controller, service) = build();
        let mut ctx = editor_ctx(&service);
        controller.delete(&mut ctx, 2).unwrap();
        let remaining = service.list_review_forms(1).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, 1);
    }

    #[test]
    fn forms_of_other_journals_are_invisible() {
        let (controller, service) = build();
        let mut ctx = editor_ctx(&service);
        // form 3 belongs to journal 2; the context resolves journal 1
        assert!(matches!(
            controller.delete(&mut ctx, 3),
            Err(JournalError::NotFound(_))
        ));
        assert_eq!(service.list_review_forms(2).unwrap().len(), 1);
    }

    #[test]
    fn authors_cannot_touch_review_forms() {
        let (controller, service) = build();
        let mut ctx = JournalContext::default();
        load_user(&service, &mut ctx, 4).unwrap();
        assert!(matches!(
            controller.list(&mut ctx),
            Err(JournalError::PermissionDenied(_))
        ));
    }

    #[test]
    fn mutations_land_in_the_activity_log() {
        let (controller, service) = build();
        let mut ctx = editor_ctx(&service);
        controller.toggle_active(&mut ctx, 1).unwrap();
        let logs = service.list_action_logs().unwrap();
        assert!(logs.iter().any(|entry| entry.action == "review_form.toggle"));
    }
}
