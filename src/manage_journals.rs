use crate::logging::log_action;
use crate::security::require_role;
use crate::services::{
    Journal, JournalContext, JournalError, JournalService, RolePath, ServiceResult, ensure,
};
use serde_json::json;

/// Site-level journal administration. Subactions mirror the hosted-journals
/// panel: index (default), add, edit, delete.
pub struct JournalAdminController<S: JournalService> {
    service: S,
}

impl<S: JournalService> JournalAdminController<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn manage_journals(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        require_role(ctx, RolePath::Admin)?;
        let subaction = ctx.request.string("sa").unwrap_or_else(|| "index".into());
        match subaction.as_str() {
            "add" => self.add_journal(ctx),
            "edit" => self.edit_journal(ctx),
            "delete" => self.delete_journal(ctx),
            _ => self.index(ctx),
        }
    }

    fn index(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        let journals = self.service.list_journals()?;
        let rows: Vec<_> = journals
            .iter()
            .map(|journal| {
                json!({
                    "id": journal.id,
                    "title": journal.title,
                    "path": journal.path,
                    "description": journal.description,
                })
            })
            .collect();
        ctx.context.set("journals", rows);
        Ok(())
    }

    fn add_journal(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        let journal = self.parse_journal_form(ctx, 0)?;
        let id = self.service.save_journal(journal)?;
        log_action(&self.service, ctx, "journal.create", json!({"journal_id": id}))?;
        ctx.context.set("saved_journal_id", id);
        self.index(ctx)
    }

    fn edit_journal(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        let journal_id = ctx
            .request
            .int("journal")
            .ok_or_else(|| JournalError::Validation("missing_journal".into()))?;
        let journal = self.parse_journal_form(ctx, journal_id)?;
        self.service.save_journal(journal)?;
        log_action(
            &self.service,
            ctx,
            "journal.update",
            json!({"journal_id": journal_id}),
        )?;
        ctx.context.set("saved_journal_id", journal_id);
        self.index(ctx)
    }

    fn delete_journal(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        let journal_id = ctx
            .request
            .int("journal")
            .ok_or_else(|| JournalError::Validation("missing_journal".into()))?;
        self.service.delete_journal(journal_id)?;
        log_action(
            &self.service,
            ctx,
            "journal.delete",
            json!({"journal_id": journal_id}),
        )?;
        self.index(ctx)
    }

    fn parse_journal_form(&self, ctx: &JournalContext, journal_id: i64) -> ServiceResult<Journal> {
        let title = ctx.post_vars.string("title").unwrap_or_default();
        let title = title.trim().to_string();
        ensure(
            !title.is_empty(),
            JournalError::Validation("title_required".into()),
        )?;
        let path = ctx
            .post_vars
            .string("path")
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| slugify(&title));
        Ok(Journal {
            id: journal_id,
            title,
            path,
            description: ctx.post_vars.string("description").unwrap_or_default(),
        })
    }
}

fn slugify(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::load_user;
    use crate::services::{InMemoryService, JournalContext};

    fn admin_ctx(service: &InMemoryService) -> JournalContext {
        let mut ctx = JournalContext::default();
        load_user(service, &mut ctx, 1).unwrap();
        ctx
    }

    #[test]
    fn index_lists_journals() {
        let service = InMemoryService::default();
        let controller = JournalAdminController::new(service.clone());
        let mut ctx = admin_ctx(&service);
        controller.manage_journals(&mut ctx).unwrap();
        let rows = ctx.context.get("journals").unwrap().as_array().unwrap().clone();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn add_journal_slugifies_missing_path() {
        let service = InMemoryService::default();
        let controller = JournalAdminController::new(service.clone());
        let mut ctx = admin_ctx(&service);
        ctx.request.set("sa", "add");
        ctx.post_vars.set("title", "Annals of Applied Statistics");
        controller.manage_journals(&mut ctx).unwrap();
        let id = ctx.context.int("saved_journal_id").unwrap();
        let journal = service.get_journal(id).unwrap().unwrap();
        assert_eq!(journal.path, "annals-of-applied-statistics");
    }

    #[test]
    fn add_requires_title() {
        let service = InMemoryService::default();
        let controller = JournalAdminController::new(service.clone());
        let mut ctx = admin_ctx(&service);
        ctx.request.set("sa", "add");
        assert!(controller.manage_journals(&mut ctx).is_err());
        assert_eq!(service.list_journals().unwrap().len(), 2);
    }

    #[test]
    fn delete_drops_journal_and_scoped_roles() {
        let service = InMemoryService::default();
        let controller = JournalAdminController::new(service.clone());
        let mut ctx = admin_ctx(&service);
        ctx.request.set("sa", "delete");
        ctx.request.set("journal", 2);
        controller.manage_journals(&mut ctx).unwrap();
        assert!(service.get_journal(2).unwrap().is_none());
        assert!(service.list_role_assignments(Some(2)).unwrap().is_empty());
    }

    #[test]
    fn managers_are_not_admins_here() {
        let service = InMemoryService::default();
        let controller = JournalAdminController::new(service.clone());
        let mut ctx = JournalContext::default();
        load_user(&service, &mut ctx, 2).unwrap();
        assert!(matches!(
            controller.manage_journals(&mut ctx),
            Err(JournalError::PermissionDenied(_))
        ));
    }
}
