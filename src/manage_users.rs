use crate::logging::log_action;
use crate::security::{require_any_role, resolve_journal};
use crate::services::{
    JournalContext, JournalError, JournalService, RoleAssignment, RolePath, ServiceResult,
};
use serde_json::json;

/// Manager users panel: enrolled users with their roles in the journal, plus
/// grant/revoke subactions.
pub struct UserRoleController<S: JournalService> {
    service: S,
}

impl<S: JournalService> UserRoleController<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn manage_users(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        require_any_role(ctx, &[RolePath::Manager, RolePath::Admin])?;
        let subaction = ctx.request.string("sa").unwrap_or_else(|| "index".into());
        match subaction.as_str() {
            "grant" => self.grant_role(ctx),
            "revoke" => self.revoke_role(ctx),
            _ => self.index(ctx),
        }
    }

    fn index(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        let journal_id = resolve_journal(ctx)?;
        let assignments = self.service.list_role_assignments(Some(journal_id))?;
        let mut rows = Vec::new();
        for account in self.service.list_users()? {
            let roles: Vec<&str> = assignments
                .iter()
                .filter(|assignment| assignment.user_id == account.id)
                .map(|assignment| assignment.role.as_str())
                .collect();
            if roles.is_empty() {
                continue;
            }
            rows.push(json!({
                "id": account.id,
                "name": account.name,
                "email": account.email,
                "roles": roles,
            }));
        }
        ctx.context.set("journal_users", rows);
        Ok(())
    }

    fn grant_role(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        let assignment = self.parse_assignment(ctx)?;
        self.service.assign_role(assignment.clone())?;
        log_action(
            &self.service,
            ctx,
            "user_role.grant",
            json!({"user_id": assignment.user_id, "role": assignment.role.as_str()}),
        )?;
        self.index(ctx)
    }

    fn revoke_role(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        let assignment = self.parse_assignment(ctx)?;
        self.service.revoke_role(&assignment)?;
        log_action(
            &self.service,
            ctx,
            "user_role.revoke",
            json!({"user_id": assignment.user_id, "role": assignment.role.as_str()}),
        )?;
        self.index(ctx)
    }

    fn parse_assignment(&self, ctx: &JournalContext) -> ServiceResult<RoleAssignment> {
        let journal_id = resolve_journal(ctx)?;
        let user_id = ctx
            .post_vars
            .int("user")
            .ok_or_else(|| JournalError::Validation("missing_user".into()))?;
        let role = ctx
            .post_vars
            .string("role")
            .as_deref()
            .and_then(RolePath::parse)
            .ok_or_else(|| JournalError::Validation("unknown_role".into()))?;
        Ok(RoleAssignment {
            user_id,
            role,
            context_id: Some(journal_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::load_user;
    use crate::services::{InMemoryService, JournalContext, JournalService};

    fn manager_ctx(service: &InMemoryService) -> JournalContext {
        let mut ctx = JournalContext::default();
        load_user(service, &mut ctx, 2).unwrap();
        ctx
    }

    #[test]
    fn index_only_shows_enrolled_users() {
        let service = InMemoryService::default();
        let controller = UserRoleController::new(service.clone());
        let mut ctx = manager_ctx(&service);
        controller.manage_users(&mut ctx).unwrap();
        let rows = ctx.context.get("journal_users").unwrap().as_array().unwrap().clone();
        // users 2..6 hold roles in journal 1; the site admin holds none there
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|row| row["id"] != 1));
    }

    #[test]
    fn grant_then_revoke_roundtrips() {
        let service = InMemoryService::default();
        let controller = UserRoleController::new(service.clone());
        let mut ctx = manager_ctx(&service);
        ctx.request.set("sa", "grant");
        ctx.post_vars.set("user", 4);
        ctx.post_vars.set("role", "reviewer");
        controller.manage_users(&mut ctx).unwrap();
        assert!(service
            .user_roles(4)
            .unwrap()
            .iter()
            .any(|assignment| assignment.role == RolePath::Reviewer));

        let mut ctx = manager_ctx(&service);
        ctx.request.set("sa", "revoke");
        ctx.post_vars.set("user", 4);
        ctx.post_vars.set("role", "reviewer");
        controller.manage_users(&mut ctx).unwrap();
        assert!(!service
            .user_roles(4)
            .unwrap()
            .iter()
            .any(|assignment| assignment.role == RolePath::Reviewer));
    }

    #[test]
    fn unknown_role_string_is_rejected() {
        let service = InMemoryService::default();
        let controller = UserRoleController::new(service.clone());
        let mut ctx = manager_ctx(&service);
        ctx.request.set("sa", "grant");
        ctx.post_vars.set("user", 4);
        ctx.post_vars.set("role", "librarian");
        assert!(matches!(
            controller.manage_users(&mut ctx),
            Err(JournalError::Validation(_))
        ));
    }

    #[test]
    fn authors_cannot_manage_users() {
        let service = InMemoryService::default();
        let controller = UserRoleController::new(service.clone());
        let mut ctx = JournalContext::default();
        load_user(&service, &mut ctx, 4).unwrap();
        assert!(controller.manage_users(&mut ctx).is_err());
    }
}
