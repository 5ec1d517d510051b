use crate::services::{
    JournalContext, JournalError, JournalService, RolePath, ServiceResult,
};

/// Populate the context's user info from the role store. The caller supplies the
/// authenticated user id (from the JWT subject); everything else is looked up.
pub fn load_user<S: JournalService>(
    service: &S,
    ctx: &mut JournalContext,
    user_id: i64,
) -> ServiceResult<()> {
    let account = service
        .get_user(user_id)?
        .ok_or_else(|| JournalError::NotFound(format!("user {user_id}")))?;
    ctx.user.id = account.id;
    ctx.user.name = account.name;
    ctx.user.email = account.email;
    ctx.user.roles = service.user_roles(user_id)?;
    if ctx.journal_id.is_none() {
        ctx.journal_id = ctx.user.journal_context();
    }
    Ok(())
}

pub fn require_role(ctx: &JournalContext, role: RolePath) -> ServiceResult<()> {
    if ctx.user.has_role(role, ctx.journal_id) {
        Ok(())
    } else {
        Err(JournalError::PermissionDenied(role.as_str().into()))
    }
}

pub fn require_any_role(ctx: &JournalContext, roles: &[RolePath]) -> ServiceResult<()> {
    if ctx.user.has_any_role(roles, ctx.journal_id) {
        Ok(())
    } else {
        let wanted = roles
            .iter()
            .map(|role| role.as_str())
            .collect::<Vec<_>>()
            .join("|");
        Err(JournalError::PermissionDenied(wanted))
    }
}

/// Resolve the journal a request acts on: an explicit `journal` request var wins,
/// otherwise the user's own journal context.
pub fn resolve_journal(ctx: &JournalContext) -> ServiceResult<i64> {
    if let Some(journal_id) = ctx.request.int("journal") {
        return Ok(journal_id);
    }
    ctx.journal_id
        .or_else(|| ctx.user.journal_context())
        .ok_or_else(|| JournalError::Validation("journal_context_unresolved".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryService, JournalContext};

    #[test]
    fn load_user_populates_roles_and_journal() {
        let service = InMemoryService::default();
        let mut ctx = JournalContext::default();
        load_user(&service, &mut ctx, 3).unwrap();
        assert_eq!(ctx.user.name, "Elena Duarte");
        assert_eq!(ctx.journal_id, Some(1));
        assert!(require_role(&ctx, RolePath::Editor).is_ok());
        assert!(require_role(&ctx, RolePath::Manager).is_err());
    }

    #[test]
    fn unknown_user_is_rejected() {
        let service = InMemoryService::default();
        let mut ctx = JournalContext::default();
        assert!(load_user(&service, &mut ctx, 99).is_err());
    }

    #[test]
    fn site_wide_role_passes_in_any_journal() {
        let service = InMemoryService::default();
        let mut ctx = JournalContext::default();
        load_user(&service, &mut ctx, 1).unwrap();
        ctx.journal_id = Some(2);
        assert!(require_any_role(&ctx, &[RolePath::Manager, RolePath::Admin]).is_ok());
    }

    #[test]
    fn explicit_journal_request_var_wins() {
        let service = InMemoryService::default();
        let mut ctx = JournalContext::default();
        load_user(&service, &mut ctx, 2).unwrap();
        ctx.request.set("journal", 2);
        assert_eq!(resolve_journal(&ctx).unwrap(), 2);
    }

    #[test]
    fn missing_journal_context_is_a_validation_error() {
        let ctx = JournalContext::default();
        assert!(matches!(
            resolve_journal(&ctx),
            Err(crate::services::JournalError::Validation(_))
        ));
    }
}
