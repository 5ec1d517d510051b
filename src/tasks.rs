use crate::security::require_any_role;
use crate::services::{JournalContext, JournalService, RolePath, ServiceResult};
use serde_json::json;

pub fn editor_task_list<S: JournalService>(
    service: &S,
    ctx: &mut JournalContext,
) -> ServiceResult<()> {
    require_any_role(ctx, &[RolePath::Editor, RolePath::Manager, RolePath::Admin])?;
    let tasks = service.list_editor_tasks(ctx.user.id)?;
    let rows: Vec<_> = tasks
        .iter()
        .map(|task| {
            json!({
                "id": task.id,
                "title": task.title,
                "completed": task.completed,
            })
        })
        .collect();
    ctx.context.set("editor_tasks", rows);
    ctx.context
        .set("open_tasks", service.open_task_count(ctx.user.id)? as i64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::load_user;
    use crate::services::{InMemoryService, JournalContext};

    #[test]
    fn task_list_counts_open_items() {
        let service = InMemoryService::default();
        let mut ctx = JournalContext::default();
        load_user(&service, &mut ctx, 3).unwrap();
        editor_task_list(&service, &mut ctx).unwrap();
        let rows = ctx.context.get("editor_tasks").unwrap().as_array().unwrap().clone();
        assert_eq!(rows.len(), 3);
        assert_eq!(ctx.context.int("open_tasks"), Some(2));
    }

    #[test]
    fn authors_have_no_task_list() {
        let service = InMemoryService::default();
        let mut ctx = JournalContext::default();
        load_user(&service, &mut ctx, 4).unwrap();
        assert!(editor_task_list(&service, &mut ctx).is_err());
    }
}
