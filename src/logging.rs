use crate::services::{JournalContext, JournalService, ServiceResult};

pub fn log_action<S: JournalService>(
    service: &S,
    ctx: &JournalContext,
    action: &str,
    details: serde_json::Value,
) -> ServiceResult<()> {
    let actor = if ctx.user.id != 0 {
        Some(ctx.user.id)
    } else {
        None
    };
    service.log_action(action, actor, &details)
}
