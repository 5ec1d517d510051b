use crate::services::{JournalContext, JournalError, ServiceResult};

/// Record an error message in the view model and hand the error back for the
/// transport layer to map. Nothing here aborts the process; every failure still
/// renders something.
pub fn render_error(ctx: &mut JournalContext, error: JournalError) -> ServiceResult<()> {
    ctx.context.set("error_message", error.to_string());
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::JournalContext;

    #[test]
    fn render_error_sets_message_and_propagates() {
        let mut ctx = JournalContext::default();
        let result = render_error(&mut ctx, JournalError::Validation("title_required".into()));
        assert!(result.is_err());
        assert_eq!(
            ctx.context.string("error_message").unwrap(),
            "validation error: title_required"
        );
    }
}
