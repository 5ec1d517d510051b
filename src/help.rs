use crate::logging::log_action;
use crate::services::{
    JournalContext, JournalError, JournalService, NewSupportTicket, RolePath, ServiceResult,
    SupportTicket, ensure,
};
use serde_json::json;

#[derive(Clone, Copy, Debug)]
pub struct FaqEntry {
    pub question: &'static str,
    pub answer: &'static str,
}

const AUTHOR_FAQS: &[FaqEntry] = &[
    FaqEntry {
        question: "How do I submit a new manuscript?",
        answer: "Click \"New Submission\" in your dashboard, fill out the submission form, \
                 upload your manuscript files and complete the metadata. Follow the journal's \
                 submission guidelines.",
    },
    FaqEntry {
        question: "What file formats are accepted for manuscript submission?",
        answer: "Manuscripts are accepted in PDF, DOC and DOCX formats. Figures should be \
                 submitted separately in high-resolution PNG, JPG or TIFF.",
    },
    FaqEntry {
        question: "How long does the review process take?",
        answer: "The typical review process takes 4-8 weeks from submission to initial \
                 decision, depending on manuscript complexity and reviewer availability.",
    },
    FaqEntry {
        question: "Can I track the status of my submission?",
        answer: "Yes. \"My Submissions\" shows the current stage of each manuscript \
                 (Submission, Review, Copyediting or Production) and any pending actions.",
    },
    FaqEntry {
        question: "What happens after my manuscript is accepted?",
        answer: "Accepted manuscripts enter copyediting and production. You will receive \
                 proofs to review and be notified as the article is scheduled for publication.",
    },
];

const REVIEWER_FAQS: &[FaqEntry] = &[
    FaqEntry {
        question: "How do I access manuscripts for review?",
        answer: "When a manuscript is assigned to you, an email notification is sent. Open \
                 \"Review Assignments\" in the reviewer dashboard and click the manuscript \
                 title to access the full text.",
    },
    FaqEntry {
        question: "What is the typical review timeline?",
        answer: "Reviews are normally due within 3-4 weeks of accepting an assignment; the \
                 due date is shown on each assignment card.",
    },
    FaqEntry {
        question: "What criteria should I use for evaluation?",
        answer: "Evaluate originality, methodological soundness, clarity of presentation and \
                 relevance to the journal's scope, using the journal's review form.",
    },
    FaqEntry {
        question: "How do I submit my review recommendations?",
        answer: "Complete the review form attached to the assignment and select a \
                 recommendation; the editor is notified when you submit.",
    },
    FaqEntry {
        question: "Can I review if I have a conflict of interest?",
        answer: "No. Decline the assignment and note the conflict; the editor will select \
                 another reviewer.",
    },
];

const TICKET_CATEGORIES: &[&str] = &["account", "submission", "review", "technical", "other"];
const TICKET_PRIORITIES: &[&str] = &["low", "normal", "high", "urgent"];

pub struct HelpController<S: JournalService> {
    service: S,
}

impl<S: JournalService> HelpController<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Help page: the FAQ catalog for the user's role, filtered by the `search`
    /// request var when present.
    pub fn view_help(&self, ctx: &mut JournalContext) -> ServiceResult<()> {
        let catalog = self.catalog_for(ctx);
        let query = ctx.request.string("search").unwrap_or_default();
        let entries: Vec<_> = search_faqs(catalog, &query)
            .iter()
            .map(|entry| json!({"question": entry.question, "answer": entry.answer}))
            .collect();
        ctx.context.set("faqs", entries);
        let tickets = self.service.list_support_tickets(ctx.user.id)?;
        ctx.context.set("support_tickets", &tickets);
        Ok(())
    }

    pub fn submit_ticket(&self, ctx: &mut JournalContext) -> ServiceResult<SupportTicket> {
        let subject = ctx.post_vars.string("subject").unwrap_or_default();
        let subject = subject.trim().to_string();
        ensure(
            !subject.is_empty(),
            JournalError::Validation("subject_required".into()),
        )?;
        let message = ctx.post_vars.string("message").unwrap_or_default();
        let message = message.trim().to_string();
        ensure(
            !message.is_empty(),
            JournalError::Validation("message_required".into()),
        )?;
        let category = ctx
            .post_vars
            .string("category")
            .filter(|raw| TICKET_CATEGORIES.contains(&raw.as_str()))
            .unwrap_or_else(|| "other".into());
        let priority = ctx
            .post_vars
            .string("priority")
            .filter(|raw| TICKET_PRIORITIES.contains(&raw.as_str()))
            .unwrap_or_else(|| "normal".into());
        let ticket = self.service.submit_support_ticket(NewSupportTicket {
            user_id: ctx.user.id,
            subject,
            category,
            message,
            priority,
        })?;
        log_action(
            &self.service,
            ctx,
            "support_ticket.submit",
            json!({"ticket_id": ticket.id}),
        )?;
        ctx.context.set("submitted_ticket", &ticket);
        Ok(ticket)
    }

    fn catalog_for(&self, ctx: &JournalContext) -> &'static [FaqEntry] {
        if ctx.user.has_role(RolePath::Reviewer, ctx.journal_id)
            && !ctx.user.has_role(RolePath::Author, ctx.journal_id)
        {
            REVIEWER_FAQS
        } else {
            AUTHOR_FAQS
        }
    }
}

pub fn search_faqs(catalog: &'static [FaqEntry], query: &str) -> Vec<&'static FaqEntry> {
    let needle = query.trim().to_lowercase();
    catalog
        .iter()
        .filter(|entry| {
            needle.is_empty()
                || entry.question.to_lowercase().contains(&needle)
                || entry.answer.to_lowercase().contains(&needle)
        })
        .collect()
}
