use journal_manager_rust::dashboard::DashboardController;
use journal_manager_rust::errors::render_error;
use journal_manager_rust::review_forms::ReviewFormController;
use journal_manager_rust::security::load_user;
use journal_manager_rust::services::{InMemoryService, JournalContext};
use journal_manager_rust::statistics::StatisticsController;
use journal_manager_rust::templates::dashboard_template::render_stat_cards;

fn main() {
    let service = InMemoryService::default();
    let statistics = StatisticsController::new(service.clone());
    let review_forms = ReviewFormController::new(service.clone());
    let dashboards = DashboardController::new(service.clone());

    let mut manager_ctx = JournalContext::default();
    if let Err(error) = load_user(&service, &mut manager_ctx, 2) {
        eprintln!("load manager -> {error}");
        return;
    }
    if let Err(error) = statistics.view_statistics(&mut manager_ctx) {
        let _ = render_error(&mut manager_ctx, error);
        if let Some(message) = manager_ctx.context.string("error_message") {
            eprintln!("view_statistics() -> {message}");
        }
    }
    if let Some(report) = manager_ctx.context.get("statistics") {
        println!("{}", render_stat_cards(report));
    }

    let mut editor_ctx = JournalContext::default();
    if let Err(error) = load_user(&service, &mut editor_ctx, 3) {
        eprintln!("load editor -> {error}");
        return;
    }
    if let Err(error) = dashboards.editor_dashboard(&mut editor_ctx) {
        eprintln!("editor_dashboard() -> {error}");
    }
    if let Some(stats) = editor_ctx.context.get("dashboard_stats") {
        println!("editor dashboard: {stats}");
    }

    match review_forms.list(&mut editor_ctx) {
        Ok(forms) => {
            for form in &forms {
                println!(
                    "review form #{} \"{}\" active={} questions={}",
                    form.id, form.title, form.is_active, form.questions
                );
            }
            if let Some(first) = forms.first() {
                match review_forms.toggle_active(&mut editor_ctx, first.id) {
                    Ok(updated) => {
                        println!("toggled form #{} -> active={}", updated.id, updated.is_active)
                    }
                    Err(error) => eprintln!("toggle_active() -> {error}"),
                }
            }
        }
        Err(error) => eprintln!("list review forms -> {error}"),
    }
}
