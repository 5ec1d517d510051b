use serde_json::Value;
use std::fmt::Write;

/// Stat cards for the manager statistics page. Expects the serialized
/// statistics report.
pub fn render_stat_cards(statistics: &Value) -> String {
    let total = statistics
        .get("totalSubmissions")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let users = statistics
        .get("totalUsers")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let published = statistics
        .pointer("/byStatus/published")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let mut html = String::new();
    html.push_str("<div class=\"stat-row\">");
    for (label, value) in [
        ("Submissions", total),
        ("Published", published),
        ("Users", users),
    ] {
        writeln!(
            html,
            "<div class=\"stat-box\"><strong>{}</strong><span>{}</span></div>",
            value, label
        )
        .ok();
    }
    html.push_str("</div>");
    html
}

/// Per-stage progress bars, widths proportional to the stage share of the
/// total. A zero total renders empty bars rather than dividing by zero.
pub fn render_stage_bars(statistics: &Value) -> String {
    let total = statistics
        .get("totalSubmissions")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let mut html = String::from("<div class=\"stage-bars\">");
    for stage in ["submission", "review", "copyediting", "production"] {
        let count = statistics
            .pointer(&format!("/byStage/{stage}"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let percent = if total == 0 { 0 } else { count * 100 / total };
        writeln!(
            html,
            "<div class=\"stage\"><span class=\"stage-label\">{}</span>\
             <div class=\"bar\"><div class=\"fill\" style=\"width: {}%\"></div></div>\
             <span class=\"stage-count\">{}</span></div>",
            stage, percent, count
        )
        .ok();
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cards_show_totals() {
        let html = render_stat_cards(&json!({
            "totalSubmissions": 7,
            "totalUsers": 5,
            "byStatus": {"published": 2}
        }));
        assert!(html.contains("<strong>7</strong><span>Submissions</span>"));
        assert!(html.contains("<strong>2</strong><span>Published</span>"));
    }

    #[test]
    fn zero_total_renders_flat_bars() {
        let html = render_stage_bars(&json!({
            "totalSubmissions": 0,
            "byStage": {"submission": 0, "review": 0, "copyediting": 0, "production": 0}
        }));
        assert!(html.contains("width: 0%"));
    }
}
