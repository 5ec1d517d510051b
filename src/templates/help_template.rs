use serde_json::Value;
use std::fmt::Write;

/// FAQ accordion markup; each entry starts collapsed and the front-end toggles
/// the `open` class.
pub fn render_faq_accordion(faqs: &[Value]) -> String {
    let mut html = String::from("<div class=\"faq-accordion\">");
    if faqs.is_empty() {
        html.push_str("<div class=\"faq-empty\">No help topics match your search.</div>");
    } else {
        for entry in faqs {
            let question = entry.get("question").and_then(Value::as_str).unwrap_or("");
            let answer = entry.get("answer").and_then(Value::as_str).unwrap_or("");
            writeln!(
                html,
                "<details class=\"faq-item\"><summary>{}</summary><p>{}</p></details>",
                question, answer
            )
            .ok();
        }
    }
    html.push_str("</div>");
    html
}
