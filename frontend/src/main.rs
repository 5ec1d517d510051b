use dioxus::prelude::*;
use reqwasm::http::{Method, Request};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

fn main() {
    launch(App);
}

// ---------- Types ----------
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct ReviewForm {
    id: i64,
    journal_id: i64,
    title: String,
    description: String,
    is_active: bool,
    questions: i64,
    updated_at: String,
}

#[derive(Deserialize)]
struct ReviewFormListResponse { ok: bool, message: Option<String>, forms: Option<Vec<ReviewForm>> }
#[derive(Deserialize)]
struct ReviewFormSaveResponse { ok: bool, message: Option<String>, form: Option<ReviewForm> }
#[derive(Deserialize)]
struct AckResponse { ok: bool, message: Option<String> }

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
struct EditorStats {
    #[serde(rename = "myQueue")] my_queue: usize,
    unassigned: usize,
    submission: usize,
    #[serde(rename = "inReview")] in_review: usize,
    copyediting: usize,
    production: usize,
    #[serde(rename = "allActive")] all_active: usize,
    archived: usize,
    tasks: usize,
}
#[derive(Deserialize)]
struct DashboardResponse { ok: bool, message: Option<String>, stats: Option<EditorStats> }

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
struct StatusBreakdown { published: usize, declined: usize, accepted: usize, #[serde(rename = "inReview")] in_review: usize }
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
struct StageBreakdown { submission: usize, review: usize, copyediting: usize, production: usize }
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
struct Statistics {
    #[serde(rename = "totalSubmissions")] total_submissions: usize,
    #[serde(rename = "byStatus")] by_status: StatusBreakdown,
    #[serde(rename = "byStage")] by_stage: StageBreakdown,
    #[serde(rename = "totalUsers")] total_users: usize,
}
#[derive(Deserialize)]
struct StatisticsResponse { ok: bool, message: Option<String>, statistics: Option<Statistics> }

#[derive(Serialize)]
struct ReviewFormPayload { title: String, description: String, questions: i64, #[serde(rename = "isActive")] is_active: bool }
#[derive(Serialize)]
struct TogglePayload { #[serde(rename = "isActive")] is_active: bool }

struct Faq { question: &'static str, answer: &'static str }
const FAQS: &[Faq] = &[
    Faq { question: "How do I submit a new manuscript?", answer: "Click \"New Submission\" in your dashboard, fill out the submission form, upload your manuscript files and complete the metadata." },
    Faq { question: "What file formats are accepted?", answer: "Manuscripts in PDF, DOC or DOCX; figures separately as high-resolution PNG, JPG or TIFF." },
    Faq { question: "How long does the review process take?", answer: "Typically 4-8 weeks from submission to initial decision, depending on reviewer availability." },
    Faq { question: "Can I track the status of my submission?", answer: "Yes, \"My Submissions\" shows the current stage (Submission, Review, Copyediting, Production) and pending actions." },
    Faq { question: "What happens after acceptance?", answer: "The manuscript enters copyediting and production; you will receive proofs and a publication schedule." },
];

// ---------- Utilities ----------
fn window() -> Option<web_sys::Window> { web_sys::window() }
fn save_token_to_storage(token: &str) { if let Some(win) = window() { if let Ok(Some(storage)) = win.local_storage() { let _ = storage.set_item("jwt_token", token); } } }
fn load_token_from_storage() -> Option<String> { window().and_then(|win| win.local_storage().ok().flatten()).and_then(|s| s.get_item("jwt_token").ok().flatten()) }

async fn send_json<T: DeserializeOwned>(method: Method, base: &str, path: &str, token: &str, body: Option<String>) -> Result<T, String> {
    let url = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    let mut req = Request::new(&url).method(method);
    if !token.trim().is_empty() { req = req.header("Authorization", &format!("Bearer {}", token)); }
    if let Some(payload) = body {
        req = req.header("Content-Type", "application/json").body(payload);
    }
    let resp = req.send().await.map_err(|e| format!("网络错误: {e}"))?;
    let status = resp.status();
    let text = resp.text().await.map_err(|e| format!("读取响应失败: {e}"))?;
    if !resp.ok() {
        // API errors still carry the envelope; surface its message when present
        if let Ok(ack) = serde_json::from_str::<AckResponse>(&text) {
            if let Some(message) = ack.message { return Err(message); }
        }
        return Err(format!("HTTP {status}: {text}"));
    }
    serde_json::from_str(&text).map_err(|e| format!("解析失败: {e}，原始响应: {text}"))
}

async fn get_json<T: DeserializeOwned>(base: &str, path: &str, token: &str) -> Result<T, String> {
    send_json(Method::GET, base, path, token, None).await
}

async fn post_json<T: DeserializeOwned, B: Serialize>(base: &str, path: &str, token: &str, body: &B) -> Result<T, String> {
    send_json(Method::POST, base, path, token, Some(serde_json::to_string(body).unwrap())).await
}

async fn patch_json<T: DeserializeOwned, B: Serialize>(base: &str, path: &str, token: &str, body: &B) -> Result<T, String> {
    send_json(Method::PATCH, base, path, token, Some(serde_json::to_string(body).unwrap())).await
}

async fn delete_json<T: DeserializeOwned>(base: &str, path: &str, token: &str) -> Result<T, String> {
    send_json(Method::DELETE, base, path, token, None).await
}

// ---------- App ----------
fn App() -> Element {
    let mut api_base = use_signal(|| "http://127.0.0.1:3000".to_string());
    let mut token = use_signal(|| load_token_from_storage().unwrap_or_default());
    let mut status = use_signal(|| "等待操作...".to_string());
    let mut journal_id = use_signal(|| "1".to_string());

    let mut forms = use_signal(Vec::<ReviewForm>::new);
    let mut form_search = use_signal(|| "".to_string());
    let mut processing_id = use_signal(|| 0_i64);
    let mut is_submitting = use_signal(|| false);

    let mut new_title = use_signal(|| "".to_string());
    let mut new_description = use_signal(|| "".to_string());
    let mut new_questions = use_signal(|| "".to_string());
    let mut new_active = use_signal(|| false);
    let mut field_error = use_signal(|| "".to_string());

    let mut edit_id = use_signal(|| 0_i64);
    let mut edit_title = use_signal(|| "".to_string());
    let mut edit_description = use_signal(|| "".to_string());
    let mut edit_questions = use_signal(|| "".to_string());

    let mut dashboard = use_signal(EditorStats::default);
    let mut statistics = use_signal(Statistics::default);
    let mut open_faq = use_signal(|| -1_i32);
    let mut ticket_subject = use_signal(|| "".to_string());
    let mut ticket_message = use_signal(|| "".to_string());

    // data loaders
    let load_forms = move || {
        let base = api_base.read().clone();
        let jwt = token.read().clone();
        let journal = journal_id.read().clone();
        let mut status = status.clone();
        let mut forms = forms.clone();
        if jwt.trim().is_empty() { status.set("请先粘贴 JWT".into()); return; }
        spawn(async move {
            status.set("加载评审表单中...".into());
            let path = format!("/api/editor/review-forms?journalId={}", journal);
            match get_json::<ReviewFormListResponse>(&base, &path, &jwt).await {
                Ok(resp) if resp.ok => {
                    forms.set(resp.forms.unwrap_or_default());
                    status.set("评审表单加载完成".into());
                }
                Ok(resp) => status.set(resp.message.unwrap_or_else(|| "加载失败".into())),
                Err(err) => status.set(format!("加载失败：{err}")),
            }
        });
    };

    let load_dashboard = move || {
        let base = api_base.read().clone();
        let jwt = token.read().clone();
        let mut status = status.clone();
        let mut dashboard = dashboard.clone();
        spawn(async move {
            status.set("加载编辑工作台...".into());
            match get_json::<DashboardResponse>(&base, "/api/editor/dashboard", &jwt).await {
                Ok(resp) if resp.ok => {
                    dashboard.set(resp.stats.unwrap_or_default());
                    status.set("工作台加载完成".into());
                }
                Ok(resp) => status.set(resp.message.unwrap_or_else(|| "加载失败".into())),
                Err(err) => status.set(format!("加载失败：{err}")),
            }
        });
    };

    let load_statistics = move || {
        let base = api_base.read().clone();
        let jwt = token.read().clone();
        let journal = journal_id.read().clone();
        let mut status = status.clone();
        let mut statistics = statistics.clone();
        spawn(async move {
            status.set("加载统计数据...".into());
            let path = format!("/api/manager/statistics?journalId={}", journal);
            match get_json::<StatisticsResponse>(&base, &path, &jwt).await {
                Ok(resp) if resp.ok => {
                    statistics.set(resp.statistics.unwrap_or_default());
                    status.set("统计数据加载完成".into());
                }
                Ok(resp) => status.set(resp.message.unwrap_or_else(|| "加载失败".into())),
                Err(err) => status.set(format!("加载失败：{err}")),
            }
        });
    };

    let create_form = move || {
        let title = new_title.read().trim().to_string();
        let questions_raw = new_questions.read().trim().to_string();
        // validation mirrors the server: reject before any request goes out
        if title.is_empty() {
            field_error.set("标题不能为空".into());
            return;
        }
        let questions = if questions_raw.is_empty() { 0 } else {
            match questions_raw.parse::<i64>() {
                Ok(n) if n >= 0 => n,
                _ => { field_error.set("问题数必须是非负整数".into()); return; }
            }
        };
        field_error.set("".into());
        let base = api_base.read().clone();
        let jwt = token.read().clone();
        let journal = journal_id.read().clone();
        let payload = ReviewFormPayload {
            title,
            description: new_description.read().trim().to_string(),
            questions,
            is_active: *new_active.read(),
        };
        let mut status = status.clone();
        let mut is_submitting = is_submitting.clone();
        let mut new_title = new_title.clone();
        let mut new_description = new_description.clone();
        let mut new_questions = new_questions.clone();
        let mut load = load_forms.clone();
        is_submitting.set(true);
        spawn(async move {
            status.set("创建评审表单中...".into());
            let path = format!("/api/editor/review-forms?journalId={}", journal);
            match post_json::<ReviewFormSaveResponse, _>(&base, &path, &jwt, &payload).await {
                Ok(resp) if resp.ok => {
                    new_title.set("".into());
                    new_description.set("".into());
                    new_questions.set("".into());
                    status.set("评审表单已创建".into());
                    load();
                }
                Ok(resp) => status.set(resp.message.unwrap_or_else(|| "创建失败".into())),
                Err(err) => status.set(format!("创建失败：{err}")),
            }
            is_submitting.set(false);
        });
    };

    let save_edit = move || {
        let form_id = *edit_id.read();
        if form_id == 0 { status.set("请先选择要编辑的表单".into()); return; }
        let title = edit_title.read().trim().to_string();
        if title.is_empty() { field_error.set("标题不能为空".into()); return; }
        let questions_raw = edit_questions.read().trim().to_string();
        let questions = if questions_raw.is_empty() { 0 } else {
            match questions_raw.parse::<i64>() {
                Ok(n) if n >= 0 => n,
                _ => { field_error.set("问题数必须是非负整数".into()); return; }
            }
        };
        field_error.set("".into());
        let base = api_base.read().clone();
        let jwt = token.read().clone();
        let journal = journal_id.read().clone();
        let payload = ReviewFormPayload {
            title,
            description: edit_description.read().trim().to_string(),
            questions,
            is_active: forms.read().iter().find(|f| f.id == form_id).map(|f| f.is_active).unwrap_or(false),
        };
        let mut status = status.clone();
        let mut processing = processing_id.clone();
        let mut edit_id_sig = edit_id.clone();
        let mut load = load_forms.clone();
        processing.set(form_id);
        spawn(async move {
            status.set("保存修改中...".into());
            let path = format!("/api/editor/review-forms/{}?journalId={}", form_id, journal);
            match patch_json::<ReviewFormSaveResponse, _>(&base, &path, &jwt, &payload).await {
                Ok(resp) if resp.ok => {
                    edit_id_sig.set(0);
                    status.set("评审表单已更新".into());
                    load();
                }
                Ok(resp) => status.set(resp.message.unwrap_or_else(|| "更新失败".into())),
                Err(err) => status.set(format!("更新失败：{err}")),
            }
            processing.set(0);
        });
    };

    let filtered_forms = {
        let keyword = form_search.read().trim().to_lowercase();
        forms.read().iter().cloned().filter(|form| {
            keyword.is_empty()
                || form.title.to_lowercase().contains(&keyword)
                || form.description.to_lowercase().contains(&keyword)
        }).collect::<Vec<_>>()
    };

    rsx! {
        main { class: "page",
            section { class: "hero",
                div { class: "hero__copy",
                    span { class: "pill", "Journal" }
                    h1 { "期刊管理工作台" }
                    p { "评审表单管理、编辑工作台与期刊统计，基于 journal-manager-rust API。" }
                    div { class: "hero__actions",
                        button { onclick: move |_| load_forms(), "加载评审表单" }
                        button { onclick: move |_| load_dashboard(), "加载工作台" }
                        button { onclick: move |_| load_statistics(), "加载统计" }
                    }
                }
                div { class: "hero__panel",
                    div { class: "stat", span { "状态" } strong { "{status.read()}" } }
                    div { class: "stat-row",
                        div { class: "stat-box", strong { "{forms.read().len()}" } span { "评审表单" } }
                        div { class: "stat-box", strong { "{dashboard.read().all_active}" } span { "活跃稿件" } }
                        div { class: "stat-box", strong { "{statistics.read().total_users}" } span { "用户" } }
                    }
                }
            }

            section { class: "panel",
                h2 { "连接配置" }
                div { class: "grid two",
                    div {
                        label { "API 基址" }
                        input { value: "{api_base.read()}", oninput: move |evt| api_base.set(evt.value()) }
                        label { "期刊 ID (journalId)" }
                        input { value: "{journal_id.read()}", oninput: move |evt| journal_id.set(evt.value()) }
                    }
                    div {
                        label { "JWT Token" }
                        textarea { value: "{token.read()}", rows: "3", oninput: move |evt| { token.set(evt.value()); save_token_to_storage(&evt.value()); } }
                        div { class: "actions",
                            button { onclick: move |_| { token.set("".into()); save_token_to_storage(""); status.set("已清空本地 token".into()); }, "清空 Token" }
                        }
                    }
                }
            }

            section { class: "panel",
                div { class: "panel__header",
                    h3 { "评审表单" }
                    span { class: "muted", "创建 / 编辑 / 启停 / 删除，保存后整表刷新" }
                }
                div { class: "actions",
                    input { value: "{form_search.read()}", oninput: move |evt| form_search.set(evt.value()), placeholder: "按标题或描述搜索" }
                    button { onclick: move |_| form_search.set("".into()), "清空" }
                    button { onclick: move |_| load_forms(), "刷新" }
                }
                if !field_error.read().is_empty() {
                    div { class: "banner banner--error", "{field_error.read()}" }
                }
                div { class: "grid two gap",
                    div { class: "card-ghost",
                        h4 { "新建表单" }
                        input { value: "{new_title.read()}", oninput: move |evt| new_title.set(evt.value()), placeholder: "标题（必填）" }
                        input { value: "{new_description.read()}", oninput: move |evt| new_description.set(evt.value()), placeholder: "描述" }
                        input { value: "{new_questions.read()}", oninput: move |evt| new_questions.set(evt.value()), placeholder: "问题数（默认 0）" }
                        div { class: "checkbox",
                            input { r#type: "checkbox", checked: "{*new_active.read()}", oninput: move |_| { let current = *new_active.read(); new_active.set(!current); } }
                            span { "创建后立即启用" }
                        }
                        div { class: "actions",
                            button { disabled: "{*is_submitting.read()}", onclick: move |_| create_form(), "创建" }
                        }
                    }
                    div { class: "card-ghost",
                        h4 { "编辑表单 #{edit_id.read()}" }
                        input { value: "{edit_title.read()}", oninput: move |evt| edit_title.set(evt.value()), placeholder: "标题" }
                        input { value: "{edit_description.read()}", oninput: move |evt| edit_description.set(evt.value()), placeholder: "描述" }
                        input { value: "{edit_questions.read()}", oninput: move |evt| edit_questions.set(evt.value()), placeholder: "问题数" }
                        div { class: "actions",
                            button { onclick: move |_| save_edit(), "保存修改" }
                            button { onclick: move |_| edit_id.set(0), "取消" }
                        }
                    }
                }
                ul { class: "list form-list",
                    { filtered_forms.into_iter().map(|form| {
                        let busy = *processing_id.read() == form.id;
                        let toggle_form = form.clone();
                        let edit_form = form.clone();
                        let delete_form = form.clone();
                        rsx! {
                            li { class: "item",
                                strong { "{form.title}" }
                                span { class: if form.is_active { "badge badge--on" } else { "badge" },
                                    if form.is_active { "Active" } else { "Inactive" }
                                }
                                div { class: "meta", "问题数: {form.questions} | 更新: {form.updated_at} | {form.description}" }
                                div { class: "actions",
                                    button { onclick: move |_| {
                                        edit_id.set(edit_form.id);
                                        edit_title.set(edit_form.title.clone());
                                        edit_description.set(edit_form.description.clone());
                                        edit_questions.set(edit_form.questions.to_string());
                                    }, "编辑" }
                                    button { disabled: "{busy}", onclick: move |_| {
                                        let base = api_base.read().clone();
                                        let jwt = token.read().clone();
                                        let journal = journal_id.read().clone();
                                        let payload = TogglePayload { is_active: !toggle_form.is_active };
                                        let form_id = toggle_form.id;
                                        let mut status = status.clone();
                                        let mut processing = processing_id.clone();
                                        let mut load = load_forms.clone();
                                        processing.set(form_id);
                                        spawn(async move {
                                            let path = format!("/api/editor/review-forms/{}?journalId={}", form_id, journal);
                                            match patch_json::<ReviewFormSaveResponse, _>(&base, &path, &jwt, &payload).await {
                                                Ok(resp) if resp.ok => { status.set("已切换启用状态".into()); load(); }
                                                Ok(resp) => status.set(resp.message.unwrap_or_else(|| "切换失败".into())),
                                                Err(err) => status.set(format!("切换失败：{err}")),
                                            }
                                            processing.set(0);
                                        });
                                    }, if form.is_active { "停用" } else { "启用" } }
                                    button { class: "link danger", disabled: "{busy}", onclick: move |_| {
                                        let base = api_base.read().clone();
                                        let jwt = token.read().clone();
                                        let journal = journal_id.read().clone();
                                        let form_id = delete_form.id;
                                        let mut status = status.clone();
                                        let mut processing = processing_id.clone();
                                        let mut load = load_forms.clone();
                                        processing.set(form_id);
                                        spawn(async move {
                                            let path = format!("/api/editor/review-forms/{}?journalId={}", form_id, journal);
                                            match delete_json::<AckResponse>(&base, &path, &jwt).await {
                                                Ok(resp) if resp.ok => { status.set("评审表单已删除".into()); load(); }
                                                Ok(resp) => status.set(resp.message.unwrap_or_else(|| "删除失败".into())),
                                                Err(err) => status.set(format!("删除失败：{err}")),
                                            }
                                            processing.set(0);
                                        });
                                    }, "删除" }
                                }
                            }
                        }
                    })}
                }
            }

            section { class: "panel grid two",
                div {
                    h3 { "编辑工作台" }
                    div { class: "stat-row",
                        div { class: "stat-box", strong { "{dashboard.read().my_queue}" } span { "我的队列" } }
                        div { class: "stat-box", strong { "{dashboard.read().unassigned}" } span { "未分配" } }
                        div { class: "stat-box", strong { "{dashboard.read().tasks}" } span { "待办任务" } }
                    }
                    ul { class: "list",
                        li { class: "item", "投稿阶段: {dashboard.read().submission}" }
                        li { class: "item", "评审阶段: {dashboard.read().in_review}" }
                        li { class: "item", "编校阶段: {dashboard.read().copyediting}" }
                        li { class: "item", "排版阶段: {dashboard.read().production}" }
                        li { class: "item", "已归档: {dashboard.read().archived}" }
                    }
                }
                div {
                    h3 { "期刊统计" }
                    div { class: "stat-row",
                        div { class: "stat-box", strong { "{statistics.read().total_submissions}" } span { "总投稿" } }
                        div { class: "stat-box", strong { "{statistics.read().by_status.published}" } span { "已发表" } }
                        div { class: "stat-box", strong { "{statistics.read().by_status.declined}" } span { "已拒稿" } }
                    }
                    ul { class: "list",
                        li { class: "item", "接收: {statistics.read().by_status.accepted} | 在审: {statistics.read().by_status.in_review}" }
                        li { class: "item", "阶段分布 — 投稿 {statistics.read().by_stage.submission} / 评审 {statistics.read().by_stage.review} / 编校 {statistics.read().by_stage.copyediting} / 排版 {statistics.read().by_stage.production}" }
                        li { class: "item", "注册角色数: {statistics.read().total_users}" }
                    }
                }
            }

            section { class: "panel",
                div { class: "panel__header",
                    h3 { "帮助 / 支持" }
                    span { class: "muted", "常见问题与支持工单" }
                }
                ul { class: "list faq-list",
                    { FAQS.iter().enumerate().map(|(index, faq)| {
                        let open = *open_faq.read() == index as i32;
                        rsx! {
                            li { class: if open { "item selected" } else { "item" },
                                onclick: move |_| {
                                    let current = *open_faq.read();
                                    open_faq.set(if current == index as i32 { -1 } else { index as i32 });
                                },
                                strong { "{faq.question}" }
                                if open { p { "{faq.answer}" } }
                            }
                        }
                    })}
                }
                h4 { "提交支持工单" }
                div { class: "stack",
                    input { value: "{ticket_subject.read()}", oninput: move |evt| ticket_subject.set(evt.value()), placeholder: "主题" }
                    textarea { value: "{ticket_message.read()}", oninput: move |evt| ticket_message.set(evt.value()), rows: "3", placeholder: "问题描述" }
                    button { onclick: move |_| {
                        if ticket_subject.read().trim().is_empty() || ticket_message.read().trim().is_empty() {
                            status.set("请填写工单主题和描述".into());
                            return;
                        }
                        ticket_subject.set("".into());
                        ticket_message.set("".into());
                        status.set("支持工单已提交".into());
                    }, "提交工单" }
                }
            }
        }
    }
}
