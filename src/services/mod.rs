use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub type ServiceResult<T> = Result<T, JournalError>;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Debug, Default)]
pub struct DataBag {
    inner: HashMap<String, Value>,
}

impl DataBag {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        self.inner.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
    }

    pub fn remove(&mut self, key: &str) {
        self.inner.remove(key);
    }

    pub fn bool(&self, key: &str) -> bool {
        self.inner
            .get(key)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.inner.get(key).and_then(|value| value.as_i64())
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.inner
            .get(key)
            .and_then(|value| value.as_str().map(|s| s.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}

#[derive(Clone, Debug, Default)]
pub struct RequestVars {
    data: DataBag,
}

impl RequestVars {
    pub fn new() -> Self {
        Self {
            data: DataBag::new(),
        }
    }

    pub fn bool(&self, key: &str) -> bool {
        self.data.bool(key)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.data.int(key)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.data.string(key)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        self.data.set(key, value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains(key)
    }
}

/// A user's function within a journal context. Stored upstream as free-form
/// `role_path` strings; this is the set routing dispatches on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolePath {
    Admin,
    Manager,
    Editor,
    Author,
    Reviewer,
}

impl RolePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            RolePath::Admin => "admin",
            RolePath::Manager => "manager",
            RolePath::Editor => "editor",
            RolePath::Author => "author",
            RolePath::Reviewer => "reviewer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(RolePath::Admin),
            "manager" => Some(RolePath::Manager),
            "editor" => Some(RolePath::Editor),
            "author" => Some(RolePath::Author),
            "reviewer" => Some(RolePath::Reviewer),
            _ => None,
        }
    }
}

/// Status and stage are independent axes: the workflow advances `current_stage`
/// while editorial decisions set `status`, so a record can be `Accepted` and
/// still sit in the `Review` stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Submission,
    Review,
    Copyediting,
    Production,
    Accepted,
    Declined,
    Published,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Submission => "submission",
            SubmissionStatus::Review => "review",
            SubmissionStatus::Copyediting => "copyediting",
            SubmissionStatus::Production => "production",
            SubmissionStatus::Accepted => "accepted",
            SubmissionStatus::Declined => "declined",
            SubmissionStatus::Published => "published",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStage {
    Submission,
    Review,
    Copyediting,
    Production,
}

impl SubmissionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStage::Submission => "submission",
            SubmissionStage::Review => "review",
            SubmissionStage::Copyediting => "copyediting",
            SubmissionStage::Production => "production",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "submission" => Some(SubmissionStage::Submission),
            "review" => Some(SubmissionStage::Review),
            "copyediting" => Some(SubmissionStage::Copyediting),
            "production" => Some(SubmissionStage::Production),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: i64,
    pub role: RolePath,
    pub context_id: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub journal_id: i64,
    pub author_id: i64,
    pub title: String,
    pub status: SubmissionStatus,
    pub current_stage: SubmissionStage,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_archived: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Journal {
    pub id: i64,
    pub title: String,
    pub path: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReviewForm {
    pub id: i64,
    pub journal_id: i64,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub questions: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct NewReviewForm {
    pub journal_id: i64,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub questions: i64,
}

/// Partial update; `None` keeps the stored value. Last write wins, there is no
/// version column to reconcile concurrent editors.
#[derive(Clone, Debug, Default)]
pub struct ReviewFormPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub questions: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReviewAssignment {
    pub id: i64,
    pub submission_id: i64,
    pub reviewer_id: i64,
    pub due_at: DateTime<Utc>,
    pub accepted: bool,
    pub completed: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct EditorTask {
    pub id: i64,
    pub editor_id: i64,
    pub title: String,
    pub completed: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SupportTicket {
    pub id: i64,
    pub user_id: i64,
    pub subject: String,
    pub category: String,
    pub message: String,
    pub priority: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct NewSupportTicket {
    pub user_id: i64,
    pub subject: String,
    pub category: String,
    pub message: String,
    pub priority: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub action: String,
    pub user_id: Option<i64>,
    pub details: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SubmissionQueue {
    #[default]
    All,
    My,
    Unassigned,
    Archived,
}

impl SubmissionQueue {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(SubmissionQueue::All),
            "my" => Some(SubmissionQueue::My),
            "unassigned" => Some(SubmissionQueue::Unassigned),
            "archived" => Some(SubmissionQueue::Archived),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SubmissionFilter {
    pub journal_id: Option<i64>,
    pub queue: SubmissionQueue,
    pub editor_id: Option<i64>,
    pub author_id: Option<i64>,
    pub stage: Option<SubmissionStage>,
    pub search: Option<String>,
    pub offset: usize,
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleAssignment>,
}

impl UserInfo {
    pub fn has_role(&self, role: RolePath, context: Option<i64>) -> bool {
        self.roles.iter().any(|assignment| {
            assignment.role == role
                && (context.is_none()
                    || assignment.context_id.is_none()
                    || assignment.context_id == context)
        })
    }

    pub fn has_any_role(&self, roles: &[RolePath], context: Option<i64>) -> bool {
        roles.iter().any(|role| self.has_role(*role, context))
    }

    /// The journal this user acts in: the first role assignment carrying a
    /// context id.
    pub fn journal_context(&self) -> Option<i64> {
        self.roles
            .iter()
            .find_map(|assignment| assignment.context_id)
    }
}

/// Request-scoped state handed to every controller: the acting user with their
/// role assignments, the request vars, and the `context` bag the controller
/// fills with its view model. No ambient globals; every handler gets one.
#[derive(Clone, Debug, Default)]
pub struct JournalContext {
    pub journal_id: Option<i64>,
    pub user: UserInfo,
    pub request: RequestVars,
    pub post_vars: RequestVars,
    pub context: DataBag,
}

pub fn ensure(condition: bool, error: JournalError) -> ServiceResult<()> {
    if condition { Ok(()) } else { Err(error) }
}

pub trait JournalService {
    fn list_journals(&self) -> ServiceResult<Vec<Journal>>;
    fn get_journal(&self, journal_id: i64) -> ServiceResult<Option<Journal>>;
    fn save_journal(&self, journal: Journal) -> ServiceResult<i64>;
    fn delete_journal(&self, journal_id: i64) -> ServiceResult<()>;
    fn list_users(&self) -> ServiceResult<Vec<UserAccount>>;
    fn get_user(&self, user_id: i64) -> ServiceResult<Option<UserAccount>>;
    fn list_role_assignments(&self, context: Option<i64>) -> ServiceResult<Vec<RoleAssignment>>;
    fn user_roles(&self, user_id: i64) -> ServiceResult<Vec<RoleAssignment>>;
    fn assign_role(&self, assignment: RoleAssignment) -> ServiceResult<()>;
    fn revoke_role(&self, assignment: &RoleAssignment) -> ServiceResult<()>;
    fn list_submissions(&self, filter: &SubmissionFilter) -> ServiceResult<Vec<SubmissionRecord>>;
    fn count_submissions(&self, filter: &SubmissionFilter) -> ServiceResult<usize>;
    /// Every stored row, archived included; the statistics aggregation counts
    /// the whole table, not a queue.
    fn all_submissions(&self, journal_id: Option<i64>) -> ServiceResult<Vec<SubmissionRecord>>;
    fn get_submission(&self, submission_id: i64) -> ServiceResult<Option<SubmissionRecord>>;
    fn list_review_assignments(&self, reviewer_id: i64) -> ServiceResult<Vec<ReviewAssignment>>;
    fn list_review_forms(&self, journal_id: i64) -> ServiceResult<Vec<ReviewForm>>;
    fn get_review_form(&self, form_id: i64) -> ServiceResult<Option<ReviewForm>>;
    fn create_review_form(&self, form: NewReviewForm) -> ServiceResult<ReviewForm>;
    fn update_review_form(&self, form_id: i64, patch: ReviewFormPatch) -> ServiceResult<ReviewForm>;
    fn delete_review_form(&self, form_id: i64) -> ServiceResult<()>;
    fn list_editor_tasks(&self, editor_id: i64) -> ServiceResult<Vec<EditorTask>>;
    fn open_task_count(&self, editor_id: i64) -> ServiceResult<usize>;
    fn submit_support_ticket(&self, ticket: NewSupportTicket) -> ServiceResult<SupportTicket>;
    fn list_support_tickets(&self, user_id: i64) -> ServiceResult<Vec<SupportTicket>>;
    fn log_action(&self, action: &str, user_id: Option<i64>, details: &Value)
        -> ServiceResult<()>;
    fn list_action_logs(&self) -> ServiceResult<Vec<ActivityLogEntry>>;
}

#[derive(Default)]
struct InMemoryState {
    journals: HashMap<i64, Journal>,
    users: HashMap<i64, UserAccount>,
    user_roles: Vec<RoleAssignment>,
    submissions: HashMap<i64, SubmissionRecord>,
    editor_assignments: HashMap<i64, Vec<i64>>, // submission id -> editor ids
    review_assignments: HashMap<i64, ReviewAssignment>,
    review_forms: HashMap<i64, ReviewForm>,
    editor_tasks: HashMap<i64, EditorTask>,
    support_tickets: Vec<SupportTicket>,
    activity_logs: Vec<ActivityLogEntry>,
    next_journal_id: i64,
    next_submission_id: i64,
    next_form_id: i64,
    next_ticket_id: i64,
    next_log_id: i64,
}

#[derive(Clone)]
pub struct InMemoryService {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryService {
    pub fn new_with_sample() -> Self {
        let mut state = InMemoryState::default();
        let now = Utc::now();
        state.journals.insert(
            1,
            Journal {
                id: 1,
                title: "Journal of Educational Technology".into(),
                path: "jet".into(),
                description: "Peer-reviewed research on technology in education".into(),
            },
        );
        state.journals.insert(
            2,
            Journal {
                id: 2,
                title: "Journal of Computer Science".into(),
                path: "jcs".into(),
                description: "Systems, theory and applications".into(),
            },
        );
        state.next_journal_id = 3;

        let users = [
            (1, "Amelia Hart", "amelia@example.com"),
            (2, "Marcus Webb", "marcus@example.com"),
            (3, "Elena Duarte", "elena@example.com"),
            (4, "Priya Nair", "priya@example.com"),
            (5, "Tomas Keller", "tomas@example.com"),
            (6, "Grace Obi", "grace@example.com"),
        ];
        for (id, name, email) in users {
            state.users.insert(
                id,
                UserAccount {
                    id,
                    name: name.into(),
                    email: email.into(),
                },
            );
        }

        state.user_roles = vec![
            RoleAssignment {
                user_id: 1,
                role: RolePath::Admin,
                context_id: None,
            },
            RoleAssignment {
                user_id: 2,
                role: RolePath::Manager,
                context_id: Some(1),
            },
            RoleAssignment {
                user_id: 3,
                role: RolePath::Editor,
                context_id: Some(1),
            },
            RoleAssignment {
                user_id: 3,
                role: RolePath::Editor,
                context_id: Some(2),
            },
            RoleAssignment {
                user_id: 4,
                role: RolePath::Author,
                context_id: Some(1),
            },
            RoleAssignment {
                user_id: 5,
                role: RolePath::Reviewer,
                context_id: Some(1),
            },
            RoleAssignment {
                user_id: 6,
                role: RolePath::Author,
                context_id: Some(2),
            },
            RoleAssignment {
                user_id: 6,
                role: RolePath::Reviewer,
                context_id: Some(1),
            },
        ];

        let submissions = [
            (
                1,
                1,
                4,
                "The Impact of Social Media on Academic Performance",
                SubmissionStatus::Review,
                SubmissionStage::Review,
                21,
                12,
                false,
            ),
            (
                2,
                1,
                4,
                "Machine Learning Approaches in Educational Technology",
                SubmissionStatus::Accepted,
                SubmissionStage::Copyediting,
                40,
                5,
                false,
            ),
            (
                3,
                1,
                6,
                "Digital Literacy in Higher Education",
                SubmissionStatus::Accepted,
                SubmissionStage::Production,
                60,
                8,
                false,
            ),
            (
                4,
                1,
                4,
                "Online Learning Effectiveness During Pandemic",
                SubmissionStatus::Submission,
                SubmissionStage::Submission,
                2,
                2,
                false,
            ),
            (
                5,
                1,
                6,
                "Gamification and Student Motivation: A Field Study",
                SubmissionStatus::Published,
                SubmissionStage::Production,
                120,
                30,
                true,
            ),
            (
                6,
                2,
                6,
                "Adaptive Query Planning for Columnar Stores",
                SubmissionStatus::Declined,
                SubmissionStage::Review,
                90,
                45,
                true,
            ),
            (
                7,
                2,
                6,
                "A Survey of Consensus Protocols",
                SubmissionStatus::Review,
                SubmissionStage::Review,
                15,
                3,
                false,
            ),
        ];
        for (id, journal_id, author_id, title, status, stage, submitted, updated, archived) in
            submissions
        {
            state.submissions.insert(
                id,
                SubmissionRecord {
                    id,
                    journal_id,
                    author_id,
                    title: title.into(),
                    status,
                    current_stage: stage,
                    submitted_at: now - Duration::days(submitted),
                    updated_at: now - Duration::days(updated),
                    is_archived: archived,
                },
            );
        }
        state.next_submission_id = 8;

        state.editor_assignments.insert(1, vec![3]);
        state.editor_assignments.insert(2, vec![3]);
        state.editor_assignments.insert(7, vec![3]);

        state.review_assignments.insert(
            1,
            ReviewAssignment {
                id: 1,
                submission_id: 1,
                reviewer_id: 5,
                due_at: now + Duration::days(14),
                accepted: true,
                completed: false,
            },
        );
        state.review_assignments.insert(
            2,
            ReviewAssignment {
                id: 2,
                submission_id: 7,
                reviewer_id: 5,
                due_at: now + Duration::days(7),
                accepted: false,
                completed: false,
            },
        );
        state.review_assignments.insert(
            3,
            ReviewAssignment {
                id: 3,
                submission_id: 6,
                reviewer_id: 6,
                due_at: now - Duration::days(50),
                accepted: true,
                completed: true,
            },
        );

        state.review_forms.insert(
            1,
            ReviewForm {
                id: 1,
                journal_id: 1,
                title: "Standard Review".into(),
                description: "Default form for external review rounds".into(),
                is_active: true,
                questions: 6,
                updated_at: now - Duration::days(10),
            },
        );
        state.review_forms.insert(
            2,
            ReviewForm {
                id: 2,
                journal_id: 1,
                title: "Short Communication Review".into(),
                description: "Reduced form for short papers".into(),
                is_active: false,
                questions: 3,
                updated_at: now - Duration::days(90),
            },
        );
        state.review_forms.insert(
            3,
            ReviewForm {
                id: 3,
                journal_id: 2,
                title: "Systems Track Review".into(),
                description: String::new(),
                is_active: true,
                questions: 8,
                updated_at: now - Duration::days(4),
            },
        );
        state.next_form_id = 4;

        state.editor_tasks.insert(
            1,
            EditorTask {
                id: 1,
                editor_id: 3,
                title: "Assign reviewers to submission 1".into(),
                completed: false,
            },
        );
        state.editor_tasks.insert(
            2,
            EditorTask {
                id: 2,
                editor_id: 3,
                title: "Record decision for submission 2".into(),
                completed: false,
            },
        );
        state.editor_tasks.insert(
            3,
            EditorTask {
                id: 3,
                editor_id: 3,
                title: "Schedule issue 12(1)".into(),
                completed: true,
            },
        );

        state.next_ticket_id = 1;
        state.next_log_id = 1;

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Empty store, no seeded rows. Used by tests that build their own fixtures.
    pub fn new_empty() -> Self {
        let mut state = InMemoryState::default();
        state.next_journal_id = 1;
        state.next_submission_id = 1;
        state.next_form_id = 1;
        state.next_ticket_id = 1;
        state.next_log_id = 1;
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn insert_submission(&self, record: SubmissionRecord) {
        let mut state = self.state.lock().unwrap();
        state.next_submission_id = state.next_submission_id.max(record.id + 1);
        state.submissions.insert(record.id, record);
    }

    pub fn insert_role(&self, assignment: RoleAssignment) {
        let mut state = self.state.lock().unwrap();
        state.user_roles.push(assignment);
    }

    fn matches(
        state: &InMemoryState,
        filter: &SubmissionFilter,
        record: &SubmissionRecord,
    ) -> bool {
        if let Some(journal_id) = filter.journal_id {
            if record.journal_id != journal_id {
                return false;
            }
        }
        match filter.queue {
            SubmissionQueue::Archived => {
                if !record.is_archived {
                    return false;
                }
            }
            SubmissionQueue::My => {
                if record.is_archived {
                    return false;
                }
                let assigned = state
                    .editor_assignments
                    .get(&record.id)
                    .map(|editors| {
                        filter
                            .editor_id
                            .map(|editor| editors.contains(&editor))
                            .unwrap_or(false)
                    })
                    .unwrap_or(false);
                if !assigned {
                    return false;
                }
            }
            SubmissionQueue::Unassigned => {
                if record.is_archived {
                    return false;
                }
                let has_editor = state
                    .editor_assignments
                    .get(&record.id)
                    .map(|editors| !editors.is_empty())
                    .unwrap_or(false);
                if has_editor {
                    return false;
                }
            }
            SubmissionQueue::All => {
                if record.is_archived {
                    return false;
                }
            }
        }
        if let Some(author_id) = filter.author_id {
            if record.author_id != author_id {
                return false;
            }
        }
        if let Some(stage) = filter.stage {
            if record.current_stage != stage {
                return false;
            }
        }
        if let Some(search) = &filter.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() && !record.title.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }

    fn filtered(state: &InMemoryState, filter: &SubmissionFilter) -> Vec<SubmissionRecord> {
        let mut rows: Vec<SubmissionRecord> = state
            .submissions
            .values()
            .filter(|record| Self::matches(state, filter, record))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        rows
    }
}

impl Default for InMemoryService {
    fn default() -> Self {
        Self::new_with_sample()
    }
}

impl JournalService for InMemoryService {
    fn list_journals(&self) -> ServiceResult<Vec<Journal>> {
        let state = self.state.lock().unwrap();
        let mut journals: Vec<Journal> = state.journals.values().cloned().collect();
        journals.sort_by_key(|journal| journal.id);
        Ok(journals)
    }

    fn get_journal(&self, journal_id: i64) -> ServiceResult<Option<Journal>> {
        let state = self.state.lock().unwrap();
        Ok(state.journals.get(&journal_id).cloned())
    }

    fn save_journal(&self, mut journal: Journal) -> ServiceResult<i64> {
        let mut state = self.state.lock().unwrap();
        if journal.id == 0 {
            journal.id = state.next_journal_id;
            state.next_journal_id += 1;
        } else if !state.journals.contains_key(&journal.id) {
            return Err(JournalError::NotFound(format!("journal {}", journal.id)));
        }
        let id = journal.id;
        state.journals.insert(id, journal);
        Ok(id)
    }

    fn delete_journal(&self, journal_id: i64) -> ServiceResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.journals.remove(&journal_id).is_none() {
            return Err(JournalError::NotFound(format!("journal {journal_id}")));
        }
        state
            .user_roles
            .retain(|assignment| assignment.context_id != Some(journal_id));
        Ok(())
    }

    fn list_users(&self) -> ServiceResult<Vec<UserAccount>> {
        let state = self.state.lock().unwrap();
        let mut users: Vec<UserAccount> = state.users.values().cloned().collect();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    fn get_user(&self, user_id: i64) -> ServiceResult<Option<UserAccount>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.get(&user_id).cloned())
    }

    fn list_role_assignments(&self, context: Option<i64>) -> ServiceResult<Vec<RoleAssignment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .user_roles
            .iter()
            .filter(|assignment| context.is_none() || assignment.context_id == context)
            .cloned()
            .collect())
    }

    fn user_roles(&self, user_id: i64) -> ServiceResult<Vec<RoleAssignment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .user_roles
            .iter()
            .filter(|assignment| assignment.user_id == user_id)
            .cloned()
            .collect())
    }

    fn assign_role(&self, assignment: RoleAssignment) -> ServiceResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.users.contains_key(&assignment.user_id) {
            return Err(JournalError::NotFound(format!(
                "user {}",
                assignment.user_id
            )));
        }
        if !state.user_roles.contains(&assignment) {
            state.user_roles.push(assignment);
        }
        Ok(())
    }

    fn revoke_role(&self, assignment: &RoleAssignment) -> ServiceResult<()> {
        let mut state = self.state.lock().unwrap();
        state.user_roles.retain(|existing| existing != assignment);
        Ok(())
    }

    fn list_submissions(&self, filter: &SubmissionFilter) -> ServiceResult<Vec<SubmissionRecord>> {
        let state = self.state.lock().unwrap();
        let rows = Self::filtered(&state, filter);
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(filter.offset).take(limit).collect())
    }

    fn count_submissions(&self, filter: &SubmissionFilter) -> ServiceResult<usize> {
        let state = self.state.lock().unwrap();
        Ok(Self::filtered(&state, filter).len())
    }

    fn all_submissions(&self, journal_id: Option<i64>) -> ServiceResult<Vec<SubmissionRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .submissions
            .values()
            .filter(|record| journal_id.is_none() || journal_id == Some(record.journal_id))
            .cloned()
            .collect())
    }

    fn get_submission(&self, submission_id: i64) -> ServiceResult<Option<SubmissionRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.submissions.get(&submission_id).cloned())
    }

    fn list_review_assignments(&self, reviewer_id: i64) -> ServiceResult<Vec<ReviewAssignment>> {
        let state = self.state.lock().unwrap();
        let mut assignments: Vec<ReviewAssignment> = state
            .review_assignments
            .values()
            .filter(|assignment| assignment.reviewer_id == reviewer_id)
            .cloned()
            .collect();
        assignments.sort_by_key(|assignment| assignment.due_at);
        Ok(assignments)
    }

    fn list_review_forms(&self, journal_id: i64) -> ServiceResult<Vec<ReviewForm>> {
        let state = self.state.lock().unwrap();
        let mut forms: Vec<ReviewForm> = state
            .review_forms
            .values()
            .filter(|form| form.journal_id == journal_id)
            .cloned()
            .collect();
        forms.sort_by_key(|form| form.id);
        Ok(forms)
    }

    fn get_review_form(&self, form_id: i64) -> ServiceResult<Option<ReviewForm>> {
        let state = self.state.lock().unwrap();
        Ok(state.review_forms.get(&form_id).cloned())
    }

    fn create_review_form(&self, form: NewReviewForm) -> ServiceResult<ReviewForm> {
        let mut state = self.state.lock().unwrap();
        if !state.journals.contains_key(&form.journal_id) {
            return Err(JournalError::NotFound(format!(
                "journal {}",
                form.journal_id
            )));
        }
        let id = state.next_form_id;
        state.next_form_id += 1;
        let record = ReviewForm {
            id,
            journal_id: form.journal_id,
            title: form.title,
            description: form.description,
            is_active: form.is_active,
            questions: form.questions,
            updated_at: Utc::now(),
        };
        state.review_forms.insert(id, record.clone());
        Ok(record)
    }

    fn update_review_form(
        &self,
        form_id: i64,
        patch: ReviewFormPatch,
    ) -> ServiceResult<ReviewForm> {
        let mut state = self.state.lock().unwrap();
        let form = state
            .review_forms
            .get_mut(&form_id)
            .ok_or_else(|| JournalError::NotFound(format!("review form {form_id}")))?;
        if let Some(title) = patch.title {
            form.title = title;
        }
        if let Some(description) = patch.description {
            form.description = description;
        }
        if let Some(is_active) = patch.is_active {
            form.is_active = is_active;
        }
        if let Some(questions) = patch.questions {
            form.questions = questions;
        }
        form.updated_at = Utc::now();
        Ok(form.clone())
    }

    fn delete_review_form(&self, form_id: i64) -> ServiceResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.review_forms.remove(&form_id).is_none() {
            return Err(JournalError::NotFound(format!("review form {form_id}")));
        }
        Ok(())
    }

    fn list_editor_tasks(&self, editor_id: i64) -> ServiceResult<Vec<EditorTask>> {
        let state = self.state.lock().unwrap();
        let mut tasks: Vec<EditorTask> = state
            .editor_tasks
            .values()
            .filter(|task| task.editor_id == editor_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.id);
        Ok(tasks)
    }

    fn open_task_count(&self, editor_id: i64) -> ServiceResult<usize> {
        let state = self.state.lock().unwrap();
        Ok(state
            .editor_tasks
            .values()
            .filter(|task| task.editor_id == editor_id && !task.completed)
            .count())
    }

    fn submit_support_ticket(&self, ticket: NewSupportTicket) -> ServiceResult<SupportTicket> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_ticket_id;
        state.next_ticket_id += 1;
        let record = SupportTicket {
            id,
            user_id: ticket.user_id,
            subject: ticket.subject,
            category: ticket.category,
            message: ticket.message,
            priority: ticket.priority,
            created_at: Utc::now(),
        };
        state.support_tickets.push(record.clone());
        Ok(record)
    }

    fn list_support_tickets(&self, user_id: i64) -> ServiceResult<Vec<SupportTicket>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .support_tickets
            .iter()
            .filter(|ticket| ticket.user_id == user_id)
            .cloned()
            .collect())
    }

    fn log_action(
        &self,
        action: &str,
        user_id: Option<i64>,
        details: &Value,
    ) -> ServiceResult<()> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_log_id;
        state.next_log_id += 1;
        state.activity_logs.push(ActivityLogEntry {
            id,
            action: action.to_string(),
            user_id,
            details: details.clone(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn list_action_logs(&self) -> ServiceResult<Vec<ActivityLogEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state.activity_logs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_filters_partition_active_rows() {
        let service = InMemoryService::new_with_sample();
        let my = service
            .list_submissions(&SubmissionFilter {
                queue: SubmissionQueue::My,
                editor_id: Some(3),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(my.len(), 3);
        assert!(my.iter().all(|record| !record.is_archived));

        let unassigned = service
            .list_submissions(&SubmissionFilter {
                queue: SubmissionQueue::Unassigned,
                ..Default::default()
            })
            .unwrap();
        assert!(unassigned.iter().any(|record| record.id == 3));
        assert!(unassigned.iter().all(|record| !record.is_archived));

        let archived = service
            .list_submissions(&SubmissionFilter {
                queue: SubmissionQueue::Archived,
                ..Default::default()
            })
            .unwrap();
        assert!(archived.iter().all(|record| record.is_archived));
    }

    #[test]
    fn search_is_case_insensitive() {
        let service = InMemoryService::new_with_sample();
        let rows = service
            .list_submissions(&SubmissionFilter {
                search: Some("MACHINE learning".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 2);
    }

    #[test]
    fn review_form_patch_only_touches_given_fields() {
        let service = InMemoryService::new_with_sample();
        let before = service.get_review_form(1).unwrap().unwrap();
        let after = service
            .update_review_form(
                1,
                ReviewFormPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!after.is_active);
        assert_eq!(after.title, before.title);
        assert_eq!(after.description, before.description);
        assert_eq!(after.questions, before.questions);
        assert!(after.updated_at >= before.updated_at);
    }

    #[test]
    fn duplicate_role_assignment_is_a_no_op() {
        let service = InMemoryService::new_with_sample();
        let assignment = RoleAssignment {
            user_id: 4,
            role: RolePath::Author,
            context_id: Some(1),
        };
        service.assign_role(assignment.clone()).unwrap();
        let roles = service.user_roles(4).unwrap();
        assert_eq!(
            roles
                .iter()
                .filter(|existing| **existing == assignment)
                .count(),
            1
        );
    }

    #[test]
    fn journal_context_prefers_first_scoped_role() {
        let user = UserInfo {
            id: 3,
            roles: vec![
                RoleAssignment {
                    user_id: 3,
                    role: RolePath::Admin,
                    context_id: None,
                },
                RoleAssignment {
                    user_id: 3,
                    role: RolePath::Editor,
                    context_id: Some(2),
                },
            ],
            ..Default::default()
        };
        assert_eq!(user.journal_context(), Some(2));
    }
}
