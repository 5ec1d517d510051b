use chrono::Utc;
use journal_manager_rust::services::{
    InMemoryService, JournalService, RoleAssignment, RolePath, SubmissionRecord, SubmissionStage,
    SubmissionStatus,
};
use journal_manager_rust::statistics::{StatisticsController, StatisticsReport, build_report};

fn record(id: i64, status: SubmissionStatus, stage: SubmissionStage) -> SubmissionRecord {
    SubmissionRecord {
        id,
        journal_id: 1,
        author_id: 1,
        title: format!("Submission {id}"),
        status,
        current_stage: stage,
        submitted_at: Utc::now(),
        updated_at: Utc::now(),
        is_archived: false,
    }
}

#[test]
fn per_bucket_counts_match_direct_filters() {
    let rows: Vec<SubmissionRecord> = vec![
        record(1, SubmissionStatus::Published, SubmissionStage::Production),
        record(2, SubmissionStatus::Declined, SubmissionStage::Review),
        record(3, SubmissionStatus::Published, SubmissionStage::Production),
        record(4, SubmissionStatus::Accepted, SubmissionStage::Review),
        record(5, SubmissionStatus::Submission, SubmissionStage::Submission),
    ];
    let report = build_report(&rows, &[]);
    assert_eq!(report.total_submissions, rows.len());
    assert_eq!(
        report.by_status.published,
        rows.iter()
            .filter(|r| r.status == SubmissionStatus::Published)
            .count()
    );
    assert_eq!(
        report.by_status.declined,
        rows.iter()
            .filter(|r| r.status == SubmissionStatus::Declined)
            .count()
    );
    assert_eq!(
        report.by_stage.review,
        rows.iter()
            .filter(|r| r.current_stage == SubmissionStage::Review)
            .count()
    );
    // stage buckets partition the rows even though status buckets overlap them
    assert_eq!(
        report.by_stage.submission
            + report.by_stage.review
            + report.by_stage.copyediting
            + report.by_stage.production,
        report.total_submissions
    );
}

#[test]
fn empty_store_yields_the_default_report() {
    let service = InMemoryService::new_empty();
    let controller = StatisticsController::new(service);
    let report = controller.report_for(None);
    assert_eq!(report, StatisticsReport::default());
    assert_eq!(report.total_submissions, 0);
    assert!(report.role_distribution.is_empty());
}

#[test]
fn journal_filter_scopes_both_tables() {
    let service = InMemoryService::new_empty();
    service.insert_submission(record(1, SubmissionStatus::Review, SubmissionStage::Review));
    let mut other = record(2, SubmissionStatus::Published, SubmissionStage::Production);
    other.journal_id = 2;
    service.insert_submission(other);
    service.insert_role(RoleAssignment {
        user_id: 1,
        role: RolePath::Author,
        context_id: Some(1),
    });
    service.insert_role(RoleAssignment {
        user_id: 2,
        role: RolePath::Author,
        context_id: Some(2),
    });

    let controller = StatisticsController::new(service);
    let scoped = controller.report_for(Some(1));
    assert_eq!(scoped.total_submissions, 1);
    assert_eq!(scoped.by_status.published, 0);
    assert_eq!(scoped.total_users, 1);

    let site_wide = controller.report_for(None);
    assert_eq!(site_wide.total_submissions, 2);
    assert_eq!(site_wide.total_users, 2);
}

#[test]
fn averages_stay_at_zero_placeholders() {
    let service = InMemoryService::default();
    let controller = StatisticsController::new(service.clone());
    let report = controller.report_for(None);
    assert_eq!(report.average_review_time, 0);
    assert_eq!(report.average_publication_time, 0);
    assert_eq!(
        report.total_users,
        service.list_role_assignments(None).unwrap().len()
    );
}

#[test]
fn report_serializes_with_the_wire_field_names() {
    let report = build_report(
        &[record(1, SubmissionStatus::Accepted, SubmissionStage::Review)],
        &[RoleAssignment {
            user_id: 1,
            role: RolePath::Editor,
            context_id: Some(1),
        }],
    );
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["totalSubmissions"], 1);
    assert_eq!(value["byStatus"]["inReview"], 1);
    assert_eq!(value["byStatus"]["accepted"], 1);
    assert_eq!(value["byStage"]["review"], 1);
    assert_eq!(value["roleDistribution"]["editor"], 1);
}
