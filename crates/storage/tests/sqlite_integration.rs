use chrono::Duration;
use interview_core::model::{
    AnswerScore, Candidate, CandidateDraft, CandidateId, Difficulty, FinalAssessment,
    ParsedResume, Phase, Question, QuestionId, QuestionSequence,
};
use interview_core::time::fixed_now;
use interview_core::{CommitOutcome, SessionMachine, TimeReconciler};
use storage::repository::{CandidateRepository, SessionRepository, StorageError};
use storage::sqlite::SqliteRepository;

async fn repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn candidate(name: &str) -> Candidate {
    CandidateDraft::from_resume(ParsedResume {
        name: Some(name.into()),
        email: Some("applicant@example.com".into()),
        phone: Some("+1 555 123 4567".into()),
        text: "Rust, SQL, distributed systems".into(),
    })
    .finalize(CandidateId::generate(), fixed_now())
    .unwrap()
}

fn questions() -> QuestionSequence {
    QuestionSequence::new(vec![
        Question::new(QuestionId::new("question-1"), "What is ownership?", Difficulty::Easy, 20)
            .unwrap(),
        Question::new(QuestionId::new("question-2"), "Explain Send.", Difficulty::Medium, 60)
            .unwrap(),
    ])
    .unwrap()
}

#[tokio::test]
async fn snapshot_round_trip_keeps_pending_claim_and_answers() {
    let repo = repo("memdb_snapshot_roundtrip").await;

    let mut machine = SessionMachine::new(candidate("Jane Doe"));
    machine.start(questions(), fixed_now()).unwrap();
    let CommitOutcome::Claimed(pending) = machine.submit(0, "Ownership moves values", 6).unwrap()
    else {
        panic!("first submit should claim");
    };
    machine
        .record_scored(pending.index, AnswerScore::new(8, "solid"))
        .unwrap();
    machine.submit(1, "Send marks thread-safe transfer", 10).unwrap();
    machine.pause().unwrap();

    let snapshot = machine.snapshot(fixed_now());
    repo.save_snapshot(&snapshot).await.unwrap();

    let loaded = repo
        .load_snapshot(snapshot.candidate_id())
        .await
        .unwrap()
        .expect("snapshot stored");
    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.answers.len(), 1);
    assert_eq!(loaded.pending.as_ref().map(|p| p.index), Some(1));

    let restored = SessionMachine::restore(loaded, TimeReconciler::default()).unwrap();
    assert_eq!(restored.phase(), Phase::Paused);
    assert!(restored.pending().is_some());
}

#[tokio::test]
async fn list_unfinished_skips_finished_and_orders_by_recency() {
    let repo = repo("memdb_list_unfinished").await;

    let mut paused = SessionMachine::new(candidate("Ada Lovelace"));
    paused.start(questions(), fixed_now()).unwrap();
    paused.pause().unwrap();
    repo.save_snapshot(&paused.snapshot(fixed_now())).await.unwrap();

    let mut active = SessionMachine::new(candidate("Alan Turing"));
    active.start(questions(), fixed_now()).unwrap();
    repo.save_snapshot(&active.snapshot(fixed_now() + Duration::seconds(10)))
        .await
        .unwrap();

    let not_started = SessionMachine::new(candidate("Grace Hopper"));
    repo.save_snapshot(&not_started.snapshot(fixed_now() + Duration::seconds(20)))
        .await
        .unwrap();

    let listed = repo.list_unfinished().await.unwrap();
    let names: Vec<_> = listed.iter().map(|s| s.candidate.name().to_owned()).collect();
    assert_eq!(names, vec!["Alan Turing", "Ada Lovelace"]);

    repo.delete_snapshot(active.session().candidate_id()).await.unwrap();
    assert_eq!(repo.list_unfinished().await.unwrap().len(), 1);
}

#[tokio::test]
async fn candidate_result_is_recorded_and_kept_on_upsert() {
    let repo = repo("memdb_candidate_result").await;
    let candidate = candidate("Jane Doe");
    repo.upsert_candidate(&candidate).await.unwrap();

    let fresh = repo.get_candidate(candidate.id()).await.unwrap();
    assert_eq!(fresh.candidate, candidate);
    assert!(fresh.result.is_none());

    let assessment = FinalAssessment::new(85, "Overall Performance: Excellent");
    repo.record_result(candidate.id(), &assessment, fixed_now())
        .await
        .unwrap();
    repo.upsert_candidate(&candidate).await.unwrap();

    let record = repo.get_candidate(candidate.id()).await.unwrap();
    let result = record.result.expect("result recorded");
    assert_eq!(result.final_score, 85);
    assert_eq!(result.summary, "Overall Performance: Excellent");
    assert_eq!(result.completed_at, fixed_now());
}

#[tokio::test]
async fn missing_candidate_is_not_found() {
    let repo = repo("memdb_missing_candidate").await;
    let err = repo.get_candidate(CandidateId::generate()).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let err = repo
        .record_result(CandidateId::generate(), &FinalAssessment::new(10, ""), fixed_now())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = repo("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}
