mod common;

use common::{setup_pool, ScriptedContent};
use furnish_content::api::ApiError;
use furnish_content::contact::{self, ContactForm, SubmitError, SubmitOutcome, ValidationError};
use furnish_content::db;
use furnish_content::fallback::Catalog;
use furnish_content::outbox::process_next_submission;
use reqwest::StatusCode;

fn form() -> ContactForm {
    ContactForm {
        name: "Jonas".into(),
        email: "jonas@example.com".into(),
        phone: "".into(),
        subject: "Showroom visit".into(),
        message: "Are you open on public holidays?".into(),
    }
}

#[tokio::test]
async fn delivered_submission_is_not_queued() {
    let pool = setup_pool().await;
    let svc = ScriptedContent::live();

    let outcome = contact::submit(&svc, &pool, &form()).await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Sent {
            message: "Message received".into()
        }
    );
    assert_eq!(svc.submitted().await.len(), 1);
    assert_eq!(db::count_queued_submissions(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn invalid_form_never_reaches_backend() {
    let pool = setup_pool().await;
    let svc = ScriptedContent::live();
    let mut bad = form();
    bad.email = "jonas-at-example".into();

    let err = contact::submit(&svc, &pool, &bad).await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::Invalid(ValidationError::InvalidEmail)
    ));
    assert!(svc.calls().await.is_empty());
    assert_eq!(db::count_queued_submissions(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn backend_outage_queues_with_success_message() {
    let pool = setup_pool().await;
    let svc = ScriptedContent::failing(&["submit"]);

    let outcome = contact::submit(&svc, &pool, &form()).await.unwrap();
    let SubmitOutcome::Queued { reference, message } = &outcome else {
        panic!("expected queued outcome, got {:?}", outcome);
    };
    assert_eq!(message, contact::CONFIRMATION_MESSAGE);
    assert_eq!(outcome.message(), contact::CONFIRMATION_MESSAGE);

    let queued = db::list_queued_submissions(&pool).await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(&queued[0].reference, reference);
    assert_eq!(queued[0].submission, form().validate().unwrap());
}

#[tokio::test]
async fn worker_delivers_queued_submission_once_backend_returns() {
    let pool = setup_pool().await;
    let svc = ScriptedContent::failing(&["submit"]);
    contact::submit(&svc, &pool, &form()).await.unwrap();

    // Still down: attempt is recorded and the row is pushed into the future.
    assert!(process_next_submission(&pool, &svc, 60).await.unwrap());
    let queued = db::list_queued_submissions(&pool).await.unwrap();
    assert_eq!(queued[0].attempt, 1);
    assert!(queued[0].last_error.as_deref().unwrap().contains("503"));
    assert!(!process_next_submission(&pool, &svc, 60).await.unwrap());

    // Make it due again and bring the backend back.
    sqlx::query("UPDATE contact_queue SET due_at = datetime('now', '-1 seconds')")
        .execute(&pool)
        .await
        .unwrap();
    svc.set_failing(&[]).await;

    assert!(process_next_submission(&pool, &svc, 60).await.unwrap());
    assert_eq!(db::count_queued_submissions(&pool).await.unwrap(), 0);
    assert_eq!(svc.submitted().await, vec![form().validate().unwrap()]);
    assert!(!process_next_submission(&pool, &svc, 60).await.unwrap());
}

fn rejected() -> ApiError {
    ApiError::Status {
        status: StatusCode::BAD_REQUEST,
        body: r#"{"error":"message too long"}"#.into(),
    }
}

#[tokio::test]
async fn backend_rejection_is_surfaced_not_queued() {
    let pool = setup_pool().await;
    let svc = ScriptedContent::live();
    svc.push_submit_response(Err(rejected())).await;

    let err = contact::submit(&svc, &pool, &form()).await.unwrap_err();
    let SubmitError::Rejected(ApiError::Status { status, .. }) = err else {
        panic!("expected rejection, got {:?}", err);
    };
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(db::count_queued_submissions(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn worker_keeps_row_while_backend_is_failing() {
    let pool = setup_pool().await;
    let svc = ScriptedContent::live();
    db::enqueue_submission(&pool, "ref-x", &form().validate().unwrap())
        .await
        .unwrap();
    svc.push_submit_response(Err(ApiError::Status {
        status: StatusCode::BAD_GATEWAY,
        body: "upstream".into(),
    }))
    .await;

    assert!(process_next_submission(&pool, &svc, 60).await.unwrap());
    assert_eq!(db::count_queued_submissions(&pool).await.unwrap(), 1);
    assert_eq!(db::count_due_submissions(&pool).await.unwrap(), 0);
    assert!(svc.submitted().await.is_empty());
}

#[tokio::test]
async fn worker_drops_row_the_backend_rejects() {
    let pool = setup_pool().await;
    let svc = ScriptedContent::live();
    db::enqueue_submission(&pool, "ref-y", &form().validate().unwrap())
        .await
        .unwrap();
    svc.push_submit_response(Err(rejected())).await;

    assert!(process_next_submission(&pool, &svc, 60).await.unwrap());
    assert_eq!(db::count_queued_submissions(&pool).await.unwrap(), 0);
    assert!(!process_next_submission(&pool, &svc, 60).await.unwrap());
}

#[tokio::test]
async fn contact_page_falls_back_as_a_unit() {
    let catalog = Catalog::builtin();

    let live = contact::contact_page(&ScriptedContent::live(), catalog).await;
    assert!(!live.is_fallback());
    assert_eq!(live.get().info, common::live_contact_info());

    let partial = contact::contact_page(&ScriptedContent::failing(&["social_media"]), catalog).await;
    assert!(partial.is_fallback());
    assert_eq!(&partial.get().info, catalog.contact_info());
    assert_eq!(&partial.get().social, catalog.social_media());
}
