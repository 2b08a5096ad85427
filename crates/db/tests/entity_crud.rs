//! Repository integration tests against a real database.
//!
//! Covers video versioning and approval, cascade deletes, share sessions,
//! one-time codes, and the sales ledger.

use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use cutroom_core::sales::{compute_totals, LineItem};
use cutroom_core::share::MAX_OTP_ATTEMPTS;
use cutroom_db::models::project::{CreateProject, Project};
use cutroom_db::models::recipient::CreateRecipient;
use cutroom_db::models::sales::{CreatePayment, CreateSalesClient, InvoiceFields, QuoteFields};
use cutroom_db::models::share_otp::CreateShareOtp;
use cutroom_db::models::share_session::CreateShareSession;
use cutroom_db::models::staff_session::NewStaffSession;
use cutroom_db::models::user::{CreateUser, User};
use cutroom_db::models::video::{group_videos, CreateVideo, Video};
use cutroom_db::models::video_asset::CreateVideoAsset;
use cutroom_db::repositories::{
    InvoiceRepo, PaymentRepo, ProjectRepo, QuoteRepo, RecipientRepo, SalesClientRepo,
    ShareOtpRepo, ShareSessionRepo, StaffSessionRepo, UserRepo, VideoAssetRepo, VideoRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_project(pool: &PgPool, slug: &str) -> Project {
    ProjectRepo::create(
        pool,
        &CreateProject {
            title: format!("Project {slug}"),
            description: None,
            client_name: Some("Acme".into()),
            client_company: None,
            share_slug: slug.to_string(),
            created_by: None,
        },
    )
    .await
    .unwrap()
}

async fn upload(pool: &PgPool, project_id: i64, name: &str) -> Video {
    VideoRepo::create(
        pool,
        &CreateVideo {
            project_id,
            name: name.to_string(),
            version_label: None,
            original_file_name: format!("{name}.mp4"),
            storage_path: format!("projects/{project_id}/{name}.mp4"),
            file_size_bytes: 1024,
            mime_type: "video/mp4".into(),
            uploaded_by: None,
        },
    )
    .await
    .unwrap()
}

async fn new_user(pool: &PgPool, username: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@studio.test"),
            display_name: None,
            password_hash: "not-a-real-hash".into(),
            role_id: 2,
        },
    )
    .await
    .unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn invoice_fields(client_id: i64, total: i64) -> InvoiceFields {
    let items = vec![LineItem {
        description: "Edit".into(),
        quantity: 1.0,
        unit_price_cents: total,
    }];
    let totals = compute_totals(&items, 0).unwrap();
    InvoiceFields {
        client_id,
        project_id: None,
        quote_id: None,
        status: "sent".into(),
        issue_date: date(2026, 2, 1),
        due_date: Some(date(2026, 3, 1)),
        currency: "USD".into(),
        line_items: items,
        tax_rate_bps: 0,
        subtotal_cents: totals.subtotal_cents,
        tax_cents: totals.tax_cents,
        total_cents: totals.total_cents,
        notes: None,
    }
}

// ---------------------------------------------------------------------------
// Projects and videos
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_slug_rejected(pool: PgPool) {
    new_project(&pool, "spring-launch").await;
    let err = ProjectRepo::create(
        &pool,
        &CreateProject {
            title: "Other".into(),
            description: None,
            client_name: None,
            client_company: None,
            share_slug: "spring-launch".into(),
            created_by: None,
        },
    )
    .await
    .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("uq_projects_share_slug"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_versions_number_per_group(pool: PgPool) {
    let project = new_project(&pool, "versions").await;
    let v1 = upload(&pool, project.id, "Hero").await;
    let v2 = upload(&pool, project.id, "Hero").await;
    let t1 = upload(&pool, project.id, "Teaser").await;
    assert_eq!((v1.version, v2.version, t1.version), (1, 2, 1));

    let groups = group_videos(VideoRepo::list_by_project(&pool, project.id).await.unwrap());
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "Hero");
    assert_eq!(groups[0].versions[0].version, 2);

    let latest = VideoRepo::list_latest_by_project(&pool, project.id).await.unwrap();
    assert_eq!(latest.len(), 2);
    assert!(latest.iter().any(|v| v.id == v2.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_uploads_get_distinct_versions(pool: PgPool) {
    let project = new_project(&pool, "rush").await;
    let project_id = project.id;

    let mut uploads = tokio::task::JoinSet::new();
    for _ in 0..6 {
        let pool = pool.clone();
        uploads.spawn(async move { upload(&pool, project_id, "Hero cut").await.version });
    }
    let mut versions = Vec::new();
    while let Some(version) = uploads.join_next().await {
        versions.push(version.unwrap());
    }
    versions.sort_unstable();
    assert_eq!(versions, vec![1, 2, 3, 4, 5, 6]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_clears_sibling_versions(pool: PgPool) {
    let project = new_project(&pool, "approvals").await;
    let v1 = upload(&pool, project.id, "Hero").await;
    let v2 = upload(&pool, project.id, "Hero").await;
    let other = upload(&pool, project.id, "Teaser").await;

    VideoRepo::approve(&pool, v1.id, "Dana").await.unwrap();
    VideoRepo::approve(&pool, other.id, "Dana").await.unwrap();
    let approved = VideoRepo::approve(&pool, v2.id, "Dana").await.unwrap().unwrap();
    assert!(approved.approved);
    assert_eq!(approved.approved_by_name.as_deref(), Some("Dana"));

    let v1 = VideoRepo::find_by_id(&pool, v1.id).await.unwrap().unwrap();
    assert!(!v1.approved);
    let other = VideoRepo::find_by_id(&pool, other.id).await.unwrap().unwrap();
    assert!(other.approved, "other groups keep their approval");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_video_removes_assets(pool: PgPool) {
    let project = new_project(&pool, "cascade").await;
    let video = upload(&pool, project.id, "Hero").await;
    let asset = VideoAssetRepo::create(
        &pool,
        &CreateVideoAsset {
            video_id: video.id,
            file_name: "poster.png".into(),
            storage_path: "assets/poster.png".into(),
            file_size_bytes: 10,
            mime_type: "image/png".into(),
            category: "image".into(),
        },
    )
    .await
    .unwrap();

    assert!(VideoRepo::delete(&pool, video.id).await.unwrap());
    assert!(VideoAssetRepo::find_by_id(&pool, asset.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_recipient_email_unique_case_insensitive(pool: PgPool) {
    let project = new_project(&pool, "recipients").await;
    let input = CreateRecipient {
        email: "Client@Example.com".into(),
        name: None,
        is_primary: None,
        receive_notifications: None,
    };
    let created = RecipientRepo::create(&pool, project.id, &input).await.unwrap();
    assert_eq!(created.email, "client@example.com");
    assert!(RecipientRepo::create(&pool, project.id, &input).await.is_err());
}

// ---------------------------------------------------------------------------
// Share access
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_share_session_lifecycle(pool: PgPool) {
    let project = new_project(&pool, "sessions").await;
    let other = new_project(&pool, "elsewhere").await;
    ShareSessionRepo::create(
        &pool,
        &CreateShareSession {
            project_id: project.id,
            session_hash: "hash-a".into(),
            access_method: "password".into(),
            recipient_id: None,
            display_name: None,
            expires_at: Utc::now() + Duration::hours(1),
            ip_address: None,
            user_agent: None,
        },
    )
    .await
    .unwrap();

    assert!(ShareSessionRepo::find_active_and_touch(&pool, project.id, "hash-a")
        .await
        .unwrap()
        .is_some());
    assert!(ShareSessionRepo::find_active_and_touch(&pool, other.id, "hash-a")
        .await
        .unwrap()
        .is_none());

    let revoked = ShareSessionRepo::revoke_all_for_project(&pool, project.id).await.unwrap();
    assert_eq!(revoked, vec!["hash-a".to_string()]);
    assert!(ShareSessionRepo::find_active_and_touch(&pool, project.id, "hash-a")
        .await
        .unwrap()
        .is_none());
    assert_eq!(ShareSessionRepo::cleanup_expired(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_code_invalidates_previous(pool: PgPool) {
    let project = new_project(&pool, "codes").await;
    let first = ShareOtpRepo::issue(
        &pool,
        &CreateShareOtp {
            project_id: project.id,
            email: "c@example.com".into(),
            code_hash: "first".into(),
            expires_at: Utc::now() + Duration::minutes(10),
        },
    )
    .await
    .unwrap();
    let second = ShareOtpRepo::issue(
        &pool,
        &CreateShareOtp {
            project_id: project.id,
            email: "c@example.com".into(),
            code_hash: "second".into(),
            expires_at: Utc::now() + Duration::minutes(10),
        },
    )
    .await
    .unwrap();

    let latest = ShareOtpRepo::find_latest_unconsumed(&pool, project.id, "c@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, second.id);
    assert_ne!(latest.id, first.id);

    assert_eq!(ShareOtpRepo::claim_attempt(&pool, second.id).await.unwrap(), Some(1));
    assert!(ShareOtpRepo::consume(&pool, second.id).await.unwrap());
    assert_eq!(ShareOtpRepo::claim_attempt(&pool, second.id).await.unwrap(), None);
    assert!(!ShareOtpRepo::consume(&pool, second.id).await.unwrap());
    assert_eq!(ShareOtpRepo::cleanup_dead(&pool).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_code_attempts_are_capped(pool: PgPool) {
    let project = new_project(&pool, "capped").await;
    let otp = ShareOtpRepo::issue(
        &pool,
        &CreateShareOtp {
            project_id: project.id,
            email: "c@example.com".into(),
            code_hash: "digest".into(),
            expires_at: Utc::now() + Duration::minutes(10),
        },
    )
    .await
    .unwrap();

    let otp_id = otp.id;
    let mut guesses = tokio::task::JoinSet::new();
    for _ in 0..12 {
        let pool = pool.clone();
        guesses.spawn(async move { ShareOtpRepo::claim_attempt(&pool, otp_id).await.unwrap() });
    }
    let mut granted = 0;
    while let Some(claim) = guesses.join_next().await {
        if claim.unwrap().is_some() {
            granted += 1;
        }
    }
    assert_eq!(granted, MAX_OTP_ATTEMPTS);

    let stored = ShareOtpRepo::find_latest_unconsumed(&pool, project.id, "c@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.attempts, MAX_OTP_ATTEMPTS);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_code_cannot_be_claimed_or_consumed(pool: PgPool) {
    let project = new_project(&pool, "stale-code").await;
    let otp = ShareOtpRepo::issue(
        &pool,
        &CreateShareOtp {
            project_id: project.id,
            email: "c@example.com".into(),
            code_hash: "digest".into(),
            expires_at: Utc::now() - Duration::minutes(1),
        },
    )
    .await
    .unwrap();

    assert_eq!(ShareOtpRepo::claim_attempt(&pool, otp.id).await.unwrap(), None);
    assert!(!ShareOtpRepo::consume(&pool, otp.id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invoice_numbers_and_payments(pool: PgPool) {
    let client = SalesClientRepo::create(
        &pool,
        &CreateSalesClient {
            name: "Acme".into(),
            email: None,
            phone: None,
            address: None,
            notes: None,
        },
    )
    .await
    .unwrap();

    let first = InvoiceRepo::create(&pool, &invoice_fields(client.id, 10_000)).await.unwrap();
    let second = InvoiceRepo::create(&pool, &invoice_fields(client.id, 5_000)).await.unwrap();
    assert_eq!(first.invoice_number, "INV-0001");
    assert_eq!(second.invoice_number, "INV-0002");
    assert_eq!(first.paid_cents, 0);

    for amount in [2_500, 1_000] {
        PaymentRepo::create(
            &pool,
            first.id,
            &CreatePayment {
                amount_cents: amount,
                paid_on: date(2026, 2, 10),
                method: Some("bank".into()),
                reference: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    }
    let reloaded = InvoiceRepo::find_by_id(&pool, first.id).await.unwrap().unwrap();
    assert_eq!(reloaded.paid_cents, 3_500);
    assert_eq!(reloaded.line_items.0.len(), 1);

    // Clients with invoices cannot be deleted.
    assert!(SalesClientRepo::delete(&pool, client.id).await.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_quote_converts_once(pool: PgPool) {
    let client = SalesClientRepo::create(
        &pool,
        &CreateSalesClient {
            name: "Acme".into(),
            email: None,
            phone: None,
            address: None,
            notes: None,
        },
    )
    .await
    .unwrap();
    let fields = invoice_fields(client.id, 20_000);
    let quote = QuoteRepo::create(
        &pool,
        &QuoteFields {
            client_id: client.id,
            project_id: None,
            status: "sent".into(),
            issue_date: date(2026, 1, 15),
            valid_until: Some(date(2026, 2, 15)),
            currency: "USD".into(),
            line_items: fields.line_items.clone(),
            tax_rate_bps: 0,
            subtotal_cents: fields.subtotal_cents,
            tax_cents: 0,
            total_cents: fields.total_cents,
            notes: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(quote.quote_number, "Q-0001");

    let input = InvoiceFields {
        quote_id: Some(quote.id),
        ..fields
    };
    let invoice = InvoiceRepo::create_from_quote(&pool, quote.id, &input)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.quote_id, Some(quote.id));
    assert_eq!(
        QuoteRepo::find_by_id(&pool, quote.id).await.unwrap().unwrap().status,
        "accepted"
    );

    let err = InvoiceRepo::create_from_quote(&pool, quote.id, &input)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.constraint()),
        Some("uq_sales_invoices_quote")
    );
}

// ---------------------------------------------------------------------------
// Staff accounts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_token_claimed_once(pool: PgPool) {
    let user = new_user(&pool, "sam").await;
    let session = NewStaffSession {
        user_id: user.id,
        refresh_token_hash: "refresh-hash",
        expires_at: Utc::now() + Duration::days(7),
        user_agent: None,
        ip_address: "127.0.0.1",
    };
    StaffSessionRepo::create(&pool, &session).await.unwrap();

    let claimed = StaffSessionRepo::claim_refresh_token(&pool, "refresh-hash")
        .await
        .unwrap()
        .expect("first claim succeeds");
    assert_eq!(claimed.user_id, user.id);
    assert!(StaffSessionRepo::claim_refresh_token(&pool, "refresh-hash")
        .await
        .unwrap()
        .is_none());

    assert_eq!(StaffSessionRepo::purge_dead(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lockout_counter_resets_on_lock(pool: PgPool) {
    let user = new_user(&pool, "sam").await;
    let until = Utc::now() + Duration::minutes(15);

    for _ in 0..2 {
        assert!(!UserRepo::record_failed_login(&pool, user.id, 3, until).await.unwrap());
    }
    assert!(UserRepo::record_failed_login(&pool, user.id, 3, until).await.unwrap());

    let user = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(user.failed_login_count, 0);
    assert!(user.locked_until.is_some());

    let by_email = UserRepo::find_for_login(&pool, "SAM@studio.test").await.unwrap();
    assert_eq!(by_email.map(|u| u.id), Some(user.id));
}
