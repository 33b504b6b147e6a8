//! Router-level tests: auth, error mapping and the Paymee webhook over HTTP.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use common::{FakeGateway, World};
use learnhub::adapters::http::router;
use learnhub::adapters::payments::{PaymeeAdapter, PaymeeLinks};
use learnhub::domain::{
    AccountStatus, Gateway, ItemType, NewNotification, NotificationKind, Payment, PaymentStatus,
    PurchaseItem, Role,
};
use learnhub::ports::{EnrollmentRepo, PaymentGatewayPort, PaymentRepo};
use learnhub::usecases::course_service::{CoursePatch, NewCourse};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const PAYMEE_KEY: &str = "paymee-secret";

async fn send(world: &World, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(world.state.clone(), None)
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_json(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn paymee_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/webhook/paymee")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let world = World::new().await;
    let student = world.student().await;
    let token = world.token_for(&student).await;

    let (status, body) = send(&world, get("/api/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&world, get("/api/me", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&world, get("/api/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], student.email.as_str());
    assert_eq!(body["role"], "student");
}

#[tokio::test]
async fn test_banned_user_is_forbidden_everywhere() {
    let world = World::new().await;
    let banned = world.profile(Role::Student, AccountStatus::Banned).await;
    let token = world.token_for(&banned).await;

    for uri in ["/api/me", "/api/courses", "/api/notifications"] {
        let (status, _) = send(&world, get(uri, Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn test_student_cannot_post_global_announcement() {
    let world = World::new().await;
    let student = world.student().await;
    let token = world.token_for(&student).await;

    let (status, body) = send(
        &world,
        post_json(
            "/api/announcements",
            &token,
            json!({ "title": "Hello", "body": "everyone" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("Forbidden"));
}

#[tokio::test]
async fn test_admin_creates_user_and_cannot_ban_self() {
    let world = World::new().await;
    let admin = world.admin().await;
    let token = world.token_for(&admin).await;

    let (status, body) = send(
        &world,
        post_json(
            "/api/admin/users",
            &token,
            json!({ "email": "new.instructor@learnhub.test", "full_name": "New Instructor", "role": "instructor" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let new_token = body["token"].as_str().unwrap().to_string();
    let (status, me) = send(&world, get("/api/me", Some(&new_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "instructor");

    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/api/admin/users/{}/status", admin.id))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "status": "banned" }).to_string()))
        .unwrap();
    let (status, _) = send(&world, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, summary) = send(&world, get("/api/admin/reports/summary", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(summary["users_by_role"].is_array());
}

#[tokio::test]
async fn test_paid_course_enroll_returns_402() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let course = world
        .state
        .courses
        .create_course(
            &instructor,
            NewCourse {
                title: "Premium".to_string(),
                description: String::new(),
                price: 10_000,
                instructor_id: None,
            },
        )
        .await
        .unwrap();
    world
        .state
        .courses
        .update_course(
            &instructor,
            course.id,
            CoursePatch {
                published: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let token = world.token_for(&student).await;

    let (status, _) = send(
        &world,
        post_json(&format!("/api/courses/{}/enroll", course.id), &token, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_paymee_webhook_verifies_checksum_and_is_idempotent() {
    let paymee: Arc<dyn PaymentGatewayPort> = Arc::new(PaymeeAdapter::new(
        PAYMEE_KEY.to_string(),
        true,
        PaymeeLinks {
            return_url: "http://localhost:3000/payment/success".to_string(),
            cancel_url: "http://localhost:3000/payment/cancel".to_string(),
            webhook_url: "http://localhost:8080/api/webhook/paymee".to_string(),
        },
    ));
    let world = World::with_gateways(
        vec![paymee],
        Arc::new(FakeGateway::new(Gateway::Paymee)),
    )
    .await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let course = world
        .state
        .courses
        .create_course(
            &instructor,
            NewCourse {
                title: "Webhooks".to_string(),
                description: String::new(),
                price: 20_000,
                instructor_id: None,
            },
        )
        .await
        .unwrap();

    // Payment as it stands after checkout: pending with the gateway token stored.
    let now = Utc::now();
    let payment = Payment {
        id: Uuid::new_v4(),
        user_id: student.id,
        item: PurchaseItem {
            item_type: ItemType::Course,
            item_id: course.id,
        },
        amount: 20_000,
        gateway: Gateway::Paymee,
        gateway_ref: None,
        status: PaymentStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    world.repo.insert_payment(&payment).await.unwrap();
    world.repo.set_gateway_ref(payment.id, "tok-123").await.unwrap();

    let webhook = |check_sum: String| {
        Request::builder()
            .method("POST")
            .uri("/api/webhook/paymee")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "token=tok-123&check_sum={check_sum}&payment_status=1&order_id={}&transaction_id=987",
                payment.id
            )))
            .unwrap()
    };

    let (status, _) = send(&world, webhook("deadbeef".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let valid = PaymeeAdapter::checksum("tok-123", true, PAYMEE_KEY);
    let (status, body) = send(&world, webhook(valid.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["fulfilled"], true);

    let (status, body) = send(&world, webhook(valid)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fulfilled"], false);

    assert_eq!(world.repo.list_student_enrollments(student.id).await.unwrap().len(), 1);
    assert_eq!(world.repo.earnings_for(instructor.id).await.unwrap()[0].sales, 1);
}

#[tokio::test]
async fn test_unconfigured_gateway_returns_503() {
    let world = World::new().await;
    let student = world.student().await;
    let token = world.token_for(&student).await;
    let (status, _) = send(
        &world,
        post_json(
            "/api/checkout/flouci",
            &token,
            json!({ "item_type": "course", "item_id": Uuid::new_v4() }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_public_help_articles() {
    let world = World::new().await;
    let admin = world.admin().await;
    let token = world.token_for(&admin).await;

    let (status, _) = send(
        &world,
        post_json(
            "/api/help-articles",
            &token,
            json!({ "slug": "getting-started", "title": "Getting started", "body": "Welcome", "published": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&world, get("/api/help-articles/getting-started", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Getting started");

    let (status, list) = send(&world, get("/api/help-articles", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_incomplete_paymee_callback_is_a_json_400() {
    let world = World::new().await;

    let (status, body) = send(&world, paymee_form("token=tok-1&payment_status=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("signature"));

    let (status, body) = send(&world, paymee_form("check_sum=abc&payment_status=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("token"));

    let (status, body) = send(&world, paymee_form("")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_settings_are_admin_writable_and_public() {
    let world = World::new().await;
    let admin = world.admin().await;
    let student = world.student().await;
    let admin_token = world.token_for(&admin).await;
    let student_token = world.token_for(&student).await;

    let (status, _) = send(
        &world,
        with_json("PUT", "/api/settings/site_name", &admin_token, json!("LearnHub Tunis")),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(
        &world,
        with_json(
            "PUT",
            "/api/settings/contact",
            &admin_token,
            json!({ "email": "hello@learnhub.test", "phone": null }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    // Overwrites in place.
    let (status, _) = send(
        &world,
        with_json("PUT", "/api/settings/site_name", &admin_token, json!("LearnHub")),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &world,
        with_json("PUT", "/api/settings/site_name", &student_token, json!("hijacked")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, settings) = send(&world, get("/api/settings", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["site_name"], "LearnHub");
    assert_eq!(settings["contact"]["email"], "hello@learnhub.test");
}

#[tokio::test]
async fn test_help_article_upsert_by_slug() {
    let world = World::new().await;
    let admin = world.admin().await;
    let token = world.token_for(&admin).await;

    let (status, _) = send(
        &world,
        post_json(
            "/api/help-articles",
            &token,
            json!({ "slug": "refunds", "title": "Refunds", "body": "Draft", "published": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&world, get("/api/help-articles/refunds", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, draft) = send(&world, get("/api/help-articles/refunds", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["body"], "Draft");

    let (status, updated) = send(
        &world,
        post_json(
            "/api/help-articles",
            &token,
            json!({ "slug": "Refunds", "title": "Refund policy", "body": "Within 14 days", "published": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["slug"], "refunds");

    let (status, article) = send(&world, get("/api/help-articles/refunds", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(article["title"], "Refund policy");
    assert_eq!(article["body"], "Within 14 days");

    let (_, list) = send(&world, get("/api/help-articles", Some(&token))).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, _) = send(
        &world,
        post_json(
            "/api/help-articles",
            &token,
            json!({ "slug": "bad slug!", "title": "Nope" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_changes_roles_but_not_own() {
    let world = World::new().await;
    let admin = world.admin().await;
    let student = world.student().await;
    let admin_token = world.token_for(&admin).await;
    let student_token = world.token_for(&student).await;

    let (status, body) = send(
        &world,
        with_json(
            "PATCH",
            &format!("/api/admin/users/{}/role", student.id),
            &admin_token,
            json!({ "role": "instructor" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "instructor");
    let (_, me) = send(&world, get("/api/me", Some(&student_token))).await;
    assert_eq!(me["role"], "instructor");

    let (status, body) = send(
        &world,
        with_json(
            "PATCH",
            &format!("/api/admin/users/{}/role", admin.id),
            &admin_token,
            json!({ "role": "student" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    let (_, me) = send(&world, get("/api/me", Some(&admin_token))).await;
    assert_eq!(me["role"], "admin");

    let (status, _) = send(
        &world,
        with_json(
            "PATCH",
            &format!("/api/admin/users/{}/role", admin.id),
            &student_token,
            json!({ "role": "student" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &world,
        with_json(
            "PATCH",
            &format!("/api/admin/users/{}/role", Uuid::new_v4()),
            &admin_token,
            json!({ "role": "student" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_notification_read_is_scoped_to_owner() {
    let world = World::new().await;
    let alice = world.student().await;
    let bob = world.student().await;
    let alice_token = world.token_for(&alice).await;
    let bob_token = world.token_for(&bob).await;
    let written = world
        .state
        .notifications
        .notify(
            &[alice.id],
            NewNotification {
                kind: NotificationKind::Announcement,
                title: "Welcome".to_string(),
                body: "Glad to have you".to_string(),
                link: None,
            },
        )
        .await;
    assert_eq!(written, 1);

    let (status, list) = send(&world, get("/api/notifications?unread_only=true", Some(&alice_token))).await;
    assert_eq!(status, StatusCode::OK);
    let id = list[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &world,
        post_json(&format!("/api/notifications/{id}/read"), &bob_token, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &world,
        post_json(&format!("/api/notifications/{id}/read"), &alice_token, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, unread) = send(&world, get("/api/notifications?unread_only=true", Some(&alice_token))).await;
    assert_eq!(unread.as_array().map(Vec::len), Some(0));
    let (_, all) = send(&world, get("/api/notifications", Some(&alice_token))).await;
    assert_eq!(all[0]["read"], true);
}
