//! Checkout, webhook settlement, fulfilment and revenue split.

mod common;

use common::{FakeGateway, SHARE, World};
use chrono::Utc;
use learnhub::domain::{
    DomainError, Enrollment, Gateway, Grant, ItemType, PaymentStatus, Profile, PurchaseItem,
    RevenueSplit,
};
use learnhub::ports::{EnrollmentRepo, GatewayNotification, PaymentRepo};
use std::sync::atomic::Ordering;
use learnhub::usecases::book_service::NewBook;
use learnhub::usecases::course_service::{CoursePatch, NewCourse};
use uuid::Uuid;

const PRICE: i64 = 45_500;

async fn paid_course(world: &World, owner: &Profile, price: i64) -> Uuid {
    let course = world
        .state
        .courses
        .create_course(
            owner,
            NewCourse {
                title: "Payments in Rust".to_string(),
                description: String::new(),
                price,
                instructor_id: None,
            },
        )
        .await
        .unwrap();
    world
        .state
        .courses
        .update_course(
            owner,
            course.id,
            CoursePatch {
                published: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    course.id
}

fn course_item(id: Uuid) -> PurchaseItem {
    PurchaseItem {
        item_type: ItemType::Course,
        item_id: id,
    }
}

fn paid(payment_id: Uuid) -> GatewayNotification {
    GatewayNotification {
        gateway_ref: FakeGateway::reference_for(payment_id),
        reported_success: Some(true),
        checksum: Some("ok".to_string()),
        transaction_id: Some("tx-1".to_string()),
    }
}

#[tokio::test]
async fn test_webhook_fulfils_once_and_splits_revenue() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let course_id = paid_course(&world, &instructor, PRICE).await;

    let started = world
        .state
        .payments
        .checkout(&student, Gateway::Paymee, course_item(course_id))
        .await
        .unwrap();
    assert_eq!(started.amount, PRICE);
    assert_eq!(world.paymee.checkouts.lock().unwrap().len(), 1);

    let first = world
        .state
        .payments
        .handle_webhook(Gateway::Paymee, paid(started.payment_id))
        .await
        .unwrap();
    assert!(first.fulfilled);
    assert_eq!(first.status, PaymentStatus::Completed);

    let replay = world
        .state
        .payments
        .handle_webhook(Gateway::Paymee, paid(started.payment_id))
        .await
        .unwrap();
    assert!(!replay.fulfilled);
    assert_eq!(replay.status, PaymentStatus::Completed);

    assert!(world
        .repo
        .get_enrollment(student.id, course_id)
        .await
        .unwrap()
        .is_some());
    assert_eq!(world.repo.list_student_enrollments(student.id).await.unwrap().len(), 1);

    let earnings = world.state.payments.earnings(&instructor).await.unwrap();
    assert_eq!(earnings.total_sales, 1);
    assert_eq!(earnings.total_gross, PRICE);
    assert_eq!(earnings.total_instructor_amount, PRICE * SHARE / 100);

    let payment = world.repo.get_payment(started.payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(
        payment.gateway_ref.as_deref(),
        Some(FakeGateway::reference_for(started.payment_id).as_str())
    );

    let again = world
        .state
        .payments
        .checkout(&student, Gateway::Paymee, course_item(course_id))
        .await
        .unwrap_err();
    assert!(matches!(again, DomainError::Conflict(_)));
}

#[tokio::test]
async fn test_failed_payment_grants_nothing() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let course_id = paid_course(&world, &instructor, PRICE).await;
    let started = world
        .state
        .payments
        .checkout(&student, Gateway::Paymee, course_item(course_id))
        .await
        .unwrap();

    let settlement = world
        .state
        .payments
        .handle_webhook(
            Gateway::Paymee,
            GatewayNotification {
                reported_success: Some(false),
                ..paid(started.payment_id)
            },
        )
        .await
        .unwrap();
    assert_eq!(settlement.status, PaymentStatus::Failed);
    assert!(!settlement.fulfilled);
    assert!(world
        .repo
        .get_enrollment(student.id, course_id)
        .await
        .unwrap()
        .is_none());

    // A late success callback cannot revive a failed payment.
    let late = world
        .state
        .payments
        .handle_webhook(Gateway::Paymee, paid(started.payment_id))
        .await
        .unwrap();
    assert_eq!(late.status, PaymentStatus::Failed);
    assert!(!late.fulfilled);
}

#[tokio::test]
async fn test_tampered_and_unknown_webhooks_are_rejected() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let course_id = paid_course(&world, &instructor, PRICE).await;
    let started = world
        .state
        .payments
        .checkout(&student, Gateway::Paymee, course_item(course_id))
        .await
        .unwrap();

    let tampered = world
        .state
        .payments
        .handle_webhook(
            Gateway::Paymee,
            GatewayNotification {
                checksum: Some("bad".to_string()),
                ..paid(started.payment_id)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(tampered, DomainError::InvalidSignature));

    let unknown = world
        .state
        .payments
        .handle_webhook(Gateway::Paymee, paid(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(unknown, DomainError::NotFound(_)));

    let payment = world.repo.get_payment(started.payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_checkout_preconditions() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let free = paid_course(&world, &instructor, 0).await;
    let priced = paid_course(&world, &instructor, PRICE).await;

    let err = world
        .state
        .payments
        .checkout(&student, Gateway::Paymee, course_item(free))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let err = world
        .state
        .payments
        .checkout(&student, Gateway::Flouci, course_item(priced))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::GatewayUnavailable(_)));

    let err = world
        .state
        .payments
        .checkout(&student, Gateway::Paymee, course_item(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn test_book_purchase_unlocks_file() {
    let world = World::new().await;
    let author = world.instructor().await;
    let buyer = world.student().await;
    let book = world
        .state
        .books
        .create(
            &author,
            NewBook {
                title: "Async Rust".to_string(),
                description: String::new(),
                price: 30_000,
                file_url: "https://files.test/async-rust.pdf".to_string(),
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        world.state.books.access(&buyer, book.id).await.unwrap_err(),
        DomainError::Forbidden(_)
    ));
    assert!(world.state.books.access(&author, book.id).await.is_ok());

    let started = world
        .state
        .payments
        .checkout(
            &buyer,
            Gateway::Paymee,
            PurchaseItem {
                item_type: ItemType::Book,
                item_id: book.id,
            },
        )
        .await
        .unwrap();
    world
        .state
        .payments
        .handle_webhook(Gateway::Paymee, paid(started.payment_id))
        .await
        .unwrap();

    let access = world.state.books.access(&buyer, book.id).await.unwrap();
    assert_eq!(access.file_url, "https://files.test/async-rust.pdf");

    let earnings = world.state.payments.earnings(&author).await.unwrap();
    assert_eq!(earnings.total_instructor_amount, 24_000);
    assert_eq!(earnings.items[0].item_type, ItemType::Book);
}

#[tokio::test]
async fn test_paid_callback_for_deleted_course_leaves_payment_pending() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let course_id = paid_course(&world, &instructor, PRICE).await;
    let started = world
        .state
        .payments
        .checkout(&student, Gateway::Paymee, course_item(course_id))
        .await
        .unwrap();
    world
        .state
        .courses
        .delete_course(&instructor, course_id)
        .await
        .unwrap();

    let err = world
        .state
        .payments
        .handle_webhook(Gateway::Paymee, paid(started.payment_id))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    let payment = world.repo.get_payment(started.payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    let earnings = world.state.payments.earnings(&instructor).await.unwrap();
    assert_eq!(earnings.total_sales, 0);

    // The retry fails the same way instead of reporting a settled payment.
    let retry = world
        .state
        .payments
        .handle_webhook(Gateway::Paymee, paid(started.payment_id))
        .await
        .unwrap_err();
    assert!(matches!(retry, DomainError::NotFound(_)));
}

#[tokio::test]
async fn test_complete_payment_rolls_back_when_grant_fails() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let course_id = paid_course(&world, &instructor, PRICE).await;
    let started = world
        .state
        .payments
        .checkout(&student, Gateway::Paymee, course_item(course_id))
        .await
        .unwrap();

    // Enrollment into a course that does not exist violates the foreign key.
    let grant = Grant::Enrollment(Enrollment {
        id: Uuid::new_v4(),
        student_id: student.id,
        course_id: Uuid::new_v4(),
        progress: 0,
        enrolled_at: Utc::now(),
        completed_at: None,
    });
    let split = RevenueSplit {
        instructor_amount: 36_400,
        platform_amount: 9_100,
    };
    assert!(world
        .repo
        .complete_payment(started.payment_id, Utc::now(), &grant, instructor.id, split)
        .await
        .is_err());

    let payment = world.repo.get_payment(started.payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert!(world.repo.earnings_for(instructor.id).await.unwrap().is_empty());

    // The real callback still completes it afterwards.
    let settlement = world
        .state
        .payments
        .handle_webhook(Gateway::Paymee, paid(started.payment_id))
        .await
        .unwrap();
    assert!(settlement.fulfilled);
    assert_eq!(settlement.status, PaymentStatus::Completed);
    assert!(world
        .repo
        .get_enrollment(student.id, course_id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_gateway_error_at_checkout_marks_payment_failed() {
    let world = World::new().await;
    let instructor = world.instructor().await;
    let student = world.student().await;
    let course_id = paid_course(&world, &instructor, PRICE).await;
    world.paymee.fail_checkout.store(true, Ordering::SeqCst);

    let err = world
        .state
        .payments
        .checkout(&student, Gateway::Paymee, course_item(course_id))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Gateway(_)));

    let payments = world.state.payments.list(&student).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Failed);
    assert!(payments[0].gateway_ref.is_none());

    // Recovered gateway: a fresh checkout opens a new pending payment.
    world.paymee.fail_checkout.store(false, Ordering::SeqCst);
    let started = world
        .state
        .payments
        .checkout(&student, Gateway::Paymee, course_item(course_id))
        .await
        .unwrap();
    let payment = world.repo.get_payment(started.payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
}
