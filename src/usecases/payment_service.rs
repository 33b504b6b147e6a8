//! Checkout and gateway settlement.
//!
//! A payment row is created `pending` before the gateway is contacted. Webhooks move it
//! to `completed` or `failed` through a conditional update; only the request that wins
//! that transition fulfils the purchase, so replayed callbacks are no-ops. Completion,
//! the grant and the revenue split commit together; if the purchased item cannot be
//! resolved the payment stays `pending` and a later callback can retry.

use super::access::load_course;
use super::notification_service::NotificationService;
use crate::domain::rules::{ensure_not_banned, revenue_split};
use crate::domain::{
    BookPurchase, DomainError, Earnings, Enrollment, Gateway, Grant, ItemType, Millimes,
    NewNotification, NotificationKind, Payment, PaymentStatus, Profile, PurchaseItem, Role,
};
use crate::ports::{
    BookRepo, CheckoutRequest, CourseRepo, EnrollmentRepo, GatewayNotification, GatewayVerdict,
    PaymentGatewayPort, PaymentRepo,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutStarted {
    pub payment_id: Uuid,
    pub payment_url: String,
    pub amount: Millimes,
}

/// What a webhook did to the payment.
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub payment_id: Uuid,
    pub status: PaymentStatus,
    /// True only for the callback that fulfilled the purchase.
    pub fulfilled: bool,
}

/// Purchasable item resolved to its price and label.
struct Priced {
    amount: Millimes,
    title: String,
}

/// Everything a paid callback writes, resolved before the payment is touched.
struct Fulfilment {
    grant: Grant,
    beneficiary_id: Uuid,
    title: String,
}

pub struct PaymentService {
    payments: Arc<dyn PaymentRepo>,
    courses: Arc<dyn CourseRepo>,
    enrollments: Arc<dyn EnrollmentRepo>,
    books: Arc<dyn BookRepo>,
    gateways: Vec<Arc<dyn PaymentGatewayPort>>,
    notifications: Arc<NotificationService>,
    instructor_share: i64,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepo>,
        courses: Arc<dyn CourseRepo>,
        enrollments: Arc<dyn EnrollmentRepo>,
        books: Arc<dyn BookRepo>,
        gateways: Vec<Arc<dyn PaymentGatewayPort>>,
        notifications: Arc<NotificationService>,
        instructor_share: i64,
    ) -> Self {
        Self {
            payments,
            courses,
            enrollments,
            books,
            gateways,
            notifications,
            instructor_share,
        }
    }

    fn gateway(&self, gateway: Gateway) -> Result<&Arc<dyn PaymentGatewayPort>, DomainError> {
        self.gateways
            .iter()
            .find(|g| g.gateway() == gateway)
            .ok_or_else(|| {
                DomainError::GatewayUnavailable(format!("{} is not configured", gateway.as_str()))
            })
    }

    async fn price(&self, item: PurchaseItem) -> Result<Priced, DomainError> {
        match item.item_type {
            ItemType::Course => {
                let course = load_course(self.courses.as_ref(), item.item_id).await?;
                if !course.published {
                    return Err(DomainError::not_found(format!("course {}", item.item_id)));
                }
                Ok(Priced {
                    amount: course.price,
                    title: course.title,
                })
            }
            ItemType::Book => {
                let book = self
                    .books
                    .get_book(item.item_id)
                    .await?
                    .ok_or_else(|| DomainError::not_found(format!("book {}", item.item_id)))?;
                Ok(Priced {
                    amount: book.price,
                    title: book.title,
                })
            }
        }
    }

    async fn already_owned(&self, user_id: Uuid, item: PurchaseItem) -> Result<bool, DomainError> {
        match item.item_type {
            ItemType::Course => Ok(self
                .enrollments
                .get_enrollment(user_id, item.item_id)
                .await?
                .is_some()),
            ItemType::Book => self.books.has_purchased(user_id, item.item_id).await,
        }
    }

    /// Open a hosted checkout for a paid course or book.
    pub async fn checkout(
        &self,
        user: &Profile,
        gateway: Gateway,
        item: PurchaseItem,
    ) -> Result<CheckoutStarted, DomainError> {
        ensure_not_banned(user)?;
        let port = self.gateway(gateway)?;
        if item.item_type == ItemType::Course && user.role != Role::Student {
            return Err(DomainError::forbidden("only students can buy courses"));
        }
        let priced = self.price(item).await?;
        if priced.amount <= 0 {
            return Err(DomainError::validation("item is free; no payment needed"));
        }
        if self.already_owned(user.id, item).await? {
            return Err(DomainError::Conflict(format!(
                "{} already owned",
                item.item_type.as_str()
            )));
        }

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            user_id: user.id,
            item,
            amount: priced.amount,
            gateway,
            gateway_ref: None,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.payments.insert_payment(&payment).await?;

        let request = CheckoutRequest {
            payment_id: payment.id,
            amount: priced.amount,
            description: priced.title,
            customer_email: user.email.clone(),
            customer_name: user.full_name.clone(),
        };
        let session = match port.create_checkout(&request).await {
            Ok(s) => s,
            Err(e) => {
                if let Err(settle_err) = self
                    .payments
                    .settle_payment(payment.id, PaymentStatus::Failed, Utc::now())
                    .await
                {
                    warn!(payment_id = %payment.id, error = %settle_err, "could not mark payment failed");
                }
                return Err(e);
            }
        };
        self.payments
            .set_gateway_ref(payment.id, &session.gateway_ref)
            .await?;
        info!(
            payment_id = %payment.id,
            gateway = gateway.as_str(),
            amount = priced.amount,
            "checkout started"
        );
        Ok(CheckoutStarted {
            payment_id: payment.id,
            payment_url: session.payment_url,
            amount: priced.amount,
        })
    }

    /// Verify a gateway callback and settle the payment it refers to.
    pub async fn handle_webhook(
        &self,
        gateway: Gateway,
        notification: GatewayNotification,
    ) -> Result<Settlement, DomainError> {
        let port = self.gateway(gateway)?;
        let payment = self
            .payments
            .find_payment_by_ref(gateway, &notification.gateway_ref)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("{} payment {}", gateway.as_str(), notification.gateway_ref))
            })?;

        let verdict = port.confirm(&notification).await?;
        if payment.status != PaymentStatus::Pending {
            info!(payment_id = %payment.id, status = payment.status.as_str(), "webhook for settled payment ignored");
            return Ok(Settlement {
                payment_id: payment.id,
                status: payment.status,
                fulfilled: false,
            });
        }

        let target = match verdict {
            GatewayVerdict::Paid => PaymentStatus::Completed,
            GatewayVerdict::Failed => PaymentStatus::Failed,
            GatewayVerdict::Pending => {
                return Ok(Settlement {
                    payment_id: payment.id,
                    status: PaymentStatus::Pending,
                    fulfilled: false,
                });
            }
        };

        if target == PaymentStatus::Failed {
            if !self
                .payments
                .settle_payment(payment.id, target, Utc::now())
                .await?
            {
                return self.lost_race(payment.id, target).await;
            }
            info!(
                payment_id = %payment.id,
                gateway = gateway.as_str(),
                status = target.as_str(),
                transaction_id = ?notification.transaction_id,
                "payment settled"
            );
            self.notifications
                .notify(
                    &[payment.user_id],
                    NewNotification {
                        kind: NotificationKind::Payment,
                        title: "Payment failed".to_string(),
                        body: "Your payment could not be completed.".to_string(),
                        link: Some("/payments".to_string()),
                    },
                )
                .await;
            return Ok(Settlement {
                payment_id: payment.id,
                status: target,
                fulfilled: false,
            });
        }

        let fulfilment = self.resolve_fulfilment(&payment).await?;
        let split = revenue_split(payment.amount, self.instructor_share);
        if !self
            .payments
            .complete_payment(
                payment.id,
                Utc::now(),
                &fulfilment.grant,
                fulfilment.beneficiary_id,
                split,
            )
            .await?
        {
            return self.lost_race(payment.id, target).await;
        }
        info!(
            payment_id = %payment.id,
            gateway = gateway.as_str(),
            status = target.as_str(),
            transaction_id = ?notification.transaction_id,
            instructor_amount = split.instructor_amount,
            platform_amount = split.platform_amount,
            "payment settled and fulfilled"
        );
        self.announce_sale(&payment, &fulfilment).await;
        Ok(Settlement {
            payment_id: payment.id,
            status: target,
            fulfilled: true,
        })
    }

    /// A concurrent callback won the transition; report what it left behind.
    async fn lost_race(
        &self,
        payment_id: Uuid,
        target: PaymentStatus,
    ) -> Result<Settlement, DomainError> {
        let current = self
            .payments
            .get_payment(payment_id)
            .await?
            .map(|p| p.status)
            .unwrap_or(target);
        Ok(Settlement {
            payment_id,
            status: current,
            fulfilled: false,
        })
    }

    /// Build the grant for a paid item. Fails, leaving the payment pending, when the
    /// item has been deleted since checkout.
    async fn resolve_fulfilment(&self, payment: &Payment) -> Result<Fulfilment, DomainError> {
        let now = Utc::now();
        match payment.item.item_type {
            ItemType::Course => {
                let course = self
                    .courses
                    .get_course(payment.item.item_id)
                    .await?
                    .ok_or_else(|| {
                        error!(payment_id = %payment.id, course_id = %payment.item.item_id, "paid course no longer exists");
                        DomainError::not_found(format!("course {}", payment.item.item_id))
                    })?;
                Ok(Fulfilment {
                    grant: Grant::Enrollment(Enrollment {
                        id: Uuid::new_v4(),
                        student_id: payment.user_id,
                        course_id: course.id,
                        progress: 0,
                        enrolled_at: now,
                        completed_at: None,
                    }),
                    beneficiary_id: course.instructor_id,
                    title: course.title,
                })
            }
            ItemType::Book => {
                let book = self
                    .books
                    .get_book(payment.item.item_id)
                    .await?
                    .ok_or_else(|| {
                        error!(payment_id = %payment.id, book_id = %payment.item.item_id, "paid book no longer exists");
                        DomainError::not_found(format!("book {}", payment.item.item_id))
                    })?;
                Ok(Fulfilment {
                    grant: Grant::BookPurchase(BookPurchase {
                        id: Uuid::new_v4(),
                        buyer_id: payment.user_id,
                        book_id: book.id,
                        payment_id: Some(payment.id),
                        purchased_at: now,
                    }),
                    beneficiary_id: book.author_id,
                    title: book.title,
                })
            }
        }
    }

    async fn announce_sale(&self, payment: &Payment, fulfilment: &Fulfilment) {
        let title = &fulfilment.title;
        self.notifications
            .notify_and_email(
                &[payment.user_id],
                NewNotification {
                    kind: NotificationKind::Payment,
                    title: "Payment received".to_string(),
                    body: format!("Your purchase of {title} is confirmed."),
                    link: Some(match payment.item.item_type {
                        ItemType::Course => format!("/courses/{}", payment.item.item_id),
                        ItemType::Book => format!("/books/{}", payment.item.item_id),
                    }),
                },
            )
            .await;
        self.notifications
            .notify(
                &[fulfilment.beneficiary_id],
                NewNotification {
                    kind: NotificationKind::Payment,
                    title: "New sale".to_string(),
                    body: format!("{title} was purchased."),
                    link: Some("/instructor/earnings".to_string()),
                },
            )
            .await;
    }

    /// Caller's payments; admins see all.
    pub async fn list(&self, user: &Profile) -> Result<Vec<Payment>, DomainError> {
        let scope = if user.is_admin() { None } else { Some(user.id) };
        self.payments.list_payments(scope).await
    }

    /// Revenue-split totals for the caller as beneficiary.
    pub async fn earnings(&self, user: &Profile) -> Result<Earnings, DomainError> {
        if user.role == Role::Student {
            return Err(DomainError::forbidden("instructors only"));
        }
        let lines = self.payments.earnings_for(user.id).await?;
        Ok(Earnings::from_lines(lines))
    }
}
