//! Payments and revenue splits.

use super::enrollments::INSERT_ENROLLMENT;
use super::{
    SqliteRepo, collect, first, get_i64, get_opt_string, get_string, get_ts, get_uuid, opt_ts, ts,
};
use crate::domain::{
    DomainError, EarningLine, Gateway, Grant, ItemType, Payment, PaymentStatus, PurchaseItem,
    RevenueSplit,
};
use crate::ports::PaymentRepo;
use chrono::{DateTime, Utc};
use libsql::{Row, params};
use tracing::debug;
use uuid::Uuid;

const PAYMENT_COLUMNS: &str = "id, user_id, item_type, item_id, amount, gateway, gateway_ref, status, created_at, updated_at";

fn row_to_payment(row: &Row) -> Result<Payment, DomainError> {
    let item_type = get_string(row, 2)?;
    let gateway = get_string(row, 5)?;
    let status = get_string(row, 7)?;
    Ok(Payment {
        id: get_uuid(row, 0)?,
        user_id: get_uuid(row, 1)?,
        item: PurchaseItem {
            item_type: ItemType::parse(&item_type)
                .ok_or_else(|| DomainError::Repo(format!("unknown item type '{item_type}'")))?,
            item_id: get_uuid(row, 3)?,
        },
        amount: get_i64(row, 4)?,
        gateway: Gateway::parse(&gateway)
            .ok_or_else(|| DomainError::Repo(format!("unknown gateway '{gateway}'")))?,
        gateway_ref: get_opt_string(row, 6),
        status: PaymentStatus::parse(&status)
            .ok_or_else(|| DomainError::Repo(format!("unknown payment status '{status}'")))?,
        created_at: get_ts(row, 8)?,
        updated_at: get_ts(row, 9)?,
    })
}

#[async_trait::async_trait]
impl PaymentRepo for SqliteRepo {
    async fn insert_payment(&self, p: &Payment) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            &format!(
                "INSERT INTO payments ({PAYMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                p.id.to_string(),
                p.user_id.to_string(),
                p.item.item_type.as_str(),
                p.item.item_id.to_string(),
                p.amount,
                p.gateway.as_str(),
                p.gateway_ref.clone(),
                p.status.as_str(),
                ts(p.created_at),
                ts(p.updated_at)
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn set_gateway_ref(&self, id: Uuid, gateway_ref: &str) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE payments SET gateway_ref = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), gateway_ref, ts(Utc::now())],
        )
        .await
        .map_err(DomainError::repo)?;
        Ok(())
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_payment).await
    }

    async fn find_payment_by_ref(
        &self,
        gateway: Gateway,
        gateway_ref: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE gateway = ?1 AND gateway_ref = ?2"),
                params![gateway.as_str(), gateway_ref],
            )
            .await
            .map_err(DomainError::repo)?;
        first(rows, row_to_payment).await
    }

    async fn settle_payment(
        &self,
        id: Uuid,
        to: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE payments SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = 'pending'",
                params![id.to_string(), to.as_str(), ts(at)],
            )
            .await
            .map_err(DomainError::repo)?;
        debug!(payment_id = %id, to = to.as_str(), won = changed > 0, "payment settle attempt");
        Ok(changed > 0)
    }

    async fn list_payments(&self, user_id: Option<Uuid>) -> Result<Vec<Payment>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {PAYMENT_COLUMNS} FROM payments WHERE ?1 IS NULL OR user_id = ?1 ORDER BY created_at DESC"
                ),
                params![user_id.map(|id| id.to_string())],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, row_to_payment).await
    }

    async fn complete_payment(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        grant: &Grant,
        beneficiary_id: Uuid,
        split: RevenueSplit,
    ) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(DomainError::repo)?;
        let changed = tx
            .execute(
                "UPDATE payments SET status = 'completed', updated_at = ?2 WHERE id = ?1 AND status = 'pending'",
                params![id.to_string(), ts(at)],
            )
            .await
            .map_err(DomainError::repo)?;
        if changed == 0 {
            tx.rollback().await.map_err(DomainError::repo)?;
            debug!(payment_id = %id, "payment already settled; nothing granted");
            return Ok(false);
        }

        match grant {
            Grant::Enrollment(e) => tx
                .execute(
                    INSERT_ENROLLMENT,
                    params![
                        e.id.to_string(),
                        e.student_id.to_string(),
                        e.course_id.to_string(),
                        e.progress,
                        ts(e.enrolled_at),
                        opt_ts(e.completed_at)
                    ],
                )
                .await
                .map_err(DomainError::repo)?,
            Grant::BookPurchase(p) => tx
                .execute(
                    r#"
                    INSERT INTO book_purchases (id, buyer_id, book_id, payment_id, purchased_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT (buyer_id, book_id) DO NOTHING
                    "#,
                    params![
                        p.id.to_string(),
                        p.buyer_id.to_string(),
                        p.book_id.to_string(),
                        p.payment_id.map(|id| id.to_string()),
                        ts(p.purchased_at)
                    ],
                )
                .await
                .map_err(DomainError::repo)?,
        };

        tx.execute(
            r#"
            INSERT INTO revenue_splits (payment_id, beneficiary_id, instructor_amount, platform_amount, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (payment_id) DO NOTHING
            "#,
            params![
                id.to_string(),
                beneficiary_id.to_string(),
                split.instructor_amount,
                split.platform_amount,
                ts(at)
            ],
        )
        .await
        .map_err(DomainError::repo)?;
        tx.commit().await.map_err(DomainError::repo)?;
        debug!(payment_id = %id, "payment completed and granted");
        Ok(true)
    }

    async fn earnings_for(&self, beneficiary_id: Uuid) -> Result<Vec<EarningLine>, DomainError> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                r#"
                SELECT p.item_type, p.item_id, COUNT(*), COALESCE(SUM(p.amount), 0), COALESCE(SUM(r.instructor_amount), 0)
                FROM revenue_splits r JOIN payments p ON p.id = r.payment_id
                WHERE r.beneficiary_id = ?1
                GROUP BY p.item_type, p.item_id
                ORDER BY SUM(r.instructor_amount) DESC
                "#,
                params![beneficiary_id.to_string()],
            )
            .await
            .map_err(DomainError::repo)?;
        collect(rows, |r| {
            let item_type = get_string(r, 0)?;
            Ok(EarningLine {
                item_type: ItemType::parse(&item_type)
                    .ok_or_else(|| DomainError::Repo(format!("unknown item type '{item_type}'")))?,
                item_id: get_uuid(r, 1)?,
                sales: get_i64(r, 2)?,
                gross: get_i64(r, 3)?,
                instructor_amount: get_i64(r, 4)?,
            })
        })
        .await
    }
}
