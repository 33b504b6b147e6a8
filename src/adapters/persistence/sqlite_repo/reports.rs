//! Admin reporting aggregates.

use super::{SqliteRepo, collect, get_i64, get_string, scalar};
use crate::domain::{CountByKey, DomainError, PlatformSummary};
use crate::ports::ReportRepo;
use libsql::Connection;

async fn count(conn: &Connection, sql: &str) -> Result<i64, DomainError> {
    let rows = conn.query(sql, ()).await.map_err(DomainError::repo)?;
    scalar(rows).await
}

async fn grouped(conn: &Connection, column: &str) -> Result<Vec<CountByKey>, DomainError> {
    let rows = conn
        .query(
            &format!("SELECT {column}, COUNT(*) FROM profiles GROUP BY {column} ORDER BY {column}"),
            (),
        )
        .await
        .map_err(DomainError::repo)?;
    collect(rows, |r| {
        Ok(CountByKey {
            key: get_string(r, 0)?,
            count: get_i64(r, 1)?,
        })
    })
    .await
}

#[async_trait::async_trait]
impl ReportRepo for SqliteRepo {
    async fn platform_summary(&self) -> Result<PlatformSummary, DomainError> {
        let conn = self.conn().await?;
        Ok(PlatformSummary {
            users_by_role: grouped(&conn, "role").await?,
            users_by_status: grouped(&conn, "status").await?,
            published_courses: count(&conn, "SELECT COUNT(*) FROM courses WHERE published = 1")
                .await?,
            draft_courses: count(&conn, "SELECT COUNT(*) FROM courses WHERE published = 0").await?,
            enrollments: count(&conn, "SELECT COUNT(*) FROM enrollments").await?,
            completed_enrollments: count(
                &conn,
                "SELECT COUNT(*) FROM enrollments WHERE completed_at IS NOT NULL",
            )
            .await?,
            certificates: count(&conn, "SELECT COUNT(*) FROM certificates").await?,
            completed_payments: count(
                &conn,
                "SELECT COUNT(*) FROM payments WHERE status = 'completed'",
            )
            .await?,
            gross_revenue: count(
                &conn,
                "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE status = 'completed'",
            )
            .await?,
            platform_revenue: count(
                &conn,
                "SELECT COALESCE(SUM(platform_amount), 0) FROM revenue_splits",
            )
            .await?,
            instructor_revenue: count(
                &conn,
                "SELECT COALESCE(SUM(instructor_amount), 0) FROM revenue_splits",
            )
            .await?,
        })
    }
}
