use sqlx::SqlitePool;
use time::{Date, Duration, OffsetDateTime};

use crate::error::StorageError;
use crate::transactions::repo_types::{
    Balance, CategoryTotal, MonthlySpending, NewTransaction, Transaction, TransactionRow,
};

const TRANSACTION_COLUMNS: &str =
    "id, user_id, description, amount, kind, category, transaction_date, created_at";

pub async fn create(
    db: &SqlitePool,
    fields: &NewTransaction,
    user_id: i64,
) -> Result<Transaction, StorageError> {
    let row = sqlx::query_as::<_, TransactionRow>(&format!(
        r#"
        INSERT INTO transactions (user_id, description, amount, kind, category, transaction_date, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING {TRANSACTION_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&fields.description)
    .bind(fields.amount.abs())
    .bind(fields.kind.as_str())
    .bind(&fields.category)
    .bind(fields.transaction_date)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db)
    .await?;
    row.try_into()
}

/// Expense totals per category in `[start, end]`, optionally for a single category.
pub async fn sum_by_category_for_period(
    db: &SqlitePool,
    user_id: i64,
    start: Date,
    end: Date,
    category: Option<&str>,
) -> Result<Vec<CategoryTotal>, StorageError> {
    let rows = sqlx::query_as::<_, CategoryTotal>(
        r#"
        SELECT category, CAST(SUM(amount) AS REAL) AS total
        FROM transactions
        WHERE user_id = ?1
          AND kind = 'expense'
          AND transaction_date >= ?2
          AND transaction_date <= ?3
          AND (?4 IS NULL OR category = ?4)
        GROUP BY category
        ORDER BY category ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .bind(category)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn balance(db: &SqlitePool, user_id: i64) -> Result<Balance, StorageError> {
    let (income, expense): (f64, f64) = sqlx::query_as(
        r#"
        SELECT
            CAST(COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0) AS REAL),
            CAST(COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0) AS REAL)
        FROM transactions
        WHERE user_id = ?1
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(Balance {
        income,
        expense,
        balance: income - expense,
    })
}

/// Most recent transactions, newest id first.
pub async fn recent(
    db: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<Transaction>, StorageError> {
    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        r#"
        SELECT {TRANSACTION_COLUMNS}
        FROM transactions
        WHERE user_id = ?1
        ORDER BY id DESC
        LIMIT ?2
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    rows.into_iter().map(Transaction::try_from).collect()
}

/// Delete one transaction owned by `user_id`. Returns the number of rows removed (0 or 1).
pub async fn delete_by_id(
    db: &SqlitePool,
    transaction_id: i64,
    user_id: i64,
) -> Result<u64, StorageError> {
    let res = sqlx::query(
        r#"
        DELETE FROM transactions
        WHERE id = ?1 AND user_id = ?2
        "#,
    )
    .bind(transaction_id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(res.rows_affected())
}

pub async fn delete_all(db: &SqlitePool, user_id: i64) -> Result<u64, StorageError> {
    let res = sqlx::query("DELETE FROM transactions WHERE user_id = ?1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

/// Expense totals per month and category for the 90 days ending at `today`.
pub async fn spending_summary_last_90_days(
    db: &SqlitePool,
    user_id: i64,
    today: Date,
) -> Result<MonthlySpending, StorageError> {
    let since = today - Duration::days(90);
    // month is NULL when a stored date is unreadable
    let rows: Vec<(Option<String>, String, f64)> = sqlx::query_as(
        r#"
        SELECT strftime('%Y-%m', transaction_date) AS month,
               category,
               CAST(SUM(amount) AS REAL) AS total
        FROM transactions
        WHERE user_id = ?1
          AND kind = 'expense'
          AND transaction_date >= ?2
        GROUP BY month, category
        ORDER BY month ASC, category ASC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(db)
    .await?;

    let mut summary = MonthlySpending::new();
    for (month, category, total) in rows {
        let month = month.ok_or(StorageError::UnreadableDate { user_id })?;
        summary
            .entry(month)
            .or_default()
            .push(CategoryTotal { category, total });
    }
    Ok(summary)
}
