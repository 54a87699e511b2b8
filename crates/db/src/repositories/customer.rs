use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use tracing::{debug, warn};

use clientele_core::{
    Customer, CustomerId, CustomerStore, DeleteResult, PrefixFilter, StoreError, TransactionStage,
};

use crate::prefix::PrefixPredicate;
use crate::DbPool;

const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, patronymic_name, phone, email";

pub struct SqlCustomerStore {
    pool: DbPool,
}

impl SqlCustomerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_customer(row: &SqliteRow) -> Result<Customer, StoreError> {
    let decode = |error: sqlx::Error| StoreError::query("decode", error);

    Ok(Customer {
        id: CustomerId(row.try_get("id").map_err(decode)?),
        first_name: row.try_get("first_name").map_err(decode)?,
        last_name: row.try_get("last_name").map_err(decode)?,
        patronymic_name: row.try_get("patronymic_name").map_err(decode)?,
        phone: row.try_get("phone").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
    })
}

/// Phase 1 captures the ids, phase 2 removes the same predicate's rows.
/// Both run on `tx`; the caller decides between commit and rollback.
async fn delete_matching(
    tx: &mut Transaction<'_, Sqlite>,
    predicate: &PrefixPredicate,
) -> Result<Vec<CustomerId>, StoreError> {
    let select_sql = format!("SELECT id FROM customer WHERE {} ORDER BY id", predicate.sql());
    let mut select = sqlx::query_scalar::<_, i64>(&select_sql);
    for pattern in predicate.patterns() {
        select = select.bind(pattern.as_str());
    }
    let ids = select
        .fetch_all(&mut **tx)
        .await
        .map_err(|error| StoreError::transaction(TransactionStage::SelectIds, error))?;

    let delete_sql = format!("DELETE FROM customer WHERE {}", predicate.sql());
    let mut delete = sqlx::query(&delete_sql);
    for pattern in predicate.patterns() {
        delete = delete.bind(pattern.as_str());
    }
    let outcome = delete
        .execute(&mut **tx)
        .await
        .map_err(|error| StoreError::transaction(TransactionStage::Delete, error))?;

    let captured = u64::try_from(ids.len()).unwrap_or(u64::MAX);
    if outcome.rows_affected() != captured {
        return Err(StoreError::transaction(
            TransactionStage::Delete,
            format!(
                "deleted {} rows but captured {} ids",
                outcome.rows_affected(),
                ids.len()
            ),
        ));
    }

    Ok(ids.into_iter().map(CustomerId).collect())
}

#[async_trait]
impl CustomerStore for SqlCustomerStore {
    async fn search(&self, filter: &PrefixFilter) -> Result<Vec<Customer>, StoreError> {
        let predicate = PrefixPredicate::build(filter);
        let sql =
            format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE {} ORDER BY id", predicate.sql());

        let mut query = sqlx::query(&sql);
        for pattern in predicate.patterns() {
            query = query.bind(pattern.as_str());
        }
        let rows =
            query.fetch_all(&self.pool).await.map_err(|error| StoreError::query("search", error))?;

        rows.iter().map(row_to_customer).collect()
    }

    /// The write lock is taken at `BEGIN IMMEDIATE`, before phase 1, so
    /// overlapping deletes queue on `busy_timeout` instead of failing when
    /// they upgrade from a read snapshot. Dropping the returned future
    /// before it resolves drops the open transaction, which sqlx rolls back.
    async fn delete(&self, filter: &PrefixFilter) -> Result<DeleteResult, StoreError> {
        let predicate = PrefixPredicate::build(filter);
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|error| StoreError::transaction(TransactionStage::Begin, error))?;

        match delete_matching(&mut tx, &predicate).await {
            Ok(ids) => {
                tx.commit()
                    .await
                    .map_err(|error| StoreError::transaction(TransactionStage::Commit, error))?;
                debug!(prefixes = %filter, deleted = ids.len(), "customer delete committed");
                Ok(DeleteResult::from_ids(ids))
            }
            Err(error) => {
                if let Err(rollback_error) = tx.rollback().await {
                    warn!(
                        prefixes = %filter,
                        error = %rollback_error,
                        "customer delete rollback failed"
                    );
                }
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tempfile::TempDir;

    use clientele_core::{
        ApplicationError, CustomerId, CustomerService, CustomerStore, DeleteResult, PrefixFilter,
        StoreError, TransactionStage,
    };

    use super::SqlCustomerStore;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    /// File-backed database so that several connections share one store.
    async fn setup_file(max_connections: u32) -> (TempDir, String, sqlx::SqlitePool) {
        let dir = tempfile::tempdir().expect("temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("customers.db").display());
        let pool = connect_with_settings(&url, max_connections, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        (dir, url, pool)
    }

    fn filter(prefixes: &[&str]) -> PrefixFilter {
        PrefixFilter::new(prefixes.iter().copied()).expect("valid filter")
    }

    fn ids(values: &[i64]) -> Vec<CustomerId> {
        values.iter().copied().map(CustomerId).collect()
    }

    async fn total_rows(pool: &sqlx::SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM customer")
            .fetch_one(pool)
            .await
            .expect("count customers")
    }

    #[tokio::test]
    async fn search_single_prefix_returns_matches_in_id_order() {
        let store = SqlCustomerStore::new(setup().await);

        let customers = store.search(&filter(&["Клиент"])).await.expect("search");

        let found: Vec<CustomerId> = customers.iter().map(|customer| customer.id).collect();
        assert_eq!(found, ids(&[1, 2, 3, 4]));
        assert!(customers
            .iter()
            .all(|customer| customer.first_name.as_deref().is_some_and(|name| name.starts_with("Клиент"))));
        assert_eq!(customers[0].email.as_deref(), Some("test1@test.ru"));
        assert_eq!(customers[0].patronymic_name.as_deref(), Some("Клиентович1"));
    }

    #[tokio::test]
    async fn search_multiple_prefixes_is_a_disjunction() {
        let store = SqlCustomerStore::new(setup().await);

        let customers = store.search(&filter(&["Другой", "Клиент"])).await.expect("search");

        let found: Vec<CustomerId> = customers.iter().map(|customer| customer.id).collect();
        assert_eq!(found, ids(&[1, 2, 3, 4, 5]));
    }

    #[tokio::test]
    async fn search_without_matches_returns_empty() {
        let store = SqlCustomerStore::new(setup().await);

        let customers = store.search(&filter(&["NonExistent"])).await.expect("search");

        assert!(customers.is_empty());
    }

    #[tokio::test]
    async fn search_keeps_null_distinct_from_empty_string() {
        let pool = setup().await;
        sqlx::query(
            "INSERT INTO customer (id, first_name, last_name, patronymic_name, phone, email)
             VALUES (10, 'Пустой', NULL, '', NULL, '')",
        )
        .execute(&pool)
        .await
        .expect("insert sparse customer");
        let store = SqlCustomerStore::new(pool);

        let customers = store.search(&filter(&["Пустой"])).await.expect("search");

        assert_eq!(customers.len(), 1);
        let customer = &customers[0];
        assert_eq!(customer.id, CustomerId(10));
        assert_eq!(customer.last_name, None);
        assert_eq!(customer.patronymic_name.as_deref(), Some(""));
        assert_eq!(customer.phone, None);
        assert_eq!(customer.email.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn search_is_case_sensitive() {
        let pool = setup().await;
        sqlx::query("INSERT INTO customer (id, first_name) VALUES (20, 'Alice')")
            .execute(&pool)
            .await
            .expect("insert ascii customer");
        let store = SqlCustomerStore::new(pool);

        assert!(store.search(&filter(&["alice"])).await.expect("search").is_empty());
        assert_eq!(store.search(&filter(&["Ali"])).await.expect("search").len(), 1);
    }

    #[tokio::test]
    async fn search_passes_wildcards_through() {
        let store = SqlCustomerStore::new(setup().await);

        let underscore = store.search(&filter(&["Клиен_"])).await.expect("search");
        assert_eq!(underscore.len(), 4);

        let percent = store.search(&filter(&["%5"])).await.expect("search");
        let found: Vec<CustomerId> = percent.iter().map(|customer| customer.id).collect();
        assert_eq!(found, ids(&[5]));
    }

    #[tokio::test]
    async fn search_ignores_rows_with_null_first_name() {
        let pool = setup().await;
        sqlx::query("INSERT INTO customer (id, first_name) VALUES (30, NULL)")
            .execute(&pool)
            .await
            .expect("insert nameless customer");
        let store = SqlCustomerStore::new(pool);

        let customers = store.search(&filter(&["%"])).await.expect("search");

        assert_eq!(customers.len(), 5);
    }

    #[tokio::test]
    async fn delete_reports_exactly_the_removed_ids() {
        let pool = setup().await;
        let store = SqlCustomerStore::new(pool.clone());
        let before = total_rows(&pool).await;

        let result = store.delete(&filter(&["Клиент"])).await.expect("delete");

        assert_eq!(result, DeleteResult { count: 4, ids: ids(&[1, 2, 3, 4]) });
        assert_eq!(result.count, result.ids.len());
        let removed = before - total_rows(&pool).await;
        assert_eq!(usize::try_from(removed).expect("non-negative"), result.count);
        assert!(store.search(&filter(&["Клиент"])).await.expect("search").is_empty());

        let remaining = store.search(&filter(&["Другой"])).await.expect("search");
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn delete_without_matches_commits_empty_result() {
        let pool = setup().await;
        let store = SqlCustomerStore::new(pool.clone());

        let result = store.delete(&filter(&["NonExistent"])).await.expect("delete");

        assert_eq!(result, DeleteResult { count: 0, ids: Vec::new() });
        assert_eq!(total_rows(&pool).await, 5);
    }

    #[tokio::test]
    async fn delete_twice_reports_nothing_the_second_time() {
        let store = SqlCustomerStore::new(setup().await);

        let first = store.delete(&filter(&["Клиент", "Другой"])).await.expect("first delete");
        let second = store.delete(&filter(&["Клиент", "Другой"])).await.expect("second delete");

        assert_eq!(first.count, 5);
        assert_eq!(second, DeleteResult::default());
    }

    #[tokio::test]
    async fn delete_rolls_back_when_delete_phase_fails() {
        let pool = setup().await;
        sqlx::query(
            "CREATE TRIGGER forbid_customer_3 BEFORE DELETE ON customer
             WHEN OLD.id = 3
             BEGIN
                 SELECT RAISE(ABORT, 'forced delete failure');
             END",
        )
        .execute(&pool)
        .await
        .expect("install failing trigger");
        let store = SqlCustomerStore::new(pool.clone());

        let error = store.delete(&filter(&["Клиент"])).await.expect_err("delete must fail");

        assert!(matches!(
            error,
            StoreError::Transaction { stage: TransactionStage::Delete, ref message }
                if message.contains("forced delete failure")
        ));
        assert_eq!(total_rows(&pool).await, 5);
        let survivors = store.search(&filter(&["Клиент"])).await.expect("search");
        assert_eq!(survivors.len(), 4);
    }

    #[tokio::test]
    async fn overlapping_deletes_serialize_without_errors() {
        let (_dir, _url, pool) = setup_file(5).await;
        let store = Arc::new(SqlCustomerStore::new(pool.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.delete(&filter(&["Клиент"])).await })
            })
            .collect();

        let mut removed = Vec::new();
        for handle in handles {
            let result = handle.await.expect("delete task").expect("concurrent delete");
            assert_eq!(result.count, result.ids.len());
            removed.extend(result.ids);
        }
        removed.sort();

        assert_eq!(removed, ids(&[1, 2, 3, 4]));
        assert_eq!(total_rows(&pool).await, 1);
    }

    #[tokio::test]
    async fn cancelled_delete_leaves_rows_and_pool_usable() {
        let (_dir, url, pool) = setup_file(1).await;
        let store = SqlCustomerStore::new(pool.clone());
        let other = connect_with_settings(&url, 1, 30).await.expect("second pool");
        let lock = other.begin_with("BEGIN IMMEDIATE").await.expect("hold write lock");

        let blocked =
            tokio::time::timeout(Duration::from_millis(200), store.delete(&filter(&["Клиент"])))
                .await;
        assert!(blocked.is_err(), "delete should still be waiting for the write lock");

        lock.rollback().await.expect("release write lock");
        assert_eq!(total_rows(&pool).await, 5);
        assert_eq!(store.search(&filter(&["Клиент"])).await.expect("search").len(), 4);

        let result = store.delete(&filter(&["Клиент"])).await.expect("delete after cancel");
        assert_eq!(result, DeleteResult { count: 4, ids: ids(&[1, 2, 3, 4]) });
        other.close().await;
    }

    #[tokio::test]
    async fn closed_pool_surfaces_query_and_transaction_errors() {
        let pool = setup().await;
        let store = SqlCustomerStore::new(pool.clone());
        pool.close().await;

        let search_error = store.search(&filter(&["Клиент"])).await.expect_err("search");
        assert!(matches!(search_error, StoreError::Query { operation: "search", .. }));

        let delete_error = store.delete(&filter(&["Клиент"])).await.expect_err("delete");
        assert!(matches!(
            delete_error,
            StoreError::Transaction { stage: TransactionStage::Begin, .. }
        ));
    }

    #[tokio::test]
    async fn seeded_scenario_end_to_end_through_service() {
        let service = CustomerService::new(SqlCustomerStore::new(setup().await));

        let clients = service.get(vec!["Клиент".to_string()]).await.expect("get clients");
        assert_eq!(clients.iter().map(|c| c.id).collect::<Vec<_>>(), ids(&[1, 2, 3, 4]));

        let everyone = service
            .get(vec!["Клиент".to_string(), "Другой".to_string()])
            .await
            .expect("get everyone");
        assert_eq!(everyone.iter().map(|c| c.id).collect::<Vec<_>>(), ids(&[1, 2, 3, 4, 5]));

        let deleted = service.delete("Клиент").await.expect("delete clients");
        assert_eq!(deleted, DeleteResult { count: 4, ids: ids(&[1, 2, 3, 4]) });
        assert!(service.get(vec!["Клиент".to_string()]).await.expect("get").is_empty());

        let nothing = service.delete("NonExistent").await.expect("delete nothing");
        assert_eq!(nothing, DeleteResult { count: 0, ids: Vec::new() });

        let invalid = service.delete("a, ,b").await.expect_err("blank segment");
        assert!(matches!(invalid, ApplicationError::Validation(_)));
    }
}
