//! `GET /health`: readiness of the customer store.
//!
//! Ready means the `customer` table answers a count query and every embedded
//! migration has been applied. Anything else is reported as degraded with a
//! 503 so load balancers stop routing prefix traffic here.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use clientele_db::{migrations, DbPool};
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerStoreHealth {
    pub status: Readiness,
    pub customer_rows: Option<i64>,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SchemaHealth {
    pub status: Readiness,
    pub applied_version: Option<i64>,
    pub pending: Vec<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: Readiness,
    pub customers: CustomerStoreHealth,
    pub schema: SchemaHealth,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthReport>) {
    let customers = customer_store_check(&state.db_pool).await;
    let schema = schema_check(&state.db_pool).await;
    let ready = customers.status == Readiness::Ready && schema.status == Readiness::Ready;

    let report = HealthReport {
        status: if ready { Readiness::Ready } else { Readiness::Degraded },
        customers,
        schema,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(report))
}

async fn customer_store_check(pool: &DbPool) -> CustomerStoreHealth {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customer").fetch_one(pool).await {
        Ok(rows) => CustomerStoreHealth {
            status: Readiness::Ready,
            customer_rows: Some(rows),
            detail: "customer table answers prefix queries".to_string(),
        },
        Err(error) => CustomerStoreHealth {
            status: Readiness::Degraded,
            customer_rows: None,
            detail: format!("customer table unreachable: {error}"),
        },
    }
}

async fn schema_check(pool: &DbPool) -> SchemaHealth {
    let applied = migrations::applied_versions(pool).await.unwrap_or_default();
    let pending: Vec<i64> =
        migrations::known_versions().filter(|version| !applied.contains(version)).collect();

    SchemaHealth {
        status: if pending.is_empty() { Readiness::Ready } else { Readiness::Degraded },
        applied_version: applied.last().copied(),
        pending,
    }
}
