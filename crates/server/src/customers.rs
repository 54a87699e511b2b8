//! Customer prefix endpoints.
//!
//! - `GET    /customers?prefix=a,b`: customers whose first name starts with any prefix
//! - `DELETE /customers?prefix=a,b`: delete them and report `{count, ids}`

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use clientele_core::{
    split_prefixes, ApplicationError, Customer, CustomerService, DeleteResult, DomainError,
    InterfaceError,
};
use clientele_db::SqlCustomerStore;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

pub type SqlCustomerService = CustomerService<SqlCustomerStore>;

#[derive(Clone)]
pub struct CustomersState {
    service: Arc<SqlCustomerService>,
}

#[derive(Debug, Deserialize)]
pub struct PrefixQuery {
    pub prefix: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerApiError {
    pub error: String,
    pub correlation_id: String,
}

type ApiError = (StatusCode, Json<CustomerApiError>);

pub fn router(service: Arc<SqlCustomerService>) -> Router {
    Router::new()
        .route("/customers", get(get_customers).delete(delete_customers))
        .with_state(CustomersState { service })
}

pub async fn get_customers(
    State(state): State<CustomersState>,
    Query(query): Query<PrefixQuery>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let raw = required_prefix(query, &correlation_id)?;
    match state.service.get(split_prefixes(&raw)).await {
        Ok(customers) => {
            info!(
                event_name = "customer.search.completed",
                correlation_id = %correlation_id,
                prefix = %raw,
                returned = customers.len(),
                "customer prefix search completed"
            );
            Ok(Json(customers))
        }
        Err(error) => Err(failure("search", error, correlation_id)),
    }
}

pub async fn delete_customers(
    State(state): State<CustomersState>,
    Query(query): Query<PrefixQuery>,
) -> Result<Json<DeleteResult>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let raw = required_prefix(query, &correlation_id)?;

    match state.service.delete(&raw).await {
        Ok(result) => {
            info!(
                event_name = "customer.delete.completed",
                correlation_id = %correlation_id,
                prefix = %raw,
                deleted = result.count,
                ids = ?result.ids,
                "customer prefix delete committed"
            );
            Ok(Json(result))
        }
        Err(error) => Err(failure("delete", error, correlation_id)),
    }
}

fn required_prefix(query: PrefixQuery, correlation_id: &str) -> Result<String, ApiError> {
    match query.prefix {
        Some(prefix) if !prefix.is_empty() => Ok(prefix),
        _ => {
            let error = ApplicationError::from(DomainError::EmptyPrefixFilter);
            Err(failure("validate", error, correlation_id.to_string()))
        }
    }
}

fn failure(operation: &'static str, error: ApplicationError, correlation_id: String) -> ApiError {
    if error.is_validation() {
        warn!(
            event_name = "customer.request.rejected",
            correlation_id = %correlation_id,
            operation,
            error = %error,
            "customer request rejected"
        );
    } else {
        error!(
            event_name = "customer.request.failed",
            correlation_id = %correlation_id,
            operation,
            error = %error,
            "customer request failed"
        );
    }

    let interface = error.into_interface(correlation_id);
    let (status, message) = match &interface {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, interface.user_message().to_string())
        }
    };

    (
        status,
        Json(CustomerApiError { error: message, correlation_id: interface.correlation_id().to_string() }),
    )
}
