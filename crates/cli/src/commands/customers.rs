use clientele_core::{split_prefixes, ApplicationError, CustomerService};
use clientele_db::SqlCustomerStore;
use serde::Serialize;

use crate::commands::{with_database, CommandFailure, CommandResult};

pub fn search(raw_prefix: &str) -> CommandResult {
    let prefixes = split_prefixes(raw_prefix);

    let result = with_database("customers.search", |pool| async move {
        let service = CustomerService::new(SqlCustomerStore::new(pool));
        service.get(prefixes).await.map_err(classify)
    });

    render("customers.search", result)
}

pub fn delete(raw_prefix: &str) -> CommandResult {
    let raw = raw_prefix.to_string();

    let result = with_database("customers.delete", |pool| async move {
        let service = CustomerService::new(SqlCustomerStore::new(pool));
        service.delete(&raw).await.map_err(classify)
    });

    render("customers.delete", result)
}

fn render<T: Serialize>(command: &str, result: Result<T, CommandResult>) -> CommandResult {
    match result {
        Ok(value) => match serde_json::to_string(&value) {
            Ok(message) => CommandResult::success(command, message),
            Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 8),
        },
        Err(failure) => failure,
    }
}

fn classify(error: ApplicationError) -> CommandFailure {
    if error.is_validation() {
        ("invalid_prefix", error.to_string(), 6)
    } else {
        ("store", error.to_string(), 7)
    }
}
