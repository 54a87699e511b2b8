use async_trait::async_trait;

use crate::domain::customer::{Customer, DeleteResult};
use crate::domain::prefix::PrefixFilter;
use crate::errors::StoreError;

/// Persistence port for prefix lookup and prefix deletion of customers.
///
/// `delete` must be atomic: the reported ids are exactly the rows removed,
/// and a failure leaves storage untouched.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Rows whose `first_name` starts with any prefix, ordered by id.
    async fn search(&self, filter: &PrefixFilter) -> Result<Vec<Customer>, StoreError>;

    async fn delete(&self, filter: &PrefixFilter) -> Result<DeleteResult, StoreError>;
}
