use crate::domain::customer::{Customer, DeleteResult};
use crate::domain::prefix::PrefixFilter;
use crate::errors::{ApplicationError, DomainError};
use crate::store::CustomerStore;

/// Validates caller input into a [`PrefixFilter`] before it reaches the store.
pub struct CustomerService<S> {
    store: S,
}

impl<S: CustomerStore> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Prefixes arrive already split by the transport layer.
    pub async fn get(&self, prefixes: Vec<String>) -> Result<Vec<Customer>, ApplicationError> {
        if prefixes.is_empty() {
            return Err(DomainError::EmptyPrefixFilter.into());
        }
        let filter = PrefixFilter::new(prefixes)?;

        Ok(self.store.search(&filter).await?)
    }

    /// `raw` is the comma-separated form, e.g. `"Клиент, Другой"`.
    pub async fn delete(&self, raw: &str) -> Result<DeleteResult, ApplicationError> {
        let filter = PrefixFilter::parse(raw)?;

        Ok(self.store.delete(&filter).await?)
    }
}
