pub mod config;
pub mod domain;
pub mod errors;
pub mod service;
pub mod store;

pub use domain::customer::{Customer, CustomerId, DeleteResult};
pub use domain::prefix::{split_prefixes, PrefixFilter, MAX_PREFIXES};
pub use errors::{
    ApplicationError, DomainError, InterfaceError, StoreError, TransactionStage,
};
pub use service::CustomerService;
pub use store::CustomerStore;
