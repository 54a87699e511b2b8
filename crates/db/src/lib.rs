pub mod connection;
pub mod migrations;
pub mod prefix;
pub mod repositories;

pub use connection::{connect_with_settings, DbPool};
pub use prefix::PrefixPredicate;
pub use repositories::SqlCustomerStore;
