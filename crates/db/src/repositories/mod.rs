pub mod customer;

pub use customer::SqlCustomerStore;
