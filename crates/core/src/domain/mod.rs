pub mod customer;
pub mod prefix;
