//! Request handlers, one module per endpoint.

pub mod books;
pub mod health;
pub mod schema;
