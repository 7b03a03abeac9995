//! Business logic between the HTTP handlers and the database layer

pub mod reservations;
