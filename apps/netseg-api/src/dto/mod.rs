//! Request and response bodies

pub mod segment;
