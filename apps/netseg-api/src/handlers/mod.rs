//! HTTP handlers

pub mod segment;
