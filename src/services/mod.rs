//! Domain services

pub mod filter;

pub use filter::JobFilter;
