// Aggregates per-area integration suites
mod _support;
mod config;
mod crud;
mod listing;
mod reports;
mod store_errors;
