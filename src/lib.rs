pub mod admin;
pub mod api;
pub mod config;
pub mod error;
pub mod i18n;
pub mod models;
pub mod pages;
pub mod reports;
pub mod routes;
pub mod session;
pub mod state;
