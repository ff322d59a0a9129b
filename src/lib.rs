pub mod auth;
pub mod badges;
pub mod chatbot;
pub mod config;
pub mod error;
pub mod geocode;
pub mod insights;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
