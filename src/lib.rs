pub mod answer;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod reference;
pub mod services;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;
