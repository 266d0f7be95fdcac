pub mod cache;
pub mod configuration;
pub mod controller;
pub mod derivation;
pub mod error;
pub mod handler;
pub mod helpers;
pub mod karma;
pub mod metadata;
pub mod model;
pub mod portfolio;
pub mod provider;
pub mod server;
pub mod session;
pub mod types;
