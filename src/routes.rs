pub mod api;
pub mod error;
pub mod health;
pub mod login;
pub mod web;
