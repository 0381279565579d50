pub mod auth;
pub mod collections;
pub mod health;
pub mod payments;
pub mod photos;
pub mod public;
pub mod upload;
