pub mod accounts;
pub mod auth;
pub mod deliveries;
pub mod health;
pub mod images;
