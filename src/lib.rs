/// QRTix server library: user registration, password + face login and
/// ticket sales over a primary SQLite store with a best-effort mirror.
pub mod config;
pub mod db;
pub mod error;
pub mod face;
pub mod handlers;
pub mod server;
pub mod validation;
