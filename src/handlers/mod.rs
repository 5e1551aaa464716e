/// HTTP handlers module
/// Provides the REST endpoints for users, login and sales

pub mod auth;
pub mod health;
pub mod reply;
pub mod sales;
pub mod users;

pub use auth::{login, verify_face};
pub use health::health;
pub use sales::register_sale;
pub use users::{
    delete_user, get_user, register_user, update_last_session, update_user, verify_email,
};
