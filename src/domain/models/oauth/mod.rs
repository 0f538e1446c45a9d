pub mod google_oauth_model;
pub mod provider_user;

pub use provider_user::*;
