pub mod auth;

pub use auth::{authorize_request, require_principal};
