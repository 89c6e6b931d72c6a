pub mod policy;
pub mod token;

pub use policy::{authorize, Decision, Mutation};
pub use token::{Claims, Principal, TokenError, TokenVerifier};
