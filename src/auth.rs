//! Access-token model, the in-memory token holder, and the external auth-store contract.

pub mod holder;
pub mod store;
pub mod token;

pub use holder::*;
pub use store::*;
pub use token::*;
