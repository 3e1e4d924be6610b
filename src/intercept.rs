//! Request and response interceptors wrapped around every intercepted send.
//!
//! The request side attaches the bearer header; the response side decides, per request,
//! whether an error is final or earns the single refresh-and-replay.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
