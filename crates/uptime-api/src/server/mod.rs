//! Request dispatch for the Uptime service.

mod checks;
pub mod interceptor;
pub mod request;
pub mod router;
mod tokens;
mod users;

#[cfg(test)]
mod router_tests;

pub use interceptor::bearer_token;
pub use request::{ContentKind, Request, Response};
pub use router::{Route, Router, Verb};
