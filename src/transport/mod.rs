//! HTTP transport shared by the API services.
//!
//! The services never talk to the network directly. They hand a method, a
//! path (with its query string already built) and an optional JSON body to a
//! [`Transport`], which authenticates the call and returns the decoded JSON
//! value.
//!
//! - [`Transport`] - the trait the services depend on
//! - [`HttpTransport`] - `reqwest` implementation with OAuth token handling

mod http;
mod traits;

pub use http::{Credentials, HttpTransport};
pub use reqwest::Method;
pub use traits::{decode, encode, ApiError, Result, Transport};

#[cfg(test)]
pub use traits::MockTransport;
