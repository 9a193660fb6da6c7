//! OAuth 2.0 authorization endpoint.
//!
//! - [`request`] - Parsed authorization requests and raw form values
//! - [`response`] - Fragment-encoded authorization responses
//! - [`handler`] - The grant handler trait and the handler chain
//! - [`implicit`] - The plain implicit grant (`response_type=token`)

pub mod handler;
pub mod implicit;
pub mod request;
pub mod response;

pub use handler::{AuthorizeEndpointHandler, AuthorizeHandlerChain};
pub use implicit::ImplicitGrantHandler;
pub use request::{AuthorizeRequest, Form};
pub use response::{AuthorizeResponse, Fragment};
