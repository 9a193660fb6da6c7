//! OpenID Connect on top of the OAuth 2.0 authorization endpoint.

pub mod helper;
pub mod implicit;
pub mod session;

pub use helper::{IdTokenHelper, PreparedIdToken, access_token_hash};
pub use implicit::OpenIdConnectImplicitHandler;
pub use session::Session;
