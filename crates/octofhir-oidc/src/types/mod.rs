//! Domain types shared by the authorization handlers.

pub mod arguments;
pub mod client;

pub use arguments::Arguments;
pub use client::{Client, GrantType};
