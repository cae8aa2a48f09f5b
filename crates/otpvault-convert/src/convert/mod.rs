//! Convert crate: sub-modules.

pub mod converter;
pub mod totp_authenticator;
