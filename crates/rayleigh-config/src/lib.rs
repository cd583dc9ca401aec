pub mod client;
pub mod credentials;
pub mod loader;

pub use client::{ClientConfig, DEFAULT_APP_ID, DEFAULT_ENDPOINT};
pub use credentials::{decode_credentials, Credentials, CredentialsError};
pub use loader::ConfigLoader;
