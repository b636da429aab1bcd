mod credential_provider;
mod sigv4;

pub use credential_provider::{AuthError, CredentialProvider, StaticCredentials};
pub use sigv4::{AwsCredentials, SigV4Signer, signing_key};
