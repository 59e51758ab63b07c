pub mod body;
pub mod webhook_signature;

pub use body::{parse_body, BodyKind};
pub use webhook_signature::{sign_payload, verify_signature, SignatureError};
