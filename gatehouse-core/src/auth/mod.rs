//! Signing backend and key material
//!
//! - Ed25519 key pairs and authority seal/sign keys
//! - The `Authority` capability the authority server signs through
//! - `NativeAuthority`, which issues JWT certificates signed with Ed25519

pub mod authority;
pub mod cert;
pub mod keys;

pub use authority::*;
pub use cert::*;
pub use keys::*;
