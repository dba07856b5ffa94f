pub mod base64url;
pub mod canonical;
pub mod digest;
pub mod errors;
pub mod prelude;

pub use canonical::binary::{Canonical, CanonicalWriter};
pub use canonical::{Canonicalizer, JsonCanonicalizer};
pub use digest::{DefaultDigester, Digest, Digester};
pub use errors::CryptoError;
