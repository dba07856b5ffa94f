pub use crate::canonical::binary::{Canonical, CanonicalWriter};
pub use crate::canonical::{Canonicalizer, JsonCanonicalizer};
pub use crate::digest::{DefaultDigester, Digest, Digester};
pub use crate::errors::CryptoError;
