use thiserror::Error;
use verdict_errors::prelude::*;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CryptoError(pub Box<ErrorObj>);

impl CryptoError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn canonical(msg: &str) -> Self {
        Self::from_builder(
            ErrorBuilder::new(codes::SCHEMA_CANONICAL)
                .user_msg("Canonicalisation failed for provided payload.")
                .dev_msg(msg),
        )
    }

    fn from_builder(builder: ErrorBuilder) -> Self {
        CryptoError(Box::new(builder.build()))
    }
}

impl From<ErrorObj> for CryptoError {
    fn from(value: ErrorObj) -> Self {
        CryptoError(Box::new(value))
    }
}
