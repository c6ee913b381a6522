use std::convert::Infallible;

/// Errors raised while encoding or decoding a [`crate::record::Record`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("decode record: {0}")]
    Decode(#[from] minicbor::decode::Error),

    #[error("encode record: {0}")]
    Encode(#[from] minicbor::encode::Error<Infallible>),
}
