/// Errors surfaced from config parsing, the HTTP facade, and node lifecycle
/// (§7). Fatal startup errors are converted to `anyhow::Error` at the binary
/// boundary; request-path errors map to HTTP status codes in `http.rs`.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("failed to parse node config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("number_of_regions must be at least 1")]
    InvalidRegionCount,

    #[error("region_id {region_id} is out of range for number_of_regions {number_of_regions}")]
    RegionOutOfRange { region_id: u32, number_of_regions: u32 },

    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Codec(#[from] repl_core::CodecError),

    #[error(transparent)]
    Store(#[from] repl_store::StoreError),

    #[error(transparent)]
    Membership(#[from] repl_membership::MembershipError),
}
