//! Document meta record

/// Document-level properties maintained by the statistics rebuild
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaData {
    /// Number of pre-order positions
    pub size: u32,
    /// Deepest element nesting (structural height)
    pub height: u32,
    /// Statistics are stale and must be rebuilt before use
    pub dirty: bool,
}
