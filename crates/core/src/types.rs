/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque, client-minted identifier of a generated artifact.
pub type ArtifactId = String;
