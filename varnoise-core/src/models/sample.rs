use chrono::{DateTime, Utc};

///
/// Registry entry for one loaded sample.
///
#[derive(PartialEq, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleEntry {
    pub name: String,
    /// Where the sample's observations were read from (gVCF path).
    pub source_path: String,
    pub loaded_at: DateTime<Utc>,
}

impl SampleEntry {
    pub fn new(name: impl Into<String>, source_path: impl Into<String>, loaded_at: DateTime<Utc>) -> Self {
        SampleEntry {
            name: name.into(),
            source_path: source_path.into(),
            loaded_at,
        }
    }
}
