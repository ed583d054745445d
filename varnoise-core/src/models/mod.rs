pub mod key;
pub mod observation;
pub mod record;
pub mod sample;

// re-export for cleaner imports
pub use self::key::VariantKey;
pub use self::observation::Observation;
pub use self::record::AggregateRecord;
pub use self::sample::SampleEntry;
