//! # Input/Output utilities for varnoise.
//!
//! Reading per-sample observations out of gVCF files ([`GvcfSource`]) and
//! writing the aggregated database back out as a VCF whose INFO column carries
//! the per-position statistics ([`VcfWrite`]).
//!
pub mod error;
pub mod export;
pub mod gvcf;
pub mod utils;

// re-expose core functions
pub use error::*;
pub use export::*;
pub use gvcf::*;
