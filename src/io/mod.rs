//! Raw record types consumed from the upstream CCD and classification stages

pub mod records;

pub use records::{RawBandModel, RawChangeSegment, RawChip, RawClassRecord, RawPixelResult};
