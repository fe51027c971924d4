//! Core product reconstruction modules

pub mod segment;
pub mod unify;
pub mod align;
pub mod temporal;
pub mod products;
pub mod harmonic;
pub mod product;
pub mod nodata_fill;
pub mod chip;

// Re-export main types
pub use segment::{Band, BandModel, Classification, ClassProbs, Segment, sort_models};
pub use unify::{unify, unify_sorted};
pub use align::{align_to_grid, align_to_grid_cached, grid_index, GridCell, GridIndexCache};
pub use temporal::TemporalPosition;
pub use products::{
    change_day_of_year, change_magnitude, from_to, land_cover, land_cover_confidence, model_quality,
    segment_length, time_since_last_break, ConfidenceCodes, LandCoverParams,
};
pub use harmonic::{predict, synthetic_bands, synthetic_select};
pub use product::{Product, ProductParams, ProductValue, RasterDataType};
pub use nodata_fill::{fill_nodata, nlcd_crosswalk, FilledLandCover, NodataFillParams};
pub use chip::{ChipParams, ChipProcessor, ChipProducts, PixelFailure, ProductLayer, ProductRaster};
