use serde::{Deserialize, Serialize};

/// Ordinal day number (proleptic Gregorian, day 1 = 0001-01-01)
pub type Ordinal = i64;

/// Land-cover class code as written to 8-bit rasters
pub type ClassCode = u8;

/// Number of land-cover classes carried by every classification record
pub const CLASS_COUNT: usize = 9;

/// Number of spectral bands carried by every CCD segment
pub const BAND_COUNT: usize = 7;

/// Chip edge length in pixels
pub const CHIP_SIZE: usize = 100;

/// Chip pixel resolution in projection units (meters)
pub const PIXEL_RESOLUTION: f64 = 30.0;

/// Geospatial transformation parameters (GDAL ordering)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Standard north-up chip transform anchored at the chip's upper-left corner
    pub fn chip(ul_x: f64, ul_y: f64) -> Self {
        Self {
            top_left_x: ul_x,
            pixel_width: PIXEL_RESOLUTION,
            rotation_x: 0.0,
            top_left_y: ul_y,
            rotation_y: 0.0,
            pixel_height: -PIXEL_RESOLUTION,
        }
    }

    /// Build from a GDAL-style 6-element array
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// Map coordinate of the upper-left corner of a grid cell
    pub fn cell_origin(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.top_left_x + col as f64 * self.pixel_width,
            self.top_left_y + row as f64 * self.pixel_height,
        )
    }
}

/// Raster grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

impl GridShape {
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

impl Default for GridShape {
    fn default() -> Self {
        Self {
            rows: CHIP_SIZE,
            cols: CHIP_SIZE,
        }
    }
}

/// Error types for product reconstruction
#[derive(Debug, thiserror::Error)]
pub enum MapifyError {
    #[error("Invalid data format: {0}")]
    DataFormat(String),

    #[error(
        "Alignment conflict at row {row}, col {col}: ({first_x:.1}, {first_y:.1}) and ({second_x:.1}, {second_y:.1}) map to the same cell"
    )]
    AlignmentConflict {
        row: usize,
        col: usize,
        first_x: f64,
        first_y: f64,
        second_x: f64,
        second_y: f64,
    },

    #[error("Ordinal {ordinal} falls outside every segment and fallback policy")]
    UnresolvedTemporalState { ordinal: Ordinal },

    #[error("Pixel ({x:.1}, {y:.1}): {source}")]
    Pixel {
        x: f64,
        y: f64,
        #[source]
        source: Box<MapifyError>,
    },

    #[error("Processing cancelled")]
    Cancelled,
}

impl MapifyError {
    /// Attach a pixel's map coordinate to an error
    pub fn at_pixel(self, x: f64, y: f64) -> Self {
        MapifyError::Pixel {
            x,
            y,
            source: Box::new(self),
        }
    }
}

/// Result type for product reconstruction
pub type MapifyResult<T> = Result<T, MapifyError>;
