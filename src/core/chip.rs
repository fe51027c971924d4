use crate::core::align::{align_to_grid_cached, GridCell, GridIndexCache};
use crate::core::product::{Product, ProductParams, ProductValue, RasterDataType};
use crate::core::segment::Segment;
use crate::core::unify::unify_sorted;
use crate::io::{RawChip, RawClassRecord};
use crate::types::{GeoTransform, GridShape, MapifyError, MapifyResult, Ordinal, BAND_COUNT};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Parameters for chip product generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChipParams {
    /// Products to compute, each for every ordinal
    pub products: Vec<Product>,
    /// Query dates
    pub ordinals: Vec<Ordinal>,
    pub shape: GridShape,
    pub product_params: ProductParams,
}

impl Default for ChipParams {
    fn default() -> Self {
        Self {
            products: Product::ALL.to_vec(),
            ordinals: Vec::new(),
            shape: GridShape::default(),
            product_params: ProductParams::default(),
        }
    }
}

/// In-memory raster for one product layer
#[derive(Debug, Clone, PartialEq)]
pub enum ProductRaster {
    Byte(Array2<u8>),
    UInt16(Array2<u16>),
    Float32(Array2<f32>),
    /// (band, row, col)
    Bands(Array3<u16>),
}

impl ProductRaster {
    fn for_product(product: Product, shape: GridShape) -> Self {
        let dim = shape.dim();
        match (product.data_type(), product.band_count()) {
            (RasterDataType::UInt16, n) if n > 1 => ProductRaster::Bands(Array3::zeros((n, dim.0, dim.1))),
            (RasterDataType::Byte, _) => ProductRaster::Byte(Array2::zeros(dim)),
            (RasterDataType::UInt16, _) => ProductRaster::UInt16(Array2::zeros(dim)),
            (RasterDataType::Float32, _) => ProductRaster::Float32(Array2::zeros(dim)),
        }
    }

    fn set(&mut self, row: usize, col: usize, value: ProductValue) -> MapifyResult<()> {
        match (self, value) {
            (ProductRaster::Byte(a), ProductValue::Byte(v)) => a[[row, col]] = v,
            (ProductRaster::UInt16(a), ProductValue::UInt16(v)) => a[[row, col]] = v,
            (ProductRaster::Float32(a), ProductValue::Float32(v)) => a[[row, col]] = v,
            (ProductRaster::Bands(a), ProductValue::Bands(values)) => {
                for (band, v) in values.iter().enumerate().take(BAND_COUNT) {
                    a[[band, row, col]] = *v;
                }
            }
            (raster, value) => {
                return Err(MapifyError::DataFormat(format!(
                    "Value {:?} does not match raster type {}",
                    value,
                    raster.type_name()
                )))
            }
        }
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        match self {
            ProductRaster::Byte(_) => "Byte",
            ProductRaster::UInt16(_) => "UInt16",
            ProductRaster::Float32(_) => "Float32",
            ProductRaster::Bands(_) => "UInt16 bands",
        }
    }
}

/// One product on one date
#[derive(Debug, Clone)]
pub struct ProductLayer {
    pub product: Product,
    pub ordinal: Ordinal,
    pub raster: ProductRaster,
}

/// A pixel whose products could not be computed
#[derive(Debug)]
pub struct PixelFailure {
    pub row: usize,
    pub col: usize,
    pub error: MapifyError,
}

/// All product layers for a chip
#[derive(Debug)]
pub struct ChipProducts {
    pub geo_transform: GeoTransform,
    pub layers: Vec<ProductLayer>,
    pub failures: Vec<PixelFailure>,
}

impl ChipProducts {
    pub fn layer(&self, product: Product, ordinal: Ordinal) -> Option<&ProductRaster> {
        self.layers
            .iter()
            .find(|l| l.product == product && l.ordinal == ordinal)
            .map(|l| &l.raster)
    }
}

/// Chip-level product generator
pub struct ChipProcessor {
    params: ChipParams,
    cancel: Option<Arc<AtomicBool>>,
}

impl ChipProcessor {
    pub fn new(params: ChipParams) -> Self {
        Self { params, cancel: None }
    }

    /// Stop between pixels once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn params(&self) -> &ChipParams {
        &self.params
    }

    /// Sorted pixel histories in row-major order; per-pixel errors are kept
    /// alongside the successful histories
    pub fn histories(
        &self,
        chip: &RawChip,
        class_grid: &[Vec<RawClassRecord>],
    ) -> MapifyResult<Vec<MapifyResult<Vec<Segment>>>> {
        let mut cache = GridIndexCache::new();
        let (affine, grid) = self.prepare(chip, class_grid, &mut cache)?;
        Ok(grid
            .iter()
            .enumerate()
            .map(|(index, cell)| self.history(&affine, index, cell, class_grid))
            .collect())
    }

    /// Compute every requested product for every requested date
    pub fn process(&self, chip: &RawChip, class_grid: &[Vec<RawClassRecord>]) -> MapifyResult<ChipProducts> {
        let mut cache = GridIndexCache::new();
        self.process_cached(chip, class_grid, &mut cache)
    }

    /// [`ChipProcessor::process`] with a caller-owned index cache
    pub fn process_cached(
        &self,
        chip: &RawChip,
        class_grid: &[Vec<RawClassRecord>],
        cache: &mut GridIndexCache,
    ) -> MapifyResult<ChipProducts> {
        log::info!(
            "Processing chip ({}, {}): {} products x {} dates",
            chip.cx,
            chip.cy,
            self.params.products.len(),
            self.params.ordinals.len()
        );

        let (affine, grid) = self.prepare(chip, class_grid, cache)?;
        let shape = self.params.shape;

        let compute = |(index, cell): (usize, &GridCell)| -> MapifyResult<Vec<ProductValue>> {
            if self.is_cancelled() {
                return Err(MapifyError::Cancelled);
            }
            let models = self.history(&affine, index, cell, class_grid)?;
            self.evaluate_pixel(&models)
                .map_err(|e| self.locate_error(e, &affine, index, cell))
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<MapifyResult<Vec<ProductValue>>> = grid.par_iter().enumerate().map(compute).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<MapifyResult<Vec<ProductValue>>> = grid.iter().enumerate().map(compute).collect();

        if self.is_cancelled() {
            log::warn!("Chip ({}, {}) cancelled", chip.cx, chip.cy);
            return Err(MapifyError::Cancelled);
        }

        let mut layers: Vec<ProductLayer> = self
            .params
            .products
            .iter()
            .flat_map(|&product| {
                self.params.ordinals.iter().map(move |&ordinal| ProductLayer {
                    product,
                    ordinal,
                    raster: ProductRaster::for_product(product, shape),
                })
            })
            .collect();

        let mut failures = Vec::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let (row, col) = (index / shape.cols, index % shape.cols);
            match outcome {
                Ok(values) => {
                    for (layer, value) in layers.iter_mut().zip(values) {
                        layer.raster.set(row, col, value)?;
                    }
                }
                Err(error) => {
                    log::warn!("Skipping pixel row {} col {}: {}", row, col, error);
                    failures.push(PixelFailure { row, col, error });
                }
            }
        }

        log::info!(
            "Chip ({}, {}) complete: {} layers, {} failed pixels",
            chip.cx,
            chip.cy,
            layers.len(),
            failures.len()
        );

        Ok(ChipProducts {
            geo_transform: affine,
            layers,
            failures,
        })
    }

    fn prepare<'a>(
        &self,
        chip: &'a RawChip,
        class_grid: &[Vec<RawClassRecord>],
        cache: &mut GridIndexCache,
    ) -> MapifyResult<(GeoTransform, Vec<GridCell<'a>>)> {
        let shape = self.params.shape;
        if !class_grid.is_empty() && class_grid.len() != shape.len() {
            return Err(MapifyError::DataFormat(format!(
                "Class grid has {} cells, expected {}",
                class_grid.len(),
                shape.len()
            )));
        }

        let affine = GeoTransform::chip(chip.cx, chip.cy);
        let grid = align_to_grid_cached(&chip.pixels, &affine, shape, cache)?;
        log::debug!(
            "Aligned {} of {} cells",
            grid.iter().filter(|c| c.result().is_some()).count(),
            grid.len()
        );
        Ok((affine, grid))
    }

    fn history(
        &self,
        affine: &GeoTransform,
        index: usize,
        cell: &GridCell,
        class_grid: &[Vec<RawClassRecord>],
    ) -> MapifyResult<Vec<Segment>> {
        let Some(result) = cell.result() else {
            return Ok(Vec::new());
        };
        let class_records = class_grid.get(index).map(Vec::as_slice).unwrap_or(&[]);
        unify_sorted(&result.change_models, class_records).map_err(|e| self.locate_error(e, affine, index, cell))
    }

    fn evaluate_pixel(&self, models: &[Segment]) -> MapifyResult<Vec<ProductValue>> {
        let params = &self.params.product_params;
        let mut values = Vec::with_capacity(self.params.products.len() * self.params.ordinals.len());
        for product in &self.params.products {
            for &ordinal in &self.params.ordinals {
                values.push(product.evaluate(models, ordinal, params)?);
            }
        }
        Ok(values)
    }

    fn locate_error(&self, error: MapifyError, affine: &GeoTransform, index: usize, cell: &GridCell) -> MapifyError {
        if matches!(error, MapifyError::Pixel { .. }) {
            return error;
        }
        let (x, y) = match cell.result() {
            Some(result) => (result.x, result.y),
            None => affine.cell_origin(index / self.params.shape.cols, index % self.params.shape.cols),
        };
        error.at_pixel(x, y)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}
