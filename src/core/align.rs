use crate::io::RawPixelResult;
use crate::types::{GeoTransform, GridShape, MapifyError, MapifyResult};
use std::collections::HashMap;

/// One cell of an aligned chip grid
#[derive(Debug, Clone, PartialEq)]
pub enum GridCell<'a> {
    /// No CCD result was supplied for this cell
    NoData,
    /// CCD result for this cell; its segment list may be empty
    Modeled(&'a RawPixelResult),
}

impl<'a> GridCell<'a> {
    pub fn result(&self) -> Option<&'a RawPixelResult> {
        match self {
            GridCell::NoData => None,
            GridCell::Modeled(result) => Some(result),
        }
    }
}

/// Grid position of a map coordinate, truncating toward zero
pub fn grid_index(x: f64, y: f64, affine: &GeoTransform, shape: GridShape) -> MapifyResult<(usize, usize)> {
    if affine.pixel_width == 0.0 || affine.pixel_height == 0.0 {
        return Err(MapifyError::DataFormat(format!(
            "Degenerate transform: pixel size {} x {}",
            affine.pixel_width, affine.pixel_height
        )));
    }

    let col = ((x - affine.top_left_x) / affine.pixel_width).trunc();
    let row = ((y - affine.top_left_y) / affine.pixel_height).trunc();

    if !(0.0..shape.cols as f64).contains(&col) || !(0.0..shape.rows as f64).contains(&row) {
        return Err(MapifyError::DataFormat(format!(
            "Pixel ({:.1}, {:.1}) falls outside the {}x{} grid",
            x, y, shape.rows, shape.cols
        )));
    }

    Ok((row as usize, col as usize))
}

/// Caller-owned memo of coordinate → grid index lookups for one batch run
#[derive(Debug, Default)]
pub struct GridIndexCache {
    entries: HashMap<CacheKey, (usize, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    x: u64,
    y: u64,
    affine: [u64; 6],
    shape: (usize, usize),
}

impl CacheKey {
    fn new(x: f64, y: f64, affine: &GeoTransform, shape: GridShape) -> Self {
        Self {
            x: x.to_bits(),
            y: y.to_bits(),
            affine: affine.to_gdal().map(f64::to_bits),
            shape: shape.dim(),
        }
    }
}

impl GridIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn grid_index(
        &mut self,
        x: f64,
        y: f64,
        affine: &GeoTransform,
        shape: GridShape,
    ) -> MapifyResult<(usize, usize)> {
        let key = CacheKey::new(x, y, affine, shape);
        if let Some(&index) = self.entries.get(&key) {
            return Ok(index);
        }
        let index = grid_index(x, y, affine, shape)?;
        self.entries.insert(key, index);
        Ok(index)
    }
}

/// Place unordered pixel results into row-major grid order
pub fn align_to_grid<'a>(
    raw_pixel_results: &'a [RawPixelResult],
    affine: &GeoTransform,
    shape: GridShape,
) -> MapifyResult<Vec<GridCell<'a>>> {
    align_with(raw_pixel_results, shape, |x, y| grid_index(x, y, affine, shape))
}

/// [`align_to_grid`] reusing a caller-owned index cache
pub fn align_to_grid_cached<'a>(
    raw_pixel_results: &'a [RawPixelResult],
    affine: &GeoTransform,
    shape: GridShape,
    cache: &mut GridIndexCache,
) -> MapifyResult<Vec<GridCell<'a>>> {
    align_with(raw_pixel_results, shape, |x, y| cache.grid_index(x, y, affine, shape))
}

fn align_with<'a, F>(
    raw_pixel_results: &'a [RawPixelResult],
    shape: GridShape,
    mut locate: F,
) -> MapifyResult<Vec<GridCell<'a>>>
where
    F: FnMut(f64, f64) -> MapifyResult<(usize, usize)>,
{
    log::debug!(
        "Aligning {} pixel results to a {}x{} grid",
        raw_pixel_results.len(),
        shape.rows,
        shape.cols
    );

    let mut grid = vec![GridCell::NoData; shape.len()];
    for result in raw_pixel_results {
        let (row, col) = locate(result.x, result.y)?;
        let cell = &mut grid[row * shape.cols + col];
        if let GridCell::Modeled(existing) = cell {
            return Err(MapifyError::AlignmentConflict {
                row,
                col,
                first_x: existing.x,
                first_y: existing.y,
                second_x: result.x,
                second_y: result.y,
            });
        }
        *cell = GridCell::Modeled(result);
    }

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(x: f64, y: f64) -> RawPixelResult {
        RawPixelResult {
            x,
            y,
            change_models: Vec::new(),
        }
    }

    #[test]
    fn test_grid_index_uses_affine_inverse() {
        let affine = GeoTransform::chip(1000.0, 2000.0);
        let shape = GridShape::default();
        assert_eq!(grid_index(1000.0, 2000.0, &affine, shape).unwrap(), (0, 0));
        assert_eq!(grid_index(1075.0, 1910.0, &affine, shape).unwrap(), (3, 2));
        assert_eq!(grid_index(3985.0, -985.0, &affine, shape).unwrap(), (99, 99));
        assert!(grid_index(4000.0, 2000.0, &affine, shape).is_err());
        assert!(grid_index(1000.0, 2030.0, &affine, shape).is_err());
    }

    #[test]
    fn test_align_places_results_row_major() {
        let affine = GeoTransform::chip(0.0, 0.0);
        let shape = GridShape { rows: 3, cols: 3 };
        let pixels = vec![pixel(60.0, -30.0), pixel(0.0, 0.0)];
        let grid = align_to_grid(&pixels, &affine, shape).unwrap();
        assert_eq!(grid.len(), 9);
        assert_eq!(grid[0].result().unwrap().x, 0.0);
        assert_eq!(grid[5].result().unwrap().x, 60.0);
        assert_eq!(grid[1], GridCell::NoData);
    }

    #[test]
    fn test_duplicate_cell_is_reported() {
        let affine = GeoTransform::chip(0.0, 0.0);
        let shape = GridShape { rows: 2, cols: 2 };
        let pixels = vec![pixel(0.0, 0.0), pixel(10.0, -10.0)];
        let err = align_to_grid(&pixels, &affine, shape).unwrap_err();
        assert!(matches!(err, MapifyError::AlignmentConflict { row: 0, col: 0, .. }));
    }

    #[test]
    fn test_cache_reuses_lookups() {
        let affine = GeoTransform::chip(0.0, 0.0);
        let shape = GridShape { rows: 2, cols: 2 };
        let pixels = vec![pixel(0.0, 0.0), pixel(30.0, -30.0)];
        let mut cache = GridIndexCache::new();
        align_to_grid_cached(&pixels, &affine, shape, &mut cache).unwrap();
        assert_eq!(cache.len(), 2);
        let grid = align_to_grid_cached(&pixels, &affine, shape, &mut cache).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(grid[3].result().is_some());
    }
}
