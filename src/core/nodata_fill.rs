use crate::types::{ClassCode, MapifyError, MapifyResult};
use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for filling unmodeled pixels from an auxiliary land-cover layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodataFillParams {
    /// Land-cover value marking pixels without model coverage
    pub insufficient_data: ClassCode,
    /// Confidence value written where a crosswalked class was substituted
    pub crosswalk_confidence: u8,
}

impl Default for NodataFillParams {
    fn default() -> Self {
        Self {
            insufficient_data: 0,
            crosswalk_confidence: 221,
        }
    }
}

/// Filled land cover plus, when supplied, the matching confidence raster
#[derive(Debug, Clone)]
pub struct FilledLandCover {
    pub landcover: Array2<ClassCode>,
    pub confidence: Option<Array2<u8>>,
    /// Number of pixels taken from the auxiliary layer
    pub filled: usize,
}

/// NLCD Anderson level-II classes mapped onto the product's class space
pub fn nlcd_crosswalk() -> HashMap<u8, ClassCode> {
    [
        (11, 5), // open water
        (12, 7), // perennial ice/snow
        (21, 1),
        (22, 1),
        (23, 1),
        (24, 1), // developed
        (31, 8), // barren
        (41, 4),
        (42, 4),
        (43, 4), // forest
        (51, 3),
        (52, 3),
        (71, 3),
        (72, 3), // shrub and herbaceous
        (81, 2),
        (82, 2), // planted/cultivated
        (90, 6),
        (95, 6), // wetlands
    ]
    .into_iter()
    .collect()
}

/// Replace insufficient-data pixels with crosswalked auxiliary classes.
///
/// Inputs are left untouched; unmapped auxiliary values pass through as-is.
pub fn fill_nodata(
    lc: ArrayView2<ClassCode>,
    nlcd: ArrayView2<u8>,
    crosswalk: &HashMap<u8, ClassCode>,
    confidence: Option<ArrayView2<u8>>,
    params: &NodataFillParams,
) -> MapifyResult<FilledLandCover> {
    if lc.dim() != nlcd.dim() {
        return Err(MapifyError::DataFormat(format!(
            "Land cover {:?} and auxiliary raster {:?} differ in shape",
            lc.dim(),
            nlcd.dim()
        )));
    }
    if let Some(conf) = &confidence {
        if conf.dim() != lc.dim() {
            return Err(MapifyError::DataFormat(format!(
                "Land cover {:?} and confidence {:?} differ in shape",
                lc.dim(),
                conf.dim()
            )));
        }
    }

    let mut landcover = lc.to_owned();
    Zip::from(&mut landcover).and(&nlcd).for_each(|out, &aux| {
        if *out == params.insufficient_data {
            *out = crosswalk.get(&aux).copied().unwrap_or(aux);
        }
    });

    let mask = lc.mapv(|v| v == params.insufficient_data);
    let filled = mask.iter().filter(|&&m| m).count();

    let confidence = confidence.map(|conf| {
        let mut out = conf.to_owned();
        Zip::from(&mut out).and(&mask).for_each(|c, &m| {
            if m {
                *c = params.crosswalk_confidence;
            }
        });
        out
    });

    log::debug!("Filled {} insufficient-data pixels from auxiliary land cover", filled);

    Ok(FilledLandCover {
        landcover,
        confidence,
        filled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_crosswalk_and_passthrough() {
        let lc = array![[0u8, 3], [0, 0]];
        let nlcd = array![[42u8, 42], [11, 99]];
        let result = fill_nodata(lc.view(), nlcd.view(), &nlcd_crosswalk(), None, &NodataFillParams::default()).unwrap();
        assert_eq!(result.landcover, array![[4u8, 3], [5, 99]]);
        assert_eq!(result.filled, 3);
        assert!(result.confidence.is_none());
    }

    #[test]
    fn test_confidence_gets_crosswalk_code() {
        let lc = array![[0u8, 3]];
        let nlcd = array![[42u8, 42]];
        let conf = array![[0u8, 88]];
        let params = NodataFillParams::default();
        let result = fill_nodata(lc.view(), nlcd.view(), &nlcd_crosswalk(), Some(conf.view()), &params).unwrap();
        assert_eq!(result.confidence.unwrap(), array![[params.crosswalk_confidence, 88]]);
        // inputs unchanged
        assert_eq!(lc, array![[0u8, 3]]);
        assert_eq!(conf, array![[0u8, 88]]);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let lc = array![[0u8, 3]];
        let nlcd = array![[42u8], [42]];
        assert!(fill_nodata(lc.view(), nlcd.view(), &nlcd_crosswalk(), None, &NodataFillParams::default()).is_err());
    }
}
