use mapify::core::{fill_nodata, nlcd_crosswalk, NodataFillParams};
use ndarray::Array2;
use std::collections::HashMap;

#[test]
fn test_insufficient_data_pixel_takes_crosswalked_class() {
    let params = NodataFillParams::default();
    let mut lc = Array2::<u8>::from_elem((10, 10), 3);
    lc[[5, 5]] = params.insufficient_data;
    let mut nlcd = Array2::<u8>::from_elem((10, 10), 81);
    nlcd[[5, 5]] = 42;

    let crosswalk: HashMap<u8, u8> = [(42, 4)].into_iter().collect();
    let result = fill_nodata(lc.view(), nlcd.view(), &crosswalk, None, &params).unwrap();

    assert_eq!(result.landcover[[5, 5]], 4);
    assert_eq!(result.landcover[[0, 0]], 3);
    assert_eq!(result.filled, 1);
    assert_eq!(lc[[5, 5]], params.insufficient_data);
}

#[test]
fn test_confidence_marks_filled_pixels() {
    let params = NodataFillParams::default();
    let lc = Array2::<u8>::zeros((4, 4));
    let nlcd = Array2::<u8>::from_elem((4, 4), 11);
    let conf = Array2::<u8>::from_elem((4, 4), 0);

    let result = fill_nodata(lc.view(), nlcd.view(), &nlcd_crosswalk(), Some(conf.view()), &params).unwrap();

    assert!(result.landcover.iter().all(|&v| v == 5));
    let filled_conf = result.confidence.unwrap();
    assert!(filled_conf.iter().all(|&v| v == params.crosswalk_confidence));
    assert!(conf.iter().all(|&v| v == 0));
}

#[test]
fn test_unmapped_values_pass_through() {
    let params = NodataFillParams::default();
    let lc = Array2::<u8>::zeros((1, 1));
    let nlcd = Array2::<u8>::from_elem((1, 1), 250);
    let result = fill_nodata(lc.view(), nlcd.view(), &HashMap::new(), None, &params).unwrap();
    assert_eq!(result.landcover[[0, 0]], 250);
}
