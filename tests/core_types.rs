use hudmatch::{
    HudMatchError, ImageView, Interpolation, OwnedImage, StoreConfig, TemplatePlan,
    TemplateSource, TemplateStore,
};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        HudMatchError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = ImageView::from_slice(&data, 1, 0).err().unwrap();
    assert_eq!(
        err,
        HudMatchError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        HudMatchError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, HudMatchError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn owned_image_requires_exact_length() {
    assert_eq!(
        OwnedImage::new(vec![0u8; 5], 2, 2).err().unwrap(),
        HudMatchError::InvalidDimensions {
            width: 2,
            height: 2,
        }
    );
    assert_eq!(
        OwnedImage::new(Vec::new(), 0, 0).err().unwrap(),
        HudMatchError::InvalidDimensions {
            width: 0,
            height: 0,
        }
    );
}

#[test]
fn template_plan_matches_known_stats() {
    let tpl = OwnedImage::new(vec![0u8, 1, 2, 3], 2, 2).unwrap();
    let plan = TemplatePlan::from_view(tpl.view()).unwrap();

    assert_eq!(plan.width(), 2);
    assert_eq!(plan.height(), 2);
    assert!((plan.mean() - 1.5).abs() < 1e-12);
    assert!((plan.var_t() - 5.0).abs() < 1e-12);

    let expected_zero_mean = [-1.5f64, -0.5, 0.5, 1.5];
    for (value, expected) in plan.zero_mean().iter().zip(expected_zero_mean.iter()) {
        assert!((value - expected).abs() < 1e-12);
    }
}

#[test]
fn store_builds_default_shrink_variant() {
    let data: Vec<u8> = (0..40 * 20).map(|v| (v % 251) as u8).collect();
    let store = TemplateStore::load(
        vec![TemplateSource::new(
            "ammo",
            OwnedImage::new(data, 40, 20).unwrap(),
        )],
        StoreConfig::default(),
    )
    .unwrap();

    assert_eq!(store.len(), 1);
    let tpl = store.get("ammo").unwrap();
    let sizes: Vec<(f32, usize, usize)> = tpl
        .variants()
        .iter()
        .map(|v| (v.scale(), v.image().width(), v.image().height()))
        .collect();
    assert_eq!(sizes, vec![(1.0, 40, 20), (0.75, 30, 15)]);
    assert_eq!(store.config().interpolation, Interpolation::Bilinear);
}

#[test]
fn store_rejects_empty_template_source() {
    let err = TemplateStore::load(
        vec![TemplateSource::failed(
            "blank",
            HudMatchError::load("templates/blank.png", "image is empty"),
        )],
        StoreConfig::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        HudMatchError::load("templates/blank.png", "image is empty")
    );
}
