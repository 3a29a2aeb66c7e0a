use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use hudmatch::{
    CanonicalConfig, Detector, DetectorConfig, ImageSource, Interpolation, MatchEngine,
    OwnedImage, ScoreMethod, SearchImage, StoreConfig, TemplatePlan, TemplateSource,
    TemplateStore,
};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> OwnedImage {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    OwnedImage::new(data, width, height).unwrap()
}

fn bench_engine(c: &mut Criterion) {
    let image = make_image(320, 240);
    let tpl = image.view().window(120, 100, 32, 32).unwrap().to_owned_image();
    let plan = TemplatePlan::from_view(tpl.view()).unwrap();

    for (name, method) in [
        ("score_map_direct", ScoreMethod::Direct),
        ("score_map_sum_table", ScoreMethod::SumTable),
    ] {
        let engine = MatchEngine::new(method);
        c.bench_function(name, |b| {
            b.iter(|| {
                let search = SearchImage::new(image.view());
                black_box(engine.best(&search, &plan).unwrap())
            });
        });
    }
}

fn bench_detector(c: &mut Criterion) {
    let screen = make_image(640, 360);
    let store = TemplateStore::load(
        (0..4).map(|idx| {
            TemplateSource::new(
                format!("marker{idx}"),
                screen
                    .view()
                    .window(40 + idx * 120, 60 + idx * 50, 24, 24)
                    .unwrap()
                    .to_owned_image(),
            )
        }),
        StoreConfig::default(),
    )
    .unwrap();
    let det = Detector::new(
        Arc::new(store),
        CanonicalConfig {
            width: 640,
            height: 360,
            interpolation: Interpolation::Bilinear,
        },
        DetectorConfig {
            parallel: false,
            ..DetectorConfig::default()
        },
    )
    .unwrap();

    c.bench_function("detector_run_four_templates", |b| {
        b.iter(|| black_box(det.run(vec![ImageSource::new("bench.png", screen.clone())])));
    });
}

criterion_group!(benches, bench_engine, bench_detector);
criterion_main!(benches);
