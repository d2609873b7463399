use criterion::{criterion_group, criterion_main, Criterion};
use sixel_writer::{sixel_encode, sixel_encode_rgba, EncodeMode, EncodeOptions, IndexedImage, Palette, Rgb};
use std::hint::black_box;

fn generate_gradient_rgba(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            let b = 128;
            pixels.push(r);
            pixels.push(g);
            pixels.push(b);
            pixels.push(255); // Alpha
        }
    }
    pixels
}

fn generate_indexed(width: usize, height: usize) -> IndexedImage {
    let palette = Palette::new((0..=255u8).map(|i| Rgb::new(i, 255 - i, i / 2)).collect())
        .expect("valid palette");
    let indices = (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x / 4 + y / 3) % 256) as u8))
        .collect();
    let alpha = (0..width * height).map(|i| (i % 256) as u8).collect();
    IndexedImage::new(palette, width, height, indices)
        .and_then(|image| image.with_alpha(alpha))
        .expect("valid image")
}

fn bench_modes(c: &mut Criterion) {
    let image = generate_indexed(600, 450);

    for (name, mode) in [
        ("encode_indexed_600x450_quality", EncodeMode::Quality),
        ("encode_indexed_600x450_fast", EncodeMode::Fast),
        ("encode_indexed_600x450_alpha", EncodeMode::AlphaThreshold),
    ] {
        let opts = EncodeOptions {
            mode,
            alpha_threshold: 64,
            ..Default::default()
        };
        c.bench_function(name, |b| {
            b.iter(|| {
                let result = sixel_encode(black_box(&image), &opts);
                assert!(result.is_ok());
                result
            })
        });
    }
}

fn bench_encode_small(c: &mut Criterion) {
    let rgba = generate_gradient_rgba(64, 64);
    let opts = EncodeOptions::default();

    c.bench_function("encode_gradient_64x64", |b| {
        b.iter(|| {
            let result = sixel_encode_rgba(black_box(&rgba), 64, 64, &opts);
            assert!(result.is_ok());
            result
        })
    });
}

fn bench_encode_medium(c: &mut Criterion) {
    let rgba = generate_gradient_rgba(200, 200);
    let opts = EncodeOptions {
        mode: EncodeMode::Fast,
        ..Default::default()
    };

    c.bench_function("encode_gradient_200x200_fast", |b| {
        b.iter(|| {
            let result = sixel_encode_rgba(black_box(&rgba), 200, 200, &opts);
            assert!(result.is_ok());
            result
        })
    });
}

criterion_group!(benches, bench_modes, bench_encode_small, bench_encode_medium);
criterion_main!(benches);
