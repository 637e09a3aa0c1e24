// Preprocessing and decoding benchmark for the line recognizer
//
// Run with: cargo bench -p line-ocr --bench preprocessing_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, ImageBuffer, Rgb};
use line_ocr::preprocess::{normalize_image, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use line_ocr::{greedy_decode, Tokenizer};
use ndarray::Array2;

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_image");

    // Narrow (padded), exact, and overwide (squeezed) lines
    let sizes = vec![(300, 48, "300x48"), (1280, 64, "1280x64"), (4000, 80, "4000x80")];

    for (width, height, name) in sizes {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                ((x + y) % 256) as u8,
                ((x * 2) % 256) as u8,
                ((y * 2) % 256) as u8,
            ])
        }));

        group.bench_with_input(BenchmarkId::new("line", name), &image, |b, img| {
            b.iter(|| {
                let tensor = normalize_image(black_box(img), DEFAULT_HEIGHT, DEFAULT_WIDTH);
                black_box(tensor);
            });
        });
    }

    group.finish();
}

fn bench_greedy_decode(c: &mut Criterion) {
    let vocab: String = (0..1000)
        .map(|i| format!("\"t{i}\": {i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let tokenizer = Tokenizer::from_json_str(&format!("{{{vocab}}}"), "<unk>").unwrap();
    let classes = tokenizer.num_classes();

    let logits = Array2::from_shape_fn((160, classes), |(t, k)| ((t * 31 + k * 17) % 97) as f32);

    c.bench_function("greedy_decode_160x1003", |b| {
        b.iter(|| black_box(greedy_decode(black_box(logits.view()), &tokenizer)));
    });
}

criterion_group!(benches, bench_normalize, bench_greedy_decode);
criterion_main!(benches);
