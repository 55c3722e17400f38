//! Screen benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sumi_terminal::renderer::{BitmapFont, FramebufferRenderer, NullRenderer};
use sumi_terminal::Terminal;

/// A PSF1 font with 256 solid 8x16 glyphs
fn solid_font() -> BitmapFont {
    let mut data = vec![0x36, 0x04, 0x00, 16];
    data.extend(std::iter::repeat(0xAA).take(256 * 16));
    BitmapFont::from_bytes(&data).expect("valid PSF1")
}

fn bench_screen_print(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");
    let input = "Hello, World! ".repeat(100);
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("print_chars", |b| {
        b.iter(|| {
            let mut term = Terminal::new(80, 24, NullRenderer);
            term.feed(black_box(input.as_bytes()));
            black_box(term)
        })
    });

    group.finish();
}

fn bench_screen_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");
    let input: String = (0..100)
        .map(|i| format!("Line {}: Some text content here\n", i))
        .collect();
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("scroll", |b| {
        b.iter(|| {
            let mut term = Terminal::new(80, 24, NullRenderer);
            term.feed(black_box(input.as_bytes()));
            black_box(term)
        })
    });

    group.finish();
}

fn bench_framebuffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");
    let input = "\x1b[H\x1b[2J\x1b[1;31mHello\x1b[0m world\r\n".repeat(50);
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("framebuffer_render", |b| {
        b.iter(|| {
            let renderer = FramebufferRenderer::new(solid_font(), 80, 24);
            let mut term = Terminal::new(80, 24, renderer);
            term.feed(black_box(input.as_bytes()));
            term.present();
            black_box(term)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_screen_print,
    bench_screen_scroll,
    bench_framebuffer
);
criterion_main!(benches);
