//! Benchmarks for subtitle conversion
//!
//! Measures SRT to WebVTT conversion on episode-length inputs, with and
//! without the artifacts that need cleaning.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use streamflix_subtitle::{convert, is_webvtt, looks_like_html, parse};

/// An SRT file with `cues` plain two-line cues.
fn clean_srt(cues: usize) -> String {
    let mut out = String::new();
    for i in 0..cues {
        let start = i * 3;
        out.push_str(&format!(
            "{}\r\n00:{:02}:{:02},000 --> 00:{:02}:{:02},500\r\nLine {} of the dialogue\r\nand its continuation\r\n\r\n",
            i + 1,
            start / 60 % 60,
            start % 60,
            (start + 2) / 60 % 60,
            (start + 2) % 60,
            i
        ));
    }
    out
}

/// Like [`clean_srt`], with positioning tags and sprite coordinates mixed in.
fn noisy_srt(cues: usize) -> String {
    let mut out = String::new();
    for i in 0..cues {
        let start = i * 3;
        let line = match i % 3 {
            0 => format!("{{\\an8}}Line {i}"),
            1 => format!("xywh=0,0,120,68 Line {i}"),
            _ => format!("  ==Line {i}==  "),
        };
        out.push_str(&format!(
            "{}\n00:{:02}:{:02},000 --> 00:{:02}:{:02},500\n{}\n\n\n",
            i + 1,
            start / 60 % 60,
            start % 60,
            (start + 2) / 60 % 60,
            (start + 2) % 60,
            line
        ));
    }
    out
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");

    for cues in [50, 400, 1500] {
        let clean = clean_srt(cues);
        group.throughput(Throughput::Bytes(clean.len() as u64));
        group.bench_with_input(BenchmarkId::new("clean", cues), &clean, |b, input| {
            b.iter(|| convert(black_box(input)))
        });

        let noisy = noisy_srt(cues);
        group.throughput(Throughput::Bytes(noisy.len() as u64));
        group.bench_with_input(BenchmarkId::new("noisy", cues), &noisy, |b, input| {
            b.iter(|| convert(black_box(input)))
        });
    }

    group.finish();
}

fn bench_reconvert(c: &mut Criterion) {
    let webvtt = convert(&clean_srt(400));

    c.bench_function("reconvert_webvtt/400", |b| {
        b.iter(|| parse(black_box(&webvtt)).len())
    });
}

fn bench_sniffing(c: &mut Criterion) {
    let mut group = c.benchmark_group("sniff");
    let srt = clean_srt(400);
    let html = format!("<!DOCTYPE html><html><body>{}</body></html>", "x".repeat(50_000));

    group.bench_function("is_webvtt/srt", |b| b.iter(|| is_webvtt(black_box(&srt))));
    group.bench_function("looks_like_html/srt", |b| {
        b.iter(|| looks_like_html(black_box(&srt)))
    });
    group.bench_function("looks_like_html/html", |b| {
        b.iter(|| looks_like_html(black_box(&html)))
    });

    group.finish();
}

criterion_group!(benches, bench_convert, bench_reconvert, bench_sniffing);
criterion_main!(benches);
