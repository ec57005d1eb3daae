//! Benchmarks for highlighting and the edit paths that re-highlight.
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use scribe_buffer::{Matcher, TextBuffer};
use scribe_core::EditorSession;
use scribe_syntax::{Highlighter, LanguageTag};

/// Generates a Python-looking source file.
fn generate_large_text(lines: usize) -> String {
    (0..lines)
        .map(|i| match i % 4 {
            0 => format!("def handler_{i}(value):\n"),
            1 => format!("    name = \"item {i}\"  # label\n"),
            2 => format!("    if value > {i}:\n"),
            _ => "        return None\n".to_string(),
        })
        .collect()
}

/// Benchmarks highlighting a whole document one block at a time.
fn bench_highlight(c: &mut Criterion) {
    let mut group = c.benchmark_group("highlight");

    for size in [100, 1000, 10000].iter() {
        let text = generate_large_text(*size);
        let highlighter = Highlighter::new(LanguageTag::Python);

        group.bench_with_input(BenchmarkId::new("python_blocks", size), &text, |b, text| {
            b.iter(|| {
                let spans: usize = text
                    .lines()
                    .map(|block| highlighter.highlight(black_box(block)).len())
                    .sum();
                black_box(spans)
            })
        });
    }

    group.finish();
}

/// Benchmarks typing into a session, which re-highlights the touched block.
fn bench_session_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_edits");

    let base_text = generate_large_text(10000);

    group.bench_function("type_one_char", |b| {
        b.iter_with_setup(
            || {
                let mut session = EditorSession::new();
                session.insert_text(&base_text).unwrap();
                session
            },
            |mut session| {
                session.insert_text(black_box("x")).unwrap();
                black_box(session)
            },
        )
    });

    group.bench_function("newline_with_indent", |b| {
        b.iter_with_setup(
            || {
                let mut session = EditorSession::new();
                session.insert_text(&base_text).unwrap();
                session
            },
            |mut session| {
                session.insert_newline(true).unwrap();
                black_box(session)
            },
        )
    });

    group.finish();
}

/// Benchmarks literal search and replace over the buffer.
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    let text = generate_large_text(10000);
    let buffer = TextBuffer::from(text.as_str());

    for case_sensitive in [true, false] {
        let matcher = Matcher::new("value", case_sensitive).unwrap();

        group.bench_with_input(
            BenchmarkId::new("find_from_middle", case_sensitive),
            &matcher,
            |b, matcher| {
                let mid = buffer.len_chars() / 2;
                b.iter(|| black_box(buffer.find(matcher, black_box(mid))))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("replace_all", case_sensitive),
            &matcher,
            |b, matcher| {
                b.iter_with_setup(
                    || TextBuffer::from(text.as_str()),
                    |mut buffer| {
                        let count = buffer.replace_all(matcher, black_box("amount")).unwrap();
                        black_box((buffer, count))
                    },
                )
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_highlight, bench_session_edits, bench_search);

criterion_main!(benches);
