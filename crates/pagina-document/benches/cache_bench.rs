// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the page cache: a sequential page walk that keeps
// evicting, and repeated hits on a small working set.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::DynamicImage;

use pagina_document::{CacheLimits, PageCache};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Walk 200 pages of 0.5 MB each through a 20-page / 4 MB cache, so most
/// insertions evict or reclaim.
fn bench_sequential_walk(c: &mut Criterion) {
    let page = Arc::new(DynamicImage::new_rgb8(400, 400));
    let limits = CacheLimits {
        max_items: 20,
        max_bytes: 4 * 1024 * 1024,
    };

    c.bench_function("page_cache sequential walk (200 pages)", |b| {
        b.iter(|| {
            let mut cache = PageCache::new(limits);
            for key in 1..=200u32 {
                if cache.get(key).is_none() {
                    cache.put(key, Arc::clone(&page));
                }
            }
            black_box(cache.stats());
        });
    });
}

/// Flip between three pages, the pattern of a viewer paging back and forth.
fn bench_hot_set(c: &mut Criterion) {
    let mut cache = PageCache::new(CacheLimits::default());
    for key in 1..=3u32 {
        cache.put(key, Arc::new(DynamicImage::new_rgb8(400, 400)));
    }

    c.bench_function("page_cache hot set hits", |b| {
        b.iter(|| {
            for key in [1u32, 2, 3, 2] {
                black_box(cache.get(black_box(key)));
            }
        });
    });
}

criterion_group!(benches, bench_sequential_walk, bench_hot_set);
criterion_main!(benches);
