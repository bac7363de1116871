//! Benchmarks pour la recherche linéaire de parcelles

use std::collections::HashMap;

use catastro::{search, Coordinate, Parcel, ParcelLayer, Projection};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::{polygon, MultiPolygon};

/// Grille de parcelles carrées de 100 m
fn grid(side: usize) -> ParcelLayer {
    let mut parcels = Vec::with_capacity(side * side);
    for row in 0..side {
        for col in 0..side {
            let x0 = 600_000.0 + col as f64 * 100.0;
            let y0 = 4_200_000.0 + row as f64 * 100.0;
            let square = polygon![
                (x: x0, y: y0),
                (x: x0 + 100.0, y: y0),
                (x: x0 + 100.0, y: y0 + 100.0),
                (x: x0, y: y0 + 100.0),
                (x: x0, y: y0),
            ];
            let id = row * side + col;
            parcels.push(Parcel {
                id,
                geometry: MultiPolygon::new(vec![square]),
                properties: HashMap::from([
                    ("MASA".to_string(), row.to_string()),
                    ("PARCELA".to_string(), col.to_string()),
                ]),
            });
        }
    }
    ParcelLayer {
        parcels,
        projection: Projection::default(),
        errors: Vec::new(),
    }
}

fn bench_containing(c: &mut Criterion) {
    let mut group = c.benchmark_group("containing");

    for side in [10usize, 50, 100] {
        let layer = grid(side);
        // Dernière parcelle: pire cas du parcours linéaire
        let last = side as f64 * 100.0 - 50.0;
        let point = Coordinate::new(600_000.0 + last, 4_200_000.0 + last).point();

        group.bench_with_input(BenchmarkId::from_parameter(side * side), &layer, |b, layer| {
            b.iter(|| black_box(search::containing(layer, black_box(&point))))
        });
    }

    group.finish();
}

fn bench_by_ids(c: &mut Criterion) {
    let layer = grid(100);
    c.bench_function("by_ids_10000", |b| {
        b.iter(|| black_box(search::by_ids(&layer, black_box("99"), black_box("99"))))
    });
}

criterion_group!(benches, bench_containing, bench_by_ids);
criterion_main!(benches);
