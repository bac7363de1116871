//! Benchmarks pour la mise en page et le rendu du rapport

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use afecciones::report::{self, pdf, AffectionLine, Applicant, ReportInput};
use afecciones::{Region, RegionConfig};
use catastro::Coordinate;

fn applicant() -> Applicant {
    Applicant {
        nombre: "Ana".into(),
        apellidos: "García López".into(),
        dni: "12345678Z".into(),
        direccion: "Calle Mayor 1, 30620 Fortuna (Murcia), puerta 3, escalera izquierda".into(),
        telefono: "600000000".into(),
        email: "ana@example.org".into(),
        objeto: "Solicitud de informe previo a una repoblación forestal en terreno agrícola abandonado".into(),
    }
}

/// Catalogue de Murcia: une ligne par couche, une sur trois affectée
fn affections(config: &RegionConfig) -> Vec<AffectionLine> {
    config
        .layers
        .iter()
        .enumerate()
        .map(|(i, layer)| AffectionLine {
            name: layer.name.clone(),
            text: if i % 3 == 0 {
                format!("Dentro de {}: zona de prueba {}", layer.name, i)
            } else {
                layer.default_text.clone()
            },
        })
        .collect()
}

fn bench_report(c: &mut Criterion) {
    let Ok(config) = RegionConfig::from_preset(Region::Murcia) else {
        return;
    };
    let applicant = applicant();
    let affections = affections(&config);
    let input = ReportInput {
        date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap_or_default(),
        applicant: &applicant,
        municipality: "FORTUNA",
        masa: "3",
        parcela: "101",
        coordinate: Coordinate::new(660_100.0, 4_230_100.0),
        affections: &affections,
        regulatory_text: &config.regulatory_text,
        regulation_date: &config.regulation_date,
        contact: &config.contact,
        logo: None,
        map_image: None,
    };

    c.bench_function("build_murcia", |b| b.iter(|| black_box(report::build(black_box(&input)))));

    let pages = report::build(&input);
    c.bench_function("render_murcia", |b| {
        b.iter(|| black_box(pdf::render(black_box(&pages), report::TITLE)))
    });
}

criterion_group!(benches, bench_report);
criterion_main!(benches);
