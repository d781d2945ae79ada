use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use trellis::{Blueprint, CompositionEngine, EngineConfig, FamilyRegistry, Logger, NullSink, Role};

fn form(rows: usize) -> Blueprint {
    let rows = (0..rows)
        .map(|row| {
            Blueprint::group(
                format!("row-{row}"),
                vec![
                    Blueprint::labeled(Role::Text, format!("field {row}")),
                    Blueprint::labeled(Role::Button, "Edit"),
                    Blueprint::part(Role::Drawable)
                        .with_prop("shape", json!({"kind": "circle", "radius": 2})),
                ],
            )
        })
        .collect();
    Blueprint::group("form", rows)
}

fn engine_assemble(c: &mut Criterion) {
    let registry = FamilyRegistry::with_presets();
    let engine = CompositionEngine::new(&registry);
    let blueprint = form(64);
    c.bench_function("engine_assemble_form_64", |b| {
        b.iter(|| {
            engine
                .assemble(&"dark".into(), black_box(&blueprint))
                .expect("assemble")
        });
    });
}

fn engine_dispatch(c: &mut Criterion) {
    let registry = FamilyRegistry::with_presets();
    let mut config = EngineConfig::default().with_logger(Logger::new(NullSink));
    config.enable_metrics();
    let engine = CompositionEngine::with_config(&registry, config);
    let tree = engine
        .assemble(&"light".into(), &form(64))
        .expect("assemble");
    for operation in ["apply", "render", "draw"] {
        c.bench_function(&format!("engine_dispatch_{operation}"), |b| {
            b.iter(|| {
                engine
                    .dispatch(black_box(&tree), operation)
                    .expect("dispatch")
            });
        });
    }
}

criterion_group!(benches, engine_assemble, engine_dispatch);
criterion_main!(benches);
