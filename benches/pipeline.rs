use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use table_remap::data::Value;
use table_remap::pipeline;
use table_remap::rules::SessionState;
use table_remap::table::{Column, Dtype, SemanticType, Table};

fn generate_survey(rows: usize) -> Table {
    let pref_cd = Column::new(
        "pref_cd",
        Dtype::Integer,
        (0..rows)
            .map(|i| Some(Value::Integer((i % 47 + 1) as i64)))
            .collect(),
    );
    let age = Column::new(
        "age",
        Dtype::Integer,
        (0..rows)
            .map(|i| {
                if i % 13 == 0 {
                    None
                } else {
                    Some(Value::Integer((i % 80) as i64))
                }
            })
            .collect(),
    );
    let memo = Column::new(
        "memo",
        Dtype::Text,
        (0..rows)
            .map(|i| Some(Value::Text(format!("note-{}", i % 211))))
            .collect(),
    );
    Table {
        columns: vec![pref_cd, age, memo],
    }
}

fn bench_pipeline(c: &mut Criterion) {
    let table = generate_survey(50_000);

    let mut state = SessionState::new();
    state.add_rename("pref_cd", "prefecture");
    state.add_value_rule("prefecture", "13", "東京都", SemanticType::Factor);
    state.add_value_rule("prefecture", "14", "神奈川県", SemanticType::Factor);
    state.add_value_rule("age", "0", "1", SemanticType::Int);

    let mut group = c.benchmark_group("remap");
    group.bench_function("substitute_cast_rename_50k", |b| {
        b.iter_batched(
            || (),
            |_| {
                black_box(pipeline::run(&table, &state));
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
