use criterion::{criterion_group, criterion_main, Criterion};
use pocheck::pofile;

fn sample_po(entries: usize) -> String {
    let mut content = String::from(
        "msgid \"\"\nmsgstr \"\"\n\"Project-Id-Version: bench\\n\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n\n",
    );
    for i in 0..entries {
        content.push_str(&format!(
            "#: src/main.c:{line}\nmsgid \"Message number {i}\"\nmsgstr \"Mensaje numero {i}\"\n\n",
            line = i * 3 + 1,
        ));
    }
    content
}

fn bench_parse(c: &mut Criterion) {
    let small = sample_po(50);
    let large = sample_po(2000);

    let mut group = c.benchmark_group("catalog_parse");
    group.bench_function("50_entries", |b| b.iter(|| pofile(&small).unwrap()));
    group.bench_function("2000_entries", |b| b.iter(|| pofile(&large).unwrap()));
    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
