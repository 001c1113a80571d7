use criterion::{criterion_group, criterion_main, Criterion};
use pocheck::{match_message, pofile, Message, Rule, TriggerPart};

fn sample_rule() -> Rule {
    Rule::new(
        r"\b(teh|recieve|seperate)\b",
        TriggerPart::Msgstr,
        Some("common misspelling".to_string()),
        vec![],
        false,
        false,
        None,
        false,
        None,
        None,
        None,
    )
}

fn sample_message(clean: bool) -> Message {
    let mut msg = Message::new("A message to translate");
    msg.set_msgstr(vec![if clean {
        "Un mensaje para traducir sin errores".to_string()
    } else {
        "Un mensaje con un error: recieve esto".to_string()
    }]);
    msg
}

fn bench_match(c: &mut Criterion) {
    let cat = pofile("msgid \"\"\nmsgstr \"\"\n\"Project-Id-Version: bench\\n\"\n").unwrap();
    let rule = sample_rule();
    let clean = sample_message(true);
    let dirty = sample_message(false);

    let mut group = c.benchmark_group("rule_match");
    group.bench_function("no_match", |b| {
        b.iter(|| match_message(&rule, &clean, &cat, None, true))
    });
    group.bench_function("with_match", |b| {
        b.iter(|| match_message(&rule, &dirty, &cat, None, true))
    });
    group.finish();
}

criterion_group!(benches, bench_match);
criterion_main!(benches);
