use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tagz::context::Context;
use tagz::script::Engine;

const NAMING: &str = "$if2(%albumartist%,%artist%)/%album%/\
                      $if($gt(%totaldiscs%,1),$num(%discnumber%,1)-)$num(%tracknumber%,2) %title%";

fn make_context() -> Context {
    [
        ("artist", "The Beatles"),
        ("album", "Abbey Road"),
        ("title", "Come Together"),
        ("tracknumber", "1"),
        ("discnumber", "1"),
        ("totaldiscs", "1"),
    ]
    .into_iter()
    .collect()
}

fn nested(depth: usize) -> String {
    format!("{}x{}", "$noop(".repeat(depth), ")".repeat(depth))
}

fn bench_eval(c: &mut Criterion) {
    let engine = Engine::new();
    let mut ctx = make_context();
    let plain = "The quick brown FOX jumps over the lazy dog. ".repeat(100);
    let deep = nested(30);

    let mut g = c.benchmark_group("evaluate");

    g.bench_function("plain_text", |b| {
        b.iter(|| engine.evaluate(black_box(&plain), &mut ctx))
    });
    g.bench_function("file_naming", |b| {
        b.iter(|| engine.evaluate(black_box(NAMING), &mut ctx))
    });
    g.bench_function("nested_30", |b| {
        b.iter(|| engine.evaluate(black_box(&deep), &mut ctx))
    });
    g.bench_function("rreplace", |b| {
        b.iter(|| engine.evaluate(black_box(r"$rreplace(%artist%,^The (.*),\1)"), &mut ctx))
    });

    g.finish();
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);
