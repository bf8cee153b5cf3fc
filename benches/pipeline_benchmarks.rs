//! Performance benchmarks for the Mica pipeline.
//!
//! - Phases: parsing, analysis and code generation of the same scripts
//! - Execution: running compiled programs on the VM

use bumpalo::Bump;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use mica::Driver;
use mica_compiler::{BytecodeBackend, analyze, generate};
use mica_parser::Parser;
use std::hint::black_box;

/// A program with `methods` small methods, each called once from `main`.
fn generated_program(methods: usize) -> String {
    let mut source = String::new();
    for i in 0..methods {
        source.push_str(&format!(
            "int step{i}(int n) {{ int acc; acc = n; \
             for (int k = 0; k < 4; k = k + 1) {{ \
             if (acc % 2 == 0) {{ acc = acc / 2; }} else {{ acc = acc * 3 + 1; }} }} \
             return acc; }}\n"
        ));
    }
    source.push_str("void main() { int total; total = 0;\n");
    for i in 0..methods {
        source.push_str(&format!("total = total + step{i}({i});\n"));
    }
    source.push_str("write(total); }\n");
    source
}

/// Benchmark each compilation phase on its own
fn phase_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/phases");

    for (name, source) in [
        ("classes", include_str!("../test_scripts/classes.mica").to_string()),
        ("generated_200", generated_program(200)),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));

        group.bench_function(format!("parse/{name}"), |b| {
            b.iter(|| {
                let arena = Bump::new();
                let program = Parser::parse(black_box(&source), &arena).unwrap();
                black_box(program.items().len())
            });
        });

        group.bench_function(format!("analyze/{name}"), |b| {
            let arena = Bump::new();
            let program = Parser::parse(&source, &arena).unwrap();
            b.iter(|| black_box(analyze(black_box(&program)).is_ok()));
        });

        group.bench_function(format!("generate/{name}"), |b| {
            let arena = Bump::new();
            let program = Parser::parse(&source, &arena).unwrap();
            let analysis = analyze(&program);
            b.iter(|| {
                let module =
                    generate(&program, &analysis, BytecodeBackend::default(), None).unwrap();
                black_box(module.functions.len())
            });
        });
    }

    group.finish();
}

/// Benchmark running compiled programs
fn execution_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/execution");
    let driver = Driver::default();

    let recursion = driver
        .compile_source(include_str!("../test_scripts/recursion.mica"))
        .unwrap();
    group.bench_function("fibonacci", |b| {
        b.iter(|| black_box(driver.run(&recursion.module, "".as_bytes()).stdout.len()));
    });

    let allocation = driver
        .compile_source(
            "class Node { int v; Node next; }
             void main() { Node head; int i; i = 0;
               while (i < 2000) {
                 Node n; n = new Node(); n.v = i; n.next = head; head = n; i = i + 1;
               }
               write(head.v); }",
        )
        .unwrap();
    group.bench_function("linked_list_2000", |b| {
        b.iter(|| black_box(driver.run(&allocation.module, "".as_bytes()).exit_code));
    });

    group.finish();
}

criterion_group!(benches, phase_benchmarks, execution_benchmarks);
criterion_main!(benches);
