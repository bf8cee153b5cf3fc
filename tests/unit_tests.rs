//! Integration tests for Mica using the Driver as the entry point.
//!
//! These tests run the full pipeline (parsing, analysis, generation and
//! execution) against complete Mica programs.

use std::path::PathBuf;

use mica::{CompileFailure, CompileOptions, Driver, Execution, RuntimeError};
use mica_core::{DiagnosticKind, Diagnostics};

/// Load a test script from the test_scripts directory.
fn load_script(filename: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_scripts")
        .join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Compile and run a source string with the given program input.
fn run_source(source: &str, input: &str) -> Execution {
    let driver = Driver::default();
    let compilation = driver
        .compile_source(source)
        .unwrap_or_else(|failure| panic!("Failed to compile:\n{}", failure.render()));
    driver.run(&compilation.module, input.as_bytes())
}

fn run_script(filename: &str, input: &str) -> Execution {
    run_source(&load_script(filename), input)
}

/// Output of a program that must run without errors.
fn output_of(filename: &str) -> String {
    let execution = run_script(filename, "");
    assert!(execution.succeeded(), "{filename}: {:?}", execution.error);
    execution.stdout
}

/// Diagnostics of a program that must fail analysis.
fn diagnostics_of(source: &str) -> Diagnostics {
    match Driver::default().compile_source(source) {
        Ok(_) => panic!("expected diagnostics for:\n{source}"),
        Err(failure) => failure
            .diagnostics()
            .cloned()
            .unwrap_or_else(|| panic!("expected semantic errors, got {failure}")),
    }
}

fn assert_compiles(source: &str) {
    if let Err(failure) = Driver::default().check_source(source) {
        panic!("expected a clean program, got:\n{}", failure.render());
    }
}

/// A fresh path under the system temp directory.
fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mica-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir.join(name)
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_scenario_a_assignment_and_write() {
    assert_eq!(output_of("scenario_a.mica"), "5\n");
}

#[test]
fn test_scenario_b_reports_one_mismatch_and_no_artifact() {
    let output = temp_path("scenario_b.json");
    let driver = Driver::new(CompileOptions {
        output: Some(output.clone()),
        ..CompileOptions::default()
    });
    let failure = driver
        .compile_source(&load_script("scenario_b.mica"))
        .expect_err("bool = int is rejected");

    let diagnostics = failure.diagnostics().expect("semantic failure");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.count(DiagnosticKind::TypeMismatch), 1);
    assert!(!output.exists());
}

#[test]
fn test_scenario_c_for_loop_order() {
    assert_eq!(output_of("scenario_c.mica"), "0\n1\n2\n");
}

#[test]
fn test_scenario_d_method_call() {
    assert_eq!(output_of("scenario_d.mica"), "1\n");
}

// =============================================================================
// Programs
// =============================================================================

#[test]
fn test_switch_fallthrough_and_default() {
    assert_eq!(
        output_of("switch.mica"),
        "one\none or two\none or two\nminus three\nother\n"
    );
}

#[test]
fn test_class_fields_and_methods() {
    assert_eq!(output_of("classes.mica"), "7\n4\n20\n10\n3\ntrue\n");
}

#[test]
fn test_recursion() {
    assert_eq!(output_of("recursion.mica"), "0\n1\n3\n8\n21\n55\n");
}

#[test]
fn test_short_circuit_evaluation() {
    assert_eq!(output_of("short_circuit.mica"), "or\n3\nand\n");
}

#[test]
fn test_read_input() {
    let execution = run_script("read_sum.mica", "4\n1 2\n3 4\n");
    assert!(execution.succeeded(), "{:?}", execution.error);
    assert_eq!(execution.stdout, "10\n2.5\n");
}

#[test]
fn test_read_invalid_input() {
    let execution = run_script("read_sum.mica", "two");
    assert_eq!(
        execution.error,
        Some(RuntimeError::InvalidInput {
            input: "two".to_string(),
            expected: "int".to_string()
        })
    );
    assert_eq!(execution.exit_code, 1);
}

#[test]
fn test_scopes_and_globals() {
    assert_eq!(output_of("scopes.mica"), "2.5\n1\n2\n");
}

#[test]
fn test_runtime_error_stops_execution() {
    let execution = run_script("runtime_error.mica", "");
    assert_eq!(execution.stdout, "before\n");
    assert_eq!(
        execution.error,
        Some(RuntimeError::IndexOutOfBounds {
            index: 2,
            len: 2,
            line: 5
        })
    );
}

#[test]
fn test_artifact_written_and_reloaded() {
    let output = temp_path("scenario_c.json");
    let driver = Driver::new(CompileOptions {
        output: Some(output.clone()),
        ..CompileOptions::default()
    });
    let compilation = driver
        .compile_source(&load_script("scenario_c.mica"))
        .expect("compiles");
    assert!(output.exists());

    let module = driver.load_artifact(&output).expect("artifact loads");
    assert_eq!(module, compilation.module);
    assert_eq!(driver.run(&module, "".as_bytes()).stdout, "0\n1\n2\n");
}

#[test]
fn test_compile_file_reads_scripts() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_scripts")
        .join("scenario_d.mica");
    let compilation = Driver::default().compile_file(&path).expect("compiles");
    assert!(compilation.module.entry.is_some());
    assert!(compilation.module.function_named("f").is_some());
}

#[test]
fn test_members_of_later_classes() {
    let execution = run_source(
        "void main() {
           B b; A a;
           b = new B(); b.v = 3; write(b.v);
           a = new A(); write(a.get());
         }
         class A {
           B b;
           int get() { b = new B(); b.v = 4; return b.v + bonus(); }
           int bonus() { return 1; }
         }
         class B { int v; }",
        "",
    );
    assert!(execution.succeeded(), "{:?}", execution.error);
    assert_eq!(execution.stdout, "3\n5\n");
}

// =============================================================================
// Scoping
// =============================================================================

#[test]
fn test_duplicate_in_same_scope() {
    let diagnostics = diagnostics_of("void main() { int a; double a; }");
    assert_eq!(diagnostics.count(DiagnosticKind::DuplicateDeclaration), 1);
}

#[test]
fn test_nested_declaration_shadows() {
    assert_compiles("void main() { int a; { int a; a = 2; } a = 1; }");
}

#[test]
fn test_name_is_gone_after_its_block() {
    let diagnostics = diagnostics_of("void main() { { int inner; } inner = 1; }");
    assert_eq!(diagnostics.count(DiagnosticKind::UndeclaredIdentifier), 1);
}

#[test]
fn test_parameter_and_body_share_a_level() {
    let diagnostics = diagnostics_of("void f(int a) { int a; } void main() { }");
    assert_eq!(diagnostics.count(DiagnosticKind::DuplicateDeclaration), 1);
}

#[test]
fn test_duplicate_class_member() {
    let diagnostics = diagnostics_of("class C { int x; double x; } void main() { }");
    assert_eq!(diagnostics.count(DiagnosticKind::DuplicateDeclaration), 1);
}

// =============================================================================
// Typing
// =============================================================================

#[test]
fn test_int_widens_to_double() {
    let execution = run_source("void main() { double d; d = 3; write(d + 0.5); }", "");
    assert_eq!(execution.stdout, "3.5\n");
}

#[test]
fn test_double_does_not_narrow_to_int() {
    let diagnostics = diagnostics_of("void main() { int i; i = 2.5; }");
    assert_eq!(diagnostics.count(DiagnosticKind::TypeMismatch), 1);
}

#[test]
fn test_explicit_cast_truncates() {
    let execution = run_source("void main() { write((int) 2.9); write((int) -2.9); }", "");
    assert_eq!(execution.stdout, "2\n-2\n");
}

#[test]
fn test_smallest_int_literal() {
    let execution = run_source(
        "void main() { int m; m = -2147483648; write(m); write(m - 1); write(3 - -1); }",
        "",
    );
    assert_eq!(execution.stdout, "-2147483648\n2147483647\n4\n");
}

#[test]
fn test_invalid_cast() {
    let diagnostics = diagnostics_of("void main() { bool b; b = (bool) 1; }");
    assert_eq!(diagnostics.count(DiagnosticKind::InvalidCast), 1);
}

#[test]
fn test_arity_mismatch() {
    let diagnostics = diagnostics_of("int f(int a) { return a; } void main() { write(f(1, 2)); }");
    assert_eq!(diagnostics.count(DiagnosticKind::ArityMismatch), 1);
}

#[test]
fn test_missing_return() {
    let diagnostics = diagnostics_of("int f() { } void main() { }");
    assert_eq!(diagnostics.count(DiagnosticKind::MissingReturn), 1);
}

#[test]
fn test_diagnostics_accumulate() {
    let diagnostics = diagnostics_of("void main() { x = 1; bool b; b = 2; break; }");
    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics.count(DiagnosticKind::UndeclaredIdentifier), 1);
    assert_eq!(diagnostics.count(DiagnosticKind::TypeMismatch), 1);
    assert_eq!(diagnostics.count(DiagnosticKind::IllegalBreak), 1);
}

// =============================================================================
// Control Flow
// =============================================================================

#[test]
fn test_illegal_break() {
    let diagnostics = diagnostics_of("void main() { if (true) { break; } }");
    assert_eq!(diagnostics.count(DiagnosticKind::IllegalBreak), 1);
}

#[test]
fn test_break_inside_loop_and_switch() {
    assert_compiles("void main() { while (true) { break; } switch (1) { case 1: break; } }");
}

#[test]
fn test_break_leaves_innermost_loop() {
    let execution = run_source(
        "void main() { int i, j;
           for (i = 0; i < 3; i = i + 1) {
             for (j = 0; j < 10; j = j + 1) { if (j == 1) { break; } write(j); }
             write(i);
           } }",
        "",
    );
    assert_eq!(execution.stdout, "0\n0\n0\n1\n0\n2\n");
}

#[test]
fn test_duplicate_case_label() {
    let diagnostics =
        diagnostics_of("void main() { switch (1) { case 1: break; case 1: break; } }");
    assert_eq!(diagnostics.count(DiagnosticKind::DuplicateCaseLabel), 1);
}

#[test]
fn test_switch_on_char() {
    let execution = run_source(
        "void main() { char c; c = 'b';
           switch (c) { case 'a': write(1); break; case 'b': write(2); break; } }",
        "",
    );
    assert_eq!(execution.stdout, "2\n");
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_syntax_error_is_fatal() {
    let failure = Driver::default()
        .compile_source("void main() { int x x = 1; }")
        .expect_err("missing semicolon");
    assert!(matches!(failure, CompileFailure::Pipeline { .. }));
    assert!(failure.diagnostics().is_none());
    assert!(failure.to_string().starts_with("SyntaxError: "));
}

#[test]
fn test_null_object_use() {
    let execution = run_source("class C { int v; } void main() { C c; c.v = 1; }", "");
    assert!(matches!(
        execution.error,
        Some(RuntimeError::NullReference { line: 1 })
    ));
}
