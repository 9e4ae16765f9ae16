use pretty_assertions::assert_eq;

use rox::error::LoxError;
use rox::parser::Parser;
use rox::resolver::{Locals, Resolver};
use rox::scanner::Scanner;

fn resolve(source: &str) -> Result<Locals, LoxError> {
    let tokens = Scanner::new(source.as_bytes()).scan_all()?;
    let statements = Parser::new(&tokens).parse()?;

    Resolver::new().resolve(&statements)
}

/// Distances recorded for the program, in node order.
fn distances(source: &str) -> Vec<usize> {
    let locals = resolve(source).unwrap();
    let mut entries: Vec<_> = locals.into_iter().collect();
    entries.sort();

    entries.into_iter().map(|(_, distance)| distance).collect()
}

fn static_errors(source: &str) -> Vec<String> {
    resolve(source)
        .unwrap_err()
        .diagnostics()
        .iter()
        .map(|e| e.to_string())
        .collect()
}

#[test]
fn globals_are_left_out_of_the_map() {
    assert_eq!(distances("var a = 1; fun f() { return a; } print f();"), vec![]);
}

#[test]
fn distance_counts_frame_boundaries() {
    assert_eq!(distances("{ var a = 1; print a; }"), vec![0]);
    assert_eq!(distances("{ var a = 1; { { print a; } } }"), vec![2]);
    // parameter read, then the enclosing local captured by the inner function
    assert_eq!(
        distances("{ var x = 1; fun f(p) { return p + x; } }"),
        vec![0, 1]
    );
}

#[test]
fn later_shadowing_does_not_change_a_resolved_distance() {
    let source = r#"
        var a = "global";
        {
            fun showA() { print a; }
            showA();
            var a = "block";
            showA();
        }
    "#;

    // `showA` twice at distance 0; the `a` inside it stays global.
    assert_eq!(distances(source), vec![0, 0]);
}

#[test]
fn this_resolves_through_the_receiver_frame() {
    // method body frame → receiver frame
    assert_eq!(distances("class A { m() { return this; } }"), vec![1]);
    // nested function adds one more frame
    assert_eq!(
        distances("class A { m() { fun g() { return this; } return g; } }"),
        vec![2, 0]
    );
}

#[test]
fn for_loop_variable_lives_in_its_own_frame() {
    // condition, increment read, increment target, body read
    assert_eq!(
        distances("for (var i = 0; i < 2; i = i + 1) { print i; }"),
        vec![0, 0, 0, 1]
    );
}

#[test]
fn resolving_twice_gives_the_same_map() {
    let source = "{ var a = 1; fun f() { a = a + 1; return a; } { print f(); } }";
    let tokens = Scanner::new(source.as_bytes()).scan_all().unwrap();
    let statements = Parser::new(&tokens).parse().unwrap();

    let first = Resolver::new().resolve(&statements).unwrap();
    let second = Resolver::new().resolve(&statements).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn duplicate_declaration_in_one_frame() {
    assert_eq!(
        static_errors("{ var a = 1; var a = 2; }"),
        vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
    );
    assert_eq!(
        static_errors("fun f(a, a) {}"),
        vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
    );
}

#[test]
fn shadowing_across_frames_and_global_redeclaration_are_legal() {
    assert!(resolve("{ var a = 1; { var a = 2; } }").is_ok());
    assert!(resolve("var a = 1; var a = 2;").is_ok());
}

#[test]
fn reading_a_local_in_its_own_initializer() {
    assert_eq!(
        static_errors("{ var a = a; }"),
        vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
    );
    // at global scope the name is looked up at run time instead
    assert!(resolve("var a = a;").is_ok());
}

#[test]
fn misplaced_return() {
    assert_eq!(
        static_errors("return 1;"),
        vec!["[line 1] Error at 'return': Can't return from top-level code."]
    );
    assert_eq!(
        static_errors("class A { init() { return 1; } }"),
        vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
    );
    assert!(resolve("class A { init() { return; } }").is_ok());
}

#[test]
fn break_and_continue_need_an_enclosing_loop() {
    assert_eq!(
        static_errors("break;"),
        vec!["[line 1] Error at 'break': Can't use 'break' outside of a loop."]
    );
    assert_eq!(
        static_errors("if (true) { continue; }"),
        vec!["[line 1] Error at 'continue': Can't use 'continue' outside of a loop."]
    );
    // a function body is not part of the loop around it
    assert_eq!(
        static_errors("while (true) { fun f() { break; } }"),
        vec!["[line 1] Error at 'break': Can't use 'break' outside of a loop."]
    );
    assert!(resolve("while (true) { if (true) { break; } else { continue; } }").is_ok());
    assert!(resolve("for (;;) { { continue; } }").is_ok());
}

#[test]
fn this_outside_a_class() {
    assert_eq!(
        static_errors("print this;"),
        vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
    );
}

#[test]
fn class_cannot_inherit_from_itself() {
    assert_eq!(
        static_errors("class A < A {}"),
        vec!["[line 1] Error at 'A': A class can't inherit from itself."]
    );
}

#[test]
fn errors_are_accumulated() {
    let errors = static_errors("return;\nbreak;\n{ var x; var x; }");

    assert_eq!(
        errors,
        vec![
            "[line 1] Error at 'return': Can't return from top-level code.",
            "[line 2] Error at 'break': Can't use 'break' outside of a loop.",
            "[line 3] Error at 'x': Already a variable with this name in this scope.",
        ]
    );
}
