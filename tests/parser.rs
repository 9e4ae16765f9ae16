use pretty_assertions::assert_eq;

use rox::ast::{Expr, ExprId, Stmt};
use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::parser::Parser;
use rox::scanner::Scanner;

fn print_expression(source: &str) -> String {
    let tokens = Scanner::new(source.as_bytes()).scan_all().unwrap();
    let expr = Parser::new(&tokens).parse_expression().unwrap();

    AstPrinter::print(&expr)
}

fn parse_error(source: &str) -> LoxError {
    let tokens = Scanner::new(source.as_bytes()).scan_all().unwrap();
    Parser::new(&tokens).parse().unwrap_err()
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(print_expression("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
    assert_eq!(print_expression("-(1 - 2) / 4"), "(/ (- (group (- 1.0 2.0))) 4.0)");
}

#[test]
fn logical_binds_looser_than_equality() {
    assert_eq!(
        print_expression("a == b or c and !d"),
        "(or (== a b) (and c (! d)))"
    );
}

#[test]
fn conditional_is_right_associative() {
    assert_eq!(print_expression("a ? b : c ? d : e"), "(?: a b (?: c d e))");
}

#[test]
fn conditional_binds_tighter_than_assignment() {
    assert_eq!(print_expression("x = a ? b : c"), "(= x (?: a b c))");
}

#[test]
fn comma_is_the_loosest_operator() {
    assert_eq!(print_expression("a = 1, b = 2"), "(, (= a 1.0) (= b 2.0))");
}

#[test]
fn commas_inside_calls_separate_arguments() {
    assert_eq!(print_expression("f(1, (2, 3))"), "(call f 1.0 (group (, 2.0 3.0)))");
}

#[test]
fn property_chains() {
    assert_eq!(print_expression("a.b(c).d"), "(. (call (. a b) c) d)");
    assert_eq!(print_expression("this.x = 1"), "(= (. this x) 1.0)");
}

#[test]
fn invalid_assignment_target() {
    let err = parse_error("1 + 2 = 3;");

    assert_eq!(
        err.to_string(),
        "[line 1] Error at '=': Invalid assignment target"
    );
}

#[test]
fn every_statement_error_is_reported() {
    let err = parse_error("var = 1;\nprint 2;\nprint (3;\n");
    let messages: Vec<String> = err.diagnostics().iter().map(|e| e.to_string()).collect();

    assert_eq!(
        messages,
        vec![
            "[line 1] Error at '=': Expected variable name",
            "[line 3] Error at ';': Expected ')' after expression",
        ]
    );
}

#[test]
fn missing_semicolon_at_end() {
    let err = parse_error("print 1");

    assert_eq!(err.to_string(), "[line 1] Error at end: Expected ';' after value");
}

#[test]
fn class_with_superclass() {
    let tokens = Scanner::new(b"class B < A { init(x) { this.x = x; } get() { return this.x; } }")
        .scan_all()
        .unwrap();
    let statements = Parser::new(&tokens).parse().unwrap();

    match &statements[..] {
        [Stmt::Class {
            name,
            superclass: Some(Expr::Variable { name: super_name, .. }),
            methods,
        }] => {
            assert_eq!(name.lexeme, "B");
            assert_eq!(super_name.lexeme, "A");
            let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme).collect();
            assert_eq!(names, vec!["init", "get"]);
            assert_eq!(methods[0].params.len(), 1);
        }
        other => panic!("unexpected tree: {:?}", other),
    }
}

#[test]
fn for_loop_keeps_its_clauses() {
    let tokens = Scanner::new(b"for (var i = 0; i < 3; i = i + 1) continue;")
        .scan_all()
        .unwrap();
    let statements = Parser::new(&tokens).parse().unwrap();

    assert!(matches!(
        &statements[..],
        [Stmt::For {
            initializer: Some(_),
            condition: Some(_),
            increment: Some(_),
            body,
        }] if matches!(**body, Stmt::Continue(_))
    ));
}

#[test]
fn node_ids_are_unique_and_continue_across_batches() {
    let first = Scanner::new(b"a = b;").scan_all().unwrap();
    let mut parser = Parser::new(&first);
    let statements = parser.parse().unwrap();

    let ids = match &statements[..] {
        [Stmt::Expression(Expr::Assign { id, value, .. })] => match value.as_ref() {
            Expr::Variable { id: read, .. } => (*id, *read),
            other => panic!("unexpected value: {:?}", other),
        },
        other => panic!("unexpected tree: {:?}", other),
    };
    assert_ne!(ids.0, ids.1);

    let next = parser.next_expr_id();
    let second = Scanner::new(b"c;").scan_all().unwrap();
    let statements = Parser::new(&second).starting_at(next).parse().unwrap();

    match &statements[..] {
        [Stmt::Expression(Expr::Variable { id, .. })] => {
            assert_eq!(*id, next);
            assert!(*id > ids.0 && *id > ids.1);
        }
        other => panic!("unexpected tree: {:?}", other),
    }
    assert_eq!(ExprId(0).to_string(), "#0");
}
