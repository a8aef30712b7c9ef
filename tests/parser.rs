use pretty_assertions::assert_eq;

use rox::ast::{Expr, Stmt};
use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::session::{parse_expression, parse_program};

fn expr(source: &str) -> String {
    match parse_expression(source) {
        Ok(expr) => AstPrinter::print(&expr),
        Err(e) => panic!("failed to parse {:?}:\n{}", source, e),
    }
}

fn program(source: &str) -> String {
    match parse_program(source) {
        Ok(statements) => AstPrinter::print_program(&statements),
        Err(e) => panic!("failed to parse {:?}:\n{}", source, e),
    }
}

fn errors(source: &str) -> Vec<String> {
    match parse_program(source) {
        Ok(_) => panic!("expected parse errors for {:?}", source),
        Err(e) => e.errors().iter().map(ToString::to_string).collect(),
    }
}

#[test]
fn precedence_and_associativity() {
    assert_eq!(expr("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
    assert_eq!(expr("1 - 2 - 3"), "(- (- 1.0 2.0) 3.0)");
    assert_eq!(expr("-(1 - 2) == !true"), "(== (- (group (- 1.0 2.0))) (! true))");
    assert_eq!(expr("1 < 2 != 3 >= 4"), "(!= (< 1.0 2.0) (>= 3.0 4.0))");
    assert_eq!(expr("!!nil"), "(! (! nil))");
}

#[test]
fn logical_operators_bind_looser_than_equality() {
    assert_eq!(expr("a or b and c == d"), "(or a (and b (== c d)))");
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(expr("a = b = 3"), "(= a (= b 3.0))");
    assert_eq!(expr("obj.field = 2.5"), "(= (. obj field) 2.5)");
}

#[test]
fn calls_and_properties_chain_left_to_right() {
    assert_eq!(
        expr("a.b(1)(2, \"s\").c"),
        "(. (call (call (. a b) 1.0) 2.0 s) c)"
    );
    assert_eq!(expr("super.method"), "(super method)");
}

#[test]
fn anonymous_function_in_expression_position() {
    assert_eq!(
        program("var f = fun (a, b) { return a; };"),
        "(var f (fun (a b) (return a)))"
    );
}

#[test]
fn declarations_and_statements() {
    let source = "\
var a = 1;
var b;
fun add(x, y) { return x + y; }
class Pie < Dessert { bake() { print this.t; } }
if (a) print a; else { print b; }
while (false) break;
";

    assert_eq!(
        program(source),
        "\
(var a 1.0)
(var b)
(fun add (x y) (return (+ x y)))
(class Pie < Dessert (method bake () (print (. this t))))
(if a (print a) (block (print b)))
(while false (break))"
    );
}

#[test]
fn for_loop_is_desugared() {
    assert_eq!(
        program("for (var i = 0; i < 2; i = i + 1) print i;"),
        "(block (var i 0.0) (while (< i 2.0) (block (print i) (; (= i (+ i 1.0))))))"
    );

    assert_eq!(program("for (;;) break;"), "(while true (break))");
}

#[test]
fn for_loop_produces_only_core_nodes() {
    let statements = parse_program("for (var i = 0; i < 1; i = i + 1) {}").unwrap();

    let [Stmt::Block(outer)] = statements.as_slice() else {
        panic!("expected a single block, got {:?}", statements);
    };

    assert!(matches!(outer[0], Stmt::Var { .. }));
    assert!(matches!(outer[1], Stmt::While { .. }));
}

#[test]
fn missing_semicolon_at_end() {
    assert_eq!(
        errors("print 1"),
        vec!["[line 1] Error at end: Expected ';' after value"]
    );
}

#[test]
fn recovers_and_reports_every_error() {
    let source = "\
var = 1;
print 2
var ok = 3;
print ok;
(;
";

    assert_eq!(
        errors(source),
        vec![
            "[line 1] Error at '=': Expected variable name",
            "[line 3] Error at 'var': Expected ';' after value",
            "[line 5] Error at ';': Expected expression",
        ]
    );
}

#[test]
fn invalid_assignment_target_does_not_unwind() {
    assert_eq!(
        errors("1 = 2; a + b = c;"),
        vec![
            "[line 1] Error at '=': Invalid assignment target",
            "[line 1] Error at '=': Invalid assignment target",
        ]
    );
}

#[test]
fn too_many_arguments_is_reported() {
    let args = vec!["0"; 256].join(", ");
    let source = format!("f({});", args);

    assert_eq!(
        errors(&source),
        vec!["[line 1] Error at '0': Can't have more than 255 arguments"]
    );

    let ok = vec!["0"; 255].join(", ");
    assert!(parse_program(&format!("f({});", ok)).is_ok());
}

#[test]
fn lex_and_parse_errors_share_one_batch() {
    let err = parse_program("var a = @;\nprint a").unwrap_err();

    assert!(matches!(err, LoxError::Compile(_)));
    assert_eq!(err.exit_code(), 65);
    assert_eq!(
        err.to_string(),
        "[line 1] Error: Unexpected character: @\n\
         [line 1] Error at ';': Expected expression\n\
         [line 2] Error at end: Expected ';' after value"
    );
}

#[test]
fn single_expression_must_consume_all_input() {
    let err = parse_expression("1 + 2 3").unwrap_err();

    assert_eq!(
        err.to_string(),
        "[line 1] Error at '3': Expected end of expression"
    );
}

#[test]
fn nodes_report_their_line() {
    let statements = parse_program("\n\nprint\n  1 +\n  2;").unwrap();

    let [Stmt::Print(value)] = statements.as_slice() else {
        panic!("expected one print statement");
    };

    assert!(matches!(value, Expr::Binary { line: 4, .. }));
    assert_eq!(value.line(), 4);
}

#[test]
fn deeply_nested_input_does_not_overflow() {
    let depth = 5_000;
    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

    assert!(parse_expression(&source).is_ok());
}
