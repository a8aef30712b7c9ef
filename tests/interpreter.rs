mod common;

use pretty_assertions::assert_eq;

use std::rc::Rc;

use common::{lines, run_err, session};
use rox::callable::{Callable, NativeFunction};
use rox::error::LoxError;
use rox::value::Value;

#[test]
fn arithmetic_and_display() {
    assert_eq!(
        lines(
            "print 1 + 2; print \"a\" + \"b\"; print 7 / 2; print -0; \
             print 10 / 4 * 2; print nil; print !nil; print 1 == 1.0;"
        ),
        vec!["3", "ab", "3.5", "-0", "5", "nil", "true", "true"]
    );
}

#[test]
fn non_finite_numbers() {
    let source = format!(
        "var big = {};\nprint big * 10;\nprint -big * 10;\nprint big * 10 - big * 10;",
        "9".repeat(400)
    );

    assert_eq!(lines(&source), vec!["Infinity", "-Infinity", "NaN"]);
}

#[test]
fn comparison_and_equality() {
    assert_eq!(
        lines(
            "print 1 < 2; print 2 <= 1; print 3 > 3; print 3 >= 3; \
             print nil == false; print 1 == \"1\"; print \"a\" == \"a\"; print nil == nil;"
        ),
        vec!["true", "false", "false", "true", "false", "false", "true", "true"]
    );
}

#[test]
fn functions_compare_by_identity() {
    assert_eq!(
        lines("fun f() {} fun g() {} var h = f; print f == h; print f == g;"),
        vec!["true", "false"]
    );
}

#[test]
fn truthiness_and_short_circuit() {
    let source = "\
if (0) print \"zero\";
if (\"\") print \"empty\";
if (nil) print \"nil\"; else print \"falsy\";
print nil or \"x\";
print false and 1;
print 1 and 2;
var touched = false;
fun touch() { touched = true; return true; }
print true or touch();
print touched;";

    assert_eq!(
        lines(source),
        vec!["zero", "empty", "falsy", "x", "false", "2", "true", "false"]
    );
}

#[test]
fn initializer_reads_shadowed_outer_variable() {
    assert_eq!(
        lines("var a = 1; { var a = a + 1; print a; } print a;"),
        vec!["2", "1"]
    );
}

#[test]
fn closures_capture_their_scope() {
    let source = "\
fun makeCounter() {
  var i = 0;
  fun count() {
    i = i + 1;
    print i;
  }
  return count;
}

var counter = makeCounter();
counter();
counter();";

    assert_eq!(lines(source), vec!["1", "2"]);
}

#[test]
fn closures_in_one_scope_share_it() {
    let source = "\
var get;
var set;
{
  var shared = \"before\";
  fun g() { return shared; }
  fun s(v) { shared = v; }
  get = g;
  set = s;
}
set(\"after\");
print get();";

    assert_eq!(lines(source), vec!["after"]);
}

#[test]
fn closure_keeps_binding_resolved_at_declaration() {
    let source = "\
var a = \"global\";
{
  fun show() { print a; }
  show();
  var a = \"block\";
  show();
}";

    assert_eq!(lines(source), vec!["global", "global"]);
}

#[test]
fn anonymous_functions() {
    assert_eq!(
        lines("var add = fun (a) { return fun (b) { return a + b; }; }; print add(1)(2);"),
        vec!["3"]
    );
}

#[test]
fn return_without_value_is_nil() {
    assert_eq!(lines("fun f() { return; } fun g() {} print f(); print g();"), vec!["nil", "nil"]);
}

#[test]
fn return_unwinds_nested_loops_and_blocks() {
    let source = "\
fun f() {
  while (true) {
    for (var i = 0; ; i = i + 1) {
      { if (i == 2) return i; }
    }
  }
}
print f();";

    assert_eq!(lines(source), vec!["2"]);
}

#[test]
fn break_exits_only_the_innermost_loop() {
    let source = "\
for (var i = 0; i < 2; i = i + 1) {
  for (var j = 0; j < 10; j = j + 1) {
    if (j == 1) break;
    print i + j;
  }
}
var n = 0;
while (true) {
  n = n + 1;
  if (n > 3) break;
}
print n;";

    assert_eq!(lines(source), vec!["0", "1", "4"]);
}

#[test]
fn local_functions_may_be_mutually_recursive() {
    let source = "\
{
  fun isEven(n) { if (n == 0) return true; return isOdd(n - 1); }
  fun isOdd(n) { if (n == 0) return false; return isEven(n - 1); }
  print isEven(10);
  print isOdd(7);
}";

    assert_eq!(lines(source), vec!["true", "true"]);
}

#[test]
fn recursion() {
    let source = "\
fun fib(n) {
  if (n < 2) return n;
  return fib(n - 1) + fib(n - 2);
}
print fib(15);";

    assert_eq!(lines(source), vec!["610"]);
}

#[test]
fn callable_display() {
    assert_eq!(
        lines("fun f() {} print f; print clock; print fun () {};"),
        vec!["<fn f>", "<native fn clock>", "<fn>"]
    );
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(lines("print clock() > 1000000000;"), vec!["true"]);
}

fn always_fails(_: &[Value]) -> Result<Value, String> {
    Err("host function failed".to_string())
}

#[test]
fn native_errors_surface_at_the_call_line() {
    let (mut session, buffer) = session();

    let native = NativeFunction {
        name: "fails",
        arity: 0,
        func: always_fails,
    };
    session
        .interpreter_mut()
        .globals()
        .borrow_mut()
        .define("fails", Value::Callable(Callable::Native(Rc::new(native))));

    let err = session.run("print 1;\n\nfails();\nprint 2;").unwrap_err();

    let LoxError::Runtime { message, line } = &err else {
        panic!("expected a runtime error, got {:?}", err);
    };
    assert_eq!(message, "host function failed");
    assert_eq!(*line, 3);
    assert_eq!(err.exit_code(), 70);
    assert_eq!(buffer.contents(), "1\n");
}

#[test]
fn arity_mismatch() {
    let (err, _) = run_err("fun f(a, b) {}\nf(1);");

    assert_eq!(err.to_string(), "Expected 2 arguments but got 1.\n[line 2]");
    assert_eq!(err.exit_code(), 70);
}

#[test]
fn calling_a_non_callable() {
    let (err, _) = run_err("var x = 1; x();");

    assert!(err.to_string().contains("not callable"), "got: {}", err);
    assert_eq!(
        err.to_string(),
        "number value is not callable. Can only call functions and classes.\n[line 1]"
    );
}

#[test]
fn plus_requires_matching_operands() {
    let (err, _) = run_err("print 1 + \"a\";");

    assert_eq!(
        err.to_string(),
        "Operands must be two numbers or two strings, got number and string.\n[line 1]"
    );
}

#[test]
fn numeric_operators_require_numbers() {
    let (err, _) = run_err("print 1 - \"a\";");
    assert_eq!(err.to_string(), "Operands must be numbers.\n[line 1]");

    let (err, _) = run_err("print true < 1;");
    assert_eq!(err.to_string(), "Operands must be numbers.\n[line 1]");

    let (err, _) = run_err("print -\"a\";");
    assert_eq!(err.to_string(), "Operand must be a number.\n[line 1]");
}

#[test]
fn division_by_zero() {
    let (err, _) = run_err("print 1 / 0;");

    assert_eq!(err.to_string(), "Division by zero.\n[line 1]");
}

#[test]
fn undefined_variables() {
    let (err, _) = run_err("print nope;");
    assert_eq!(err.to_string(), "Undefined variable 'nope'.\n[line 1]");

    let (err, _) = run_err("nope = 1;");
    assert_eq!(err.to_string(), "Undefined variable 'nope'.\n[line 1]");
}

#[test]
fn hoisted_function_reading_a_later_local() {
    let (err, out) = run_err("{\n  f();\n  var x = 1;\n  fun f() { print x; }\n}");

    assert_eq!(out, "");
    assert_eq!(err.to_string(), "Undefined variable 'x'.\n[line 4]");
    assert!(!err.is_fatal());
}

#[test]
fn output_before_a_runtime_error_is_kept() {
    let (err, out) = run_err("print 1;\nprint nope;\nprint 3;");

    assert_eq!(out, "1\n");
    assert!(matches!(err, LoxError::Runtime { line: 2, .. }));
}

#[test]
fn static_errors_prevent_execution() {
    let (err, out) = run_err("print 1;\n{ var a = a; }");

    assert_eq!(out, "");
    assert_eq!(err.exit_code(), 65);
}

#[test]
fn unbounded_recursion_is_a_stack_overflow() {
    let (err, _) = run_err("fun f() { f(); }\nf();");

    assert!(matches!(err, LoxError::StackOverflow { .. }));
    assert!(err.is_fatal());
    assert_eq!(err.exit_code(), 71);
    assert_eq!(err.to_string(), "Stack overflow.\n[line 1]");
}

#[test]
fn call_depth_limit_is_configurable() {
    let (mut session, buffer) = session();
    session.set_max_call_depth(10);

    session
        .run("fun f(n) { if (n == 0) return 0; return f(n - 1); }\nprint f(9);")
        .unwrap();
    assert_eq!(buffer.contents(), "0\n");

    let err = session.run("f(10);").unwrap_err();
    assert!(matches!(err, LoxError::StackOverflow { .. }));
}

#[test]
fn session_keeps_globals_between_runs() {
    let (mut session, buffer) = session();

    session.run("var a = 1; fun inc() { a = a + 1; }").unwrap();
    assert!(session.run("print missing;").is_err());
    session.run("inc(); print a;").unwrap();

    assert_eq!(buffer.contents(), "2\n");
}

#[test]
fn eval_line_echoes_expressions() {
    let (mut session, buffer) = session();

    assert_eq!(session.eval_line("var a = 1;").unwrap(), None);
    assert_eq!(session.eval_line("a + 1").unwrap(), Some(Value::Number(2.0)));
    assert_eq!(session.eval_line("a = \"x\";").unwrap(), Some(Value::from("x")));
    assert_eq!(session.eval_line("print a;").unwrap(), None);
    assert_eq!(buffer.contents(), "x\n");

    let err = session.eval_line("print").unwrap_err();
    assert_eq!(err.to_string(), "[line 1] Error at end: Expected expression");
}

#[test]
fn evaluate_single_expression() {
    let (mut session, _) = session();

    assert_eq!(session.evaluate("(1 + 2) * 3").unwrap(), Value::Number(9.0));
    assert_eq!(session.evaluate("\"a\" + \"b\"").unwrap(), Value::from("ab"));
    assert!(session.evaluate("1 +").is_err());
}
