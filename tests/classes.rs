mod common;

use pretty_assertions::assert_eq;

use common::{lines, run_err};

#[test]
fn fields_are_created_on_assignment() {
    assert_eq!(
        lines("class P {} var p = P(); p.x = 1; p.x = p.x + 1; print p.x; print p;"),
        vec!["2", "P instance"]
    );
}

#[test]
fn class_display() {
    assert_eq!(lines("class Bagel {} print Bagel;"), vec!["Bagel"]);
}

#[test]
fn methods_see_this() {
    let source = "\
class Counter {
  init(start) { this.n = start; }
  next() { this.n = this.n + 1; return this.n; }
}
var c = Counter(3);
print c.next();
print c.next();";

    assert_eq!(lines(source), vec!["4", "5"]);
}

#[test]
fn initializer_always_yields_the_instance() {
    let source = "\
class A {
  init() { this.v = 1; return; }
}
class B {
  init() { return 42; }
}
var a = A();
print a.init();
print B();";

    assert_eq!(lines(source), vec!["A instance", "B instance"]);
}

#[test]
fn class_arity_comes_from_init() {
    let (err, _) = run_err("class C { init(a, b) {} }\nC(1);");
    assert_eq!(err.to_string(), "Expected 2 arguments but got 1.\n[line 2]");

    let (err, _) = run_err("class D {}\nD(1);");
    assert_eq!(err.to_string(), "Expected 0 arguments but got 1.\n[line 2]");
}

#[test]
fn bound_methods_remember_their_receiver() {
    let source = "\
class Person {
  init(name) { this.name = name; }
  greet() { print \"hi \" + this.name; }
}
var greet = Person(\"ann\").greet;
var other = Person(\"bob\");
other.greet = greet;
other.greet();
print greet;";

    assert_eq!(lines(source), vec!["hi ann", "<fn greet>"]);
}

#[test]
fn every_access_binds_a_new_method() {
    assert_eq!(
        lines("class C { m() {} } var c = C(); print c.m == c.m; var m = c.m; print m == m;"),
        vec!["false", "true"]
    );
}

#[test]
fn fields_shadow_methods() {
    assert_eq!(
        lines("class C { m() { return 1; } } var c = C(); print c.m(); c.m = 2; print c.m;"),
        vec!["1", "2"]
    );
}

#[test]
fn methods_are_inherited() {
    let source = "\
class A { who() { return \"A\"; } }
class B < A {}
class C < B {}
print C().who();";

    assert_eq!(lines(source), vec!["A"]);
}

#[test]
fn super_calls_run_the_superclass_body() {
    let source = "\
class A {
  method() { print \"A method\"; }
}
class B < A {
  method() {
    print \"B method\";
    super.method();
  }
}
class C < B {}
C().method();";

    assert_eq!(lines(source), vec!["B method", "A method"]);
}

#[test]
fn super_binds_this_to_the_subclass_instance() {
    let source = "\
class A {
  name() { return this.n; }
}
class B < A {
  init() { this.n = \"b\"; }
  name() { return \"via \" + super.name(); }
}
print B().name();";

    assert_eq!(lines(source), vec!["via b"]);
}

#[test]
fn super_inside_a_closure() {
    let source = "\
class A { say() { return \"A\"; } }
class B < A {
  say() {
    fun inner() { return super.say(); }
    return inner;
  }
}
print B().say()();";

    assert_eq!(lines(source), vec!["A"]);
}

#[test]
fn inherited_initializer() {
    let source = "\
class A { init(v) { this.v = v; } }
class B < A {}
print B(7).v;";

    assert_eq!(lines(source), vec!["7"]);
}

#[test]
fn local_class_can_refer_to_itself() {
    let source = "\
{
  class Node { make() { return Node(); } }
  print Node().make();
}";

    assert_eq!(lines(source), vec!["Node instance"]);
}

#[test]
fn property_errors() {
    let (err, _) = run_err("class C {}\nprint C().nope;");
    assert_eq!(err.to_string(), "Undefined property 'nope'.\n[line 2]");

    let (err, _) = run_err("var s = \"str\";\nprint s.length;");
    assert_eq!(err.to_string(), "Only instances have properties.\n[line 2]");

    let (err, _) = run_err("var s = \"str\";\ns.length = 1;");
    assert_eq!(err.to_string(), "Only instances have fields.\n[line 2]");
}

#[test]
fn superclass_must_be_a_class() {
    let (err, _) = run_err("var NotClass = 1;\nclass C < NotClass {}");

    assert_eq!(err.to_string(), "Superclass must be a class.\n[line 2]");
}

#[test]
fn super_with_missing_method() {
    let (err, _) = run_err("class A {}\nclass B < A { m() { return super.nope; } }\nB().m();");

    assert_eq!(err.to_string(), "Undefined property 'nope'.\n[line 2]");
}
