mod common;

use std::io::Cursor;
use std::rc::Rc;

use aq::error::RunError;
use aq::interpreter::Interpreter;
use aq::native::NativeFunction;
use aq::runner::repl;
use aq::value::Value;

use common::{run, run_ok, session, SharedBuffer};

/// Output printed before the failure, and the rendered runtime error.
fn runtime_error(source: &str) -> (String, String) {
    match run(source) {
        (output, Err(RunError::Runtime(e))) => (output, e.to_string()),
        (output, other) => panic!("expected a runtime error, got {:?} (output {:?})", other, output),
    }
}

#[test]
fn arithmetic_and_stringify() {
    assert_eq!(
        run_ok("print 1 + 2; print 7 / 2; print \"a\" + \"b\"; print -3; print 2.50; print 100;"),
        vec!["3", "3.5", "ab", "-3", "2.5", "100"]
    );
}

#[test]
fn comparison_and_equality() {
    assert_eq!(
        run_ok("print 1 == 1.0; print 2 <= 1; print \"a\" == \"a\"; print nil == false; print nil == nil; print \"1\" == 1; print !nil;"),
        vec!["true", "false", "true", "false", "true", "false", "true"]
    );
}

#[test]
fn only_nil_and_false_are_falsy() {
    assert_eq!(
        run_ok("if (0) print \"zero\"; if (\"\") print \"empty\"; if (nil) print \"nil\"; else print \"no\";"),
        vec!["zero", "empty", "no"]
    );
}

#[test]
fn division_by_zero_follows_ieee() {
    assert_eq!(
        run_ok("print 1 / 0; print -1 / 0; print 0 / 0; print 0 / 0 == 0 / 0;"),
        vec!["inf", "-inf", "NaN", "false"]
    );
}

#[test]
fn logical_operators_return_the_deciding_operand() {
    assert_eq!(
        run_ok("print nil or \"x\"; print 0 and \"y\"; print \"a\" or nil; print false and 1;"),
        vec!["x", "y", "a", "false"]
    );
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(
        run_ok(
            "fun called() { print \"called\"; return true; }
             print false and called();
             print true or called();"
        ),
        vec!["false", "true"]
    );
}

#[test]
fn assignment_yields_the_assigned_value() {
    assert_eq!(run_ok("var a; var b; a = b = 5; print a; print b;"), vec!["5", "5"]);
}

#[test]
fn closures_keep_their_own_state() {
    let program = r#"
        fun makeCounter() {
            var i = 0;
            fun count() {
                i = i + 1;
                print i;
            }
            return count;
        }

        var c = makeCounter();
        c();
        c();
        var d = makeCounter();
        d();
    "#;

    assert_eq!(run_ok(program), vec!["1", "2", "1"]);
}

#[test]
fn closures_bind_lexically_not_dynamically() {
    let program = r#"
        var a = "global";
        {
            fun show() { print a; }
            show();
            var a = "block";
            show();
        }
    "#;

    assert_eq!(run_ok(program), vec!["global", "global"]);
}

#[test]
fn while_and_break() {
    assert_eq!(
        run_ok("var i = 0; while (true) { if (i == 3) break; print i; i = i + 1; }"),
        vec!["0", "1", "2"]
    );
}

#[test]
fn for_loop_and_break() {
    assert_eq!(
        run_ok("for (var j = 0; j < 10; j = j + 1) { if (j == 2) break; print j; }"),
        vec!["0", "1"]
    );
}

#[test]
fn break_leaves_only_the_innermost_loop() {
    assert_eq!(
        run_ok("for (var a = 0; a < 2; a = a + 1) { for (;;) { print a; break; } }"),
        vec!["0", "1"]
    );
}

#[test]
fn return_unwinds_out_of_loops() {
    assert_eq!(
        run_ok("fun f() { while (true) { for (;;) { return \"done\"; } } } print f();"),
        vec!["done"]
    );
}

#[test]
fn recursion() {
    assert_eq!(
        run_ok("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(15);"),
        vec!["610"]
    );
}

#[test]
fn runaway_recursion_is_a_runtime_error() {
    let (mut aq, out) = session();

    match aq.run("fun f(n) { return f(n + 1); } f(0); print \"after\";") {
        Err(RunError::Runtime(e)) => assert_eq!(e.to_string(), "Stack overflow.\n[line 1]"),
        other => panic!("expected a runtime error, got {:?}", other),
    }

    // The session survives and call depth starts over.
    assert!(aq
        .run("fun down(n) { if (n == 0) return 0; return 1 + down(n - 1); } print down(1000);")
        .is_ok());
    assert!(aq.run("print \"next\";").is_ok());

    assert_eq!(out.contents(), "1000\nnext\n");
}

#[test]
fn deep_expression_nesting_evaluates() {
    let depth = 2_000;
    let source = format!("print {}1{};", "(".repeat(depth), ")".repeat(depth));

    assert_eq!(run_ok(&source), vec!["1"]);
    assert_eq!(run_ok(&format!("print {}1;", "-".repeat(depth))), vec!["1"]);
}

#[test]
fn negative_zero_prints_as_zero() {
    assert_eq!(run_ok("print -0; print 0 * -1;"), vec!["0", "0"]);
}

#[test]
fn assignment_in_own_initializer_targets_the_outer_local() {
    assert_eq!(
        run_ok("{ var a = 1; { var a = a = 2; print a; } print a; }"),
        vec!["2", "2"]
    );
}

#[test]
fn functions_without_return_yield_nil() {
    assert_eq!(run_ok("fun f() {} print f();"), vec!["nil"]);
}

#[test]
fn function_literals() {
    assert_eq!(
        run_ok("var add = fun (a, b) { return a + b; }; print add(2, 3); print fun () { return \"now\"; }();"),
        vec!["5", "now"]
    );
}

#[test]
fn local_function_literal_can_recurse() {
    assert_eq!(
        run_ok("{ var f = fun (n) { if (n == 0) return 0; return n + f(n - 1); }; print f(3); }"),
        vec!["6"]
    );
}

#[test]
fn callables_print_their_name_and_arity() {
    assert_eq!(
        run_ok("fun make() {} print make; print clock; print fun (x) {};"),
        vec!["<fun make/0>", "<native fn clock>", "<fun anonymous/1>"]
    );
}

#[test]
fn clock_returns_seconds() {
    let lines = run_ok("print clock() > 1000000000;");

    assert_eq!(lines, vec!["true"]);
}

#[test]
fn nested_block_comments_are_skipped() {
    assert_eq!(
        run_ok("/* outer /* inner */ still outer */ print 1;"),
        vec!["1"]
    );
}

#[test]
fn type_errors_describe_the_offending_value() {
    assert_eq!(
        runtime_error("print 1 + \"a\";").1,
        "Expected a number, got string \"a\".\n[line 1]"
    );
    assert_eq!(
        runtime_error("print \"a\" + 1;").1,
        "Expected a string, got number 1.\n[line 1]"
    );
    assert_eq!(
        runtime_error("print nil + 1;").1,
        "Operands must be two numbers or two strings, got nil.\n[line 1]"
    );
    assert_eq!(
        runtime_error("print -\"x\";").1,
        "Operand must be a number, got string \"x\".\n[line 1]"
    );
    assert_eq!(
        runtime_error("print 1 < nil;").1,
        "Operands must be numbers, got nil.\n[line 1]"
    );
}

#[test]
fn call_errors() {
    assert_eq!(
        runtime_error("fun f(a) {} f(1, 2);").1,
        "Expected 1 arguments but got 2.\n[line 1]"
    );
    assert_eq!(
        runtime_error("\"str\"();").1,
        "Can only call functions, got string \"str\".\n[line 1]"
    );
}

#[test]
fn undefined_variables_are_runtime_errors() {
    assert_eq!(
        runtime_error("\n\nprint nope;").1,
        "Undefined variable 'nope'.\n[line 3]"
    );
    assert_eq!(
        runtime_error("y = 1;").1,
        "Undefined variable 'y'.\n[line 1]"
    );
}

#[test]
fn runtime_error_aborts_the_rest_of_the_unit() {
    let (output, message) = runtime_error("print 1; print nope; print 2;");

    assert_eq!(output, "1\n");
    assert!(message.starts_with("Undefined variable 'nope'."));
}

#[test]
fn static_errors_prevent_execution() {
    let (output, result) = run("print 1; print (;");

    assert_eq!(output, "");
    assert!(matches!(result, Err(RunError::Compile(ref errors)) if errors.len() == 1));
}

#[test]
fn globals_persist_across_units() {
    let (mut aq, out) = session();

    assert!(aq.run("var a = 1;").is_ok());
    assert!(aq.run("fun inc() { a = a + 1; }").is_ok());
    assert!(aq.run("inc(); print a;").is_ok());

    assert_eq!(out.contents(), "2\n");
}

#[test]
fn closures_from_earlier_units_still_resolve() {
    let (mut aq, out) = session();

    assert!(aq
        .run("fun mk() { var n = 10; fun g() { return n; } return g; } var g = mk();")
        .is_ok());
    assert!(aq.run("print g();").is_ok());

    assert_eq!(out.contents(), "10\n");
}

#[test]
fn environment_is_reset_after_an_error_inside_a_block() {
    let (mut aq, out) = session();

    assert!(matches!(
        aq.run("{ var inner = 1; print missing; }"),
        Err(RunError::Runtime(_))
    ));
    assert!(aq.run("var top = 2; print top;").is_ok());

    assert_eq!(out.contents(), "2\n");
}

struct Add;

impl NativeFunction for Add {
    fn name(&self) -> &str {
        "add"
    }

    fn arity(&self) -> usize {
        2
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value, String> {
        match (&arguments[0], &arguments[1]) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            _ => Err("add expects numbers.".to_string()),
        }
    }
}

#[test]
fn host_can_inject_native_functions() {
    let (mut aq, out) = session();
    aq.interpreter_mut().define_native(Rc::new(Add));

    assert!(aq.run("print add(40, 2); print add;").is_ok());
    assert_eq!(out.contents(), "42\n<native fn add>\n");

    match aq.run("add(1, \"x\");") {
        Err(RunError::Runtime(e)) => assert_eq!(e.to_string(), "add expects numbers.\n[line 1]"),
        other => panic!("expected a runtime error, got {:?}", other),
    }

    match aq.run("add(1);") {
        Err(RunError::Runtime(e)) => assert!(e.to_string().starts_with("Expected 2 arguments but got 1.")),
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn repl_runs_each_line_and_keeps_going_after_errors() {
    let (mut aq, out) = session();
    let input = Cursor::new("var a = 3;\nprint a;\nprint nope;\nprint (;\nprint a + 1;\n");
    let prompt = SharedBuffer::default();
    let diagnostics = SharedBuffer::default();

    let result = repl(&mut aq, input, prompt.clone(), diagnostics.clone());

    assert!(result.is_ok());
    assert_eq!(out.contents(), "3\n4\n");
    assert_eq!(prompt.contents(), "> > > > > > \n");
    assert_eq!(
        diagnostics.contents(),
        "Undefined variable 'nope'.\n[line 1]\n[line 1] Error at ';': Expect expression.\n"
    );
}
