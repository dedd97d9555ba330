mod common;

use aq::ast::{Expr, Stmt};
use aq::ast_printer::AstPrinter;
use aq::parser::Parser;
use aq::scanner::scan;

use common::compile_errors;

fn parse(source: &str) -> Vec<Stmt> {
    let (tokens, errors) = scan(source);
    assert!(errors.is_empty(), "scan errors: {:?}", errors);

    match Parser::new(&tokens).parse() {
        Ok(statements) => statements,
        Err(errors) => panic!("parse errors: {:?}", errors),
    }
}

fn printed(source: &str) -> Vec<String> {
    parse(source).iter().map(AstPrinter::print_stmt).collect()
}

fn parse_errors(source: &str) -> Vec<String> {
    let (tokens, _) = scan(source);

    match Parser::new(&tokens).parse() {
        Ok(_) => panic!("expected parse errors for: {}", source),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    }
}

#[test]
fn precedence_climbs_from_or_to_unary() {
    assert_eq!(
        printed("1 + 2 * 3 - -4 / 2;"),
        vec!["(; (- (+ 1.0 (* 2.0 3.0)) (/ (- 4.0) 2.0)))"]
    );
    assert_eq!(
        printed("a or b and c == d < e;"),
        vec!["(; (or a (and b (== c (< d e)))))"]
    );
    assert_eq!(printed("!!(true);"), vec!["(; (! (! (group true))))"]);
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(printed("a = b = 3;"), vec!["(; (= a (= b 3.0)))"]);
}

#[test]
fn calls_chain_left_to_right() {
    assert_eq!(
        printed("f(1)(2, x)();"),
        vec!["(; (call (call (call f 1.0) 2.0 x)))"]
    );
}

#[test]
fn declarations_and_function_literals() {
    assert_eq!(
        printed("var a; var b = \"s\"; fun add(x, y) { return x + y; } var f = fun (n) { print n; };"),
        vec![
            "(var a)",
            "(var b s)",
            "(fun add (x y) (block (return (+ x y))))",
            "(var f (fun (n) (block (print n))))",
        ]
    );
}

#[test]
fn statement_starting_with_fun_literal_is_an_expression() {
    let statements = parse("fun () { return 1; }();");

    match &statements[..] {
        [Stmt::Expression(Expr::Call { callee, .. })] => {
            assert!(matches!(**callee, Expr::Function(_)));
        }
        other => panic!("unexpected AST: {:?}", other),
    }
}

#[test]
fn dangling_else_binds_to_nearest_if() {
    assert_eq!(
        printed("if (a) if (b) print 1; else print 2;"),
        vec!["(if a (if b (print 1.0) (print 2.0)))"]
    );
}

#[test]
fn for_desugars_into_block_and_while() {
    assert_eq!(
        printed("for (var i = 0; i < 3; i = i + 1) print i;"),
        vec!["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
    );
}

#[test]
fn for_without_clauses_loops_on_true_with_unmodified_body() {
    assert_eq!(
        printed("for (;;) break;"),
        vec!["(while true (break))"]
    );
}

#[test]
fn break_outside_loop_is_rejected() {
    assert_eq!(
        parse_errors("break;"),
        vec!["[line 1] Error at 'break': Can't use 'break' outside of a loop."]
    );
}

#[test]
fn break_does_not_cross_function_bodies() {
    let errors = parse_errors("while (true) { fun f() { break; } }");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("outside of a loop"));
}

#[test]
fn break_inside_nested_loops_is_accepted() {
    assert_eq!(
        printed("while (a) { for (;;) { break; } break; }"),
        vec!["(while a (block (while true (block (break))) (break)))"]
    );
}

#[test]
fn invalid_assignment_target_is_reported_without_aborting() {
    let errors = parse_errors("a + b = c; print 1;");

    assert_eq!(
        errors,
        vec!["[line 1] Error at '=': Invalid assignment target."]
    );
}

#[test]
fn errors_at_end_of_input_say_so() {
    assert_eq!(
        parse_errors("print 1"),
        vec!["[line 1] Error at end: Expect ';' after value."]
    );
}

#[test]
fn recovery_continues_with_next_statement() {
    let errors = parse_errors("var = 1;\nprint (;\nvar ok = 2;\nprint ok +;");

    assert_eq!(
        errors,
        vec![
            "[line 1] Error at '=': Expect variable name.",
            "[line 2] Error at ';': Expect expression.",
            "[line 4] Error at ';': Expect expression.",
        ]
    );
}

#[test]
fn errors_inside_blocks_recover_within_the_block() {
    let errors = parse_errors("{ var 1; print 2; }\nprint 3");

    assert_eq!(errors.len(), 2);
    assert!(errors[0].starts_with("[line 1] Error at '1'"));
    assert_eq!(errors[1], "[line 2] Error at end: Expect ';' after value.");
}

#[test]
fn too_many_arguments_is_reported_but_parsed() {
    let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
    let source = format!("f({});", args.join(", "));

    let errors = parse_errors(&source);

    assert_eq!(errors.len(), 1);
    assert!(errors[0].ends_with("Can't have more than 255 arguments."));
}

#[test]
fn too_many_parameters_is_reported() {
    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));

    let errors = parse_errors(&source);

    assert_eq!(errors.len(), 1);
    assert!(errors[0].ends_with("Can't have more than 255 parameters."));
}

#[test]
fn exactly_255_arguments_is_fine() {
    let args: Vec<String> = (0..255).map(|i| i.to_string()).collect();
    let statements = parse(&format!("f({});", args.join(", ")));

    match &statements[..] {
        [Stmt::Expression(Expr::Call { arguments, .. })] => assert_eq!(arguments.len(), 255),
        other => panic!("unexpected AST: {:?}", other),
    }
}

#[test]
fn bare_expression_parses_on_its_own() {
    let (tokens, _) = scan("(1 + 2) * x");

    match Parser::new(&tokens).parse_expression() {
        Ok(expr) => assert_eq!(AstPrinter::print_expr(&expr), "(* (group (+ 1.0 2.0)) x)"),
        Err(errors) => panic!("parse errors: {:?}", errors),
    }

    let (tokens, _) = scan("1 2");
    let errors = Parser::new(&tokens).parse_expression().unwrap_err();

    assert_eq!(errors[0].to_string(), "[line 1] Error at '2': Expect end of expression.");
}

#[test]
#[should_panic(expected = "token list must end with EOF")]
fn parser_rejects_an_empty_token_list() {
    Parser::new(&[]);
}

#[test]
fn deeply_nested_statements_parse() {
    let depth = 2_000;
    let source = format!("{}print 1;{}", "{".repeat(depth), "}".repeat(depth));

    assert_eq!(parse(&source).len(), 1);
}

#[test]
fn lexical_and_syntax_errors_are_reported_together() {
    let errors = compile_errors("var a = @;\nprint a");

    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0], "[line 1] Error: Unexpected character: @");
    assert_eq!(errors[1], "[line 1] Error at ';': Expect expression.");
    assert_eq!(errors[2], "[line 2] Error at end: Expect ';' after value.");
}
