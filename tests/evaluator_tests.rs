use monkey::environment::Environment;
use monkey::evaluator::eval_program;
use monkey::lexer::Lexer;
use monkey::object::Object;
use monkey::parser::Parser;
use std::rc::Rc;

fn eval(input: &str) -> Rc<Object> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();
    assert!(parser.errors().is_empty(), "parser errors: {:?}", parser.errors());

    let env = Environment::new();
    eval_program(&program, &env)
}

fn assert_integer(input: &str, expected: i64) {
    match &*eval(input) {
        Object::Integer(value) => assert_eq!(*value, expected, "input {:?}", input),
        other => panic!("not an integer for {:?}: {:?}", input, other),
    }
}

fn assert_boolean(input: &str, expected: bool) {
    match &*eval(input) {
        Object::Boolean(value) => assert_eq!(*value, expected, "input {:?}", input),
        other => panic!("not a boolean for {:?}: {:?}", input, other),
    }
}

fn assert_null(input: &str) {
    let result = eval(input);
    assert!(matches!(&*result, Object::Null), "not null for {:?}: {:?}", input, result);
}

fn assert_error(input: &str, expected: &str) {
    match &*eval(input) {
        Object::Error(message) => assert_eq!(message, expected, "input {:?}", input),
        other => panic!("not an error for {:?}: {:?}", input, other),
    }
}

#[test]
fn integer_expressions() {
    for (input, expected) in [
        ("5", 5),
        ("10", 10),
        ("-5", -5),
        ("-10", -10),
        ("5 + 5 + 5 + 5 - 10", 10),
        ("2 * 2 * 2 * 2 * 2", 32),
        ("-50 + 100 + -50", 0),
        ("50 / 2 * 2 + 10", 60),
        ("3 * (3 * 3) + 10", 37),
        ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
    ] {
        assert_integer(input, expected);
    }
}

#[test]
fn boolean_expressions() {
    for (input, expected) in [
        ("true", true),
        ("false", false),
        ("1 < 2", true),
        ("1 > 2", false),
        ("1 == 1", true),
        ("1 != 2", true),
        ("true == true", true),
        ("false != true", true),
        ("(1 < 2) == true", true),
    ] {
        assert_boolean(input, expected);
    }
}

#[test]
fn bang_operator() {
    for (input, expected) in [
        ("!true", false),
        ("!false", true),
        ("!5", false),
        ("!!true", true),
        ("!!5", true),
    ] {
        assert_boolean(input, expected);
    }
}

#[test]
fn if_else_expressions() {
    assert_integer("if (true) { 10 }", 10);
    assert_integer("if (1) { 10 }", 10);
    assert_integer("if (1 < 2) { 10 }", 10);
    assert_integer("if (1 > 2) { 10 } else { 20 }", 20);
    assert_null("if (false) { 10 }");
    assert_null("if (1 > 2) { 10 }");
}

#[test]
fn return_statements() {
    for (input, expected) in [
        ("return 10;", 10),
        ("return 10; 9;", 10),
        ("return 2 * 5; 9;", 10),
        ("9; return 2 * 5; 9;", 10),
        (
            "if (10 > 1) {
               if (10 > 1) {
                 return 10;
               }
               return 1;
             }",
            10,
        ),
    ] {
        assert_integer(input, expected);
    }
}

#[test]
fn error_handling() {
    for (input, expected) in [
        ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
        ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
        ("-true", "unknown operator: -BOOLEAN"),
        ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
        ("5; true + false; 5", "unknown operator: BOOLEAN + BOOLEAN"),
        (
            "if (10 > 1) { true + false; }",
            "unknown operator: BOOLEAN + BOOLEAN",
        ),
        ("foobar", "identifier not found: foobar"),
        ("\"Hello\" - \"World\"", "unknown operator: STRING - STRING"),
        (
            "{\"name\": \"Monkey\"}[fn(x) { x }];",
            "unusable as hash key: FUNCTION",
        ),
        ("10 / 0", "division by zero"),
    ] {
        assert_error(input, expected);
    }
}

#[test]
fn let_statements() {
    for (input, expected) in [
        ("let a = 5; a;", 5),
        ("let a = 5 * 5; a;", 25),
        ("let a = 5; let b = a; b;", 5),
        ("let a = 5; let b = a; let c = a + b + 5; c;", 15),
    ] {
        assert_integer(input, expected);
    }
}

#[test]
fn function_application() {
    for (input, expected) in [
        ("let identity = fn(x) { x; }; identity(5);", 5),
        ("let identity = fn(x) { return x; }; identity(5);", 5),
        ("let double = fn(x) { x * 2; }; double(5);", 10),
        ("let add = fn(x, y) { x + y; }; add(5, 5);", 10),
        ("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20),
        ("fn(x) { x; }(5)", 5),
    ] {
        assert_integer(input, expected);
    }
}

#[test]
fn closures() {
    assert_integer(
        "let newAdder = fn(x) { fn(y) { x + y }; };
         let addTwo = newAdder(2);
         addTwo(2);",
        4,
    );
    assert_integer(
        "let newAdder = fn(a, b) { let c = a + b; fn(d) { c + d } };
         let add = newAdder(1, 2);
         add(8);",
        11,
    );
}

#[test]
fn recursion() {
    assert_integer(
        "let fib = fn(x) {
           if (x == 0) { 0 } else {
             if (x == 1) { 1 } else { fib(x - 1) + fib(x - 2) }
           }
         };
         fib(10);",
        55,
    );
}

#[test]
fn string_concatenation() {
    match &*eval("\"Hello\" + \" \" + \"World!\"") {
        Object::Str(value) => assert_eq!(value, "Hello World!"),
        other => panic!("not a string: {:?}", other),
    }
}

#[test]
fn builtin_functions() {
    assert_integer("len(\"\")", 0);
    assert_integer("len(\"four\")", 4);
    assert_integer("len([1, 2, 3])", 3);
    assert_error("len(1)", "argument to `len` not supported, got INTEGER");
    assert_error("len(\"one\", \"two\")", "wrong number of arguments. got=2, want=1");
    assert_integer("first([1, 2, 3])", 1);
    assert_null("first([])");
    assert_integer("last([1, 2, 3])", 3);
    assert_integer("len(rest([1, 2, 3]))", 2);
    assert_integer("len(push([], 1))", 1);
}

#[test]
fn array_literals_and_indexing() {
    assert_integer("[1, 2 * 2, 3 + 3][1]", 4);
    assert_integer("let myArray = [1, 2, 3]; myArray[2];", 3);
    assert_null("[1, 2, 3][3]");
    assert_null("[1, 2, 3][-1]");
}

#[test]
fn hash_literals_and_indexing() {
    assert_integer(
        "let two = \"two\";
         let h = {\"one\": 10 - 9, two: 1 + 1, \"thr\" + \"ee\": 6 / 2, 4: 4, true: 5, false: 6};
         h[\"one\"] + h[\"two\"] + h[\"three\"] + h[4] + h[true] + h[false]",
        21,
    );
    assert_null("{\"foo\": 5}[\"bar\"]");
    assert_null("{}[\"foo\"]");
}
