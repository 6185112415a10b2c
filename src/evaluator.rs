use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{BlockStatement, Expression, Identifier, Program, Statement};
use crate::builtins::get_builtin_by_name;
use crate::environment::Environment;
use crate::object::{
    is_truthy, native_bool_to_object, null_object, Function, HashKey, HashPair, Object,
};

type Env = Rc<RefCell<Environment>>;

/// Tree-walking engine: the alternate back end. Errors are `Error`
/// values that short-circuit outward, not `Err` results.
pub fn eval_program(program: &Program, env: &Env) -> Rc<Object> {
    let mut result = null_object();

    for statement in &program.statements {
        result = eval_statement(statement, env);

        match &*result {
            Object::ReturnValue(value) => return Rc::clone(value),
            Object::Error(_) => return result,
            _ => {}
        }
    }

    result
}

fn eval_statement(statement: &Statement, env: &Env) -> Rc<Object> {
    match statement {
        Statement::Expression { expression, .. } => eval_expression(expression, env),
        Statement::Let { name, value, .. } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            env.borrow_mut().set(&name.value, value);
            null_object()
        }
        Statement::Return { value, .. } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            Rc::new(Object::ReturnValue(value))
        }
    }
}

/// Blocks pass `ReturnValue` wrappers through unopened so a `return`
/// deep in nested blocks still unwinds the whole function.
fn eval_block(block: &BlockStatement, env: &Env) -> Rc<Object> {
    let mut result = null_object();

    for statement in &block.statements {
        result = eval_statement(statement, env);

        if matches!(&*result, Object::ReturnValue(_) | Object::Error(_)) {
            return result;
        }
    }

    result
}

fn eval_expression(expression: &Expression, env: &Env) -> Rc<Object> {
    match expression {
        Expression::IntegerLiteral { value, .. } => Rc::new(Object::Integer(*value)),
        Expression::StringLiteral { value, .. } => Rc::new(Object::Str(value.clone())),
        Expression::Boolean { value, .. } => native_bool_to_object(*value),
        Expression::Identifier(ident) => eval_identifier(ident, env),
        Expression::Prefix {
            operator, right, ..
        } => {
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_prefix_expression(operator, right)
        }
        Expression::Infix {
            left,
            operator,
            right,
            ..
        } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_infix_expression(operator, left, right)
        }
        Expression::If {
            condition,
            consequence,
            alternative,
            ..
        } => {
            let condition = eval_expression(condition, env);
            if condition.is_error() {
                return condition;
            }
            if is_truthy(&condition) {
                eval_block(consequence, env)
            } else if let Some(alt) = alternative {
                eval_block(alt, env)
            } else {
                null_object()
            }
        }
        Expression::FunctionLiteral {
            parameters, body, ..
        } => Rc::new(Object::Function(Function {
            parameters: parameters.clone(),
            body: body.clone(),
            env: Rc::clone(env),
        })),
        Expression::Call {
            function,
            arguments,
            ..
        } => {
            let function = eval_expression(function, env);
            if function.is_error() {
                return function;
            }
            let args = match eval_expressions(arguments, env) {
                Ok(args) => args,
                Err(err) => return err,
            };
            apply_function(function, &args)
        }
        Expression::ArrayLiteral { elements, .. } => {
            let elements = match eval_expressions(elements, env) {
                Ok(elements) => elements,
                Err(err) => return err,
            };
            Rc::new(Object::Array(elements))
        }
        Expression::Index { left, index, .. } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let index = eval_expression(index, env);
            if index.is_error() {
                return index;
            }
            eval_index_expression(left, index)
        }
        Expression::HashLiteral { pairs, .. } => eval_hash_literal(pairs, env),
    }
}

fn eval_identifier(ident: &Identifier, env: &Env) -> Rc<Object> {
    if let Some(value) = env.borrow().get(&ident.value) {
        return value;
    }
    if let Some(builtin) = get_builtin_by_name(&ident.value) {
        return Rc::new(Object::Builtin(builtin));
    }
    new_error(format!("identifier not found: {}", ident.value))
}

fn eval_expressions(expressions: &[Expression], env: &Env) -> Result<Vec<Rc<Object>>, Rc<Object>> {
    let mut results = Vec::with_capacity(expressions.len());

    for expression in expressions {
        let result = eval_expression(expression, env);
        if result.is_error() {
            return Err(result);
        }
        results.push(result);
    }

    Ok(results)
}

fn eval_prefix_expression(operator: &str, right: Rc<Object>) -> Rc<Object> {
    match operator {
        "!" => eval_bang_operator(right),
        "-" => match &*right {
            Object::Integer(value) => Rc::new(Object::Integer(value.wrapping_neg())),
            other => new_error(format!("unknown operator: -{}", other.type_name())),
        },
        other => new_error(format!("unknown operator: {}{}", other, right.type_name())),
    }
}

fn eval_bang_operator(right: Rc<Object>) -> Rc<Object> {
    match &*right {
        Object::Boolean(value) => native_bool_to_object(!value),
        Object::Null => native_bool_to_object(true),
        _ => native_bool_to_object(false),
    }
}

fn eval_infix_expression(operator: &str, left: Rc<Object>, right: Rc<Object>) -> Rc<Object> {
    match (&*left, &*right) {
        (Object::Integer(l), Object::Integer(r)) => {
            eval_integer_infix_expression(operator, *l, *r)
        }
        (Object::Str(l), Object::Str(r)) => {
            if operator == "+" {
                Rc::new(Object::Str(format!("{}{}", l, r)))
            } else {
                new_error(format!(
                    "unknown operator: {} {} {}",
                    left.type_name(),
                    operator,
                    right.type_name()
                ))
            }
        }
        _ => match operator {
            "==" => native_bool_to_object(Rc::ptr_eq(&left, &right)),
            "!=" => native_bool_to_object(!Rc::ptr_eq(&left, &right)),
            _ => {
                if left.type_name() != right.type_name() {
                    new_error(format!(
                        "type mismatch: {} {} {}",
                        left.type_name(),
                        operator,
                        right.type_name()
                    ))
                } else {
                    new_error(format!(
                        "unknown operator: {} {} {}",
                        left.type_name(),
                        operator,
                        right.type_name()
                    ))
                }
            }
        },
    }
}

fn eval_integer_infix_expression(operator: &str, left: i64, right: i64) -> Rc<Object> {
    match operator {
        "+" => Rc::new(Object::Integer(left.wrapping_add(right))),
        "-" => Rc::new(Object::Integer(left.wrapping_sub(right))),
        "*" => Rc::new(Object::Integer(left.wrapping_mul(right))),
        "/" => {
            if right == 0 {
                new_error("division by zero".to_string())
            } else {
                Rc::new(Object::Integer(left.wrapping_div(right)))
            }
        }
        "<" => native_bool_to_object(left < right),
        ">" => native_bool_to_object(left > right),
        "==" => native_bool_to_object(left == right),
        "!=" => native_bool_to_object(left != right),
        other => new_error(format!("unknown operator: INTEGER {} INTEGER", other)),
    }
}

fn eval_index_expression(left: Rc<Object>, index: Rc<Object>) -> Rc<Object> {
    match (&*left, &*index) {
        (Object::Array(elements), Object::Integer(i)) => {
            if *i < 0 || *i as usize >= elements.len() {
                null_object()
            } else {
                Rc::clone(&elements[*i as usize])
            }
        }
        (Object::Hash(pairs), _) => match index.hash_key() {
            Ok(hash_key) => match pairs.get(&hash_key) {
                Some(pair) => Rc::clone(&pair.value),
                None => null_object(),
            },
            Err(message) => new_error(message),
        },
        _ => new_error(format!(
            "index operator not supported: {}",
            left.type_name()
        )),
    }
}

fn eval_hash_literal(pairs: &[(Expression, Expression)], env: &Env) -> Rc<Object> {
    let mut hashed: HashMap<HashKey, HashPair> = HashMap::new();

    for (key_expr, value_expr) in pairs {
        let key = eval_expression(key_expr, env);
        if key.is_error() {
            return key;
        }

        let hash_key = match key.hash_key() {
            Ok(hash_key) => hash_key,
            Err(message) => return new_error(message),
        };

        let value = eval_expression(value_expr, env);
        if value.is_error() {
            return value;
        }

        hashed.insert(hash_key, HashPair { key, value });
    }

    Rc::new(Object::Hash(hashed))
}

fn apply_function(function: Rc<Object>, args: &[Rc<Object>]) -> Rc<Object> {
    match &*function {
        Object::Function(func) => {
            if args.len() != func.parameters.len() {
                return new_error(format!(
                    "wrong number of arguments: want={}, got={}",
                    func.parameters.len(),
                    args.len()
                ));
            }

            let extended = Environment::new_enclosed(Rc::clone(&func.env));
            for (parameter, arg) in func.parameters.iter().zip(args) {
                extended.borrow_mut().set(&parameter.value, Rc::clone(arg));
            }

            let result = eval_block(&func.body, &extended);
            unwrap_return_value(result)
        }
        Object::Builtin(builtin) => (builtin.func)(args).unwrap_or_else(null_object),
        other => new_error(format!("not a function: {}", other.type_name())),
    }
}

fn unwrap_return_value(object: Rc<Object>) -> Rc<Object> {
    match &*object {
        Object::ReturnValue(value) => Rc::clone(value),
        _ => object,
    }
}

fn new_error(message: String) -> Rc<Object> {
    Rc::new(Object::Error(message))
}
