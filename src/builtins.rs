use std::rc::Rc;

use crate::object::{Object, ARRAY_OBJ};

/// A builtin takes its arguments and returns a value, or `None` to mean
/// "push null". Errors come back as `Object::Error` values, never as
/// `Err`.
pub type BuiltinFunction = fn(&[Rc<Object>]) -> Option<Rc<Object>>;

#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFunction,
}

/// The builtin table. The order is part of the bytecode ABI: OpGetBuiltin
/// operands index into it.
pub static BUILTINS: [Builtin; 6] = [
    Builtin {
        name: "len",
        func: builtin_len,
    },
    Builtin {
        name: "puts",
        func: builtin_puts,
    },
    Builtin {
        name: "first",
        func: builtin_first,
    },
    Builtin {
        name: "last",
        func: builtin_last,
    },
    Builtin {
        name: "rest",
        func: builtin_rest,
    },
    Builtin {
        name: "push",
        func: builtin_push,
    },
];

pub fn get_builtin_by_name(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

fn new_error(message: String) -> Option<Rc<Object>> {
    Some(Rc::new(Object::Error(message)))
}

fn wrong_arity(got: usize, want: usize) -> Option<Rc<Object>> {
    new_error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    ))
}

fn builtin_len(args: &[Rc<Object>]) -> Option<Rc<Object>> {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match &*args[0] {
        Object::Str(value) => Some(Rc::new(Object::Integer(value.len() as i64))),
        Object::Array(elements) => Some(Rc::new(Object::Integer(elements.len() as i64))),
        other => new_error(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        )),
    }
}

fn builtin_puts(args: &[Rc<Object>]) -> Option<Rc<Object>> {
    for arg in args {
        println!("{}", arg.inspect());
    }
    None
}

fn builtin_first(args: &[Rc<Object>]) -> Option<Rc<Object>> {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match &*args[0] {
        Object::Array(elements) => elements.first().map(Rc::clone),
        other => new_error(format!(
            "argument to `first` must be {}, got {}",
            ARRAY_OBJ,
            other.type_name()
        )),
    }
}

fn builtin_last(args: &[Rc<Object>]) -> Option<Rc<Object>> {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match &*args[0] {
        Object::Array(elements) => elements.last().map(Rc::clone),
        other => new_error(format!(
            "argument to `last` must be {}, got {}",
            ARRAY_OBJ,
            other.type_name()
        )),
    }
}

fn builtin_rest(args: &[Rc<Object>]) -> Option<Rc<Object>> {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match &*args[0] {
        Object::Array(elements) => {
            if elements.is_empty() {
                return None;
            }
            let rest: Vec<Rc<Object>> = elements[1..].iter().map(Rc::clone).collect();
            Some(Rc::new(Object::Array(rest)))
        }
        other => new_error(format!(
            "argument to `rest` must be {}, got {}",
            ARRAY_OBJ,
            other.type_name()
        )),
    }
}

fn builtin_push(args: &[Rc<Object>]) -> Option<Rc<Object>> {
    if args.len() != 2 {
        return wrong_arity(args.len(), 2);
    }
    match &*args[0] {
        Object::Array(elements) => {
            let mut pushed: Vec<Rc<Object>> = elements.iter().map(Rc::clone).collect();
            pushed.push(Rc::clone(&args[1]));
            Some(Rc::new(Object::Array(pushed)))
        }
        other => new_error(format!(
            "argument to `push` must be {}, got {}",
            ARRAY_OBJ,
            other.type_name()
        )),
    }
}
