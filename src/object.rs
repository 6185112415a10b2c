use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::ast::{BlockStatement, Identifier};
use crate::builtins::Builtin;
use crate::environment::Environment;
use crate::opcode::Instructions;

pub const INTEGER_OBJ: &str = "INTEGER";
pub const BOOLEAN_OBJ: &str = "BOOLEAN";
pub const STRING_OBJ: &str = "STRING";
pub const NULL_OBJ: &str = "NULL";
pub const RETURN_VALUE_OBJ: &str = "RETURN_VALUE";
pub const ERROR_OBJ: &str = "ERROR";
pub const FUNCTION_OBJ: &str = "FUNCTION";
pub const BUILTIN_OBJ: &str = "BUILTIN";
pub const ARRAY_OBJ: &str = "ARRAY";
pub const HASH_OBJ: &str = "HASH";
pub const COMPILED_FUNCTION_OBJ: &str = "COMPILED_FUNCTION_OBJ";
pub const CLOSURE_OBJ: &str = "CLOSURE";

/// A runtime value. Shared through `Rc`; the constant pool, globals,
/// stack slots, and container elements all hold references.
#[derive(Debug)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Str(String),
    Null,
    Array(Vec<Rc<Object>>),
    Hash(HashMap<HashKey, HashPair>),
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    Builtin(&'static Builtin),
    Function(Function),
    /// Internal control carrier for the tree-walking engine; never a
    /// user-visible value.
    ReturnValue(Rc<Object>),
    Error(String),
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => INTEGER_OBJ,
            Object::Boolean(_) => BOOLEAN_OBJ,
            Object::Str(_) => STRING_OBJ,
            Object::Null => NULL_OBJ,
            Object::Array(_) => ARRAY_OBJ,
            Object::Hash(_) => HASH_OBJ,
            Object::CompiledFunction(_) => COMPILED_FUNCTION_OBJ,
            Object::Closure(_) => CLOSURE_OBJ,
            Object::Builtin(_) => BUILTIN_OBJ,
            Object::Function(_) => FUNCTION_OBJ,
            Object::ReturnValue(_) => RETURN_VALUE_OBJ,
            Object::Error(_) => ERROR_OBJ,
        }
    }

    pub fn inspect(&self) -> String {
        match self {
            Object::Integer(value) => value.to_string(),
            Object::Boolean(value) => value.to_string(),
            Object::Str(value) => value.clone(),
            Object::Null => "null".to_string(),
            Object::Array(elements) => {
                let elems: Vec<String> = elements.iter().map(|e| e.inspect()).collect();
                format!("[{}]", elems.join(", "))
            }
            Object::Hash(pairs) => {
                let rendered: Vec<String> = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key.inspect(), pair.value.inspect()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Object::CompiledFunction(func) => {
                format!("CompiledFunction[{:p}]", Rc::as_ptr(func))
            }
            Object::Closure(closure) => format!("Closure[{:p}]", Rc::as_ptr(closure)),
            Object::Builtin(_) => "builtin function".to_string(),
            Object::Function(func) => {
                let params: Vec<String> =
                    func.parameters.iter().map(|p| p.value.clone()).collect();
                format!("fn({}) {{\n{}\n}}", params.join(", "), func.body)
            }
            Object::ReturnValue(value) => value.inspect(),
            Object::Error(message) => format!("ERROR: {}", message),
        }
    }

    /// Hash keys exist for integers, booleans, and strings only.
    pub fn hash_key(&self) -> Result<HashKey, String> {
        match self {
            Object::Integer(value) => Ok(HashKey {
                object_type: INTEGER_OBJ,
                value: *value as u64,
            }),
            Object::Boolean(value) => Ok(HashKey {
                object_type: BOOLEAN_OBJ,
                value: u64::from(*value),
            }),
            Object::Str(value) => {
                // DefaultHasher::new() hashes identically for every
                // instance in a program run.
                let mut hasher = DefaultHasher::new();
                value.hash(&mut hasher);
                Ok(HashKey {
                    object_type: STRING_OBJ,
                    value: hasher.finish(),
                })
            }
            other => Err(format!("unusable as hash key: {}", other.type_name())),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }
}

thread_local! {
    static TRUE: Rc<Object> = Rc::new(Object::Boolean(true));
    static FALSE: Rc<Object> = Rc::new(Object::Boolean(false));
    static NULL: Rc<Object> = Rc::new(Object::Null);
}

/// The interned `true`/`false`/`null` values. Every VM and evaluator on
/// a thread shares them, so identity comparison behaves like value
/// comparison for these three.
pub fn true_object() -> Rc<Object> {
    TRUE.with(Rc::clone)
}

pub fn false_object() -> Rc<Object> {
    FALSE.with(Rc::clone)
}

pub fn null_object() -> Rc<Object> {
    NULL.with(Rc::clone)
}

pub fn native_bool_to_object(value: bool) -> Rc<Object> {
    if value {
        true_object()
    } else {
        false_object()
    }
}

/// `false` and `null` are the only non-truthy values.
pub fn is_truthy(object: &Object) -> bool {
    match object {
        Object::Boolean(value) => *value,
        Object::Null => false,
        _ => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub object_type: &'static str,
    pub value: u64,
}

#[derive(Debug, Clone)]
pub struct HashPair {
    pub key: Rc<Object>,
    pub value: Rc<Object>,
}

/// Immutable bytecode of one function body; lives in the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A compiled function paired with the values captured for its free
/// variables at construction time.
#[derive(Debug)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Rc<Object>>,
}

/// A function value of the tree-walking engine: parameters, body, and
/// the environment it closes over.
pub struct Function {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
    pub env: Rc<RefCell<Environment>>,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Deliberately shallow: the captured environment can reach this
        // function again.
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
