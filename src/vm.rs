use std::collections::HashMap;
use std::convert::TryFrom;
use std::rc::Rc;

use crate::builtins::{Builtin, BUILTINS};
use crate::compiler::Bytecode;
use crate::object::{
    false_object, is_truthy, native_bool_to_object, null_object, true_object, Closure,
    CompiledFunction, HashKey, HashPair, Object,
};
use crate::opcode::{self, Instructions, Opcode};

/// Sizing is part of the ABI: global indices are 16-bit operands, and
/// overflowing the value stack or the frame stack is fatal.
pub const STACK_SIZE: usize = 2048;
pub const GLOBALS_SIZE: usize = 65536;
pub const MAX_FRAMES: usize = 1024;

/// Per-call record: the running closure, its instruction pointer, and
/// the stack slot its locals start at.
struct Frame {
    closure: Rc<Closure>,
    ip: isize,
    base_pointer: usize,
}

impl Frame {
    fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Frame {
            closure,
            ip: -1,
            base_pointer,
        }
    }

    fn instructions(&self) -> &Instructions {
        &self.closure.func.instructions
    }
}

pub struct Vm {
    constants: Vec<Rc<Object>>,

    stack: Vec<Rc<Object>>,
    /// Points one past the top of the stack.
    sp: usize,

    globals: Vec<Rc<Object>>,

    frames: Vec<Frame>,
}

impl Vm {
    pub fn new(bytecode: Bytecode) -> Self {
        let globals = vec![null_object(); GLOBALS_SIZE];
        Self::with_globals(bytecode, globals)
    }

    /// Reuse a globals store from an earlier run; the REPL threads it
    /// through successive lines.
    pub fn with_globals(bytecode: Bytecode, globals: Vec<Rc<Object>>) -> Self {
        let main_fn = Rc::new(CompiledFunction {
            instructions: bytecode.instructions,
            num_locals: 0,
            num_parameters: 0,
        });
        let main_closure = Rc::new(Closure {
            func: main_fn,
            free: Vec::new(),
        });

        let mut frames = Vec::with_capacity(MAX_FRAMES);
        frames.push(Frame::new(main_closure, 0));

        Vm {
            constants: bytecode.constants,
            stack: vec![null_object(); STACK_SIZE],
            sp: 0,
            globals,
            frames,
        }
    }

    pub fn into_globals(self) -> Vec<Rc<Object>> {
        self.globals
    }

    /// The slot just above the current top: the value most recently
    /// popped, which is the observable result of a finished program.
    pub fn last_popped_stack_elem(&self) -> Rc<Object> {
        Rc::clone(&self.stack[self.sp])
    }

    pub fn run(&mut self) -> Result<(), String> {
        while self.current_frame().ip < self.current_frame().instructions().len() as isize - 1 {
            self.current_frame_mut().ip += 1;

            let ip = self.current_frame().ip as usize;
            let op = Opcode::try_from(self.current_frame().instructions()[ip])?;

            match op {
                Opcode::Constant => {
                    let const_index = self.read_u16_operand(ip);
                    self.current_frame_mut().ip += 2;

                    let constant = Rc::clone(&self.constants[const_index]);
                    self.push(constant)?;
                }

                Opcode::Pop => {
                    self.pop()?;
                }

                Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                    self.execute_binary_operation(op)?;
                }

                Opcode::True => self.push(true_object())?,
                Opcode::False => self.push(false_object())?,
                Opcode::Null => self.push(null_object())?,

                Opcode::Equal | Opcode::NotEqual | Opcode::GreaterThan => {
                    self.execute_comparison(op)?;
                }

                Opcode::Bang => self.execute_bang_operator()?,
                Opcode::Minus => self.execute_minus_operator()?,

                Opcode::Jump => {
                    let target = self.read_u16_operand(ip);
                    // -1 so the pre-increment lands on the target.
                    self.current_frame_mut().ip = target as isize - 1;
                }

                Opcode::JumpNotTruthy => {
                    let target = self.read_u16_operand(ip);
                    self.current_frame_mut().ip += 2;

                    let condition = self.pop()?;
                    if !is_truthy(&condition) {
                        self.current_frame_mut().ip = target as isize - 1;
                    }
                }

                Opcode::SetGlobal => {
                    let global_index = self.read_u16_operand(ip);
                    self.current_frame_mut().ip += 2;
                    self.globals[global_index] = self.pop()?;
                }

                Opcode::GetGlobal => {
                    let global_index = self.read_u16_operand(ip);
                    self.current_frame_mut().ip += 2;
                    self.push(Rc::clone(&self.globals[global_index]))?;
                }

                Opcode::SetLocal => {
                    let local_index = self.read_u8_operand(ip);
                    self.current_frame_mut().ip += 1;

                    let base_pointer = self.current_frame().base_pointer;
                    self.stack[base_pointer + local_index] = self.pop()?;
                }

                Opcode::GetLocal => {
                    let local_index = self.read_u8_operand(ip);
                    self.current_frame_mut().ip += 1;

                    let base_pointer = self.current_frame().base_pointer;
                    self.push(Rc::clone(&self.stack[base_pointer + local_index]))?;
                }

                Opcode::GetBuiltin => {
                    let builtin_index = self.read_u8_operand(ip);
                    self.current_frame_mut().ip += 1;

                    self.push(Rc::new(Object::Builtin(&BUILTINS[builtin_index])))?;
                }

                Opcode::GetFree => {
                    let free_index = self.read_u8_operand(ip);
                    self.current_frame_mut().ip += 1;

                    let free = Rc::clone(&self.current_frame().closure.free[free_index]);
                    self.push(free)?;
                }

                Opcode::Array => {
                    let num_elements = self.read_u16_operand(ip);
                    self.current_frame_mut().ip += 2;

                    let array = self.build_array(self.sp - num_elements, self.sp);
                    self.sp -= num_elements;
                    self.push(array)?;
                }

                Opcode::Hash => {
                    let num_elements = self.read_u16_operand(ip);
                    self.current_frame_mut().ip += 2;

                    let hash = self.build_hash(self.sp - num_elements, self.sp)?;
                    self.sp -= num_elements;
                    self.push(hash)?;
                }

                Opcode::Index => {
                    let index = self.pop()?;
                    let left = self.pop()?;
                    self.execute_index_expression(left, index)?;
                }

                Opcode::Call => {
                    let num_args = self.read_u8_operand(ip);
                    self.current_frame_mut().ip += 1;

                    self.execute_call(num_args)?;
                }

                Opcode::ReturnValue => {
                    let return_value = self.pop()?;

                    let frame = self.pop_frame()?;
                    if self.frames.is_empty() {
                        self.stack[0] = return_value;
                        self.sp = 0;
                        return Ok(());
                    }
                    self.sp = frame.base_pointer - 1;

                    self.push(return_value)?;
                }

                Opcode::Return => {
                    let frame = self.pop_frame()?;
                    if self.frames.is_empty() {
                        self.stack[0] = null_object();
                        self.sp = 0;
                        return Ok(());
                    }
                    self.sp = frame.base_pointer - 1;

                    self.push(null_object())?;
                }

                Opcode::Closure => {
                    let const_index = self.read_u16_operand(ip);
                    let num_free = self.read_u8_operand(ip + 2);
                    self.current_frame_mut().ip += 3;

                    self.push_closure(const_index, num_free)?;
                }
            }
        }

        Ok(())
    }

    // ----------------- OPERATORS -----------------

    fn execute_binary_operation(&mut self, op: Opcode) -> Result<(), String> {
        let right = self.pop()?;
        let left = self.pop()?;

        match (&*left, &*right) {
            (Object::Integer(l), Object::Integer(r)) => {
                self.execute_binary_integer_operation(op, *l, *r)
            }
            (Object::Str(l), Object::Str(r)) => {
                if op != Opcode::Add {
                    return Err(format!("unknown string operator: {}", op as u8));
                }
                self.push(Rc::new(Object::Str(format!("{}{}", l, r))))
            }
            _ => Err(format!(
                "unsupported types for binary operation: {} {}",
                left.type_name(),
                right.type_name()
            )),
        }
    }

    fn execute_binary_integer_operation(
        &mut self,
        op: Opcode,
        left: i64,
        right: i64,
    ) -> Result<(), String> {
        let result = match op {
            Opcode::Add => left.wrapping_add(right),
            Opcode::Sub => left.wrapping_sub(right),
            Opcode::Mul => left.wrapping_mul(right),
            Opcode::Div => {
                if right == 0 {
                    return Err("division by zero".to_string());
                }
                left.wrapping_div(right)
            }
            other => return Err(format!("unknown integer operator: {}", other as u8)),
        };

        self.push(Rc::new(Object::Integer(result)))
    }

    fn execute_comparison(&mut self, op: Opcode) -> Result<(), String> {
        let right = self.pop()?;
        let left = self.pop()?;

        if let (Object::Integer(l), Object::Integer(r)) = (&*left, &*right) {
            return self.execute_integer_comparison(op, *l, *r);
        }

        match op {
            // Identity comparison; correct for the interned singletons.
            Opcode::Equal => self.push(native_bool_to_object(Rc::ptr_eq(&left, &right))),
            Opcode::NotEqual => self.push(native_bool_to_object(!Rc::ptr_eq(&left, &right))),
            other => Err(format!(
                "unknown operator: {} ({} {})",
                other as u8,
                left.type_name(),
                right.type_name()
            )),
        }
    }

    fn execute_integer_comparison(
        &mut self,
        op: Opcode,
        left: i64,
        right: i64,
    ) -> Result<(), String> {
        let result = match op {
            Opcode::Equal => left == right,
            Opcode::NotEqual => left != right,
            Opcode::GreaterThan => left > right,
            other => return Err(format!("unknown operator: {}", other as u8)),
        };
        self.push(native_bool_to_object(result))
    }

    fn execute_bang_operator(&mut self) -> Result<(), String> {
        let operand = self.pop()?;
        match &*operand {
            Object::Boolean(true) => self.push(false_object()),
            Object::Boolean(false) | Object::Null => self.push(true_object()),
            _ => self.push(false_object()),
        }
    }

    fn execute_minus_operator(&mut self) -> Result<(), String> {
        let operand = self.pop()?;
        match &*operand {
            Object::Integer(value) => self.push(Rc::new(Object::Integer(value.wrapping_neg()))),
            other => Err(format!(
                "unsupported type for negation: {}",
                other.type_name()
            )),
        }
    }

    // ----------------- COMPOSITES -----------------

    fn build_array(&self, start: usize, end: usize) -> Rc<Object> {
        let elements: Vec<Rc<Object>> = self.stack[start..end].iter().map(Rc::clone).collect();
        Rc::new(Object::Array(elements))
    }

    fn build_hash(&self, start: usize, end: usize) -> Result<Rc<Object>, String> {
        let mut pairs: HashMap<HashKey, HashPair> = HashMap::new();

        let mut i = start;
        while i < end {
            let key = Rc::clone(&self.stack[i]);
            let value = Rc::clone(&self.stack[i + 1]);

            let hash_key = key.hash_key()?;
            pairs.insert(hash_key, HashPair { key, value });

            i += 2;
        }

        Ok(Rc::new(Object::Hash(pairs)))
    }

    fn execute_index_expression(
        &mut self,
        left: Rc<Object>,
        index: Rc<Object>,
    ) -> Result<(), String> {
        match (&*left, &*index) {
            (Object::Array(elements), Object::Integer(i)) => {
                if *i < 0 || *i as usize >= elements.len() {
                    self.push(null_object())
                } else {
                    self.push(Rc::clone(&elements[*i as usize]))
                }
            }
            (Object::Hash(pairs), _) => {
                let hash_key = index.hash_key()?;
                match pairs.get(&hash_key) {
                    Some(pair) => self.push(Rc::clone(&pair.value)),
                    None => self.push(null_object()),
                }
            }
            _ => Err(format!(
                "index operator not supported: {}",
                left.type_name()
            )),
        }
    }

    // ----------------- CALLS -----------------

    fn execute_call(&mut self, num_args: usize) -> Result<(), String> {
        let callee = Rc::clone(&self.stack[self.sp - 1 - num_args]);
        match &*callee {
            Object::Closure(closure) => self.call_closure(Rc::clone(closure), num_args),
            Object::Builtin(builtin) => self.call_builtin(builtin, num_args),
            _ => Err("calling non-closure and non-builtin".to_string()),
        }
    }

    fn call_closure(&mut self, closure: Rc<Closure>, num_args: usize) -> Result<(), String> {
        if num_args != closure.func.num_parameters {
            return Err(format!(
                "wrong number of arguments: want={}, got={}",
                closure.func.num_parameters, num_args
            ));
        }

        let num_locals = closure.func.num_locals;
        let base_pointer = self.sp - num_args;
        if base_pointer + num_locals > STACK_SIZE {
            return Err("stack overflow".to_string());
        }

        self.push_frame(Frame::new(closure, base_pointer))?;
        // Locals live above the arguments; reserve their slots.
        self.sp = base_pointer + num_locals;

        Ok(())
    }

    fn call_builtin(&mut self, builtin: &Builtin, num_args: usize) -> Result<(), String> {
        let args: Vec<Rc<Object>> = self.stack[self.sp - num_args..self.sp]
            .iter()
            .map(Rc::clone)
            .collect();

        let result = (builtin.func)(&args);
        self.sp = self.sp - num_args - 1;

        match result {
            Some(object) => self.push(object),
            None => self.push(null_object()),
        }
    }

    fn push_closure(&mut self, const_index: usize, num_free: usize) -> Result<(), String> {
        let constant = Rc::clone(&self.constants[const_index]);
        let function = match &*constant {
            Object::CompiledFunction(func) => Rc::clone(func),
            other => return Err(format!("not a function: {}", other.inspect())),
        };

        let free: Vec<Rc<Object>> = self.stack[self.sp - num_free..self.sp]
            .iter()
            .map(Rc::clone)
            .collect();
        self.sp -= num_free;

        self.push(Rc::new(Object::Closure(Rc::new(Closure {
            func: function,
            free,
        }))))
    }

    // ----------------- STACK & FRAMES -----------------

    fn push(&mut self, object: Rc<Object>) -> Result<(), String> {
        if self.sp >= STACK_SIZE {
            return Err("stack overflow".to_string());
        }
        self.stack[self.sp] = object;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<Rc<Object>, String> {
        if self.sp == 0 {
            return Err("stack underflow".to_string());
        }
        self.sp -= 1;
        Ok(Rc::clone(&self.stack[self.sp]))
    }

    fn current_frame(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn push_frame(&mut self, frame: Frame) -> Result<(), String> {
        if self.frames.len() >= MAX_FRAMES {
            return Err("frame overflow".to_string());
        }
        self.frames.push(frame);
        Ok(())
    }

    fn pop_frame(&mut self) -> Result<Frame, String> {
        self.frames.pop().ok_or_else(|| "frame underflow".to_string())
    }

    fn read_u16_operand(&self, ip: usize) -> usize {
        opcode::read_u16(&self.current_frame().instructions()[ip + 1..]) as usize
    }

    fn read_u8_operand(&self, ip: usize) -> usize {
        opcode::read_u8(&self.current_frame().instructions()[ip + 1..]) as usize
    }
}
