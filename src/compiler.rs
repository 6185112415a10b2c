use std::mem;
use std::rc::Rc;

use crate::ast::{BlockStatement, Expression, Program, Statement};
use crate::builtins::BUILTINS;
use crate::object::{CompiledFunction, Object};
use crate::opcode::{self, Instructions, Opcode};
use crate::symbol_table::{Symbol, SymbolScope, SymbolTable};

/// Compiler output: the main instruction stream plus the constant pool.
#[derive(Debug)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Rc<Object>>,
}

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

#[derive(Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

pub struct Compiler {
    constants: Vec<Rc<Object>>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
    scope_index: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (i, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(i, builtin.name);
        }

        Compiler {
            constants: Vec::new(),
            symbol_table,
            scopes: vec![CompilationScope::default()],
            scope_index: 0,
        }
    }

    /// Continue with state accumulated by earlier compilations; the REPL
    /// feeds the previous line's constants and top-level table back in.
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Rc<Object>>) -> Self {
        Compiler {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::default()],
            scope_index: 0,
        }
    }

    pub fn compile(&mut self, program: &Program) -> Result<(), String> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.current_instructions().clone(),
            constants: self.constants.clone(),
        }
    }

    /// Tear down the compiler, handing back the symbol table and the
    /// constant pool for the next round.
    pub fn into_state(self) -> (SymbolTable, Vec<Rc<Object>>) {
        (self.symbol_table, self.constants)
    }

    fn compile_statement(&mut self, statement: &Statement) -> Result<(), String> {
        match statement {
            Statement::Expression { expression, .. } => {
                self.compile_expression(expression)?;
                self.emit(Opcode::Pop, &[]);
            }
            Statement::Let { name, value, .. } => {
                // Defined before the value compiles so the body of a
                // recursive top-level function can resolve its own name.
                let symbol = self.symbol_table.define(&name.value);
                self.compile_expression(value)?;
                match symbol.scope {
                    SymbolScope::Global => self.emit(Opcode::SetGlobal, &[symbol.index]),
                    _ => self.emit(Opcode::SetLocal, &[symbol.index]),
                };
            }
            Statement::Return { value, .. } => {
                self.compile_expression(value)?;
                self.emit(Opcode::ReturnValue, &[]);
            }
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &BlockStatement) -> Result<(), String> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    fn compile_expression(&mut self, expression: &Expression) -> Result<(), String> {
        match expression {
            Expression::IntegerLiteral { value, .. } => {
                let idx = self.add_constant(Object::Integer(*value));
                self.emit(Opcode::Constant, &[idx]);
            }
            Expression::StringLiteral { value, .. } => {
                let idx = self.add_constant(Object::Str(value.clone()));
                self.emit(Opcode::Constant, &[idx]);
            }
            Expression::Boolean { value, .. } => {
                if *value {
                    self.emit(Opcode::True, &[]);
                } else {
                    self.emit(Opcode::False, &[]);
                }
            }
            Expression::Identifier(ident) => {
                let symbol = self
                    .symbol_table
                    .resolve(&ident.value)
                    .ok_or_else(|| format!("unknown variable {}", ident.value))?;
                self.load_symbol(&symbol);
            }
            Expression::Prefix {
                operator, right, ..
            } => {
                self.compile_expression(right)?;
                match operator.as_str() {
                    "!" => self.emit(Opcode::Bang, &[]),
                    "-" => self.emit(Opcode::Minus, &[]),
                    other => return Err(format!("unknown operator {}", other)),
                };
            }
            Expression::Infix {
                left,
                operator,
                right,
                ..
            } => {
                // `<` compiles as `>` with swapped operands.
                if operator == "<" {
                    self.compile_expression(right)?;
                    self.compile_expression(left)?;
                    self.emit(Opcode::GreaterThan, &[]);
                    return Ok(());
                }

                self.compile_expression(left)?;
                self.compile_expression(right)?;
                match operator.as_str() {
                    "+" => self.emit(Opcode::Add, &[]),
                    "-" => self.emit(Opcode::Sub, &[]),
                    "*" => self.emit(Opcode::Mul, &[]),
                    "/" => self.emit(Opcode::Div, &[]),
                    ">" => self.emit(Opcode::GreaterThan, &[]),
                    "==" => self.emit(Opcode::Equal, &[]),
                    "!=" => self.emit(Opcode::NotEqual, &[]),
                    other => return Err(format!("unknown operator {}", other)),
                };
            }
            Expression::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                self.compile_expression(condition)?;

                // Bogus target, patched once the consequence is known.
                let jump_not_truthy_pos = self.emit(Opcode::JumpNotTruthy, &[9999]);

                self.compile_block(consequence)?;
                if self.last_instruction_is(Opcode::Pop) {
                    self.remove_last_pop();
                }

                let jump_pos = self.emit(Opcode::Jump, &[9999]);

                let after_consequence = self.current_instructions().len();
                self.change_operand(jump_not_truthy_pos, after_consequence);

                match alternative {
                    None => {
                        self.emit(Opcode::Null, &[]);
                    }
                    Some(alt) => {
                        self.compile_block(alt)?;
                        if self.last_instruction_is(Opcode::Pop) {
                            self.remove_last_pop();
                        }
                    }
                }

                let after_alternative = self.current_instructions().len();
                self.change_operand(jump_pos, after_alternative);
            }
            Expression::ArrayLiteral { elements, .. } => {
                for element in elements {
                    self.compile_expression(element)?;
                }
                self.emit(Opcode::Array, &[elements.len()]);
            }
            Expression::HashLiteral { pairs, .. } => {
                // Emit in the order of the keys' textual form so the
                // bytecode is identical across runs.
                let mut sorted: Vec<&(Expression, Expression)> = pairs.iter().collect();
                sorted.sort_by_key(|(key, _)| key.to_string());

                for (key, value) in sorted {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Opcode::Hash, &[pairs.len() * 2]);
            }
            Expression::Index { left, index, .. } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(Opcode::Index, &[]);
            }
            Expression::FunctionLiteral {
                parameters, body, ..
            } => {
                self.enter_scope();

                for parameter in parameters {
                    self.symbol_table.define(&parameter.value);
                }

                self.compile_block(body)?;

                if self.last_instruction_is(Opcode::Pop) {
                    self.replace_last_pop_with_return();
                }
                if !self.last_instruction_is(Opcode::ReturnValue) {
                    self.emit(Opcode::Return, &[]);
                }

                let free_symbols = self.symbol_table.free_symbols.clone();
                let num_locals = self.symbol_table.num_definitions;
                let instructions = self.leave_scope();

                // Push the captured values in the enclosing scope, then
                // fold them into the closure.
                for symbol in &free_symbols {
                    self.load_symbol(symbol);
                }

                let func = CompiledFunction {
                    instructions,
                    num_locals,
                    num_parameters: parameters.len(),
                };
                let idx = self.add_constant(Object::CompiledFunction(Rc::new(func)));
                self.emit(Opcode::Closure, &[idx, free_symbols.len()]);
            }
            Expression::Call {
                function,
                arguments,
                ..
            } => {
                self.compile_expression(function)?;
                for argument in arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Opcode::Call, &[arguments.len()]);
            }
        }
        Ok(())
    }

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Opcode::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Opcode::GetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(Opcode::GetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(Opcode::GetFree, &[symbol.index]),
        };
    }

    fn add_constant(&mut self, object: Object) -> usize {
        self.constants.push(Rc::new(object));
        self.constants.len() - 1
    }

    fn emit(&mut self, op: Opcode, operands: &[usize]) -> usize {
        let instruction = opcode::make(op, operands);
        let position = self.add_instruction(&instruction);
        self.set_last_instruction(op, position);
        position
    }

    fn add_instruction(&mut self, instruction: &[u8]) -> usize {
        let scope = self.current_scope_mut();
        let position = scope.instructions.len();
        scope.instructions.extend_from_slice(instruction);
        position
    }

    fn set_last_instruction(&mut self, opcode: Opcode, position: usize) {
        let scope = self.current_scope_mut();
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction { opcode, position });
    }

    fn last_instruction_is(&self, op: Opcode) -> bool {
        self.scopes[self.scope_index]
            .last_instruction
            .map(|last| last.opcode == op)
            .unwrap_or(false)
    }

    fn remove_last_pop(&mut self) {
        let scope = self.current_scope_mut();
        if let Some(last) = scope.last_instruction {
            scope.instructions.truncate(last.position);
            scope.last_instruction = scope.previous_instruction;
        }
    }

    fn replace_instruction(&mut self, position: usize, new_instruction: &[u8]) {
        let instructions = &mut self.current_scope_mut().instructions;
        instructions[position..position + new_instruction.len()]
            .copy_from_slice(new_instruction);
    }

    /// Re-encode the instruction at `position` with a new operand; the
    /// opcode (and therefore the width) must not change.
    fn change_operand(&mut self, position: usize, operand: usize) {
        let op = match Opcode::try_from(self.current_instructions()[position]) {
            Ok(op) => op,
            Err(_) => return,
        };
        let new_instruction = opcode::make(op, &[operand]);
        self.replace_instruction(position, &new_instruction);
    }

    fn replace_last_pop_with_return(&mut self) {
        if let Some(last) = self.scopes[self.scope_index].last_instruction {
            let new_instruction = opcode::make(Opcode::ReturnValue, &[]);
            self.replace_instruction(last.position, &new_instruction);
            if let Some(last) = self.current_scope_mut().last_instruction.as_mut() {
                last.opcode = Opcode::ReturnValue;
            }
        }
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        self.scope_index += 1;

        let outer = mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = match self.scopes.pop() {
            Some(scope) => scope,
            None => return Instructions::new(),
        };
        self.scope_index -= 1;

        let inner = mem::take(&mut self.symbol_table);
        self.symbol_table = inner.into_outer().unwrap_or_default();

        scope.instructions
    }

    fn current_instructions(&self) -> &Instructions {
        &self.scopes[self.scope_index].instructions
    }

    fn current_scope_mut(&mut self) -> &mut CompilationScope {
        &mut self.scopes[self.scope_index]
    }
}
