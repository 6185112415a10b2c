use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};

use crate::builtins::BUILTINS;
use crate::compiler::Compiler;
use crate::lexer::Lexer;
use crate::object::{null_object, Object};
use crate::parser::Parser;
use crate::symbol_table::SymbolTable;
use crate::vm::{Vm, GLOBALS_SIZE};

pub const PROMPT: &str = ">> ";

const MONKEY_FACE: &str = r#"            __,__
   .--.  .-"     "-.  .--.
  / .. \/  .-. .-.  \/ .. \
 | |  '|  /   Y   \  |'  | |
 | \   \  \ 0 | 0 /  /   / |
  \ '- ,\.-"""""""-./, -' /
   ''-' /_   ^ ^   _\ '-''
       |  \._   _./  |
       \   \ '~' /   /
        '._ '-=-' _.'
           '-----'
"#;

/// Interactive loop. Constants, globals, and the top-level symbol table
/// persist across lines; a failed line leaves them as they were when it
/// died.
pub fn start() -> RlResult<()> {
    let mut editor = DefaultEditor::new()?;

    let mut constants: Vec<Rc<Object>> = Vec::new();
    let mut globals = vec![null_object(); GLOBALS_SIZE];
    let mut symbol_table = SymbolTable::new();
    for (i, builtin) in BUILTINS.iter().enumerate() {
        symbol_table.define_builtin(i, builtin.name);
    }

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => return Ok(()),
            Err(err) => {
                eprintln!("Error: {}", err);
                return Err(err);
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line.as_str());

        let lexer = Lexer::new(&line);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();
        if !parser.errors().is_empty() {
            print_parser_errors(parser.errors());
            continue;
        }

        let mut compiler = Compiler::new_with_state(symbol_table, constants);
        let compile_result = compiler.compile(&program);
        let bytecode = compiler.bytecode();
        let (table, consts) = compiler.into_state();
        symbol_table = table.root();
        constants = consts;

        if let Err(err) = compile_result {
            println!("Woops! Compilation failed:\n {}", err);
            continue;
        }

        let mut vm = Vm::with_globals(bytecode, globals);
        match vm.run() {
            Ok(()) => {
                let last_popped = vm.last_popped_stack_elem();
                println!("{}", last_popped.inspect());
            }
            Err(err) => {
                println!("Woops! Executing bytecode failed:\n {}", err);
            }
        }
        globals = vm.into_globals();
    }
}

fn print_parser_errors(errors: &[String]) {
    print!("{}", MONKEY_FACE);
    println!("Woops! We ran into some monkey business here!");
    println!(" parser errors:");
    for message in errors {
        println!("\t{}", message);
    }
}
