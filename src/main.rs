use std::env;
use std::fs;
use std::process;
use std::rc::Rc;
use std::time::Instant;

use monkey::bytecode::{read_bytecode, write_bytecode};
use monkey::compiler::{Bytecode, Compiler};
use monkey::environment::Environment;
use monkey::error::MonkeyError;
use monkey::evaluator::eval_program;
use monkey::object::Object;
use monkey::opcode::disassemble;
use monkey::parser::parse_source;
use monkey::repl;
use monkey::vm::Vm;

const BYTECODE_EXT: &str = ".mkb";

const BENCH_INPUT: &str = "
let fibonacci = fn(x) {
  if (x == 0) {
    0
  } else {
    if (x == 1) {
      return 1;
    } else {
      fibonacci(x - 1) + fibonacci(x - 2);
    }
  }
};
fibonacci(30);
";

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "--version" | "-v" => {
            println!("monkey {}", env!("CARGO_PKG_VERSION"));
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "repl" => {
            if let Err(err) = repl::start() {
                eprintln!("repl error: {}", err);
                process::exit(1);
            }
        }
        "run" => {
            if args.len() < 3 {
                eprintln!("Usage: monkey run [--engine vm|eval] <file.monkey|file{}>", BYTECODE_EXT);
                process::exit(1);
            }
            let (engine, filename) = if args[2] == "--engine" {
                if args.len() < 5 {
                    eprintln!("Usage: monkey run [--engine vm|eval] <file.monkey|file{}>", BYTECODE_EXT);
                    process::exit(1);
                }
                (args[3].as_str(), args[4].as_str())
            } else {
                ("vm", args[2].as_str())
            };
            if let Err(err) = run_file(filename, engine) {
                report(err);
            }
        }
        "build" => {
            if args.len() < 3 {
                eprintln!("Usage: monkey build <file.monkey>");
                process::exit(1);
            }
            if let Err(err) = build_file(&args[2]) {
                report(err);
            }
        }
        "disasm" => {
            if args.len() < 3 {
                eprintln!("Usage: monkey disasm <file.monkey|file{}>", BYTECODE_EXT);
                process::exit(1);
            }
            if let Err(err) = disasm_file(&args[2]) {
                report(err);
            }
        }
        "bench" => {
            let engine = args.get(2).map(String::as_str).unwrap_or("vm");
            if let Err(err) = bench(engine) {
                report(err);
            }
        }
        other => {
            if other.starts_with('-') {
                eprintln!("Unknown option: {}", other);
                print_usage();
                process::exit(1);
            }
            if let Err(err) = run_file(other, "vm") {
                report(err);
            }
        }
    }
}

fn report(err: MonkeyError) -> ! {
    match err {
        MonkeyError::Parse(messages) => {
            for message in messages {
                eprintln!("parser error: {}", message);
            }
        }
        other => eprintln!("{}", other),
    }
    process::exit(1);
}

fn load_bytecode(filename: &str) -> Result<Bytecode, MonkeyError> {
    if filename.ends_with(BYTECODE_EXT) {
        return Ok(read_bytecode(filename)?);
    }

    let src = fs::read_to_string(filename)?;
    let program = parse_source(&src).map_err(MonkeyError::Parse)?;
    let mut compiler = Compiler::new();
    compiler.compile(&program).map_err(MonkeyError::Compile)?;
    Ok(compiler.bytecode())
}

fn run_file(filename: &str, engine: &str) -> Result<(), MonkeyError> {
    let result = match engine {
        "vm" => {
            let bytecode = load_bytecode(filename)?;
            let mut vm = Vm::new(bytecode);
            vm.run().map_err(MonkeyError::Runtime)?;
            vm.last_popped_stack_elem()
        }
        "eval" => {
            let src = fs::read_to_string(filename)?;
            let program = parse_source(&src).map_err(MonkeyError::Parse)?;
            let env = Environment::new();
            eval_program(&program, &env)
        }
        other => {
            return Err(MonkeyError::Runtime(format!("unknown engine '{}'", other)));
        }
    };

    if let Object::Error(message) = &*result {
        return Err(MonkeyError::Runtime(message.clone()));
    }
    Ok(())
}

fn build_file(filename: &str) -> Result<(), MonkeyError> {
    let src = fs::read_to_string(filename)?;
    let program = parse_source(&src).map_err(MonkeyError::Parse)?;
    let mut compiler = Compiler::new();
    compiler.compile(&program).map_err(MonkeyError::Compile)?;

    let out = output_path(filename);
    write_bytecode(&compiler.bytecode(), &out)?;
    println!("wrote {}", out);
    Ok(())
}

fn output_path(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) => format!("{}{}", stem, BYTECODE_EXT),
        None => format!("{}{}", filename, BYTECODE_EXT),
    }
}

fn disasm_file(filename: &str) -> Result<(), MonkeyError> {
    let bytecode = load_bytecode(filename)?;

    println!("== constants ==");
    for (i, constant) in bytecode.constants.iter().enumerate() {
        println!("{}: {}", i, constant.inspect());
    }

    println!("== main ==");
    print!("{}", disassemble(&bytecode.instructions));

    for (i, constant) in bytecode.constants.iter().enumerate() {
        if let Object::CompiledFunction(func) = &**constant {
            println!("== fn {} ==", i);
            print!("{}", disassemble(&func.instructions));
        }
    }

    Ok(())
}

fn bench(engine: &str) -> Result<(), MonkeyError> {
    let program = parse_source(BENCH_INPUT).map_err(MonkeyError::Parse)?;

    let (result, duration): (Rc<Object>, f64) = match engine {
        "vm" => {
            let mut compiler = Compiler::new();
            compiler.compile(&program).map_err(MonkeyError::Compile)?;
            let mut vm = Vm::new(compiler.bytecode());

            let start = Instant::now();
            vm.run().map_err(MonkeyError::Runtime)?;
            let duration = start.elapsed().as_secs_f64();

            (vm.last_popped_stack_elem(), duration)
        }
        "eval" => {
            let env = Environment::new();

            let start = Instant::now();
            let result = eval_program(&program, &env);
            let duration = start.elapsed().as_secs_f64();

            (result, duration)
        }
        other => {
            return Err(MonkeyError::Runtime(format!("unknown engine '{}'", other)));
        }
    };

    println!(
        "engine={}, result={}, duration={}s",
        engine,
        result.inspect(),
        duration
    );
    Ok(())
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  monkey <file.monkey>");
    eprintln!("  monkey run [--engine vm|eval] <file.monkey|file{}>", BYTECODE_EXT);
    eprintln!("  monkey build <file.monkey>");
    eprintln!("  monkey disasm <file.monkey|file{}>", BYTECODE_EXT);
    eprintln!("  monkey bench [vm|eval]");
    eprintln!("  monkey repl");
    eprintln!("  monkey --version");
    eprintln!("  monkey help");
}
