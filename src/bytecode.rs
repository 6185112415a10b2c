use std::fs::File;
use std::io::{Read, Write};
use std::rc::Rc;

use crate::compiler::Bytecode;
use crate::object::{CompiledFunction, Object};

const MAGIC: &[u8; 4] = b"MKBC";
const VERSION: u16 = 1;

// Flags reserved for future format revisions.
const FLAGS_NONE: u16 = 0;

const TAG_INTEGER: u8 = 0;
const TAG_STRING: u8 = 1;
const TAG_FUNCTION: u8 = 2;

// =======================
// WRITE
// =======================

pub fn write_bytecode(bytecode: &Bytecode, path: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;

    file.write_all(MAGIC)?;
    file.write_all(&VERSION.to_le_bytes())?;
    file.write_all(&FLAGS_NONE.to_le_bytes())?;

    write_u32(&mut file, bytecode.constants.len() as u32)?;
    for constant in &bytecode.constants {
        write_constant(&mut file, constant)?;
    }

    write_bytes(&mut file, &bytecode.instructions)
}

fn write_constant(file: &mut File, constant: &Object) -> std::io::Result<()> {
    match constant {
        Object::Integer(value) => {
            file.write_all(&[TAG_INTEGER])?;
            file.write_all(&value.to_le_bytes())
        }
        Object::Str(value) => {
            file.write_all(&[TAG_STRING])?;
            write_bytes(file, value.as_bytes())
        }
        Object::CompiledFunction(func) => {
            file.write_all(&[TAG_FUNCTION])?;
            write_u32(file, func.num_locals as u32)?;
            write_u32(file, func.num_parameters as u32)?;
            write_bytes(file, &func.instructions)
        }
        other => Err(err_invalid(&format!(
            "cannot serialize {} constant",
            other.type_name()
        ))),
    }
}

// =======================
// READ
// =======================

pub fn read_bytecode(path: &str) -> std::io::Result<Bytecode> {
    let mut file = File::open(path)?;

    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(err_invalid("invalid bytecode file (bad magic)"));
    }

    let version = read_u16(&mut file)?;
    if version != VERSION {
        return Err(err_invalid(&format!(
            "unsupported bytecode version {} (expected {})",
            version, VERSION
        )));
    }

    let flags = read_u16(&mut file)?;
    if flags != FLAGS_NONE {
        return Err(err_invalid(&format!("unsupported bytecode flags {}", flags)));
    }

    let const_count = read_u32(&mut file)? as usize;
    let mut constants = Vec::with_capacity(const_count);
    for _ in 0..const_count {
        constants.push(read_constant(&mut file)?);
    }

    let instructions = read_bytes(&mut file)?;

    Ok(Bytecode {
        instructions,
        constants,
    })
}

fn read_constant(file: &mut File) -> std::io::Result<Rc<Object>> {
    let mut tag = [0u8; 1];
    file.read_exact(&mut tag)?;

    match tag[0] {
        TAG_INTEGER => {
            let mut buf = [0u8; 8];
            file.read_exact(&mut buf)?;
            Ok(Rc::new(Object::Integer(i64::from_le_bytes(buf))))
        }
        TAG_STRING => {
            let bytes = read_bytes(file)?;
            Ok(Rc::new(Object::Str(
                String::from_utf8_lossy(&bytes).into_owned(),
            )))
        }
        TAG_FUNCTION => {
            let num_locals = read_u32(file)? as usize;
            let num_parameters = read_u32(file)? as usize;
            let instructions = read_bytes(file)?;
            Ok(Rc::new(Object::CompiledFunction(Rc::new(
                CompiledFunction {
                    instructions,
                    num_locals,
                    num_parameters,
                },
            ))))
        }
        other => Err(err_invalid(&format!("invalid constant tag {}", other))),
    }
}

// =======================
// IO HELPERS
// =======================

fn err_invalid(msg: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, msg.to_string())
}

fn write_u32(file: &mut File, value: u32) -> std::io::Result<()> {
    file.write_all(&value.to_le_bytes())
}

fn write_bytes(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    write_u32(file, bytes.len() as u32)?;
    file.write_all(bytes)
}

fn read_u16(file: &mut File) -> std::io::Result<u16> {
    let mut buf = [0u8; 2];
    file.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32(file: &mut File) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    file.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_bytes(file: &mut File) -> std::io::Result<Vec<u8>> {
    let len = read_u32(file)? as usize;
    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf)?;
    Ok(buf)
}
