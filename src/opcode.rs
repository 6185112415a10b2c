use std::convert::TryFrom;
use std::fmt::Write as _;

/// One byte of opcode followed by fixed-width big-endian operands.
pub type Instructions = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Constant = 0,

    Add = 1,
    Pop = 2,
    Sub = 3,
    Mul = 4,
    Div = 5,

    True = 6,
    False = 7,

    Equal = 8,
    NotEqual = 9,
    GreaterThan = 10,

    Minus = 11,
    Bang = 12,

    JumpNotTruthy = 13,
    Jump = 14,

    Null = 15,

    GetGlobal = 16,
    SetGlobal = 17,

    Array = 18,
    Hash = 19,
    Index = 20,

    Call = 21,
    ReturnValue = 22,
    Return = 23,

    GetLocal = 24,
    SetLocal = 25,

    GetBuiltin = 26,
    Closure = 27,
    GetFree = 28,
}

impl TryFrom<u8> for Opcode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Opcode::Constant),
            1 => Ok(Opcode::Add),
            2 => Ok(Opcode::Pop),
            3 => Ok(Opcode::Sub),
            4 => Ok(Opcode::Mul),
            5 => Ok(Opcode::Div),
            6 => Ok(Opcode::True),
            7 => Ok(Opcode::False),
            8 => Ok(Opcode::Equal),
            9 => Ok(Opcode::NotEqual),
            10 => Ok(Opcode::GreaterThan),
            11 => Ok(Opcode::Minus),
            12 => Ok(Opcode::Bang),
            13 => Ok(Opcode::JumpNotTruthy),
            14 => Ok(Opcode::Jump),
            15 => Ok(Opcode::Null),
            16 => Ok(Opcode::GetGlobal),
            17 => Ok(Opcode::SetGlobal),
            18 => Ok(Opcode::Array),
            19 => Ok(Opcode::Hash),
            20 => Ok(Opcode::Index),
            21 => Ok(Opcode::Call),
            22 => Ok(Opcode::ReturnValue),
            23 => Ok(Opcode::Return),
            24 => Ok(Opcode::GetLocal),
            25 => Ok(Opcode::SetLocal),
            26 => Ok(Opcode::GetBuiltin),
            27 => Ok(Opcode::Closure),
            28 => Ok(Opcode::GetFree),
            other => Err(format!("unknown opcode {}", other)),
        }
    }
}

/// Mnemonic and operand widths (in bytes) of one opcode.
pub struct Definition {
    pub name: &'static str,
    pub operand_widths: &'static [usize],
}

pub fn lookup(op: Opcode) -> Definition {
    let (name, operand_widths): (&'static str, &'static [usize]) = match op {
        Opcode::Constant => ("OpConstant", &[2]),
        Opcode::Add => ("OpAdd", &[]),
        Opcode::Pop => ("OpPop", &[]),
        Opcode::Sub => ("OpSub", &[]),
        Opcode::Mul => ("OpMul", &[]),
        Opcode::Div => ("OpDiv", &[]),
        Opcode::True => ("OpTrue", &[]),
        Opcode::False => ("OpFalse", &[]),
        Opcode::Equal => ("OpEqual", &[]),
        Opcode::NotEqual => ("OpNotEqual", &[]),
        Opcode::GreaterThan => ("OpGreaterThan", &[]),
        Opcode::Minus => ("OpMinus", &[]),
        Opcode::Bang => ("OpBang", &[]),
        Opcode::JumpNotTruthy => ("OpJumpNotTruthy", &[2]),
        Opcode::Jump => ("OpJump", &[2]),
        Opcode::Null => ("OpNull", &[]),
        Opcode::GetGlobal => ("OpGetGlobal", &[2]),
        Opcode::SetGlobal => ("OpSetGlobal", &[2]),
        Opcode::Array => ("OpArray", &[2]),
        Opcode::Hash => ("OpHash", &[2]),
        Opcode::Index => ("OpIndex", &[]),
        Opcode::Call => ("OpCall", &[1]),
        Opcode::ReturnValue => ("OpReturnValue", &[]),
        Opcode::Return => ("OpReturn", &[]),
        Opcode::GetLocal => ("OpGetLocal", &[1]),
        Opcode::SetLocal => ("OpSetLocal", &[1]),
        Opcode::GetBuiltin => ("OpGetBuiltin", &[1]),
        Opcode::Closure => ("OpClosure", &[2, 1]),
        Opcode::GetFree => ("OpGetFree", &[1]),
    };
    Definition {
        name,
        operand_widths,
    }
}

/// Encode one instruction: opcode byte plus big-endian operands.
pub fn make(op: Opcode, operands: &[usize]) -> Instructions {
    let def = lookup(op);
    let mut instruction = Vec::with_capacity(1 + def.operand_widths.iter().sum::<usize>());
    instruction.push(op as u8);

    for (operand, width) in operands.iter().zip(def.operand_widths) {
        match width {
            2 => instruction.extend_from_slice(&(*operand as u16).to_be_bytes()),
            1 => instruction.push(*operand as u8),
            _ => unreachable!("unsupported operand width {}", width),
        }
    }

    instruction
}

/// Decode the operands following an opcode byte. Returns the operands
/// and the number of bytes read; exact inverse of `make`.
pub fn read_operands(def: &Definition, ins: &[u8]) -> (Vec<usize>, usize) {
    let mut operands = Vec::with_capacity(def.operand_widths.len());
    let mut offset = 0;

    for width in def.operand_widths {
        match width {
            2 => operands.push(read_u16(&ins[offset..]) as usize),
            1 => operands.push(read_u8(&ins[offset..]) as usize),
            _ => unreachable!("unsupported operand width {}", width),
        }
        offset += width;
    }

    (operands, offset)
}

pub fn read_u16(ins: &[u8]) -> u16 {
    u16::from_be_bytes([ins[0], ins[1]])
}

pub fn read_u8(ins: &[u8]) -> u8 {
    ins[0]
}

/// Human-readable listing, one instruction per line:
/// `NNNN <mnemonic> <operands...>`.
pub fn disassemble(ins: &[u8]) -> String {
    let mut out = String::new();
    let mut i = 0;

    while i < ins.len() {
        let op = match Opcode::try_from(ins[i]) {
            Ok(op) => op,
            Err(err) => {
                let _ = writeln!(out, "ERROR: {}", err);
                i += 1;
                continue;
            }
        };
        let def = lookup(op);
        let (operands, read) = read_operands(&def, &ins[i + 1..]);

        let _ = write!(out, "{:04} {}", i, def.name);
        for operand in &operands {
            let _ = write!(out, " {}", operand);
        }
        out.push('\n');

        i += 1 + read;
    }

    out
}
