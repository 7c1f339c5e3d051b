//! Listing interpreter for tests
//!
//! Assembles a generated listing at 0x200 (two bytes per instruction and
//! per `dw`) and runs it until the program jumps to itself.

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};

use super::registers::Reg;

const ORIGIN: u16 = 0x200;
const STEP_LIMIT: usize = 100_000;

#[derive(Debug, Clone)]
struct Inst {
    mnemonic: String,
    operands: Vec<String>,
}

pub struct Machine {
    v: [u8; 16],
    i: u16,
    pc: u16,
    stack: Vec<u16>,
    memory: Vec<u8>,
    labels: HashMap<String, u16>,
    code: HashMap<u16, Inst>,
}

impl Machine {
    /// Assemble and execute `listing`
    pub fn run(listing: &str) -> Result<Self> {
        let mut machine = Self::assemble(listing)?;
        machine.execute()?;
        Ok(machine)
    }

    fn assemble(listing: &str) -> Result<Self> {
        let mut labels = HashMap::new();
        let mut code = HashMap::new();
        let mut addr = ORIGIN;

        for raw in listing.lines() {
            let line = raw.split(';').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if let Some(label) = line.strip_suffix(':') {
                labels.insert(label.trim().to_string(), addr);
                continue;
            }
            if line.starts_with("dw") {
                addr += 2;
                continue;
            }
            let (mnemonic, rest) = line.split_once(' ').unwrap_or((line, ""));
            let operands = rest
                .split(',')
                .map(|op| op.trim().to_string())
                .filter(|op| !op.is_empty())
                .collect();
            code.insert(
                addr,
                Inst {
                    mnemonic: mnemonic.to_string(),
                    operands,
                },
            );
            addr += 2;
        }

        let mut v = [0; 16];
        // Garbage until the preamble loads vC
        v[0xC] = 0x5A;

        Ok(Self {
            v,
            i: 0,
            pc: ORIGIN,
            stack: Vec::new(),
            memory: vec![0; 0x1000],
            labels,
            code,
        })
    }

    fn execute(&mut self) -> Result<()> {
        for _ in 0..STEP_LIMIT {
            let inst = self
                .code
                .get(&self.pc)
                .cloned()
                .ok_or_else(|| anyhow!("no instruction at {:#05x}", self.pc))?;
            if self.step(&inst).with_context(|| format!("at {:#05x}: {inst:?}", self.pc))? {
                return Ok(());
            }
        }
        bail!("step limit exceeded")
    }

    /// Execute one instruction; true when the program halted
    fn step(&mut self, inst: &Inst) -> Result<bool> {
        let ops: Vec<&str> = inst.operands.iter().map(String::as_str).collect();
        let mut next = self.pc + 2;

        match (inst.mnemonic.as_str(), ops.as_slice()) {
            ("ld", ["I", target]) => self.i = self.address(target)?,
            ("ld", ["[I]", x]) => {
                let x = reg(x)?;
                for r in 0..=x {
                    self.memory[usize::from(self.i) + r] = self.v[r];
                }
            }
            ("ld", ["B", x]) => {
                let value = self.v[reg(x)?];
                let at = usize::from(self.i);
                self.memory[at..at + 3].copy_from_slice(&[value / 100, value / 10 % 10, value % 10]);
            }
            ("ld", ["F", x]) => self.i = u16::from(self.v[reg(x)?]) * 5,
            ("ld", [x, "[I]"]) => {
                let x = reg(x)?;
                for r in 0..=x {
                    self.v[r] = self.memory[usize::from(self.i) + r];
                }
            }
            ("ld", [x, y]) => self.v[reg(x)?] = self.value(y)?,
            ("add", ["I", x]) => self.i = self.i.wrapping_add(u16::from(self.v[reg(x)?])),
            ("add", [x, y]) if is_reg(y) => {
                let (x, y) = (reg(x)?, reg(y)?);
                let (sum, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = sum;
                self.v[0xF] = u8::from(carry);
            }
            ("add", [x, byte]) => {
                let x = reg(x)?;
                self.v[x] = self.v[x].wrapping_add(number(byte)?);
            }
            ("sub", [x, y]) => {
                let (x, y) = (reg(x)?, reg(y)?);
                let no_borrow = self.v[x] >= self.v[y];
                self.v[x] = self.v[x].wrapping_sub(self.v[y]);
                self.v[0xF] = u8::from(no_borrow);
            }
            ("xor", [x, y]) => {
                let (x, y) = (reg(x)?, reg(y)?);
                self.v[x] ^= self.v[y];
            }
            ("or", [x, y]) => {
                let (x, y) = (reg(x)?, reg(y)?);
                self.v[x] |= self.v[y];
            }
            ("sne", [x, y]) => {
                if self.v[reg(x)?] != self.value(y)? {
                    next += 2;
                }
            }
            ("jp", [target]) => {
                let target = self.address(target)?;
                if target == self.pc {
                    return Ok(true);
                }
                next = target;
            }
            ("call", [target]) => {
                self.stack.push(next);
                next = self.address(target)?;
            }
            ("ret", []) => {
                next = self.stack.pop().ok_or_else(|| anyhow!("ret with empty call stack"))?;
            }
            ("cls", []) | ("break", []) | ("drw", [_, _, _]) => {}
            _ => bail!("unsupported instruction"),
        }

        self.pc = next;
        Ok(false)
    }

    fn address(&self, operand: &str) -> Result<u16> {
        match operand.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            Some(label) => self
                .labels
                .get(label)
                .copied()
                .ok_or_else(|| anyhow!("unknown label {label}")),
            None => Ok(u16::from(number(operand)?)),
        }
    }

    fn value(&self, operand: &str) -> Result<u8> {
        if is_reg(operand) {
            Ok(self.v[reg(operand)?])
        } else {
            number(operand)
        }
    }

    pub fn reg(&self, reg: Reg) -> u8 {
        self.v[usize::from(reg.index())]
    }

    pub fn bytes(&self, label: &str, len: usize) -> Vec<u8> {
        let at = usize::from(self.labels[label]);
        self.memory[at..at + len].to_vec()
    }

    pub fn byte(&self, label: &str) -> u8 {
        self.bytes(label, 1)[0]
    }

    /// Little-endian word at `label`
    pub fn word(&self, label: &str) -> u16 {
        let b = self.bytes(label, 2);
        u16::from_le_bytes([b[0], b[1]])
    }
}

fn is_reg(operand: &str) -> bool {
    operand.len() == 2 && operand.starts_with('v')
}

fn reg(operand: &str) -> Result<usize> {
    let digit = operand
        .strip_prefix('v')
        .filter(|d| d.len() == 1)
        .ok_or_else(|| anyhow!("expected register, got {operand}"))?;
    Ok(usize::from_str_radix(digit, 16)?)
}

fn number(operand: &str) -> Result<u8> {
    let parsed = match operand.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => operand.parse(),
    };
    parsed.with_context(|| format!("bad immediate {operand}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_follow_chip8() {
        let m = Machine::run(
            "ld v1, 0xF0
             ld v2, 0x20
             add v1, v2
             ld v3, vF
             ld v4, 5
             ld v5, 7
             sub v4, v5
             ld v6, vF
             end:
             jp [end]",
        )
        .unwrap();
        assert_eq!(m.v[1], 0x10);
        assert_eq!(m.v[3], 1);
        assert_eq!(m.v[4], 0xFE);
        assert_eq!(m.v[6], 0);
    }

    #[test]
    fn test_memory_and_calls() {
        let m = Machine::run(
            "jp [main]
             store:
             ld I, [slot]
             ld [I], v1
             ret
             main:
             ld v0, 0x34
             ld v1, 0x12
             call [store]
             done:
             jp [done]
             slot:
                 dw 0",
        )
        .unwrap();
        assert_eq!(m.word("slot"), 0x1234);
    }

    #[test]
    fn test_runaway_program_is_reported() {
        assert!(Machine::run("a:\njp [b]\nb:\njp [a]").is_err());
    }
}
