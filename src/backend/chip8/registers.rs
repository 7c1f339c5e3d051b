//! CHIP-8 register conventions

use std::fmt;

/// One of the sixteen general registers `v0`..`vF`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reg(u8);

impl Reg {
    /// Scratch for memory loads, low half
    pub const LOAD_LO: Reg = Reg(0x0);
    /// Scratch for memory loads, high half
    pub const LOAD_HI: Reg = Reg(0x1);
    /// Expression accumulator, low half
    pub const ACC_LO: Reg = Reg(0x2);
    /// Expression accumulator, high half
    pub const ACC_HI: Reg = Reg(0x3);
    /// Holds 0xFF for negation; borrowed by a few intrinsics
    pub const NEG: Reg = Reg(0xC);
    /// Frame base
    pub const BP: Reg = Reg(0xD);
    /// Stack pointer, an offset into the stack region
    pub const SP: Reg = Reg(0xE);
    /// Carry / not-borrow
    pub const FLAG: Reg = Reg(0xF);

    pub const COUNT: usize = 16;

    pub fn index(self) -> u8 {
        self.0
    }

    /// Register a bulk `ld [I], vX` / `ld vX, [I]` must name to move
    /// `size` bytes starting at `v0`
    pub fn bulk_for(size: u8) -> Reg {
        if size > 1 {
            Self::LOAD_HI
        } else {
            Self::LOAD_LO
        }
    }

    pub fn all() -> impl Iterator<Item = Reg> {
        (0..Self::COUNT as u8).map(Reg)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{:X}", self.index())
    }
}

/// Role of every register; unassigned registers are free for future use
#[derive(Debug, Clone)]
pub struct RegisterTable {
    roles: [Option<&'static str>; Reg::COUNT],
}

impl RegisterTable {
    pub fn new() -> Self {
        let mut roles = [None; Reg::COUNT];
        let mut reserve = |reg: Reg, role| roles[reg.0 as usize] = Some(role);
        reserve(Reg::LOAD_LO, "memory load, low half");
        reserve(Reg::LOAD_HI, "memory load, high half");
        reserve(Reg::ACC_LO, "accumulator, low half");
        reserve(Reg::ACC_HI, "accumulator, high half");
        reserve(Reg::NEG, "0xFF for negation");
        reserve(Reg::BP, "frame base");
        reserve(Reg::SP, "stack pointer");
        reserve(Reg::FLAG, "arithmetic flag");
        Self { roles }
    }

    pub fn role(&self, reg: Reg) -> Option<&'static str> {
        self.roles[reg.0 as usize]
    }

    /// Value every register holds when the program starts
    pub fn initial_value(&self, reg: Reg) -> u8 {
        if reg == Reg::NEG {
            0xFF
        } else {
            0
        }
    }

    /// `;; vX - role` lines
    pub fn describe(&self) -> impl Iterator<Item = String> + '_ {
        Reg::all().map(move |reg| format!(";; {reg} - {}", self.role(reg).unwrap_or("free")))
    }
}

impl Default for RegisterTable {
    fn default() -> Self {
        Self::new()
    }
}
