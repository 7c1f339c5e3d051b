//! CHIP-8 backend

pub mod codegen;
pub mod registers;

#[cfg(test)]
pub mod interp;

pub use codegen::{Chip8CodeGen, CodegenConfig};
