//! Backend module - Code generation

pub mod codegen;
pub mod frame;

pub mod chip8;

pub use codegen::CodeGen;
pub use chip8::{Chip8CodeGen, CodegenConfig};
