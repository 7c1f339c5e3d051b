//! Code Generation trait - Backend abstraction

use crate::frontend::ast::Program;
use crate::utils::Result;

/// Code generation backend trait
pub trait CodeGen {
    /// Lower a checked program to an assembly listing
    fn generate(&mut self, program: &Program) -> Result<String>;

    /// Name of the target machine
    fn target(&self) -> &str;

    /// Get the backend name
    fn name(&self) -> &str;
}
