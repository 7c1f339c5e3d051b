//! Liveness analysis
//!
//! Flags reads of variables that were never written and declarations that
//! are never read or called. Everything here is a warning.
//!
//! The walk is flow-insensitive across `if` branches: a write in either
//! branch counts as initialization for the statements that follow.

use log::debug;

use crate::feedback::Diagnostics;
use crate::frontend::ast::*;
use crate::frontend::scope::Environment;
use crate::utils::{Error, Result, Span, Warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Variable,
    Procedure,
    Builtin,
}

#[derive(Debug, Clone, Copy)]
struct Liveness {
    used: bool,
    initialized: bool,
    declared_at: Span,
    kind: Kind,
}

impl Liveness {
    fn declared(kind: Kind, declared_at: Span, initialized: bool) -> Self {
        Self {
            used: false,
            initialized,
            declared_at,
            kind,
        }
    }
}

pub struct LivenessChecker<'d> {
    scopes: Environment<Liveness>,
    diags: &'d mut Diagnostics,
}

impl<'d> LivenessChecker<'d> {
    pub fn new(diags: &'d mut Diagnostics) -> Self {
        Self {
            scopes: Environment::with_builtins(|_| Liveness {
                used: true,
                initialized: true,
                declared_at: Span::dummy(),
                kind: Kind::Builtin,
            }),
            diags,
        }
    }

    pub fn check(mut self, program: &Program) -> Result<()> {
        for decl in &program.decls {
            match decl {
                Decl::Var(var) => self.declare(&var.name, Kind::Variable, false),
                Decl::Proc(proc) => self.proc_decl(proc)?,
            }
        }
        self.compound(&program.body)?;
        self.sweep();
        Ok(())
    }

    fn declare(&mut self, name: &Ident, kind: Kind, initialized: bool) {
        self.scopes
            .define(name.name.clone(), Liveness::declared(kind, name.span, initialized));
    }

    fn entry(&mut self, name: &Ident) -> Result<&mut Liveness> {
        self.scopes
            .lookup_mut(&name.name)
            .map_err(|e| Error::Internal(e.to_string()))
    }

    fn proc_decl(&mut self, proc: &ProcDecl) -> Result<()> {
        self.declare(&proc.name, Kind::Procedure, true);

        let saved = self.scopes.current();
        let scope = self.scopes.with_enclosing(self.scopes.global());
        self.scopes.enter(scope);
        debug!("liveness: entering procedure {}", proc.name.name);

        // Arguments are written by the caller
        for param in &proc.params {
            self.declare(&param.name, Kind::Variable, true);
        }
        for decl in &proc.decls {
            self.declare(&decl.name, Kind::Variable, false);
        }
        let result = self.compound(&proc.body);
        if result.is_ok() {
            self.sweep();
        }

        self.scopes.enter(saved);
        result
    }

    /// Report every unused declaration of the active scope, in source order
    fn sweep(&mut self) {
        let mut unused: Vec<_> = self
            .scopes
            .entries()
            .filter(|(_, attrs)| !attrs.used)
            .map(|(name, attrs)| (name.to_string(), *attrs))
            .collect();
        unused.sort_by_key(|(_, attrs)| attrs.declared_at.start);

        for (name, attrs) in unused {
            let span = attrs.declared_at;
            match attrs.kind {
                Kind::Variable => self.diags.report_warning(Warning::UnusedVariable { name, span }),
                Kind::Procedure => self.diags.report_warning(Warning::UnusedProcedure { name, span }),
                Kind::Builtin => {}
            }
        }
    }

    fn compound(&mut self, compound: &Compound) -> Result<()> {
        for stmt in &compound.stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Compound(compound) => self.compound(compound),
            Stmt::Assign(assign) => {
                self.expr(&assign.value)?;
                // A write alone does not make the variable used
                self.entry(&assign.target)?.initialized = true;
                Ok(())
            }
            Stmt::Call(call) => {
                self.entry(&call.name)?.used = true;
                call.args.iter().try_for_each(|arg| self.expr(arg))
            }
            Stmt::If(if_stmt) => {
                self.expr(&if_stmt.cond)?;
                self.stmt(&if_stmt.then_branch)?;
                match &if_stmt.else_branch {
                    Some(else_branch) => self.stmt(else_branch),
                    None => Ok(()),
                }
            }
        }
    }

    fn expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Var(name) => {
                let entry = self.entry(name)?;
                entry.used = true;
                if !entry.initialized {
                    self.diags.report_warning(Warning::UninitializedRead {
                        name: name.name.clone(),
                        span: name.span,
                    });
                }
                Ok(())
            }
            Expr::IntLit { .. } => Ok(()),
            Expr::Unary { expr, .. } => self.expr(expr),
            Expr::Binary { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)
            }
        }
    }
}

/// Run the liveness checks over a whole program
pub fn check_liveness(program: &Program, diags: &mut Diagnostics) -> Result<()> {
    LivenessChecker::new(diags).check(program)
}
