//! Semantic Analysis for Pascal8
//!
//! Performs:
//! - Symbol attribute resolution (type, global/local, const, procedure signature)
//! - Const protection
//! - Variable/procedure kind checks
//!
//! Assumes name resolution already succeeded: a name that cannot be found
//! here is an internal error, not a user one.

use log::debug;

use crate::feedback::Diagnostics;
use crate::frontend::ast::*;
use crate::frontend::scope::Environment;
use crate::types::*;
use crate::utils::{Error, Result};

/// Semantic analyzer
pub struct SemanticAnalyzer<'d> {
    pub symbols: Environment<SymbolAttrs>,
    diags: &'d mut Diagnostics,
}

impl<'d> SemanticAnalyzer<'d> {
    pub fn new(diags: &'d mut Diagnostics) -> Self {
        Self {
            symbols: Environment::with_builtins(SymbolAttrs::builtin),
            diags,
        }
    }

    /// Analyze a program
    pub fn analyze(&mut self, program: &Program) -> Result<()> {
        for decl in &program.decls {
            match decl {
                Decl::Var(var) => self.var_decl(var)?,
                Decl::Proc(proc) => self.proc_decl(proc)?,
            }
        }
        self.compound(&program.body)
    }

    fn resolve_type(&self, ty: &TypeRef) -> Result<SymType> {
        SymType::from_keyword(&ty.name.name)
            .ok_or_else(|| Error::Internal(format!("unresolved type '{}'", ty.name.name)))
    }

    fn lookup(&self, name: &Ident) -> Result<&SymbolAttrs> {
        self.symbols
            .lookup(&name.name)
            .map_err(|e| Error::Internal(e.to_string()))
    }

    fn var_decl(&mut self, var: &VarDecl) -> Result<()> {
        let ty = self.resolve_type(&var.ty)?;
        let attrs = VarAttrs::declared(ty, self.symbols.is_global(), var.is_const);
        self.symbols.define(var.name.name.clone(), SymbolAttrs::Variable(attrs));
        Ok(())
    }

    fn proc_decl(&mut self, proc: &ProcDecl) -> Result<()> {
        let params = proc
            .params
            .iter()
            .map(|p| self.resolve_type(&p.ty))
            .collect::<Result<Vec<_>>>()?;
        self.symbols
            .define(proc.name.name.clone(), SymbolAttrs::Procedure(ProcAttrs { params }));

        // Procedures are not lexically nested: chain straight to the globals
        let saved = self.symbols.current();
        let scope = self.symbols.with_enclosing(self.symbols.global());
        self.symbols.enter(scope);
        debug!("semantic: entering procedure {}", proc.name.name);

        let result = proc
            .params
            .iter()
            .chain(&proc.decls)
            .try_for_each(|decl| self.var_decl(decl))
            .and_then(|_| self.compound(&proc.body));

        self.symbols.enter(saved);
        result
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
                match self.lookup(&assign.target)? {
                    SymbolAttrs::Variable(var) if var.is_const => {
                        self.diags.report(Error::AssignToConst {
                            name: assign.target.name.clone(),
                            span: assign.target.span,
                        });
                    }
                    SymbolAttrs::Variable(_) => {}
                    _ => self.diags.report(Error::NotAVariable {
                        name: assign.target.name.clone(),
                        span: assign.target.span,
                    }),
                }
                self.expr(&assign.value)
            }
            Stmt::Call(call) => {
                if self.lookup(&call.name)?.as_proc().is_none() {
                    self.diags.report(Error::NotAProcedure {
                        name: call.name.name.clone(),
                        span: call.name.span,
                    });
                }
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
                if self.lookup(name)?.as_var().is_none() {
                    self.diags.report(Error::NotAVariable {
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

    /// Attributes of a global name after analysis
    #[cfg(test)]
    pub fn global(&self, name: &str) -> Option<&SymbolAttrs> {
        if self.symbols.is_global() {
            self.symbols.lookup_local(name).ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse_source;

    fn analyze(source: &str) -> (Diagnostics, Result<()>) {
        let (program, syntax) = parse_source(source);
        assert!(syntax.is_empty(), "{:?}", syntax);
        let mut diags = Diagnostics::new();
        let result = SemanticAnalyzer::new(&mut diags).analyze(&program);
        (diags, result)
    }

    #[test]
    fn test_attributes_of_declarations() {
        let (program, _) = parse_source(
            "var a: integer; const b: long;
             procedure p(x: long; y: integer); begin end;
             begin end.",
        );
        let mut diags = Diagnostics::new();
        let mut analyzer = SemanticAnalyzer::new(&mut diags);
        analyzer.analyze(&program).unwrap();

        assert_eq!(
            analyzer.global("a"),
            Some(&SymbolAttrs::Variable(VarAttrs::declared(SymType::Integer, true, false)))
        );
        assert_eq!(
            analyzer.global("b"),
            Some(&SymbolAttrs::Variable(VarAttrs::declared(SymType::Long, true, true)))
        );
        assert_eq!(
            analyzer.global("p"),
            Some(&SymbolAttrs::Procedure(ProcAttrs {
                params: vec![SymType::Long, SymType::Integer]
            }))
        );
    }

    #[test]
    fn test_assign_to_const() {
        let (diags, result) = analyze("const x: integer; begin x := 1 end.");
        assert!(result.is_ok());
        assert_eq!(diags.error_count(), 1);
        assert!(matches!(
            diags.errors().next(),
            Some(Error::AssignToConst { name, .. }) if name == "x"
        ));
    }

    #[test]
    fn test_local_const_is_protected() {
        let (diags, _) = analyze("procedure p; const k: long; begin k := 2 end; begin p end.");
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn test_kind_mismatches() {
        let (diags, _) = analyze(
            "var v: integer;
             procedure p; begin end;
             begin p := 1; v; v := p end.",
        );
        let errs: Vec<_> = diags.errors().collect();
        assert!(matches!(errs[0], Error::NotAVariable { name, .. } if name == "p"));
        assert!(matches!(errs[1], Error::NotAProcedure { name, .. } if name == "v"));
        assert!(matches!(errs[2], Error::NotAVariable { name, .. } if name == "p"));
        assert_eq!(errs.len(), 3);
    }

    #[test]
    fn test_undeclared_name_is_internal() {
        let (_, result) = analyze("begin ghost := 1 end.");
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn test_parameters_are_locals() {
        let (program, _) = parse_source("procedure p(n: long); begin n := n end; begin p(1) end.");
        let mut diags = Diagnostics::new();
        let mut analyzer = SemanticAnalyzer::new(&mut diags);
        assert!(analyzer.analyze(&program).is_ok());
        assert!(analyzer.global("n").is_none());
        drop(analyzer);
        assert!(!diags.has_errors());
    }
}
