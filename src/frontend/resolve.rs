//! Name resolution
//!
//! Rejects uses of undeclared names and duplicate declarations within one
//! scope. Each binding remembers where it was declared so a redefinition can
//! point back at the original.

use log::debug;

use crate::feedback::Diagnostics;
use crate::frontend::ast::*;
use crate::frontend::scope::Environment;
use crate::types::SymType;
use crate::utils::{Error, Span};

/// Declaration site of each visible name; `None` for builtins
pub struct NameResolver<'d> {
    scopes: Environment<Option<Span>>,
    diags: &'d mut Diagnostics,
}

impl<'d> NameResolver<'d> {
    pub fn new(diags: &'d mut Diagnostics) -> Self {
        Self {
            scopes: Environment::with_builtins(|_| None),
            diags,
        }
    }

    pub fn check(mut self, program: &Program) {
        for decl in &program.decls {
            match decl {
                Decl::Var(var) => self.var_decl(var),
                Decl::Proc(proc) => self.proc_decl(proc),
            }
        }
        self.compound(&program.body);
    }

    fn declare(&mut self, name: &Ident) {
        if self.scopes.has_local(&name.name) {
            let previous = self.scopes.lookup_local(&name.name).ok().copied().flatten();
            self.diags.report(Error::NameRedefinition {
                name: name.name.clone(),
                span: name.span,
                previous,
            });
        } else {
            self.scopes.define(name.name.clone(), Some(name.span));
        }
    }

    fn use_name(&mut self, name: &Ident) {
        if !self.scopes.has(&name.name) {
            self.diags.report(Error::NameUndefined {
                name: name.name.clone(),
                span: name.span,
            });
        }
    }

    fn var_decl(&mut self, var: &VarDecl) {
        self.declare(&var.name);
        self.type_ref(&var.ty);
    }

    /// Only the builtin type keywords name types
    fn type_ref(&mut self, ty: &TypeRef) {
        if !self.scopes.has(&ty.name.name) || SymType::from_keyword(&ty.name.name).is_none() {
            self.diags.report(Error::NameUndefined {
                name: ty.name.name.clone(),
                span: ty.name.span,
            });
        }
    }

    fn proc_decl(&mut self, proc: &ProcDecl) {
        self.declare(&proc.name);

        // Procedures see the global scope, never an enclosing procedure
        let saved = self.scopes.current();
        let scope = self.scopes.with_enclosing(self.scopes.global());
        self.scopes.enter(scope);
        debug!("names: entering procedure {}", proc.name.name);

        for param in &proc.params {
            self.var_decl(param);
        }
        for decl in &proc.decls {
            self.var_decl(decl);
        }
        self.compound(&proc.body);

        self.scopes.enter(saved);
    }

    fn compound(&mut self, compound: &Compound) {
        for stmt in &compound.stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Compound(compound) => self.compound(compound),
            Stmt::Assign(assign) => {
                self.use_name(&assign.target);
                self.expr(&assign.value);
            }
            Stmt::Call(call) => {
                self.use_name(&call.name);
                for arg in &call.args {
                    self.expr(arg);
                }
            }
            Stmt::If(if_stmt) => {
                self.expr(&if_stmt.cond);
                self.stmt(&if_stmt.then_branch);
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.stmt(else_branch);
                }
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Var(name) => self.use_name(name),
            Expr::IntLit { .. } => {}
            Expr::Unary { expr, .. } => self.expr(expr),
            Expr::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
        }
    }
}

/// Run name resolution over a whole program
pub fn resolve_names(program: &Program, diags: &mut Diagnostics) {
    NameResolver::new(diags).check(program);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse_source;

    fn errors(source: &str) -> Vec<Error> {
        let (program, syntax) = parse_source(source);
        assert!(syntax.is_empty(), "{:?}", syntax);
        let mut diags = Diagnostics::new();
        resolve_names(&program, &mut diags);
        diags.errors().cloned().collect()
    }

    #[test]
    fn test_clean_program() {
        let errs = errors(
            "program p;
             var a: integer;
             procedure inc(n: long);
             var t: long;
             begin t := n + 1; a := a end;
             begin inc(a); cls; make_bcd(a) end.",
        );
        assert!(errs.is_empty(), "{:?}", errs);
    }

    #[test]
    fn test_undefined_names() {
        let errs = errors("var a: integer; begin b := a + c; missing(1) end.");
        let names: Vec<_> = errs
            .iter()
            .map(|e| match e {
                Error::NameUndefined { name, .. } => name.as_str(),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(names, vec!["b", "c", "missing"]);
    }

    #[test]
    fn test_unknown_type() {
        let errs = errors("var a: real; var b: a; begin end.");
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().all(|e| matches!(e, Error::NameUndefined { .. })));
    }

    #[test]
    fn test_redefinition_points_at_first() {
        let source = "var x: integer; var x: long; var x: integer; begin end.";
        let errs = errors(source);
        assert_eq!(errs.len(), 2);
        for err in &errs {
            let Error::NameRedefinition { previous, .. } = err else {
                panic!("unexpected {:?}", err);
            };
            assert_eq!(*previous, Some(Span::new(4, 5)));
        }
    }

    #[test]
    fn test_single_redefinition() {
        let errs = errors("var x: integer; var x: long; begin end.");
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn test_shadowing_in_procedure_is_allowed() {
        let errs = errors(
            "var x: integer;
             procedure p(x: long); var y: integer; begin y := x end;
             begin p(x) end.",
        );
        assert!(errs.is_empty(), "{:?}", errs);
    }

    #[test]
    fn test_param_and_local_collide() {
        let errs = errors("procedure p(x: long); var x: integer; begin end; begin p(1) end.");
        assert!(matches!(errs.as_slice(), [Error::NameRedefinition { .. }]));
    }

    #[test]
    fn test_procedure_locals_do_not_leak() {
        let errs = errors(
            "procedure p; var hidden: integer; begin hidden := 1 end;
             procedure q; begin hidden := 2 end;
             begin p; q end.",
        );
        assert!(matches!(errs.as_slice(), [Error::NameUndefined { name, .. }] if name == "hidden"));
    }

    #[test]
    fn test_builtin_redefinition_has_no_note() {
        let errs = errors("var cls: integer; begin end.");
        assert!(matches!(
            errs.as_slice(),
            [Error::NameRedefinition { previous: None, .. }]
        ));
    }
}
