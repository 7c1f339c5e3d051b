//! CHIP-8 Code Generator
//!
//! Lowers the checked AST to a CHIP-8 assembly listing. Expressions are
//! evaluated into the accumulator pair `v2`/`v3`; memory traffic goes through
//! `v0`/`v1`. Procedures get a frame in the stack region, addressed through
//! the frame-base register `vD`; globals live at labeled data words.
//!
//! User errors (bad argument counts, unsupported operators, oversized
//! literals) abandon the statement they occur in and are reported to the
//! diagnostics sink. A procedure frame too large to address loses its body.
//! Failing symbol or frame lookups mean an earlier pass let something
//! through and abort generation with `Error::Internal`.

use log::{debug, trace};

use crate::backend::chip8::registers::{Reg, RegisterTable};
use crate::backend::codegen::CodeGen;
use crate::backend::frame::FrameTracker;
use crate::feedback::Diagnostics;
use crate::frontend::ast::*;
use crate::frontend::scope::Environment;
use crate::types::*;
use crate::utils::{Error, Result, Span};

pub const STACK_ZONE: &str = "STACK_ZONE";
pub const BCD_ZONE_LOW: &str = "BCD_ZONE_LOW";
pub const BCD_ZONE_HIGH: &str = "BCD_ZONE_HIGH";
const ENTRY_LABEL: &str = "__start__main";
const END_LABEL: &str = "__end__main";

/// Label of a global variable's data word
pub fn global_label(name: &str) -> String {
    format!("var_{name}")
}

/// Label of a user procedure
pub fn proc_label(name: &str) -> String {
    format!("proc_{name}")
}

/// Generator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenConfig {
    /// Size of the stack region in two-byte words
    pub stack_words: usize,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self { stack_words: 32 }
    }
}

/// How a leaf value meets the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuseMode {
    Load,
    Add,
    Sub,
}

impl FuseMode {
    fn mnemonic(self) -> &'static str {
        match self {
            FuseMode::Load => "ld",
            FuseMode::Add => "add",
            FuseMode::Sub => "sub",
        }
    }
}

/// Lowering context threaded through expression generation
#[derive(Debug, Clone, Copy)]
struct ExprCtx {
    fuse: FuseMode,
    /// The value being computed is a Long
    wide: bool,
}

impl ExprCtx {
    fn load(wide: bool) -> Self {
        Self {
            fuse: FuseMode::Load,
            wide,
        }
    }

    fn with_fuse(self, fuse: FuseMode) -> Self {
        Self { fuse, ..self }
    }
}

fn imm(value: u8) -> String {
    format!("0x{value:02X}")
}

fn twos(value: u8) -> u8 {
    value.wrapping_neg()
}

fn parse_literal(text: &str, span: Span) -> Result<u16> {
    text.parse::<u16>().map_err(|_| Error::InvalidLiteral {
        text: text.to_string(),
        span,
    })
}

/// CHIP-8 code generator
pub struct Chip8CodeGen<'d> {
    config: CodegenConfig,
    symbols: Environment<SymbolAttrs>,
    frames: FrameTracker,
    registers: RegisterTable,
    output: String,
    /// Global variables in declaration order, for the data section
    globals: Vec<String>,
    if_counter: usize,
    diags: &'d mut Diagnostics,
}

impl<'d> Chip8CodeGen<'d> {
    pub fn new(config: CodegenConfig, diags: &'d mut Diagnostics) -> Self {
        Self {
            config,
            symbols: Environment::with_builtins(SymbolAttrs::builtin),
            frames: FrameTracker::new(),
            registers: RegisterTable::new(),
            output: String::new(),
            globals: Vec::new(),
            if_counter: 0,
            diags,
        }
    }

    /// Attributes the generator derived for a global name
    #[cfg(test)]
    pub fn global(&self, name: &str) -> Option<&SymbolAttrs> {
        if self.symbols.is_global() {
            self.symbols.lookup_local(name).ok()
        } else {
            None
        }
    }

    // ==================== Output ====================

    fn emit(&mut self, inst: impl AsRef<str>) {
        self.output.push_str(inst.as_ref());
        self.output.push('\n');
    }

    fn emit_commented(&mut self, inst: impl AsRef<str>, comment: &str) {
        self.emit(format!("{:<24}; {comment}", inst.as_ref()));
    }

    fn label(&mut self, name: &str) {
        self.emit(format!("{name}:"));
    }

    fn blank(&mut self) {
        self.output.push('\n');
    }

    fn data_words(&mut self, count: usize) {
        for _ in 0..count {
            self.emit("    dw 0");
        }
    }

    // ==================== Program structure ====================

    fn program(&mut self, program: &Program) -> Result<()> {
        self.emit(format!(";; {}", program.name.name));
        self.emit(";; CHIP-8 listing");
        let header: Vec<String> = self.registers.describe().collect();
        for line in header {
            self.emit(line);
        }
        self.blank();

        for reg in Reg::all() {
            let value = self.registers.initial_value(reg);
            self.emit(format!("ld {reg}, {}", imm(value)));
        }
        self.emit("ld I, 0");
        self.emit(format!("jp [{ENTRY_LABEL}]"));
        self.blank();

        for decl in &program.decls {
            match decl {
                Decl::Var(var) => self.var_decl(var)?,
                Decl::Proc(proc) => self.proc_decl(proc)?,
            }
        }

        // The top-level block owns no frame: globals are addressed by label
        self.label(ENTRY_LABEL);
        self.compound(&program.body)?;
        self.settle();
        self.blank();
        self.label(END_LABEL);
        self.emit(format!("jp [{END_LABEL}]"));
        self.blank();

        self.data_section();
        Ok(())
    }

    fn data_section(&mut self) {
        self.emit(";; global vars");
        for name in std::mem::take(&mut self.globals) {
            self.label(&global_label(&name));
            self.data_words(1);
        }
        self.blank();
        for zone in [BCD_ZONE_LOW, BCD_ZONE_HIGH] {
            self.label(zone);
            self.data_words(2);
            self.blank();
        }
        self.label(STACK_ZONE);
        self.data_words(self.config.stack_words);
    }

    fn resolve_type(&self, ty: &TypeRef) -> Result<SymType> {
        SymType::from_keyword(&ty.name.name)
            .ok_or_else(|| Error::Internal(format!("unresolved type '{}'", ty.name.name)))
    }

    fn var_decl(&mut self, var: &VarDecl) -> Result<()> {
        let ty = self.resolve_type(&var.ty)?;
        let is_global = self.symbols.is_global();
        let attrs = VarAttrs::declared(ty, is_global, var.is_const);
        self.symbols.define(var.name.name.clone(), SymbolAttrs::Variable(attrs));
        if is_global {
            self.globals.push(var.name.name.clone());
        } else {
            self.frames.push(var.name.name.clone(), ty.size_of());
        }
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

        let saved_scope = self.symbols.current();
        let scope = self.symbols.with_enclosing(self.symbols.global());
        self.symbols.enter(scope);
        let saved_block = self.frames.current();
        let block = self.frames.with_enclosing(self.frames.root());
        self.frames.enter(block);
        debug!("codegen: entering procedure {}", proc.name.name);

        let result = proc
            .params
            .iter()
            .chain(&proc.decls)
            .try_for_each(|decl| self.var_decl(decl))
            .and_then(|_| {
                self.label(&proc_label(&proc.name.name));
                self.block(&proc.name, &proc.body)
            });
        self.emit("ret");
        self.blank();

        self.frames.enter(saved_block);
        self.symbols.enter(saved_scope);
        result
    }

    /// Frame setup, body, frame teardown. A frame the 8-bit stack pointer
    /// can't span is reported and the body is skipped
    fn block(&mut self, name: &Ident, body: &Compound) -> Result<()> {
        let Ok(size) = u8::try_from(self.frames.size()) else {
            self.diags.report(Error::FrameTooLarge {
                name: name.name.clone(),
                size: self.frames.size(),
                span: name.span,
            });
            return Ok(());
        };
        trace!("codegen: frame of {} is {size} bytes", name.name);

        self.emit_commented(format!("ld I, [{STACK_ZONE}]"), "block start");
        self.emit(format!("add I, {}", Reg::SP));
        self.emit(format!("ld {}, {}", Reg::LOAD_LO, Reg::BP));
        self.emit(format!("ld [I], {}", Reg::LOAD_LO));
        self.emit(format!("add {}, {}", Reg::SP, imm(1)));
        self.emit(format!("ld {}, {}", Reg::BP, Reg::SP));
        if size > 0 {
            self.emit(format!("add {}, {}", Reg::SP, imm(size)));
        }
        self.blank();

        self.compound(body)?;
        self.settle();

        self.emit_commented(format!("ld {}, {}", Reg::SP, Reg::BP), "block end");
        self.emit(format!("add {}, {}", Reg::SP, imm(0xFF)));
        self.emit(format!("ld I, [{STACK_ZONE}]"));
        self.emit(format!("add I, {}", Reg::SP));
        self.emit(format!("ld {}, [I]", Reg::LOAD_LO));
        self.emit(format!("ld {}, {}", Reg::BP, Reg::LOAD_LO));
        Ok(())
    }

    /// Undo the displacement cached in the frame-base register
    fn settle(&mut self) {
        let last = self.frames.last_offset().0;
        if last != 0 {
            self.emit_commented(format!("add {}, {}", Reg::BP, imm(twos(last))), "settle frame base");
        }
        self.frames.reset_cache();
    }

    // ==================== Statements ====================

    fn compound(&mut self, compound: &Compound) -> Result<()> {
        for stmt in &compound.stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    /// Lower one statement; user errors abandon it and generation continues
    fn stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match self.lower_stmt(stmt) {
            Err(err) if !err.is_internal() => {
                self.diags.report(err);
                Ok(())
            }
            other => other,
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Compound(compound) => self.compound(compound),
            Stmt::Assign(assign) => self.assignment(assign),
            Stmt::Call(call) => self.call(call),
            Stmt::If(if_stmt) => self.if_stmt(if_stmt),
        }
    }

    fn variable(&self, name: &Ident) -> Result<VarAttrs> {
        match self.symbols.lookup(&name.name) {
            Ok(SymbolAttrs::Variable(var)) => Ok(*var),
            Ok(_) => Err(Error::Internal(format!("'{}' is not a variable", name.name))),
            Err(e) => Err(Error::Internal(e.to_string())),
        }
    }

    /// Point `I` at a variable's storage
    fn address(&mut self, name: &str, var: VarAttrs, comment: &str) -> Result<()> {
        if let Storage::Register(r) = var.storage {
            return Err(Error::Internal(format!("'{name}' is pinned to v{r:X}")));
        }
        if var.is_global {
            self.emit_commented(format!("ld I, [{}]", global_label(name)), comment);
            return Ok(());
        }
        let delta = self
            .frames
            .offset_from_last(name)
            .ok_or_else(|| Error::Internal(format!("no frame slot for '{name}'")))?;
        self.emit_commented(format!("ld I, [{STACK_ZONE}]"), comment);
        if delta.0 != 0 {
            self.emit(format!("add {}, {}", Reg::BP, imm(delta.0)));
        }
        self.emit(format!("add I, {}", Reg::BP));
        Ok(())
    }

    fn assignment(&mut self, assign: &Assignment) -> Result<()> {
        let var = self.variable(&assign.target)?;
        trace!("codegen: assign {}", assign.target.name);
        self.expr(&assign.value, ExprCtx::load(var.ty.is_wide()))?;

        let comment = format!("assign {}", assign.target.name);
        self.address(&assign.target.name, var, &comment)?;
        self.store_accumulator(var.ty);
        self.blank();
        Ok(())
    }

    /// Write the accumulator to `[I]`
    fn store_accumulator(&mut self, ty: SymType) {
        self.emit(format!("ld {}, {}", Reg::LOAD_LO, Reg::ACC_LO));
        if ty.is_wide() {
            self.emit(format!("ld {}, {}", Reg::LOAD_HI, Reg::ACC_HI));
        }
        self.emit(format!("ld [I], {}", Reg::bulk_for(ty.size_of())));
    }

    fn if_stmt(&mut self, if_stmt: &IfStmt) -> Result<()> {
        let n = self.if_counter;
        self.if_counter += 1;
        let else_label = format!("__if_else_{n}");
        let end_label = format!("__if_end_{n}");
        trace!("codegen: if #{n}");

        let wide = self.is_wide(&if_stmt.cond)?;
        self.expr(&if_stmt.cond, ExprCtx::load(wide))?;
        self.settle();
        if wide {
            let merge = format!("or {}, {}", Reg::ACC_LO, Reg::ACC_HI);
            self.emit_commented(merge, "merge condition halves");
        }
        self.emit_commented(format!("sne {}, {}", Reg::ACC_LO, imm(0)), "if");
        self.emit(format!("jp [{else_label}]"));

        self.stmt(&if_stmt.then_branch)?;
        self.settle();
        match &if_stmt.else_branch {
            Some(else_branch) => {
                self.emit(format!("jp [{end_label}]"));
                self.label(&else_label);
                self.stmt(else_branch)?;
                self.settle();
                self.label(&end_label);
            }
            None => self.label(&else_label),
        }
        Ok(())
    }

    // ==================== Calls ====================

    fn call(&mut self, call: &ProcCall) -> Result<()> {
        let proc = match self.symbols.lookup(&call.name.name) {
            Ok(SymbolAttrs::Procedure(proc)) => proc.clone(),
            Ok(_) => {
                return Err(Error::Internal(format!("'{}' is not a procedure", call.name.name)))
            }
            Err(e) => return Err(Error::Internal(e.to_string())),
        };
        if call.args.len() != proc.arity() {
            return Err(Error::WrongArgumentCount {
                name: call.name.name.clone(),
                expected: proc.arity(),
                got: call.args.len(),
                span: call.name.span,
            });
        }

        match Intrinsic::from_name(&call.name.name) {
            Some(intrinsic) => self.intrinsic(intrinsic, &call.args),
            None => self.user_call(&call.name.name, &proc, &call.args),
        }
    }

    fn user_call(&mut self, name: &str, proc: &ProcAttrs, args: &[Expr]) -> Result<()> {
        trace!("codegen: call {name}");
        // Slot for the callee's saved frame base
        self.emit_commented(format!("add {}, {}", Reg::SP, imm(1)), &format!("call {name}"));
        let mut reserved = 1u8;

        for (arg, ty) in args.iter().zip(&proc.params) {
            self.expr(arg, ExprCtx::load(ty.is_wide()))?;
            self.emit(format!("ld I, [{STACK_ZONE}]"));
            self.emit(format!("add I, {}", Reg::SP));
            self.store_accumulator(*ty);
            self.emit(format!("add {}, {}", Reg::SP, imm(ty.size_of())));
            reserved = reserved.wrapping_add(ty.size_of());
        }

        self.emit(format!("add {}, {}", Reg::SP, imm(twos(reserved))));
        self.emit(format!("call [{}]", proc_label(name)));
        self.blank();
        Ok(())
    }

    fn intrinsic(&mut self, intrinsic: Intrinsic, args: &[Expr]) -> Result<()> {
        trace!("codegen: intrinsic {}", intrinsic.name());
        match intrinsic {
            Intrinsic::Cls => self.emit("cls"),
            Intrinsic::Break => self.emit("break"),
            Intrinsic::MakeBcd => {
                let [arg] = args else {
                    return Err(Error::Internal("make_bcd takes one argument".into()));
                };
                self.expr(arg, ExprCtx::load(true))?;
                self.emit_commented(format!("ld I, [{BCD_ZONE_LOW}]"), "make_bcd");
                self.emit(format!("ld B, {}", Reg::ACC_LO));
                self.emit(format!("ld I, [{BCD_ZONE_HIGH}]"));
                self.emit(format!("ld B, {}", Reg::ACC_HI));
            }
            Intrinsic::DebugPrintBcd => self.print_bcd(BCD_ZONE_LOW),
            Intrinsic::DebugPrintBcdHigh => self.print_bcd(BCD_ZONE_HIGH),
        }
        self.blank();
        Ok(())
    }

    /// Draw the three digits stored at `zone` in the top-left corner
    fn print_bcd(&mut self, zone: &str) {
        let (x, y) = (Reg::LOAD_LO, Reg::NEG);
        self.emit_commented(format!("ld {y}, {}", imm(0)), &format!("print {zone}"));
        self.emit(format!("ld I, [{zone}]"));
        self.emit(format!("ld {}, [I]", Reg::ACC_LO));
        self.emit(format!("ld F, {}", Reg::LOAD_LO));
        self.emit(format!("drw {y}, {y}, 5"));
        self.emit(format!("ld {x}, {}", imm(6)));
        self.emit(format!("ld F, {}", Reg::LOAD_HI));
        self.emit(format!("drw {x}, {y}, 5"));
        self.emit(format!("add {x}, {}", imm(6)));
        self.emit(format!("ld F, {}", Reg::ACC_LO));
        self.emit(format!("drw {x}, {y}, 5"));
        self.emit(format!("ld {y}, {}", imm(0xFF)));
    }

    // ==================== Expressions ====================

    /// Whether an expression needs both accumulator bytes
    fn is_wide(&self, expr: &Expr) -> Result<bool> {
        match expr {
            Expr::Var(name) => Ok(self.variable(name)?.ty.is_wide()),
            Expr::IntLit { text, span } => Ok(parse_literal(text, *span)? > 0xFF),
            Expr::Unary { expr, .. } => self.is_wide(expr),
            Expr::Binary { left, right, .. } => Ok(self.is_wide(left)? || self.is_wide(right)?),
        }
    }

    fn expr(&mut self, expr: &Expr, ctx: ExprCtx) -> Result<()> {
        match expr {
            Expr::Var(name) => self.load_var(name, ctx),
            Expr::IntLit { text, span } => {
                let value = parse_literal(text, *span)?;
                self.literal(value, ctx);
                Ok(())
            }
            Expr::Unary { op, expr, .. } => {
                self.expr(expr, ctx.with_fuse(FuseMode::Load))?;
                if *op == UnOp::Neg {
                    self.negate(ctx.wide);
                }
                Ok(())
            }
            Expr::Binary {
                left,
                op,
                right,
                span,
            } => self.binary(left, *op, right, *span, ctx),
        }
    }

    fn binary(
        &mut self,
        left: &Expr,
        op: BinOp,
        right: &Expr,
        span: Span,
        ctx: ExprCtx,
    ) -> Result<()> {
        let fuse = match op {
            BinOp::Add => FuseMode::Add,
            BinOp::Sub => FuseMode::Sub,
            BinOp::Mul | BinOp::Div => {
                return Err(Error::UnimplementedOperator {
                    op: op.symbol().to_string(),
                    span,
                })
            }
        };

        self.expr(left, ctx.with_fuse(FuseMode::Load))?;
        if right.is_leaf() {
            return self.expr(right, ctx.with_fuse(fuse));
        }

        let width = if ctx.wide { 2 } else { 1 };
        self.spill(ctx.wide, width);
        self.expr(right, ctx.with_fuse(FuseMode::Load))?;
        self.reload_and_combine(fuse, ctx.wide, width);
        Ok(())
    }

    /// Push the accumulator onto the stack region
    fn spill(&mut self, wide: bool, width: u8) {
        trace!("codegen: spill {width} bytes");
        self.emit_commented(format!("ld {}, {}", Reg::LOAD_LO, Reg::ACC_LO), "spill left operand");
        if wide {
            self.emit(format!("ld {}, {}", Reg::LOAD_HI, Reg::ACC_HI));
        }
        self.emit(format!("ld I, [{STACK_ZONE}]"));
        self.emit(format!("add I, {}", Reg::SP));
        self.emit(format!("ld [I], {}", Reg::bulk_for(width)));
        self.emit(format!("add {}, {}", Reg::SP, imm(width)));
    }

    /// Pop the spilled left operand and combine it with the accumulator,
    /// keeping source operand order
    fn reload_and_combine(&mut self, fuse: FuseMode, wide: bool, width: u8) {
        self.emit_commented(format!("ld I, [{STACK_ZONE}]"), "reload left operand");
        self.emit(format!("add {}, {}", Reg::SP, imm(twos(width))));
        self.emit(format!("add I, {}", Reg::SP));
        self.emit(format!("ld {}, [I]", Reg::bulk_for(width)));

        let (lo, hi) = (Reg::LOAD_LO, Reg::LOAD_HI);
        match fuse {
            FuseMode::Add => {
                self.emit(format!("add {lo}, {}", Reg::ACC_LO));
                if wide {
                    self.emit(format!("add {hi}, {}", Reg::FLAG));
                    self.emit(format!("add {hi}, {}", Reg::ACC_HI));
                }
            }
            FuseMode::Sub => {
                self.emit(format!("sub {lo}, {}", Reg::ACC_LO));
                if wide {
                    self.emit(format!("add {hi}, {}", Reg::FLAG));
                    self.emit(format!("add {hi}, {}", imm(0xFF)));
                    self.emit(format!("sub {hi}, {}", Reg::ACC_HI));
                }
            }
            FuseMode::Load => {}
        }
        self.emit(format!("ld {}, {lo}", Reg::ACC_LO));
        if wide {
            self.emit(format!("ld {}, {hi}", Reg::ACC_HI));
        }
    }

    fn load_var(&mut self, name: &Ident, ctx: ExprCtx) -> Result<()> {
        let var = self.variable(name)?;
        let comment = format!("{} {}", ctx.fuse.mnemonic(), name.name);
        self.address(&name.name, var, &comment)?;

        let var_wide = var.ty.is_wide();
        let bulk = if var_wide && ctx.wide {
            Reg::LOAD_HI
        } else {
            Reg::LOAD_LO
        };
        self.emit(format!("ld {bulk}, [I]"));
        self.emit(format!("{} {}, {}", ctx.fuse.mnemonic(), Reg::ACC_LO, Reg::LOAD_LO));
        if !ctx.wide {
            return Ok(());
        }

        let acc = Reg::ACC_HI;
        match (ctx.fuse, var_wide) {
            (FuseMode::Load, true) => self.emit(format!("ld {acc}, {}", Reg::LOAD_HI)),
            (FuseMode::Load, false) => self.emit(format!("ld {acc}, {}", imm(0))),
            (FuseMode::Add, _) => {
                self.emit(format!("add {acc}, {}", Reg::FLAG));
                if var_wide {
                    self.emit(format!("add {acc}, {}", Reg::LOAD_HI));
                }
            }
            (FuseMode::Sub, _) => {
                self.emit(format!("add {acc}, {}", Reg::FLAG));
                self.emit(format!("add {acc}, {}", imm(0xFF)));
                if var_wide {
                    self.emit(format!("sub {acc}, {}", Reg::LOAD_HI));
                }
            }
        }
        Ok(())
    }

    fn literal(&mut self, value: u16, ctx: ExprCtx) {
        let [low, high] = value.to_le_bytes();
        let (acc_lo, acc_hi) = (Reg::ACC_LO, Reg::ACC_HI);
        let comment = format!("literal {value}");

        match (ctx.fuse, ctx.wide) {
            (FuseMode::Load, _) => {
                self.emit_commented(format!("ld {acc_lo}, {}", imm(low)), &comment);
                if ctx.wide {
                    self.emit(format!("ld {acc_hi}, {}", imm(high)));
                }
            }
            (FuseMode::Add, false) => {
                self.emit_commented(format!("add {acc_lo}, {}", imm(low)), &comment)
            }
            // No sub-immediate on CHIP-8
            (FuseMode::Sub, false) => {
                self.emit_commented(format!("add {acc_lo}, {}", imm(twos(low))), &comment)
            }
            (FuseMode::Add, true) => {
                self.emit_commented(format!("ld {}, {}", Reg::LOAD_LO, imm(low)), &comment);
                self.emit(format!("add {acc_lo}, {}", Reg::LOAD_LO));
                self.emit(format!("add {acc_hi}, {}", Reg::FLAG));
                self.emit(format!("add {acc_hi}, {}", imm(high)));
            }
            // high := high + flag - 1 - literal_high
            (FuseMode::Sub, true) => {
                self.emit_commented(format!("ld {}, {}", Reg::LOAD_LO, imm(low)), &comment);
                self.emit(format!("sub {acc_lo}, {}", Reg::LOAD_LO));
                self.emit(format!("add {acc_hi}, {}", Reg::FLAG));
                self.emit(format!("add {acc_hi}, {}", imm(!high)));
            }
        }
    }

    /// Two's-complement negation of the accumulator
    fn negate(&mut self, wide: bool) {
        let (lo, hi, neg) = (Reg::ACC_LO, Reg::ACC_HI, Reg::NEG);
        self.emit_commented(format!("xor {lo}, {neg}"), "negate");
        if !wide {
            self.emit(format!("add {lo}, {}", imm(1)));
            return;
        }
        self.emit(format!("xor {hi}, {neg}"));
        self.emit(format!("ld {neg}, {}", imm(1)));
        self.emit(format!("add {lo}, {neg}"));
        self.emit(format!("add {hi}, {}", Reg::FLAG));
        self.emit(format!("ld {neg}, {}", imm(0xFF)));
    }
}

impl CodeGen for Chip8CodeGen<'_> {
    fn generate(&mut self, program: &Program) -> Result<String> {
        self.output.clear();
        self.program(program)?;
        Ok(std::mem::take(&mut self.output))
    }

    fn target(&self) -> &str {
        "chip8"
    }

    fn name(&self) -> &str {
        "CHIP-8"
    }
}
