use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use crate::{
    ast::{self, BinaryOperator, Expr, ExprKind, Stmt, StmtKind, TypeName},
    ir::{
        self, builder::FunctionBuilder, BinaryOp, CmpPred, ExternFunction, Inst, Signature,
        SlotId, Terminator, Ty, Value,
    },
    numeral::{self, NumeralError},
    util::intern::Interner,
};

/// The sole machine type; every other type name is advisory.
pub const INT_TYPE_NAME: &str = "i64";

/// The reserved callee name of the formatted-print builtin.
pub const PRINT_BUILTIN: &str = "say";

/// The variadic primitive `say` lowers to.
pub const PRINT_PRIMITIVE: &str = "printf";

type Result<T, E = LowerError> = std::result::Result<T, E>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LowerError {
    #[error("{line}: undefined name `{name}`")]
    UndefinedName { name: Box<str>, line: usize },
    #[error("{line}: assignment to undeclared variable `{name}`")]
    UndeclaredAssignment { name: Box<str>, line: usize },
    #[error("{line}: function `{name}` is defined more than once")]
    DuplicateFunction { name: Box<str>, line: usize },
    #[error("{line}: parameter `{name}` of `{function}` is declared more than once")]
    DuplicateParameter {
        name: Box<str>,
        function: Box<str>,
        line: usize,
    },
    #[error("{line}: function `{name}` takes {expected} arguments, but {found} were given")]
    ArityMismatch {
        name: Box<str>,
        expected: usize,
        found: usize,
        line: usize,
    },
    #[error("{line}: extern `{name}` was first called with {expected} arguments, but now with {found}")]
    ConflictingExtern {
        name: Box<str>,
        expected: usize,
        found: usize,
        line: usize,
    },
    #[error("{line}: `{name}` is reserved for the print builtin")]
    ReservedName { name: Box<str>, line: usize },
    /// Only a function declared `-> i64` returns a value.
    #[error("{line}: function `{name}` does not return a value, declare it with `-> i64`")]
    ReturnValueFromVoid { name: Box<str>, line: usize },
    #[error("{line}: only a function name can be called")]
    InvalidCallee { line: usize },
    #[error("{line}: {error}")]
    Numeral {
        #[source]
        error: NumeralError,
        line: usize,
    },
}

impl LowerError {
    pub fn line(&self) -> usize {
        match self {
            LowerError::UndefinedName { line, .. }
            | LowerError::UndeclaredAssignment { line, .. }
            | LowerError::DuplicateFunction { line, .. }
            | LowerError::DuplicateParameter { line, .. }
            | LowerError::ArityMismatch { line, .. }
            | LowerError::ConflictingExtern { line, .. }
            | LowerError::ReservedName { line, .. }
            | LowerError::ReturnValueFromVoid { line, .. }
            | LowerError::InvalidCallee { line }
            | LowerError::Numeral { line, .. } => *line,
        }
    }
}

/// Lowers a parsed module. `name` becomes the IR module's identifier.
pub fn lower(module: &ast::Module, name: &str) -> Result<ir::Module> {
    let mut cx = ModuleContext {
        functions: HashMap::with_capacity(module.functions.len()),
        externs: ExternTable::default(),
        strings: Interner::with_capacity(16),
    };

    // Declare every signature first, so calls may refer to later functions.
    for function in &module.functions {
        check_parameters(function)?;
        let sig = Signature::integers(function.params.len(), returns_int(function));
        if cx.functions.insert(&function.name, sig).is_some() {
            return Err(LowerError::DuplicateFunction {
                name: function.name.clone(),
                line: function.line,
            });
        }
    }

    let mut functions = Vec::with_capacity(module.functions.len());
    for function in &module.functions {
        functions.push(FunctionLowerer::lower(&mut cx, function)?);
    }

    Ok(ir::Module {
        name: name.into(),
        strings: cx.strings,
        externs: cx.externs.into_declarations(),
        functions,
    })
}

fn check_parameters(function: &ast::Function) -> Result<()> {
    for (i, param) in function.params.iter().enumerate() {
        if function.params[..i].iter().any(|p| p.name == param.name) {
            return Err(LowerError::DuplicateParameter {
                name: param.name.clone(),
                function: function.name.clone(),
                line: function.line,
            });
        }
    }
    Ok(())
}

fn returns_int(function: &ast::Function) -> bool {
    function.return_ty.as_ref().is_some_and(|ty| {
        check_advisory(ty, function.line);
        ty.name() == INT_TYPE_NAME
    })
}

fn check_advisory(ty: &TypeName, line: usize) {
    if ty.name() != INT_TYPE_NAME {
        warn!(
            "line {line}: type `{}` is advisory only, treating it as `{INT_TYPE_NAME}`",
            ty.name()
        );
    }
}

/// State shared by every function of one module.
struct ModuleContext<'ast> {
    functions: HashMap<&'ast str, Signature>,
    externs: ExternTable,
    strings: Interner<str>,
}

impl ModuleContext<'_> {
    fn intern_string(&mut self, value: &str) -> Value {
        let handle = self.strings.intern(value);
        debug!("string constant @.str.{} = {value:?}", handle.index());
        Value::Str(handle)
    }
}

/// Functions called but not defined in the module. The first call site
/// fixes the signature; later call sites must agree with it.
#[derive(Default)]
struct ExternTable {
    declarations: Vec<ExternFunction>,
    by_name: HashMap<Box<str>, usize>,
}

impl ExternTable {
    fn get(&self, name: &str) -> Option<&ExternFunction> {
        self.by_name.get(name).map(|&i| &self.declarations[i])
    }

    fn declare(&mut self, name: &str, sig: Signature, line: usize) -> Result<()> {
        if let Some(existing) = self.get(name) {
            if existing.sig == sig {
                return Ok(());
            }
            if existing.sig.variadic || sig.variadic {
                return Err(LowerError::ReservedName {
                    name: name.into(),
                    line,
                });
            }
            return Err(LowerError::ConflictingExtern {
                name: name.into(),
                expected: existing.sig.params.len(),
                found: sig.params.len(),
                line,
            });
        }
        debug!("declaring extern `{name}` with {} parameters", sig.params.len());
        self.by_name.insert(name.into(), self.declarations.len());
        self.declarations.push(ExternFunction {
            name: name.into(),
            sig,
        });
        Ok(())
    }

    fn into_declarations(self) -> Vec<ExternFunction> {
        self.declarations
    }
}

fn print_primitive_sig() -> Signature {
    Signature {
        params: vec![Ty::Ptr],
        variadic: true,
        ret: Ty::I32,
    }
}

struct FunctionLowerer<'cx, 'ast> {
    cx: &'cx mut ModuleContext<'ast>,
    function: &'ast ast::Function,
    builder: FunctionBuilder,
    /// The single scope of the function: later bindings replace earlier ones.
    slots: HashMap<&'ast str, SlotId>,
}

impl<'cx, 'ast> FunctionLowerer<'cx, 'ast> {
    fn lower(cx: &'cx mut ModuleContext<'ast>, function: &'ast ast::Function) -> Result<ir::Function> {
        let sig = cx.functions[&*function.name].clone();
        let params = function.params.iter().map(|p| p.name.clone()).collect();
        let mut this = FunctionLowerer {
            cx,
            function,
            builder: FunctionBuilder::new(function.name.clone(), params, sig),
            slots: HashMap::new(),
        };

        for (i, param) in function.params.iter().enumerate() {
            if let Some(ty) = &param.ty {
                check_advisory(ty, function.line);
            }
            let slot = this.bind(&param.name);
            this.builder.push(Inst::Store {
                slot,
                value: Value::Param(i),
            });
        }

        this.lower_block(&function.body)?;
        if !this.builder.is_current_block_terminated() {
            this.terminate_with_default_return();
        }

        let lowered = this.builder.finish();
        debug!(
            "lowered `{}`: {} slots, {} blocks",
            lowered.name,
            lowered.slots.len(),
            lowered.blocks.len()
        );
        Ok(lowered)
    }

    fn lower_block(&mut self, body: &'ast [Stmt]) -> Result<()> {
        for stmt in body {
            if self.builder.is_current_block_terminated() {
                let dead = self.builder.create_block("dead");
                self.builder.position_at(dead);
            }
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &'ast Stmt) -> Result<()> {
        let line = stmt.line;
        match &stmt.kind {
            StmtKind::Binding(binding) => {
                if let Some(ty) = &binding.ty {
                    check_advisory(ty, line);
                }
                let value = self.lower_expr(&binding.initializer)?;
                let slot = self.bind(&binding.name);
                self.builder.push(Inst::Store { slot, value });
            }

            StmtKind::Assignment { target, value } => {
                let value = self.lower_expr(value)?;
                let Some(&slot) = self.slots.get(&**target) else {
                    return Err(LowerError::UndeclaredAssignment {
                        name: target.clone(),
                        line,
                    });
                };
                self.builder.push(Inst::Store { slot, value });
            }

            StmtKind::Return(Some(value)) => {
                if !self.builder.sig().returns_value() {
                    return Err(LowerError::ReturnValueFromVoid {
                        name: self.function.name.clone(),
                        line,
                    });
                }
                let value = self.lower_expr(value)?;
                self.builder.terminate(Terminator::Ret(Some(value)));
            }
            StmtKind::Return(None) => self.terminate_with_default_return(),

            StmtKind::Expr(expr) => {
                self.lower_expr(expr)?;
            }

            StmtKind::If {
                predicate,
                then_body,
                else_body,
            } => self.lower_if(predicate, then_body, else_body)?,

            StmtKind::While { predicate, body } => {
                let cond_bb = self.builder.create_block("while.cond");
                let body_bb = self.builder.create_block("while.body");
                let end_bb = self.builder.create_block("while.end");
                self.builder.terminate(Terminator::Br(cond_bb));

                self.builder.position_at(cond_bb);
                let cond = self.lower_truthy(predicate)?;
                self.builder.terminate(Terminator::CondBr {
                    cond,
                    then_block: body_bb,
                    else_block: end_bb,
                });

                self.builder.position_at(body_bb);
                self.lower_block(body)?;
                if !self.builder.is_current_block_terminated() {
                    self.builder.terminate(Terminator::Br(cond_bb));
                }

                self.builder.position_at(end_bb);
            }

            StmtKind::ForRange {
                var,
                start,
                end,
                body,
            } => self.lower_for_range(var, start, end, body)?,
        }
        Ok(())
    }

    fn lower_if(
        &mut self,
        predicate: &'ast Expr,
        then_body: &'ast [Stmt],
        else_body: &'ast [Stmt],
    ) -> Result<()> {
        let cond = self.lower_truthy(predicate)?;
        let then_bb = self.builder.create_block("then");
        let else_bb = self.builder.create_block("else");
        self.builder.terminate(Terminator::CondBr {
            cond,
            then_block: then_bb,
            else_block: else_bb,
        });

        self.builder.position_at(then_bb);
        self.lower_block(then_body)?;
        let then_tail = self.builder.current();

        self.builder.position_at(else_bb);
        self.lower_block(else_body)?;
        let else_tail = self.builder.current();

        // Only branch tails that are still open converge; when both ended in
        // a terminator there is nothing to continue into.
        let open_tails: Vec<_> = [then_tail, else_tail].into_iter().flatten().collect();
        if open_tails.is_empty() {
            return Ok(());
        }
        let end_bb = self.builder.create_block("ifend");
        for tail in open_tails {
            self.builder.position_at(tail);
            self.builder.terminate(Terminator::Br(end_bb));
        }
        self.builder.position_at(end_bb);
        Ok(())
    }

    fn lower_for_range(
        &mut self,
        var: &'ast str,
        start: &'ast Expr,
        end: &'ast Expr,
        body: &'ast [Stmt],
    ) -> Result<()> {
        let start = self.lower_expr(start)?;
        let slot = self.bind(var);
        self.builder.push(Inst::Store { slot, value: start });

        let cond_bb = self.builder.create_block("for.cond");
        let body_bb = self.builder.create_block("for.body");
        let inc_bb = self.builder.create_block("for.inc");
        let end_bb = self.builder.create_block("for.end");
        self.builder.terminate(Terminator::Br(cond_bb));

        // The bound is evaluated again on every test.
        self.builder.position_at(cond_bb);
        let current = self.load(slot);
        let bound = self.lower_expr(end)?;
        let cond = self.cmp(CmpPred::Slt, current, bound);
        self.builder.terminate(Terminator::CondBr {
            cond,
            then_block: body_bb,
            else_block: end_bb,
        });

        self.builder.position_at(body_bb);
        self.lower_block(body)?;
        if !self.builder.is_current_block_terminated() {
            self.builder.terminate(Terminator::Br(inc_bb));
        }

        self.builder.position_at(inc_bb);
        let current = self.load(slot);
        let next = self.binary(BinaryOp::Add, current, Value::Int(1));
        self.builder.push(Inst::Store { slot, value: next });
        self.builder.terminate(Terminator::Br(cond_bb));

        self.builder.position_at(end_bb);
        Ok(())
    }

    fn lower_expr(&mut self, expr: &'ast Expr) -> Result<Value> {
        let line = expr.line;
        let value = match &expr.kind {
            ExprKind::Int(lexeme) => {
                let n = numeral::decode_int(lexeme)
                    .map_err(|error| LowerError::Numeral { error, line })?;
                Value::Int(n)
            }
            ExprKind::Float(lexeme) => {
                let n = numeral::decode_float(lexeme)
                    .map_err(|error| LowerError::Numeral { error, line })?;
                Value::Int(n)
            }
            // Strings are only values inside `say`.
            ExprKind::String(_) => Value::Int(0),
            ExprKind::Name(name) => self.lower_name(name, line)?,
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.lower_expr(lhs)?;
                let rhs = self.lower_expr(rhs)?;
                let op = match op {
                    BinaryOperator::Add => BinaryOp::Add,
                    BinaryOperator::Sub => BinaryOp::Sub,
                    BinaryOperator::Mul => BinaryOp::Mul,
                    BinaryOperator::Div => BinaryOp::SDiv,
                };
                self.binary(op, lhs, rhs)
            }
            ExprKind::Call { callee, args } => {
                let Some(name) = callee.kind.as_name() else {
                    return Err(LowerError::InvalidCallee { line });
                };
                if name == PRINT_BUILTIN {
                    self.lower_say(args, line)?
                } else {
                    self.lower_call(name, args, line)?
                }
            }
        };
        Ok(value)
    }

    fn lower_name(&mut self, name: &str, line: usize) -> Result<Value> {
        if let Some(&slot) = self.slots.get(name) {
            return Ok(self.load(slot));
        }
        if self.cx.functions.contains_key(name) || self.cx.externs.get(name).is_some() {
            return Ok(Value::FuncAddr(name.into()));
        }
        Err(LowerError::UndefinedName {
            name: name.into(),
            line,
        })
    }

    fn lower_call(&mut self, name: &str, args: &'ast [Expr], line: usize) -> Result<Value> {
        let sig = match self.cx.functions.get(name) {
            Some(sig) if sig.params.len() != args.len() => {
                return Err(LowerError::ArityMismatch {
                    name: name.into(),
                    expected: sig.params.len(),
                    found: args.len(),
                    line,
                });
            }
            Some(sig) => sig.clone(),
            None => {
                let sig = Signature::integers(args.len(), true);
                self.cx.externs.declare(name, sig.clone(), line)?;
                sig
            }
        };

        let args = self.lower_args(args)?;
        let dst = sig.returns_value().then(|| self.builder.fresh_temp());
        self.builder.push(Inst::Call {
            dst,
            callee: name.into(),
            sig,
            args,
        });
        Ok(dst.map_or(Value::Int(0), Value::Temp))
    }

    /// `say(a, b, ...)` becomes `printf(template, a, b, ...)`, with `%s` for
    /// string literal arguments and `%lld` for everything else.
    fn lower_say(&mut self, args: &'ast [Expr], line: usize) -> Result<Value> {
        if self.cx.functions.contains_key(PRINT_PRIMITIVE) {
            return Err(LowerError::ReservedName {
                name: PRINT_PRIMITIVE.into(),
                line,
            });
        }
        self.cx
            .externs
            .declare(PRINT_PRIMITIVE, print_primitive_sig(), line)?;

        let mut specifiers = Vec::with_capacity(args.len());
        let mut values = Vec::with_capacity(args.len() + 1);
        for arg in args {
            if let ExprKind::String(s) = &arg.kind {
                specifiers.push("%s");
                values.push(self.cx.intern_string(s));
            } else {
                specifiers.push("%lld");
                values.push(self.lower_expr(arg)?);
            }
        }
        let template = specifiers.join(" ") + "\n";
        values.insert(0, self.cx.intern_string(&template));

        self.builder.push(Inst::Call {
            dst: None,
            callee: PRINT_PRIMITIVE.into(),
            sig: print_primitive_sig(),
            args: values,
        });
        Ok(Value::Int(0))
    }

    fn lower_args(&mut self, args: &'ast [Expr]) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.lower_expr(arg)).collect()
    }

    /// Evaluates `expr != 0`.
    fn lower_truthy(&mut self, expr: &'ast Expr) -> Result<Value> {
        let value = self.lower_expr(expr)?;
        Ok(self.cmp(CmpPred::Ne, value, Value::Int(0)))
    }

    fn terminate_with_default_return(&mut self) {
        let value = self.builder.sig().returns_value().then_some(Value::Int(0));
        self.builder.terminate(Terminator::Ret(value));
    }

    /// Allocates a fresh slot for `name`, replacing any earlier binding.
    fn bind(&mut self, name: &'ast str) -> SlotId {
        let slot = self.builder.alloc_slot(name);
        self.slots.insert(name, slot);
        slot
    }

    fn load(&mut self, slot: SlotId) -> Value {
        let dst = self.builder.fresh_temp();
        self.builder.push(Inst::Load { dst, slot });
        Value::Temp(dst)
    }

    fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Value {
        let dst = self.builder.fresh_temp();
        self.builder.push(Inst::Binary { dst, op, lhs, rhs });
        Value::Temp(dst)
    }

    fn cmp(&mut self, pred: CmpPred, lhs: Value, rhs: Value) -> Value {
        let dst = self.builder.fresh_temp();
        self.builder.push(Inst::Cmp {
            dst,
            pred,
            lhs,
            rhs,
        });
        Value::Temp(dst)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        compile,
        ir::{Inst, Terminator},
        util::test_utils::tree_tests,
    };

    #[test]
    fn both_branches_returning_leave_no_continuation() {
        let src = "fn pick(c) -> i64:\n    if c:\n        return 1\n    else:\n        return 2\n";
        let module = compile(src, "m").unwrap();
        let f = module.function("pick").unwrap();

        let labels: Vec<_> = f.blocks.iter().map(|b| b.label).collect();
        assert_eq!(labels, ["entry", "then", "else"]);
        for block in &f.blocks[1..] {
            assert!(matches!(block.term, Some(Terminator::Ret(Some(_)))));
            assert!(block.term.as_ref().unwrap().successors().is_empty());
        }
    }

    #[test]
    fn loop_bound_is_loaded_at_every_test() {
        let src = "fn f(n):\n    for i in 0..n:\n        n = n - 1\n";
        let module = compile(src, "m").unwrap();
        let f = module.function("f").unwrap();

        let cond = f.blocks.iter().find(|b| b.label == "for.cond").unwrap();
        let loaded: Vec<_> = cond
            .insts
            .iter()
            .filter_map(|inst| match inst {
                Inst::Load { slot, .. } => Some(&*f.slots[slot.0].name),
                _ => None,
            })
            .collect();
        assert_eq!(loaded, ["i", "n"]);
    }

    tree_tests!(
        use lower;

        fn test_sum_is_printed() {
            let program = "
                fn main():
                    let x = 5
                    let y = 7
                    say(x + y)
            ";
            let ir_ok = r#"
                ; ModuleID = 'test'
                source_filename = "test"

                @.str.0 = private unnamed_addr constant [6 x i8] c"%lld\0A\00"

                declare i32 @printf(ptr, ...)

                define void @main() {
                entry:
                  %x.addr0 = alloca i64
                  %y.addr1 = alloca i64
                  store i64 5, ptr %x.addr0
                  store i64 7, ptr %y.addr1
                  %t.0 = load i64, ptr %x.addr0
                  %t.1 = load i64, ptr %y.addr1
                  %t.2 = add i64 %t.0, %t.1
                  call i32 (ptr, ...) @printf(ptr @.str.0, i64 %t.2)
                  ret void
                }
            "#;
        }

        fn test_if_else_both_returning() {
            let program = "
                fn pick(c) -> i64:
                    if c:
                        return 1
                    else:
                        return 2
            ";
            let ir_ok = r#"
                ; ModuleID = 'test'
                source_filename = "test"

                define i64 @pick(i64 %c.arg) {
                entry:
                  %c.addr0 = alloca i64
                  store i64 %c.arg, ptr %c.addr0
                  %t.0 = load i64, ptr %c.addr0
                  %t.1 = icmp ne i64 %t.0, 0
                  br i1 %t.1, label %then.1, label %else.2

                then.1:
                  ret i64 1

                else.2:
                  ret i64 2
                }
            "#;
        }

        fn test_for_range() {
            let program = "
                fn count(n) -> i64:
                    var total = 0
                    for i in 0..n:
                        total = total + i
                    return total
            ";
            let ir_ok = r#"
                ; ModuleID = 'test'
                source_filename = "test"

                define i64 @count(i64 %n.arg) {
                entry:
                  %n.addr0 = alloca i64
                  %total.addr1 = alloca i64
                  %i.addr2 = alloca i64
                  store i64 %n.arg, ptr %n.addr0
                  store i64 0, ptr %total.addr1
                  store i64 0, ptr %i.addr2
                  br label %for.cond.1

                for.cond.1:
                  %t.0 = load i64, ptr %i.addr2
                  %t.1 = load i64, ptr %n.addr0
                  %t.2 = icmp slt i64 %t.0, %t.1
                  br i1 %t.2, label %for.body.2, label %for.end.4

                for.body.2:
                  %t.3 = load i64, ptr %total.addr1
                  %t.4 = load i64, ptr %i.addr2
                  %t.5 = add i64 %t.3, %t.4
                  store i64 %t.5, ptr %total.addr1
                  br label %for.inc.3

                for.inc.3:
                  %t.6 = load i64, ptr %i.addr2
                  %t.7 = add i64 %t.6, 1
                  store i64 %t.7, ptr %i.addr2
                  br label %for.cond.1

                for.end.4:
                  %t.8 = load i64, ptr %total.addr1
                  ret i64 %t.8
                }
            "#;
        }

        fn test_while_with_early_exit_and_dead_code() {
            let program = r#"
                fn countdown(n):
                    while n:
                        if n - 3:
                            n = n - 1
                        else:
                            return
                        say("tick")
                    return
                    say(n)
            "#;
            let ir_ok = r#"
                ; ModuleID = 'test'
                source_filename = "test"

                @.str.0 = private unnamed_addr constant [5 x i8] c"tick\00"
                @.str.1 = private unnamed_addr constant [4 x i8] c"%s\0A\00"
                @.str.2 = private unnamed_addr constant [6 x i8] c"%lld\0A\00"

                declare i32 @printf(ptr, ...)

                define void @countdown(i64 %n.arg) {
                entry:
                  %n.addr0 = alloca i64
                  store i64 %n.arg, ptr %n.addr0
                  br label %while.cond.1

                while.cond.1:
                  %t.0 = load i64, ptr %n.addr0
                  %t.1 = icmp ne i64 %t.0, 0
                  br i1 %t.1, label %while.body.2, label %while.end.3

                while.body.2:
                  %t.2 = load i64, ptr %n.addr0
                  %t.3 = sub i64 %t.2, 3
                  %t.4 = icmp ne i64 %t.3, 0
                  br i1 %t.4, label %then.4, label %else.5

                while.end.3:
                  ret void

                then.4:
                  %t.5 = load i64, ptr %n.addr0
                  %t.6 = sub i64 %t.5, 1
                  store i64 %t.6, ptr %n.addr0
                  br label %ifend.6

                else.5:
                  ret void

                ifend.6:
                  call i32 (ptr, ...) @printf(ptr @.str.1, ptr @.str.0)
                  br label %while.cond.1

                dead.7:
                  %t.7 = load i64, ptr %n.addr0
                  call i32 (ptr, ...) @printf(ptr @.str.2, i64 %t.7)
                  ret void
                }
            "#;
        }

        fn test_identical_templates_share_a_constant() {
            let program = r#"
                fn main():
                    say("hi")
                    say("hi")
            "#;
            let ir_ok = r#"
                ; ModuleID = 'test'
                source_filename = "test"

                @.str.0 = private unnamed_addr constant [3 x i8] c"hi\00"
                @.str.1 = private unnamed_addr constant [4 x i8] c"%s\0A\00"

                declare i32 @printf(ptr, ...)

                define void @main() {
                entry:
                  call i32 (ptr, ...) @printf(ptr @.str.1, ptr @.str.0)
                  call i32 (ptr, ...) @printf(ptr @.str.1, ptr @.str.0)
                  ret void
                }
            "#;
        }

        fn test_calls_externs_and_literals() {
            let program = r#"
                fn main():
                    let a = add(2e.b12, t0)
                    let b = ext(a, 3.9)
                    noop()
                    let f = add
                    say(a, b, "x", f)

                fn add(x, y) -> i64:
                    return x + y

                fn noop():
                    return
            "#;
            let ir_ok = r#"
                ; ModuleID = 'test'
                source_filename = "test"

                @.str.0 = private unnamed_addr constant [2 x i8] c"x\00"
                @.str.1 = private unnamed_addr constant [19 x i8] c"%lld %lld %s %lld\0A\00"

                declare i64 @ext(i64, i64)
                declare i32 @printf(ptr, ...)

                define void @main() {
                entry:
                  %a.addr0 = alloca i64
                  %b.addr1 = alloca i64
                  %f.addr2 = alloca i64
                  %t.0 = call i64 @add(i64 35, i64 120)
                  store i64 %t.0, ptr %a.addr0
                  %t.1 = load i64, ptr %a.addr0
                  %t.2 = call i64 @ext(i64 %t.1, i64 3)
                  store i64 %t.2, ptr %b.addr1
                  call void @noop()
                  store i64 ptrtoint (ptr @add to i64), ptr %f.addr2
                  %t.3 = load i64, ptr %a.addr0
                  %t.4 = load i64, ptr %b.addr1
                  %t.5 = load i64, ptr %f.addr2
                  call i32 (ptr, ...) @printf(ptr @.str.1, i64 %t.3, i64 %t.4, ptr @.str.0, i64 %t.5)
                  ret void
                }

                define i64 @add(i64 %x.arg, i64 %y.arg) {
                entry:
                  %x.addr0 = alloca i64
                  %y.addr1 = alloca i64
                  store i64 %x.arg, ptr %x.addr0
                  store i64 %y.arg, ptr %y.addr1
                  %t.0 = load i64, ptr %x.addr0
                  %t.1 = load i64, ptr %y.addr1
                  %t.2 = add i64 %t.0, %t.1
                  ret i64 %t.2
                }

                define void @noop() {
                entry:
                  ret void
                }
            "#;
        }

        fn test_default_returns_and_rebinding() {
            let program = r#"
                fn zero() -> i64:
                    return

                fn answer() -> number:
                    let x = 41
                    let x = x + 1
                    let s = "unused"
            "#;
            let ir_ok = r#"
                ; ModuleID = 'test'
                source_filename = "test"

                define i64 @zero() {
                entry:
                  ret i64 0
                }

                define void @answer() {
                entry:
                  %x.addr0 = alloca i64
                  %x.addr1 = alloca i64
                  %s.addr2 = alloca i64
                  store i64 41, ptr %x.addr0
                  %t.0 = load i64, ptr %x.addr0
                  %t.1 = add i64 %t.0, 1
                  store i64 %t.1, ptr %x.addr1
                  store i64 0, ptr %s.addr2
                  ret void
                }
            "#;
        }

        fn test_error_undefined_name() {
            let program = "
                fn main():
                    let x = y
            ";
            let expected_errors = &["2: undefined name `y`"];
        }

        fn test_error_assignment_to_undeclared() {
            let program = "
                fn main():
                    z = 1
            ";
            let expected_errors = &["2: assignment to undeclared variable `z`"];
        }

        fn test_error_duplicate_function() {
            let program = "
                fn a():
                    return
                fn a():
                    return
            ";
            let expected_errors = &["3: function `a` is defined more than once"];
        }

        fn test_error_arity_mismatch() {
            let program = "
                fn a(x):
                    return
                fn main():
                    a(1, 2)
            ";
            let expected_errors = &["4: function `a` takes 1 arguments, but 2 were given"];
        }

        fn test_error_conflicting_extern() {
            let program = "
                fn main():
                    ext(1)
                    ext(1, 2)
            ";
            let expected_errors =
                &["3: extern `ext` was first called with 1 arguments, but now with 2"];
        }

        fn test_error_print_primitive_is_reserved() {
            let program = "
                fn main():
                    printf(1)
                    say(1)
            ";
            let expected_errors = &["3: `printf` is reserved for the print builtin"];
        }

        fn test_error_return_value_from_void() {
            let program = "
                fn main():
                    return 1
            ";
            let expected_errors =
                &["2: function `main` does not return a value, declare it with `-> i64`"];
        }

        fn test_error_returning_a_value_needs_i64_annotation() {
            let program = "
                fn f(a, b):
                    return a + b
            ";
            let expected_errors =
                &["2: function `f` does not return a value, declare it with `-> i64`"];
        }

        fn test_error_duplicate_parameter() {
            let program = "
                fn f(a, b, a):
                    return
            ";
            let expected_errors = &["1: parameter `a` of `f` is declared more than once"];
        }

        fn test_parameter_named_like_the_entry_block() {
            let program = "
                fn f(entry) -> i64:
                    return entry
            ";
            let ir_ok = r#"
                ; ModuleID = 'test'
                source_filename = "test"

                define i64 @f(i64 %entry.arg) {
                entry:
                  %entry.addr0 = alloca i64
                  store i64 %entry.arg, ptr %entry.addr0
                  %t.0 = load i64, ptr %entry.addr0
                  ret i64 %t.0
                }
            "#;
        }

        fn test_error_literal_out_of_range() {
            let program = "
                fn main():
                    say(99999999999999999999)
            ";
            let expected_errors =
                &["2: integer literal `99999999999999999999` does not fit in 64 bits"];
        }
    );
}
