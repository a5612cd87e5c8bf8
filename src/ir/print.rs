//! Renders an IR [`Module`] as LLVM assembly (opaque-pointer dialect).
//!
//! Parameters print as `%NAME.arg`, slots as `%NAME.addrN` and temporaries
//! as `%t.N`; none of them can collide with a block label.

use std::io::{self, Write};

use super::{
    BinaryOp, Block, BlockId, CmpPred, Function, Inst, Module, Signature, Terminator, Ty, Value,
};

const INDENT: &str = "  ";

pub fn print_module_string(module: &Module) -> String {
    let mut buf = Vec::with_capacity(4096);
    print_module(&mut buf, module).expect("writing to a Vec never fails");
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn print_module(w: &mut impl Write, module: &Module) -> io::Result<()> {
    write!(w, "; ModuleID = '")?;
    write_escaped(w, module.name.as_bytes())?;
    write!(w, "'\nsource_filename = \"")?;
    write_escaped(w, module.name.as_bytes())?;
    writeln!(w, "\"")?;

    if !module.strings.is_empty() {
        writeln!(w)?;
        for (handle, value) in module.strings.iter() {
            let len = value.len() + 1;
            write!(
                w,
                "@.str.{} = private unnamed_addr constant [{len} x i8] c\"",
                handle.index()
            )?;
            write_escaped(w, value.as_bytes())?;
            writeln!(w, "\\00\"")?;
        }
    }

    if !module.externs.is_empty() {
        writeln!(w)?;
        for ext in &module.externs {
            write!(w, "declare {} @{}(", ty(ext.sig.ret), ext.name)?;
            write_param_types(w, &ext.sig)?;
            writeln!(w, ")")?;
        }
    }

    for function in &module.functions {
        writeln!(w)?;
        print_function(w, function)?;
    }
    Ok(())
}

fn print_function(w: &mut impl Write, f: &Function) -> io::Result<()> {
    write!(w, "define {} @{}(", ty(f.sig.ret), f.name)?;
    for (idx, (name, param_ty)) in f.params.iter().zip(&f.sig.params).enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{} %{name}.arg", ty(*param_ty))?;
    }
    writeln!(w, ") {{")?;

    for (idx, block) in f.blocks.iter().enumerate() {
        if idx > 0 {
            writeln!(w)?;
        }
        writeln!(w, "{}:", label(f, BlockId(idx)))?;
        if idx == 0 {
            for (slot, s) in f.slots.iter().enumerate() {
                writeln!(w, "{INDENT}%{}.addr{slot} = alloca i64", s.name)?;
            }
        }
        print_block(w, f, block)?;
    }

    writeln!(w, "}}")
}

fn print_block(w: &mut impl Write, f: &Function, block: &Block) -> io::Result<()> {
    for inst in &block.insts {
        write!(w, "{INDENT}")?;
        print_inst(w, f, inst)?;
        writeln!(w)?;
    }
    if let Some(term) = &block.term {
        write!(w, "{INDENT}")?;
        print_terminator(w, f, term)?;
        writeln!(w)?;
    }
    Ok(())
}

fn print_inst(w: &mut impl Write, f: &Function, inst: &Inst) -> io::Result<()> {
    match inst {
        Inst::Load { dst, slot } => {
            let name = &f.slots[slot.0].name;
            write!(w, "%t.{} = load i64, ptr %{name}.addr{}", dst.0, slot.0)
        }
        Inst::Store { slot, value } => {
            let name = &f.slots[slot.0].name;
            write!(w, "store i64 {}, ptr %{name}.addr{}", val(f, value), slot.0)
        }
        Inst::Binary { dst, op, lhs, rhs } => {
            let op = match op {
                BinaryOp::Add => "add",
                BinaryOp::Sub => "sub",
                BinaryOp::Mul => "mul",
                BinaryOp::SDiv => "sdiv",
            };
            let (lhs, rhs) = (val(f, lhs), val(f, rhs));
            write!(w, "%t.{} = {op} i64 {lhs}, {rhs}", dst.0)
        }
        Inst::Cmp {
            dst,
            pred,
            lhs,
            rhs,
        } => {
            let pred = match pred {
                CmpPred::Ne => "ne",
                CmpPred::Slt => "slt",
            };
            let (lhs, rhs) = (val(f, lhs), val(f, rhs));
            write!(w, "%t.{} = icmp {pred} i64 {lhs}, {rhs}", dst.0)
        }
        Inst::Call {
            dst,
            callee,
            sig,
            args,
        } => {
            if let Some(dst) = dst {
                write!(w, "%t.{} = ", dst.0)?;
            }
            write!(w, "call {}", ty(sig.ret))?;
            if sig.variadic {
                write!(w, " (")?;
                write_param_types(w, sig)?;
                write!(w, ")")?;
            }
            write!(w, " @{callee}(")?;
            for (idx, arg) in args.iter().enumerate() {
                if idx > 0 {
                    write!(w, ", ")?;
                }
                let arg_ty = sig.params.get(idx).copied().unwrap_or(match arg {
                    Value::Str(_) => Ty::Ptr,
                    _ => Ty::I64,
                });
                write!(w, "{} {}", ty(arg_ty), val(f, arg))?;
            }
            write!(w, ")")
        }
    }
}

fn print_terminator(w: &mut impl Write, f: &Function, term: &Terminator) -> io::Result<()> {
    match term {
        Terminator::Br(target) => write!(w, "br label %{}", label(f, *target)),
        Terminator::CondBr {
            cond,
            then_block,
            else_block,
        } => write!(
            w,
            "br i1 {}, label %{}, label %{}",
            val(f, cond),
            label(f, *then_block),
            label(f, *else_block),
        ),
        Terminator::Ret(Some(value)) => write!(w, "ret i64 {}", val(f, value)),
        Terminator::Ret(None) => write!(w, "ret void"),
    }
}

fn write_param_types(w: &mut impl Write, sig: &Signature) -> io::Result<()> {
    for (idx, param) in sig.params.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{}", ty(*param))?;
    }
    if sig.variadic {
        if sig.params.is_empty() {
            write!(w, "...")?;
        } else {
            write!(w, ", ...")?;
        }
    }
    Ok(())
}

/// Printable ASCII goes through as is; everything else, plus `"` and `\`,
/// becomes a `\XX` hex escape.
fn write_escaped(w: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    for &b in bytes {
        let plain = b == b' ' || (b.is_ascii_graphic() && b != b'"' && b != b'\\');
        if plain {
            w.write_all(&[b])?;
        } else {
            write!(w, "\\{b:02X}")?;
        }
    }
    Ok(())
}

fn label(f: &Function, block: BlockId) -> String {
    match block.0 {
        0 => "entry".to_owned(),
        n => format!("{}.{n}", f.block(block).label),
    }
}

fn val(f: &Function, value: &Value) -> String {
    match value {
        Value::Int(n) => n.to_string(),
        Value::Temp(t) => format!("%t.{}", t.0),
        Value::Param(n) => format!("%{}.arg", f.params[*n]),
        Value::Str(handle) => format!("@.str.{}", handle.index()),
        Value::FuncAddr(name) => format!("ptrtoint (ptr @{name} to i64)"),
    }
}

fn ty(ty: Ty) -> &'static str {
    match ty {
        Ty::Void => "void",
        Ty::I32 => "i32",
        Ty::I64 => "i64",
        Ty::Ptr => "ptr",
    }
}
