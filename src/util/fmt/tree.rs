use std::io::Write;

use crate::ast::*;

const INDENT_WIDTH: usize = 2;

pub fn print_module_string(module: &Module) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_module(&mut buf, module).expect("writing to a Vec never fails");
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn print_module(w: &mut impl Write, module: &Module) -> std::io::Result<()> {
    if let Some(package) = &module.package {
        writeln!(w, "package {package}")?;
    }
    for import in &module.imports {
        writeln!(w, "use {import}")?;
    }
    for function in &module.functions {
        print_function(w, 0, function)?;
    }
    Ok(())
}

fn print_function(w: &mut impl Write, i: usize, function: &Function) -> std::io::Result<()> {
    sp(w, i)?;
    write!(w, "fn {}(", function.name)?;
    for (idx, param) in function.params.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{}", param.name)?;
        print_annotation(w, param.ty.as_ref())?;
    }
    write!(w, ")")?;
    if let Some(return_ty) = &function.return_ty {
        write!(w, " -> {}", return_ty.name())?;
    }
    writeln!(w, " @{}", function.line)?;
    print_block(w, i + 1, &function.body)
}

fn print_block(w: &mut impl Write, i: usize, body: &[Stmt]) -> std::io::Result<()> {
    for stmt in body {
        print_stmt(w, i, stmt)?;
    }
    Ok(())
}

fn print_labeled_block(
    w: &mut impl Write,
    i: usize,
    label: &str,
    body: &[Stmt],
) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "{label}")?;
    print_block(w, i + 1, body)
}

pub fn print_stmt(w: &mut impl Write, i: usize, stmt: &Stmt) -> std::io::Result<()> {
    let line = stmt.line;
    match &stmt.kind {
        StmtKind::Binding(Binding {
            keyword,
            name,
            ty,
            initializer,
        }) => {
            sp(w, i)?;
            write!(w, "{} {name}", keyword.as_str())?;
            print_annotation(w, ty.as_ref())?;
            writeln!(w, " @{line}")?;
            print_expr(w, i + 1, initializer)?;
        }
        StmtKind::Assignment { target, value } => {
            sp(w, i)?;
            writeln!(w, "assign {target} @{line}")?;
            print_expr(w, i + 1, value)?;
        }
        StmtKind::Return(value) => {
            sp(w, i)?;
            writeln!(w, "return @{line}")?;
            if let Some(value) = value {
                print_expr(w, i + 1, value)?;
            }
        }
        StmtKind::Expr(expr) => print_expr(w, i, expr)?,
        StmtKind::If {
            predicate,
            then_body,
            else_body,
        } => {
            sp(w, i)?;
            writeln!(w, "if @{line}")?;
            print_expr(w, i + 1, predicate)?;
            print_labeled_block(w, i + 1, "then", then_body)?;
            if !else_body.is_empty() {
                print_labeled_block(w, i + 1, "else", else_body)?;
            }
        }
        StmtKind::While { predicate, body } => {
            sp(w, i)?;
            writeln!(w, "while @{line}")?;
            print_expr(w, i + 1, predicate)?;
            print_labeled_block(w, i + 1, "body", body)?;
        }
        StmtKind::ForRange {
            var,
            start,
            end,
            body,
        } => {
            sp(w, i)?;
            writeln!(w, "for {var} @{line}")?;
            print_expr(w, i + 1, start)?;
            print_expr(w, i + 1, end)?;
            print_labeled_block(w, i + 1, "body", body)?;
        }
    }
    Ok(())
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> std::io::Result<()> {
    sp(w, i)?;
    let line = expr.line;
    match &expr.kind {
        ExprKind::Int(lexeme) => writeln!(w, "int {lexeme} @{line}")?,
        ExprKind::Float(lexeme) => writeln!(w, "float {lexeme} @{line}")?,
        ExprKind::String(value) => writeln!(w, "string {value:?} @{line}")?,
        ExprKind::Name(name) => writeln!(w, "name {name} @{line}")?,
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} @{line}")?;
            print_expr(w, i + 1, lhs)?;
            print_expr(w, i + 1, rhs)?;
        }
        ExprKind::Call { callee, args } => {
            if let Some(name) = callee.kind.as_name() {
                writeln!(w, "call {name} @{line}")?;
            } else {
                writeln!(w, "call @{line}")?;
                print_expr(w, i + 1, callee)?;
            }
            if !args.is_empty() {
                sp(w, i + 1)?;
                writeln!(w, "arguments")?;
                for arg in args {
                    print_expr(w, i + 2, arg)?;
                }
            }
        }
    }
    Ok(())
}

fn print_annotation(w: &mut impl Write, ty: Option<&TypeName>) -> std::io::Result<()> {
    match ty {
        Some(ty) => write!(w, ": {}", ty.name()),
        None => Ok(()),
    }
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
