use pretty_assertions::assert_eq;

static HELLO: &str = include_str!("../demos/hello.sdr");
static LOOPS: &str = include_str!("../demos/loops.sdr");
static EXTERN_ADD: &str = include_str!("../demos/extern_add.sdr");

#[test]
fn hello_compiles() {
    let module = sdrc::compile(HELLO, "hello").expect("failed to compile");
    assert_eq!(module.functions.len(), 1);
    assert_eq!(&*module.externs[0].name, "printf");

    let strings: Vec<_> = module.strings.iter().map(|(_, s)| s).collect();
    assert_eq!(
        strings,
        [
            "Hail, Twelve!",
            "%s\n",
            "x (dec):",
            "%s %lld\n",
            "sum 0..9:",
            "nonzero",
            "zero",
        ]
    );
}

#[test]
fn hello_decodes_base12() {
    let ir = sdrc::emit_llvm_ir(HELLO, "hello").expect("failed to compile");
    assert!(ir.starts_with("; ModuleID = 'hello'\nsource_filename = \"hello\"\n"));
    assert!(ir.contains("store i64 34, ptr %x.addr0"));
    assert!(ir.contains("icmp slt i64"));
}

#[test]
fn loops_define_every_function() {
    let ir = sdrc::emit_llvm_ir(LOOPS, "loops").expect("failed to compile");
    for header in [
        "define i64 @fib(i64 %n.arg) {",
        "define i64 @fact(i64 %n.arg) {",
        "define void @main() {",
    ] {
        assert!(ir.contains(header), "missing {header:?} in:\n{ir}");
    }
    assert!(ir.contains("call i64 @fib(i64 11)"));
    assert!(ir.contains("call i64 @fact(i64 10)"));
    assert!(!ir.contains("declare i64 @fib"));
}

#[test]
fn unknown_callee_becomes_extern() {
    let module = sdrc::compile(EXTERN_ADD, "extern_add").expect("failed to compile");
    let externs: Vec<_> = module.externs.iter().map(|e| &*e.name).collect();
    assert_eq!(externs, ["add", "printf"]);

    let ir = sdrc::emit_llvm_ir(EXTERN_ADD, "extern_add").expect("failed to compile");
    assert!(ir.contains("declare i64 @add(i64, i64)\ndeclare i32 @printf(ptr, ...)\n"));
}

#[test]
fn every_function_block_is_terminated() {
    for src in [HELLO, LOOPS, EXTERN_ADD] {
        let module = sdrc::compile(src, "demo").expect("failed to compile");
        for function in &module.functions {
            assert!(function.blocks.iter().all(|b| b.term.is_some()));
        }
    }
}

#[test]
fn errors_carry_their_stage() {
    let err = sdrc::compile("fn main():\n  say(1)\n    say(2)\n", "bad").unwrap_err();
    assert!(matches!(err, sdrc::Error::Parse(_)), "{err}");
    assert_eq!(err.line(), 3);

    let err = sdrc::compile("fn main():\n\tsay(1)\n", "bad").unwrap_err();
    assert_eq!(err.to_string(), "lex error at 2:1: tab character in indentation");
}
