use crate::{emit_llvm_ir, parse_source, util::fmt::tree};

/// Each variant contains the input.
pub enum Test {
    Parser(&'static str),
    Lower(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

/// Runs the pipeline up to the stage under test, returning the printed
/// result (empty on failure) and the diagnostics.
#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    match test {
        Test::Parser(input) => match parse_source(input) {
            Ok(module) => (tree::print_module_string(&module), vec![]),
            Err(error) => (String::new(), vec![stage_message(&error)]),
        },
        Test::Lower(input) => match emit_llvm_ir(input, "test") {
            Ok(ir) => (ir, vec![]),
            Err(error) => (String::new(), vec![stage_message(&error)]),
        },
    }
}

/// The diagnostic without its stage prefix.
fn stage_message(error: &crate::Error) -> String {
    match error {
        crate::Error::Lex(e) => e.to_string(),
        crate::Error::Parse(e) => e.to_string(),
        crate::Error::Lower(e) => e.to_string(),
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_tree: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
        }
    }
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), ::indoc::indoc! { $source });
                let (formatted_actual_tree, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_tree, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, ir_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };

    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::Parser($source)
    };
    (@@get_test(lower, program), $source:expr) => {
        crate::util::test_utils::Test::Lower($source)
    };
}
pub(crate) use tree_tests;
