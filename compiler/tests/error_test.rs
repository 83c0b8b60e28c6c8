mod common;
use common::*;

use jackc::compiler::CompileError;
use jackc::token::TokenKind;

#[test]
fn output_depends_only_on_the_source_text() {
    let source = "class M { static int a, b;
        function void f(int p) { let a = p * b; return; } }";
    assert_eq!(compile(source), compile(source));
}

#[test]
fn truncated_class_reports_end_of_input() {
    match compile_err("class M { function void f() { return; }") {
        CompileError::UnexpectedToken { expected, found } => {
            assert_eq!(expected, "'}'");
            assert_eq!(found.kind, TokenKind::Eof);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn unterminated_block_comment_truncates_the_stream() {
    match compile_err("class M { /* never closed") {
        CompileError::UnexpectedToken { found, .. } => {
            assert_eq!(found.kind, TokenKind::Eof);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn misplaced_keyword_is_a_structural_error() {
    match compile_err("class M { return; }") {
        CompileError::UnexpectedToken { expected, found } => {
            assert_eq!(expected, "a class member declaration");
            assert_eq!(found.kind, TokenKind::Keyword(jackc::token::Keyword::Return));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn oversized_integer_constant_is_a_lexical_error() {
    assert!(matches!(
        compile_err("class M { function void f() { return 40000; } }"),
        CompileError::Lexer(_)
    ));
}

#[test]
fn unknown_variable_in_a_let_statement() {
    match compile_err("class M { function void f() { let x = 1; return; } }") {
        CompileError::UndefinedVariable { name, .. } => assert_eq!(name, "x"),
        other => panic!("unexpected error {:?}", other),
    }
}
