mod common;
use common::*;

#[test]
fn string_constant_builds_a_string() {
    assert_eq!(
        compile("class S { function void f() { do Output.printString(\"Hi\"); return; } }"),
        [
            "function S.f 0",
            "push constant 2",
            "call String.new 1",
            "push constant 72",
            "call String.appendChar 2",
            "push constant 105",
            "call String.appendChar 2",
            "call Output.printString 1",
            "pop temp 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn empty_string_constant_appends_nothing() {
    assert_eq!(
        compile("class S { function void f() { do Output.printString(\"\"); return; } }"),
        [
            "function S.f 0",
            "push constant 0",
            "call String.new 1",
            "call Output.printString 1",
            "pop temp 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn operators_bind_left_to_right_without_precedence() {
    assert_eq!(
        compile("class M { function int f() { return 1 + 2 * 3; } }"),
        [
            "function M.f 0",
            "push constant 1",
            "push constant 2",
            "add",
            "push constant 3",
            "call Math.multiply 2",
            "return",
        ]
    );
}

#[test]
fn division_follows_the_scan_order() {
    assert_eq!(
        compile("class M { function int f() { return 10 - 4 / 2; } }"),
        [
            "function M.f 0",
            "push constant 10",
            "push constant 4",
            "sub",
            "push constant 2",
            "call Math.divide 2",
            "return",
        ]
    );
}

#[test]
fn comparison_and_logic_operators() {
    assert_eq!(
        compile(
            "class M { function boolean f(int a, int b) {
                 return (a < b) | (a > b) & (a = b);
             } }"
        ),
        [
            "function M.f 0",
            "push argument 0",
            "push argument 1",
            "lt",
            "push argument 0",
            "push argument 1",
            "gt",
            "or",
            "push argument 0",
            "push argument 1",
            "eq",
            "and",
            "return",
        ]
    );
}

#[test]
fn largest_integer_constant_and_negation() {
    assert_eq!(
        compile("class M { function int f() { return -32767; } }"),
        [
            "function M.f 0",
            "push constant 32767",
            "neg",
            "return",
        ]
    );
}

#[test]
fn method_call_on_a_field() {
    assert_eq!(
        compile("class C { field Point p; method void m() { do p.draw(1, 2); return; } }"),
        [
            "function C.m 0",
            "push argument 0",
            "pop pointer 0",
            "push this 0",
            "push constant 1",
            "push constant 2",
            "call Point.draw 3",
            "pop temp 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn bare_call_targets_the_current_object() {
    assert_eq!(
        compile(
            "class C { method void m() { do draw(); return; }
               method void draw() { return; } }"
        ),
        [
            "function C.m 0",
            "push argument 0",
            "pop pointer 0",
            "push pointer 0",
            "call C.draw 1",
            "pop temp 0",
            "push constant 0",
            "return",
            "function C.draw 0",
            "push argument 0",
            "pop pointer 0",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn call_arguments_are_full_expressions() {
    assert_eq!(
        compile("class M { function int f() { return Math.max(1 + 2, 3 * 4); } }"),
        [
            "function M.f 0",
            "push constant 1",
            "push constant 2",
            "add",
            "push constant 3",
            "push constant 4",
            "call Math.multiply 2",
            "call Math.max 2",
            "return",
        ]
    );
}

#[test]
fn this_term_pushes_the_receiver() {
    assert_eq!(
        compile("class C { method C id() { return this; } }"),
        [
            "function C.id 0",
            "push argument 0",
            "pop pointer 0",
            "push pointer 0",
            "return",
        ]
    );
}
