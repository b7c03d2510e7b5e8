use super::*;
use expect_test::{Expect, expect};

fn check(input: &str, expect: Expect) {
    let mut lexer = Lexer::new(input);
    let result = lexer.tokenize();
    let output = match result {
        Ok(tokens) => {
            let mut lines = Vec::new();
            for token in &tokens {
                lines.push(format!(
                    "{:?} @ {}:{} [{}-{}]",
                    token.kind,
                    token.span.line,
                    token.span.column,
                    token.span.start,
                    token.span.end
                ));
            }
            lines.join("\n")
        }
        Err(e) => format!("Error: {} at {}:{}", e.message, e.line, e.column),
    };
    expect.assert_eq(&output);
}

#[test]
fn lex_numeric_literals() {
    check(
        "1 -2 3-4 1.5",
        expect![[r#"
            Integer(1) @ 1:1 [0-1]
            Integer(-2) @ 1:3 [2-4]
            Integer(3) @ 1:6 [5-6]
            Operator("-") @ 1:7 [6-7]
            Integer(4) @ 1:8 [7-8]
            Decimal(1.5) @ 1:10 [9-12]
            Eof @ 1:13 [12-12]"#]],
    );
}

#[test]
fn lex_string_and_character_literals() {
    check(
        r#""a\"b" 'x"#,
        expect![[r#"
            String("a\"b") @ 1:1 [0-6]
            Character('x') @ 1:8 [7-9]
            Eof @ 1:10 [9-9]"#]],
    );
}

#[test]
fn lex_two_character_operators_first() {
    check(
        r"S/N/e&\;@",
        expect![[r#"
            Operator("S/") @ 1:1 [0-2]
            Operator("N/") @ 1:3 [2-4]
            Operator("e&") @ 1:5 [4-6]
            Operator("\\") @ 1:7 [6-7]
            Operator(";") @ 1:8 [7-8]
            Operator("@") @ 1:9 [8-9]
            Eof @ 1:10 [9-9]"#]],
    );
}

#[test]
fn lex_variables_and_assignment() {
    check(
        "5:A;A B",
        expect![[r#"
            Integer(5) @ 1:1 [0-1]
            Assign('A') @ 1:2 [1-3]
            Operator(";") @ 1:4 [3-4]
            Variable('A') @ 1:5 [4-5]
            Variable('B') @ 1:7 [6-7]
            Eof @ 1:8 [7-7]"#]],
    );
}

#[test]
fn lex_arrays_and_blocks() {
    check(
        "[3 1 2]{<}$",
        expect![[r#"
            OpenBracket @ 1:1 [0-1]
            Integer(3) @ 1:2 [1-2]
            Integer(1) @ 1:4 [3-4]
            Integer(2) @ 1:6 [5-6]
            CloseBracket @ 1:7 [6-7]
            Block("<") @ 1:8 [7-10]
            Operator("$") @ 1:11 [10-11]
            Eof @ 1:12 [11-11]"#]],
    );
}

#[test]
fn lex_block_ignores_braces_in_literals() {
    check(
        r#"{"}" {'{}}"#,
        expect![[r#"
            Block("\"}\" {'{}") @ 1:1 [0-10]
            Eof @ 1:11 [10-10]"#]],
    );
}

#[test]
fn lex_multiline() {
    check(
        "1\n2 +",
        expect![[r#"
            Integer(1) @ 1:1 [0-1]
            Integer(2) @ 2:1 [2-3]
            Operator("+") @ 2:3 [4-5]
            Eof @ 2:4 [5-5]"#]],
    );
}

#[test]
fn lex_error_unmatched_brace() {
    check("1 }", expect![[r#"Error: Unmatched '}' at 1:3"#]]);
}

#[test]
fn lex_error_unclosed_bracket() {
    check("[1", expect![[r#"Error: Unclosed '[' at 1:3"#]]);
}

#[test]
fn lex_error_unmatched_bracket() {
    check("1]", expect![[r#"Error: Unmatched ']' at 1:2"#]]);
}

#[test]
fn lex_error_inside_block_points_into_body() {
    check("{1 x}", expect![[r#"Error: Unexpected character: 'x' at 1:4"#]]);
}

#[test]
fn lex_error_unterminated_string() {
    check(r#""abc"#, expect![[r#"Error: Unterminated string literal at 1:1"#]]);
}

#[test]
fn lex_error_unterminated_block() {
    check("{1", expect![[r#"Error: Unterminated block at 1:1"#]]);
}

#[test]
fn lex_error_assignment_needs_variable() {
    check(
        ":a",
        expect![[r#"Error: Expected a variable name (A-Z) after ':' at 1:1"#]],
    );
}

#[test]
fn lex_empty_source() {
    check("", expect![[r#"Eof @ 1:1 [0-0]"#]]);
}

#[test]
fn lex_block_body_at_offset() {
    let tokens = Lexer::at("1 +", 3, 5).tokenize().unwrap();
    let positions: Vec<(u32, u32)> = tokens
        .iter()
        .map(|t| (t.span.line, t.span.column))
        .collect();
    assert_eq!(positions, vec![(3, 5), (3, 7), (3, 8)]);
}
