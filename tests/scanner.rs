#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn rendered(source: &str) -> Vec<String> {
        Scanner::new(source)
            .map(|r| match r {
                Ok(token) => token.to_string(),
                Err(e) => e.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >=",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "class breaker break fun _x1 orchid or",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "breaker"),
                (TokenType::BREAK, "break"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "_x1"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::OR, "or"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_literal_display() {
        assert_eq!(
            rendered("42 3.14 \"hi there\" nil"),
            vec![
                "NUMBER 42 42.0",
                "NUMBER 3.14 3.14",
                "STRING \"hi there\" hi there",
                "NIL nil null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_scanner_05_trailing_dot_is_separate() {
        assert_token_sequence(
            "1.",
            &[
                (TokenType::NUMBER(1.0), "1"),
                (TokenType::DOT, "."),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_06_comments_and_lines() {
        let source = "// line comment\n/* block\n comment */ a\n\"multi\nline\" b";
        let tokens: Vec<_> = Scanner::new(source).filter_map(Result::ok).collect();

        let lines: Vec<(&str, usize)> = tokens.iter().map(|t| (t.lexeme, t.line)).collect();

        assert_eq!(
            lines,
            vec![("a", 3), ("\"multi\nline\"", 5), ("b", 5), ("", 5)]
        );
    }

    #[test]
    fn test_scanner_07_unterminated_block_comment_runs_to_end() {
        assert_token_sequence("a /* never closed", &[(TokenType::IDENTIFIER, "a"), (TokenType::EOF, "")]);
    }

    #[test]
    fn test_scanner_08_unterminated_string() {
        assert_eq!(
            rendered("x\n\"abc\ndef"),
            vec![
                "IDENTIFIER x null",
                "[line 2] Error: Unterminated string.",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_scanner_09_exactly_one_eof() {
        let mut scanner = Scanner::new("");

        assert!(matches!(
            scanner.next(),
            Some(Ok(Token {
                token_type: TokenType::EOF,
                ..
            }))
        ));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        // Collect all results (both tokens and errors)
        let results: Vec<_> = scanner.collect();

        // We expect this sequence:
        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        // Check valid tokens
        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

        // Helper function
        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_non_ascii_outside_string_is_one_error() {
        let results: Vec<_> = Scanner::new("é \"é\"").collect();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap_err().to_string(),
            "[line 1] Error: Unexpected character: é"
        );
        assert_eq!(results[1].as_ref().unwrap().to_string(), "STRING \"é\" é");
    }

    #[test]
    fn test_tokens_serialize_to_json() {
        let tokens: Vec<_> = Scanner::new("print 1;").filter_map(Result::ok).collect();
        let json = serde_json::to_value(&tokens).unwrap();

        assert_eq!(json[0]["token_type"], "PRINT");
        assert_eq!(json[0]["lexeme"], "print");
        assert_eq!(json[1]["token_type"]["NUMBER"], 1.0);
        assert_eq!(json[3]["line"], 1);
    }
}
