#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
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
    fn test_scanner_02_operators_and_conditional() {
        assert_token_sequence(
            "a >= b ? !c : d != e",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::QUESTION, "?"),
                (TokenType::BANG, "!"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::COLON, ":"),
                (TokenType::IDENTIFIER, "d"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::IDENTIFIER, "e"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_loop_keywords() {
        assert_token_sequence(
            "while (true) { break; continue; }",
            &[
                (TokenType::WHILE, "while"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::TRUE, "true"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::BREAK, "break"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::CONTINUE, "continue"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_literals_carry_values() {
        let tokens = Scanner::new(br#"12.5 "hi" 7"#).scan_all().unwrap();

        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 12.5));
        assert!(matches!(&tokens[1].token_type, TokenType::STRING(s) if s == "hi"));
        assert_eq!(tokens[1].lexeme, "\"hi\"");
        assert_eq!(tokens[2].to_string(), "NUMBER 7 7.0");
        assert_eq!(tokens[1].to_string(), "STRING \"hi\" hi");
        assert_eq!(tokens[3].to_string(), "EOF  null");
    }

    #[test]
    fn test_scanner_05_line_comment_skipped() {
        assert_token_sequence(
            "a // ignored ( ) {\nb",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_06_block_comment_ends_at_first_close() {
        let tokens = Scanner::new(b"a /* one * two\n three **/ b /* x */ */")
            .filter_map(Result::ok)
            .collect::<Vec<_>>();

        let kinds: Vec<&str> = tokens.iter().map(|t| t.token_type.name()).collect();

        // The trailing "*/" is not part of any comment.
        assert_eq!(
            kinds,
            vec!["IDENTIFIER", "IDENTIFIER", "STAR", "SLASH", "EOF"]
        );
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scanner_07_unterminated_block_comment() {
        let results: Vec<_> = Scanner::new(b"a /* never\nclosed").collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(LoxError::Lex { message, line }) => {
                assert_eq!(message, "Unterminated block comment.");
                assert_eq!(*line, 2);
            }
            other => panic!("expected lex error, got {:?}", other),
        }
        assert!(matches!(&results[2], Ok(t) if t.token_type == TokenType::EOF));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source.as_bytes()).collect();

        // COMMA, DOT, error('$'), LEFT_PAREN, error('#'), EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

        fn assert_token_matches(
            result: &Result<Token<'_>, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(token.token_type, expected_type);
                    assert_eq!(token.lexeme, expected_lexeme);
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_scan_all_reports_every_error() {
        let err = Scanner::new(b"@ \"open").scan_all().unwrap_err();

        assert!(err.is_static());
        let diagnostics: Vec<String> = err.diagnostics().iter().map(|e| e.to_string()).collect();
        assert_eq!(
            diagnostics,
            vec![
                "[line 1] Error: Unexpected character: @",
                "[line 1] Error: Unterminated string.",
            ]
        );
    }
}
