use monkey::lexer::Lexer;
use monkey::token::TokenKind;

#[test]
fn next_token_covers_every_kind() {
    let input = r#"let five = 5;
let ten = 10;

let add = fn(x, y) {
  x + y;
};

let result = add(five, ten);
!-/*5;
5 < 10 > 5;

if (5 < 10) {
	return true;
} else {
	return false;
}

10 == 10;
10 != 9;
"foobar"
"foo bar"
[1, 2];
{"foo": "bar"}
"#;

    let expected: &[(TokenKind, &str)] = &[
        (TokenKind::Let, "let"),
        (TokenKind::Ident, "five"),
        (TokenKind::Assign, "="),
        (TokenKind::Int, "5"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::Let, "let"),
        (TokenKind::Ident, "ten"),
        (TokenKind::Assign, "="),
        (TokenKind::Int, "10"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::Let, "let"),
        (TokenKind::Ident, "add"),
        (TokenKind::Assign, "="),
        (TokenKind::Function, "fn"),
        (TokenKind::Lparen, "("),
        (TokenKind::Ident, "x"),
        (TokenKind::Comma, ","),
        (TokenKind::Ident, "y"),
        (TokenKind::Rparen, ")"),
        (TokenKind::Lbrace, "{"),
        (TokenKind::Ident, "x"),
        (TokenKind::Plus, "+"),
        (TokenKind::Ident, "y"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::Rbrace, "}"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::Let, "let"),
        (TokenKind::Ident, "result"),
        (TokenKind::Assign, "="),
        (TokenKind::Ident, "add"),
        (TokenKind::Lparen, "("),
        (TokenKind::Ident, "five"),
        (TokenKind::Comma, ","),
        (TokenKind::Ident, "ten"),
        (TokenKind::Rparen, ")"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::Bang, "!"),
        (TokenKind::Minus, "-"),
        (TokenKind::Slash, "/"),
        (TokenKind::Asterisk, "*"),
        (TokenKind::Int, "5"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::Int, "5"),
        (TokenKind::Lt, "<"),
        (TokenKind::Int, "10"),
        (TokenKind::Gt, ">"),
        (TokenKind::Int, "5"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::If, "if"),
        (TokenKind::Lparen, "("),
        (TokenKind::Int, "5"),
        (TokenKind::Lt, "<"),
        (TokenKind::Int, "10"),
        (TokenKind::Rparen, ")"),
        (TokenKind::Lbrace, "{"),
        (TokenKind::Return, "return"),
        (TokenKind::True, "true"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::Rbrace, "}"),
        (TokenKind::Else, "else"),
        (TokenKind::Lbrace, "{"),
        (TokenKind::Return, "return"),
        (TokenKind::False, "false"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::Rbrace, "}"),
        (TokenKind::Int, "10"),
        (TokenKind::Eq, "=="),
        (TokenKind::Int, "10"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::Int, "10"),
        (TokenKind::NotEq, "!="),
        (TokenKind::Int, "9"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::Str, "foobar"),
        (TokenKind::Str, "foo bar"),
        (TokenKind::Lbracket, "["),
        (TokenKind::Int, "1"),
        (TokenKind::Comma, ","),
        (TokenKind::Int, "2"),
        (TokenKind::Rbracket, "]"),
        (TokenKind::Semicolon, ";"),
        (TokenKind::Lbrace, "{"),
        (TokenKind::Str, "foo"),
        (TokenKind::Colon, ":"),
        (TokenKind::Str, "bar"),
        (TokenKind::Rbrace, "}"),
        (TokenKind::Eof, ""),
    ];

    let mut lexer = Lexer::new(input);
    for (i, (kind, literal)) in expected.iter().enumerate() {
        let token = lexer.next_token();
        assert_eq!(token.kind, *kind, "test {}: wrong kind", i);
        assert_eq!(token.literal, *literal, "test {}: wrong literal", i);
    }
}

#[test]
fn unrecognized_characters_are_illegal() {
    let mut lexer = Lexer::new("let a = 1 @ 2;");
    let mut kinds = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.kind == TokenKind::Eof {
            break;
        }
        kinds.push((token.kind, token.literal));
    }
    assert!(kinds.contains(&(TokenKind::Illegal, "@".to_string())));
}

#[test]
fn unterminated_string_takes_rest_of_input() {
    let mut lexer = Lexer::new("\"abc");
    let token = lexer.next_token();
    assert_eq!(token.kind, TokenKind::Str);
    assert_eq!(token.literal, "abc");
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}

#[test]
fn eof_repeats() {
    let mut lexer = Lexer::new("");
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}
