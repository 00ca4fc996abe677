use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::space0,
    combinator::{map, value},
    IResult,
    Parser,
};

/// Characters that end a word.
pub const DELIMITERS: &str = " \t&><;|\n";

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operator {
    /// `<`
    Input,
    /// `>`
    Output,
    /// `|`
    Pipe,
    /// `||`
    Or,
    /// `&`
    Background,
    /// `&&`
    And,
    /// `;`
    Semi,
    /// `\n`
    Newline,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token<'a> {
    Word(&'a str),
    Op(Operator),
}

// ── Low-level nom parsers ──────────────────────────────────────────────────

fn parse_operator(input: &str) -> IResult<&str, Operator> {
    // Two-character operators must come before single-character ones.
    alt((
        value(Operator::And, tag("&&")),
        value(Operator::Or, tag("||")),
        value(Operator::Background, tag("&")),
        value(Operator::Pipe, tag("|")),
        value(Operator::Semi, tag(";")),
        value(Operator::Input, tag("<")),
        value(Operator::Output, tag(">")),
        value(Operator::Newline, tag("\n")),
    ))
    .parse(input)
}

fn parse_word(input: &str) -> IResult<&str, &str> {
    is_not(DELIMITERS).parse(input)
}

fn parse_token(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = space0(input)?;
    alt((map(parse_operator, Token::Op), map(parse_word, Token::Word))).parse(input)
}

/// Split a line into words and operators, left to right.
///
/// Every character is either blank, part of an operator or part of a word, so
/// the scan only stops once the input is exhausted.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = line;
    while let Ok((after, token)) = parse_token(rest) {
        tokens.push(token);
        rest = after;
    }
    tokens
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_split_on_blanks() {
        assert_eq!(
            tokenize("  ls\t-la   /tmp "),
            vec![Token::Word("ls"), Token::Word("-la"), Token::Word("/tmp")]
        );
    }

    #[test]
    fn test_operators_end_words_without_blanks() {
        use Operator::*;
        assert_eq!(
            tokenize("a&&b||c|d&e;f<g>h"),
            vec![
                Token::Word("a"),
                Token::Op(And),
                Token::Word("b"),
                Token::Op(Or),
                Token::Word("c"),
                Token::Op(Pipe),
                Token::Word("d"),
                Token::Op(Background),
                Token::Word("e"),
                Token::Op(Semi),
                Token::Word("f"),
                Token::Op(Input),
                Token::Word("g"),
                Token::Op(Output),
                Token::Word("h"),
            ]
        );
    }

    #[test]
    fn test_separated_pipes_are_two_pipes() {
        assert_eq!(
            tokenize("a | | b"),
            vec![
                Token::Word("a"),
                Token::Op(Operator::Pipe),
                Token::Op(Operator::Pipe),
                Token::Word("b"),
            ]
        );
    }

    #[test]
    fn test_newline_is_an_operator() {
        assert_eq!(
            tokenize("echo hi\n"),
            vec![Token::Word("echo"), Token::Word("hi"), Token::Op(Operator::Newline)]
        );
    }

    #[test]
    fn test_non_delimiters_stay_in_words() {
        assert_eq!(
            tokenize("echo a#b \"q\" $HOME"),
            vec![
                Token::Word("echo"),
                Token::Word("a#b"),
                Token::Word("\"q\""),
                Token::Word("$HOME"),
            ]
        );
    }

    #[test]
    fn test_empty_and_blank_lines() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t ").is_empty());
    }
}
