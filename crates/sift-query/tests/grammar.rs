//! Integration tests for sift-query.
//!
//! Exercises the public surface end to end: lexer -> parser -> tree, with and without a
//! schema.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use sift_query::{
    DriverState, FieldMask, NodeKind, ParseErrorKind, Parser, ParserOptions, QueryNode, Schema,
    TokenKind, UnknownFieldPolicy, parse, parse_with, tokenize,
};

fn schema() -> Schema {
    Schema::from_fields(["title", "body", "tags"]).unwrap()
}

fn strict() -> ParserOptions {
    ParserOptions {
        unknown_fields: UnknownFieldPolicy::Reject,
        ..ParserOptions::default()
    }
}

#[test]
fn test_tokenize_full_query() {
    let kinds: Vec<TokenKind> = tokenize("@title|body:(foo* -\"a b\") ~c")
        .into_iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::At,
            TokenKind::Term,
            TokenKind::Or,
            TokenKind::Term,
            TokenKind::Colon,
            TokenKind::LParen,
            TokenKind::Term,
            TokenKind::Star,
            TokenKind::Minus,
            TokenKind::Quote,
            TokenKind::Term,
            TokenKind::Term,
            TokenKind::Quote,
            TokenKind::RParen,
            TokenKind::Tilde,
            TokenKind::Term,
        ]
    );
}

#[test]
fn test_tree_shape_for_mixed_query() {
    let schema = schema();
    let node = parse_with(
        "@title|body:(hello -world) \"exact phrase\" ~maybe pre* a|b",
        Some(&schema),
        ParserOptions::default(),
    )
    .unwrap()
    .unwrap();

    assert_eq!(
        node.to_string(),
        "Phrase\n\
         \x20 Phrase @{0,1}\n\
         \x20   Term(\"hello\")\n\
         \x20   Not\n\
         \x20     Term(\"world\")\n\
         \x20 Phrase(exact)\n\
         \x20   Term(\"exact\")\n\
         \x20   Term(\"phrase\")\n\
         \x20 Optional\n\
         \x20   Term(\"maybe\")\n\
         \x20 Prefix(\"pre\")\n\
         \x20 Union\n\
         \x20   Term(\"a\")\n\
         \x20   Term(\"b\")\n"
    );
}

#[test]
fn test_canonical_rendering_reparses_to_same_tree() {
    let schema = schema();
    for query in [
        "hello",
        "a b c",
        "(a b) c",
        "-a|b ~\"x y\" z*",
        "@title:(a b) @body|tags:c",
        "--x ~(y -z)",
    ] {
        let node = parse_with(query, Some(&schema), ParserOptions::default())
            .unwrap()
            .unwrap();
        let rendered = node.to_query_string_with(&schema);
        let reparsed = parse_with(&rendered, Some(&schema), ParserOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(node, reparsed, "{query:?} rendered as {rendered:?}");
    }
}

#[test]
fn test_intersection_is_left_to_right() {
    let node = parse("a b c").unwrap().unwrap();
    let words: Vec<&str> = node
        .children()
        .iter()
        .map(|c| match c.kind() {
            NodeKind::Term(t) => t.as_str(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(words, ["a", "b", "c"]);
}

#[test]
fn test_modifier_scopes_single_expression() {
    let schema = schema();
    let node = parse_with("@tags:a|b c", Some(&schema), ParserOptions::default())
        .unwrap()
        .unwrap();
    let children = node.children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].field_mask(), FieldMask::from_bit(2));
    assert!(children[1].field_mask().is_all());
}

#[test]
fn test_unknown_fields_lenient_and_strict() {
    let schema = schema();

    let node = parse_with("@missing:a", Some(&schema), ParserOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(node.field_mask(), FieldMask::NONE);

    let err = parse_with("@missing:a", Some(&schema), strict()).unwrap_err();
    assert_eq!(
        err.kind(),
        &ParseErrorKind::UnknownField {
            name: "missing".into()
        }
    );
    assert!(err.to_string().contains("hint:"));
}

#[test]
fn test_error_reports_position_and_snippet() {
    let err = parse("alpha beta ) gamma").unwrap_err();
    assert_eq!(err.error.offset, 11);
    assert_eq!(err.error.near, ")");
    let display = err.to_string();
    assert!(display.starts_with("query error: syntax error at offset 11 near ')'"));
    assert!(display.contains("  alpha beta ) gamma\n"));
    assert!(display.contains(&format!("  {}^", " ".repeat(11))));
}

#[test]
fn test_error_caret_counts_characters() {
    let err = parse("héllo )").unwrap_err();
    assert_eq!(err.error.offset, 7);
    assert!(err.to_string().contains(&format!("  {}^", " ".repeat(6))));
}

#[test]
fn test_incremental_feeding_matches_parse() {
    let query = "@title:rust (async|await) -blocking";
    let schema = schema();

    let mut parser = Parser::new(Some(&schema));
    for token in tokenize(query) {
        parser.feed(token);
        assert_eq!(parser.state(), DriverState::Running);
    }
    let result = parser.finish();
    assert!(result.ok);

    let expected = parse_with(query, Some(&schema), ParserOptions::default()).unwrap();
    assert_eq!(result.root, expected);
}

#[test]
fn test_result_into_result() {
    let mut parser = Parser::new(None);
    for token in tokenize("a )") {
        parser.feed(token);
    }
    let result = parser.finish();
    assert!(result.root.is_none());
    let err = result.into_result().unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::Syntax);
}

#[test]
fn test_depth_limit_is_configurable() {
    let query = format!("{}x{}", "(".repeat(20), ")".repeat(20));
    let tight = ParserOptions {
        max_depth: 10,
        ..ParserOptions::default()
    };
    assert!(matches!(
        parse_with(&query, None, tight).unwrap_err().kind(),
        ParseErrorKind::StackOverflow { limit: 10 }
    ));
    assert_eq!(parse(&query).unwrap(), Some(QueryNode::term("x")));
}

#[test]
fn test_concurrent_parses_share_one_schema() {
    let schema = schema();
    let fields = [("title", 0), ("body", 1), ("tags", 2)];

    let nodes: Vec<QueryNode> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let schema = &schema;
                let (field, _) = fields[i % fields.len()];
                scope.spawn(move || {
                    let query = format!("@{field}:t{i} -(x{i} y)");
                    parse_with(&query, Some(schema), ParserOptions::default())
                        .unwrap()
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, node) in nodes.iter().enumerate() {
        let (field, bit) = fields[i % fields.len()];
        let children = node.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].field_mask(), FieldMask::from_bit(bit));
        assert!(children[1].field_mask().is_all());
        assert!(node.field_mask().is_all());
        assert_eq!(
            node.to_query_string_with(&schema),
            format!("@{field}:t{i} -(x{i} y)")
        );
    }
}
