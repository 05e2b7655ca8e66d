//! End-to-end compile tests.
//!
//! Every test goes through the public API: query text and a configuration in,
//! a query tree (or a typed error) out.

use qsol::query::{DefaultDateParser, WordListSpellChecker};
use qsol::{
    CompileError, Configuration, DefaultOperator, OperatorKind, QueryCompiler, QueryNode, RegexRule,
    compile_query,
};

const FIELD: &str = "f";

fn compile(query: &str) -> QueryNode {
    compile_with(&Configuration::default(), query)
}

fn compile_with(config: &Configuration, query: &str) -> QueryNode {
    compile_query(FIELD, query, config).unwrap()
}

fn error_with(config: &Configuration, query: &str) -> CompileError {
    compile_query(FIELD, query, config).unwrap_err()
}

fn error(query: &str) -> CompileError {
    error_with(&Configuration::default(), query)
}

fn t(text: &str) -> QueryNode {
    QueryNode::term(FIELD, text)
}

fn near(a: QueryNode, b: QueryNode, distance: u32) -> QueryNode {
    QueryNode::near(vec![a, b], distance, false)
}

fn and(children: Vec<QueryNode>) -> QueryNode {
    QueryNode::And(children)
}

fn or(children: Vec<QueryNode>) -> QueryNode {
    QueryNode::Or(children)
}

fn field_group(field: &str, clause: QueryNode) -> QueryNode {
    QueryNode::FieldGroup {
        fields: vec![field.to_string()],
        clauses: vec![clause],
    }
}

// ============================================================================
// Boolean structure
// ============================================================================

#[test]
fn test_or_binds_loosest_by_default() {
    assert_eq!(
        compile("mark & dog | cat"),
        or(vec![and(vec![t("mark"), t("dog")]), t("cat")])
    );
}

#[test]
fn test_operator_spellings_end_to_end() {
    let mut config = Configuration::default();
    config
        .add_operator(OperatorKind::And, "AND")
        .add_operator(OperatorKind::Or, "OR");
    assert_eq!(
        compile_with(&config, "mark AND dog OR cat"),
        or(vec![and(vec![t("mark"), t("dog")]), t("cat")])
    );
}

#[test]
fn test_same_level_chain_is_flat() {
    assert_eq!(
        compile("horse & cow & pig"),
        and(vec![t("horse"), t("cow"), t("pig")])
    );
    assert_eq!(
        compile("me ! fox ! cop"),
        QueryNode::AndNot {
            positive: vec![t("me")],
            negative: vec![t("fox"), t("cop")],
        }
    );
}

#[test]
fn test_parentheses_group() {
    assert_eq!(
        compile("mark & (dog | cat)"),
        and(vec![t("mark"), or(vec![t("dog"), t("cat")])])
    );
}

#[test]
fn test_default_operator_between_words() {
    assert_eq!(compile("mark miller"), and(vec![t("mark"), t("miller")]));

    let mut config = Configuration::default();
    config.set_default_operator(DefaultOperator::Or);
    assert_eq!(
        compile_with(&config, "mark miller"),
        or(vec![t("mark"), t("miller")])
    );
}

#[test]
fn test_match_all_exclusion() {
    assert_eq!(
        compile("*:* ! mark"),
        QueryNode::AndNot {
            positive: vec![QueryNode::MatchAll],
            negative: vec![t("mark")],
        }
    );
}

// ============================================================================
// Stop words
// ============================================================================

#[test]
fn test_stop_word_operand_is_elided() {
    assert_eq!(compile("the & mark"), t("mark"));
    assert_eq!(compile("\"the\" & \"mark\""), t("mark"));
}

#[test]
fn test_all_stop_words_is_empty_result() {
    assert!(matches!(
        error("the & but | the and"),
        CompileError::EmptyResult(_)
    ));
    assert!(matches!(error("the ! mark"), CompileError::EmptyResult(_)));
}

// ============================================================================
// Precedence
// ============================================================================

fn permutations(items: &[OperatorKind]) -> Vec<Vec<OperatorKind>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let first = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first);
            out.push(tail);
        }
    }
    out
}

#[test]
fn test_every_precedence_order() {
    let orders = permutations(&OperatorKind::ALL);
    assert_eq!(orders.len(), 24);

    for order in orders {
        let mut config = Configuration::default();
        config.set_precedence([order[0], order[1], order[2], order[3]]);
        let level = |kind| config.level_of(kind).unwrap();

        let expected = if level(OperatorKind::And) > level(OperatorKind::Or) {
            or(vec![and(vec![t("mark"), t("dog")]), t("cat")])
        } else {
            and(vec![t("mark"), or(vec![t("dog"), t("cat")])])
        };
        assert_eq!(compile_with(&config, "mark & dog | cat"), expected, "{:?}", order);

        let expected = if level(OperatorKind::AndNot) > level(OperatorKind::And) {
            and(vec![
                QueryNode::and_not(vec![t("mark")], vec![t("dog")]),
                t("cat"),
            ])
        } else {
            QueryNode::and_not(vec![t("mark")], vec![and(vec![t("dog"), t("cat")])])
        };
        assert_eq!(compile_with(&config, "mark ! dog & cat"), expected, "{:?}", order);
    }
}

// ============================================================================
// Proximity
// ============================================================================

#[test]
fn test_proximity_distributes_over_or() {
    assert_eq!(
        compile("(horse | cow) ~3 barn"),
        or(vec![near(t("horse"), t("barn"), 3), near(t("cow"), t("barn"), 3)])
    );
}

#[test]
fn test_proximity_or_run_stays_flat() {
    assert_eq!(
        compile("(horse | cow | pig) ~3 barn"),
        or(vec![
            near(t("horse"), t("barn"), 3),
            near(t("cow"), t("barn"), 3),
            near(t("pig"), t("barn"), 3),
        ])
    );
}

#[test]
fn test_proximity_distributes_over_and() {
    assert_eq!(
        compile("(horse & cow) ~3 barn"),
        and(vec![near(t("horse"), t("barn"), 3), near(t("cow"), t("barn"), 3)])
    );
}

#[test]
fn test_proximity_on_right_group() {
    assert_eq!(
        compile("barn ~3 (horse | cow)"),
        or(vec![near(t("barn"), t("horse"), 3), near(t("barn"), t("cow"), 3)])
    );
}

#[test]
fn test_proximity_binds_tighter_than_default_and() {
    assert_eq!(
        compile("goat cheese ~2 valley girl"),
        and(vec![t("goat"), near(t("cheese"), t("valley"), 2), t("girl")])
    );
}

#[test]
fn test_chained_proximity() {
    assert_eq!(
        compile("more ~4 him ~3 old"),
        and(vec![
            near(t("more"), t("him"), 4),
            and(vec![near(t("more"), t("old"), 3), near(t("him"), t("old"), 3)]),
        ])
    );
}

#[test]
fn test_nested_proximity() {
    assert_eq!(
        compile("(mark & monkey ~3 white) ~3 horse"),
        and(vec![
            near(t("mark"), t("horse"), 3),
            near(near(t("monkey"), t("white"), 3), t("horse"), 3),
        ])
    );
}

#[test]
fn test_proximity_with_exclusion() {
    assert_eq!(
        compile("jh ! (cat & hat) ~4 horse"),
        QueryNode::and_not(
            vec![near(t("jh"), t("horse"), 4)],
            vec![and(vec![near(t("cat"), t("horse"), 4), near(t("hat"), t("horse"), 4)])],
        )
    );
}

#[test]
fn test_phrase_inside_proximity() {
    assert_eq!(
        compile("\"big time\":2 ~5 cat"),
        near(QueryNode::phrase(FIELD, ["big", "time"], 2), t("cat"), 5)
    );
}

#[test]
fn test_ordered_proximity() {
    assert_eq!(
        compile("mark ord~3 cat"),
        QueryNode::near(vec![t("mark"), t("cat")], 3, true)
    );
    assert_eq!(compile("mark ~ cat"), near(t("mark"), t("cat"), 1));
}

#[test]
fn test_proximity_scope_errors() {
    let mut config = Configuration::default();
    config.mark_date_field("date");

    for query in ["field(x) ~3 y", "date(2020) ~3 y", "*:* ~3 y", "[1 TO 5] ~3 y"] {
        assert!(
            matches!(error_with(&config, query), CompileError::ProximityScope(_)),
            "{}",
            query
        );
    }
}

#[test]
fn test_proximity_on_stop_word() {
    assert_eq!(error("the ~3 cat"), CompileError::ProximityOnStopWord);
    assert_eq!(error("cat ~3 (dog | the)"), CompileError::ProximityOnStopWord);
}

#[test]
fn test_paragraph_proximity() {
    let mut config = Configuration::default();
    config
        .hide_operators(false, false, true, true)
        .add_operator(OperatorKind::And, "AND")
        .add_operator(OperatorKind::Or, "OR")
        .add_operator(OperatorKind::AndNot, "BUTNOT")
        .add_operator(OperatorKind::AndNot, "%")
        .add_operator(OperatorKind::Proximity, "/")
        .set_paragraph_marker("/p");

    assert_eq!(
        compile_with(&config, "mark /3p cat"),
        QueryNode::within(
            QueryNode::near(vec![t("mark"), t("cat")], QueryNode::UNBOUNDED, false),
            t("/p"),
            3,
        )
    );

    let expected = QueryNode::and_not(vec![t("mark")], vec![t("cat")]);
    assert_eq!(compile_with(&config, "mark BUTNOT cat"), expected);
    assert_eq!(compile_with(&config, "mark % cat"), expected);
}

#[test]
fn test_sentence_proximity_with_field_break() {
    let mut config = Configuration::default();
    config.set_sentence_marker("/s").set_field_break_marker("/fb");

    assert_eq!(
        compile_with(&config, "mark ~2s cat"),
        QueryNode::within(
            QueryNode::within(
                QueryNode::near(vec![t("mark"), t("cat")], QueryNode::UNBOUNDED, false),
                t("/fb"),
                0,
            ),
            t("/s"),
            2,
        )
    );
}

#[test]
fn test_unit_proximity_needs_marker() {
    assert!(matches!(error("mark ~2p cat"), CompileError::Configuration(_)));
    assert!(matches!(error("mark ~2s cat"), CompileError::Configuration(_)));
}

// ============================================================================
// Rewrite rules
// ============================================================================

#[test]
fn test_hidden_operator_is_literal() {
    let mut config = Configuration::default();
    config
        .hide_operators(false, true, false, false)
        .add_operator(OperatorKind::And, "AND");
    assert_eq!(
        compile_with(&config, "Mark miller AND & | me"),
        or(vec![and(vec![t("mark"), t("miller")]), t("me")])
    );
}

#[test]
fn test_thesaurus_inside_proximity() {
    let mut config = Configuration::default();
    config.add_thesaurus_entry("test", ["test1", "test2", "test3"], false);
    assert_eq!(
        compile_with(&config, "test ~4 dog | cat"),
        or(vec![
            or(vec![
                near(t("test1"), t("dog"), 4),
                near(t("test2"), t("dog"), 4),
                near(t("test3"), t("dog"), 4),
            ]),
            t("cat"),
        ])
    );
}

#[test]
fn test_field_scoped_regex_rule() {
    let mut config = Configuration::default();
    config.add_regex_rule(RegexRule::new("([a-zA-Z]{1})", "$1*").for_field("test"));
    assert_eq!(
        compile_with(&config, "test(a)"),
        field_group(
            "test",
            QueryNode::Wildcard {
                field: "test".into(),
                pattern: "a*".into(),
            }
        )
    );
}

#[test]
fn test_zero_padding() {
    let mut config = Configuration::default();
    config.add_zero_pad_field("wc", 6);

    assert_eq!(
        compile_with(&config, "wc(45)"),
        field_group("wc", QueryNode::term("wc", "000045"))
    );
    assert_eq!(
        compile_with(&config, "wc(6 rng 10)"),
        field_group(
            "wc",
            QueryNode::Range {
                field: "wc".into(),
                lo: Some("000006".into()),
                hi: Some("000010".into()),
                inclusive_lo: false,
                inclusive_hi: false,
            }
        )
    );
}

// ============================================================================
// Fields and dates
// ============================================================================

#[test]
fn test_field_mapping_is_transparent() {
    let mut config = Configuration::default();
    config.add_field_mapping("test", "tester1");
    assert_eq!(
        compile_with(&config, "test(horse)"),
        compile_with(&config, "tester1(horse)")
    );
    assert_eq!(compile_with(&config, "test(horse)").to_string(), "tester1:horse");
}

#[test]
fn test_multi_field_search() {
    let q = compile("title,body(horse)");
    assert_eq!(q.to_string(), "title:horse body:horse");
}

fn date_compiler() -> QueryCompiler {
    let mut config = Configuration::default();
    config.mark_date_field("date");
    QueryCompiler::new(config)
        .unwrap()
        .with_date_parser(DefaultDateParser::with_century_start(1946))
}

#[test]
fn test_date_exact_day() {
    let q = date_compiler().compile(FIELD, "date(8/8/2008)").unwrap();
    assert_eq!(q.into_query(), field_group("date", QueryNode::term("date", "20080808")));
}

#[test]
fn test_date_range_rolls_over() {
    let q = date_compiler()
        .compile(FIELD, "date(3/23/2004 - 6/34/02)")
        .unwrap();
    assert_eq!(q.query().to_string(), "date:[20040323 TO 20020704]");
}

#[test]
fn test_date_before_and_after() {
    let compiler = date_compiler();
    let q = compiler.compile(FIELD, "date(< 3/23/2004) & horse").unwrap();
    assert_eq!(q.query().to_string(), "+date:{* TO 20040323} +f:horse");

    let q = compiler.compile(FIELD, "date(>1/1/99)").unwrap();
    assert_eq!(q.query().to_string(), "date:{19990101 TO *}");
}

#[test]
fn test_bad_date() {
    assert!(matches!(
        date_compiler().compile(FIELD, "date(someday)"),
        Err(CompileError::DateSyntax(_))
    ));
}

// ============================================================================
// Hostile input
// ============================================================================

fn nested(open: &str, depth: usize, inner: &str) -> String {
    format!("{}{}{}", open.repeat(depth), inner, ")".repeat(depth))
}

#[test]
fn test_deep_nesting_is_rejected() {
    let err = error(&nested("(", 10_000, "horse"));
    assert_eq!(
        err,
        CompileError::Syntax {
            position: qsol::config::DEFAULT_MAX_NESTING,
            message: "query nested too deeply".to_string(),
        }
    );

    assert!(matches!(
        error(&nested("title(", 10_000, "horse")),
        CompileError::Syntax { .. }
    ));
    assert!(matches!(
        error(&nested("(horse ~3 ", 5_000, "barn")),
        CompileError::Syntax { .. }
    ));
}

#[test]
fn test_nesting_at_the_limit_compiles() {
    let depth = qsol::config::DEFAULT_MAX_NESTING;
    assert_eq!(compile(&nested("(", depth, "horse")), t("horse"));
    assert_eq!(
        compile(&nested("(", depth - 1, "(horse | cow) ~3 barn")),
        or(vec![near(t("horse"), t("barn"), 3), near(t("cow"), t("barn"), 3)])
    );

    let mut config = Configuration::default();
    config.set_max_nesting(2);
    assert!(matches!(
        error_with(&config, "((( horse )))"),
        CompileError::Syntax { position: 2, .. }
    ));
}

#[test]
fn test_oversize_proximity_distance() {
    assert_eq!(
        error("aaa bbb ~99999999999 c"),
        CompileError::Syntax {
            position: 8,
            message: "malformed proximity operator `~99999999999`".to_string(),
        }
    );
    assert_eq!(
        compile("horse ~4000000000 barn"),
        near(t("horse"), t("barn"), 4_000_000_000)
    );
}

#[test]
fn test_oversize_padded_numbers_keep_their_digits() {
    let mut config = Configuration::default();
    config.add_zero_pad_field("wc", 6);

    assert_eq!(
        compile_with(&config, "wc(99999999999999999999999)"),
        field_group("wc", QueryNode::term("wc", "99999999999999999999999"))
    );
    assert_eq!(
        compile_with(&config, "wc(1 rng 99999999999999999999999)").to_string(),
        "wc:{000001 TO 99999999999999999999999}"
    );
}

// ============================================================================
// Suggestions, errors, configuration
// ============================================================================

#[test]
fn test_suggested_search() {
    let compiler = QueryCompiler::new(Configuration::default())
        .unwrap()
        .with_spell_checker(WordListSpellChecker::new(["horse", "cheese", "monkey"]));

    let compiled = compiler.compile(FIELD, "hrose | monkey").unwrap();
    assert_eq!(compiled.suggested_search(), Some("horse | monkey"));
    assert_eq!(compiled.query(), &or(vec![t("hrose"), t("monkey")]));

    let compiled = compiler.compile(FIELD, "horse | monkey").unwrap();
    assert_eq!(compiled.suggested_search(), None);
}

#[test]
fn test_syntax_errors() {
    for query in ["(mark & dog", "mark &", "| mark", "\"open", "mark )", ""] {
        assert!(
            matches!(error(query), CompileError::Syntax { .. }),
            "{}",
            query
        );
    }
}

#[test]
fn test_configuration_from_json() {
    let config = Configuration::from_json(
        r#"{
            "precedence": ["or", "and", "proximity", "and_not"],
            "default_operator": "or",
            "field_map": {"test": "tester1"},
            "zero_pad": {"wc": 4}
        }"#,
    )
    .unwrap();
    assert_eq!(
        compile_with(&config, "test(horse) wc(7)"),
        or(vec![
            field_group("tester1", QueryNode::term("tester1", "horse")),
            field_group("wc", QueryNode::term("wc", "0007")),
        ])
    );

    assert!(matches!(
        Configuration::from_json(r#"{"precedence": ["or", "or", "and", "and_not"]}"#),
        Err(CompileError::Configuration(_))
    ));
}

#[test]
fn test_compiler_is_reusable() {
    let compiler = QueryCompiler::new(Configuration::default()).unwrap();
    let first = compiler.compile(FIELD, "\"big time\":3^2").unwrap();
    let second = compiler.compile(FIELD, "\"big time\"").unwrap();
    assert_eq!(first.query().to_string(), "f:\"big time\"~3^2");
    assert_eq!(second.query().to_string(), "f:\"big time\"");
}
