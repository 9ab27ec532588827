// tests/parser_tests.rs

use sprig_lang::lexer::Tokenizer;
use sprig_lang::parser::{ParseError, TreeBuilder};
use sprig_lang::{ExprTree, NodeId};

fn parse(input: &str) -> Result<ExprTree, ParseError> {
    TreeBuilder::build(&Tokenizer::new(input).tokenize())
}

/// Flatten a tree into (kind name, node name, level, child count) tuples
/// in preorder, for shape assertions.
fn shape(tree: &ExprTree) -> Vec<(String, Option<String>, usize, usize)> {
    let mut out = Vec::new();
    collect(tree, tree.root(), &mut out);
    out
}

fn collect(tree: &ExprTree, id: NodeId, out: &mut Vec<(String, Option<String>, usize, usize)>) {
    let node = tree.node(id);
    out.push((
        node.kind.name().to_string(),
        node.name.clone(),
        node.level,
        node.children.len(),
    ));
    for &child in &node.children {
        collect(tree, child, out);
    }
}

fn row(kind: &str, name: Option<&str>, level: usize, children: usize)
-> (String, Option<String>, usize, usize) {
    (kind.to_string(), name.map(|n| n.to_string()), level, children)
}

// ============================================================================
// Basic shapes
// ============================================================================

#[test]
fn test_empty_expression_is_bare_root() {
    let tree = parse("").unwrap();
    assert_eq!(shape(&tree), vec![row("Root", None, 0, 0)]);
}

#[test]
fn test_single_constant() {
    let tree = parse("42").unwrap();
    assert_eq!(
        shape(&tree),
        vec![row("Root", None, 0, 1), row("Constant", None, 1, 0)]
    );
}

#[test]
fn test_dotted_path_is_value_node() {
    let tree = parse("this.name").unwrap();
    assert_eq!(
        shape(&tree),
        vec![row("Root", None, 0, 1), row("Value", None, 1, 0)]
    );
}

#[test]
fn test_function_call_with_arguments() {
    let tree = parse("add(1, 2, 3)").unwrap();
    assert_eq!(
        shape(&tree),
        vec![
            row("Root", None, 0, 1),
            row("FunctionCall", Some("add"), 1, 3),
            row("Constant", None, 2, 0),
            row("Constant", None, 2, 0),
            row("Constant", None, 2, 0),
        ]
    );
}

#[test]
fn test_nested_calls() {
    let tree = parse("upper(lower(this.name))").unwrap();
    assert_eq!(
        shape(&tree),
        vec![
            row("Root", None, 0, 1),
            row("FunctionCall", Some("upper"), 1, 1),
            row("FunctionCall", Some("lower"), 2, 1),
            row("Value", None, 3, 0),
        ]
    );
}

#[test]
fn test_bare_group() {
    let tree = parse("('a', 'b')").unwrap();
    assert_eq!(
        shape(&tree),
        vec![
            row("Root", None, 0, 1),
            row("Group", None, 1, 2),
            row("Constant", None, 2, 0),
            row("Constant", None, 2, 0),
        ]
    );
}

// ============================================================================
// Reserved words
// ============================================================================

#[test]
fn test_reserved_words() {
    let tree = parse("if(true, null, data)").unwrap();
    assert_eq!(
        shape(&tree),
        vec![
            row("Root", None, 0, 1),
            row("If", Some("if"), 1, 3),
            row("Constant", None, 2, 0),
            row("Constant", None, 2, 0),
            row("Value", None, 2, 0),
        ]
    );
}

#[test]
fn test_each_and_filter_are_reserved() {
    let tree = parse("filter(merge(1, 2), gt(data, 1))").unwrap();
    let rows = shape(&tree);
    assert_eq!(rows[1], row("Filter", Some("filter"), 1, 2));

    let tree = parse("each(merge(1, 2), print(data))").unwrap();
    let rows = shape(&tree);
    assert_eq!(rows[1], row("Each", Some("each"), 1, 2));
}

#[test]
fn test_unknown_word_is_a_value_path() {
    // Not a registered function, not reserved: a property path.
    let tree = parse("frobnicate").unwrap();
    let rows = shape(&tree);
    assert_eq!(rows[1].0, "Value");
}

// ============================================================================
// Statement separator and comma re-open
// ============================================================================

#[test]
fn test_each_body_with_statement_separator() {
    let tree = parse("each(merge(1, 2), (inc_counter(1); print(data)))").unwrap();
    assert_eq!(
        shape(&tree),
        vec![
            row("Root", None, 0, 1),
            row("Each", Some("each"), 1, 2),
            row("FunctionCall", Some("merge"), 2, 2),
            row("Constant", None, 3, 0),
            row("Constant", None, 3, 0),
            row("Group", None, 2, 2),
            row("FunctionCall", Some("inc_counter"), 3, 1),
            row("Constant", None, 4, 0),
            row("FunctionCall", Some("print"), 3, 1),
            row("Value", None, 4, 0),
        ]
    );
}

#[test]
fn test_comma_reopens_parent_for_wrapped_argument() {
    // The group after the comma must attach to `concat`, not descend into
    // the preceding argument.
    let tree = parse("concat('a', ('b', 'c'))").unwrap();
    assert_eq!(
        shape(&tree),
        vec![
            row("Root", None, 0, 1),
            row("FunctionCall", Some("concat"), 1, 2),
            row("Constant", None, 2, 0),
            row("Group", None, 2, 2),
            row("Constant", None, 3, 0),
            row("Constant", None, 3, 0),
        ]
    );
}

// ============================================================================
// Postfix chains
// ============================================================================

#[test]
fn test_index_wraps_call_into_chain() {
    let tree = parse("find('User')[0]").unwrap();
    assert_eq!(
        shape(&tree),
        vec![
            row("Root", None, 0, 1),
            row("FunctionValueChain", None, 1, 2),
            row("FunctionCall", Some("find"), 2, 1),
            row("Constant", None, 3, 0),
            row("Array", None, 2, 1),
            row("Constant", None, 3, 0),
        ]
    );
}

#[test]
fn test_repeated_indexing_extends_chain() {
    let tree = parse("find('User')[0][1]").unwrap();
    let rows = shape(&tree);
    assert_eq!(rows[1], row("FunctionValueChain", None, 1, 3));
    assert_eq!(rows[4].0, "Array");
    assert_eq!(rows[6].0, "Array");
}

#[test]
fn test_trailing_path_extends_chain() {
    let tree = parse("find('User')[0].name").unwrap();
    assert_eq!(
        shape(&tree),
        vec![
            row("Root", None, 0, 1),
            row("FunctionValueChain", None, 1, 3),
            row("FunctionCall", Some("find"), 2, 1),
            row("Constant", None, 3, 0),
            row("Array", None, 2, 1),
            row("Constant", None, 3, 0),
            row("Value", None, 2, 0),
        ]
    );
}

#[test]
fn test_index_without_call_is_an_error() {
    assert!(matches!(
        parse("[0]"),
        Err(ParseError::UnexpectedBracket { bracket: '[', .. })
    ));
    assert!(matches!(
        parse("this.name[0]"),
        Err(ParseError::UnexpectedBracket { bracket: '[', .. })
    ));
}

#[test]
fn test_stray_closing_index_is_an_error() {
    assert!(matches!(
        parse("find('User')]"),
        Err(ParseError::UnexpectedBracket { bracket: ']', .. })
    ));
}

// ============================================================================
// Structural errors
// ============================================================================

#[test]
fn test_mismatched_opening_bracket() {
    let result = parse("add(1, 2");
    assert!(matches!(
        result,
        Err(ParseError::MismatchedOpeningBracket { .. })
    ));
    let error = result.unwrap_err();
    assert_eq!(error.status(), 422);
    assert!(error.to_string().contains("mismatched opening bracket"));
}

#[test]
fn test_mismatched_closing_bracket() {
    let result = parse("add(1, 2))");
    assert!(matches!(
        result,
        Err(ParseError::MismatchedClosingBracket { .. })
    ));
    assert_eq!(result.unwrap_err().status(), 422);
}

#[test]
fn test_bracket_counting_is_deterministic() {
    // Well-bracketed inputs parse; every imbalance fails, at any depth.
    let balanced = vec![
        "add(1, 2)",
        "upper(lower(trim(' a ')))",
        "if(true, ('a'), ('b'))",
    ];
    for input in balanced {
        assert!(parse(input).is_ok(), "Failed for input: {}", input);
    }

    let unbalanced = vec!["add(1", "add(1))", "if(true, ('a')", ")", "((('x'))"];
    for input in unbalanced {
        assert!(parse(input).is_err(), "Should fail for input: {}", input);
    }
}

#[test]
fn test_consecutive_commas_are_an_error() {
    assert!(matches!(
        parse("add(1,,2)"),
        Err(ParseError::UnexpectedSeparator { .. })
    ));
}

#[test]
fn test_leading_comma_is_an_error() {
    assert!(matches!(
        parse("add(,1)"),
        Err(ParseError::UnexpectedSeparator { .. })
    ));
}

#[test]
fn test_empty_bare_group_is_an_error() {
    assert_eq!(parse("()").unwrap_err(), ParseError::EmptyGroup);
}

#[test]
fn test_empty_function_call_is_legal() {
    // Zero arguments means "give me the usage text", not an error.
    assert!(parse("upper()").is_ok());
}

#[test]
fn test_too_many_parameters_for_if() {
    assert_eq!(
        parse("if(true, 1, 2, 3)").unwrap_err(),
        ParseError::TooManyParameters { kind: "If" }
    );
}

#[test]
fn test_too_many_parameters_for_each_and_filter() {
    assert_eq!(
        parse("each(merge(1), print(data), print(data))").unwrap_err(),
        ParseError::TooManyParameters { kind: "Each" }
    );
    assert_eq!(
        parse("filter(merge(1), true, false)").unwrap_err(),
        ParseError::TooManyParameters { kind: "Filter" }
    );
}

#[test]
fn test_too_many_parameters_for_array_index() {
    assert_eq!(
        parse("find('User')[0, 1]").unwrap_err(),
        ParseError::TooManyParameters { kind: "Array" }
    );
}

// ============================================================================
// Level bookkeeping
// ============================================================================

#[test]
fn test_levels_match_parent_links() {
    let tree = parse("if(equal(this.a, 1), upper('x'), lower('y'))").unwrap();
    for index in 0..tree.len() {
        let id = NodeId(index);
        let node = tree.node(id);
        match node.parent {
            Some(parent) => assert_eq!(node.level, tree.node(parent).level + 1),
            None => assert_eq!(node.level, 0),
        }
    }
}

#[test]
fn test_chain_wrap_renumbers_levels() {
    let tree = parse("first(find('User')[0])").unwrap();
    for index in 0..tree.len() {
        let id = NodeId(index);
        let node = tree.node(id);
        if let Some(parent) = node.parent {
            assert_eq!(node.level, tree.node(parent).level + 1);
        }
    }
}

// ============================================================================
// Equivalence with an explicit depth-tagged stack
// ============================================================================

/// The two-pointer construction is equivalent to an explicit stack that
/// pushes on `(` and pops on `)`: the bracket depth recorded per node
/// must match the node's level for plain call trees.
#[test]
fn test_two_pointer_depth_matches_bracket_depth() {
    let inputs = vec![
        "add(1, subt(2, 3), mult(4, quot(5, 6)))",
        "if(true, upper('a'), lower('b'))",
        "concat('a', ('b', 'c'), 'd')",
    ];
    for input in inputs {
        let tree = parse(input).unwrap();
        let mut max_level = 0;
        for index in 0..tree.len() {
            max_level = max_level.max(tree.node(NodeId(index)).level);
        }
        let max_bracket_depth = {
            let mut depth = 0usize;
            let mut max = 0usize;
            for ch in input.chars() {
                match ch {
                    '(' => {
                        depth += 1;
                        max = max.max(depth);
                    }
                    ')' => depth -= 1,
                    _ => {}
                }
            }
            max
        };
        // Leaves sit one below their call node, so the deepest node is
        // one past the deepest bracket.
        assert_eq!(
            max_level,
            max_bracket_depth + 1,
            "Failed for input: {}",
            input
        );
    }
}
