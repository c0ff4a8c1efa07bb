use twoway_sql::{
    LikeSearch, Node, PropertyPath, Template, TemplateSyntaxError, Variable, VariableOptions,
    parse_template,
};

fn parse(text: &str) -> Vec<Node> {
    match parse_template(text).unwrap() {
        Node::Root(children) => children,
        other => panic!("expected root, got {:?}", other),
    }
}

fn parse_err(text: &str) -> TemplateSyntaxError {
    parse_template(text).unwrap_err()
}

fn path(text: &str) -> PropertyPath {
    PropertyPath::parse(text).unwrap()
}

fn text(s: &str) -> Node {
    Node::Text(s.to_string())
}

#[test]
fn test_plain_sql() {
    assert_eq!(parse("SELECT * FROM MEMBER"), vec![text("SELECT * FROM MEMBER")]);
    assert_eq!(parse(""), vec![]);
}

#[test]
fn test_bind_variable() {
    let nodes = parse("SELECT * FROM MEMBER WHERE MEMBER_ID = /*pmb.memberId*/3 ORDER BY 1");
    assert_eq!(
        nodes,
        vec![
            text("SELECT * FROM MEMBER WHERE MEMBER_ID = "),
            Node::BindVariable(Variable {
                path: path("pmb.memberId"),
                test_value: "3".to_string(),
                in_scope: false,
                options: VariableOptions::default(),
            }),
            text(" ORDER BY 1"),
        ]
    );
}

#[test]
fn test_quoted_test_value_with_escaped_quote() {
    let nodes = parse("WHERE NAME = /*pmb.name*/'O''Brien' AND X = 1");
    let Node::BindVariable(variable) = &nodes[1] else {
        panic!("expected bind variable");
    };
    assert_eq!(variable.test_value, "'O''Brien'");
    assert_eq!(nodes[2], text(" AND X = 1"));
}

#[test]
fn test_multibyte_test_value() {
    let nodes = parse("SELECT * FROM MEMBER WHERE NAME = /*pmb.name*/José AND X = 1");
    let Node::BindVariable(variable) = &nodes[1] else {
        panic!("expected bind variable");
    };
    assert_eq!(variable.test_value, "José");
    assert_eq!(nodes[2], text(" AND X = 1"));

    let nodes = parse("WHERE CITY = /*pmb.city*/Zürich/*IF pmb.a*/ AND A = 1/*END*/");
    let Node::BindVariable(variable) = &nodes[1] else {
        panic!("expected bind variable");
    };
    assert_eq!(variable.test_value, "Zürich");
    assert!(matches!(nodes[2], Node::If { .. }));
}

#[test]
fn test_in_scope_test_value() {
    let nodes = parse("WHERE ID IN /*pmb.ids*/(1, 2, 3)");
    let Node::BindVariable(variable) = &nodes[1] else {
        panic!("expected bind variable");
    };
    assert!(variable.in_scope);
    assert_eq!(variable.test_value, "(1, 2, 3)");
    assert_eq!(nodes.len(), 2);
}

#[test]
fn test_embedded_variable_with_options() {
    let nodes = parse("ORDER BY /*$pmb.orderBy*/MEMBER_ID, /*pmb.name:likePrefix|nullable*/'S'");
    assert!(matches!(&nodes[1], Node::EmbeddedVariable(v) if v.test_value == "MEMBER_ID"));

    let Node::BindVariable(variable) = &nodes[3] else {
        panic!("expected bind variable");
    };
    assert_eq!(
        variable.options,
        VariableOptions {
            nullable: true,
            like: Some(LikeSearch::Prefix),
            not_escape: false,
        }
    );
}

#[test]
fn test_if_else_structure() {
    let nodes = parse("/*IF pmb.paging*/ROWNUM <= 10/*ELSE*/1 = 1/*END*/");
    let [Node::If {
        condition,
        children,
        else_branch: Some(else_branch),
    }] = nodes.as_slice()
    else {
        panic!("expected IF with ELSE, got {:?}", nodes);
    };
    assert_eq!(condition.source, "pmb.paging");
    assert_eq!(children, &vec![text("ROWNUM <= 10")]);
    assert_eq!(else_branch, &vec![text("1 = 1")]);
}

#[test]
fn test_line_comment_else() {
    let nodes = parse("/*IF pmb.paging*/ROWNUM <= 10\n-- ELSE\nROWNUM <= 100\n/*END*/");
    let [Node::If {
        children,
        else_branch: Some(else_branch),
        ..
    }] = nodes.as_slice()
    else {
        panic!("expected IF with ELSE, got {:?}", nodes);
    };
    assert_eq!(children, &vec![text("ROWNUM <= 10\n")]);
    assert_eq!(else_branch, &vec![text("\nROWNUM <= 100\n")]);
}

#[test]
fn test_else_line_comment_after_sql_is_plain_text() {
    let nodes = parse("/*IF pmb.paging*/ROWNUM <= 10 -- ELSE\nROWNUM <= 100/*END*/");
    let [Node::If {
        children,
        else_branch: None,
        ..
    }] = nodes.as_slice()
    else {
        panic!("expected IF without ELSE, got {:?}", nodes);
    };
    assert_eq!(children, &vec![text("ROWNUM <= 10 -- ELSE\nROWNUM <= 100")]);
}

#[test]
fn test_for_with_and_without_alias() {
    let nodes = parse("/*FOR name : pmb.names*//*NEXT 'OR '*/X/*END*//*FOR pmb.ids*/Y/*END*/");
    assert!(matches!(
        &nodes[0],
        Node::For { alias, collection, children }
            if alias == "name"
                && collection == &path("pmb.names")
                && children[0] == Node::LoopNext("OR ".to_string())
    ));
    assert!(matches!(&nodes[1], Node::For { alias, .. } if alias == "#current"));
}

#[test]
fn test_nested_blocks() {
    let root = parse_template(
        "/*BEGIN*/WHERE /*IF pmb.a != null*/A = /*pmb.a*/1/*END*/ /*BEGIN*/AND (/*IF pmb.b*/B/*END*/)/*END*//*END*/",
    )
    .unwrap();
    let Node::Root(children) = &root else {
        panic!("expected root");
    };
    let Node::Trim(outer) = &children[0] else {
        panic!("expected BEGIN");
    };
    assert!(matches!(outer.last(), Some(Node::Trim(_))));
    // root, BEGIN, text, IF, text, bind, text, BEGIN, text, IF, text, text
    assert_eq!(root.count(), 12);
}

#[test]
fn test_opaque_literals_and_comments() {
    let sql = "SELECT '/*IF pmb.x*/', /*+ INDEX(M) */ * FROM M /* note */ /**/ -- /*pmb.id*/\nWHERE 1 = 1";
    assert_eq!(parse(sql), vec![text(sql)]);
}

#[test]
fn test_template_keeps_source() {
    let template: Template = "SELECT 1".parse().unwrap();
    assert_eq!(template.source(), "SELECT 1");
    assert_eq!(template.root(), &Node::Root(vec![text("SELECT 1")]));
}

#[test]
fn test_unterminated_block() {
    match parse_err("SELECT * FROM T /*IF pmb.a*/WHERE A = 1") {
        TemplateSyntaxError::UnterminatedBlock {
            directive,
            position,
        } => {
            assert_eq!(directive, "IF pmb.a");
            assert_eq!(position.column, 17);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_unexpected_end_reports_line() {
    match parse_err("SELECT 1\n  /*END*/") {
        TemplateSyntaxError::UnexpectedEnd { position } => {
            assert_eq!(position.line, 2);
            assert_eq!(position.column, 3);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_misplaced_else() {
    assert!(matches!(
        parse_err("SELECT 1 /*ELSE*/"),
        TemplateSyntaxError::MisplacedElse { .. }
    ));
    assert!(matches!(
        parse_err("/*BEGIN*/X/*ELSE*/Y/*END*/"),
        TemplateSyntaxError::MisplacedElse { .. }
    ));
    assert!(matches!(
        parse_err("/*IF pmb.a*/X/*ELSE*/Y/*ELSE*/Z/*END*/"),
        TemplateSyntaxError::MisplacedElse {
            reason: "IF block already has an ELSE",
            ..
        }
    ));
}

#[test]
fn test_unterminated_comment_and_literal() {
    assert!(matches!(
        parse_err("SELECT /*pmb.id"),
        TemplateSyntaxError::UnterminatedComment { .. }
    ));
    assert!(matches!(
        parse_err("SELECT 'abc"),
        TemplateSyntaxError::UnterminatedLiteral { .. }
    ));
    assert!(matches!(
        parse_err("WHERE ID IN /*pmb.ids*/(1, 2"),
        TemplateSyntaxError::UnterminatedLiteral { .. }
    ));
}

#[test]
fn test_loop_directive_outside_for() {
    assert!(matches!(
        parse_err("/*FIRST*/X/*END*/"),
        TemplateSyntaxError::LoopDirectiveOutsideFor { .. }
    ));
    assert!(matches!(
        parse_err("/*NEXT ','*/"),
        TemplateSyntaxError::LoopDirectiveOutsideFor { .. }
    ));
}

#[test]
fn test_malformed_markers() {
    for bad in [
        "/*pmb.id:wildcard*/1",
        "/*pmb.name:likePrefix|likeSuffix*/'a'",
        "/*pmb..id*/1",
        "/*1pmb*/1",
        "/*$pmb.x:likeContain*/a",
        "/*FOR 1x : pmb.ids*/X/*END*/",
        "/*FOR pmb.ids*//*NEXT or*//*END*/",
        "/*IF*/X/*END*/",
    ] {
        assert!(
            matches!(parse_err(bad), TemplateSyntaxError::MalformedMarker { .. }),
            "{} should be malformed",
            bad
        );
    }
}

#[test]
fn test_placeholder_in_test_value() {
    assert!(matches!(
        parse_err("WHERE ID = /*pmb.id*/?"),
        TemplateSyntaxError::PlaceholderInTestValue { .. }
    ));
    // a quoted '?' is fine
    assert!(parse_template("WHERE NAME = /*pmb.name*/'?'").is_ok());
}

#[test]
fn test_placeholder_in_plain_text() {
    match parse_err("WHERE A = ? AND B = /*pmb.b*/1") {
        TemplateSyntaxError::PlaceholderInText { position } => {
            assert_eq!((position.line, position.column), (1, 11));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // quoted or commented '?' stays plain SQL
    assert!(parse_template("WHERE A = '?' /* ? */ AND B = /*pmb.b*/1 -- ?").is_ok());
}

#[test]
fn test_invalid_condition() {
    match parse_err("/*IF pmb.a = 1*/X/*END*/") {
        TemplateSyntaxError::InvalidCondition { fragment, .. } => assert_eq!(fragment, "pmb.a = 1"),
        other => panic!("unexpected error: {:?}", other),
    }
}
