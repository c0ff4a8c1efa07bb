use std::thread;

use proptest::prelude::*;
use twoway_sql::{Bean, ParamValue, Parameters, Template};

proptest! {
    #[test]
    fn in_list_binds_every_non_null_element(ids in prop::collection::vec(prop::option::of(any::<i64>()), 1..20)) {
        prop_assume!(ids.iter().any(Option::is_some));
        let expected: Vec<ParamValue> = ids.iter().flatten().map(|id| ParamValue::Integer(*id)).collect();

        let template = Template::parse("SELECT * FROM T WHERE ID IN /*pmb.ids*/(1, 2)").unwrap();
        let params = Parameters::new("pmb", Bean::new("P").with("ids", ids));
        let bound = template.render(&params).unwrap();

        prop_assert_eq!(bound.placeholder_count(), expected.len());
        let values: Vec<ParamValue> = bound.bind_values.into_iter().map(|b| b.value).collect();
        prop_assert_eq!(values, expected);
    }

    #[test]
    fn for_loop_emits_one_placeholder_per_element(names in prop::collection::vec("[a-z']{0,8}", 0..12)) {
        let template = Template::parse(
            "SELECT * FROM T /*BEGIN*/WHERE /*FOR n : pmb.names*//*NEXT 'OR '*/NAME = /*n*/'x' /*END*//*END*/",
        )
        .unwrap();
        let count = names.len();
        let params = Parameters::new("pmb", Bean::new("P").with("names", names));
        let bound = template.render(&params).unwrap();

        prop_assert_eq!(bound.placeholder_count(), count);
        prop_assert_eq!(bound.bind_values.len(), count);
        prop_assert_eq!(bound.sql.starts_with("SELECT * FROM T WHERE"), count > 0);
    }

    #[test]
    fn plain_sql_renders_unchanged(sql in "[A-Z0-9_ =,()*<>.]{0,60}") {
        let template = Template::parse(&sql).unwrap();
        let bound = template.render(&Parameters::new("pmb", Bean::new("P"))).unwrap();
        prop_assert_eq!(bound.sql.as_str(), sql.trim_end());
        prop_assert!(bound.bind_values.is_empty());
    }
}

#[test]
fn test_shared_template_renders_concurrently() {
    let template = Template::parse(
        "SELECT * FROM MEMBER /*BEGIN*/WHERE /*IF pmb.id != null*/MEMBER_ID = /*pmb.id*/0/*END*//*END*/",
    )
    .unwrap();
    let template = &template;

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8i64)
            .map(|i| {
                scope.spawn(move || {
                    let id = if i % 2 == 0 { ParamValue::Integer(i) } else { ParamValue::Null };
                    let params = Parameters::new("pmb", Bean::new("P").with("id", id.clone()));
                    (id, template.render(&params).unwrap())
                })
            })
            .collect();

        for handle in handles {
            let (id, bound) = handle.join().unwrap();
            if id.is_null() {
                assert_eq!(bound.sql, "SELECT * FROM MEMBER");
                assert!(bound.bind_values.is_empty());
            } else {
                assert_eq!(bound.sql, "SELECT * FROM MEMBER WHERE MEMBER_ID = ?");
                assert_eq!(bound.bind_values[0].value, id);
            }
        }
    });
}
