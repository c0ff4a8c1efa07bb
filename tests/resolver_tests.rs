use twoway_sql::{
    Bean, LoopContext, LoopStack, ParamValue, ParameterProvider, Parameters, PropertyPath,
    ResolveError, Scope, TypeTag, resolve,
};

fn path(text: &str) -> PropertyPath {
    PropertyPath::parse(text).unwrap()
}

fn member_params() -> Parameters {
    Parameters::new(
        "pmb",
        Bean::new("MemberPmb")
            .with("member", Bean::new("Member").with("name", "Pixy").with("birthdate", ParamValue::Null))
            .with("ids", vec![10, 20]),
    )
    .declare("member.birthdate", TypeTag::String)
}

fn loop_over(alias: &str, element: ParamValue, index: usize, size: usize) -> LoopContext {
    LoopContext {
        alias: alias.to_string(),
        declared_type: element.type_tag().unwrap_or(TypeTag::Object),
        element,
        index,
        size,
    }
}

/// A host type exposing its own root without going through `Parameters`.
struct FixedRoot(ParamValue);

impl ParameterProvider for FixedRoot {
    fn root_name(&self) -> &str {
        "param"
    }

    fn root(&self) -> &ParamValue {
        &self.0
    }
}

#[test]
fn test_resolve_nested_property() {
    let params = member_params();
    let loops = LoopStack::default();
    let scope = Scope::new(&params, &loops);

    let resolved = resolve(&scope, &path("pmb.member.name")).unwrap();
    assert_eq!(resolved.value, ParamValue::String("Pixy".to_string()));
    assert_eq!(resolved.declared_type, TypeTag::String);

    let index = resolve(&scope, &path("pmb.ids.1")).unwrap();
    assert_eq!(index.value, ParamValue::Integer(20));
}

#[test]
fn test_null_takes_declared_type() {
    let params = member_params();
    let loops = LoopStack::default();
    let scope = Scope::new(&params, &loops);

    let resolved = resolve(&scope, &path("pmb.member.birthdate")).unwrap();
    assert_eq!(resolved.value, ParamValue::Null);
    assert_eq!(resolved.declared_type, TypeTag::String);
}

#[test]
fn test_loop_alias_and_current() {
    let params = member_params();
    let mut loops = LoopStack::default();
    loops.push(loop_over("m", Bean::new("Member").with("id", 7).into(), 0, 2));
    loops.push(loop_over("#current", ParamValue::String("inner".to_string()), 1, 2));
    let scope = Scope::new(&params, &loops);

    assert_eq!(
        resolve(&scope, &path("m.id")).unwrap().value,
        ParamValue::Integer(7)
    );
    assert_eq!(
        resolve(&scope, &path("#current")).unwrap().value,
        ParamValue::String("inner".to_string())
    );
    assert_eq!(loops.depth(), 2);
    assert!(loops.innermost().is_some_and(LoopContext::is_last));
}

#[test]
fn test_innermost_alias_wins() {
    let params = member_params();
    let mut loops = LoopStack::default();
    loops.push(loop_over("e", ParamValue::Integer(1), 0, 1));
    loops.push(loop_over("e", ParamValue::Integer(2), 0, 1));
    let scope = Scope::new(&params, &loops);

    assert_eq!(resolve(&scope, &path("e")).unwrap().value, ParamValue::Integer(2));
}

#[test]
fn test_resolution_errors() {
    let params = member_params();
    let loops = LoopStack::default();
    let scope = Scope::new(&params, &loops);

    assert!(matches!(
        resolve(&scope, &path("pmb.member.age")),
        Err(ResolveError::PropertyNotFound { .. })
    ));
    assert!(matches!(
        resolve(&scope, &path("pmb.ids.2")),
        Err(ResolveError::IndexOutOfBounds { index: 2, size: 2, .. })
    ));
    assert!(matches!(
        resolve(&scope, &path("pmb.member.birthdate.year")),
        Err(ResolveError::NotNavigable { type_name: "null", .. })
    ));
    assert!(matches!(
        resolve(&scope, &path("#current")),
        Err(ResolveError::UnknownParameterName { .. })
    ));
}

#[test]
fn test_custom_provider() {
    let provider = FixedRoot(Bean::new("Custom").with("x", 1).into());
    let loops = LoopStack::default();
    let scope = Scope::new(&provider, &loops);

    let resolved = resolve(&scope, &path("param.x")).unwrap();
    assert_eq!(resolved.value, ParamValue::Integer(1));
    assert_eq!(resolved.declared_type, TypeTag::Integer);
    assert!(matches!(
        resolve(&scope, &path("pmb.x")),
        Err(ResolveError::UnknownParameterName { root_name, .. }) if root_name == "param"
    ));
}
