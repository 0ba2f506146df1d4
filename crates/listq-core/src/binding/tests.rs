use super::*;

#[test]
fn missing_and_null_values_signal_null_binding() {
    let bindings = Bindings::new().with("present", Value::Null);

    assert_eq!(
        ValueBinding::param("present").resolve(&bindings),
        Err(BindingError::Null {
            name: "present".into()
        })
    );
    assert_eq!(
        ValueBinding::param("absent").resolve(&bindings),
        Err(BindingError::Null {
            name: "absent".into()
        })
    );
    assert!(
        ValueBinding::Literal(Value::Null)
            .resolve(&bindings)
            .unwrap_err()
            .is_unsatisfiable()
    );
}

#[test]
fn empty_collection_is_a_distinct_signal() {
    let bindings = Bindings::new().with("ids", Vec::<i64>::new());
    let err = ValueBinding::param("ids").resolve(&bindings).unwrap_err();

    assert_eq!(
        err,
        BindingError::EmptyCollection {
            name: "ids".into()
        }
    );
    assert!(err.is_unsatisfiable());
}

#[test]
fn collection_binding_skips_nulls() {
    let bindings = Bindings::new().with(
        "names",
        Value::List(vec![Value::from("a"), Value::Null, Value::from("b")]),
    );

    assert_eq!(
        ValueBinding::param("names").bind_collection(&bindings),
        Ok(vec!["a".to_string(), "b".to_string()])
    );

    let only_nulls = Bindings::new().with("names", Value::List(vec![Value::Null]));
    assert!(matches!(
        ValueBinding::param("names").bind_collection(&only_nulls),
        Err(BindingError::EmptyCollection { .. })
    ));
}

#[test]
fn scalar_binding_rejects_collections() {
    let bindings = Bindings::new().with("ids", vec![1, 2]);

    assert_eq!(
        ValueBinding::param("ids").bind_scalar(&bindings),
        Err(BindingError::NotScalar { name: "ids".into() })
    );
    assert_eq!(
        ValueBinding::Literal(Value::Int(7)).bind_scalar(&bindings),
        Ok("7".to_string())
    );
}

#[test]
fn merged_maps_prefer_right_hand_entries() {
    let left = Bindings::new().with("a", 1).with("b", 2);
    let right = Bindings::new().with("b", 3).with("c", 4);
    let merged = left.merged(&right);

    assert_eq!(merged.get("a"), Some(&Value::Int(1)));
    assert_eq!(merged.get("b"), Some(&Value::Int(3)));
    assert_eq!(merged.get("c"), Some(&Value::Int(4)));

    // sources are untouched
    assert_eq!(left.get("b"), Some(&Value::Int(2)));
    assert_eq!(right.len(), 2);
}

#[test]
fn parameterized_field_names_resolve_to_text() {
    let bindings = Bindings::new().with("column", "Title").with("bad", 3);

    assert_eq!(
        FieldName::Param("column".into()).resolve(&bindings),
        Ok("Title".to_string())
    );
    assert!(matches!(
        FieldName::Param("bad".into()).resolve(&bindings),
        Err(BindingError::TypeMismatch {
            expected: "text",
            found: "int",
            ..
        })
    ));
}
