use super::*;
use crate::{
    binding::{BindingError, Bindings, FieldName, ValueBinding},
    value::{Value, ValueType},
};
use proptest::prelude::*;

fn age() -> FieldRef {
    FieldRef::filter("Age", ValueType::Integer)
}

fn name() -> FieldRef {
    FieldRef::filter("Name", ValueType::Text)
}

fn age_eq(value: i64) -> Node {
    Node::binary(BinaryOp::Eq, age(), Value::Int(value))
}

fn caml(node: &Node) -> String {
    render(node, &Bindings::new(), false).expect("render")
}

// ----------------------------------------------------------------------
// Combinators
// ----------------------------------------------------------------------

#[test]
fn constants_absorb_and_vanish() {
    let filter = age_eq(30);

    assert_eq!(filter.clone().and(Node::FALSE), Ok(Node::FALSE));
    assert_eq!(Node::TRUE.or(filter.clone()), Ok(Node::TRUE));
    assert_eq!(filter.clone().and(Node::TRUE), Ok(filter.clone()));
    assert_eq!(Node::FALSE.or(filter.clone()), Ok(filter));
}

#[test]
fn optional_operands_treat_absence_as_identity() {
    let filter = age_eq(1);

    assert_eq!(combine_and(None, None), Ok(None));
    assert_eq!(
        combine_or(Some(filter.clone()), None),
        Ok(Some(filter.clone()))
    );
    assert_eq!(combine_and(None, Some(filter.clone())), Ok(Some(filter)));
}

#[test]
fn filters_combine_into_logical_nodes_in_call_order() {
    let joined = age_eq(1)
        .and(Node::unary(UnaryOp::IsNull, name()))
        .expect("join");

    let Node::Logical(Logical { op, left, right }) = joined else {
        panic!("expected a logical node");
    };
    assert_eq!(op, LogicalOp::And);
    assert_eq!(*left, age_eq(1));
    assert_eq!(right.as_deref(), Some(&Node::unary(UnaryOp::IsNull, name())));
}

#[test]
fn same_kind_field_refs_collect_and_deduplicate() {
    let node = Node::Field(FieldRef::order("Title", false))
        .and(Node::Field(FieldRef::order("Created", true)))
        .and_then(|node| node.and(Node::Field(FieldRef::order("Title", true))))
        .expect("join");

    let Node::Collection(collection) = node else {
        panic!("expected a collection");
    };
    assert_eq!(collection.kind, CollectionKind::Order);
    assert_eq!(collection.len(), 2);
    assert_eq!(
        collection.fields()[0].kind,
        FieldRefKind::Order { descending: false }
    );
}

#[test]
fn collection_equality_ignores_order() {
    let left = Collection::of(
        CollectionKind::Projection,
        [FieldRef::projection("A"), FieldRef::projection("B")],
    );
    let right = Collection::of(
        CollectionKind::Projection,
        [FieldRef::projection("B"), FieldRef::projection("A")],
    );

    assert_eq!(left, right);
}

#[test]
fn order_and_group_promote_to_composite_query() {
    let node = Node::Field(FieldRef::group("Category"))
        .and(Node::Field(FieldRef::order("Title", false)))
        .expect("join");

    let Node::Query(query) = node else {
        panic!("expected a composite query");
    };
    assert!(query.filter().is_none());
    assert_eq!(query.order.as_ref().map(Collection::len), Some(1));
    assert_eq!(query.group.as_ref().map(Collection::len), Some(1));
}

#[test]
fn filter_and_ordering_attach_to_one_query() {
    let node = age_eq(5)
        .and(Node::Field(FieldRef::order("Title", true)))
        .and_then(|node| node.and(Node::unary(UnaryOp::IsNotNull, name())))
        .expect("join");

    let Node::Query(query) = node else {
        panic!("expected a composite query");
    };
    assert!(matches!(query.filter(), Some(Node::Logical(_))));
    assert_eq!(query.order.as_ref().map(Collection::len), Some(1));
}

#[test]
fn queries_merge_under_and() {
    let left = age_eq(1).into_query();
    let right = Node::Field(FieldRef::order("Title", false))
        .into_query()
        .and(Node::unary(UnaryOp::IsNull, name()))
        .expect("join");

    let Node::Query(query) = left.and(right).expect("merge") else {
        panic!("expected a composite query");
    };
    assert!(matches!(query.filter(), Some(Node::Logical(_))));
    assert!(query.order.is_some());
}

#[test]
fn clauses_only_combine_under_and() {
    let order = Node::Collection(Collection::of(
        CollectionKind::Order,
        [FieldRef::order("Title", false)],
    ));

    assert_eq!(
        order.clone().or(order),
        Err(AlgebraError::InvalidJoin {
            op: JoinOp::Or,
            left: NodeKind::Collection,
            right: NodeKind::Collection,
        })
    );
}

#[test]
fn invalid_join_reports_original_orientation() {
    let err = Node::Field(FieldRef::order("Title", false))
        .or(age_eq(1))
        .expect_err("field refs cannot be OR-ed with filters");

    assert_eq!(
        err,
        AlgebraError::InvalidJoin {
            op: JoinOp::Or,
            left: NodeKind::FieldReference,
            right: NodeKind::BinaryComparison,
        }
    );
}

#[test]
fn projection_never_merges_with_filters() {
    let projection = Node::Collection(Collection::of(
        CollectionKind::Projection,
        [FieldRef::projection("Title")],
    ));

    assert!(projection.and(age_eq(1)).is_err());
}

#[test]
fn bound_nodes_merge_maps_with_right_precedence() {
    let left = Node::bound(
        Node::binary(BinaryOp::Eq, age(), ValueBinding::param("a")),
        Bindings::new().with("a", 1).with("shared", "left"),
    );
    let right = Node::bound(
        Node::binary(BinaryOp::Eq, name(), ValueBinding::param("b")),
        Bindings::new().with("b", "x").with("shared", "right"),
    );

    let Node::Bound { bindings, .. } = left.and(right).expect("join") else {
        panic!("expected a bound node");
    };
    assert_eq!(bindings.get("a"), Some(&Value::Int(1)));
    assert_eq!(bindings.get("shared"), Some(&Value::Text("right".into())));
}

// ----------------------------------------------------------------------
// Negation
// ----------------------------------------------------------------------

#[test]
fn comparisons_invert() {
    let lt = Node::binary(BinaryOp::Lt, age(), Value::Int(3));

    assert_eq!(
        negate(lt),
        Ok(Node::binary(BinaryOp::Geq, age(), Value::Int(3)))
    );
    assert_eq!(
        negate(Node::unary(UnaryOp::IsNull, name())),
        Ok(Node::unary(UnaryOp::IsNotNull, name()))
    );
}

#[test]
fn negation_applies_de_morgan() {
    let node = age_eq(1)
        .or(Node::unary(UnaryOp::IsNull, name()))
        .expect("join");
    let expected = Node::binary(BinaryOp::Neq, age(), Value::Int(1))
        .and(Node::unary(UnaryOp::IsNotNull, name()))
        .expect("join");

    assert_eq!(negate(node), Ok(expected));
}

#[test]
fn operators_without_opposite_refuse_negation() {
    let node = Node::binary(BinaryOp::BeginsWith, name(), Value::from("ab"));

    assert!(matches!(
        negate(node),
        Err(AlgebraError::NotNegatable { .. })
    ));
    assert!(negate(Node::Field(FieldRef::projection("Title"))).is_err());
}

// ----------------------------------------------------------------------
// Binding
// ----------------------------------------------------------------------

#[test]
fn null_equality_becomes_null_check() {
    let eq = Node::binary(BinaryOp::Eq, name(), ValueBinding::param("n"));
    let neq = Node::binary(BinaryOp::Neq, name(), ValueBinding::param("n"));
    let bindings = Bindings::new().with("n", Value::Null);

    assert_eq!(
        bind(&eq, &bindings),
        Ok(Node::unary(UnaryOp::IsNull, name()))
    );
    assert_eq!(
        bind(&neq, &bindings),
        Ok(Node::unary(UnaryOp::IsNotNull, name()))
    );
}

#[test]
fn null_ordering_comparison_is_unsatisfiable() {
    let lt = Node::binary(BinaryOp::Lt, age(), ValueBinding::param("n"));
    let and = lt.clone().and(age_eq(4)).expect("join");

    assert_eq!(bind(&lt, &Bindings::new()), Ok(Node::FALSE));
    assert_eq!(bind(&and, &Bindings::new()), Ok(Node::FALSE));
}

#[test]
fn empty_collection_decides_by_operator() {
    let tags = FieldRef::filter("Tags", ValueType::MultiChoice);
    let bindings = Bindings::new().with("tags", Vec::<String>::new());
    let includes = Node::binary(BinaryOp::Includes, tags.clone(), ValueBinding::param("tags"));
    let excludes = Node::binary(BinaryOp::NotIncludes, tags, ValueBinding::param("tags"));

    assert_eq!(bind(&includes, &bindings), Ok(Node::FALSE));
    assert_eq!(bind(&excludes, &bindings), Ok(Node::TRUE));
}

#[test]
fn collections_need_collection_operators() {
    let node = Node::binary(BinaryOp::Eq, age(), ValueBinding::param("ids"));
    let bindings = Bindings::new().with("ids", vec![1, 2]);

    assert!(matches!(
        bind(&node, &bindings),
        Err(AlgebraError::Binding(BindingError::NotScalar { .. }))
    ));
}

#[test]
fn flags_resolve_to_constants() {
    let flag = Node::LateBound(LateBound::flag("on"));
    let bindings = Bindings::new().with("on", true);

    assert_eq!(bind(&flag, &bindings), Ok(Node::TRUE));
    assert_eq!(
        bind(&negate(flag).expect("negate"), &bindings),
        Ok(Node::FALSE)
    );
}

#[test]
fn default_value_branch_matches_empty_columns() {
    let branch = Node::LateBound(LateBound::DefaultValue {
        field: age(),
        value: ValueBinding::param("age"),
        negated: false,
    });

    assert_eq!(
        bind(&branch, &Bindings::new().with("age", 0)),
        Ok(Node::unary(UnaryOp::IsNull, age()))
    );
    assert_eq!(
        bind(&branch, &Bindings::new().with("age", 7)),
        Ok(Node::FALSE)
    );
    assert_eq!(
        bind(
            &negate(branch).expect("negate"),
            &Bindings::new().with("age", 0)
        ),
        Ok(Node::unary(UnaryOp::IsNotNull, age()))
    );
}

#[test]
fn parameterized_field_names_resolve() {
    let field = FieldRef::filter("col", ValueType::Text).with_name(FieldName::Param("col".into()));
    let node = Node::binary(BinaryOp::Eq, field, Value::from("x"));

    assert_eq!(
        render(&node, &Bindings::new().with("col", "Title"), false),
        Ok(r#"<Eq><FieldRef Name="Title" /><Value Type="Text">x</Value></Eq>"#.to_string())
    );
    assert!(render(&node, &Bindings::new(), false).is_err());
}

#[test]
fn render_time_bindings_override_attached_ones() {
    let node = Node::bound(
        Node::binary(BinaryOp::Eq, age(), ValueBinding::param("x")),
        Bindings::new().with("x", 1),
    );

    assert!(caml(&node).contains(">1</Value>"));
    assert!(
        render(&node, &Bindings::new().with("x", 2), false)
            .expect("render")
            .contains(">2</Value>")
    );
}

// ----------------------------------------------------------------------
// Rendering
// ----------------------------------------------------------------------

#[test]
fn renders_simple_comparison() {
    assert_eq!(
        caml(&age_eq(30)),
        r#"<Eq><FieldRef Name="Age" /><Value Type="Integer">30</Value></Eq>"#
    );
}

#[test]
fn constants_render_as_canonical_clauses() {
    assert_eq!(
        caml(&Node::FALSE),
        r#"<Eq><FieldRef Name="ID" /><Value Type="Counter">0</Value></Eq>"#
    );
    assert_eq!(caml(&Node::TRUE), "");
}

#[test]
fn text_is_escaped() {
    let node = Node::binary(BinaryOp::Contains, name(), Value::from("a<b & \"c\""));

    assert_eq!(
        caml(&node),
        r#"<Contains><FieldRef Name="Name" /><Value Type="Text">a&lt;b &amp; &quot;c&quot;</Value></Contains>"#
    );
}

#[test]
fn member_style_values_expand_right_nested() {
    let tags = FieldRef::filter("Tags", ValueType::MultiChoice);
    let includes = Node::binary(BinaryOp::Includes, tags.clone(), Value::from(vec!["a", "b", "c"]));
    let excludes = Node::binary(BinaryOp::NotIncludes, tags, Value::from(vec!["a", "b"]));

    assert_eq!(
        caml(&includes),
        concat!(
            "<Or>",
            r#"<Includes><FieldRef Name="Tags" /><Value Type="MultiChoice">a</Value></Includes>"#,
            "<Or>",
            r#"<Includes><FieldRef Name="Tags" /><Value Type="MultiChoice">b</Value></Includes>"#,
            r#"<Includes><FieldRef Name="Tags" /><Value Type="MultiChoice">c</Value></Includes>"#,
            "</Or>",
            "</Or>",
        )
    );
    assert!(caml(&excludes).starts_with("<And><NotIncludes>"));
}

#[test]
fn single_member_value_renders_flat() {
    let node = Node::binary(
        BinaryOp::Includes,
        FieldRef::filter("Tags", ValueType::MultiChoice),
        Value::from(vec![Value::Null, Value::from("x")]),
    );

    assert_eq!(
        caml(&node),
        r#"<Includes><FieldRef Name="Tags" /><Value Type="MultiChoice">x</Value></Includes>"#
    );
}

#[test]
fn in_renders_a_values_list() {
    let node = Node::binary(BinaryOp::In, age(), Value::from(vec![1, 2]));

    assert_eq!(
        caml(&node),
        concat!(
            r#"<In><FieldRef Name="Age" /><Values>"#,
            r#"<Value Type="Integer">1</Value><Value Type="Integer">2</Value>"#,
            "</Values></In>",
        )
    );
}

#[test]
fn membership_renders_its_kind() {
    let node = Node::binary(
        BinaryOp::Membership,
        FieldRef::filter("AssignedTo", ValueType::User),
        Value::from("CurrentUserGroups"),
    );

    assert_eq!(
        caml(&node),
        r#"<Membership Type="CurrentUserGroups"><FieldRef Name="AssignedTo" /></Membership>"#
    );
}

#[test]
fn lookup_ids_and_time_values_carry_attributes() {
    let author = Node::binary(
        BinaryOp::Eq,
        FieldRef::lookup_id("Author", ValueType::User),
        Value::Int(7),
    );
    let created = Node::Binary(
        BinaryComparison::new(
            BinaryOp::Gt,
            FieldRef::filter("Created", ValueType::DateTime),
            Value::Text("2024-01-01T00:00:00Z".into()),
        )
        .including_time(true),
    );

    assert_eq!(
        caml(&author),
        r#"<Eq><FieldRef Name="Author" LookupId="TRUE" /><Value Type="Integer">7</Value></Eq>"#
    );
    assert!(caml(&created).contains(r#"<Value Type="DateTime" IncludeTimeValue="TRUE">"#));
}

#[test]
fn composite_query_renders_where_then_order_then_group() {
    let node = age_eq(1)
        .and(Node::Field(FieldRef::order("Title", true)))
        .and_then(|node| node.and(Node::Field(FieldRef::group("Category"))))
        .expect("join");

    assert_eq!(
        caml(&node),
        concat!(
            r#"<Where><Eq><FieldRef Name="Age" /><Value Type="Integer">1</Value></Eq></Where>"#,
            r#"<OrderBy><FieldRef Name="Title" Ascending="FALSE" /></OrderBy>"#,
            r#"<GroupBy Collapse="TRUE"><FieldRef Name="Category" /></GroupBy>"#,
        )
    );
}

#[test]
fn pretty_layout_indents_two_spaces() {
    let node = age_eq(30)
        .and(Node::unary(UnaryOp::IsNull, name()))
        .expect("join");

    assert_eq!(
        render(&node, &Bindings::new(), true).expect("render"),
        [
            "<And>",
            "  <Eq>",
            r#"    <FieldRef Name="Age" />"#,
            r#"    <Value Type="Integer">30</Value>"#,
            "  </Eq>",
            "  <IsNull>",
            r#"    <FieldRef Name="Name" />"#,
            "  </IsNull>",
            "</And>",
        ]
        .join("\n")
    );
}

#[test]
fn view_document_wraps_query_fields_and_limit() {
    let query = age_eq(1).into_query();
    let projection = Collection::of(CollectionKind::Projection, [FieldRef::projection("Title")]);
    let view = ViewDocument {
        query: &query,
        projection: Some(&projection),
        row_limit: Some(2),
    };

    assert_eq!(
        render_view(&view, &Bindings::new(), false).expect("render"),
        concat!(
            "<View><Query>",
            r#"<Where><Eq><FieldRef Name="Age" /><Value Type="Integer">1</Value></Eq></Where>"#,
            "</Query>",
            r#"<ViewFields><FieldRef Name="Title" /></ViewFields>"#,
            "<RowLimit>2</RowLimit>",
            "</View>",
        )
    );
}

#[test]
fn missing_equality_parameters_read_as_null() {
    let node = Node::binary(BinaryOp::Eq, age(), ValueBinding::param("missing"));

    assert_eq!(
        caml(&node),
        r#"<IsNull><FieldRef Name="Age" /></IsNull>"#
    );
}

// ----------------------------------------------------------------------
// Rewriting
// ----------------------------------------------------------------------

struct HideColumn(&'static str);

impl Rewriter for HideColumn {
    type Error = AlgebraError;

    fn comparison(&mut self, node: Node) -> Result<Node, Self::Error> {
        let hidden = match &node {
            Node::Binary(cmp) => cmp.field.name.key() == self.0,
            Node::Unary(cmp) => cmp.field.name.key() == self.0,
            _ => false,
        };

        Ok(if hidden { Node::FALSE } else { node })
    }

    fn collection(&mut self, mut collection: Collection) -> Result<Option<Collection>, Self::Error> {
        collection.retain(|field| field.name.key() != self.0);

        Ok(Some(collection))
    }
}

#[test]
fn rewrites_fold_through_the_combinators() {
    let or = age_eq(1)
        .or(Node::unary(UnaryOp::IsNull, name()))
        .expect("join");
    let and = age_eq(1)
        .and(Node::unary(UnaryOp::IsNull, name()))
        .expect("join");

    assert_eq!(rewrite(or, &mut HideColumn("Name")), Ok(age_eq(1)));
    assert_eq!(rewrite(and, &mut HideColumn("Name")), Ok(Node::FALSE));
}

#[test]
fn rewrites_drop_emptied_collections() {
    let query = Node::Field(FieldRef::order("Name", false))
        .into_query()
        .and(age_eq(2))
        .expect("join");

    let Node::Query(query) = rewrite(query, &mut HideColumn("Name")).expect("rewrite") else {
        panic!("expected a composite query");
    };
    assert!(query.order.is_none());
    assert_eq!(query.filter(), Some(&age_eq(2)));
}

// ----------------------------------------------------------------------
// Properties
// ----------------------------------------------------------------------

const FIELDS: [&str; 4] = ["A", "B", "C", "D"];

fn arb_field() -> impl Strategy<Value = FieldRef> {
    (0..FIELDS.len()).prop_map(|i| FieldRef::filter(FIELDS[i], ValueType::Integer))
}

fn arb_leaf() -> impl Strategy<Value = Node> {
    let binary = (
        prop_oneof![
            Just(BinaryOp::Eq),
            Just(BinaryOp::Neq),
            Just(BinaryOp::Lt),
            Just(BinaryOp::Leq),
            Just(BinaryOp::Gt),
            Just(BinaryOp::Geq),
        ],
        arb_field(),
        -50i64..50,
    )
        .prop_map(|(op, field, value)| Node::binary(op, field, Value::Int(value)));
    let unary = (
        prop_oneof![Just(UnaryOp::IsNull), Just(UnaryOp::IsNotNull)],
        arb_field(),
    )
        .prop_map(|(op, field)| Node::unary(op, field));

    prop_oneof![3 => binary, 1 => unary]
}

fn arb_filter() -> impl Strategy<Value = Node> {
    arb_leaf().prop_recursive(4, 24, 2, |inner| {
        (inner.clone(), inner, any::<bool>()).prop_map(|(left, right, and)| {
            if and {
                left.and(right).expect("filters combine")
            } else {
                left.or(right).expect("filters combine")
            }
        })
    })
}

proptest! {
    #[test]
    fn constants_are_absorbing(node in arb_filter()) {
        prop_assert_eq!(node.clone().and(Node::FALSE), Ok(Node::FALSE));
        prop_assert_eq!(Node::TRUE.or(node.clone()), Ok(Node::TRUE));
        prop_assert_eq!(node.clone().and(Node::TRUE), Ok(node.clone()));
        prop_assert_eq!(node.clone().or(Node::FALSE), Ok(node));
    }

    #[test]
    fn double_negation_is_identity(node in arb_filter()) {
        let twice = negate(node.clone()).and_then(negate);

        prop_assert_eq!(twice, Ok(node));
    }

    #[test]
    fn negation_distributes_de_morgan(left in arb_filter(), right in arb_filter()) {
        let lhs = negate(left.clone().and(right.clone()).expect("join"));
        let rhs = negate(left)
            .and_then(|left| negate(right).and_then(|right| left.or(right)));

        prop_assert_eq!(lhs, rhs);
    }

    #[test]
    fn rendering_is_deterministic(node in arb_filter()) {
        let first = caml(&node);
        let second = caml(&node);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(caml(&Node::not(node.clone())), caml(&negate(node).expect("negate")));
    }
}
