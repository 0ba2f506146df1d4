use super::*;
use crate::{
    config::{CacheConfig, FilterConfig},
    error::ErrorClass,
    expr::{Query, arg, field},
    model::ModelRegistry,
    test_fixtures::registry,
    value::Value,
};
use std::cell::Cell;

fn engine() -> Engine<ModelRegistry> {
    Engine::new(registry(), EngineConfig::default())
}

fn engine_with(config: EngineConfig) -> Engine<ModelRegistry> {
    Engine::new(registry(), config)
}

fn people() -> Query {
    Query::over("People")
}

fn context() -> QueryContext {
    QueryContext::new("People")
}

fn render(engine: &Engine<ModelRegistry>, query: impl Into<QueryExpr>, args: &Bindings) -> Option<String> {
    engine
        .render(&query.into(), args, &context())
        .expect("render")
}

///
/// Counter
///

struct Counter {
    calls: Cell<usize>,
}

impl Executor for Counter {
    type Row = &'static str;
    type Error = String;

    fn execute(&self, _request: &ExecutionRequest) -> Result<Vec<&'static str>, String> {
        self.calls.set(self.calls.get() + 1);
        Ok(vec!["ann"])
    }
}

#[test]
fn engine_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Engine<ModelRegistry>>();

    let engine = engine();
    std::thread::scope(|scope| {
        for age in 0..4 {
            let engine = &engine;
            scope.spawn(move || {
                let query = people().filter(field("Age").gt(age)).build();
                engine
                    .render(&query, &Bindings::new(), &context())
                    .expect("render");
            });
        }
    });

    let stats = engine.stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hits + stats.misses, 4);
}

#[test]
fn default_branches_follow_the_bound_value() {
    let engine = engine();

    assert_eq!(
        render(&engine, people().filter(field("Age").eq(0)), &Bindings::new()).as_deref(),
        Some(concat!(
            "<View><Query><Where><Or>",
            r#"<Eq><FieldRef Name="Age" /><Value Type="Integer">0</Value></Eq>"#,
            r#"<IsNull><FieldRef Name="Age" /></IsNull>"#,
            "</Or></Where></Query></View>",
        ))
    );
    assert_eq!(
        render(&engine, people().filter(field("Age").eq(5)), &Bindings::new()).as_deref(),
        Some(concat!(
            "<View><Query><Where>",
            r#"<Eq><FieldRef Name="Age" /><Value Type="Integer">5</Value></Eq>"#,
            "</Where></Query></View>",
        ))
    );
    assert_eq!(engine.stats().hits, 1);
}

#[test]
fn branches_can_be_switched_off() {
    let engine = engine_with(EngineConfig {
        default_value_branches: false,
        ..EngineConfig::default()
    });

    let view = render(&engine, people().filter(field("Age").eq(0)), &Bindings::new())
        .expect("view");
    assert!(!view.contains("IsNull"), "{view}");
}

#[test]
fn pretty_rendering_indents() {
    let engine = engine_with(EngineConfig {
        pretty: true,
        ..EngineConfig::default()
    });

    let view = render(&engine, people().filter(field("Age").gt(1)), &Bindings::new())
        .expect("view");
    assert!(view.starts_with("<View>\n  <Query>"), "{view}");
}

#[test]
fn disabled_cache_keeps_nothing() {
    let engine = engine_with(EngineConfig {
        cache: CacheConfig { enabled: false },
        ..EngineConfig::default()
    });

    render(&engine, people().take(2), &Bindings::new());
    render(&engine, people().take(2), &Bindings::new());

    assert_eq!(engine.stats().size, 0);
    assert_eq!(engine.stats().hits, 0);
}

#[test]
fn allow_list_can_make_a_query_unsatisfiable() {
    let engine = engine();
    let query = people().filter(field("Name").eq("x")).build();
    let context = context().with_allowed_columns(["ID", "Age"]);

    assert_eq!(engine.render(&query, &Bindings::new(), &context), Ok(None));

    let engine = engine_with(EngineConfig {
        filters: FilterConfig {
            allow_list: false,
            ..FilterConfig::default()
        },
        ..EngineConfig::default()
    });
    let view = engine
        .render(&query, &Bindings::new(), &context)
        .expect("render")
        .expect("view");
    assert!(view.contains(r#"<FieldRef Name="Name" />"#), "{view}");
}

#[test]
fn content_type_narrowing_survives_the_allow_list() {
    let engine = engine();
    let query = people()
        .of_type("Employees")
        .filter(field("Age").ge(18))
        .build();
    let context = context().with_allowed_columns(["ID", "Age", "Name"]);

    let view = engine
        .render(&query, &Bindings::new(), &context)
        .expect("render")
        .expect("view");

    assert!(
        view.contains(r#"<Geq><FieldRef Name="Age" /><Value Type="Integer">18</Value></Geq>"#),
        "{view}"
    );
    assert!(
        view.contains(r#"<BeginsWith><FieldRef Name="ContentTypeId" />"#),
        "{view}"
    );
    assert!(view.contains(">0x0100A101</Value></BeginsWith>"), "{view}");
}

#[test]
fn null_taxonomy_check_includes_deleted_terms() {
    let engine = engine();
    let query = people().filter(field("Region").eq(arg("region"))).build();
    let context = context().with_deleted_terms("Region", vec![12]);

    let view = engine
        .render(
            &query,
            &Bindings::new().with("region", Value::Null),
            &context,
        )
        .expect("render")
        .expect("view");

    assert!(
        view.starts_with(r#"<View><Query><Where><Or><IsNull><FieldRef Name="Region" /></IsNull><Eq><FieldRef Name="Region" LookupId="TRUE" />"#),
        "{view}"
    );
    assert!(view.contains(">12</Value></Eq></Or>"), "{view}");
}

#[test]
fn empty_membership_skips_the_store() {
    let engine = engine();
    let executor = Counter {
        calls: Cell::new(0),
    };
    let query = people().filter(arg("names").contains(field("Name"))).build();

    let empty = engine
        .execute(
            &executor,
            &query,
            &Bindings::new().with("names", Value::List(Vec::new())),
            &context(),
        )
        .expect("execute");
    assert_eq!(empty, QueryOutput::Rows(Vec::new()));
    assert_eq!(executor.calls.get(), 0);

    let found = engine
        .execute(
            &executor,
            &query,
            &Bindings::new().with("names", Value::List(vec![Value::from("ann")])),
            &context(),
        )
        .expect("execute");
    assert_eq!(found, QueryOutput::Rows(vec!["ann"]));
    assert_eq!(executor.calls.get(), 1);
}

#[test]
fn errors_are_classified() {
    let engine = engine();

    let unknown = engine
        .prepare(&Query::over("Missing").build(), &Bindings::new())
        .expect_err("unknown entity");
    assert_eq!(unknown.class(), ErrorClass::Unsupported);

    let mismatch = engine
        .plan(
            &people().take(arg("n")).build(),
            &Bindings::new().with("n", "ten"),
            &context(),
        )
        .expect_err("type mismatch");
    assert_eq!(mismatch.class(), ErrorClass::Binding);
    assert!(mismatch.display_with_class().starts_with("binding:"));

    let last = engine
        .prepare(&people().last(None), &Bindings::new())
        .expect_err("last");
    assert_eq!(last.class(), ErrorClass::Unsupported);

    let negated_prefix = engine
        .prepare(
            &people().filter(!field("Name").starts_with("A")).build(),
            &Bindings::new(),
        )
        .expect_err("prefix match has no negation");
    assert_eq!(negated_prefix.class(), ErrorClass::Unsupported);
}

#[test]
fn translator_follows_the_config() {
    let engine = engine_with(EngineConfig {
        default_value_branches: false,
        ..EngineConfig::default()
    });

    let translated = engine
        .translator()
        .translate(&people().filter(field("Age").eq(0)).build())
        .expect("translate");

    assert!(matches!(
        translated.filter(),
        Some(crate::algebra::Node::Binary(_))
    ));
}
