use chrono::NaiveDate;
use listq::prelude::*;
use std::cell::RefCell;
use uuid::Uuid;

fn registry() -> ModelRegistry {
    ModelRegistry::new().with(
        EntityModel::new("Tasks")
            .content_type("0x0108")
            .field(FieldModel::new("Id", ValueType::Counter).column("ID"))
            .field(FieldModel::new("Title", ValueType::Text).nullable())
            .field(FieldModel::new("Priority", ValueType::Integer))
            .field(FieldModel::new("Due", ValueType::DateTime).nullable())
            .field(FieldModel::new("Assignee", ValueType::User).nullable())
            .field(FieldModel::new("Key", ValueType::Guid))
            .field(FieldModel::new("Done", ValueType::Boolean)),
    )
}

fn engine() -> Engine<ModelRegistry> {
    Engine::new(registry(), EngineConfig::default())
}

fn tasks() -> Query {
    Query::over("Tasks")
}

fn context() -> QueryContext {
    QueryContext::new("Tasks")
}

fn view(engine: &Engine<ModelRegistry>, query: impl Into<QueryExpr>, args: &Bindings) -> String {
    engine
        .render(&query.into(), args, &context())
        .expect("render")
        .expect("satisfiable")
}

///
/// Store
/// In-memory collaborator replaying canned rows.
///

struct Store {
    rows: Vec<&'static str>,
    seen: RefCell<Vec<ExecutionRequest>>,
}

impl Store {
    fn new(rows: Vec<&'static str>) -> Self {
        Self {
            rows,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl Executor for Store {
    type Row = &'static str;
    type Error = std::convert::Infallible;

    fn execute(&self, request: &ExecutionRequest) -> Result<Vec<&'static str>, Self::Error> {
        self.seen.borrow_mut().push(request.clone());
        let limit = request
            .window
            .limit
            .map_or(self.rows.len(), |limit| limit as usize);

        Ok(self
            .rows
            .iter()
            .skip(request.window.offset as usize)
            .take(limit)
            .copied()
            .collect())
    }
}

#[test]
fn fluent_query_renders_a_complete_view() {
    let query = tasks()
        .filter(field("Priority").ge(2).and(field("Title").starts_with("Fix")))
        .order_by_desc(field("Due"))
        .take(10);

    assert_eq!(
        view(&engine(), query, &Bindings::new()),
        concat!(
            "<View><Query><Where><And>",
            r#"<Geq><FieldRef Name="Priority" /><Value Type="Integer">2</Value></Geq>"#,
            r#"<BeginsWith><FieldRef Name="Title" /><Value Type="Text">Fix</Value></BeginsWith>"#,
            "</And></Where>",
            r#"<OrderBy><FieldRef Name="Due" Ascending="FALSE" /></OrderBy>"#,
            "</Query><RowLimit>10</RowLimit></View>",
        )
    );
}

#[test]
fn date_and_guid_values_use_wire_formats() {
    let due = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|date| date.and_hms_opt(9, 30, 0))
        .expect("date");
    let key = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);

    let rendered = view(
        &engine(),
        tasks().filter(field("Due").lt(arg("due")).and(field("Key").eq(arg("key")))),
        &Bindings::new().with("due", due).with("key", key),
    );

    assert!(
        rendered.contains(
            r#"<Value Type="DateTime" IncludeTimeValue="TRUE">2024-03-01T09:30:00Z</Value>"#
        ),
        "{rendered}"
    );
    assert!(
        rendered.contains(r#"<Value Type="Guid">01234567-89ab-cdef-0123-456789abcdef</Value>"#),
        "{rendered}"
    );
}

#[test]
fn repeated_shapes_hit_the_cache() {
    let engine = engine();

    for priority in [1, 2, 3] {
        let rendered = view(
            &engine,
            tasks().filter(field("Priority").gt(priority)),
            &Bindings::new(),
        );
        assert!(rendered.contains(&format!(">{priority}</Value>")), "{rendered}");
    }

    let stats = engine.stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (2, 1, 1));

    engine.clear_cache();
    assert_eq!(engine.stats().size, 0);
}

#[test]
fn terminal_modes_shape_store_rows() {
    let engine = engine();
    let store = Store::new(vec!["a", "b", "c"]);
    let run = |query: QueryExpr| {
        engine.execute(&store, &query, &Bindings::new(), &context())
    };

    assert_eq!(
        run(tasks().skip(1).build()).expect("select"),
        QueryOutput::Rows(vec!["b", "c"])
    );
    assert_eq!(
        run(tasks().first(None)).expect("first"),
        QueryOutput::Row(Some("a"))
    );
    assert_eq!(
        run(tasks().element_at(2)).expect("element_at"),
        QueryOutput::Row(Some("c"))
    );
    assert_eq!(
        run(tasks().take(2).count(None)).expect("count"),
        QueryOutput::Count(2)
    );

    let err = run(tasks().single(None)).expect_err("more than one");
    assert_eq!(Error::from(err).kind, ErrorKind::Execution);

    let windows: Vec<Option<u32>> = store
        .seen
        .borrow()
        .iter()
        .map(|request| request.window.limit)
        .collect();
    assert_eq!(windows, [None, Some(1), Some(3), Some(2), Some(2)]);
}

#[test]
fn all_asks_for_a_counterexample() {
    let engine = engine();
    let store = Store::new(Vec::new());

    let output = engine
        .execute(
            &store,
            &tasks().all(field("Done").eq(true)),
            &Bindings::new(),
            &context(),
        )
        .expect("all");

    assert_eq!(output, QueryOutput::Bool(true));
    let seen = store.seen.borrow();
    assert_eq!(seen[0].window.limit, Some(1));
    assert!(seen[0].view.contains("<Neq>"), "{}", seen[0].view);
}

#[test]
fn unsupported_queries_surface_as_public_errors() {
    let engine = engine();

    let err = engine
        .prepare(
            &tasks().filter(field("Title").eq(field("Assignee"))).build(),
            &Bindings::new(),
        )
        .expect_err("field comparison");
    let err = Error::from(err);

    assert_eq!(err.kind, ErrorKind::Unsupported);
    assert!(err.to_string().starts_with("unsupported: "), "{err}");
}

#[test]
fn public_errors_serialize() {
    let err = Error::new(ErrorKind::Binding, "binding 'n' resolved to null");

    let json = serde_json::to_string(&err).expect("serialize");
    let back: Error = serde_json::from_str(&json).expect("parse");

    assert_eq!(back, err);
}

#[test]
fn config_loads_from_json() {
    let config: EngineConfig =
        serde_json::from_str(r#"{ "pretty": true, "filters": { "empty_in": false } }"#)
            .expect("parse");
    let engine = Engine::new(registry(), config);

    let rendered = view(&engine, tasks().filter(field("Priority").gt(1)), &Bindings::new());
    assert!(rendered.contains('\n'));
    assert_eq!(engine.pipeline().enabled(), ["allow_list", "deleted_terms"]);
}

#[test]
fn version_is_exported() {
    assert!(!listq::VERSION.is_empty());
}
