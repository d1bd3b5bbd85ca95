use serde_json::{Value, json};

use catalog_reconcile::{
    Catalog, CatalogError, Diagnostic, InMemoryCatalog, Predicate, ReconcileConfig, ReconcileError,
    ReconcileSummary, RecordIds, Reconciler,
};

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::from_records(vec![
        json!({"ID": "w-meditations", "Category": "work", "Title": "Meditations", "ISBN": "0398522331"}),
        json!({"ID": "w-walden", "Category": "work", "Title": "Walden", "ISBN": ["9780140449136"]}),
        json!({"ID": "w-letters-a", "Category": "work", "Title": "Letters", "By": "A"}),
        json!({"ID": "w-letters-b", "Category": "work", "Title": "Letters", "By": "B"}),
    ])
    .unwrap()
}

fn run_with(
    catalog: &InMemoryCatalog,
    input: &str,
) -> (Result<ReconcileSummary, ReconcileError>, Vec<Value>, Vec<Diagnostic>) {
    let config = ReconcileConfig::default();
    let reconciler = Reconciler::new(catalog, &config).unwrap();
    let mut output = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let result = reconciler.run(input.as_bytes(), &mut output, &mut diagnostics);
    let text = String::from_utf8(output).unwrap();
    let emitted = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (result, emitted, diagnostics)
}

fn run(input: &str) -> (ReconcileSummary, Vec<Value>, Vec<Diagnostic>) {
    let (result, emitted, diagnostics) = run_with(&catalog(), input);
    (result.unwrap(), emitted, diagnostics)
}

fn contains_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(name, child)| name == key || contains_key(child, key)),
        Value::Array(items) => items.iter().any(|child| contains_key(child, key)),
        _ => false,
    }
}

#[test]
fn concatenated_documents_without_separators_are_split() {
    let input = r#"{"ID":"q-1","Source":{"ISBN":"0-3985-2233-1"}}{"ID":"q-2"}
        {"ID":"q-3","Parts":[{"Source":{"Title":"Walden"}}]}"#;
    let (summary, emitted, _) = run(input);
    assert_eq!(summary.documents_read, 3);
    assert_eq!(summary.documents_emitted, 2);
    assert_eq!(emitted[0]["ID"], json!("q-1"));
    assert_eq!(emitted[0]["Source"]["ID"], json!("w-meditations"));
    assert_eq!(emitted[1]["Parts"][0]["Source"]["ID"], json!("w-walden"));
}

#[test]
fn second_pass_over_output_is_silent() {
    let input = r#"
        {"ID":"q-1","By":"B","Source":{"ISBN":"398522331"},"Refs":[{"Source":{"ID":"w-walden"}}]}
        {"ID":"q-2","Source":{"ISBN":9780140449136}}
    "#;
    let (first, emitted, _) = run(input);
    assert_eq!(first.documents_emitted, 2);

    let round_two: String = emitted
        .iter()
        .map(|doc| serde_json::to_string(doc).unwrap())
        .collect::<Vec<_>>()
        .join("\n");
    let (second, re_emitted, _) = run(&round_two);
    assert_eq!(second.documents_read, 2);
    assert!(re_emitted.is_empty());
}

#[test]
fn numeric_isbn_resolves_through_sequence_valued_catalog_field() {
    let (_, emitted, _) = run(r#"{"ID":"q-2","Source":{"ISBN":9780140449136}}"#);
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0]["Source"]["ID"], json!("w-walden"));
    assert_eq!(emitted[0]["Source"]["ISBN"], json!(9780140449136u64));
}

#[test]
fn documents_without_sources_are_never_emitted() {
    let input = r#"{"ID":"a","Title":"x","Body":{"Text":"..."}}{"ID":"b","Tags":["t"]}"#;
    let (summary, emitted, diagnostics) = run(input);
    assert!(emitted.is_empty());
    assert_eq!(summary.documents_unmodified, 2);
    assert!(diagnostics.iter().all(|d| !d.is_error()));
}

#[test]
fn hyphenated_and_legacy_isbns_resolve_to_the_same_record() {
    let input = r#"{"ID":"a","Source":{"ISBN":"0-3985-2233-1"}}{"ID":"b","Source":{"ISBN":"398522331"}}"#;
    let (_, emitted, _) = run(input);
    assert_eq!(emitted.len(), 2);
    assert_eq!(emitted[0]["Source"]["ID"], emitted[1]["Source"]["ID"]);
}

#[test]
fn dangling_direct_id_does_not_fall_through_to_isbn() {
    let input = r#"{"ID":"a","Source":{"ID":"gone","ISBN":"0398522331"}}"#;
    let (summary, emitted, diagnostics) = run(input);
    assert!(emitted.is_empty());
    assert_eq!(summary.descriptors_unresolved, 1);
    assert!(diagnostics.contains(&Diagnostic::DanglingReference {
        document: "a".into(),
        id: "gone".into()
    }));
    assert!(
        !diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::IsbnMatched { .. } | Diagnostic::IsbnMissing { .. }))
    );
}

#[test]
fn attribution_hint_picks_the_matching_candidate_in_any_store_order() {
    let forward = catalog();
    let reversed = InMemoryCatalog::from_records(vec![
        json!({"ID": "z-letters-b", "Category": "work", "Title": "Letters", "By": "B"}),
        json!({"ID": "a-letters-a", "Category": "work", "Title": "Letters", "By": "A"}),
    ])
    .unwrap();
    let input = r#"{"ID":"q","By":"B","Source":{"Title":"Letters"}}"#;

    let (_, emitted, _) = run_with(&forward, input);
    assert_eq!(emitted[0]["Source"]["ID"], json!("w-letters-b"));

    let (_, emitted, _) = run_with(&reversed, input);
    assert_eq!(emitted[0]["Source"]["ID"], json!("z-letters-b"));
}

#[test]
fn transient_hint_never_reaches_output() {
    let input = r#"
        {"ID":"r","By":"B","Source":{"Title":"Letters"}}
        {"ID":"u","By":"B","Source":{"Title":"Unknown"},"Notes":{"_try_By":"old"}}
        {"ID":"s","By":"B","Source":{"URL":"https://example.org"},"Extra":[{"Source":{"Title":"Nope"}}]}
    "#;
    let (_, emitted, _) = run(input);
    assert_eq!(emitted.len(), 2);
    for doc in &emitted {
        assert!(!contains_key(doc, "_try_By"), "hint leaked into {doc}");
    }
}

#[test]
fn url_descriptors_are_counted_as_skipped() {
    let (summary, emitted, diagnostics) =
        run(r#"{"ID":"s","Source":{"URL":"https://example.org"}}"#);
    assert!(emitted.is_empty());
    assert_eq!(summary.descriptors_skipped, 1);
    assert_eq!(summary.descriptors_unresolved, 0);
    assert!(diagnostics.contains(&Diagnostic::SourceSkipped {
        document: "s".into(),
        path: "Source".into()
    }));
    assert!(diagnostics.iter().all(|d| !d.is_error()));
}

#[test]
fn string_source_aborts_before_later_documents() {
    let input = r#"
        {"ID":"ok","Source":{"ISBN":"0398522331"}}
        {"ID":"bad","Source":"Meditations"}
        {"ID":"later","Source":{"Title":"Walden"}}
    "#;
    let (result, emitted, diagnostics) = run_with(&catalog(), input);
    match result.unwrap_err() {
        ReconcileError::MalformedSource {
            document, path, found,
        } => {
            assert_eq!(document, "bad");
            assert_eq!(path, "Source");
            assert_eq!(found, "a string");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0]["ID"], json!("ok"));
    assert!(!diagnostics.iter().any(|d| d.document() == "later"));
}

#[test]
fn sibling_descriptors_resolve_independently() {
    let input = r#"{"ID":"m","Sources":[
        {"Source":{"Title":"Unknown"}},
        {"Source":{"ISBN":"0398522331"}},
        {"Source":{"ID":"gone"}}
    ]}"#;
    let (summary, emitted, _) = run(input);
    assert_eq!(summary.descriptors_resolved, 1);
    assert_eq!(summary.descriptors_unresolved, 2);
    assert_eq!(
        emitted[0]["Sources"],
        json!([
            {"Source": {"Title": "Unknown"}},
            {"Source": {"ISBN": "0398522331", "ID": "w-meditations"}},
            {"Source": {"ID": "gone"}}
        ])
    );
}

#[test]
fn emitted_documents_keep_original_field_order() {
    let input = r#"{"Zeta":1,"ID":"o","Alpha":{"b":1,"a":2},"Source":{"Title":"Walden","Page":9}}"#;
    let config = ReconcileConfig::default();
    let catalog = catalog();
    let reconciler = Reconciler::new(&catalog, &config).unwrap();
    let mut output = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    reconciler
        .run(input.as_bytes(), &mut output, &mut diagnostics)
        .unwrap();
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "{\"Zeta\":1,\"ID\":\"o\",\"Alpha\":{\"b\":1,\"a\":2},\"Source\":{\"Title\":\"Walden\",\"Page\":9,\"ID\":\"w-walden\"}}\n"
    );
}

#[test]
fn invalid_json_input_is_an_error() {
    let (result, emitted, _) = run_with(&catalog(), r#"{"ID":"a"} {"ID":"#);
    assert!(matches!(result, Err(ReconcileError::Json(_))));
    assert!(emitted.is_empty());
}

#[test]
fn wide_numbers_survive_reemission_verbatim() {
    let input = r#"{"ID":"q","Big":123456789012345678901234,"Ratio":1.50,"Source":{"ISBN":"398522331"}}"#;
    let config = ReconcileConfig::default();
    let catalog = catalog();
    let reconciler = Reconciler::new(&catalog, &config).unwrap();
    let mut output = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    reconciler
        .run(input.as_bytes(), &mut output, &mut diagnostics)
        .unwrap();
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "{\"ID\":\"q\",\"Big\":123456789012345678901234,\"Ratio\":1.50,\"Source\":{\"ISBN\":\"398522331\",\"ID\":\"w-meditations\"}}\n"
    );
}

#[test]
fn nested_descriptors_resolve_at_both_levels() {
    let input = r#"{"ID":"n","By":"B","Source":{"Title":"Letters","Source":{"Title":"Walden"}}}"#;
    let (summary, emitted, _) = run(input);
    assert_eq!(summary.descriptors_resolved, 2);
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0]["Source"]["ID"], json!("w-letters-b"));
    assert_eq!(emitted[0]["Source"]["Source"]["ID"], json!("w-walden"));
    assert!(!contains_key(&emitted[0], "_try_By"));
    assert_eq!(
        emitted[0],
        json!({
            "ID": "n",
            "By": "B",
            "Source": {
                "Title": "Letters",
                "Source": {"Title": "Walden", "ID": "w-walden"},
                "ID": "w-letters-b"
            }
        })
    );
}

/// Catalog whose title lookups fail while every other query is served.
struct TitleOutage(InMemoryCatalog);

impl Catalog for TitleOutage {
    fn query(&self, predicates: &[Predicate]) -> Result<RecordIds<'_>, CatalogError> {
        if predicates.iter().any(|p| p.field() == "Title") {
            return Err(CatalogError::Unavailable("down".into()));
        }
        self.0.query(predicates)
    }

    fn get(&self, id: &str) -> Result<Option<serde_json::Value>, CatalogError> {
        self.0.get(id)
    }
}

#[test]
fn catalog_failure_aborts_after_reporting() {
    let catalog = TitleOutage(catalog());
    let config = ReconcileConfig::default();
    let reconciler = Reconciler::new(&catalog, &config).unwrap();
    let input = r#"
        {"ID":"ok","Source":{"ISBN":"0398522331"}}
        {"ID":"q","Source":{"Title":"Walden"}}
        {"ID":"later","Source":{"ISBN":"0398522331"}}
    "#;
    let mut output = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let result = reconciler.run(input.as_bytes(), &mut output, &mut diagnostics);

    assert!(matches!(
        result,
        Err(ReconcileError::Catalog(CatalogError::Unavailable(_)))
    ));
    assert!(diagnostics.contains(&Diagnostic::CatalogFailure {
        document: "q".into(),
        message: "catalog is unavailable: down".into()
    }));
    assert!(!diagnostics.iter().any(|d| d.document() == "later"));
    let text = String::from_utf8(output).unwrap();
    let emitted: Vec<Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0]["ID"], json!("ok"));
}
