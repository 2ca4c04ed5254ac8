//! End-to-end analysis of model dumps.

use std::fs;
use std::path::{Path, PathBuf};

use celestecheck::config::{Config, FrameworkNames, RuleOverride};
use celestecheck::detect::{DiagnosticId, Runner, SuppressionType};
use celestecheck::model::{AttributeArgument, FrameworkStubs, MethodSpec, Program, ProgramBuilder};

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

/// Copy the hooks fixture into a temp dir, rewriting the source with `edit`.
fn hooks_fixture(edit: impl Fn(&str) -> String) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let source = fs::read_to_string(testdata("hooks/Hooks.cs")).unwrap();
    fs::write(dir.path().join("Hooks.cs"), edit(&source)).unwrap();
    fs::copy(
        testdata("hooks/Hooks.model.json"),
        dir.path().join("Hooks.model.json"),
    )
    .unwrap();
    dir
}

#[test]
fn test_hooks_fixture_reports_instance_il_hook() {
    let program = Program::load(&testdata("hooks/Hooks.model.json")).unwrap();
    let result = Runner::new(Config::default())
        .unwrap()
        .base_dir(testdata("hooks"))
        .run(&program);

    assert_eq!(result.models, 1);
    assert_eq!(result.diagnostics.len(), 1);
    let d = &result.diagnostics[0];
    assert_eq!(d.id, DiagnosticId::HooksShouldBeStatic);
    assert_eq!(d.file(), "Hooks.cs");
    assert_eq!(d.line(), 12);
    assert_eq!(d.message, "Hook 'PatchUpdate' should be static");
    assert!(result.suppressed.is_empty());
}

#[test]
fn test_line_suppression_in_source() {
    let dir = hooks_fixture(|source| {
        source.replace(
            "private void PatchUpdate(ILContext il)",
            "private void PatchUpdate(ILContext il) // celestecheck:ignore HooksShouldBeStatic - detached in Unload",
        )
    });
    let program = Program::load(&dir.path().join("Hooks.model.json")).unwrap();
    let result = Runner::new(Config::default())
        .unwrap()
        .base_dir(dir.path())
        .run(&program);

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.suppressed_count(), 1);
    let suppression = &result.suppressed[0].suppression;
    assert_eq!(suppression.suppression_type, SuppressionType::Line);
    assert_eq!(suppression.reason, "detached in Unload");
}

#[test]
fn test_suppression_for_other_rule_does_not_apply() {
    let dir = hooks_fixture(|source| {
        source.replace(
            "private void PatchUpdate(ILContext il)",
            "private void PatchUpdate(ILContext il) // celestecheck:ignore CL0003",
        )
    });
    let program = Program::load(&dir.path().join("Hooks.model.json")).unwrap();
    let result = Runner::new(Config::default())
        .unwrap()
        .base_dir(dir.path())
        .run(&program);

    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.suppressed.is_empty());
}

#[test]
fn test_excluded_paths_and_disabled_rules() {
    let program = Program::load(&testdata("hooks/Hooks.model.json")).unwrap();

    let config = Config {
        excluded_paths: vec!["Hooks.cs".to_string()],
        ..Config::default()
    };
    let result = Runner::new(config).unwrap().run(&program);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.excluded, 1);

    let mut config = Config::default();
    config.rules.insert(
        "CL0004".to_string(),
        RuleOverride {
            enabled: Some(false),
            severity: None,
        },
    );
    let result = Runner::new(config).unwrap().run(&program);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.excluded, 0);
}

#[test]
fn test_builder_dump_loads_with_same_diagnostics() {
    let mut b = ProgramBuilder::new("ExampleMod");
    let fw = FrameworkStubs::install(&mut b, &FrameworkNames::default());
    b.file("Entities/Spinner.cs");
    let spinner = b.class("Example.Spinner", Some(fw.entity));
    b.attribute(
        spinner,
        fw.custom_entity_attribute,
        vec![AttributeArgument::String("Example/Spinner".into())],
    );
    b.implicit_constructor(spinner);

    b.file("Hooks.cs");
    let hooks = b.class("Example.Hooks", None);
    let cursor = b.ident("cursor");
    let callee = b.member(cursor, "Remove", None);
    let remove = fw.cursor_method(&mut b, "Remove");
    let call = b.call(callee, remove, vec![], vec![]);
    let stmt = b.expr_stmt(call);
    let body = b.block(vec![stmt]);
    let spec = MethodSpec::new("Patch")
        .modifiers(&["private", "static"])
        .param("il", fw.il_context);
    b.method(hooks, spec, Some(body));
    let program = b.finish();

    let runner = Runner::new(Config::default()).unwrap();
    let expected = runner.analyze(&program);
    let mut codes: Vec<_> = expected.iter().map(|d| d.id).collect();
    codes.sort();
    assert_eq!(
        codes,
        vec![
            DiagnosticId::DontUseCursorRemove,
            DiagnosticId::CustomEntityWithNoValidCtor
        ]
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ExampleMod.model.json");
    fs::write(&path, program.to_json().unwrap()).unwrap();
    let loaded = Program::load(&path).unwrap();
    assert_eq!(runner.analyze(&loaded), expected);
}

#[test]
fn test_dangling_reference_rejected() {
    let json = r#"{
        "assembly": "Broken",
        "files": [{ "path": "A.cs" }],
        "nodes": [
            { "file": 0, "span": { "start_byte": 0, "end_byte": 1, "start_line": 1, "start_col": 1 },
              "kind": "identifier", "name": "x", "symbol": { "kind": "method", "id": 7 } }
        ]
    }"#;
    let err = Program::from_json_str(json).unwrap_err();
    assert!(err.to_string().contains("method"));
}

#[test]
fn test_containing_type_cycle_rejected() {
    let json = r#"{
        "assembly": "Broken",
        "types": [
            { "name": "Outer", "assembly": "Broken", "containing_type": 1,
              "attributes": [{ "class": 1 }] },
            { "name": "Inner", "assembly": "Broken", "containing_type": 0 }
        ]
    }"#;
    let err = Program::from_json_str(json).unwrap_err();
    assert!(err.to_string().contains("its own containing type"));
}
