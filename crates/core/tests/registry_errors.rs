use memlayout_core::{Registry, RegistryError, SchemaError, VersionId};

#[test]
fn three_entry_cycle_is_reported_without_looping() {
    let err = Registry::from_source(
        r#"<l>
            <version name="A" platform="p" inherits-from="B"/>
            <version name="B" platform="p" inherits-from="C"/>
            <version name="C" platform="p" inherits-from="A"/>
        </l>"#,
    )
    .unwrap_err();

    let RegistryError::Cycle { path } = &err else {
        panic!("expected a cycle error, got {err:?}");
    };
    let mut labels: Vec<&str> = path.iter().map(|id| id.label.as_str()).collect();
    assert_eq!(labels.len(), 3);
    // Any rotation of A -> B -> C is acceptable.
    while labels[0] != "A" {
        labels.rotate_left(1);
    }
    assert_eq!(labels, ["A", "B", "C"]);
}

#[test]
fn dangling_reference_names_the_missing_target() {
    let err = Registry::from_source(
        r#"<l><version name="child" platform="p" inherits-from="ghost"/></l>"#,
    )
    .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DanglingReference {
            version: VersionId::new("p", "child"),
            target: "ghost".into(),
        }
    );
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn ancestor_on_another_platform_is_a_schema_error() {
    let err = Registry::from_source(
        r#"<l>
            <version name="base" platform="windows"/>
            <version name="child" platform="linux" inherits-from="base"/>
        </l>"#,
    )
    .unwrap_err();
    assert!(
        matches!(
            err,
            RegistryError::Schema(SchemaError::PlatformMismatch { ref ancestor_platform, .. })
                if ancestor_platform == "windows"
        ),
        "got {err:?}"
    );
}

#[test]
fn duplicate_identity_fails_the_whole_load() {
    let err = Registry::from_source(
        r#"<l><version name="a" platform="p"/><version name="a" platform="p"/></l>"#,
    )
    .unwrap_err();
    assert_eq!(
        err,
        RegistryError::Schema(SchemaError::DuplicateVersion { id: VersionId::new("p", "a") })
    );
}

#[test]
fn missing_platform_is_not_inherited() {
    let err = Registry::from_source(
        r#"<l>
            <version name="base" platform="p"/>
            <version name="child" inherits-from="base"/>
        </l>"#,
    )
    .unwrap_err();
    assert!(
        matches!(err, RegistryError::Schema(SchemaError::MissingAttribute { attribute: "platform", .. })),
        "got {err:?}"
    );
}

#[test]
fn malformed_markup_surfaces_position() {
    let err = Registry::from_source("<l>\n<version name=\"a\" platform=\"p\">\n</l>").unwrap_err();
    let RegistryError::Parse(parse) = &err else {
        panic!("expected a parse error, got {err:?}");
    };
    assert_eq!(parse.line, 3);
    assert!(err.to_string().contains("line 3, column 1"), "unexpected message: {err}");
}

#[test]
fn lookup_of_unknown_version_is_not_found() {
    let registry =
        Registry::from_source(r#"<l><version name="a" platform="p"/></l>"#).expect("load");
    assert!(matches!(registry.get("p", "b"), Err(RegistryError::NotFound { .. })));
    assert!(matches!(registry.get("q", "a"), Err(RegistryError::NotFound { .. })));
}

#[test]
fn deeply_nested_markup_is_a_parse_error() {
    let source = format!(
        r#"<l><version name="v" platform="p">{}{}</version></l>"#,
        "<x>".repeat(10_000),
        "</x>".repeat(10_000)
    );
    let mut registry = Registry::new();
    let err = registry.load_all(&source).unwrap_err();
    assert!(
        matches!(&err, RegistryError::Parse(parse) if parse.message.contains("nesting too deep")),
        "got {err:?}"
    );
    assert!(registry.is_empty());
}

#[test]
fn repeated_version_with_its_fingerprint_is_a_duplicate_identity() {
    let digest = "0f".repeat(32);
    let source = format!(
        r#"<l>
            <version name="1.0" platform="windows" sha256="{digest}"/>
            <version name="1.0" platform="windows" sha256="{digest}"/>
        </l>"#
    );
    let err = Registry::from_source(&source).unwrap_err();
    assert_eq!(
        err,
        RegistryError::Schema(SchemaError::DuplicateVersion { id: VersionId::new("windows", "1.0") })
    );
}
