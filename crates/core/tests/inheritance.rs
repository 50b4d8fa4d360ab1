use memlayout_core::{OffsetKind, Registry};

fn load(source: &str) -> Registry {
    Registry::from_source(source).expect("registry should load")
}

fn addresses(registry: &Registry, label: &str) -> Vec<(String, u64)> {
    registry
        .get("p", label)
        .expect("version exists")
        .offsets
        .iter()
        .map(|offset| match offset {
            OffsetKind::GlobalAddress { name, address }
            | OffsetKind::FunctionAddress { name, address } => (name.clone(), *address),
            other => panic!("unexpected offset {other:?}"),
        })
        .collect()
}

#[test]
fn root_version_is_its_own_declarations_in_order() {
    let registry = load(
        r#"<l><version name="a" platform="p">
            <function name="z" address="3"/>
            <global name="m" address="1"/>
            <global name="b" address="2"/>
        </version></l>"#,
    );
    assert_eq!(
        addresses(&registry, "a"),
        [("z".to_string(), 3), ("m".to_string(), 1), ("b".to_string(), 2)]
    );
    assert!(registry.get("p", "a").expect("a").lineage.is_empty());
}

#[test]
fn overrides_keep_ancestor_position_and_additions_append() {
    let registry = load(
        r#"<l>
            <version name="a" platform="p">
                <global name="one" address="1"/>
                <global name="two" address="2"/>
                <global name="three" address="3"/>
            </version>
            <version name="b" platform="p" inherits-from="a">
                <global name="four" address="4"/>
                <global name="two" address="22"/>
                <global name="five" address="5"/>
            </version>
        </l>"#,
    );
    let expected: Vec<(String, u64)> =
        [("one", 1), ("two", 22), ("three", 3), ("four", 4), ("five", 5)]
            .into_iter()
            .map(|(n, a)| (n.to_string(), a))
            .collect();
    assert_eq!(addresses(&registry, "b"), expected);
    // The ancestor itself is untouched.
    assert_eq!(registry.get("p", "a").expect("a").global("two"), Some(2));
}

#[test]
fn redeclared_class_field_takes_the_later_offset() {
    let registry = load(
        r#"<l><version name="a" platform="p">
            <class name="unit"><field name="pos" offset="0x10"/><field name="hp" offset="0x20"/></class>
            <class name="unit"><field name="hp" offset="0x24"/><field name="mp" offset="0x28"/></class>
        </version></l>"#,
    );
    let unit = registry.get("p", "a").expect("a").class("unit").cloned().expect("class");
    let OffsetKind::ClassLayout { fields, .. } = unit else {
        panic!("expected a class layout");
    };
    let fields: Vec<(&str, u64)> = fields.iter().map(|(n, o)| (n.as_str(), *o)).collect();
    assert_eq!(fields, [("pos", 0x10), ("hp", 0x24), ("mp", 0x28)]);
}

#[test]
fn class_layouts_merge_across_inheritance() {
    let registry = load(
        r#"<l>
            <version name="a" platform="p">
                <class name="unit" vtable="0x100"><field name="pos" offset="0x10"/></class>
            </version>
            <version name="b" platform="p" inherits-from="a">
                <class name="unit"><field name="mood" offset="0x40"/></class>
            </version>
        </l>"#,
    );
    match registry.get("p", "b").expect("b").class("unit") {
        Some(OffsetKind::ClassLayout { vtable, fields, .. }) => {
            assert_eq!(*vtable, Some(0x100));
            assert_eq!(fields.keys().map(String::as_str).collect::<Vec<_>>(), ["pos", "mood"]);
        }
        other => panic!("expected class layout, got {other:?}"),
    }
}

#[test]
fn shared_ancestor_is_resolved_once_for_every_child() {
    let registry = load(
        r#"<l>
            <version name="left" platform="p" inherits-from="base"><global name="l" address="1"/></version>
            <version name="base" platform="p"><global name="g" address="9"/></version>
            <version name="right" platform="p" inherits-from="base"><global name="r" address="2"/></version>
            <version name="leaf" platform="p" inherits-from="right"/>
        </l>"#,
    );
    let labels: Vec<&str> = registry.all().iter().map(|v| v.label()).collect();
    assert_eq!(labels, ["left", "base", "right", "leaf"], "document order is kept");
    assert_eq!(registry.get("p", "leaf").expect("leaf").lineage, ["right", "base"]);
    assert_eq!(
        addresses(&registry, "leaf"),
        [("g".to_string(), 9), ("r".to_string(), 2)]
    );
    assert_eq!(
        addresses(&registry, "left"),
        [("g".to_string(), 9), ("l".to_string(), 1)]
    );
}

#[test]
fn same_label_on_two_platforms_inherits_within_its_own_platform() {
    let registry = Registry::from_source(
        r#"<l>
            <version name="1.0" platform="windows"><global name="g" address="0x10"/></version>
            <version name="1.0" platform="linux"><global name="g" address="0x20"/></version>
            <version name="1.1" platform="linux" inherits-from="1.0"/>
        </l>"#,
    )
    .expect("load");
    assert_eq!(registry.get("linux", "1.1").expect("1.1").global("g"), Some(0x20));
}
