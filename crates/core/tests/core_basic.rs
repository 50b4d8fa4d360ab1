use memlayout_core::{printer, version, Registry};

#[test]
fn version_is_non_empty() {
    let v = version();
    assert!(!v.is_empty());
}

/// `base` declares a global, `child` inherits it and adds a function.
#[test]
fn child_lists_inherited_global_before_its_own_function() {
    let registry = Registry::from_source(
        r#"<memory-layouts>
            <version name="base" platform="p">
                <global name="g_foo" address="0x1000"/>
            </version>
            <version name="child" platform="p" inherits-from="base">
                <function name="fn_bar" address="0x2000"/>
            </version>
        </memory-layouts>"#,
    )
    .expect("registry should load");

    let child = registry.get("p", "child").expect("child exists");
    assert_eq!(child.global("g_foo"), Some(0x1000));
    assert_eq!(child.function("fn_bar"), Some(0x2000));
    let names: Vec<&str> = child.offsets.iter().map(|o| o.name()).collect();
    assert_eq!(names, ["g_foo", "fn_bar"]);

    let dump = printer::format(child);
    let global_at = dump.find("0x0000000000001000 g_foo").expect("global line");
    let function_at = dump.find("0x0000000000002000 fn_bar").expect("function line");
    assert!(global_at < function_at, "global should be listed first:\n{dump}");
}
