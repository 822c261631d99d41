//! End-to-end method combination over the Root/Sub/Trait scenario hierarchy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use proptest::prelude::*;
use serde_json::json;

use c3mro_core::{
    DeclaredMethod, Hierarchy, HierarchyBuilder, HierarchySource, Linearizer, MethodKey, UnitDecl,
    UnitId,
};
use c3mro_dispatch::{
    reducers, ClassHierarchy, CombinatorConfig, DigestScope, Method, MethodCombinator, Object,
    UnitNameScope, Value,
};

const UNIQ: i64 = 1_700_000_000;

fn tag(name: &'static str) -> Method {
    Method::constant(json!([name]))
}

/// Root's instance method also reports the instance's `uniq` field.
fn root_merge() -> Method {
    Method::new(|instance, _| {
        let uniq = instance
            .and_then(|obj| obj.get("uniq").cloned())
            .unwrap_or(Value::Null);
        Ok(json!(["Root", uniq]))
    })
}

/// Declares `static_merge` and `merge` on a class, or their scoped
/// counterparts on a mixin.
fn both(decl: UnitDecl<Method>, scope: Option<String>, name: &'static str) -> UnitDecl<Method> {
    match scope {
        Some(scope) => decl
            .scoped_method(scope.clone(), "static_merge", tag(name))
            .scoped_method(scope, "merge", tag(name)),
        None => decl.method("static_merge", tag(name)).method("merge", tag(name)),
    }
}

/// Builds the scenario, scoping mixin declarations with `scope_of`.
fn scenario(scope_of: impl Fn(&str) -> String) -> ClassHierarchy {
    let mut b = HierarchyBuilder::new();
    let root = b
        .add(
            UnitDecl::class("Root")
                .method("static_merge", tag("Root"))
                .method("merge", root_merge()),
        )
        .unwrap();
    let sub1 = b.add(UnitDecl::class("Sub1").extends(root)).unwrap();
    b.add(both(UnitDecl::class("Sub1Sub").extends(sub1), None, "Sub1Sub"))
        .unwrap();
    let sub2 = b
        .add(both(UnitDecl::class("Sub2").extends(root), None, "Sub2"))
        .unwrap();

    let trait1 = b
        .add(both(UnitDecl::mixin("Trait1"), Some(scope_of("Trait1")), "Trait1"))
        .unwrap();
    let trait2 = b.add(UnitDecl::mixin("Trait2")).unwrap();
    let sub_trait = b
        .add(both(
            UnitDecl::mixin("SubTrait").uses(trait1),
            Some(scope_of("SubTrait")),
            "SubTrait",
        ))
        .unwrap();

    b.add(both(
        UnitDecl::class("SubWithTrait1").extends(sub2).uses(trait1),
        None,
        "SubWithTrait1",
    ))
    .unwrap();
    let swt2 = b
        .add(UnitDecl::class("SubWithTrait2").extends(sub1).uses(trait2))
        .unwrap();
    b.add(both(
        UnitDecl::class("SubWithTrait3").extends(swt2).uses(sub_trait),
        None,
        "SubWithTrait3",
    ))
    .unwrap();
    b.build()
}

fn by_name(name: &str) -> String {
    name.to_string()
}

fn combinator(
    hierarchy: ClassHierarchy,
    include_mixins: bool,
) -> MethodCombinator<ClassHierarchy, Value> {
    let lin = Arc::new(Linearizer::new(Arc::new(hierarchy)));
    let config = CombinatorConfig::new(json!([]), reducers::concat).include_mixin_methods(include_mixins);
    MethodCombinator::new(lin, config).with_mixin_scope(UnitNameScope)
}

fn instance_of(mc: &MethodCombinator<ClassHierarchy, Value>, unit: &str) -> Object {
    let id = mc.resolver().linearizer().source().lookup(unit).unwrap();
    Object::new(id).with_field("uniq", json!(UNIQ))
}

#[test]
fn literal_end_to_end_scenario() {
    let mc = combinator(scenario(by_name), false);
    assert_eq!(mc.execute("Sub1", "static_merge", None, &[]).unwrap(), json!(["Root"]));
    assert_eq!(
        mc.execute("Sub1Sub", "static_merge", None, &[]).unwrap(),
        json!(["Sub1Sub", "Root"])
    );
    assert_eq!(
        mc.execute("Sub2", "static_merge", None, &[]).unwrap(),
        json!(["Sub2", "Root"])
    );
}

#[test]
fn unit_level_calls_with_mixins() {
    let mc = combinator(scenario(by_name), true);
    let expected: &[(&str, Value)] = &[
        ("Root", json!(["Root"])),
        ("Sub1", json!(["Root"])),
        ("Sub1Sub", json!(["Sub1Sub", "Root"])),
        ("Sub2", json!(["Sub2", "Root"])),
        ("Trait1", json!(["Trait1"])),
        ("Trait2", json!([])),
        ("SubTrait", json!(["SubTrait", "Trait1"])),
        ("SubWithTrait1", json!(["SubWithTrait1", "Trait1", "Sub2", "Root"])),
        ("SubWithTrait2", json!(["Root"])),
        ("SubWithTrait3", json!(["SubWithTrait3", "SubTrait", "Trait1", "Root"])),
    ];
    for (unit, want) in expected {
        let got = mc.execute(*unit, "static_merge", None, &[]).unwrap();
        assert_eq!(&got, want, "static_merge on {unit}");
    }
}

#[test]
fn instance_calls_without_mixins() {
    let mc = combinator(scenario(by_name), false);
    let expected: &[(&str, Value)] = &[
        ("Root", json!(["Root", UNIQ])),
        ("Sub1", json!(["Root", UNIQ])),
        ("Sub1Sub", json!(["Sub1Sub", "Root", UNIQ])),
        ("Sub2", json!(["Sub2", "Root", UNIQ])),
        ("SubWithTrait1", json!(["SubWithTrait1", "Sub2", "Root", UNIQ])),
        ("SubWithTrait2", json!(["Root", UNIQ])),
        ("SubWithTrait3", json!(["SubWithTrait3", "Root", UNIQ])),
    ];
    for (unit, want) in expected {
        let mut obj = instance_of(&mc, unit);
        let got = mc.invoke("merge", &mut obj, &[]).unwrap();
        assert_eq!(&got, want, "merge on {unit}");
    }
}

#[test]
fn instance_calls_with_mixins() {
    let mc = combinator(scenario(by_name), true);
    let expected: &[(&str, Value)] = &[
        ("Root", json!(["Root", UNIQ])),
        ("Sub1", json!(["Root", UNIQ])),
        ("Sub1Sub", json!(["Sub1Sub", "Root", UNIQ])),
        ("Sub2", json!(["Sub2", "Root", UNIQ])),
        ("SubWithTrait1", json!(["SubWithTrait1", "Trait1", "Sub2", "Root", UNIQ])),
        ("SubWithTrait2", json!(["Root", UNIQ])),
        ("SubWithTrait3", json!(["SubWithTrait3", "SubTrait", "Trait1", "Root", UNIQ])),
    ];
    for (unit, want) in expected {
        let mut obj = instance_of(&mc, unit);
        let got = mc.invoke("merge", &mut obj, &[]).unwrap();
        assert_eq!(&got, want, "merge on {unit}");
    }
}

#[test]
fn digest_scoped_declarations() {
    let hierarchy = scenario(DigestScope::scope_for);
    let lin = Arc::new(Linearizer::new(Arc::new(hierarchy)));
    let config = CombinatorConfig::new(json!([]), reducers::concat).include_mixin_methods(true);
    let mc = MethodCombinator::new(Arc::clone(&lin), config.clone()).with_mixin_scope(DigestScope);
    assert_eq!(
        mc.execute("SubWithTrait3", "static_merge", None, &[]).unwrap(),
        json!(["SubWithTrait3", "SubTrait", "Trait1", "Root"])
    );

    // A mismatched strategy finds no mixin methods at all.
    let by_name = MethodCombinator::new(lin, config).with_mixin_scope(UnitNameScope);
    assert_eq!(
        by_name.execute("SubWithTrait3", "static_merge", None, &[]).unwrap(),
        json!(["SubWithTrait3", "Root"])
    );
}

#[test]
fn same_named_mixin_methods_stay_distinct() {
    let mut b = HierarchyBuilder::new();
    let left = b
        .add(UnitDecl::mixin("Left").scoped_method("Left", "m", tag("Left")))
        .unwrap();
    let right = b
        .add(UnitDecl::mixin("Right").scoped_method("Right", "m", tag("Right")))
        .unwrap();
    b.add(UnitDecl::class("Both").uses(left).uses(right)).unwrap();
    let mc = combinator(b.build(), true);

    let set = mc.method_set("Both", "m").unwrap();
    assert_eq!(set.units(), vec![left, right]);
    assert_eq!(mc.execute("Both", "m", None, &[]).unwrap(), json!(["Left", "Right"]));
}

#[test]
fn inherited_only_units_contribute_nothing() {
    let mc = combinator(scenario(by_name), false);
    let set = mc.method_set("Sub1", "static_merge").unwrap();
    let root = mc.resolver().linearizer().source().lookup("Root").unwrap();
    assert_eq!(set.units(), vec![root]);
}

/// Wraps a hierarchy and answers `own_method` the way a reflection facility
/// does: a method is visible on every unit that inherits it, reported with
/// its true declaring owner.
struct Reflective(ClassHierarchy);

impl HierarchySource for Reflective {
    type Method = Method;

    fn contains(&self, unit: UnitId) -> bool {
        self.0.contains(unit)
    }

    fn unit_name(&self, unit: UnitId) -> Option<&str> {
        self.0.unit_name(unit)
    }

    fn lookup(&self, name: &str) -> Option<UnitId> {
        self.0.lookup(name)
    }

    fn superclass(&self, unit: UnitId) -> Option<UnitId> {
        self.0.superclass(unit)
    }

    fn mixins(&self, unit: UnitId) -> &[UnitId] {
        self.0.mixins(unit)
    }

    fn is_mixin(&self, unit: UnitId) -> bool {
        self.0.is_mixin(unit)
    }

    fn own_method(&self, unit: UnitId, key: &MethodKey) -> Option<DeclaredMethod<'_, Method>> {
        let mut current = Some(unit);
        while let Some(id) = current {
            if let Some(found) = self.0.own_method(id, key) {
                return Some(found);
            }
            current = self.0.superclass(id);
        }
        None
    }
}

#[test]
fn inherited_methods_reported_by_the_source_are_not_collected_twice() {
    let reflective = Reflective(scenario(by_name));
    let sub1 = reflective.lookup("Sub1").unwrap();
    let root = reflective.lookup("Root").unwrap();
    // The source claims Sub1 has the method, but owned by Root.
    let seen = reflective.own_method(sub1, &MethodKey::plain("static_merge")).unwrap();
    assert_eq!(seen.owner, root);
    assert!(!reflective.has_own_method(sub1, &MethodKey::plain("static_merge")));

    let lin = Arc::new(Linearizer::new(Arc::new(reflective)));
    let mc = MethodCombinator::new(lin, CombinatorConfig::new(json!([]), reducers::concat));
    assert_eq!(
        mc.execute("Sub1Sub", "static_merge", None, &[]).unwrap(),
        json!(["Sub1Sub", "Root"])
    );
    assert_eq!(mc.execute(sub1, "static_merge", None, &[]).unwrap(), json!(["Root"]));
}

#[test]
fn shared_combinator_across_threads() {
    let mc = Arc::new(combinator(scenario(by_name), true));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mc = Arc::clone(&mc);
            thread::spawn(move || mc.execute("SubWithTrait3", "static_merge", None, &[]).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(
            handle.join().unwrap(),
            json!(["SubWithTrait3", "SubTrait", "Trait1", "Root"])
        );
    }
    assert_eq!(mc.resolver().cached_len(), 1);
}

/// Counts method lookups, slowly enough for racing calls to overlap.
struct CountingLookups {
    inner: ClassHierarchy,
    lookups: AtomicUsize,
}

impl HierarchySource for CountingLookups {
    type Method = Method;

    fn contains(&self, unit: UnitId) -> bool {
        self.inner.contains(unit)
    }

    fn unit_name(&self, unit: UnitId) -> Option<&str> {
        self.inner.unit_name(unit)
    }

    fn lookup(&self, name: &str) -> Option<UnitId> {
        self.inner.lookup(name)
    }

    fn superclass(&self, unit: UnitId) -> Option<UnitId> {
        self.inner.superclass(unit)
    }

    fn mixins(&self, unit: UnitId) -> &[UnitId] {
        self.inner.mixins(unit)
    }

    fn is_mixin(&self, unit: UnitId) -> bool {
        self.inner.is_mixin(unit)
    }

    fn own_method(&self, unit: UnitId, key: &MethodKey) -> Option<DeclaredMethod<'_, Method>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        self.inner.own_method(unit, key)
    }
}

#[test]
fn racing_first_calls_resolve_the_method_set_once() {
    let source = Arc::new(CountingLookups {
        inner: scenario(by_name),
        lookups: AtomicUsize::new(0),
    });
    let lin = Arc::new(Linearizer::new(Arc::clone(&source)));
    let config = CombinatorConfig::new(json!([]), reducers::concat).include_mixin_methods(true);
    let mc = Arc::new(MethodCombinator::new(lin, config).with_mixin_scope(UnitNameScope));

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let mc = Arc::clone(&mc);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                mc.execute("SubWithTrait3", "static_merge", None, &[]).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(
            handle.join().unwrap(),
            json!(["SubWithTrait3", "SubTrait", "Trait1", "Root"])
        );
    }

    // One lookup per unit of the seven-unit ordering, for all eight calls.
    assert_eq!(source.lookups.load(Ordering::SeqCst), 7);
    mc.execute("SubWithTrait3", "static_merge", None, &[]).unwrap();
    assert_eq!(source.lookups.load(Ordering::SeqCst), 7);
}

fn chain(declares: &[bool]) -> Hierarchy<Method> {
    let mut b = HierarchyBuilder::new();
    let mut prev = None;
    for (i, declared) in declares.iter().enumerate() {
        let name = format!("C{i}");
        let mut decl = UnitDecl::class(name.clone());
        if let Some(parent) = prev {
            decl = decl.extends(parent);
        }
        if *declared {
            decl = decl.method("m", Method::constant(json!([name])));
        }
        prev = Some(b.add(decl).unwrap());
    }
    b.build()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn only_declaring_units_are_called_most_specific_first(
        declares in prop::collection::vec(any::<bool>(), 1..10),
    ) {
        let leaf = format!("C{}", declares.len() - 1);
        let mc = combinator(chain(&declares), false);
        let got = mc.execute(leaf.as_str(), "m", None, &[]).unwrap();

        let want: Vec<Value> = declares
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, declared)| **declared)
            .map(|(i, _)| json!(format!("C{i}")))
            .collect();
        prop_assert_eq!(got, Value::Array(want));
    }
}
