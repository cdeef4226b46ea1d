//! End-to-end merge scenarios against the in-memory store.

use std::collections::BTreeSet;

use crate::{
  MergeError, check_merge,
  family::{ChildRef, ChildRelation, Family, FamilyRelation},
  id::{EventId, FamilyId, PersonId, RecordId},
  memory::MemoryStore,
  merge,
  person::{Gender, Name, Person},
  report::{FamilyMerge, TargetLink},
  value::EventRef,
};

// ─── Fixture builder ─────────────────────────────────────────────────────────

/// Builds a store whose back-references are consistent by construction.
#[derive(Default)]
struct Tree {
  store:    MemoryStore,
  persons:  usize,
  families: usize,
}

impl Tree {
  fn person(&mut self, given: &str, gender: Gender) -> PersonId {
    self.persons += 1;
    let p = Person::new(format!("I{:04}", self.persons), Name::new(given, "Doe"))
      .with_gender(gender);
    let id = p.id;
    self.store.put_person(p);
    id
  }

  fn family(
    &mut self,
    father: Option<PersonId>,
    mother: Option<PersonId>,
    children: &[PersonId],
  ) -> FamilyId {
    self.families += 1;
    let mut f = Family::new(format!("F{:04}", self.families), father, mother);
    f.children = children.iter().copied().map(ChildRef::birth).collect();
    let id = f.id;
    for parent in [father, mother].into_iter().flatten() {
      self.person_mut(parent).spouse_families.insert(id);
    }
    for child in children {
      self.person_mut(*child).parent_families.insert(id);
    }
    self.store.put_family(f);
    id
  }

  fn person_mut(&mut self, id: PersonId) -> &mut Person {
    self.store.person_mut(id).expect("fixture person")
  }

  fn family_mut(&mut self, id: FamilyId) -> &mut Family {
    self.store.family_mut(id).expect("fixture family")
  }
}

/// Panics unless every back-reference is symmetric, no father/mother pair
/// repeats, and no orphan family exists.
fn assert_consistent(store: &MemoryStore) {
  let mut pairs = BTreeSet::new();
  for f in store.families() {
    assert!(pairs.insert(f.parents()), "duplicate parent pair in {}", f.display_id);
    assert!(!f.is_orphan(), "orphan family {}", f.display_id);
    for parent in [f.father, f.mother].into_iter().flatten() {
      let p = store.person(parent).expect("parent exists");
      assert!(p.spouse_families.contains(&f.id), "{} misses spouse family", p.display_id);
    }
    for c in &f.children {
      let p = store.person(c.child).expect("child exists");
      assert!(p.parent_families.contains(&f.id), "{} misses parent family", p.display_id);
    }
  }
  for p in store.persons() {
    for id in &p.spouse_families {
      let f = store.family(*id).expect("spouse family exists");
      assert!(f.has_parent(p.id), "{} does not name {}", f.display_id, p.display_id);
    }
    for id in &p.parent_families {
      let f = store.family(*id).expect("parent family exists");
      assert!(f.has_child(p.id), "{} does not list {}", f.display_id, p.display_id);
    }
    if let Some(main) = p.main_parent_family {
      assert!(p.parent_families.contains(&main));
    }
  }
}

/// Every event referenced by `person` directly or through their spouse
/// families.
fn reachable_events(store: &MemoryStore, person: PersonId) -> BTreeSet<EventId> {
  let p = store.person(person).expect("person exists");
  let direct = p
    .events
    .iter()
    .chain(p.birth.iter())
    .chain(p.death.iter())
    .map(|r| r.event);
  let via_family = p
    .spouse_families
    .iter()
    .filter_map(|id| store.family(*id))
    .flat_map(|f| f.events.iter().map(|r| r.event));
  direct.chain(via_family).collect()
}

// ─── Scenario A: duplicate spouse family ─────────────────────────────────────

struct ScenarioA {
  tree: Tree,
  a:    PersonId,
  b:    PersonId,
  c:    PersonId,
  d:    PersonId,
  f1:   FamilyId,
  f2:   FamilyId,
}

fn scenario_a() -> ScenarioA {
  let mut tree = Tree::default();
  let a = tree.person("Adam", Gender::Male);
  let b = tree.person("Adam", Gender::Male);
  let c = tree.person("Carol", Gender::Female);
  let d = tree.person("Dina", Gender::Female);
  let f1 = tree.family(Some(a), Some(c), &[]);
  let f2 = tree.family(Some(b), Some(c), &[d]);
  tree.person_mut(d).main_parent_family = Some(f2);
  tree.family_mut(f1).events.push(EventRef::primary(EventId::new()));
  tree.family_mut(f2).events.push(EventRef::primary(EventId::new()));
  tree.family_mut(f2).relationship = FamilyRelation::Married;
  ScenarioA { tree, a, b, c, d, f1, f2 }
}

#[test]
fn scenario_a_merges_duplicate_family() {
  let ScenarioA { mut tree, a, b, c, d, f1, f2 } = scenario_a();
  let report = merge(&mut tree.store, a, b).unwrap();
  let store = &tree.store;

  assert_eq!(report.merged_families, vec![FamilyMerge {
    source: f2,
    target: f1,
    link:   TargetLink::Existing,
  }]);
  assert!(report.rewritten_families.is_empty());
  assert_eq!(report.deleted_families(), BTreeSet::from([f2]));
  assert!(report.updated_persons.contains(&c));
  assert!(report.updated_persons.contains(&d));

  assert!(store.person(b).is_none());
  assert!(store.family(f2).is_none());
  let target = store.family(f1).unwrap();
  assert!(target.has_child(d));
  assert_eq!(target.events.len(), 2);
  assert_eq!(target.relationship, FamilyRelation::Married);

  assert_eq!(store.person(a).unwrap().spouse_families, BTreeSet::from([f1]));
  assert_eq!(store.person(c).unwrap().spouse_families, BTreeSet::from([f1]));
  let child = store.person(d).unwrap();
  assert_eq!(child.parent_families, BTreeSet::from([f1]));
  assert_eq!(child.main_parent_family, Some(f1));

  assert_consistent(store);
}

#[test]
fn scenario_a_keeps_every_event() {
  let ScenarioA { mut tree, a, b, .. } = scenario_a();
  tree.person_mut(a).events.push(EventRef::primary(EventId::new()));
  tree.person_mut(b).events.push(EventRef::primary(EventId::new()));
  tree.person_mut(b).birth = Some(EventRef::primary(EventId::new()));

  let mut expected = reachable_events(&tree.store, a);
  expected.extend(reachable_events(&tree.store, b));

  merge(&mut tree.store, a, b).unwrap();
  assert_eq!(reachable_events(&tree.store, a), expected);
}

#[test]
fn merge_is_journalled_with_display_ids() {
  let ScenarioA { mut tree, a, b, .. } = scenario_a();
  merge(&mut tree.store, a, b).unwrap();
  assert_eq!(tree.store.commits(), ["Merge Person I0001 <- I0002"]);
}

// ─── Scenario B: no pre-existing target ──────────────────────────────────────

#[test]
fn scenario_b_rewrites_family_in_place() {
  let mut tree = Tree::default();
  let a = tree.person("Abe", Gender::Male);
  let b = tree.person("Abe", Gender::Male);
  let e = tree.person("Eve", Gender::Female);
  let f3 = tree.family(Some(b), Some(e), &[]);

  let report = merge(&mut tree.store, a, b).unwrap();
  let store = &tree.store;

  assert_eq!(report.rewritten_families, BTreeSet::from([f3]));
  assert!(report.merged_families.is_empty());
  assert!(report.deleted_families().is_empty());

  let family = store.family(f3).unwrap();
  assert_eq!(family.parents(), (Some(a), Some(e)));
  assert_eq!(store.person(a).unwrap().spouse_families, BTreeSet::from([f3]));
  assert_eq!(store.person(e).unwrap().spouse_families, BTreeSet::from([f3]));
  assert_consistent(store);
}

#[test]
fn secondary_as_mother_is_rewritten_in_the_mother_slot() {
  let mut tree = Tree::default();
  let a = tree.person("Ann", Gender::Female);
  let b = tree.person("Ann", Gender::Female);
  let h = tree.person("Hal", Gender::Male);
  let f = tree.family(Some(h), Some(b), &[]);

  merge(&mut tree.store, a, b).unwrap();
  assert_eq!(tree.store.family(f).unwrap().parents(), (Some(h), Some(a)));
  assert_consistent(&tree.store);
}

#[test]
fn rewrites_are_visible_to_later_lookups() {
  // Both of B's families would collapse onto the same couple once B becomes
  // A: the first is rewritten, the second must find the first.
  let mut tree = Tree::default();
  let a = tree.person("Abe", Gender::Male);
  let b = tree.person("Abe", Gender::Male);
  let e = tree.person("Eve", Gender::Female);
  let kid1 = tree.person("Kit", Gender::Unknown);
  let kid2 = tree.person("Kat", Gender::Unknown);
  let first = tree.family(Some(b), Some(e), &[kid1]);
  let second = tree.family(Some(b), Some(e), &[kid2]);

  let report = merge(&mut tree.store, a, b).unwrap();
  let store = &tree.store;

  assert_eq!(report.rewritten_families.len(), 1);
  assert_eq!(report.merged_families.len(), 1);
  let survivor_family = *report.rewritten_families.iter().next().unwrap();
  assert!([first, second].contains(&survivor_family));

  let family = store.family(survivor_family).unwrap();
  assert!(family.has_child(kid1) && family.has_child(kid2));
  assert_eq!(store.families().count(), 1);
  assert_consistent(store);
}

// ─── Scenario C: shared parent family ────────────────────────────────────────

#[test]
fn scenario_c_drops_duplicate_child_entry() {
  let mut tree = Tree::default();
  let p = tree.person("Pa", Gender::Male);
  let q = tree.person("Ma", Gender::Female);
  let a = tree.person("Al", Gender::Male);
  let b = tree.person("Al", Gender::Male);
  let f4 = tree.family(Some(p), Some(q), &[a, b]);
  tree.family_mut(f4).children[0].father_relation = ChildRelation::Unknown;
  tree.family_mut(f4).children[1].father_relation = ChildRelation::Adopted;

  merge(&mut tree.store, a, b).unwrap();
  let store = &tree.store;

  let family = store.family(f4).unwrap();
  assert_eq!(family.children.len(), 1);
  assert_eq!(family.children[0].child, a);
  assert_eq!(family.children[0].father_relation, ChildRelation::Adopted);
  assert!(store.person(a).unwrap().parent_families.contains(&f4));
  assert_consistent(store);
}

#[test]
fn parent_family_is_adopted_by_survivor() {
  let mut tree = Tree::default();
  let p = tree.person("Pa", Gender::Male);
  let a = tree.person("Al", Gender::Male);
  let b = tree.person("Al", Gender::Male);
  let f = tree.family(Some(p), None, &[b]);
  tree.person_mut(b).main_parent_family = Some(f);

  merge(&mut tree.store, a, b).unwrap();
  let store = &tree.store;

  assert_eq!(store.family(f).unwrap().children[0].child, a);
  let survivor = store.person(a).unwrap();
  assert_eq!(survivor.parent_families, BTreeSet::from([f]));
  assert_eq!(survivor.main_parent_family, Some(f));
  assert_consistent(store);
}

// ─── Scenario D and other rejections ─────────────────────────────────────────

#[test]
fn scenario_d_rejects_parent_and_child() {
  let mut tree = Tree::default();
  let a = tree.person("Al", Gender::Male);
  let b = tree.person("Bo", Gender::Male);
  tree.family(Some(a), None, &[b]);
  let before = tree.store.snapshot();

  let err = merge(&mut tree.store, a, b).unwrap_err();
  assert!(matches!(err, MergeError::ParentChildCannotMerge));
  assert!(err.is_precondition());
  assert_eq!(tree.store.snapshot(), before);
  assert!(tree.store.commits().is_empty());
}

#[test]
fn spouses_are_rejected_without_side_effects() {
  let mut tree = Tree::default();
  let a = tree.person("Al", Gender::Male);
  let b = tree.person("Bea", Gender::Female);
  tree.family(Some(a), Some(b), &[]);
  let before = tree.store.snapshot();

  let err = merge(&mut tree.store, b, a).unwrap_err();
  assert!(matches!(err, MergeError::SpousesCannotMerge));
  assert_eq!(tree.store.snapshot(), before);
}

#[test]
fn grandparent_and_grandchild_are_rejected() {
  let mut tree = Tree::default();
  let g = tree.person("Gus", Gender::Male);
  let p = tree.person("Pat", Gender::Male);
  let c = tree.person("Cy", Gender::Male);
  tree.family(Some(g), None, &[p]);
  tree.family(Some(p), None, &[c]);
  let before = tree.store.snapshot();

  let err = merge(&mut tree.store, c, g).unwrap_err();
  assert!(matches!(err, MergeError::AncestorCannotMerge));
  assert_eq!(tree.store.snapshot(), before);
}

#[test]
fn self_merge_is_rejected() {
  let mut tree = Tree::default();
  let a = tree.person("Al", Gender::Male);
  assert!(matches!(merge(&mut tree.store, a, a), Err(MergeError::SamePerson(id)) if id == a));
}

#[test]
fn unknown_person_is_not_found() {
  let mut tree = Tree::default();
  let a = tree.person("Al", Gender::Male);
  let ghost = PersonId::new();
  let err = merge(&mut tree.store, a, ghost).unwrap_err();
  assert!(matches!(err, MergeError::RecordNotFound(RecordId::Person(id)) if id == ghost));
}

#[test]
fn dangling_family_reference_aborts() {
  let mut tree = Tree::default();
  let a = tree.person("Al", Gender::Male);
  let b = tree.person("Al", Gender::Male);
  let missing = FamilyId::new();
  tree.person_mut(b).spouse_families.insert(missing);
  let before = tree.store.snapshot();

  let err = merge(&mut tree.store, a, b).unwrap_err();
  assert!(matches!(err, MergeError::RecordNotFound(RecordId::Family(id)) if id == missing));
  assert_eq!(tree.store.snapshot(), before);
}

// ─── Case C: target not yet linked to the survivor ───────────────────────────

#[test]
fn target_missing_back_reference_is_linked() {
  let mut tree = Tree::default();
  let a = tree.person("Al", Gender::Male);
  let b = tree.person("Al", Gender::Male);
  let c = tree.person("Cat", Gender::Female);
  let kid = tree.person("Kid", Gender::Unknown);
  let target = tree.family(Some(a), Some(c), &[]);
  // Break A's side of the link: only C knows about the target.
  tree.person_mut(a).spouse_families.clear();
  let source = tree.family(Some(b), Some(c), &[kid]);

  let report = merge(&mut tree.store, a, b).unwrap();
  let store = &tree.store;

  assert_eq!(report.merged_families, vec![FamilyMerge {
    source,
    target,
    link: TargetLink::Added,
  }]);
  assert_eq!(store.person(a).unwrap().spouse_families, BTreeSet::from([target]));
  assert_eq!(store.person(c).unwrap().spouse_families, BTreeSet::from([target]));
  assert!(store.family(target).unwrap().has_child(kid));
  assert_consistent(store);
}

// ─── Orphans and stale links ─────────────────────────────────────────────────

#[test]
fn empty_stale_family_is_removed_as_orphan() {
  let mut tree = Tree::default();
  let a = tree.person("Al", Gender::Male);
  let b = tree.person("Al", Gender::Male);
  let empty = tree.family(None, None, &[]);
  tree.person_mut(b).spouse_families.insert(empty);

  let report = merge(&mut tree.store, a, b).unwrap();
  assert_eq!(report.orphaned_families, BTreeSet::from([empty]));
  assert!(tree.store.family(empty).is_none());
  assert!(tree.store.person(a).unwrap().spouse_families.is_empty());
  assert_consistent(&tree.store);
}

#[test]
fn stale_spouse_link_is_not_copied() {
  let mut tree = Tree::default();
  let a = tree.person("Al", Gender::Male);
  let b = tree.person("Al", Gender::Male);
  let x = tree.person("Xan", Gender::Male);
  let y = tree.person("Yas", Gender::Female);
  let unrelated = tree.family(Some(x), Some(y), &[]);
  tree.person_mut(b).spouse_families.insert(unrelated);

  let report = merge(&mut tree.store, a, b).unwrap();
  assert!(report.rewritten_families.is_empty());
  assert!(report.orphaned_families.is_empty());
  assert_eq!(tree.store.family(unrelated).unwrap().parents(), (Some(x), Some(y)));
  assert!(tree.store.person(a).unwrap().spouse_families.is_empty());
  assert_consistent(&tree.store);
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[test]
fn failure_at_any_write_leaves_store_untouched() {
  let ScenarioA { tree, a, b, .. } = scenario_a();
  let before = tree.store.snapshot();
  let mut failures = 0;

  for budget in 0..100 {
    let mut store = tree.store.clone();
    store.fail_writes_after(budget);
    match merge(&mut store, a, b) {
      Ok(_) => break,
      Err(MergeError::StoreWriteFailed(_)) => {
        failures += 1;
        assert_eq!(store.snapshot(), before, "write #{} leaked", budget + 1);
        assert!(store.commits().is_empty());
      }
      Err(other) => panic!("unexpected error: {other}"),
    }
  }
  assert!(failures > 0);
}

#[test]
fn check_merge_reports_without_writing() {
  let ScenarioA { mut tree, a, b, .. } = scenario_a();
  let before = tree.store.snapshot();

  let planned = check_merge(&mut tree.store, a, b).unwrap();
  assert_eq!(tree.store.snapshot(), before);

  let done = merge(&mut tree.store, a, b).unwrap();
  assert_eq!(planned, done);
}

#[test]
fn survivor_fields_absorb_secondary() {
  let ScenarioA { mut tree, a, b, .. } = scenario_a();
  tree.person_mut(b).primary_name = Name::new("Adam", "Dough");
  tree.person_mut(b).private = true;

  merge(&mut tree.store, a, b).unwrap();
  let survivor = tree.store.person(a).unwrap();
  assert_eq!(survivor.alternate_names, vec![Name::new("Adam", "Dough")]);
  assert!(survivor.private);
  assert!(survivor.attributes.iter().any(|attr| attr.value == "I0002"));
}
