//! The diff entry point.
//!
//! [`Differ`] carries the configuration and the caller strategies, runs
//! matching, reconciliation and scheduling, and finally addresses every
//! directive against the snapshot of its phase.

use std::borrow::Cow;
use std::fmt;

use tracing::debug;

use arbor_patch::{apply_resolved, Directive, Patch, Phase};
use arbor_tree::{has_adjacent_text, merge_text, Arena, NodeId, Node};

use crate::config::DiffConfig;
use crate::emit::OpId;
use crate::error::{DiffError, DiffResult, Side};
use crate::identity::{match_trees, roots_pair, CandidateKey, DiffKey, IndexedTree};
use crate::reconcile::Reconciler;
use crate::schedule::schedule;

/// Marks elements whose descendants form an independently addressed scope.
pub type SubtreePredicate = Box<dyn Fn(&Node) -> bool>;
/// Fallback identity for elements without an explicit key.
pub type CandidateKeyFn = Box<dyn Fn(&Node) -> Option<CandidateKey>>;
/// Called once per freshly inserted element with a shell (tag and
/// attributes) of the literal about to be emitted.
pub type NewNodeHook = Box<dyn Fn(&mut Node)>;

/// Computes patches between two trees.
///
/// ```
/// use arbor_diff::{DiffConfig, Differ};
/// use arbor_tree::Node;
///
/// let old = Node::new("form").with_child(Node::new("field").with_attr("o-diff-key", "1"));
/// let new = Node::new("form").with_child(
///     Node::new("field").with_attr("o-diff-key", "1").with_attr("invisible", "1"),
/// );
/// let patch = Differ::new(DiffConfig::default()).diff(&old, &new).unwrap();
/// assert_eq!(patch.len(), 1);
/// assert_eq!(arbor_patch::apply_patch(&old, &patch).unwrap(), new);
/// ```
pub struct Differ {
    config: DiffConfig,
    is_subtree: SubtreePredicate,
    candidate_key: CandidateKeyFn,
    on_new_node: Option<NewNodeHook>,
}

impl Default for Differ {
    fn default() -> Self {
        Self::new(DiffConfig::default())
    }
}

impl fmt::Debug for Differ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Differ")
            .field("config", &self.config)
            .field("on_new_node", &self.on_new_node.is_some())
            .finish_non_exhaustive()
    }
}

impl Differ {
    pub fn new(config: DiffConfig) -> Self {
        Self {
            config,
            is_subtree: Box::new(|_| false),
            candidate_key: Box::new(|_| None),
            on_new_node: None,
        }
    }

    pub fn with_subtree_predicate(mut self, predicate: impl Fn(&Node) -> bool + 'static) -> Self {
        self.is_subtree = Box::new(predicate);
        self
    }

    pub fn with_candidate_key(
        mut self,
        candidate: impl Fn(&Node) -> Option<CandidateKey> + 'static,
    ) -> Self {
        self.candidate_key = Box::new(candidate);
        self
    }

    pub fn with_new_node_hook(mut self, hook: impl Fn(&mut Node) + 'static) -> Self {
        self.on_new_node = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Compute the phases turning `old` into `new`.
    ///
    /// Neither input is modified. Whitespace-only text is ignored on both
    /// sides, but locations count it as it stands in `old`. Adjacent texts
    /// are diffed as one, the way any serialized form of the tree holds them.
    pub fn diff(&self, old: &Node, new: &Node) -> DiffResult<Patch> {
        let (old, new) = (merged(old), merged(new));
        let old_tree = self.index(&old);
        let new_tree = self.index(&new);
        old_tree.check_duplicates(Side::Old)?;
        new_tree.check_duplicates(Side::New)?;

        if old == new {
            debug!("trees are identical");
            return Ok(Patch::new());
        }

        let mut matches = match_trees(&old_tree, &new_tree);
        if roots_pair(&old_tree, &new_tree) {
            matches.insert(old_tree.arena.root(), new_tree.arena.root());
        }

        let emitter = Reconciler::new(
            &old_tree,
            &new_tree,
            &matches,
            &self.config.ignored_attributes,
            self.on_new_node.as_ref(),
        )
        .run();
        let deps = emitter.dependencies(&old_tree.arena, &new_tree.arena, &matches);
        let phases = schedule(&deps)?;
        let directives = emitter.into_directives();

        let patch = self.locate(&old_tree.arena, &directives, &phases)?;
        debug!(
            phases = patch.len(),
            directives = patch.directive_count(),
            moves = patch.move_count(),
            "diff complete"
        );
        Ok(patch)
    }

    fn index(&self, node: &Node) -> IndexedTree {
        let key_attribute = self.config.key_attribute.as_str();
        IndexedTree::build(
            node,
            |n| DiffKey::of(n, key_attribute, &*self.candidate_key),
            |n| (self.is_subtree)(n),
        )
    }

    /// Address every directive against the snapshot its phase starts from.
    ///
    /// The phases are replayed on a copy of the old arena; a directive whose
    /// target or moved nodes are detached at the start of its phase means
    /// the ordering is broken and aborts the run.
    fn locate(
        &self,
        old: &Arena,
        directives: &[Directive<NodeId>],
        phases: &[Vec<OpId>],
    ) -> DiffResult<Patch> {
        let mut working = old.clone();
        let mut patch = Patch::new();
        for (index, ops) in phases.iter().enumerate() {
            let mut located = Vec::with_capacity(ops.len());
            for &op in ops {
                let directive = &directives[op];
                let mut addressed = directive.try_map(|&id| {
                    working
                        .locate(id)
                        .ok_or(DiffError::UnresolvableLocation { phase: index, node: id })
                })?;
                if self.config.with_location_metadata {
                    if let Some(attributes) = old.get(directive.target).attributes() {
                        addressed = addressed.with_metadata(attributes.clone());
                    }
                }
                located.push(addressed);
            }
            for &op in ops {
                apply_resolved(&mut working, &directives[op])?;
            }
            patch.phases.push(Phase::new(located));
        }
        Ok(patch)
    }
}

fn merged(node: &Node) -> Cow<'_, Node> {
    if !has_adjacent_text(node) {
        return Cow::Borrowed(node);
    }
    let mut owned = node.clone();
    merge_text(&mut owned);
    Cow::Owned(owned)
}

/// Diff with the default configuration and no strategies.
pub fn diff(old: &Node, new: &Node) -> DiffResult<Patch> {
    Differ::default().diff(old, new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_patch::{apply_patch, Fragment, Operation, Position};
    use arbor_tree::{collapse_whitespace, restore_indentation, Location};

    fn keyed(tag: &str, key: &str) -> Node {
        Node::new(tag).with_attr("o-diff-key", key)
    }

    fn field(key: &str) -> Node {
        keyed("field", key)
    }

    fn form(children: Vec<Node>) -> Node {
        children.into_iter().fold(Node::new("form"), Node::with_child)
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init();
    }

    /// Diff, replay and compare modulo cosmetic whitespace.
    fn roundtrip_with(differ: &Differ, old: &Node, new: &Node) -> Patch {
        init_tracing();
        let patch = differ.diff(old, new).unwrap();
        let mut replayed = apply_patch(old, &patch).unwrap();
        let mut expected = new.clone();
        collapse_whitespace(&mut replayed);
        collapse_whitespace(&mut expected);
        assert_eq!(replayed, expected, "patch:\n{:?}", patch.to_pretty_xml());
        patch
    }

    fn roundtrip(old: &Node, new: &Node) -> Patch {
        roundtrip_with(&Differ::default(), old, new)
    }

    fn described(patch: &Patch) -> Vec<Vec<String>> {
        patch
            .phases
            .iter()
            .map(|phase| {
                phase
                    .directives
                    .iter()
                    .map(|d| format!("{} {}", d.position(), d.target))
                    .collect()
            })
            .collect()
    }

    fn moved(patch: &Patch) -> Vec<String> {
        patch
            .directives()
            .flat_map(|d| d.moves())
            .map(Location::to_string)
            .collect()
    }

    #[test]
    fn identical_trees_produce_no_phases() {
        let tree = form(vec![Node::new("group").with_child(Node::new("field")).with_text("x")]);
        assert!(diff(&tree, &tree).unwrap().is_empty());
    }

    #[test]
    fn formatting_only_changes_produce_no_phases() {
        let old = form(vec![
            field("1"),
            keyed("group", "g").with_child(field("2")).with_child(field("3")),
        ]);
        let mut new = old.clone();
        restore_indentation(&mut new, "  ");
        assert_ne!(old, new);
        assert!(diff(&old, &new).unwrap().is_empty());
    }

    #[test]
    fn reorder_moves_only_children_outside_the_lis() {
        let keys = ["1", "2", "3", "4", "5", "6"];
        let old = form(keys.iter().map(|k| field(k)).collect());
        let new = form(["1", "4", "2", "5", "6", "3"].iter().map(|k| field(k)).collect());
        let patch = roundtrip(&old, &new);
        assert_eq!(patch.len(), 1);
        assert_eq!(patch.move_count(), 2);
        assert_eq!(moved(&patch), vec!["/form[1]/field[4]", "/form[1]/field[3]"]);
        assert_eq!(
            described(&patch),
            vec![vec!["after /form[1]/field[1]", "after /form[1]/field[6]"]]
        );
    }

    #[test]
    fn removed_sibling_and_changed_attribute() {
        let old = keyed("form", "p")
            .with_child(field("2"))
            .with_child(field("3").with_attr("string", "old"));
        let new = keyed("form", "p").with_child(field("3").with_attr("string", "new"));
        let patch = roundtrip(&old, &new);
        assert_eq!(patch.move_count(), 0);
        assert_eq!(
            described(&patch),
            vec![vec!["replace /form[1]/field[1]", "attributes /form[1]/field[2]"]]
        );
        assert!(patch.phases[0].directives[0].operation.is_removal());
    }

    #[test]
    fn unkeyed_elements_are_never_matched() {
        let div = || Node::new("div").with_attr("class", "x");
        let old = form(vec![div(), field("1").with_attr("a", "1")]);
        let new = form(vec![div(), field("1").with_attr("a", "2")]);
        let patch = roundtrip(&old, &new);
        assert_eq!(
            described(&patch),
            vec![vec![
                "replace /form[1]/div[1]",
                "before /form[1]/field[1]",
                "attributes /form[1]/field[1]",
            ]]
        );
        let inserted = patch.phases[0].directives[1].operation.content().unwrap();
        assert_eq!(inserted, &vec![Fragment::literal(&div())]);
    }

    #[test]
    fn text_runs_are_compared_positionally() {
        let old = form(vec![]).with_text("a").with_child(field("1")).with_text("c");
        let new = form(vec![]).with_text("a2").with_child(field("1")).with_text("c");
        let patch = roundtrip(&old, &new);
        assert_eq!(described(&patch), vec![vec!["replace /form[1]/text()[1]"]]);
        assert_eq!(
            patch.phases[0].directives[0].operation,
            Operation::Replace(vec![Fragment::Text("a2".into())])
        );
    }

    #[test]
    fn comments_and_texts_are_inserted_with_their_run() {
        let old = form(vec![field("1")]);
        let new = form(vec![field("1")]).with_comment("note").with_text("tail");
        let patch = roundtrip(&old, &new);
        assert_eq!(described(&patch), vec![vec!["after /form[1]/field[1]"]]);
    }

    #[test]
    fn inserted_literal_carries_nested_moves() {
        let old = form(vec![field("1"), keyed("group", "g").with_child(field("2"))]);
        let new = form(vec![
            field("1"),
            Node::new("notebook").with_child(Node::new("page").with_child(field("2"))),
            keyed("group", "g"),
        ]);
        let patch = roundtrip(&old, &new);
        assert_eq!(moved(&patch), vec!["/form[1]/group[1]/field[1]"]);
        assert_eq!(patch.len(), 1);
    }

    #[test]
    fn removal_waits_for_moves_out_of_the_container() {
        let old = form(vec![Node::new("div").with_child(field("1")), field("2")]);
        let new = form(vec![field("1"), field("2")]);
        let patch = roundtrip(&old, &new);
        assert_eq!(
            described(&patch),
            vec![vec!["before /form[1]/field[1]"], vec!["replace /form[1]/div[1]"]]
        );
        assert_eq!(moved(&patch), vec!["/form[1]/div[1]/field[1]"]);
    }

    #[test]
    fn attributes_of_a_moved_node_follow_its_placement() {
        let old = form(vec![
            keyed("a", "1").with_child(keyed("x", "3").with_attr("v", "1")),
            keyed("b", "2"),
        ]);
        let new = form(vec![
            keyed("a", "1"),
            keyed("b", "2").with_child(keyed("x", "3").with_attr("v", "2")),
        ]);
        let patch = roundtrip(&old, &new);
        assert_eq!(
            described(&patch),
            vec![vec!["inside /form[1]/b[1]"], vec!["attributes /form[1]/b[1]/x[1]"]]
        );
    }

    #[test]
    fn ancestor_inversion() {
        let old = form(vec![keyed("a", "1").with_child(keyed("b", "2"))]);
        let new = form(vec![keyed("b", "2").with_child(keyed("a", "1"))]);
        let patch = roundtrip(&old, &new);
        assert_eq!(patch.len(), 2);
    }

    #[test]
    fn inversion_through_a_new_wrapper() {
        let old = form(vec![keyed("m", "m").with_child(keyed("r", "r").with_child(keyed("s", "s")))]);
        let new = form(vec![keyed("s", "s").with_child(
            keyed("m", "m").with_child(Node::new("wrap").with_child(keyed("r", "r"))),
        )]);
        let patch = roundtrip(&old, &new);
        assert_eq!(patch.len(), 3);
    }

    #[test]
    fn unpaired_roots_are_replaced() {
        let old = form(vec![field("1"), Node::new("separator")]);
        let new = Node::new("tree").with_child(field("1").with_attr("readonly", "1"));
        let patch = roundtrip(&old, &new);
        let first = &patch.phases[0].directives[0];
        assert_eq!(first.position(), Position::Replace);
        assert_eq!(first.target.to_string(), "/form[1]");
        assert_eq!(patch.move_count(), 1);
    }

    #[test]
    fn whitespace_in_the_old_tree_is_counted_by_locations() {
        let old = form(vec![])
            .with_text("\n  ")
            .with_child(field("0"))
            .with_text("a")
            .with_child(field("1"));
        let new = form(vec![field("0")]).with_text("b").with_child(field("1"));
        let patch = roundtrip(&old, &new);
        assert_eq!(described(&patch), vec![vec!["replace /form[1]/text()[2]"]]);
    }

    #[test]
    fn adjacent_texts_are_diffed_as_one() {
        let old = form(vec![]).with_text("x").with_text("y").with_child(field("1"));
        let new = form(vec![]).with_text("z").with_child(field("1"));
        let patch = diff(&old, &new).unwrap();
        assert_eq!(described(&patch), vec![vec!["replace /form[1]/text()[1]"]]);

        let mut merged = old.clone();
        arbor_tree::merge_text(&mut merged);
        assert_eq!(apply_patch(&merged, &patch).unwrap(), new);
        assert!(diff(&old, &form(vec![]).with_text("xy").with_child(field("1"))).unwrap().is_empty());
    }

    #[test]
    fn inserted_adjacent_texts_survive_the_wire_form() {
        let old = form(vec![]);
        let new = form(vec![Node::new("a").with_text("a").with_text("a")]);
        let patch = diff(&old, &new).unwrap();
        let reread = Patch::from_xml(&patch.to_xml().unwrap()).unwrap();
        assert_eq!(reread, patch);
        let expected = form(vec![Node::new("a").with_text("aa")]);
        assert_eq!(apply_patch(&old, &reread).unwrap(), expected);
        assert_eq!(apply_patch(&old, &patch).unwrap(), expected);
    }

    #[test]
    fn ignored_attributes_are_not_diffed() {
        let differ = Differ::new(DiffConfig::default().ignore("style"));
        let old = form(vec![field("1").with_attr("style", "a")]);
        let new = form(vec![field("1").with_attr("style", "b")]);
        assert!(differ.diff(&old, &new).unwrap().is_empty());
    }

    #[test]
    fn custom_key_attribute() {
        let differ = Differ::new(DiffConfig::default().with_key_attribute("name"));
        let f = |name: &str| Node::new("field").with_attr("name", name);
        let old = form(vec![f("a"), f("b")]);
        let new = form(vec![f("b"), f("a")]);
        let patch = roundtrip_with(&differ, &old, &new);
        assert_eq!(patch.move_count(), 1);
        assert_eq!(patch.directive_count(), 1);
    }

    #[test]
    fn candidate_keys_identify_unkeyed_nodes() {
        let differ = Differ::default().with_candidate_key(|n| {
            n.attribute("name").map(|name| vec![n.tag.clone(), name.to_string()])
        });
        let f = |name: &str| Node::new("field").with_attr("name", name);
        let old = form(vec![f("a"), f("b"), f("c")]);
        let new = form(vec![f("c"), f("a"), f("b")]);
        let patch = roundtrip_with(&differ, &old, &new);
        assert_eq!(patch.move_count(), 1);
        assert_eq!(moved(&patch), vec!["/form[1]/field[3]"]);
    }

    #[test]
    fn subtree_matches_stay_inside_their_boundary() {
        let differ = Differ::default().with_subtree_predicate(|n| n.tag == "subview");
        let inner = |order: [&str; 2]| {
            keyed("subview", "s").with_child(
                order
                    .iter()
                    .fold(keyed("tree", "t"), |t, k| t.with_child(field(k))),
            )
        };
        // key "1" is reused outside the boundary; scopes keep them apart
        let old = form(vec![field("1"), inner(["1", "2"])]);
        let new = form(vec![field("1"), inner(["2", "1"])]);
        let patch = roundtrip_with(&differ, &old, &new);
        assert_eq!(patch.move_count(), 1);
        for directive in patch.directives() {
            let mut locations = vec![&directive.target];
            locations.extend(directive.moves());
            for location in locations {
                assert_eq!(location.depth(), 1, "{location}");
                assert_eq!(location.segments()[0].len(), 2, "{location}");
                assert!(location.to_string().starts_with("/form[1]/subview[1] >> "));
            }
        }
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let old = form(vec![field("1"), field("1")]);
        let new = form(vec![field("1")]);
        match diff(&old, &new) {
            Err(DiffError::DuplicateKey { key, side }) => {
                assert_eq!(key, "1");
                assert_eq!(side, Side::Old);
            }
            other => panic!("expected duplicate key error, got {other:?}"),
        }
        assert!(matches!(
            diff(&new, &old),
            Err(DiffError::DuplicateKey { side: Side::New, .. })
        ));
    }

    #[test]
    fn duplicate_keys_are_rejected_for_identical_trees() {
        let tree = form(vec![field("1"), field("1")]);
        assert!(matches!(
            diff(&tree, &tree),
            Err(DiffError::DuplicateKey { side: Side::Old, .. })
        ));
    }

    #[test]
    fn location_metadata_carries_original_attributes() {
        let differ = Differ::new(DiffConfig::default().with_location_metadata(true));
        let old = form(vec![field("1").with_attr("name", "partner_id")]);
        let new = form(vec![field("1").with_attr("name", "partner_id").with_attr("invisible", "1")]);
        let patch = roundtrip_with(&differ, &old, &new);
        let meta = patch.phases[0].directives[0].metadata.as_ref().unwrap();
        assert_eq!(meta.get("name").map(String::as_str), Some("partner_id"));
        assert!(!meta.contains_key("invisible"));
    }

    #[test]
    fn new_node_hook_sees_every_inserted_element() {
        let differ = Differ::default().with_new_node_hook(|n| {
            n.attributes.insert("o-new".into(), "1".into());
        });
        let old = form(vec![field("1")]);
        let new = form(vec![field("1"), Node::new("group").with_child(Node::new("label"))]);
        let patch = differ.diff(&old, &new).unwrap();
        let replayed = apply_patch(&old, &patch).unwrap();
        let group = replayed.find(&|n| n.tag == "group").unwrap();
        assert_eq!(group.attribute("o-new"), Some("1"));
        assert_eq!(group.elements().next().and_then(|l| l.attribute("o-new")), Some("1"));
        assert_eq!(replayed.elements().next().and_then(|f| f.attribute("o-new")), None);
    }

    #[test]
    fn patches_replay_from_their_wire_form() {
        let old = form(vec![field("1"), Node::new("div").with_child(field("2")), field("3")]);
        let new = form(vec![field("3"), keyed("group", "g").with_child(field("2")), field("1")]);
        let patch = roundtrip(&old, &new);
        let reread = Patch::from_xml(&patch.to_pretty_xml().unwrap()).unwrap();
        assert_eq!(reread, patch);
        assert_eq!(apply_patch(&old, &reread).unwrap(), new);
    }

    mod properties {
        use super::*;
        use arbor_tree::Child;
        use proptest::prelude::*;

        fn element(tag: &str, key: Option<u8>, value: Option<u8>, children: Vec<Child>) -> Child {
            let mut node = Node::new(tag);
            if let Some(k) = key {
                node.attributes.insert("o-diff-key".into(), k.to_string());
            }
            if let Some(v) = value {
                node.attributes.insert("v".into(), v.to_string());
            }
            node.children = children;
            Child::Element(node)
        }

        fn arb_child() -> impl Strategy<Value = Child> {
            let tag = prop_oneof![Just("a"), Just("b")];
            let leaf = prop_oneof![
                "[a-c]{1,2}".prop_map(Child::Text),
                Just(Child::Comment("c".into())),
                (tag.clone(), proptest::option::of(0u8..8), proptest::option::of(0u8..2))
                    .prop_map(|(t, k, v)| element(t, k, v, Vec::new())),
            ];
            leaf.prop_recursive(3, 24, 4, move |inner| {
                (
                    tag.clone(),
                    proptest::option::of(0u8..8),
                    proptest::option::of(0u8..2),
                    prop::collection::vec(inner, 0..4),
                )
                    .prop_map(|(t, k, v, children)| element(t, k, v, children))
            })
        }

        /// Drop repeated keys so each key names at most one element.
        fn dedupe(node: &mut Node, seen: &mut std::collections::HashSet<String>) {
            for child in &mut node.children {
                if let Child::Element(n) = child {
                    if let Some(k) = n.attributes.get("o-diff-key").cloned() {
                        if !seen.insert(k) {
                            n.attributes.remove("o-diff-key");
                        }
                    }
                    dedupe(n, seen);
                }
            }
        }

        fn arb_tree() -> impl Strategy<Value = Node> {
            prop::collection::vec(arb_child(), 0..5).prop_map(|children| {
                let mut root = Node::new("form");
                root.children = children;
                dedupe(&mut root, &mut Default::default());
                arbor_tree::merge_text(&mut root);
                root
            })
        }

        /// Give every element below the root a unique key.
        fn key_all(node: &mut Node, next: &mut usize) {
            for child in &mut node.children {
                if let Child::Element(n) = child {
                    n.attributes.insert("o-diff-key".into(), next.to_string());
                    *next += 1;
                    key_all(n, next);
                }
            }
        }

        fn lis_len(seq: &[usize]) -> usize {
            let mut best = vec![1; seq.len()];
            for i in 0..seq.len() {
                for j in 0..i {
                    if seq[j] < seq[i] {
                        best[i] = best[i].max(best[j] + 1);
                    }
                }
            }
            best.into_iter().max().unwrap_or(0)
        }

        proptest! {
            #[test]
            fn replaying_the_patch_reproduces_the_new_tree(old in arb_tree(), new in arb_tree()) {
                let patch = diff(&old, &new).unwrap();
                prop_assert_eq!(apply_patch(&old, &patch).unwrap(), new);
            }

            #[test]
            fn patches_replay_after_an_xml_round_trip(old in arb_tree(), new in arb_tree()) {
                let patch = diff(&old, &new).unwrap();
                let reread = Patch::from_xml(&patch.to_pretty_xml().unwrap()).unwrap();
                prop_assert_eq!(apply_patch(&old, &reread).unwrap(), new);
            }

            #[test]
            fn reformatted_keyed_tree_diffs_to_nothing(tree in arb_tree()) {
                let mut keyed_tree = tree;
                key_all(&mut keyed_tree, &mut 0);
                let mut pretty = keyed_tree.clone();
                restore_indentation(&mut pretty, "    ");
                prop_assert!(diff(&keyed_tree, &pretty).unwrap().is_empty());
            }

            #[test]
            fn moves_equal_matches_minus_lis(
                order in Just((0..10usize).collect::<Vec<_>>()).prop_shuffle()
            ) {
                let old = form((0..10).map(|k| field(&k.to_string())).collect());
                let new = form(order.iter().map(|k| field(&k.to_string())).collect());
                let patch = diff(&old, &new).unwrap();
                prop_assert_eq!(patch.move_count(), order.len() - lis_len(&order));
                prop_assert_eq!(apply_patch(&old, &patch).unwrap(), new);
            }
        }
    }
}
