//! Integration tests for tree CRUD, cascades, reorder, and selection via
//! the CLI:
//! - create/update/delete at every level, with parent checks
//! - deletion cascades through the whole subtree and is idempotent
//! - reorder is scoped to same-parent same-kind siblings
//! - selection is hierarchical and survives process restarts

mod common;

use common::TestEnv;
use predicates::prelude::*;

// === Create ===

#[test]
fn test_create_and_locate_feature_under_product() {
    let env = TestEnv::init();
    let product = env.json(&["product", "create", "P1"]);
    let product_id = product["id"].as_str().unwrap();

    let feature = env.json(&["feature", "create", "F1", "--product", product_id]);
    assert_eq!(feature["product_id"], *product_id);

    let tree = env.json(&["tree"]);
    let features = tree[0]["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["name"], "F1");
}

#[test]
fn test_create_human_output() {
    let env = TestEnv::init();
    env.tl()
        .args(["-H", "product", "create", "Webshop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created product pd-"))
        .stdout(predicate::str::contains("\"Webshop\""));
}

#[test]
fn test_create_with_missing_parent_fails() {
    let env = TestEnv::init();
    env.tl()
        .args(["epic", "create", "Orphan", "--feature", "ft-00000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parent not found"));
}

#[test]
fn test_create_rejects_blank_title() {
    let env = TestEnv::init();
    env.tl()
        .args(["product", "create", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn test_create_rejects_bad_priority() {
    let env = TestEnv::init();
    let product = env.json(&["product", "create", "P1"]);
    let product_id = product["id"].as_str().unwrap();
    env.tl()
        .args(["feature", "create", "F1", "--product", product_id, "-p", "11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Priority must be 1-10"));
}

#[test]
fn test_story_points_validated() {
    let env = TestEnv::init();
    let (_, _, epic_id, _, _) = env.chain();
    env.tl()
        .args(["story", "create", "Big", "--epic", &epic_id, "--points", "40"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Story points must be 1-21"));
}

// === Update ===

#[test]
fn test_update_story_preserves_tasks() {
    let env = TestEnv::init();
    let (_, _, _, story_id, task_id) = env.chain();

    let updated = env.json(&[
        "story", "update", &story_id, "--title", "Renamed", "--points", "8",
    ]);
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["story_points"], 8);

    // The task is still there
    let task = env.json(&["show", &task_id]);
    assert_eq!(task["user_story_id"], story_id);
}

#[test]
fn test_update_missing_node_fails() {
    let env = TestEnv::init();
    env.tl()
        .args(["task", "update", "tk-00000000", "--title", "X"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

// === Delete ===

#[test]
fn test_delete_cascades_whole_subtree() {
    let env = TestEnv::init();
    let (product_id, feature_id, epic_id, story_id, task_id) = env.chain();

    let report = env.json(&["feature", "delete", &feature_id]);
    assert_eq!(report["deleted"].as_array().unwrap().len(), 4);

    // Everything below the feature is gone; the product survives
    for id in [&feature_id, &epic_id, &story_id, &task_id] {
        env.tl().args(["show", id]).assert().failure();
    }
    env.tl().args(["show", &product_id]).assert().success();
}

#[test]
fn test_delete_missing_node_is_success() {
    let env = TestEnv::init();
    env.chain();

    let report = env.json(&["epic", "delete", "ep-00000000"]);
    assert!(report["deleted"].as_array().unwrap().is_empty());

    // Tree unchanged
    let tree = env.json(&["tree"]);
    assert_eq!(tree[0]["features"][0]["epics"].as_array().unwrap().len(), 1);
}

#[test]
fn test_delete_twice_is_idempotent() {
    let env = TestEnv::init();
    let (_, _, _, _, task_id) = env.chain();

    let first = env.json(&["task", "delete", &task_id]);
    assert_eq!(first["deleted"].as_array().unwrap().len(), 1);
    let second = env.json(&["task", "delete", &task_id]);
    assert!(second["deleted"].as_array().unwrap().is_empty());
}

// === Reorder ===

#[test]
fn test_reorder_moves_before_target() {
    let env = TestEnv::init();
    let (_, _, _, story_id, task_a) = env.chain();
    let task_b = env.json(&["task", "create", "Validate", "--story", &story_id])["id"]
        .as_str()
        .unwrap()
        .to_string();
    let task_c = env.json(&["task", "create", "Style", "--story", &story_id])["id"]
        .as_str()
        .unwrap()
        .to_string();

    let report = env.json(&["task", "reorder", &task_c, "--before", &task_a]);
    assert_eq!(report["moved"], true);

    let tasks = env.json(&["task", "list", "--story", &story_id]);
    let ids: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, [task_c.as_str(), task_a.as_str(), task_b.as_str()]);
}

#[test]
fn test_reorder_round_trip_restores_order() {
    let env = TestEnv::init();
    let (_, _, _, story_id, task_a) = env.chain();
    let task_b = env.json(&["task", "create", "Validate", "--story", &story_id])["id"]
        .as_str()
        .unwrap()
        .to_string();

    env.json(&["task", "reorder", &task_a, "--before", &task_b]);
    env.json(&["task", "reorder", &task_b, "--before", &task_a]);

    let tasks = env.json(&["task", "list", "--story", &story_id]);
    let ids: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, [task_a.as_str(), task_b.as_str()]);
}

#[test]
fn test_reorder_self_target_is_noop() {
    let env = TestEnv::init();
    let (_, _, _, _, task_id) = env.chain();
    let report = env.json(&["task", "reorder", &task_id, "--before", &task_id]);
    assert_eq!(report["moved"], false);
}

#[test]
fn test_reorder_cross_kind_is_noop() {
    let env = TestEnv::init();
    let (_, _, epic_id, story_id, _) = env.chain();

    // The story id is not an epic id, so nothing moves
    let report = env.json(&["epic", "reorder", &epic_id, "--before", &story_id]);
    assert_eq!(report["moved"], false);
}

#[test]
fn test_reorder_across_parents_is_noop() {
    let env = TestEnv::init();
    let (_, _, epic_id, _, task_a) = env.chain();
    let other_story = env.json(&["story", "create", "Other", "--epic", &epic_id])["id"]
        .as_str()
        .unwrap()
        .to_string();
    let far_task = env.json(&["task", "create", "Far", "--story", &other_story])["id"]
        .as_str()
        .unwrap()
        .to_string();

    let report = env.json(&["task", "reorder", &task_a, "--before", &far_task]);
    assert_eq!(report["moved"], false);
}

#[test]
fn test_reorder_persists_across_invocations() {
    let env = TestEnv::init();
    let (product_id, feature_a, _, _, _) = env.chain();
    let feature_b = env.json(&["feature", "create", "Pay", "--product", &product_id])["id"]
        .as_str()
        .unwrap()
        .to_string();

    env.json(&["feature", "reorder", &feature_b, "--before", &feature_a]);

    // A fresh process must see the persisted order
    let tree = env.json(&["tree"]);
    let names: Vec<&str> = tree[0]["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Pay", "Auth"]);
}

// === Selection ===

#[test]
fn test_selection_cascade() {
    let env = TestEnv::init();
    let (product_id, feature_id, epic_id, story_id, _) = env.chain();

    env.json(&["select", "product", &product_id]);
    env.json(&["select", "feature", &feature_id]);
    env.json(&["select", "epic", &epic_id]);
    env.json(&["select", "story", &story_id]);

    // Re-selecting the product clears every deeper level
    let selection = env.json(&["select", "product", &product_id]);
    assert_eq!(selection["product"], product_id.as_str());
    assert_eq!(selection["feature"], serde_json::Value::Null);
    assert_eq!(selection["epic"], serde_json::Value::Null);
    assert_eq!(selection["user_story"], serde_json::Value::Null);
}

#[test]
fn test_selection_scopes_tree() {
    let env = TestEnv::init();
    let (product_id, feature_id, _, _, _) = env.chain();
    env.json(&["select", "product", &product_id]);
    env.json(&["select", "feature", &feature_id]);

    // Scoped to the feature subtree
    let scoped = env.json(&["tree"]);
    assert_eq!(scoped["name"], "Auth");

    // --all ignores the selection
    let full = env.json(&["tree", "--all"]);
    assert!(full.is_array());
}

#[test]
fn test_deleting_selected_node_resets_selection() {
    let env = TestEnv::init();
    let (product_id, feature_id, epic_id, _, _) = env.chain();
    env.json(&["select", "product", &product_id]);
    env.json(&["select", "feature", &feature_id]);
    env.json(&["select", "epic", &epic_id]);

    env.json(&["epic", "delete", &epic_id]);

    // The next invocation no longer scopes to the deleted epic
    let tree = env.json(&["tree"]);
    assert_eq!(tree["name"], "Auth");
}

#[test]
fn test_select_unknown_id_fails() {
    let env = TestEnv::init();
    env.chain();
    env.tl()
        .args(["select", "epic", "ep-00000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

// === Persistence ===

#[test]
fn test_tree_persists_across_invocations() {
    let env = TestEnv::init();
    env.chain();

    let tree = env.json(&["tree"]);
    let story =
        &tree[0]["features"][0]["epics"][0]["user_stories"][0];
    assert_eq!(story["title"], "Sign in");
    assert_eq!(story["tasks"].as_array().unwrap().len(), 1);
}

#[test]
fn test_show_auto_detects_kind() {
    let env = TestEnv::init();
    let (_, _, epic_id, _, task_id) = env.chain();

    let epic = env.json(&["show", &epic_id]);
    assert_eq!(epic["kind"], "epic");
    let task = env.json(&["show", &task_id]);
    assert_eq!(task["kind"], "task");
}
