//! Command implementations for the Tiller CLI.
//!
//! Each handler validates its input, dispatches exactly one action through
//! the engine (reads dispatch nothing), and returns a [`Report`] holding
//! both the JSON value and the human rendering of the result. Validation
//! failures never reach the reducer.

use serde_json::{json, Value};

use crate::engine::Engine;
use crate::models::{
    Epic, Feature, ItemKind, Node, NodeKind, Product, Sprint, SprintPhase, SprintStatus, Task,
    User, UserStory, validate_priority, validate_story_points, validate_title,
};
use crate::state::{Action, BacklogState, SelectLevel, ViewMode};
use crate::store::{generate_id, generate_node_id};
use crate::{Error, Result};

/// A command result: JSON payload plus human rendering.
#[derive(Debug)]
pub struct Report {
    json: Value,
    human: String,
}

impl Report {
    pub fn new(json: Value, human: impl Into<String>) -> Self {
        Self {
            json,
            human: human.into(),
        }
    }

    pub fn to_json(&self) -> String {
        self.json.to_string()
    }

    pub fn to_human(&self) -> String {
        self.human.clone()
    }
}

/// Print a report in the requested format.
pub fn output(report: &Report, human: bool) {
    if human {
        println!("{}", report.to_human());
    } else {
        println!("{}", report.to_json());
    }
}

// === Shared helpers ===

fn node_json(node: &Node) -> Value {
    serde_json::to_value(node).unwrap_or(Value::Null)
}

fn require_user(state: &BacklogState, id: &str) -> Result<()> {
    if state.user(id).is_none() {
        return Err(Error::NodeNotFound(format!("user {}", id)));
    }
    Ok(())
}

fn apply_assignee(
    state: &BacklogState,
    slot: &mut Option<String>,
    assignee: Option<String>,
    unassign: bool,
) -> Result<()> {
    if unassign {
        *slot = None;
    } else if let Some(user_id) = assignee {
        require_user(state, &user_id)?;
        *slot = Some(user_id);
    }
    Ok(())
}

/// Resolve a story-or-task id without knowing the kind up front.
fn resolve_item_kind(state: &BacklogState, id: &str) -> Result<ItemKind> {
    match state.arena.kind_of(id) {
        Some(NodeKind::UserStory) => Ok(ItemKind::UserStory),
        Some(NodeKind::Task) => Ok(ItemKind::Task),
        Some(other) => Err(Error::InvalidInput(format!(
            "{} {} is not a story or task",
            other, id
        ))),
        None => Err(Error::NodeNotFound(id.to_string())),
    }
}

fn assignee_name(state: &BacklogState, id: Option<&str>) -> Option<String> {
    id.and_then(|id| state.user(id)).map(|u| u.name.clone())
}

// === Node create ===

pub fn create_product(
    engine: &mut Engine,
    name: String,
    description: Option<String>,
    version: Option<String>,
) -> Result<Report> {
    validate_title(&name, "Product name")?;
    let mut product = Product::new(generate_node_id(NodeKind::Product, &name), name);
    if let Some(d) = description {
        product.description = d;
    }
    if let Some(v) = version {
        product.version = v;
    }
    let node = Node::Product(product);
    let human = format!("Created product {} \"{}\"", node.id(), node.title());
    engine.dispatch(Action::AddNode(node.clone()))?;
    Ok(Report::new(node_json(&node), human))
}

pub fn create_feature(
    engine: &mut Engine,
    name: String,
    product: String,
    description: Option<String>,
    priority: Option<u8>,
    assignee: Option<String>,
) -> Result<Report> {
    validate_title(&name, "Feature name")?;
    let mut feature = Feature::new(generate_node_id(NodeKind::Feature, &name), name, product);
    if let Some(d) = description {
        feature.description = d;
    }
    if let Some(p) = priority {
        validate_priority(p)?;
        feature.priority = p;
    }
    apply_assignee(&engine.state, &mut feature.assigned_user_id, assignee, false)?;
    let node = Node::Feature(feature);
    let human = format!("Created feature {} \"{}\"", node.id(), node.title());
    engine.dispatch(Action::AddNode(node.clone()))?;
    Ok(Report::new(node_json(&node), human))
}

pub fn create_epic(
    engine: &mut Engine,
    title: String,
    feature: String,
    description: Option<String>,
    priority: Option<u8>,
    assignee: Option<String>,
) -> Result<Report> {
    validate_title(&title, "Epic title")?;
    let mut epic = Epic::new(generate_node_id(NodeKind::Epic, &title), title, feature);
    if let Some(d) = description {
        epic.description = d;
    }
    if let Some(p) = priority {
        validate_priority(p)?;
        epic.priority = p;
    }
    apply_assignee(&engine.state, &mut epic.assigned_user_id, assignee, false)?;
    let node = Node::Epic(epic);
    let human = format!("Created epic {} \"{}\"", node.id(), node.title());
    engine.dispatch(Action::AddNode(node.clone()))?;
    Ok(Report::new(node_json(&node), human))
}

#[allow(clippy::too_many_arguments)]
pub fn create_story(
    engine: &mut Engine,
    title: String,
    epic: String,
    description: Option<String>,
    priority: Option<u8>,
    points: Option<u8>,
    criteria: Vec<String>,
    assignee: Option<String>,
) -> Result<Report> {
    validate_title(&title, "Story title")?;
    let mut story = UserStory::new(generate_node_id(NodeKind::UserStory, &title), title, epic);
    if let Some(d) = description {
        story.description = d;
    }
    if let Some(p) = priority {
        validate_priority(p)?;
        story.priority = p;
    }
    if let Some(points) = points {
        validate_story_points(points)?;
        story.story_points = Some(points);
    }
    story.acceptance_criteria = criteria;
    apply_assignee(&engine.state, &mut story.assigned_user_id, assignee, false)?;
    let node = Node::UserStory(story);
    let human = format!("Created user-story {} \"{}\"", node.id(), node.title());
    engine.dispatch(Action::AddNode(node.clone()))?;
    Ok(Report::new(node_json(&node), human))
}

pub fn create_task(
    engine: &mut Engine,
    title: String,
    story: String,
    description: Option<String>,
    priority: Option<u8>,
    hours: Option<f64>,
    assignee: Option<String>,
) -> Result<Report> {
    validate_title(&title, "Task title")?;
    let mut task = Task::new(generate_node_id(NodeKind::Task, &title), title, story);
    if let Some(d) = description {
        task.description = d;
    }
    if let Some(p) = priority {
        validate_priority(p)?;
        task.priority = p;
    }
    task.estimated_hours = hours;
    apply_assignee(&engine.state, &mut task.assigned_user_id, assignee, false)?;
    let node = Node::Task(task);
    let human = format!("Created task {} \"{}\"", node.id(), node.title());
    engine.dispatch(Action::AddNode(node.clone()))?;
    Ok(Report::new(node_json(&node), human))
}

// === Node update ===

pub fn update_product(
    engine: &mut Engine,
    id: String,
    name: Option<String>,
    description: Option<String>,
    version: Option<String>,
) -> Result<Report> {
    let mut product = engine
        .state
        .arena
        .product(&id)
        .cloned()
        .ok_or_else(|| Error::NodeNotFound(format!("product {}", id)))?;
    if let Some(n) = name {
        validate_title(&n, "Product name")?;
        product.name = n;
    }
    if let Some(d) = description {
        product.description = d;
    }
    if let Some(v) = version {
        product.version = v;
    }
    engine.dispatch(Action::UpdateNode(Node::Product(product)))?;
    let node = engine
        .state
        .arena
        .node(NodeKind::Product, &id)
        .ok_or_else(|| Error::NodeNotFound(format!("product {}", id)))?;
    Ok(Report::new(node_json(&node), format!("Updated product {}", id)))
}

#[allow(clippy::too_many_arguments)]
pub fn update_feature(
    engine: &mut Engine,
    id: String,
    name: Option<String>,
    description: Option<String>,
    priority: Option<u8>,
    assignee: Option<String>,
    unassign: bool,
) -> Result<Report> {
    let mut feature = engine
        .state
        .arena
        .feature(&id)
        .cloned()
        .ok_or_else(|| Error::NodeNotFound(format!("feature {}", id)))?;
    if let Some(n) = name {
        validate_title(&n, "Feature name")?;
        feature.name = n;
    }
    if let Some(d) = description {
        feature.description = d;
    }
    if let Some(p) = priority {
        validate_priority(p)?;
        feature.priority = p;
    }
    apply_assignee(&engine.state, &mut feature.assigned_user_id, assignee, unassign)?;
    engine.dispatch(Action::UpdateNode(Node::Feature(feature)))?;
    let node = engine
        .state
        .arena
        .node(NodeKind::Feature, &id)
        .ok_or_else(|| Error::NodeNotFound(format!("feature {}", id)))?;
    Ok(Report::new(node_json(&node), format!("Updated feature {}", id)))
}

#[allow(clippy::too_many_arguments)]
pub fn update_epic(
    engine: &mut Engine,
    id: String,
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    priority: Option<u8>,
    assignee: Option<String>,
    unassign: bool,
) -> Result<Report> {
    let mut epic = engine
        .state
        .arena
        .epic(&id)
        .cloned()
        .ok_or_else(|| Error::NodeNotFound(format!("epic {}", id)))?;
    if let Some(t) = title {
        validate_title(&t, "Epic title")?;
        epic.title = t;
    }
    if let Some(d) = description {
        epic.description = d;
    }
    if let Some(s) = status {
        epic.status = s.parse()?;
    }
    if let Some(p) = priority {
        validate_priority(p)?;
        epic.priority = p;
    }
    apply_assignee(&engine.state, &mut epic.assigned_user_id, assignee, unassign)?;
    engine.dispatch(Action::UpdateNode(Node::Epic(epic)))?;
    let node = engine
        .state
        .arena
        .node(NodeKind::Epic, &id)
        .ok_or_else(|| Error::NodeNotFound(format!("epic {}", id)))?;
    Ok(Report::new(node_json(&node), format!("Updated epic {}", id)))
}

#[allow(clippy::too_many_arguments)]
pub fn update_story(
    engine: &mut Engine,
    id: String,
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    priority: Option<u8>,
    points: Option<u8>,
    criteria: Vec<String>,
    assignee: Option<String>,
    unassign: bool,
) -> Result<Report> {
    let mut story = engine
        .state
        .arena
        .story(&id)
        .cloned()
        .ok_or_else(|| Error::NodeNotFound(format!("user-story {}", id)))?;
    if let Some(t) = title {
        validate_title(&t, "Story title")?;
        story.title = t;
    }
    if let Some(d) = description {
        story.description = d;
    }
    if let Some(s) = status {
        story.status = s.parse()?;
    }
    if let Some(p) = priority {
        validate_priority(p)?;
        story.priority = p;
    }
    if let Some(points) = points {
        validate_story_points(points)?;
        story.story_points = Some(points);
    }
    if !criteria.is_empty() {
        story.acceptance_criteria = criteria;
    }
    apply_assignee(&engine.state, &mut story.assigned_user_id, assignee, unassign)?;
    engine.dispatch(Action::UpdateNode(Node::UserStory(story)))?;
    let node = engine
        .state
        .arena
        .node(NodeKind::UserStory, &id)
        .ok_or_else(|| Error::NodeNotFound(format!("user-story {}", id)))?;
    Ok(Report::new(
        node_json(&node),
        format!("Updated user-story {}", id),
    ))
}

#[allow(clippy::too_many_arguments)]
pub fn update_task(
    engine: &mut Engine,
    id: String,
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    priority: Option<u8>,
    hours: Option<f64>,
    assignee: Option<String>,
    unassign: bool,
) -> Result<Report> {
    let mut task = engine
        .state
        .arena
        .task(&id)
        .cloned()
        .ok_or_else(|| Error::NodeNotFound(format!("task {}", id)))?;
    if let Some(t) = title {
        validate_title(&t, "Task title")?;
        task.title = t;
    }
    if let Some(d) = description {
        task.description = d;
    }
    if let Some(s) = status {
        task.status = s.parse()?;
    }
    if let Some(p) = priority {
        validate_priority(p)?;
        task.priority = p;
    }
    if hours.is_some() {
        task.estimated_hours = hours;
    }
    apply_assignee(&engine.state, &mut task.assigned_user_id, assignee, unassign)?;
    engine.dispatch(Action::UpdateNode(Node::Task(task)))?;
    let node = engine
        .state
        .arena
        .node(NodeKind::Task, &id)
        .ok_or_else(|| Error::NodeNotFound(format!("task {}", id)))?;
    Ok(Report::new(node_json(&node), format!("Updated task {}", id)))
}

// === Node delete / reorder / show / list ===

pub fn delete_node(engine: &mut Engine, kind: NodeKind, id: String) -> Result<Report> {
    let effects = engine.dispatch(Action::DeleteNode {
        kind,
        id: id.clone(),
    })?;
    let removed: Vec<Value> = effects
        .iter()
        .filter_map(|e| match e {
            crate::state::Effect::DeleteNode { kind, id } => {
                Some(json!({ "kind": kind, "id": id }))
            }
            _ => None,
        })
        .collect();
    let human = if removed.is_empty() {
        format!("{} {} was already absent", kind, id)
    } else {
        format!("Deleted {} {} ({} nodes)", kind, id, removed.len())
    };
    Ok(Report::new(json!({ "deleted": removed }), human))
}

pub fn reorder_node(
    engine: &mut Engine,
    kind: NodeKind,
    id: String,
    before: String,
) -> Result<Report> {
    let effects = engine.dispatch(Action::ReorderSiblings {
        kind,
        dragged: id.clone(),
        target: before.clone(),
    })?;
    let moved = !effects.is_empty();
    let human = if moved {
        format!("Moved {} {} before {}", kind, id, before)
    } else {
        format!("No reorder: {} and {} are not {} siblings", id, before, kind)
    };
    Ok(Report::new(json!({ "moved": moved }), human))
}

pub fn show(engine: &Engine, id: &str) -> Result<Report> {
    let state = &engine.state;
    if let Some(node) = state.arena.find_by_id(id) {
        let human = render_node(state, &node);
        return Ok(Report::new(node_json(&node), human));
    }
    if let Some(user) = state.user(id) {
        return Ok(Report::new(
            serde_json::to_value(user)?,
            format!("{} <{}> ({})", user.name, user.email, user.role),
        ));
    }
    if let Some(sprint) = state.sprint(id) {
        return Ok(Report::new(
            serde_json::to_value(sprint)?,
            render_sprint(sprint),
        ));
    }
    Err(Error::NodeNotFound(id.to_string()))
}

pub fn list_products(engine: &Engine) -> Result<Report> {
    let products = engine.state.arena.products_in_order();
    let human = products
        .iter()
        .map(|p| format!("{}  {} (v{})", p.id, p.name, p.version))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Report::new(serde_json::to_value(&products)?, human))
}

pub fn list_features(engine: &Engine, product: Option<String>) -> Result<Report> {
    let state = &engine.state;
    let parents: Vec<String> = match product {
        Some(p) => vec![p],
        None => state
            .arena
            .products_in_order()
            .iter()
            .map(|p| p.id.clone())
            .collect(),
    };
    let features: Vec<&Feature> = parents
        .iter()
        .flat_map(|p| state.arena.child_ids(NodeKind::Feature, Some(p.as_str())))
        .filter_map(|id| state.arena.feature(id))
        .collect();
    let human = features
        .iter()
        .map(|f| {
            format!(
                "{}  [P{}] {}{}",
                f.id,
                f.priority,
                f.name,
                assignee_suffix(state, f.assigned_user_id.as_deref())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Report::new(serde_json::to_value(&features)?, human))
}

pub fn list_epics(engine: &Engine, feature: Option<String>) -> Result<Report> {
    let state = &engine.state;
    let parents: Vec<String> = match feature {
        Some(f) => vec![f],
        None => state
            .arena
            .products_in_order()
            .iter()
            .flat_map(|p| state.arena.child_ids(NodeKind::Feature, Some(p.id.as_str())))
            .cloned()
            .collect(),
    };
    let epics: Vec<&Epic> = parents
        .iter()
        .flat_map(|f| state.arena.child_ids(NodeKind::Epic, Some(f.as_str())))
        .filter_map(|id| state.arena.epic(id))
        .collect();
    let human = epics
        .iter()
        .map(|e| {
            format!(
                "{}  [P{}] [{}] {}{}",
                e.id,
                e.priority,
                enum_label(&e.status),
                e.title,
                assignee_suffix(state, e.assigned_user_id.as_deref())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Report::new(serde_json::to_value(&epics)?, human))
}

pub fn list_stories(engine: &Engine, epic: Option<String>) -> Result<Report> {
    let state = &engine.state;
    let stories: Vec<&UserStory> = match epic {
        Some(e) => state
            .arena
            .child_ids(NodeKind::UserStory, Some(e.as_str()))
            .iter()
            .filter_map(|id| state.arena.story(id))
            .collect(),
        None => state.arena.stories_in_order(),
    };
    let human = stories
        .iter()
        .map(|s| {
            let points = s
                .story_points
                .map(|p| format!(" ({} pts)", p))
                .unwrap_or_default();
            format!(
                "{}  [P{}] [{}] {}{}{}",
                s.id,
                s.priority,
                s.sprint_status,
                s.title,
                points,
                assignee_suffix(state, s.assigned_user_id.as_deref())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Report::new(serde_json::to_value(&stories)?, human))
}

pub fn list_tasks(engine: &Engine, story: Option<String>) -> Result<Report> {
    let state = &engine.state;
    let tasks: Vec<&Task> = match story {
        Some(s) => state
            .arena
            .child_ids(NodeKind::Task, Some(s.as_str()))
            .iter()
            .filter_map(|id| state.arena.task(id))
            .collect(),
        None => state.arena.tasks_in_order(),
    };
    let human = tasks
        .iter()
        .map(|t| {
            let hours = t
                .estimated_hours
                .map(|h| format!(" ({}h)", h))
                .unwrap_or_default();
            format!(
                "{}  [P{}] [{}] {}{}{}",
                t.id,
                t.priority,
                t.sprint_status,
                t.title,
                hours,
                assignee_suffix(state, t.assigned_user_id.as_deref())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Report::new(serde_json::to_value(&tasks)?, human))
}

// === Selection / view ===

pub fn select(engine: &mut Engine, level: &str, id: Option<String>, none: bool) -> Result<Report> {
    let level: SelectLevel = level.parse()?;
    let id = if none {
        None
    } else {
        match id {
            Some(id) => Some(id),
            None => {
                return Err(Error::InvalidInput(
                    "Provide an id to select, or --none to clear".to_string(),
                ))
            }
        }
    };
    engine.dispatch(Action::Select {
        level,
        id: id.clone(),
    })?;
    let selection = &engine.state.selection;
    let human = match &id {
        Some(id) => format!("Selected {} {}", level, id),
        None => format!("Cleared {} selection", level),
    };
    Ok(Report::new(serde_json::to_value(selection)?, human))
}

pub fn set_view(engine: &mut Engine, mode: &str) -> Result<Report> {
    let view: ViewMode = mode.parse()?;
    engine.dispatch(Action::SetView(view))?;
    Ok(Report::new(
        json!({ "view": view }),
        format!("Switched to {} view", view),
    ))
}

// === Tree ===

pub fn tree(engine: &Engine, all: bool) -> Result<Report> {
    let state = &engine.state;
    let selection = &state.selection;

    // Deepest live selection scopes the view
    if !all {
        if let Some(id) = &selection.user_story {
            let story = state
                .arena
                .story_tree(id)
                .ok_or_else(|| Error::NodeNotFound(format!("user-story {}", id)))?;
            let mut human = String::new();
            render_story_tree(state, &story, 0, &mut human);
            return Ok(Report::new(serde_json::to_value(&story)?, human));
        }
        if let Some(id) = &selection.epic {
            let epic = state
                .arena
                .epic_tree(id)
                .ok_or_else(|| Error::NodeNotFound(format!("epic {}", id)))?;
            let mut human = String::new();
            render_epic_tree(state, &epic, 0, &mut human);
            return Ok(Report::new(serde_json::to_value(&epic)?, human));
        }
        if let Some(id) = &selection.feature {
            let feature = state
                .arena
                .feature_tree(id)
                .ok_or_else(|| Error::NodeNotFound(format!("feature {}", id)))?;
            let mut human = String::new();
            render_feature_tree(state, &feature, 0, &mut human);
            return Ok(Report::new(serde_json::to_value(&feature)?, human));
        }
        if let Some(id) = &selection.product {
            let product = state
                .arena
                .product_tree(id)
                .ok_or_else(|| Error::NodeNotFound(format!("product {}", id)))?;
            let mut human = String::new();
            render_product_tree(state, &product, 0, &mut human);
            return Ok(Report::new(serde_json::to_value(&product)?, human));
        }
    }

    let trees = state.arena.tree();
    let mut human = String::new();
    for tree in &trees {
        render_product_tree(state, tree, 0, &mut human);
    }
    if human.is_empty() {
        human = "No products yet. Try `tl product create` or `tl system seed`.".to_string();
    }
    Ok(Report::new(serde_json::to_value(&trees)?, human))
}

// === Board ===

pub fn board(engine: &Engine, all: bool) -> Result<Report> {
    let state = &engine.state;
    let current = state.current_sprint();

    let included = |sprint_id: Option<&str>| -> bool {
        if all {
            return true;
        }
        match current {
            // Current-sprint members plus unscheduled items
            Some(sprint) => sprint_id.is_none() || sprint_id == Some(sprint.id.as_str()),
            None => true,
        }
    };

    let stories = state.arena.stories_in_order();
    let tasks = state.arena.tasks_in_order();

    let mut columns = Vec::new();
    let mut human = String::new();
    for column in SprintStatus::columns() {
        let column_stories: Vec<&&UserStory> = stories
            .iter()
            .filter(|s| s.sprint_status == *column && included(s.sprint_id.as_deref()))
            .collect();
        let column_tasks: Vec<&&Task> = tasks
            .iter()
            .filter(|t| t.sprint_status == *column && included(t.sprint_id.as_deref()))
            .collect();

        human.push_str(&format!(
            "{} ({})\n",
            column.title(),
            column_stories.len() + column_tasks.len()
        ));
        for story in &column_stories {
            let points = story
                .story_points
                .map(|p| format!(" ({} pts)", p))
                .unwrap_or_default();
            human.push_str(&format!(
                "  [story] {}  [P{}] {}{}{}\n",
                story.id,
                story.priority,
                story.title,
                points,
                assignee_suffix(state, story.assigned_user_id.as_deref())
            ));
        }
        for task in &column_tasks {
            let hours = task
                .estimated_hours
                .map(|h| format!(" ({}h)", h))
                .unwrap_or_default();
            human.push_str(&format!(
                "  [task] {}  [P{}] {}{}{}\n",
                task.id,
                task.priority,
                task.title,
                hours,
                assignee_suffix(state, task.assigned_user_id.as_deref())
            ));
        }

        columns.push(json!({
            "id": column,
            "title": column.title(),
            "user_stories": column_stories.iter().map(|s| serde_json::to_value(s).unwrap_or(Value::Null)).collect::<Vec<_>>(),
            "tasks": column_tasks.iter().map(|t| serde_json::to_value(t).unwrap_or(Value::Null)).collect::<Vec<_>>(),
        }));
    }

    let json = json!({
        "current_sprint": current.map(|s| s.id.clone()),
        "columns": columns,
    });
    Ok(Report::new(json, human.trim_end().to_string()))
}

pub fn board_move(engine: &mut Engine, id: String, column: &str) -> Result<Report> {
    let status: SprintStatus = column.parse()?;
    let kind = resolve_item_kind(&engine.state, &id)?;
    engine.dispatch(Action::MoveToColumn {
        kind,
        id: id.clone(),
        status,
    })?;
    Ok(Report::new(
        json!({ "id": id, "kind": kind, "sprint_status": status }),
        format!("Moved {} {} to {}", kind, id, status),
    ))
}

// === Users ===

pub fn create_user(
    engine: &mut Engine,
    name: String,
    email: String,
    role: Option<String>,
    avatar: Option<String>,
) -> Result<Report> {
    validate_title(&name, "User name")?;
    validate_title(&email, "Email")?;
    let mut user = User::new(generate_id("ur", &name), name, email);
    if let Some(r) = role {
        user.role = r.parse()?;
    }
    user.avatar = avatar;
    let human = format!("Added {} ({}) as {}", user.name, user.id, user.role);
    let json = serde_json::to_value(&user)?;
    engine.dispatch(Action::AddUser(user))?;
    Ok(Report::new(json, human))
}

pub fn list_users(engine: &Engine) -> Result<Report> {
    let state = &engine.state;
    let entries: Vec<Value> = state
        .users
        .iter()
        .map(|user| {
            let stats = user_stats(state, &user.id);
            json!({
                "id": user.id,
                "name": user.name,
                "email": user.email,
                "role": user.role,
                "avatar": user.avatar,
                "assigned": {
                    "features": stats.0,
                    "epics": stats.1,
                    "user_stories": stats.2,
                    "tasks": stats.3,
                },
            })
        })
        .collect();
    let human = state
        .users
        .iter()
        .map(|user| {
            let (f, e, s, t) = user_stats(state, &user.id);
            format!(
                "{}  {} <{}> ({})  {}f/{}e/{}s/{}t",
                user.id, user.name, user.email, user.role, f, e, s, t
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Report::new(Value::Array(entries), human))
}

pub fn update_user(
    engine: &mut Engine,
    id: String,
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    avatar: Option<String>,
) -> Result<Report> {
    let mut user = engine
        .state
        .user(&id)
        .cloned()
        .ok_or_else(|| Error::NodeNotFound(format!("user {}", id)))?;
    if let Some(n) = name {
        validate_title(&n, "User name")?;
        user.name = n;
    }
    if let Some(e) = email {
        validate_title(&e, "Email")?;
        user.email = e;
    }
    if let Some(r) = role {
        user.role = r.parse()?;
    }
    if avatar.is_some() {
        user.avatar = avatar;
    }
    let json = serde_json::to_value(&user)?;
    engine.dispatch(Action::UpdateUser(user))?;
    Ok(Report::new(json, format!("Updated user {}", id)))
}

pub fn delete_user(engine: &mut Engine, id: String) -> Result<Report> {
    let effects = engine.dispatch(Action::DeleteUser { id: id.clone() })?;
    let unassigned = effects
        .iter()
        .filter(|e| matches!(e, crate::state::Effect::UpdateNode { .. }))
        .count();
    let human = if effects.is_empty() {
        format!("user {} was already absent", id)
    } else {
        format!("Deleted user {} (unassigned {} items)", id, unassigned)
    };
    Ok(Report::new(
        json!({ "deleted": !effects.is_empty(), "unassigned": unassigned }),
        human,
    ))
}

/// Assignment counts per level: (features, epics, stories, tasks).
fn user_stats(state: &BacklogState, user_id: &str) -> (usize, usize, usize, usize) {
    let mut features = 0;
    let mut epics = 0;
    let mut stories = 0;
    let mut tasks = 0;
    for tree in state.arena.tree() {
        for feature in &tree.features {
            if feature.feature.assigned_user_id.as_deref() == Some(user_id) {
                features += 1;
            }
            for epic in &feature.epics {
                if epic.epic.assigned_user_id.as_deref() == Some(user_id) {
                    epics += 1;
                }
                for story in &epic.user_stories {
                    if story.story.assigned_user_id.as_deref() == Some(user_id) {
                        stories += 1;
                    }
                    for task in &story.tasks {
                        if task.assigned_user_id.as_deref() == Some(user_id) {
                            tasks += 1;
                        }
                    }
                }
            }
        }
    }
    (features, epics, stories, tasks)
}

// === Sprints ===

pub fn create_sprint(
    engine: &mut Engine,
    name: String,
    start: Option<String>,
    end: Option<String>,
    status: Option<String>,
) -> Result<Report> {
    validate_title(&name, "Sprint name")?;
    let start = match start {
        Some(s) => parse_date(&s)?,
        None => chrono::Utc::now(),
    };
    let end = match end {
        Some(e) => parse_date(&e)?,
        None => start + chrono::Duration::days(14),
    };
    if end <= start {
        return Err(Error::InvalidInput(
            "Sprint end must be after its start".to_string(),
        ));
    }
    let mut sprint = Sprint::new(generate_id("sp", &name), name, start, end);
    if let Some(s) = status {
        sprint.status = s.parse::<SprintPhase>()?;
    }
    let json = serde_json::to_value(&sprint)?;
    let human = format!("Created sprint {} \"{}\"", sprint.id, sprint.name);
    engine.dispatch(Action::AddSprint(sprint))?;
    Ok(Report::new(json, human))
}

pub fn list_sprints(engine: &Engine) -> Result<Report> {
    let sprints = &engine.state.sprints;
    let human = sprints
        .iter()
        .map(render_sprint)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Report::new(serde_json::to_value(sprints)?, human))
}

pub fn set_current_sprint(engine: &mut Engine, id: String) -> Result<Report> {
    engine.dispatch(Action::SetCurrentSprint { id: id.clone() })?;
    Ok(Report::new(
        json!({ "current_sprint": id }),
        format!("Sprint {} is now current", id),
    ))
}

pub fn assign_to_sprint(
    engine: &mut Engine,
    item_id: String,
    sprint_id: Option<String>,
    none: bool,
) -> Result<Report> {
    let sprint = if none {
        None
    } else {
        match sprint_id {
            Some(id) => Some(id),
            None => {
                return Err(Error::InvalidInput(
                    "Provide a sprint id, or --none to detach".to_string(),
                ))
            }
        }
    };
    let kind = resolve_item_kind(&engine.state, &item_id)?;
    engine.dispatch(Action::AssignToSprint {
        kind,
        id: item_id.clone(),
        sprint: sprint.clone(),
    })?;
    let human = match &sprint {
        Some(s) => format!("Assigned {} {} to sprint {}", kind, item_id, s),
        None => format!("Detached {} {} from its sprint", kind, item_id),
    };
    Ok(Report::new(
        json!({ "id": item_id, "kind": kind, "sprint_id": sprint }),
        human,
    ))
}

// === System ===

pub fn system_init(workspace: &std::path::Path) -> Result<Report> {
    let existed = crate::store::SqliteStore::exists(workspace)?;
    let store = crate::store::SqliteStore::open(workspace)?;
    let location = store.root.display().to_string();
    let human = if existed {
        format!("Already initialized at {}", location)
    } else {
        format!("Initialized tiller at {}", location)
    };
    Ok(Report::new(
        json!({ "initialized": !existed, "location": location }),
        human,
    ))
}

pub fn system_seed(engine: &mut Engine) -> Result<Report> {
    engine.install_sample_data();
    engine.write_through_all()?;
    let counts: Vec<Value> = engine
        .state
        .arena
        .counts()
        .into_iter()
        .map(|(kind, n)| json!({ "kind": kind, "count": n }))
        .collect();
    Ok(Report::new(
        json!({
            "seeded": true,
            "nodes": counts,
            "users": engine.state.users.len(),
            "sprints": engine.state.sprints.len(),
        }),
        "Loaded sample data".to_string(),
    ))
}

pub fn system_info(engine: &Engine) -> Result<Report> {
    let state = &engine.state;
    let (location, store_type) = engine
        .store_info()
        .unwrap_or_else(|| ("(in-memory)".to_string(), "none"));
    let counts: Vec<Value> = state
        .arena
        .counts()
        .into_iter()
        .map(|(kind, n)| json!({ "kind": kind, "count": n }))
        .collect();
    let json = json!({
        "version": env!("CARGO_PKG_VERSION"),
        "build_timestamp": env!("TL_BUILD_TIMESTAMP"),
        "git_commit": env!("TL_GIT_COMMIT"),
        "store": { "type": store_type, "location": location },
        "nodes": counts,
        "users": state.users.len(),
        "sprints": state.sprints.len(),
        "current_sprint": state.current_sprint().map(|s| s.id.clone()),
        "view": state.view,
    });
    let human = format!(
        "tiller {} ({})\nstore: {} at {}\nnodes: {}  users: {}  sprints: {}\nview: {}",
        env!("CARGO_PKG_VERSION"),
        env!("TL_GIT_COMMIT"),
        store_type,
        location,
        state.arena.len(),
        state.users.len(),
        state.sprints.len(),
        state.view,
    );
    Ok(Report::new(json, human))
}

/// Parse an RFC 3339 timestamp or a bare YYYY-MM-DD date (midnight UTC).
fn parse_date(s: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    if let Ok(t) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&chrono::Utc));
    }
    let date = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Error::InvalidInput(format!("Not a date: {}", s)))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::InvalidInput(format!("Not a date: {}", s)))?;
    Ok(chrono::DateTime::from_naive_utc_and_offset(
        midnight,
        chrono::Utc,
    ))
}

// === Human rendering ===

fn enum_label<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .map(|s| s.trim_matches('"').to_string())
        .unwrap_or_default()
}

fn assignee_suffix(state: &BacklogState, id: Option<&str>) -> String {
    assignee_name(state, id)
        .map(|name| format!("  @{}", name))
        .unwrap_or_default()
}

fn render_node(state: &BacklogState, node: &Node) -> String {
    match node {
        Node::Product(p) => format!("{}  {} (v{})\n{}", p.id, p.name, p.version, p.description),
        Node::Feature(f) => format!(
            "{}  [P{}] {}{}\n{}",
            f.id,
            f.priority,
            f.name,
            assignee_suffix(state, f.assigned_user_id.as_deref()),
            f.description
        ),
        Node::Epic(e) => format!(
            "{}  [P{}] [{}] {}{}\n{}",
            e.id,
            e.priority,
            enum_label(&e.status),
            e.title,
            assignee_suffix(state, e.assigned_user_id.as_deref()),
            e.description
        ),
        Node::UserStory(s) => {
            let mut out = format!(
                "{}  [P{}] [{} | {}] {}{}\n{}",
                s.id,
                s.priority,
                enum_label(&s.status),
                s.sprint_status,
                s.title,
                assignee_suffix(state, s.assigned_user_id.as_deref()),
                s.description
            );
            if !s.acceptance_criteria.is_empty() {
                out.push_str("\nAcceptance criteria:");
                for criterion in &s.acceptance_criteria {
                    out.push_str(&format!("\n  - {}", criterion));
                }
            }
            out
        }
        Node::Task(t) => format!(
            "{}  [P{}] [{} | {}] {}{}\n{}",
            t.id,
            t.priority,
            enum_label(&t.status),
            t.sprint_status,
            t.title,
            assignee_suffix(state, t.assigned_user_id.as_deref()),
            t.description
        ),
    }
}

fn render_sprint(sprint: &Sprint) -> String {
    format!(
        "{}  {} [{}]{}  {} -> {}",
        sprint.id,
        sprint.name,
        enum_label(&sprint.status),
        if sprint.is_current { " (current)" } else { "" },
        sprint.start_date.format("%Y-%m-%d"),
        sprint.end_date.format("%Y-%m-%d"),
    )
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn render_product_tree(
    state: &BacklogState,
    tree: &crate::models::tree::ProductTree,
    depth: usize,
    out: &mut String,
) {
    out.push_str(&format!(
        "{}{}  {} (v{})\n",
        indent(depth),
        tree.product.id,
        tree.product.name,
        tree.product.version
    ));
    for feature in &tree.features {
        render_feature_tree(state, feature, depth + 1, out);
    }
}

fn render_feature_tree(
    state: &BacklogState,
    tree: &crate::models::tree::FeatureTree,
    depth: usize,
    out: &mut String,
) {
    out.push_str(&format!(
        "{}{}  [P{}] {}{}\n",
        indent(depth),
        tree.feature.id,
        tree.feature.priority,
        tree.feature.name,
        assignee_suffix(state, tree.feature.assigned_user_id.as_deref())
    ));
    for epic in &tree.epics {
        render_epic_tree(state, epic, depth + 1, out);
    }
}

fn render_epic_tree(
    state: &BacklogState,
    tree: &crate::models::tree::EpicTree,
    depth: usize,
    out: &mut String,
) {
    out.push_str(&format!(
        "{}{}  [P{}] [{}] {}{}\n",
        indent(depth),
        tree.epic.id,
        tree.epic.priority,
        enum_label(&tree.epic.status),
        tree.epic.title,
        assignee_suffix(state, tree.epic.assigned_user_id.as_deref())
    ));
    for story in &tree.user_stories {
        render_story_tree(state, story, depth + 1, out);
    }
}

fn render_story_tree(
    state: &BacklogState,
    tree: &crate::models::tree::StoryTree,
    depth: usize,
    out: &mut String,
) {
    let points = tree
        .story
        .story_points
        .map(|p| format!(" ({} pts)", p))
        .unwrap_or_default();
    out.push_str(&format!(
        "{}{}  [P{}] [{}] {}{}{}\n",
        indent(depth),
        tree.story.id,
        tree.story.priority,
        tree.story.sprint_status,
        tree.story.title,
        points,
        assignee_suffix(state, tree.story.assigned_user_id.as_deref())
    ));
    for task in &tree.tasks {
        let hours = task
            .estimated_hours
            .map(|h| format!(" ({}h)", h))
            .unwrap_or_default();
        out.push_str(&format!(
            "{}{}  [P{}] [{}] {}{}{}\n",
            indent(depth + 1),
            task.id,
            task.priority,
            task.sprint_status,
            task.title,
            hours,
            assignee_suffix(state, task.assigned_user_id.as_deref())
        ));
    }
}
