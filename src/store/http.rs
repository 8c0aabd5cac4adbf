//! HTTP store backend.
//!
//! Blocking JSON client for a hosted backlog backend, selected with the
//! `TL_REMOTE` environment variable. The wire shapes are the same tagged
//! JSON the models serialize to; endpoints follow a flat REST layout:
//!
//! ```text
//! GET    /tree                         full nested tree
//! GET    /users  /sprints
//! POST   /<kind>                       create node (tagged body)
//! PUT    /<kind>/<id>                  full update
//! PATCH  /<kind>/<id>                  field patch (positions)
//! DELETE /<kind>/<id>
//! POST   /<kind>/<id>/sprint-status    { "status": ... }
//! POST   /<kind>/<id>/sprint           { "sprint_id": ...|null }
//! POST   /sprints/<id>/current
//! GET/PUT /ui-state
//! ```
//!
//! Every failure maps to `Error::RemoteSync`; the engine logs and keeps
//! the in-memory state.

use std::time::Duration;

use serde_json::json;

use super::RemoteStore;
use crate::models::tree::ProductTree;
use crate::models::{ItemKind, Node, NodeKind, Sprint, SprintStatus, User};
use crate::state::UiState;
use crate::{Error, Result};

/// HTTP-backed store for a hosted backend.
pub struct HttpStore {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpStore {
    /// Create a client for the given base URL.
    pub fn new(base_url: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.agent
            .get(&self.url(path))
            .call()
            .map_err(remote_err)?
            .into_json()
            .map_err(|e| Error::RemoteSync(e.to_string()))
    }

    fn send_json(&self, method: &str, path: &str, body: &serde_json::Value) -> Result<()> {
        self.agent
            .request(method, &self.url(path))
            .send_json(body.clone())
            .map_err(remote_err)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.agent
            .delete(&self.url(path))
            .call()
            .map_err(remote_err)?;
        Ok(())
    }
}

impl RemoteStore for HttpStore {
    fn fetch_tree(&self) -> Result<Vec<ProductTree>> {
        self.get_json("tree")
    }

    fn fetch_users(&self) -> Result<Vec<User>> {
        self.get_json("users")
    }

    fn fetch_sprints(&self) -> Result<Vec<Sprint>> {
        self.get_json("sprints")
    }

    fn create_node(&mut self, node: &Node) -> Result<()> {
        let body = serde_json::to_value(node)?;
        self.send_json("POST", path_for(node.kind()), &body)
    }

    fn update_node(&mut self, node: &Node) -> Result<()> {
        let body = serde_json::to_value(node)?;
        self.send_json(
            "PUT",
            &format!("{}/{}", path_for(node.kind()), node.id()),
            &body,
        )
    }

    fn update_field(
        &mut self,
        id: &str,
        kind: NodeKind,
        fields: &serde_json::Value,
    ) -> Result<()> {
        self.send_json("PATCH", &format!("{}/{}", path_for(kind), id), fields)
    }

    fn delete_node(&mut self, kind: NodeKind, id: &str) -> Result<()> {
        self.delete(&format!("{}/{}", path_for(kind), id))
    }

    fn create_user(&mut self, user: &User) -> Result<()> {
        self.send_json("POST", "users", &serde_json::to_value(user)?)
    }

    fn update_user(&mut self, user: &User) -> Result<()> {
        self.send_json(
            "PUT",
            &format!("users/{}", user.id),
            &serde_json::to_value(user)?,
        )
    }

    fn delete_user(&mut self, id: &str) -> Result<()> {
        self.delete(&format!("users/{}", id))
    }

    fn create_sprint(&mut self, sprint: &Sprint) -> Result<()> {
        self.send_json("POST", "sprints", &serde_json::to_value(sprint)?)
    }

    fn update_sprint(&mut self, sprint: &Sprint) -> Result<()> {
        self.send_json(
            "PUT",
            &format!("sprints/{}", sprint.id),
            &serde_json::to_value(sprint)?,
        )
    }

    fn set_sprint_status(
        &mut self,
        id: &str,
        kind: ItemKind,
        status: SprintStatus,
    ) -> Result<()> {
        self.send_json(
            "POST",
            &format!("{}/{}/sprint-status", path_for(kind.node_kind()), id),
            &json!({ "status": status }),
        )
    }

    fn assign_to_sprint(&mut self, id: &str, kind: ItemKind, sprint: Option<&str>) -> Result<()> {
        self.send_json(
            "POST",
            &format!("{}/{}/sprint", path_for(kind.node_kind()), id),
            &json!({ "sprint_id": sprint }),
        )
    }

    fn set_current_sprint(&mut self, id: &str) -> Result<()> {
        self.send_json("POST", &format!("sprints/{}/current", id), &json!({}))
    }

    fn load_ui_state(&self) -> Result<Option<UiState>> {
        match self.agent.get(&self.url("ui-state")).call() {
            Ok(resp) => Ok(Some(
                resp.into_json()
                    .map_err(|e| Error::RemoteSync(e.to_string()))?,
            )),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(remote_err(e)),
        }
    }

    fn save_ui_state(&mut self, ui: &UiState) -> Result<()> {
        self.send_json("PUT", "ui-state", &serde_json::to_value(ui)?)
    }

    fn location(&self) -> String {
        self.base_url.clone()
    }

    fn store_type(&self) -> &'static str {
        "http"
    }
}

fn path_for(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Product => "products",
        NodeKind::Feature => "features",
        NodeKind::Epic => "epics",
        NodeKind::UserStory => "user-stories",
        NodeKind::Task => "tasks",
    }
}

fn remote_err(e: ureq::Error) -> Error {
    Error::RemoteSync(e.to_string())
}
