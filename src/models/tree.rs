//! Nested tree projection of the backlog.
//!
//! The state arena stores flat records; these types are the fully-nested
//! view used for rendering, for `fetch_tree` ingestion, and for JSON output
//! of the `tree` command. Node fields are flattened into each level so the
//! serialized shape reads as one object per node with a child array.

use serde::{Deserialize, Serialize};

use super::{Epic, Feature, Product, Task, UserStory};

/// A product with its full subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTree {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default)]
    pub features: Vec<FeatureTree>,
}

/// A feature with its full subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTree {
    #[serde(flatten)]
    pub feature: Feature,
    #[serde(default)]
    pub epics: Vec<EpicTree>,
}

/// An epic with its full subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpicTree {
    #[serde(flatten)]
    pub epic: Epic,
    #[serde(default)]
    pub user_stories: Vec<StoryTree>,
}

/// A user story with its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryTree {
    #[serde(flatten)]
    pub story: UserStory,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ProductTree {
    /// Wrap a bare product with no children.
    pub fn leaf(product: Product) -> Self {
        Self {
            product,
            features: Vec::new(),
        }
    }

    /// Total node count of this subtree, including the product itself.
    pub fn node_count(&self) -> usize {
        1 + self
            .features
            .iter()
            .map(|f| {
                1 + f
                    .epics
                    .iter()
                    .map(|e| {
                        1 + e
                            .user_stories
                            .iter()
                            .map(|s| 1 + s.tasks.len())
                            .sum::<usize>()
                    })
                    .sum::<usize>()
            })
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Epic, Product};

    fn small_tree() -> ProductTree {
        let product = Product::new("pd-00000001".to_string(), "Shop".to_string());
        let feature = Feature::new(
            "ft-00000001".to_string(),
            "Auth".to_string(),
            product.id.clone(),
        );
        let epic = Epic::new(
            "ep-00000001".to_string(),
            "Login".to_string(),
            feature.id.clone(),
        );
        let story = UserStory::new(
            "us-00000001".to_string(),
            "Sign in".to_string(),
            epic.id.clone(),
        );
        let task = Task::new(
            "tk-00000001".to_string(),
            "Form".to_string(),
            story.id.clone(),
        );

        ProductTree {
            product,
            features: vec![FeatureTree {
                feature,
                epics: vec![EpicTree {
                    epic,
                    user_stories: vec![StoryTree {
                        story,
                        tasks: vec![task],
                    }],
                }],
            }],
        }
    }

    #[test]
    fn test_node_count() {
        assert_eq!(small_tree().node_count(), 5);
        let bare = ProductTree::leaf(Product::new("pd-00000002".to_string(), "Bare".to_string()));
        assert_eq!(bare.node_count(), 1);
    }

    #[test]
    fn test_flattened_serialization() {
        let tree = small_tree();
        let json = serde_json::to_value(&tree).unwrap();
        // Product fields sit at the top level next to the child array
        assert_eq!(json["name"], "Shop");
        assert_eq!(json["features"][0]["name"], "Auth");
        assert_eq!(json["features"][0]["epics"][0]["title"], "Login");
        assert_eq!(
            json["features"][0]["epics"][0]["user_stories"][0]["tasks"][0]["title"],
            "Form"
        );
    }

    #[test]
    fn test_roundtrip() {
        let tree = small_tree();
        let json = serde_json::to_string(&tree).unwrap();
        let back: ProductTree = serde_json::from_str(&json).unwrap();
        assert_eq!(tree, back);
    }
}
