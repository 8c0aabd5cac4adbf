//! Sample backlog data.
//!
//! Used as the fallback dataset when the store is unavailable, and loaded
//! explicitly by `tl system seed`. The structure is fixed; ids are freshly
//! generated on every call.

use chrono::{Duration, Utc};

use crate::models::tree::{EpicTree, FeatureTree, ProductTree, StoryTree};
use crate::models::{
    Epic, EpicStatus, Feature, Product, Sprint, Task, User, UserRole, UserStory,
};
use crate::store::generate_id;

/// A full sample dataset: one product tree, five users, one sprint.
pub struct SampleData {
    pub products: Vec<ProductTree>,
    pub users: Vec<User>,
    pub sprints: Vec<Sprint>,
}

/// Build the sample team, one member per role.
pub fn sample_users() -> Vec<User> {
    let entries = [
        ("John Doe", "john@example.com", UserRole::ProductOwner),
        ("Jane Smith", "jane@example.com", UserRole::ScrumMaster),
        ("Mike Johnson", "mike@example.com", UserRole::Developer),
        ("Sarah Wilson", "sarah@example.com", UserRole::Designer),
        ("Tom Brown", "tom@example.com", UserRole::Qa),
    ];
    entries
        .into_iter()
        .map(|(name, email, role)| {
            let mut user = User::new(generate_id("ur", name), name.to_string(), email.to_string());
            user.role = role;
            user
        })
        .collect()
}

/// Build the full sample dataset.
pub fn sample_data() -> SampleData {
    let users = sample_users();

    let mut product = Product::new(
        generate_id("pd", "E-Commerce Platform"),
        "E-Commerce Platform".to_string(),
    );
    product.description = "A comprehensive e-commerce solution".to_string();

    let mut feature = Feature::new(
        generate_id("ft", "Authentication System"),
        "Authentication System".to_string(),
        product.id.clone(),
    );
    feature.description = "Handles user authentication and authorization".to_string();
    feature.priority = 9;
    feature.assigned_user_id = Some(users[1].id.clone());

    let mut epic = Epic::new(
        generate_id("ep", "User Management"),
        "User Management".to_string(),
        feature.id.clone(),
    );
    epic.description = "Complete user authentication and profile management system".to_string();
    epic.status = EpicStatus::Planning;
    epic.priority = 8;
    epic.assigned_user_id = Some(users[0].id.clone());

    let mut story = UserStory::new(
        generate_id("us", "User Login"),
        "User Login".to_string(),
        epic.id.clone(),
    );
    story.description = "As a user, I want to log in to access my account".to_string();
    story.acceptance_criteria = vec![
        "User can enter email and password".to_string(),
        "System validates credentials".to_string(),
        "User is redirected to dashboard on success".to_string(),
    ];
    story.story_points = Some(5);
    story.priority = 9;
    story.assigned_user_id = Some(users[2].id.clone());

    let mut task1 = Task::new(
        generate_id("tk", "Implement user authentication"),
        "Implement user authentication".to_string(),
        story.id.clone(),
    );
    task1.description = "Set up login and registration functionality".to_string();
    task1.priority = 8;
    task1.estimated_hours = Some(8.0);
    task1.assigned_user_id = Some(users[2].id.clone());

    let mut task2 = Task::new(
        generate_id("tk", "Create login form UI"),
        "Create login form UI".to_string(),
        story.id.clone(),
    );
    task2.description = "Design and implement the login form interface".to_string();
    task2.priority = 6;
    task2.estimated_hours = Some(4.0);
    task2.assigned_user_id = Some(users[3].id.clone());

    let now = Utc::now();
    let sprint = Sprint::new(
        generate_id("sp", "Sprint 1"),
        "Sprint 1".to_string(),
        now,
        now + Duration::days(14),
    );

    SampleData {
        products: vec![ProductTree {
            product,
            features: vec![FeatureTree {
                feature,
                epics: vec![EpicTree {
                    epic,
                    user_stories: vec![StoryTree {
                        story,
                        tasks: vec![task1, task2],
                    }],
                }],
            }],
        }],
        users,
        sprints: vec![sprint],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_shape() {
        let data = sample_data();
        assert_eq!(data.products.len(), 1);
        assert_eq!(data.products[0].node_count(), 5);
        assert_eq!(data.users.len(), 5);
        assert_eq!(data.sprints.len(), 1);
    }

    #[test]
    fn test_sample_assignments_reference_sample_users() {
        let data = sample_data();
        let user_ids: Vec<&str> = data.users.iter().map(|u| u.id.as_str()).collect();
        let feature = &data.products[0].features[0];
        assert!(user_ids.contains(&feature.feature.assigned_user_id.as_deref().unwrap()));
        for task in &feature.epics[0].user_stories[0].tasks {
            assert!(user_ids.contains(&task.assigned_user_id.as_deref().unwrap()));
        }
    }

    #[test]
    fn test_sample_one_role_each() {
        let data = sample_data();
        let roles: Vec<UserRole> = data.users.iter().map(|u| u.role).collect();
        for role in [
            UserRole::ProductOwner,
            UserRole::ScrumMaster,
            UserRole::Developer,
            UserRole::Designer,
            UserRole::Qa,
        ] {
            assert_eq!(roles.iter().filter(|r| **r == role).count(), 1);
        }
    }

    #[test]
    fn test_sample_sprint_window() {
        let data = sample_data();
        let sprint = &data.sprints[0];
        assert!(sprint.end_date > sprint.start_date);
        assert!(!sprint.is_current);
    }
}
