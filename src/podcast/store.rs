use std::collections::HashMap;
use std::sync::RwLock;

use super::models::Project;

/// Concurrency-safe map of all projects, read by request handlers and
/// mutated by the episode worker. Process-lifetime scope, no eviction.
pub struct ProjectStore {
    projects: RwLock<HashMap<String, Project>>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self { projects: RwLock::new(HashMap::new()) }
    }

    pub fn insert(&self, project: Project) -> String {
        let id = project.id.clone();
        self.projects.write().unwrap().insert(id.clone(), project);
        id
    }

    pub fn get(&self, id: &str) -> Option<Project> {
        self.projects.read().unwrap().get(id).cloned()
    }

    pub fn list(&self) -> Vec<String> {
        self.projects.read().unwrap().keys().cloned().collect()
    }

    /// Apply a mutation to a project in place. Returns false when the id is
    /// unknown.
    pub fn with_mut<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Project),
    {
        let mut projects = self.projects.write().unwrap();
        match projects.get_mut(id) {
            Some(project) => {
                f(project);
                true
            }
            None => false,
        }
    }
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::podcast::models::{Persona, ProjectStatus};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn sample_project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: "Test".into(),
            book_content: String::new(),
            book_filename: String::new(),
            num_episodes: 3,
            style: "conversational".into(),
            personas: Persona::default_hosts(),
            outline: None,
            episodes: BTreeMap::new(),
            status: ProjectStatus::Created,
            current_episode: None,
            progress: None,
            dir: PathBuf::from("/tmp/test"),
        }
    }

    #[test]
    fn insert_get_list() {
        let store = ProjectStore::new();
        store.insert(sample_project("p1"));
        assert!(store.get("p1").is_some());
        assert!(store.get("p2").is_none());
        assert_eq!(store.list(), vec!["p1".to_string()]);
    }

    #[test]
    fn with_mut_updates_in_place() {
        let store = ProjectStore::new();
        store.insert(sample_project("p1"));

        assert!(store.with_mut("p1", |p| p.status = ProjectStatus::OutlineReady));
        assert_eq!(store.get("p1").unwrap().status, ProjectStatus::OutlineReady);

        assert!(!store.with_mut("missing", |_| {}));
    }
}
