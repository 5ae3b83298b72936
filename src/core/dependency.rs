use crate::utils::error::{BinderError, Result};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

/// Reverse edges from a referenced name to the calculated properties using it,
/// plus the forward edges each calculated property owns.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    dependents: IndexMap<String, IndexSet<String>>,
    owned: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculated properties whose template references `name`, in declaration order.
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.dependents
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn references_of(&self, calculated: &str) -> &[String] {
        self.owned
            .get(calculated)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Replaces every edge owned by `calculated` with edges to `references`.
    /// Fails without touching the graph when that would close a cycle.
    pub fn declare(&mut self, calculated: &str, references: &[String]) -> Result<()> {
        if let Some(cycle) = self.find_cycle(calculated, references) {
            return Err(BinderError::DependencyCycle {
                property: calculated.to_string(),
                cycle,
            });
        }

        self.remove(calculated);
        for reference in references {
            self.dependents
                .entry(reference.clone())
                .or_default()
                .insert(calculated.to_string());
        }
        self.owned
            .insert(calculated.to_string(), references.to_vec());

        tracing::debug!(
            "Declared {} with {} dependency edge(s)",
            calculated,
            references.len()
        );
        Ok(())
    }

    pub fn remove(&mut self, calculated: &str) {
        let Some(previous) = self.owned.shift_remove(calculated) else {
            return;
        };
        for reference in previous {
            if let Some(set) = self.dependents.get_mut(&reference) {
                set.shift_remove(calculated);
                if set.is_empty() {
                    self.dependents.shift_remove(&reference);
                }
            }
        }
    }

    /// Path `calculated -> ... -> calculated` the new references would create.
    pub fn find_cycle(&self, calculated: &str, references: &[String]) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        for reference in references {
            let mut path = vec![calculated.to_string()];
            if self.reaches(reference, calculated, &mut visited, &mut path) {
                return Some(path);
            }
        }
        None
    }

    fn reaches(
        &self,
        current: &str,
        target: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> bool {
        path.push(current.to_string());
        if current == target {
            return true;
        }

        if visited.insert(current.to_string()) {
            for next in self.references_of(current) {
                if self.reaches(next, target, visited, path) {
                    return true;
                }
            }
        }

        path.pop();
        false
    }

    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(IndexSet::len).sum()
    }

    pub fn clear(&mut self) {
        self.dependents.clear();
        self.owned.clear();
    }
}
