//! In-memory organization directory

use super::HierarchyProvider;
use crate::error::{AuthzError, HierarchyResult, Result};
use crate::types::{DepartmentId, EmployeeId, PropertyId, UserContext, UserId};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Serializable directory contents
///
/// ```json
/// {
///   "manager_roles": ["property_manager"],
///   "properties": [
///     {
///       "id": "P1",
///       "managers": ["user-7"],
///       "departments": [{ "id": "D1", "employees": ["E1", "E2"] }]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    /// Role names that grant property-wide access on the assignment's property
    #[serde(default)]
    pub manager_roles: Vec<String>,

    #[serde(default)]
    pub properties: Vec<PropertySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub id: PropertyId,

    /// Users that manage the whole property
    #[serde(default)]
    pub managers: Vec<UserId>,

    #[serde(default)]
    pub departments: Vec<DepartmentSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentSnapshot {
    pub id: DepartmentId,

    #[serde(default)]
    pub employees: Vec<EmployeeId>,
}

#[derive(Debug, Default)]
struct PropertyNode {
    departments: BTreeSet<DepartmentId>,
    employees: HashMap<EmployeeId, DepartmentId>,
}

/// Thread-safe in-memory directory
///
/// An employee belongs to exactly one department per property; adding an
/// employee again moves them.
#[derive(Debug, Default)]
pub struct InMemoryHierarchy {
    properties: DashMap<PropertyId, PropertyNode>,
    managers: DashMap<UserId, BTreeSet<PropertyId>>,
    manager_roles: DashSet<String>,
}

impl InMemoryHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a snapshot
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        let directory = Self::new();

        for role in snapshot.manager_roles {
            directory.manager_roles.insert(role);
        }

        for property in snapshot.properties {
            let mut node = PropertyNode::default();
            for department in property.departments {
                for employee in department.employees {
                    node.employees.insert(employee, department.id.clone());
                }
                node.departments.insert(department.id);
            }
            for manager in property.managers {
                directory
                    .managers
                    .entry(manager)
                    .or_default()
                    .insert(property.id.clone());
            }
            directory.properties.insert(property.id, node);
        }

        debug!(
            properties = directory.properties.len(),
            managers = directory.managers.len(),
            "Loaded in-memory organization directory"
        );
        directory
    }

    /// Load a JSON [`DirectorySnapshot`] from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AuthzError::Config(format!("Failed to read directory file {}: {}", path.display(), e))
        })?;
        let snapshot: DirectorySnapshot = serde_json::from_str(&raw).map_err(|e| {
            AuthzError::Config(format!("Failed to parse directory file {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), "Organization directory loaded from file");
        Ok(Self::from_snapshot(snapshot))
    }

    /// Register a department under a property
    pub fn add_department(&self, property_id: &str, department_id: &str) -> Result<()> {
        let property = PropertyId::parse(property_id)?;
        let department = DepartmentId::parse(department_id)?;
        self.properties
            .entry(property)
            .or_default()
            .departments
            .insert(department);
        Ok(())
    }

    /// Register an employee in a department, creating the department if needed
    pub fn add_employee(&self, property_id: &str, department_id: &str, employee_id: &str) -> Result<()> {
        let property = PropertyId::parse(property_id)?;
        let department = DepartmentId::parse(department_id)?;
        let employee = EmployeeId::parse(employee_id)?;

        let mut node = self.properties.entry(property).or_default();
        node.departments.insert(department.clone());
        node.employees.insert(employee, department);
        Ok(())
    }

    /// Make a user manager of a whole property
    pub fn add_manager(&self, user_id: &str, property_id: &str) -> Result<()> {
        let user = UserId::parse(user_id)?;
        let property = PropertyId::parse(property_id)?;
        self.managers.entry(user).or_default().insert(property);
        Ok(())
    }

    /// Treat assignments carrying this role as property-wide on their property
    pub fn add_manager_role(&self, role: impl Into<String>) {
        self.manager_roles.insert(role.into());
    }

    /// Number of properties known to the directory
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

#[async_trait]
impl HierarchyProvider for InMemoryHierarchy {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn employee_department(
        &self,
        property: &PropertyId,
        employee: &EmployeeId,
    ) -> HierarchyResult<Option<DepartmentId>> {
        Ok(self
            .properties
            .get(property)
            .and_then(|node| node.employees.get(employee).cloned()))
    }

    async fn property_departments(&self, property: &PropertyId) -> HierarchyResult<Vec<DepartmentId>> {
        Ok(self
            .properties
            .get(property)
            .map(|node| node.departments.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn has_property_wide_grant(
        &self,
        user: &UserContext,
        property: &PropertyId,
    ) -> HierarchyResult<bool> {
        let explicit = self
            .managers
            .get(&user.user_id)
            .map(|properties| properties.contains(property))
            .unwrap_or(false);
        if explicit {
            return Ok(true);
        }

        Ok(user.assignments.iter().any(|assignment| {
            assignment.property_id.as_ref() == Some(property)
                && assignment
                    .role
                    .as_ref()
                    .map(|role| self.manager_roles.contains(role))
                    .unwrap_or(false)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoleAssignment;
    use std::io::Write;

    fn pid(s: &str) -> PropertyId {
        PropertyId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_employee_lookup() {
        let directory = InMemoryHierarchy::new();
        directory.add_employee("P1", "D1", "E1").unwrap();

        let found = directory
            .employee_department(&pid("P1"), &EmployeeId::parse("E1").unwrap())
            .await
            .unwrap();
        assert_eq!(found, Some(DepartmentId::parse("D1").unwrap()));

        // Same employee id under another property is unknown
        let missing = directory
            .employee_department(&pid("P2"), &EmployeeId::parse("E1").unwrap())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_employee_moves_department() {
        let directory = InMemoryHierarchy::new();
        directory.add_employee("P1", "D1", "E1").unwrap();
        directory.add_employee("P1", "D2", "E1").unwrap();

        let found = directory
            .employee_department(&pid("P1"), &EmployeeId::parse("E1").unwrap())
            .await
            .unwrap();
        assert_eq!(found, Some(DepartmentId::parse("D2").unwrap()));
        assert_eq!(directory.property_departments(&pid("P1")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_property_has_no_departments() {
        let directory = InMemoryHierarchy::new();
        assert!(directory.property_departments(&pid("P9")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_manager_grants() {
        let directory = InMemoryHierarchy::new();
        directory.add_manager("alice", "P1").unwrap();
        directory.add_manager_role("property_manager");

        let alice = UserContext::new("alice").unwrap();
        assert!(directory.has_property_wide_grant(&alice, &pid("P1")).await.unwrap());
        assert!(!directory.has_property_wide_grant(&alice, &pid("P2")).await.unwrap());

        let bob = UserContext::new("bob")
            .unwrap()
            .with_assignment(RoleAssignment::property("P2").unwrap().with_role("property_manager"));
        assert!(directory.has_property_wide_grant(&bob, &pid("P2")).await.unwrap());
        assert!(!directory.has_property_wide_grant(&bob, &pid("P1")).await.unwrap());

        let carol = UserContext::new("carol")
            .unwrap()
            .with_assignment(RoleAssignment::property("P2").unwrap().with_role("scheduler"));
        assert!(!directory.has_property_wide_grant(&carol, &pid("P2")).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "manager_roles": ["property_manager"],
                "properties": [
                    {{
                        "id": "P1",
                        "managers": ["alice"],
                        "departments": [
                            {{"id": "D1", "employees": ["E1", "E2"]}},
                            {{"id": "D2"}}
                        ]
                    }}
                ]
            }}"#
        )
        .unwrap();

        let directory = InMemoryHierarchy::from_json_file(file.path()).unwrap();
        assert_eq!(directory.property_count(), 1);
        assert_eq!(directory.property_departments(&pid("P1")).await.unwrap().len(), 2);

        let alice = UserContext::new("alice").unwrap();
        assert!(directory.has_property_wide_grant(&alice, &pid("P1")).await.unwrap());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = InMemoryHierarchy::from_json_file("/nonexistent/directory.json");
        assert!(matches!(result, Err(AuthzError::Config(_))));
    }
}
