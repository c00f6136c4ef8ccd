//! Declarative API-key description and its persisted state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::body::{RoleDescriptorsBody, role_descriptors_body};
use crate::error::{Error, Result};

/// Desired API key as written by the user.
///
/// `role_descriptors` is a set: order carries no meaning. See
/// [`ApiKeyResource::same_role_descriptors`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeyResource {
    pub name: String,
    pub role_descriptors: Vec<RoleDescriptor>,
}

/// A named bundle of privileges attached to the key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleDescriptor {
    pub name: String,
    #[serde(default)]
    pub cluster: Vec<String>,
    /// Unordered; compared as a set.
    #[serde(default)]
    pub indices: Vec<Index>,
}

/// Index privilege grant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Index {
    pub names: Vec<String>,
    pub privileges: Vec<String>,
}

impl ApiKeyResource {
    /// Parses a resource description from JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        let resource: ApiKeyResource = serde_json::from_str(content)
            .map_err(|e| Error::input(format!("Error when parsing attributes: {e}")))?;
        resource.validate()?;
        Ok(resource)
    }

    /// Loads a resource description from a JSON file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::input(format!("cannot read resource file '{path}': {e}")))?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::input("API key name must not be empty"));
        }
        Ok(())
    }

    /// Compares the role descriptors of two resources by the request body
    /// they produce.
    ///
    /// Descriptors collapse by name exactly as in [`role_descriptors_body`],
    /// so only the entry that would be sent counts. Index-entry order and
    /// repeated identical entries are ignored; sequence fields (`cluster`,
    /// `names`, `privileges`) are compared element-wise.
    pub fn same_role_descriptors(&self, other: &[RoleDescriptor]) -> bool {
        sent(&self.role_descriptors) == sent(other)
    }
}

fn sent(descriptors: &[RoleDescriptor]) -> RoleDescriptorsBody {
    let mut body = role_descriptors_body(descriptors);
    for descriptor in body.role_descriptors.values_mut() {
        descriptor.index.sort();
        descriptor.index.dedup();
    }
    body
}

/// What is remembered about a created key between runs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyState {
    pub id: String,
    pub api_key: String,
    pub encoded: String,
    pub name: String,
    pub role_descriptors: Vec<RoleDescriptor>,
}

impl ApiKeyState {
    /// The declarative part of the state.
    pub fn resource(&self) -> ApiKeyResource {
        ApiKeyResource {
            name: self.name.clone(),
            role_descriptors: self.role_descriptors.clone(),
        }
    }
}

// api_key and encoded are credentials and stay out of logs.
impl fmt::Debug for ApiKeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyState")
            .field("id", &self.id)
            .field("api_key", &"<redacted>")
            .field("encoded", &"<redacted>")
            .field("name", &self.name)
            .field("role_descriptors", &self.role_descriptors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str, cluster: &[&str], indices: Vec<Index>) -> RoleDescriptor {
        RoleDescriptor {
            name: name.to_string(),
            cluster: cluster.iter().map(|s| s.to_string()).collect(),
            indices,
        }
    }

    fn index(names: &[&str], privileges: &[&str]) -> Index {
        Index {
            names: names.iter().map(|s| s.to_string()).collect(),
            privileges: privileges.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_optional_fields_default_to_empty() {
        let resource =
            ApiKeyResource::from_json(r#"{"name": "one", "role_descriptors": [{"name": "role-a"}]}"#)
                .unwrap();

        assert_eq!(resource.name, "one");
        assert_eq!(resource.role_descriptors, vec![role("role-a", &[], vec![])]);
    }

    #[test]
    fn test_missing_privileges_is_input_error() {
        let err = ApiKeyResource::from_json(
            r#"{"name": "one", "role_descriptors": [{"name": "r", "indices": [{"names": ["a"]}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Input { .. }));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = ApiKeyResource::from_json(r#"{"name": "one", "role_descriptors": [], "x": 1}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Input { .. }));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let err =
            ApiKeyResource::from_json(r#"{"name": "  ", "role_descriptors": []}"#).unwrap_err();
        assert!(matches!(err, Error::Input { .. }));
    }

    #[test]
    fn test_set_order_is_ignored() {
        let a = role("a", &["monitor"], vec![index(&["x"], &["read"]), index(&["y"], &["write"])]);
        let b = role("b", &[], vec![]);
        let a_swapped =
            role("a", &["monitor"], vec![index(&["y"], &["write"]), index(&["x"], &["read"])]);

        let resource = ApiKeyResource {
            name: "k".into(),
            role_descriptors: vec![a, b.clone()],
        };

        assert!(resource.same_role_descriptors(&[b.clone(), a_swapped.clone()]));
        assert!(resource.same_role_descriptors(&[b.clone(), a_swapped.clone(), b]));
    }

    #[test]
    fn test_sequence_order_matters() {
        let resource = ApiKeyResource {
            name: "k".into(),
            role_descriptors: vec![role("a", &["monitor", "manage"], vec![])],
        };
        assert!(!resource.same_role_descriptors(&[role("a", &["manage", "monitor"], vec![])]));
    }

    #[test]
    fn test_state_debug_redacts_credentials() {
        let state = ApiKeyState {
            id: "abc".into(),
            api_key: "super-secret".into(),
            encoded: "YWJjOnN1cGVyLXNlY3JldA==".into(),
            name: "k".into(),
            role_descriptors: vec![],
        };
        let rendered = format!("{state:?}");
        assert!(rendered.contains("abc"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("YWJj"));
    }
}
