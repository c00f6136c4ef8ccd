//! Request bodies for the `_security/api_key` endpoints.
//!
//! [`build_body`] flattens the declarative role descriptors into the shape the
//! cluster expects:
//!
//! ```json
//! {
//!   "role_descriptors": {
//!     "role-a": {
//!       "cluster": ["monitor"],
//!       "index": [{ "names": ["logs-*"], "privileges": ["read"] }]
//!     }
//!   }
//! }
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::model::{ApiKeyResource, Index, RoleDescriptor};

/// `{"role_descriptors": {...}}`, the update request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDescriptorsBody {
    pub role_descriptors: BTreeMap<String, RoleDescriptorBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDescriptorBody {
    pub cluster: Vec<String>,
    pub index: Vec<IndexBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct IndexBody {
    pub names: Vec<String>,
    pub privileges: Vec<String>,
}

/// Create request body: the role descriptors plus the key name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateApiKeyBody {
    pub name: String,
    #[serde(flatten)]
    pub descriptors: RoleDescriptorsBody,
}

/// Invalidate request body: `{"ids": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidateApiKeyBody {
    pub ids: Vec<String>,
}

impl From<&Index> for IndexBody {
    fn from(index: &Index) -> Self {
        Self {
            names: index.names.clone(),
            privileges: index.privileges.clone(),
        }
    }
}

impl From<&RoleDescriptor> for RoleDescriptorBody {
    fn from(descriptor: &RoleDescriptor) -> Self {
        Self {
            cluster: descriptor.cluster.clone(),
            index: descriptor.indices.iter().map(IndexBody::from).collect(),
        }
    }
}

/// Builds the role descriptor map for `resource`.
///
/// Descriptors are keyed by name. When two descriptors share a name the one
/// iterated last replaces the earlier one; nothing is merged.
pub fn build_body(resource: &ApiKeyResource) -> RoleDescriptorsBody {
    role_descriptors_body(&resource.role_descriptors)
}

/// [`build_body`] over a bare descriptor list.
pub fn role_descriptors_body(descriptors: &[RoleDescriptor]) -> RoleDescriptorsBody {
    let mut role_descriptors = BTreeMap::new();

    for descriptor in descriptors {
        let previous =
            role_descriptors.insert(descriptor.name.clone(), RoleDescriptorBody::from(descriptor));
        if previous.is_some() {
            warn!(role = %descriptor.name, "Duplicate role descriptor name, keeping the last one");
        }
    }

    RoleDescriptorsBody { role_descriptors }
}

pub fn create_body(resource: &ApiKeyResource) -> CreateApiKeyBody {
    CreateApiKeyBody {
        name: resource.name.clone(),
        descriptors: build_body(resource),
    }
}

pub fn invalidate_body(id: &str) -> InvalidateApiKeyBody {
    InvalidateApiKeyBody {
        ids: vec![id.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn resource(name: &str, role_descriptors: Vec<RoleDescriptor>) -> ApiKeyResource {
        ApiKeyResource {
            name: name.to_string(),
            role_descriptors,
        }
    }

    #[test]
    fn test_empty_descriptors() {
        let body = build_body(&resource("one", vec![]));
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"role_descriptors": {}}));
    }

    #[test]
    fn test_single_role_without_indices() {
        let body = build_body(&resource(
            "one",
            vec![RoleDescriptor {
                name: "role-a".into(),
                cluster: vec![],
                indices: vec![],
            }],
        ));

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"role_descriptors": {"role-a": {"cluster": [], "index": []}}})
        );
    }

    #[test]
    fn test_index_grant() {
        let body = build_body(&resource(
            "one",
            vec![RoleDescriptor {
                name: "role-a".into(),
                cluster: strings(&["monitor"]),
                indices: vec![Index {
                    names: strings(&["logs-*"]),
                    privileges: strings(&["read"]),
                }],
            }],
        ));

        assert_eq!(
            serde_json::to_value(&body).unwrap()["role_descriptors"]["role-a"],
            json!({"cluster": ["monitor"], "index": [{"names": ["logs-*"], "privileges": ["read"]}]})
        );
    }

    #[test]
    fn test_sequences_keep_order_and_duplicates() {
        let cluster = strings(&["monitor", "manage_own_api_key", "monitor"]);
        let names = strings(&["b-*", "a-*", "b-*"]);
        let privileges = strings(&["write", "read"]);

        let body = build_body(&resource(
            "one",
            vec![RoleDescriptor {
                name: "r".into(),
                cluster: cluster.clone(),
                indices: vec![
                    Index {
                        names: names.clone(),
                        privileges: privileges.clone(),
                    },
                    Index {
                        names: strings(&["z"]),
                        privileges: vec![],
                    },
                ],
            }],
        ));

        let r = &body.role_descriptors["r"];
        assert_eq!(r.cluster, cluster);
        assert_eq!(r.index[0].names, names);
        assert_eq!(r.index[0].privileges, privileges);
        assert_eq!(r.index[1].names, strings(&["z"]));
        assert!(r.index[1].privileges.is_empty());
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let body = build_body(&resource(
            "one",
            vec![
                RoleDescriptor {
                    name: "r".into(),
                    cluster: strings(&["monitor"]),
                    indices: vec![],
                },
                RoleDescriptor {
                    name: "r".into(),
                    cluster: strings(&["manage"]),
                    indices: vec![],
                },
            ],
        ));

        assert_eq!(body.role_descriptors.len(), 1);
        assert_eq!(body.role_descriptors["r"].cluster, strings(&["manage"]));
    }

    #[test]
    fn test_build_is_idempotent() {
        let input = resource(
            "one",
            vec![
                RoleDescriptor {
                    name: "a".into(),
                    cluster: strings(&["monitor"]),
                    indices: vec![Index {
                        names: strings(&["logs-*"]),
                        privileges: strings(&["read"]),
                    }],
                },
                RoleDescriptor {
                    name: "b".into(),
                    cluster: vec![],
                    indices: vec![],
                },
            ],
        );
        let before = input.clone();

        assert_eq!(build_body(&input), build_body(&input));
        assert_eq!(input, before);
    }

    #[test]
    fn test_create_body_has_name_update_body_does_not() {
        let input = resource(
            "two",
            vec![RoleDescriptor {
                name: "role-a".into(),
                cluster: vec![],
                indices: vec![],
            }],
        );

        let create = serde_json::to_value(create_body(&input)).unwrap();
        let update = serde_json::to_value(build_body(&input)).unwrap();

        assert_eq!(create["name"], "two");
        assert!(create.get("role_descriptors").is_some());
        assert!(update.get("name").is_none());
        assert_eq!(update["role_descriptors"], create["role_descriptors"]);
    }

    #[test]
    fn test_invalidate_body() {
        assert_eq!(
            serde_json::to_value(invalidate_body("abc123")).unwrap(),
            json!({"ids": ["abc123"]})
        );
    }
}
