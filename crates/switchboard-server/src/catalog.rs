//! Tool registry and dispatch table composition.
//!
//! A catalog merges the operations of the enabled integrations into one
//! name → operation table. The table is built once per bound server
//! instance and never mutated. A whitelist hides tools from listing and
//! from lookup alike.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use switchboard_integrations::{ConfigError, Integration, IntegrationId, Operation};
use switchboard_protocol::ToolDescriptor;

struct Entry {
    integration: IntegrationId,
    operation: Operation,
}

pub struct ToolCatalog {
    entries: HashMap<String, Entry>,
    /// Visible tool names in listing order.
    visible: Vec<String>,
    whitelist: Option<BTreeSet<&'static str>>,
}

impl ToolCatalog {
    /// Merge the operations of `integrations`.
    ///
    /// Fails if two integrations declare the same tool name.
    pub fn compose(
        integrations: &[Arc<dyn Integration>],
        whitelist: Option<BTreeSet<&'static str>>,
    ) -> Result<Self, ConfigError> {
        let mut entries: HashMap<String, Entry> = HashMap::new();
        let mut visible = Vec::new();

        for integration in integrations {
            for operation in integration.operations() {
                let name = operation.name().to_string();
                if let Some(existing) = entries.get(&name) {
                    return Err(ConfigError::DuplicateTool {
                        tool: name,
                        first: existing.integration,
                        second: integration.id(),
                    });
                }
                if whitelist.as_ref().is_none_or(|w| w.contains(name.as_str())) {
                    visible.push(name.clone());
                }
                entries.insert(
                    name,
                    Entry { integration: integration.id(), operation: operation.clone() },
                );
            }
        }

        Ok(Self { entries, visible, whitelist })
    }

    /// Look up a callable tool. Tools hidden by the whitelist are absent.
    pub fn get(&self, name: &str) -> Option<&Operation> {
        if !self.is_visible(name) {
            return None;
        }
        self.entries.get(name).map(|e| &e.operation)
    }

    /// Integration that owns `name`, whether or not it is visible.
    pub fn owner(&self, name: &str) -> Option<IntegrationId> {
        self.entries.get(name).map(|e| e.integration)
    }

    /// Descriptors of the visible tools, in listing order.
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.visible
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|e| &e.operation.descriptor)
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.visible.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    fn is_visible(&self, name: &str) -> bool {
        self.whitelist.as_ref().is_none_or(|w| w.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use switchboard_integrations::{ToolHandler, ToolResult};

    struct Fixed(Value);

    impl ToolHandler for Fixed {
        async fn invoke(&self, _args: Value) -> ToolResult {
            Ok(self.0.clone())
        }
    }

    struct Fake {
        id: IntegrationId,
        operations: Vec<Operation>,
    }

    impl Fake {
        fn new(id: IntegrationId, names: &[&str]) -> Arc<dyn Integration> {
            let operations = names
                .iter()
                .map(|n| Operation::new(ToolDescriptor::new(*n, "test"), Fixed(json!(n))))
                .collect();
            Arc::new(Self { id, operations })
        }
    }

    impl Integration for Fake {
        fn id(&self) -> IntegrationId {
            self.id
        }

        fn operations(&self) -> &[Operation] {
            &self.operations
        }
    }

    #[test]
    fn merges_in_integration_order() {
        let catalog = ToolCatalog::compose(
            &[
                Fake::new(IntegrationId::Dealfront, &["list_x", "get_x"]),
                Fake::new(IntegrationId::Instantly, &["delete_x"]),
            ],
            None,
        )
        .unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), ["list_x", "get_x", "delete_x"]);
        assert_eq!(catalog.owner("delete_x"), Some(IntegrationId::Instantly));
        assert!(catalog.get("get_x").is_some());
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn duplicate_names_fail_composition() {
        let err = ToolCatalog::compose(
            &[
                Fake::new(IntegrationId::Dealfront, &["list_x"]),
                Fake::new(IntegrationId::CustomerIo, &["list_x"]),
            ],
            None,
        )
        .err()
        .unwrap();
        match err {
            ConfigError::DuplicateTool { tool, first, second } => {
                assert_eq!(tool, "list_x");
                assert_eq!(first, IntegrationId::Dealfront);
                assert_eq!(second, IntegrationId::CustomerIo);
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn whitelist_hides_from_listing_and_lookup() {
        let catalog = ToolCatalog::compose(
            &[Fake::new(IntegrationId::Dealfront, &["list_x", "get_x", "delete_x"])],
            Some(BTreeSet::from(["list_x", "get_x"])),
        )
        .unwrap();
        let listed: Vec<_> = catalog.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(listed, ["list_x", "get_x"]);
        assert!(catalog.get("delete_x").is_none());
        assert_eq!(catalog.owner("delete_x"), Some(IntegrationId::Dealfront));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn empty_composition_is_empty() {
        let catalog = ToolCatalog::compose(&[], None).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.list().is_empty());
    }
}
