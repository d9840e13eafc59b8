//! Property tests: every dispatch resolves to exactly one envelope, and lite
//! scopes never expose more than their full scope or anything mutating.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::Value;
use switchboard_integrations::{Integration, IntegrationId, Operation, ToolError, ToolHandler, ToolResult};
use switchboard_protocol::ToolDescriptor;
use switchboard_server::{Dispatcher, Scope, ScopeResolver, ScopedServer, ToolCatalog};

#[derive(Clone, Copy)]
enum Behaviour {
    Echo,
    Backend,
    Panic,
    Credentials,
}

impl ToolHandler for Behaviour {
    async fn invoke(&self, args: Value) -> ToolResult {
        match self {
            Self::Echo => Ok(args),
            Self::Backend => Err(ToolError::Backend { status: 500, body: args }),
            Self::Panic => panic!("handler exploded"),
            Self::Credentials => Err(ToolError::Credentials("token expired".into())),
        }
    }
}

struct Fake {
    id: IntegrationId,
    operations: Vec<Operation>,
}

impl Integration for Fake {
    fn id(&self) -> IntegrationId {
        self.id
    }

    fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

/// Every real tool table, each integration failing its own way.
fn fakes(ids: impl IntoIterator<Item = IntegrationId>) -> Vec<Arc<dyn Integration>> {
    ids.into_iter()
        .map(|id| {
            let behaviour = match id {
                IntegrationId::Dealfront => Behaviour::Echo,
                IntegrationId::GoogleAnalytics => Behaviour::Backend,
                IntegrationId::CustomerIo => Behaviour::Panic,
                IntegrationId::Instantly => Behaviour::Credentials,
            };
            let operations = id
                .descriptors()
                .into_iter()
                .map(|d| Operation::new(d, behaviour))
                .collect();
            Arc::new(Fake { id, operations }) as Arc<dyn Integration>
        })
        .collect()
}

fn all_descriptors() -> Vec<ToolDescriptor> {
    IntegrationId::ALL.iter().flat_map(|id| id.descriptors()).collect()
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_map(Value::from),
        "[a-z0-9 ./?#]{0,10}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,10}", inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

const MUTATING: [&str; 9] = [
    "create", "update", "delete", "activate", "pause", "move", "enable", "disable", "verify",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn dispatch_always_yields_one_envelope(
        tool in 0usize..200,
        unknown in "[a-z_]{1,16}",
        shaped in any::<bool>(),
        values in prop::collection::vec(arb_json(), 8),
        raw in arb_json(),
    ) {
        let descriptors = all_descriptors();
        let name = descriptors.get(tool).map(|d| d.name.clone()).unwrap_or(unknown);

        // Either the raw value, or the tool's own field names with arbitrary values.
        let args = match descriptors.get(tool) {
            Some(d) if shaped => Value::Object(
                d.input_schema.field_names().map(String::from).zip(values).collect(),
            ),
            _ => raw,
        };

        let dispatcher = Dispatcher::new(ToolCatalog::compose(&fakes(IntegrationId::ALL), None).unwrap());
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let result = runtime.block_on(dispatcher.call(&name, Some(args)));

        prop_assert_eq!(result.content.len(), 1);
        if result.is_error {
            prop_assert!(result.text().starts_with("Error: "));
        } else {
            prop_assert!(serde_json::from_str::<Value>(result.text()).is_ok());
        }
    }

    #[test]
    fn lite_scopes_are_read_only_subsets(
        configured in prop::sample::subsequence(IntegrationId::ALL.to_vec(), 0..=4),
    ) {
        let integrations = fakes(configured.iter().copied());
        let resolver = ScopeResolver::new(configured.iter().copied().collect());

        for id in IntegrationId::ALL {
            let names = |scope: Scope| -> BTreeSet<String> {
                ScopedServer::new(resolver.resolve(scope), &integrations)
                    .unwrap()
                    .tools()
                    .into_iter()
                    .map(|d| d.name.clone())
                    .collect()
            };
            let lite = names(Scope::lite(id));
            let full = names(Scope::lite(id).widened());

            prop_assert!(lite.is_subset(&full));
            prop_assert_eq!(lite.is_empty(), !configured.contains(&id));
            for tool in &lite {
                prop_assert!(
                    !tool.split('_').any(|part| MUTATING.contains(&part)),
                    "{} is mutating", tool
                );
            }
        }
    }
}

#[tokio::test]
async fn panicking_handler_becomes_error_envelope() {
    let dispatcher = Dispatcher::new(ToolCatalog::compose(&fakes([IntegrationId::CustomerIo]), None).unwrap());
    let result = dispatcher.call("cio_list_segments", None).await;
    assert!(result.is_error);
    assert_eq!(result.text(), "Error: Handler failed: handler exploded");
}
