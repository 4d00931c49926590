use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::action::FINISH_NAME;
use crate::tool::{ToolDefinition, ToolObject};

/// The set of tools an agent can dispatch to, keyed by name.
///
/// Built once and never changed afterwards. Registration order is kept for
/// the prompt. A tool registered under a name that is already taken replaces
/// the earlier one in place.
pub struct Registry {
    tools: Vec<Box<dyn ToolObject>>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn with_tools(tools: Vec<Box<dyn ToolObject>>) -> Self {
        let mut slots: Vec<Box<dyn ToolObject>> = Vec::with_capacity(tools.len());
        let mut index = HashMap::with_capacity(tools.len());
        for tool in tools {
            let name = tool.name().to_owned();
            if name == FINISH_NAME {
                warn!("tool `{name}` is shadowed by the finish command");
            }
            match index.entry(name) {
                Entry::Occupied(entry) => {
                    debug!("tool `{}` registered twice, keeping the latter", entry.key());
                    slots[*entry.get()] = tool;
                }
                Entry::Vacant(entry) => {
                    entry.insert(slots.len());
                    slots.push(tool);
                }
            }
        }
        Self {
            tools: slots,
            index,
        }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&dyn ToolObject> {
        self.index.get(name).map(|&idx| self.tools[idx].as_ref())
    }

    #[inline]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;
    use std::sync::LazyLock;

    use serde_json::{Map, Value, json};

    use super::*;
    use crate::tool::{AnyTool, Tool, ToolResult};

    static EMPTY_SCHEMA: LazyLock<Value> =
        LazyLock::new(|| json!({ "type": "object", "properties": {} }));

    struct ConstTool {
        name: &'static str,
        output: &'static str,
    }

    impl Tool for ConstTool {
        type Input = Value;

        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Returns a constant"
        }

        fn parameter_schema(&self) -> &Value {
            &EMPTY_SCHEMA
        }

        fn execute(
            &self,
            _input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok(self.output.to_owned()))
        }
    }

    fn boxed(name: &'static str, output: &'static str) -> Box<dyn ToolObject> {
        Box::new(AnyTool(ConstTool { name, output }))
    }

    #[tokio::test]
    async fn test_lookup() {
        let registry = Registry::with_tools(vec![
            boxed("search", "found"),
            boxed("write", "written"),
        ]);
        assert_eq!(registry.len(), 2);

        let tool = registry.get("search").unwrap();
        assert_eq!(tool.execute(&Map::new()).await.unwrap(), "found");
        assert!(registry.get("read").is_none());
        assert!(registry.get("Search").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_shadows_in_place() {
        let registry = Registry::with_tools(vec![
            boxed("search", "first"),
            boxed("write", "written"),
            boxed("search", "second"),
        ]);
        assert_eq!(registry.len(), 2);

        let tool = registry.get("search").unwrap();
        assert_eq!(tool.execute(&Map::new()).await.unwrap(), "second");

        let names: Vec<_> = registry
            .definitions()
            .into_iter()
            .map(|def| def.name)
            .collect();
        assert_eq!(names, ["search", "write"]);
    }
}
