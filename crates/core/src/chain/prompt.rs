use crate::action::{FINISH_NAME, RESPONSE_ARG};
use crate::tool::ToolDefinition;

const TEMPLATE: &str = include_str!("system_prompt.md");

/// Renders the system prompt describing the agent, its goals, the commands
/// it may use and the reply format [`JsonActionParser`] understands.
///
/// [`JsonActionParser`]: crate::action::JsonActionParser
#[derive(Clone, Debug)]
pub struct PromptConstructor {
    ai_name: String,
    ai_role: String,
    tools: Vec<ToolDefinition>,
}

impl PromptConstructor {
    /// Creates a prompt constructor.
    #[inline]
    pub fn new<S1: Into<String>, S2: Into<String>>(
        ai_name: S1,
        ai_role: S2,
        tools: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            ai_name: ai_name.into(),
            ai_role: ai_role.into(),
            tools,
        }
    }

    /// Renders the full prompt for the given goals.
    pub fn construct_full_prompt(&self, goals: &[String]) -> String {
        let role = self.ai_role.trim_end_matches('.');
        TEMPLATE
            .replace("{{AI_NAME}}", &self.ai_name)
            .replace("{{AI_ROLE}}", role)
            .replace("{{GOALS}}", &numbered(goals.iter().map(String::as_str)))
            .replace("{{COMMANDS}}", &self.commands())
    }

    fn commands(&self) -> String {
        let mut commands: Vec<String> = self
            .tools
            .iter()
            .map(|tool| {
                format!(
                    "\"{}\": {}, args json schema: {}",
                    tool.name, tool.description, tool.parameters
                )
            })
            .collect();
        commands.push(format!(
            "\"{FINISH_NAME}\": use this to signal that you have finished all \
             your objectives, args: \"{RESPONSE_ARG}\": \"final response to \
             let people know you have finished your objectives\""
        ));
        numbered(commands.iter().map(String::as_str))
    }
}

fn numbered<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let lines: Vec<String> = items
        .enumerate()
        .map(|(idx, item)| format!("{}. {}", idx + 1, item.trim()))
        .collect();
    if lines.is_empty() {
        return "(none)".to_owned();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn constructor() -> PromptConstructor {
        PromptConstructor::new(
            "Scout",
            "a research assistant.",
            vec![ToolDefinition {
                name: "search".to_owned(),
                description: "Searches the web".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } }
                }),
            }],
        )
    }

    #[test]
    fn test_full_prompt() {
        let goals = vec!["Find crates".to_owned(), " Summarize them ".to_owned()];
        let prompt = constructor().construct_full_prompt(&goals);

        assert!(prompt.starts_with("You are Scout, a research assistant.\n"));
        assert!(prompt.contains("GOALS:\n\n1. Find crates\n2. Summarize them\n"));
        assert!(prompt.contains(
            r#"1. "search": Searches the web, args json schema: {"properties":{"query":{"type":"string"}},"type":"object"}"#
        ));
        assert!(prompt.contains("2. \"finish\": use this to signal"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_without_goals_or_tools() {
        let prompt =
            PromptConstructor::new("A", "b", vec![]).construct_full_prompt(&[]);
        assert!(prompt.contains("GOALS:\n\n(none)\n"));
        assert!(prompt.contains("Commands:\n1. \"finish\""));
    }
}
