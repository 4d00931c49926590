use auto_agent_core::action::parse_lenient;
use serde_json::Value;

/// The parts of an assistant reply worth showing to a person.
///
/// Replies follow the `{"thoughts": {...}, "command": {...}}` shape the agent
/// prompts for. Missing or ill-typed fields are left empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplyView {
    /// `thoughts.text`.
    pub text: Option<String>,
    /// `thoughts.reasoning`.
    pub reasoning: Option<String>,
    /// `thoughts.plan`, one entry per bullet.
    pub plan: Vec<String>,
    /// `thoughts.criticism`.
    pub criticism: Option<String>,
    /// `thoughts.speak`.
    pub speak: Option<String>,
    /// `command.name`.
    pub command: Option<String>,
    /// `command.args` as compact JSON.
    pub arguments: Option<String>,
}

impl ReplyView {
    /// Extracts the view from a raw reply. Returns `None` if the reply holds
    /// no JSON object.
    pub fn parse(reply: &str) -> Option<Self> {
        let value = parse_object(reply)?;
        let thoughts = value.get("thoughts");
        let thought = |key: &str| {
            thoughts
                .and_then(|t| t.get(key))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        let command = value.get("command");

        Some(Self {
            text: thought("text"),
            reasoning: thought("reasoning"),
            plan: thoughts.and_then(|t| t.get("plan")).map_or_else(
                Vec::new,
                plan_items,
            ),
            criticism: thought("criticism"),
            speak: thought("speak"),
            command: command
                .and_then(|c| c.get("name"))
                .and_then(Value::as_str)
                .map(str::to_owned),
            arguments: command
                .and_then(|c| c.get("args"))
                .map(Value::to_string),
        })
    }
}

fn parse_object(reply: &str) -> Option<Value> {
    parse_lenient(reply).filter(Value::is_object)
}

fn plan_items(plan: &Value) -> Vec<String> {
    let lines: Vec<&str> = match plan {
        Value::String(plan) => plan.lines().collect(),
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => vec![],
    };
    lines
        .into_iter()
        .map(|line| line.trim().trim_start_matches('-').trim())
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
