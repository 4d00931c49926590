use serde_json::Value;

use super::{Action, FINISH_NAME, RESPONSE_ARG};

/// Turns a raw assistant reply into an [`Action`].
///
/// Parsing never fails: replies that cannot be understood must map to an
/// action named [`ERROR_NAME`](super::ERROR_NAME) whose arguments describe
/// the problem, so that the agent can report it back to the model.
pub trait ActionParser: Send + Sync {
    /// Parses the reply.
    fn parse(&self, text: &str) -> Action;
}

/// Parses replies of the form
/// `{"thoughts": {...}, "command": {"name": "...", "args": {...}}}`.
///
/// Models often wrap the JSON object in a code fence or a sentence, and
/// sometimes emit unescaped backslashes in strings. Both are tolerated.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonActionParser;

impl ActionParser for JsonActionParser {
    fn parse(&self, text: &str) -> Action {
        let Some(parsed) = parse_lenient(text) else {
            trace!("reply is not valid json: {text}");
            return Action::error(format!("Could not parse invalid json: {text}"));
        };

        let Some(action) = extract_command(&parsed) else {
            return Action::error(format!("Incomplete command args: {parsed}"));
        };
        if action.is_finish() && !action.args.contains_key(RESPONSE_ARG) {
            return missing_response();
        }
        action
    }
}

/// The action replacing a finish command that carries no response.
pub(crate) fn missing_response() -> Action {
    Action::error(format!(
        "The {FINISH_NAME} command requires a \"{RESPONSE_ARG}\" argument"
    ))
}

/// Parses the JSON value in a model reply.
///
/// Accepts the bare value, or the outermost `{...}` span of a reply that
/// wraps it in prose or a code fence. Stray backslashes inside that span are
/// escaped before giving up.
pub fn parse_lenient(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let object = &text[start..=end];
    serde_json::from_str(object)
        .or_else(|_| serde_json::from_str(&escape_stray_backslashes(object)))
        .ok()
}

/// Doubles every backslash that does not start a valid JSON escape.
fn escape_stray_backslashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') => {
                out.push(c);
                // Keep the escaped character so that `\\` is not revisited.
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push_str("\\\\"),
        }
    }
    out
}

fn extract_command(parsed: &Value) -> Option<Action> {
    let command = parsed.get("command")?;
    let name = command.get("name")?.as_str()?;
    let args = match command.get("args") {
        None | Some(Value::Null) => Default::default(),
        Some(Value::Object(args)) => args.clone(),
        Some(_) => return None,
    };
    Some(Action::new(name, args))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::action::ERROR_NAME;

    fn error_message(action: &Action) -> &str {
        assert_eq!(action.name, ERROR_NAME);
        action.args["error"].as_str().unwrap()
    }

    #[test]
    fn test_well_formed_reply() {
        let reply = r#"{
            "thoughts": { "text": "echo it", "plan": "- echo" },
            "command": { "name": "echo", "args": { "text": "hi" } }
        }"#;
        let action = JsonActionParser.parse(reply);
        assert_eq!(action.name, "echo");
        assert_eq!(action.args["text"], json!("hi"));
    }

    #[test]
    fn test_fenced_reply() {
        let reply = "Here is my answer:\n```json\n{\"command\": {\"name\": \"finish\", \"args\": {\"response\": \"done\"}}}\n```";
        let action = JsonActionParser.parse(reply);
        assert!(action.is_finish());
        assert_eq!(action.response().as_deref(), Some("done"));
    }

    #[test]
    fn test_stray_backslash() {
        let reply = r#"{"command": {"name": "read", "args": {"path": "C:\temp\x.txt"}}}"#;
        let action = JsonActionParser.parse(reply);
        assert_eq!(action.name, "read");
        assert_eq!(action.args["path"], json!("C:\temp\\x.txt"));
    }

    #[test]
    fn test_missing_args_is_empty() {
        let action =
            JsonActionParser.parse(r#"{"command": {"name": "list_files"}}"#);
        assert_eq!(action.name, "list_files");
        assert!(action.args.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let action = JsonActionParser.parse("I think I should search.");
        assert_eq!(
            error_message(&action),
            "Could not parse invalid json: I think I should search."
        );
    }

    #[test]
    fn test_incomplete_command() {
        let action = JsonActionParser.parse(r#"{"thoughts": {"text": "hmm"}}"#);
        assert!(error_message(&action).starts_with("Incomplete command args: "));

        let action = JsonActionParser
            .parse(r#"{"command": {"name": "echo", "args": ["hi"]}}"#);
        assert!(error_message(&action).starts_with("Incomplete command args: "));
    }

    #[test]
    fn test_finish_requires_response() {
        let action = JsonActionParser
            .parse(r#"{"command": {"name": "finish", "args": {}}}"#);
        assert!(error_message(&action).contains("\"response\""));
    }

    #[test]
    fn test_escape_stray_backslashes() {
        assert_eq!(escape_stray_backslashes(r#"a\qb"#), r#"a\\qb"#);
        assert_eq!(escape_stray_backslashes(r#"a\nb"#), r#"a\nb"#);
        assert_eq!(escape_stray_backslashes(r#"a\\qb"#), r#"a\\qb"#);
    }
}
