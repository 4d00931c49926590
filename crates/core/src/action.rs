//! Structured decisions parsed from the model's replies.

mod parser;

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub(crate) use parser::missing_response;
pub use parser::{ActionParser, JsonActionParser, parse_lenient};

/// The command name that ends the run.
pub const FINISH_NAME: &str = "finish";

/// The command name used when a reply cannot be mapped to a command.
pub const ERROR_NAME: &str = "ERROR";

/// The argument of a finish action carrying the final response.
pub const RESPONSE_ARG: &str = "response";

/// A command picked by the model, with its arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Name of the command.
    pub name: String,
    /// Arguments of the command.
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl Action {
    /// Creates an action with the given name and arguments.
    #[inline]
    pub fn new<S: Into<String>>(name: S, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Creates a finish action carrying `response`.
    pub fn finish<S: Into<String>>(response: S) -> Self {
        let mut args = Map::new();
        args.insert(RESPONSE_ARG.to_owned(), Value::String(response.into()));
        Self::new(FINISH_NAME, args)
    }

    /// Creates an error action with a diagnostic message.
    pub fn error<S: Into<String>>(message: S) -> Self {
        let mut args = Map::new();
        args.insert("error".to_owned(), Value::String(message.into()));
        Self::new(ERROR_NAME, args)
    }

    /// Returns `true` if this is a finish action.
    #[inline]
    pub fn is_finish(&self) -> bool {
        self.name == FINISH_NAME
    }

    /// Returns the final response of a finish action.
    ///
    /// String values are returned verbatim, other JSON values in their
    /// serialized form.
    pub fn response(&self) -> Option<String> {
        match self.args.get(RESPONSE_ARG)? {
            Value::String(response) => Some(response.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Returns a displayable form of the arguments.
    #[inline]
    pub fn display_args(&self) -> DisplayArgs<'_> {
        DisplayArgs(&self.args)
    }
}

/// Renders an argument mapping as compact JSON.
pub struct DisplayArgs<'a>(&'a Map<String, Value>);

impl Display for DisplayArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Serializing a `Map` of JSON values cannot fail.
        let json = serde_json::to_string(self.0).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_finish_response() {
        let action = Action::finish("done");
        assert!(action.is_finish());
        assert_eq!(action.response().as_deref(), Some("done"));

        let Value::Object(args) = json!({ "response": { "files": 2 } }) else {
            unreachable!()
        };
        let action = Action::new(FINISH_NAME, args);
        assert_eq!(action.response().as_deref(), Some(r#"{"files":2}"#));

        assert_eq!(Action::new(FINISH_NAME, Map::new()).response(), None);
    }

    #[test]
    fn test_display_args() {
        let action = Action::error("bad json");
        assert_eq!(action.name, ERROR_NAME);
        assert_eq!(action.display_args().to_string(), r#"{"error":"bad json"}"#);
    }
}
