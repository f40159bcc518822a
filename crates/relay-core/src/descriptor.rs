use crate::command::Command;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ParamType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    /// `YYYY-MM-DD`, or the keywords `today` / `yesterday` (UTC).
    Date,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Date => "date",
        }
    }

    /// Coerce a raw argument string into a typed JSON value.
    pub fn coerce(self, raw: &str) -> Result<Value, String> {
        let raw_trimmed = raw.trim();
        match self {
            ParamType::String => Ok(Value::String(raw.to_string())),
            ParamType::Integer => raw_trimmed
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("expected integer, got '{raw}'")),
            ParamType::Number => raw_trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("expected number, got '{raw}'")),
            ParamType::Boolean => match raw_trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Value::Bool(true)),
                "false" | "no" | "0" | "off" => Ok(Value::Bool(false)),
                _ => Err(format!("expected boolean, got '{raw}'")),
            },
            ParamType::Date => resolve_date(raw_trimmed)
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .ok_or_else(|| format!("expected date (YYYY-MM-DD, today, yesterday), got '{raw}'")),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn resolve_date(raw: &str) -> Option<NaiveDate> {
    let today = Utc::now().date_naive();
    match raw.to_ascii_lowercase().as_str() {
        "today" => Some(today),
        "yesterday" => Some(today - Duration::days(1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").ok(),
    }
}

// ---------------------------------------------------------------------------
// ParamSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParamType,
    pub required: bool,
    pub description: String,
    /// Absorbs every remaining positional token, joined by single spaces.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rest: bool,
}

impl ParamSpec {
    pub fn required(name: &str, ty: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: true,
            description: description.to_string(),
            rest: false,
        }
    }

    pub fn optional(name: &str, ty: ParamType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, ty, description)
        }
    }

    pub fn rest(mut self) -> Self {
        self.rest = true;
        self
    }
}

// ---------------------------------------------------------------------------
// ToolDescriptor
// ---------------------------------------------------------------------------

/// Static declaration of one operation a service exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub service: String,
    pub action: String,
    pub description: String,
    /// Declaration order drives positional binding.
    pub parameters: Vec<ParamSpec>,
}

/// Arguments after binding and type coercion, keyed by parameter name.
pub type ValidatedArgs = BTreeMap<String, Value>;

impl ToolDescriptor {
    pub fn new(service: &str, action: &str, description: &str) -> Self {
        Self {
            service: service.to_string(),
            action: action.to_string(),
            description: description.to_string(),
            parameters: Vec::new(),
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    /// Name used when the operation is exposed as a standalone tool.
    pub fn tool_name(&self) -> String {
        format!("{}_{}", self.service, self.action)
    }

    /// Bind a command's arguments to this descriptor and coerce their types.
    ///
    /// Named arguments win; positional tokens fill the remaining parameters in
    /// declaration order. Unknown named arguments and surplus positional tokens
    /// are ignored.
    pub fn bind(&self, command: &Command) -> Result<ValidatedArgs, ArgumentErrors> {
        let mut raw: BTreeMap<&str, String> = BTreeMap::new();
        for p in &self.parameters {
            if let Some(v) = command.args.get(&p.name) {
                raw.insert(p.name.as_str(), v.clone());
            }
        }

        let unbound: Vec<&ParamSpec> = self
            .parameters
            .iter()
            .filter(|p| !raw.contains_key(p.name.as_str()))
            .collect();
        let mut positional = command.positional.iter();
        for p in unbound {
            if p.rest {
                let rest: Vec<&str> = positional.by_ref().map(String::as_str).collect();
                if !rest.is_empty() {
                    raw.insert(p.name.as_str(), rest.join(" "));
                }
                break;
            }
            match positional.next() {
                Some(v) => {
                    raw.insert(p.name.as_str(), v.clone());
                }
                None => break,
            }
        }

        let mut errors = ArgumentErrors::default();
        let mut validated = ValidatedArgs::new();
        for p in &self.parameters {
            match raw.get(p.name.as_str()) {
                Some(v) => match p.ty.coerce(v) {
                    Ok(value) => {
                        validated.insert(p.name.clone(), value);
                    }
                    Err(reason) => errors.invalid.push((p.name.clone(), reason)),
                },
                None if p.required => errors.missing.push(p.name.clone()),
                None => {}
            }
        }

        if errors.is_empty() {
            Ok(validated)
        } else {
            Err(errors)
        }
    }

    /// JSON Schema for the operation's parameters.
    pub fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for p in &self.parameters {
            let mut prop = serde_json::json!({ "description": p.description });
            match p.ty {
                ParamType::Date => {
                    prop["type"] = "string".into();
                    prop["format"] = "date".into();
                }
                other => prop["type"] = other.as_str().into(),
            }
            properties.insert(p.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

// ---------------------------------------------------------------------------
// ArgumentErrors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentErrors {
    pub missing: Vec<String>,
    /// `(parameter, reason)`
    pub invalid: Vec<(String, String)>,
}

impl ArgumentErrors {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

impl fmt::Display for ArgumentErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing required: {}", self.missing.join(", ")));
        }
        if !self.invalid.is_empty() {
            let invalid: Vec<String> = self
                .invalid
                .iter()
                .map(|(name, reason)| format!("{name} ({reason})"))
                .collect();
            parts.push(format!("invalid: {}", invalid.join(", ")));
        }
        f.write_str(&parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send_message() -> ToolDescriptor {
        ToolDescriptor::new("slack", "send_message", "Post a message")
            .param(ParamSpec::required("channel", ParamType::String, "Channel id or name"))
            .param(ParamSpec::required("text", ParamType::String, "Message body").rest())
    }

    fn orders() -> ToolDescriptor {
        ToolDescriptor::new("shopify", "orders", "List orders")
            .param(ParamSpec::optional("limit", ParamType::Integer, "Max orders"))
            .param(ParamSpec::optional("since", ParamType::Date, "Created on/after"))
            .param(ParamSpec::optional("paid", ParamType::Boolean, "Only paid orders"))
    }

    #[test]
    fn positional_binds_in_order_and_rest_absorbs_tail() {
        let cmd = Command::new("slack", "send_message")
            .with_positional("#general")
            .with_positional("hello")
            .with_positional("team");
        let args = send_message().bind(&cmd).unwrap();
        assert_eq!(args["channel"], "#general");
        assert_eq!(args["text"], "hello team");
    }

    #[test]
    fn named_args_take_precedence_over_positional() {
        let cmd = Command::new("slack", "send_message")
            .with_arg("channel", "ops")
            .with_positional("deploy done");
        let args = send_message().bind(&cmd).unwrap();
        assert_eq!(args["channel"], "ops");
        assert_eq!(args["text"], "deploy done");
    }

    #[test]
    fn missing_required_fields_are_all_listed() {
        let err = send_message()
            .bind(&Command::new("slack", "send_message"))
            .unwrap_err();
        assert_eq!(err.missing, vec!["channel", "text"]);
        assert!(err.to_string().contains("channel, text"));
    }

    #[test]
    fn invalid_types_are_reported() {
        let cmd = Command::new("shopify", "orders")
            .with_arg("limit", "ten")
            .with_arg("paid", "maybe");
        let err = orders().bind(&cmd).unwrap_err();
        assert!(err.missing.is_empty());
        assert_eq!(err.invalid.len(), 2);
        assert!(err.to_string().contains("limit (expected integer"));
    }

    #[test]
    fn unknown_extras_are_ignored() {
        let cmd = Command::new("shopify", "orders")
            .with_arg("limit", "5")
            .with_arg("color", "blue");
        let args = orders().bind(&cmd).unwrap();
        assert_eq!(args.len(), 1);
        assert_eq!(args["limit"], 5);
    }

    #[test]
    fn date_keywords_resolve() {
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(ParamType::Date.coerce("today").unwrap(), Value::String(today));
        assert_eq!(
            ParamType::Date.coerce("2024-02-29").unwrap(),
            Value::String("2024-02-29".into())
        );
        assert!(ParamType::Date.coerce("2024-02-30").is_err());
    }

    #[test]
    fn input_schema_lists_required() {
        let schema = send_message().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], serde_json::json!(["channel", "text"]));
        assert_eq!(schema["properties"]["text"]["type"], "string");
        let schema = orders().input_schema();
        assert_eq!(schema["properties"]["since"]["format"], "date");
    }
}
