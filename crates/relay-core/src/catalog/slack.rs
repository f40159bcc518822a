use crate::adapter::{arg_string, arg_value, AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor};
use serde_json::{json, Value};

const NAME: &str = "slack";

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "Slack",
        base_url: Some("https://slack.com/api"),
        auth: AuthScheme::Bearer,
        headers: vec![],
        credential_headers: vec![],
        operations: vec![
            Operation::new(
                ToolDescriptor::new(NAME, "send_message", "Post a message to a channel")
                    .param(ParamSpec::required("channel", ParamType::String, "Channel id or name"))
                    .param(ParamSpec::required("text", ParamType::String, "Message text").rest()),
                |args| {
                    RequestPlan::post(
                        "/chat.postMessage",
                        json!({
                            "channel": channel_name(args),
                            "text": arg_value(args, "text"),
                        }),
                    )
                },
            )
            .shaped(slack_ok),
            Operation::new(
                ToolDescriptor::new(NAME, "channels", "List channels the bot can see")
                    .param(ParamSpec::optional("limit", ParamType::Integer, "Max channels")),
                |args| {
                    RequestPlan::get("/conversations.list")
                        .query("types", "public_channel,private_channel")
                        .query_arg("limit", args, "limit")
                },
            )
            .shaped(list_channels),
            Operation::new(
                ToolDescriptor::new(NAME, "history", "Recent messages in a channel")
                    .param(ParamSpec::required("channel", ParamType::String, "Channel id"))
                    .param(ParamSpec::optional("limit", ParamType::Integer, "Max messages")),
                |args| {
                    RequestPlan::get("/conversations.history")
                        .query("channel", channel_name(args))
                        .query_arg("limit", args, "limit")
                },
            )
            .shaped(slack_ok),
        ],
    }
}

/// Slack accepts channel names without the leading `#`.
fn channel_name(args: &crate::descriptor::ValidatedArgs) -> String {
    let raw = arg_string(args, "channel").unwrap_or_default();
    raw.trim_start_matches('#').to_string()
}

/// Slack answers 200 even for failures and signals them with `ok: false`.
fn slack_ok(body: Value) -> Result<Value, String> {
    if body["ok"].as_bool() == Some(true) {
        Ok(body)
    } else {
        Err(body["error"].as_str().unwrap_or("unknown_error").to_string())
    }
}

fn list_channels(body: Value) -> Result<Value, String> {
    let body = slack_ok(body)?;
    let channels: Vec<Value> = body["channels"]
        .as_array()
        .map(|list| {
            list.iter()
                .map(|c| json!({ "id": c["id"], "name": c["name"] }))
                .collect()
        })
        .unwrap_or_default();
    Ok(json!({ "channels": channels }))
}
