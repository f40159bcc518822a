use crate::adapter::{arg_string, arg_value, AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor};
use serde_json::json;

const NAME: &str = "klaviyo";

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "Klaviyo",
        base_url: Some("https://a.klaviyo.com/api"),
        auth: AuthScheme::Header {
            name: "Authorization",
            prefix: "Klaviyo-API-Key ",
        },
        headers: vec![("revision", "2024-02-15"), ("Accept", "application/json")],
        credential_headers: vec![],
        operations: vec![
            Operation::new(
                ToolDescriptor::new(NAME, "campaigns", "List campaigns for a channel")
                    .param(ParamSpec::optional("channel", ParamType::String, "email or sms")),
                |args| {
                    let channel = arg_string(args, "channel").unwrap_or_else(|| "email".into());
                    RequestPlan::get("/campaigns")
                        .query("filter", format!("equals(messages.channel,'{channel}')"))
                },
            ),
            Operation::new(ToolDescriptor::new(NAME, "lists", "List audiences"), |_| {
                RequestPlan::get("/lists")
            }),
            Operation::new(ToolDescriptor::new(NAME, "metrics", "List tracked metrics"), |_| {
                RequestPlan::get("/metrics")
            }),
            Operation::new(
                ToolDescriptor::new(NAME, "create_campaign", "Create a draft email campaign")
                    .param(ParamSpec::required("list_id", ParamType::String, "Audience list id"))
                    .param(ParamSpec::required("name", ParamType::String, "Campaign name").rest()),
                |args| {
                    RequestPlan::post(
                        "/campaigns",
                        json!({
                            "data": {
                                "type": "campaign",
                                "attributes": {
                                    "name": arg_value(args, "name"),
                                    "audiences": { "included": [arg_value(args, "list_id")] },
                                    "campaign-messages": {
                                        "data": [{
                                            "type": "campaign-message",
                                            "attributes": { "channel": "email" }
                                        }]
                                    }
                                }
                            }
                        }),
                    )
                },
            ),
        ],
    }
}
