use crate::adapter::{arg_string, arg_value, AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor, ValidatedArgs};
use serde_json::json;

const NAME: &str = "gorgias";

fn ticket_path(args: &ValidatedArgs, name: &str) -> String {
    let id = arg_string(args, name).unwrap_or_default();
    format!("/tickets/{}", urlencoding::encode(&id))
}

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "Gorgias",
        // Each helpdesk lives at https://<account>.gorgias.com/api.
        base_url: None,
        auth: AuthScheme::Basic,
        headers: vec![("Accept", "application/json")],
        credential_headers: vec![],
        operations: vec![
            Operation::new(
                ToolDescriptor::new(NAME, "tickets", "List support tickets")
                    .param(ParamSpec::optional("limit", ParamType::Integer, "Max tickets"))
                    .param(ParamSpec::optional("status", ParamType::String, "open or closed")),
                |args| {
                    RequestPlan::get("/tickets")
                        .query_arg("limit", args, "limit")
                        .query_arg("status", args, "status")
                },
            ),
            Operation::new(
                ToolDescriptor::new(NAME, "ticket", "Fetch a ticket with its messages")
                    .param(ParamSpec::required("id", ParamType::Integer, "Ticket id")),
                |args| RequestPlan::get(ticket_path(args, "id")),
            ),
            Operation::new(
                ToolDescriptor::new(NAME, "reply", "Reply to a ticket by email")
                    .param(ParamSpec::required("ticket_id", ParamType::Integer, "Ticket id"))
                    .param(ParamSpec::required("body", ParamType::String, "Reply text").rest()),
                |args| {
                    RequestPlan::post(
                        format!("{}/messages", ticket_path(args, "ticket_id")),
                        json!({
                            "channel": "email",
                            "via": "api",
                            "from_agent": true,
                            "body_text": arg_value(args, "body"),
                        }),
                    )
                },
            ),
        ],
    }
}
