use crate::adapter::{arg_value, AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor};
use serde_json::json;

const NAME: &str = "postscript";

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "Postscript",
        base_url: Some("https://api.postscript.io/api/v2"),
        auth: AuthScheme::Bearer,
        headers: vec![],
        credential_headers: vec![],
        operations: vec![
            Operation::new(
                ToolDescriptor::new(NAME, "subscribers", "List SMS subscribers")
                    .param(ParamSpec::optional("limit", ParamType::Integer, "Page size")),
                |args| RequestPlan::get("/subscribers").query_arg("limit", args, "limit"),
            ),
            Operation::new(ToolDescriptor::new(NAME, "campaigns", "List SMS campaigns"), |_| {
                RequestPlan::get("/campaigns")
            }),
            Operation::new(
                ToolDescriptor::new(NAME, "send_message", "Send a one-off SMS to a subscriber")
                    .param(ParamSpec::required("phone", ParamType::String, "E.164 phone number"))
                    .param(ParamSpec::required("body", ParamType::String, "Message body").rest()),
                |args| {
                    RequestPlan::post(
                        "/messages",
                        json!({
                            "phone_number": arg_value(args, "phone"),
                            "body": arg_value(args, "body"),
                        }),
                    )
                },
            ),
        ],
    }
}
