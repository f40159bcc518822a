use crate::adapter::{arg_string, arg_value, AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor};
use serde_json::json;

const NAME: &str = "northbeam";

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "Northbeam",
        base_url: Some("https://api.northbeam.io/v1"),
        auth: AuthScheme::Header {
            name: "Authorization",
            prefix: "",
        },
        headers: vec![],
        credential_headers: vec![("Data-Client-ID", "client_id")],
        operations: vec![
            Operation::new(
                ToolDescriptor::new(NAME, "metrics", "Available metric ids"),
                |_| RequestPlan::get("/exports/metrics"),
            ),
            Operation::new(
                ToolDescriptor::new(NAME, "attribution", "Request an attribution export")
                    .param(ParamSpec::required("start", ParamType::Date, "First day"))
                    .param(ParamSpec::required("end", ParamType::Date, "Last day"))
                    .param(ParamSpec::optional(
                        "model",
                        ParamType::String,
                        "Attribution model id (default northbeam_custom)",
                    )),
                |args| {
                    let model = arg_string(args, "model").unwrap_or_else(|| "northbeam_custom".into());
                    RequestPlan::post(
                        "/exports/data-export",
                        json!({
                            "period_type": "FIXED",
                            "period_options": {
                                "period_starting_at": arg_value(args, "start"),
                                "period_ending_at": arg_value(args, "end"),
                            },
                            "attribution_options": { "attribution_models": [model] },
                            "metrics": [{ "id": "rev" }, { "id": "spend" }, { "id": "roas" }],
                        }),
                    )
                },
            ),
        ],
    }
}
