use crate::adapter::{arg_value, AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor};
use serde_json::json;

const NAME: &str = "prescient";

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "Prescient AI",
        base_url: Some("https://api.prescientai.com/v1"),
        auth: AuthScheme::Bearer,
        headers: vec![],
        credential_headers: vec![],
        operations: vec![
            Operation::new(
                ToolDescriptor::new(NAME, "forecast", "Revenue forecast for a period")
                    .param(ParamSpec::required("start", ParamType::Date, "First day"))
                    .param(ParamSpec::required("end", ParamType::Date, "Last day")),
                |args| {
                    RequestPlan::post(
                        "/forecast",
                        json!({ "start_date": arg_value(args, "start"), "end_date": arg_value(args, "end") }),
                    )
                },
            ),
            Operation::new(
                ToolDescriptor::new(NAME, "mmm", "Media-mix model channel contributions")
                    .param(ParamSpec::optional("channel", ParamType::String, "Limit to one channel")),
                |args| RequestPlan::get("/mmm/contributions").query_arg("channel", args, "channel"),
            ),
        ],
    }
}
