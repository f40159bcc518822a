use crate::adapter::{arg_value, AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor};
use serde_json::json;

const NAME: &str = "triplewhale";

fn range_params(descriptor: ToolDescriptor) -> ToolDescriptor {
    descriptor
        .param(ParamSpec::required("shop", ParamType::String, "Shop domain"))
        .param(ParamSpec::required("start", ParamType::Date, "First day"))
        .param(ParamSpec::required("end", ParamType::Date, "Last day"))
}

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "Triple Whale",
        base_url: Some("https://api.triplewhale.com/api/v2"),
        auth: AuthScheme::Header {
            name: "x-api-key",
            prefix: "",
        },
        headers: vec![],
        credential_headers: vec![],
        operations: vec![
            Operation::new(
                range_params(ToolDescriptor::new(NAME, "summary", "Summary page metrics")),
                |args| {
                    RequestPlan::post(
                        "/summary-page/get-data",
                        json!({
                            "shopDomain": arg_value(args, "shop"),
                            "period": { "start": arg_value(args, "start"), "end": arg_value(args, "end") },
                        }),
                    )
                },
            ),
            Operation::new(
                range_params(ToolDescriptor::new(NAME, "attribution", "Orders with attribution journeys")),
                |args| {
                    RequestPlan::post(
                        "/attribution/get-orders-with-journeys-v2",
                        json!({
                            "shop": arg_value(args, "shop"),
                            "startDate": arg_value(args, "start"),
                            "endDate": arg_value(args, "end"),
                        }),
                    )
                },
            ),
        ],
    }
}
