use crate::adapter::{AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor};

const NAME: &str = "recharm";

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "Recharm",
        base_url: Some("https://api.recharm.com/v1"),
        auth: AuthScheme::Header {
            name: "x-api-key",
            prefix: "",
        },
        headers: vec![],
        credential_headers: vec![],
        operations: vec![
            Operation::new(ToolDescriptor::new(NAME, "campaigns", "List SMS flows and campaigns"), |_| {
                RequestPlan::get("/campaigns")
            }),
            Operation::new(
                ToolDescriptor::new(NAME, "stats", "Revenue and engagement for a period")
                    .param(ParamSpec::required("start", ParamType::Date, "First day"))
                    .param(ParamSpec::optional("end", ParamType::Date, "Last day")),
                |args| {
                    RequestPlan::get("/stats")
                        .query_arg("start_date", args, "start")
                        .query_arg("end_date", args, "end")
                },
            ),
        ],
    }
}
