use crate::adapter::{AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor};

const NAME: &str = "elevar";

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "Elevar",
        base_url: Some("https://api.getelevar.com/v1"),
        auth: AuthScheme::Bearer,
        headers: vec![],
        credential_headers: vec![],
        operations: vec![
            Operation::new(
                ToolDescriptor::new(NAME, "events", "Server-side tracking events for a day")
                    .param(ParamSpec::optional("date", ParamType::Date, "Day (default today)"))
                    .param(ParamSpec::optional("destination", ParamType::String, "Destination filter")),
                |args| {
                    RequestPlan::get("/events")
                        .query_arg("date", args, "date")
                        .query_arg("destination", args, "destination")
                },
            ),
            Operation::new(
                ToolDescriptor::new(NAME, "status", "Destination health and error rates"),
                |_| RequestPlan::get("/monitoring/status"),
            ),
        ],
    }
}
