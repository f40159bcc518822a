use crate::adapter::{arg_string, arg_value, AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor};
use serde_json::json;

const NAME: &str = "notion";

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "Notion",
        base_url: Some("https://api.notion.com/v1"),
        auth: AuthScheme::Bearer,
        headers: vec![("Notion-Version", "2022-06-28")],
        credential_headers: vec![],
        operations: vec![
            Operation::new(
                ToolDescriptor::new(NAME, "search", "Search pages and databases by title")
                    .param(ParamSpec::optional("query", ParamType::String, "Search text").rest()),
                |args| {
                    let query = arg_string(args, "query").unwrap_or_default();
                    RequestPlan::post("/search", json!({ "query": query, "page_size": 20 }))
                },
            ),
            Operation::new(
                ToolDescriptor::new(NAME, "page", "Fetch a page by id")
                    .param(ParamSpec::required("page_id", ParamType::String, "Page id")),
                |args| {
                    let id = arg_string(args, "page_id").unwrap_or_default();
                    RequestPlan::get(format!("/pages/{}", urlencoding::encode(&id)))
                },
            ),
            Operation::new(
                ToolDescriptor::new(NAME, "create_page", "Create a child page")
                    .param(ParamSpec::required("parent_id", ParamType::String, "Parent page id"))
                    .param(ParamSpec::required("title", ParamType::String, "Page title").rest()),
                |args| {
                    RequestPlan::post(
                        "/pages",
                        json!({
                            "parent": { "page_id": arg_value(args, "parent_id") },
                            "properties": {
                                "title": {
                                    "title": [{ "text": { "content": arg_value(args, "title") } }]
                                }
                            }
                        }),
                    )
                },
            ),
        ],
    }
}
