use crate::adapter::{arg_string, AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor, ValidatedArgs};
use chrono::Utc;
use serde_json::{json, Value};

const NAME: &str = "shopify";
const API: &str = "/admin/api/2024-01";
/// Shopify's page size ceiling for the orders endpoint.
const MAX_PAGE: &str = "250";
/// Sales totals stop following `page_info` cursors after this many pages.
const MAX_SALES_PAGES: usize = 40;

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "Shopify",
        base_url: None,
        auth: AuthScheme::Header {
            name: "X-Shopify-Access-Token",
            prefix: "",
        },
        headers: vec![("Accept", "application/json")],
        credential_headers: vec![],
        operations: vec![
            Operation::new(
                ToolDescriptor::new(NAME, "today_sales", "Total sales and order count for today"),
                today_sales,
            )
            .shaped(summarize_sales)
            .paged("orders", MAX_SALES_PAGES),
            Operation::new(
                ToolDescriptor::new(NAME, "sales", "Total sales and order count for a date range")
                    .param(ParamSpec::required("start", ParamType::Date, "First day (inclusive)"))
                    .param(ParamSpec::optional("end", ParamType::Date, "Last day (inclusive)")),
                sales,
            )
            .shaped(summarize_sales)
            .paged("orders", MAX_SALES_PAGES),
            Operation::new(
                ToolDescriptor::new(NAME, "orders", "List recent orders")
                    .param(ParamSpec::optional("limit", ParamType::Integer, "Max orders"))
                    .param(ParamSpec::optional(
                        "status",
                        ParamType::String,
                        "open, closed, cancelled or any",
                    )),
                |args| {
                    RequestPlan::get(format!("{API}/orders.json"))
                        .query("status", arg_string(args, "status").unwrap_or_else(|| "any".into()))
                        .query_arg("limit", args, "limit")
                },
            ),
            Operation::new(
                ToolDescriptor::new(NAME, "order", "Fetch one order by id")
                    .param(ParamSpec::required("id", ParamType::String, "Order id")),
                |args| {
                    let id = arg_string(args, "id").unwrap_or_default();
                    RequestPlan::get(format!("{API}/orders/{}.json", urlencoding::encode(&id)))
                },
            ),
            Operation::new(
                ToolDescriptor::new(NAME, "products", "List products")
                    .param(ParamSpec::optional("limit", ParamType::Integer, "Max products")),
                |args| RequestPlan::get(format!("{API}/products.json")).query_arg("limit", args, "limit"),
            ),
            Operation::new(
                ToolDescriptor::new(NAME, "customers", "List customers")
                    .param(ParamSpec::optional("limit", ParamType::Integer, "Max customers")),
                |args| {
                    RequestPlan::get(format!("{API}/customers.json")).query_arg("limit", args, "limit")
                },
            ),
        ],
    }
}

fn orders_between(start: &str, end: Option<&str>) -> RequestPlan {
    let plan = RequestPlan::get(format!("{API}/orders.json"))
        .query("status", "any")
        .query("fields", "total_price")
        .query("limit", MAX_PAGE)
        .query("created_at_min", format!("{start}T00:00:00Z"));
    match end {
        Some(end) => plan.query("created_at_max", format!("{end}T23:59:59Z")),
        None => plan,
    }
}

fn today_sales(_args: &ValidatedArgs) -> RequestPlan {
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    orders_between(&today, None)
}

fn sales(args: &ValidatedArgs) -> RequestPlan {
    let start = arg_string(args, "start").unwrap_or_default();
    let end = arg_string(args, "end");
    orders_between(&start, end.as_deref())
}

/// `{orders:[{total_price:"10.00"}, ...]}` → `{totalSales, orderCount}`,
/// plus `truncated` when not every page was fetched.
pub(crate) fn summarize_sales(body: Value) -> Result<Value, String> {
    let orders = body["orders"]
        .as_array()
        .ok_or_else(|| "response has no orders array".to_string())?;
    let total: f64 = orders
        .iter()
        .filter_map(|o| match &o["total_price"] {
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
        .sum();
    let total = (total * 100.0).round() / 100.0;
    let mut summary = json!({ "totalSales": total, "orderCount": orders.len() });
    if body["truncated"] == true {
        summary["truncated"] = Value::Bool(true);
    }
    Ok(summary)
}
