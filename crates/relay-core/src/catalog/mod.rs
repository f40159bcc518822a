//! Built-in service catalog.
//!
//! One module per integration, each returning the [`ServiceSpec`] that a
//! generic [`HttpAdapter`](crate::adapter::HttpAdapter) executes.

use crate::adapter::ServiceSpec;

pub mod elevar;
pub mod gorgias;
pub mod klaviyo;
pub mod northbeam;
pub mod notion;
pub mod openai;
pub mod postscript;
pub mod prescient;
pub mod recharm;
pub mod shopify;
pub mod slack;
pub mod triplewhale;

/// Service names in display order.
pub const SERVICES: &[&str] = &[
    "shopify",
    "klaviyo",
    "postscript",
    "northbeam",
    "triplewhale",
    "gorgias",
    "recharm",
    "prescient",
    "elevar",
    "slack",
    "notion",
    "openai",
];

/// Look up a built-in service by name (case-insensitive).
pub fn spec(name: &str) -> Option<ServiceSpec> {
    let spec = match name.to_ascii_lowercase().as_str() {
        "shopify" => shopify::spec(),
        "klaviyo" => klaviyo::spec(),
        "postscript" => postscript::spec(),
        "northbeam" => northbeam::spec(),
        "triplewhale" => triplewhale::spec(),
        "gorgias" => gorgias::spec(),
        "recharm" => recharm::spec(),
        "prescient" => prescient::spec(),
        "elevar" => elevar::spec(),
        "slack" => slack::spec(),
        "notion" => notion::spec(),
        "openai" => openai::spec(),
        _ => return None,
    };
    Some(spec)
}

pub fn all() -> Vec<ServiceSpec> {
    SERVICES.iter().filter_map(|name| spec(name)).collect()
}
