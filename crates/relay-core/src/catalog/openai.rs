use crate::adapter::{arg_string, arg_value, AuthScheme, Operation, RequestPlan, ServiceSpec};
use crate::descriptor::{ParamSpec, ParamType, ToolDescriptor};
use serde_json::{json, Value};

const NAME: &str = "openai";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub fn spec() -> ServiceSpec {
    ServiceSpec {
        name: NAME,
        display_name: "OpenAI",
        base_url: Some("https://api.openai.com/v1"),
        auth: AuthScheme::Bearer,
        headers: vec![],
        credential_headers: vec![],
        operations: vec![
            Operation::new(
                ToolDescriptor::new(NAME, "chat", "Ask a chat model")
                    .param(ParamSpec::optional("model", ParamType::String, "Model id"))
                    .param(ParamSpec::required("prompt", ParamType::String, "User prompt").rest()),
                |args| {
                    let model = arg_string(args, "model").unwrap_or_else(|| DEFAULT_MODEL.into());
                    RequestPlan::post(
                        "/chat/completions",
                        json!({
                            "model": model,
                            "messages": [{ "role": "user", "content": arg_value(args, "prompt") }],
                        }),
                    )
                },
            )
            .shaped(first_choice),
            Operation::new(ToolDescriptor::new(NAME, "models", "List available models"), |_| {
                RequestPlan::get("/models")
            })
            .shaped(model_ids),
        ],
    }
}

fn first_choice(body: Value) -> Result<Value, String> {
    let reply = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| "completion has no message content".to_string())?;
    Ok(json!({ "reply": reply, "model": body["model"], "usage": body["usage"] }))
}

fn model_ids(body: Value) -> Result<Value, String> {
    let ids: Vec<Value> = body["data"]
        .as_array()
        .map(|models| models.iter().map(|m| m["id"].clone()).collect())
        .unwrap_or_default();
    Ok(json!({ "models": ids }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_choice_extracts_reply() {
        let body = json!({
            "model": "gpt-4o-mini",
            "choices": [{ "message": { "role": "assistant", "content": "Hi!" } }],
            "usage": { "total_tokens": 9 }
        });
        let shaped = first_choice(body).unwrap();
        assert_eq!(shaped["reply"], "Hi!");
        assert_eq!(shaped["usage"]["total_tokens"], 9);
    }

    #[test]
    fn first_choice_without_content_is_rejected() {
        assert!(first_choice(json!({ "choices": [] })).is_err());
    }
}
