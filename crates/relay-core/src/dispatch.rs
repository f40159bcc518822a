//! Command dispatch: service lookup, argument validation and a bounded,
//! panic-isolated adapter call that always yields a [`ResultEnvelope`].

use crate::adapter::{HttpAdapter, ToolAdapter};
use crate::catalog;
use crate::command::{self, Command, Parsed};
use crate::config::{Config, FallbackCommand};
use crate::descriptor::ToolDescriptor;
use crate::error::Result;
use crate::types::{ErrorKind, ResultEnvelope};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Reply for free text when no fallback command is configured.
pub const FORWARDED: &str = "forwarded";

pub struct Dispatcher {
    adapters: BTreeMap<String, Arc<dyn ToolAdapter>>,
    timeout: Duration,
    fallback: Option<FallbackCommand>,
}

impl Dispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            adapters: BTreeMap::new(),
            timeout,
            fallback: None,
        }
    }

    /// Register every built-in service, configured from `config.services`.
    ///
    /// A service whose credentials reference an unset environment variable is
    /// registered unconfigured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.dispatch.timeout())
            .build()?;
        let mut dispatcher = Self::new(config.dispatch.timeout());
        dispatcher.fallback = config.chat.fallback.clone();

        for spec in catalog::all() {
            let name = spec.name;
            let adapter = HttpAdapter::new(spec, client.clone());
            match config.connection(name) {
                Ok(Some(conn)) => adapter.configure(conn),
                Ok(None) => {}
                Err(e) => warn!(service = name, error = %e, "service left unconfigured"),
            }
            dispatcher.register(Arc::new(adapter));
        }
        Ok(dispatcher)
    }

    pub fn with_fallback(mut self, fallback: FallbackCommand) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) {
        self.adapters
            .insert(adapter.service().to_ascii_lowercase(), adapter);
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Case-insensitive adapter lookup.
    pub fn adapter(&self, service: &str) -> Option<&Arc<dyn ToolAdapter>> {
        self.adapters.get(&service.to_ascii_lowercase())
    }

    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn ToolAdapter>> {
        self.adapters.values()
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.adapters
            .values()
            .flat_map(|a| a.descriptors().iter().cloned())
            .collect()
    }

    /// Turn a `<service>_<action>` tool call into a command.
    pub fn command_for_tool(&self, tool_name: &str, arguments: &Map<String, Value>) -> Option<Command> {
        let descriptor = self
            .adapters
            .values()
            .flat_map(|a| a.descriptors().iter())
            .find(|d| d.tool_name() == tool_name)?;
        let mut cmd = Command::new(descriptor.service.clone(), descriptor.action.clone());
        for (key, value) in arguments {
            let raw = match value {
                Value::String(s) => s.clone(),
                Value::Null => continue,
                other => other.to_string(),
            };
            cmd.args.insert(key.clone(), raw);
        }
        Some(cmd)
    }

    /// Parse user input and dispatch it. Free text goes to the configured
    /// fallback command, or is acknowledged as forwarded.
    pub async fn dispatch_text(&self, content: &str) -> ResultEnvelope {
        match command::parse(content) {
            Parsed::Command(cmd) => self.dispatch(&cmd).await,
            Parsed::NotACommand(text) => match &self.fallback {
                Some(fb) => {
                    let cmd = Command::new(fb.service.clone(), fb.action.clone())
                        .with_arg(fb.param.clone(), text);
                    self.dispatch(&cmd).await
                }
                None => ResultEnvelope::ok_message(FORWARDED),
            },
        }
    }

    pub async fn dispatch(&self, command: &Command) -> ResultEnvelope {
        let started = Instant::now();
        let envelope = self.run(command).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match envelope.error_kind {
            None => info!(
                service = %command.service,
                action = %command.action,
                elapsed_ms,
                "dispatch ok"
            ),
            Some(kind) => warn!(
                service = %command.service,
                action = %command.action,
                kind = kind.as_str(),
                elapsed_ms,
                "dispatch failed"
            ),
        }
        envelope
    }

    async fn run(&self, command: &Command) -> ResultEnvelope {
        let Some(adapter) = self.adapter(&command.service) else {
            return ResultEnvelope::err(
                ErrorKind::UnknownService,
                format!("unknown service '{}'", command.service),
            );
        };

        let descriptor = adapter
            .descriptors()
            .iter()
            .find(|d| d.action.eq_ignore_ascii_case(&command.action));
        let Some(descriptor) = descriptor else {
            let actions: Vec<&str> = adapter.descriptors().iter().map(|d| d.action.as_str()).collect();
            let message = if command.action.is_empty() {
                format!("{} needs an action; available: {}", adapter.service(), actions.join(", "))
            } else {
                format!(
                    "unknown action '{}' for {}; available: {}",
                    command.action,
                    adapter.service(),
                    actions.join(", ")
                )
            };
            return ResultEnvelope::err(ErrorKind::UnknownAction, message);
        };

        let args = match descriptor.bind(command) {
            Ok(args) => args,
            Err(errors) => return ResultEnvelope::err(ErrorKind::InvalidArguments, errors.to_string()),
        };

        let call = AssertUnwindSafe(adapter.invoke(&descriptor.action, &args)).catch_unwind();
        match tokio::time::timeout(self.timeout, call).await {
            Err(_) => ResultEnvelope::err(
                ErrorKind::Timeout,
                format!(
                    "{} {} timed out after {}s",
                    adapter.service(),
                    descriptor.action,
                    self.timeout.as_secs_f64()
                ),
            ),
            Ok(Err(panic)) => ResultEnvelope::err(
                ErrorKind::UpstreamError,
                format!("{} adapter failed: {}", adapter.service(), panic_message(&*panic)),
            ),
            Ok(Ok(Err(e))) => ResultEnvelope::err(e.kind(), e.to_string()),
            Ok(Ok(Ok(data))) => ResultEnvelope::ok(data),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
