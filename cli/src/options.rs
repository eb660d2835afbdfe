//! Built-in options that edit the registry instead of running anything.

use std::sync::{Arc, Mutex, MutexGuard};

use action_runner_core::{
    CommandTable, Context, Message, OptionError, OptionInterceptor, OptionParam, Params,
    render::{header, tabular},
};
use action_runner_registry::Registry;
use tracing::warn;

pub type SharedRegistry = Arc<Mutex<Registry>>;

/// Table holding `--register`, `--unregister` and `--list`.
pub fn global_options(registry: &SharedRegistry) -> CommandTable {
    CommandTable::new()
        .with_option("register", Arc::new(RegisterOption::new(registry.clone())))
        .with_option("unregister", Arc::new(UnregisterOption::new(registry.clone())))
        .with_option("list", Arc::new(ListOption::new(registry.clone())))
}

/// "Available actions" header followed by the name/root table.
pub fn available_actions(registry: &Registry) -> String {
    let rows: Vec<Vec<String>> = registry
        .list()
        .map(|(name, root)| vec![name.to_string(), root.display().to_string()])
        .collect();

    let mut out = header(Message::AvailableActions.text(registry.locale()));
    out.push_str("\n\n");
    for line in tabular(&rows).lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn lock(registry: &SharedRegistry) -> Result<MutexGuard<'_, Registry>, OptionError> {
    registry
        .lock()
        .map_err(|_| OptionError::Failed("registry lock poisoned".into()))
}

fn failed(err: impl ToString) -> OptionError {
    OptionError::Failed(err.to_string())
}

fn param<'a>(params: &'a Params, name: &str) -> &'a str {
    params.get(name).map(String::as_str).unwrap_or_default()
}

pub struct RegisterOption {
    registry: SharedRegistry,
    params: Vec<OptionParam>,
}

impl RegisterOption {
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            params: vec![
                OptionParam::new("name", "Name the tree is invoked by"),
                OptionParam::new("path", "Root directory of the tree"),
            ],
        }
    }
}

impl OptionInterceptor for RegisterOption {
    fn description(&self) -> Option<&str> {
        Some("Register a new action")
    }

    fn params(&self) -> &[OptionParam] {
        &self.params
    }

    fn run(&self, params: &Params, context: Context) -> Result<Context, OptionError> {
        let name = param(params, "name");
        let mut registry = lock(&self.registry)?;
        registry.register(name, param(params, "path")).map_err(failed)?;
        registry.save().map_err(failed)?;

        let root = registry
            .lookup(name)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "{}",
            Message::ActionRegistered.render(registry.locale(), &[name, &root])
        );
        Ok(context)
    }
}

pub struct UnregisterOption {
    registry: SharedRegistry,
    params: Vec<OptionParam>,
}

impl UnregisterOption {
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            params: vec![OptionParam::new("name", "Registered name to remove")],
        }
    }
}

impl OptionInterceptor for UnregisterOption {
    fn description(&self) -> Option<&str> {
        Some("Remove an existing action")
    }

    fn params(&self) -> &[OptionParam] {
        &self.params
    }

    fn run(&self, params: &Params, context: Context) -> Result<Context, OptionError> {
        let name = param(params, "name");
        let mut registry = lock(&self.registry)?;
        let locale = registry.locale().to_string();

        if !registry.unregister(name) {
            warn!(
                code = %Message::ActionNotRegistered.code(),
                "{}",
                Message::ActionNotRegistered.render(&locale, &[name])
            );
            return Ok(context);
        }
        registry.save().map_err(failed)?;
        println!("{}", Message::ActionUnregistered.render(&locale, &[name]));
        Ok(context)
    }
}

pub struct ListOption {
    registry: SharedRegistry,
}

impl ListOption {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }
}

impl OptionInterceptor for ListOption {
    fn description(&self) -> Option<&str> {
        Some("List registered actions")
    }

    fn run(&self, _params: &Params, context: Context) -> Result<Context, OptionError> {
        let registry = lock(&self.registry)?;
        println!("\n{}", available_actions(&registry));
        Ok(context)
    }
}
