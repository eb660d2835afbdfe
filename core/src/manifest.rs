//! Declarative behaviours read from YAML files in the command tree.
//!
//! # Leaf (`<group>/<name>.yml`)
//!
//! ```yaml
//! description: Deploy the service
//! args:
//!   - name: env
//!     description: Target environment
//!   - name: tag
//!     description: Image tag
//!     optional: true
//! exec: ["./deploy.sh", "{env}", "{tag}"]
//! passthrough: false
//! ```
//!
//! `{name}` placeholders in `exec` are filled from bound inputs first, then
//! from context extensions. An `exec` element that is exactly a placeholder
//! for an unbound optional argument is dropped.
//!
//! # Group index (`<group>/index.yml`)
//!
//! ```yaml
//! description: Database tasks
//! strict: true        # the next token must name an existing child
//! set:
//!   database: primary
//! ```
//!
//! # Option (`<root>/options/<name>.yml`)
//!
//! ```yaml
//! description: Pick a target region
//! params:
//!   - name: region
//! set:
//!   region_pinned: true
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{Context, ContextValue};
use crate::error::{ActionError, HandlerError, OptionError, ResolveError, Result};
use crate::handler::{Group, GroupHandler};
use crate::leaf::{Action, Invocation};
use crate::messages::Message;
use crate::option::{OptionInterceptor, OptionParam, Params};
use crate::position::{LEAF_EXTENSION, is_valid_segment};
use crate::schema::ArgumentSpec;

/// File inside a group directory that configures the group's handler.
pub const GROUP_INDEX: &str = "index.yml";

/// Directory under a tree root that holds option manifests.
pub const OPTIONS_DIR: &str = "options";

/// Prefix of environment variables exported to spawned leaf processes.
pub const ENV_PREFIX: &str = "ACTION_";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([\w.-]+)\}").expect("static regex must compile"));

static WHOLE_PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{([\w.-]+)\}$").expect("static regex must compile"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeafManifest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<ArgumentSpec>,
    /// Program and arguments to spawn.
    #[serde(default)]
    pub exec: Vec<String>,
    /// Append tokens left over after binding to the spawned command.
    #[serde(default)]
    pub passthrough: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupManifest {
    #[serde(default)]
    pub description: Option<String>,
    /// Require the next token to name an existing child.
    #[serde(default)]
    pub strict: bool,
    /// Extensions merged into the context during setup.
    #[serde(default)]
    pub set: BTreeMap<String, ContextValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionManifest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub params: Vec<OptionParam>,
    #[serde(default)]
    pub set: BTreeMap<String, ContextValue>,
}

fn parse<T: DeserializeOwned + Default>(path: &Path, raw: &str) -> Result<T> {
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(raw).map_err(|e| ResolveError::InvalidManifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Reads a leaf manifest.
pub async fn load_leaf(path: &Path) -> Result<LeafManifest> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ResolveError::io(path, e))?;
    parse(path, &raw)
}

/// Reads `<dir>/index.yml`, if present.
pub async fn load_group(dir: &Path) -> Result<Option<GroupManifest>> {
    let path = dir.join(GROUP_INDEX);
    match tokio::fs::read_to_string(&path).await {
        Ok(raw) => parse(&path, &raw).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ResolveError::io(path, e)),
    }
}

/// Reads `<root>/options/<name>.yml`, if present.
pub fn load_option(root: &Path, name: &str) -> Result<Option<OptionManifest>> {
    if !is_valid_segment(name) {
        return Ok(None);
    }
    let path = option_path(root, name);
    match std::fs::read_to_string(&path) {
        Ok(raw) => parse(&path, &raw).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ResolveError::io(path, e)),
    }
}

pub fn option_path(root: &Path, name: &str) -> PathBuf {
    root.join(OPTIONS_DIR)
        .join(format!("{name}.{LEAF_EXTENSION}"))
}

/// Leaf behaviour backed by a [`LeafManifest`].
#[derive(Debug, Clone)]
pub struct ManifestAction {
    manifest: LeafManifest,
}

impl ManifestAction {
    pub fn new(manifest: LeafManifest) -> Self {
        Self { manifest }
    }

    /// The argv that would be spawned for `invocation`.
    pub fn command_line(&self, invocation: &Invocation<'_>) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.manifest.exec.len());
        for part in &self.manifest.exec {
            if let Some(caps) = WHOLE_PLACEHOLDER_RE.captures(part) {
                if self.is_unbound_argument(&caps[1], invocation) {
                    continue;
                }
            }
            let expanded = PLACEHOLDER_RE.replace_all(part, |caps: &Captures<'_>| {
                self.lookup(&caps[1], invocation)
                    .unwrap_or_else(|| caps[0].to_string())
            });
            argv.push(expanded.into_owned());
        }
        if self.manifest.passthrough {
            argv.extend(invocation.rest.iter().cloned());
        }
        argv
    }

    fn is_declared(&self, key: &str) -> bool {
        self.manifest.args.iter().any(|spec| spec.name == key)
    }

    fn is_unbound_argument(&self, key: &str, invocation: &Invocation<'_>) -> bool {
        self.is_declared(key) && !invocation.inputs.contains_key(key)
    }

    fn lookup(&self, key: &str, invocation: &Invocation<'_>) -> Option<String> {
        if let Some(value) = invocation.inputs.get(key) {
            return Some(value.clone());
        }
        if let Some(value) = invocation.context.get(key) {
            return Some(value.to_string());
        }
        self.is_declared(key).then(String::new)
    }
}

/// Environment exported to spawned processes.
pub fn process_env(invocation: &Invocation<'_>) -> Vec<(String, String)> {
    let mut env = vec![
        (format!("{ENV_PREFIX}NAME"), invocation.name.to_string()),
        (
            format!("{ENV_PREFIX}FLAGS"),
            invocation.context.flags().join(","),
        ),
    ];
    for (key, value) in invocation.context.extensions() {
        env.push((env_key(key), value.to_string()));
    }
    env
}

fn env_key(key: &str) -> String {
    let suffix: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{ENV_PREFIX}{suffix}")
}

#[async_trait]
impl Action for ManifestAction {
    fn description(&self) -> Option<&str> {
        self.manifest.description.as_deref()
    }

    fn args(&self) -> Vec<ArgumentSpec> {
        self.manifest.args.clone()
    }

    async fn run(
        &self,
        invocation: &Invocation<'_>,
        out: &mut (dyn Write + Send),
    ) -> std::result::Result<(), ActionError> {
        let argv = self.command_line(invocation);
        let Some((program, args)) = argv.split_first() else {
            writeln!(
                out,
                "{}",
                Message::NoActionsDefined.render(invocation.locale, &[invocation.name])
            )?;
            return Ok(());
        };

        debug!(program, ?args, "spawning leaf process");
        let status = tokio::process::Command::new(program)
            .args(args)
            .envs(process_env(invocation))
            .status()
            .await
            .map_err(|source| ActionError::Spawn {
                program: program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ActionError::Failed {
                status: status.code().unwrap_or(1),
            })
        }
    }
}

/// Group behaviour backed by a [`GroupManifest`].
#[derive(Debug, Clone)]
pub struct ManifestHandler {
    manifest: GroupManifest,
}

impl ManifestHandler {
    pub fn new(manifest: GroupManifest) -> Self {
        Self { manifest }
    }
}

#[async_trait]
impl GroupHandler for ManifestHandler {
    fn description(&self) -> Option<&str> {
        self.manifest.description.as_deref()
    }

    async fn can_run(&self, group: &Group) -> bool {
        let Some(next) = group.next.as_deref() else {
            return false;
        };
        if !self.manifest.strict {
            return true;
        }
        if !is_valid_segment(next) {
            return false;
        }
        let dir = group.path.join(next);
        let leaf = group.path.join(format!("{next}.{LEAF_EXTENSION}"));
        let (dir, leaf) = tokio::join!(tokio::fs::metadata(&dir), tokio::fs::metadata(&leaf));
        dir.is_ok_and(|m| m.is_dir()) || leaf.is_ok_and(|m| m.is_file())
    }

    async fn setup(
        &self,
        _group: &Group,
        mut context: Context,
    ) -> std::result::Result<Context, HandlerError> {
        for (key, value) in &self.manifest.set {
            context.insert(key.clone(), value.clone());
        }
        Ok(context)
    }
}

/// Option behaviour backed by an [`OptionManifest`].
#[derive(Debug, Clone)]
pub struct ManifestOption {
    manifest: OptionManifest,
}

impl ManifestOption {
    pub fn new(manifest: OptionManifest) -> Self {
        Self { manifest }
    }
}

impl OptionInterceptor for ManifestOption {
    fn description(&self) -> Option<&str> {
        self.manifest.description.as_deref()
    }

    fn params(&self) -> &[OptionParam] {
        &self.manifest.params
    }

    fn run(
        &self,
        params: &Params,
        mut context: Context,
    ) -> std::result::Result<Context, OptionError> {
        for (name, value) in params {
            context.insert(name.clone(), value.clone());
        }
        for (key, value) in &self.manifest.set {
            context.insert(key.clone(), value.clone());
        }
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::Inputs;
    use crate::messages::DEFAULT_LOCALE;

    fn leaf(yaml: &str) -> ManifestAction {
        ManifestAction::new(parse(Path::new("leaf.yml"), yaml).unwrap())
    }

    #[test]
    fn test_empty_file_is_default_manifest() {
        let manifest: LeafManifest = parse(Path::new("x.yml"), "  \n").unwrap();
        assert_eq!(manifest, LeafManifest::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = parse::<LeafManifest>(Path::new("x.yml"), "argz: []\n").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidManifest { .. }));
    }

    #[test]
    fn test_command_line_expansion() {
        let action = leaf(
            r#"
args:
  - name: env
  - name: tag
    optional: true
exec: ["deploy", "--env={env}", "{tag}", "{region}", "{unknown}"]
"#,
        );
        let mut inputs = Inputs::new();
        inputs.insert("env".into(), "prod".into());
        let context = Context::new().with("region", "eu-west-1");
        let invocation = Invocation {
            name: "deploy",
            inputs: &inputs,
            context: &context,
            rest: &[],
            locale: DEFAULT_LOCALE,
        };

        assert_eq!(
            action.command_line(&invocation),
            vec!["deploy", "--env=prod", "eu-west-1", "{unknown}"]
        );
    }

    #[test]
    fn test_passthrough_appends_rest() {
        let action = leaf("exec: [echo]\npassthrough: true\n");
        let inputs = Inputs::new();
        let context = Context::new();
        let rest = vec!["a".to_string(), "b".to_string()];
        let invocation = Invocation {
            name: "echo",
            inputs: &inputs,
            context: &context,
            rest: &rest,
            locale: DEFAULT_LOCALE,
        };
        assert_eq!(action.command_line(&invocation), vec!["echo", "a", "b"]);
    }

    #[test]
    fn test_process_env() {
        let inputs = Inputs::new();
        let mut context = Context::new().with("db.name", "primary");
        context.push_flag("verbose");
        context.push_flag("dry-run");
        let invocation = Invocation {
            name: "migrate",
            inputs: &inputs,
            context: &context,
            rest: &[],
            locale: DEFAULT_LOCALE,
        };
        let env = process_env(&invocation);
        assert!(env.contains(&("ACTION_NAME".into(), "migrate".into())));
        assert!(env.contains(&("ACTION_FLAGS".into(), "verbose,dry-run".into())));
        assert!(env.contains(&("ACTION_DB_NAME".into(), "primary".into())));
    }

    #[tokio::test]
    async fn test_empty_exec_reports_to_writer() {
        let action = leaf("description: Nothing yet\n");
        let inputs = Inputs::new();
        let context = Context::new();
        let mut invocation = Invocation {
            name: "noop",
            inputs: &inputs,
            context: &context,
            rest: &[],
            locale: DEFAULT_LOCALE,
        };

        let mut out = Vec::new();
        action.run(&invocation, &mut out).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "No actions have been defined for action \"noop\"\n"
        );

        invocation.locale = "de-de";
        let mut out = Vec::new();
        action.run(&invocation, &mut out).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Für die Aktion \"noop\" sind keine Befehle definiert\n"
        );
    }

    #[tokio::test]
    async fn test_manifest_handler_setup_and_strictness() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("status.yml"), "").unwrap();
        let manifest: GroupManifest =
            parse(Path::new(GROUP_INDEX), "strict: true\nset:\n  database: primary\n").unwrap();
        let handler = ManifestHandler::new(manifest);

        let mut group = Group {
            path: dir.path().to_path_buf(),
            relative: "db".into(),
            next: Some("status".into()),
        };
        assert!(handler.can_run(&group).await);
        group.next = Some("missing".into());
        assert!(!handler.can_run(&group).await);
        group.next = Some("../status".into());
        assert!(!handler.can_run(&group).await);
        group.next = None;
        assert!(!handler.can_run(&group).await);

        let ctx = handler.setup(&group, Context::new()).await.unwrap();
        assert_eq!(ctx.get_str("database"), Some("primary"));
    }

    #[test]
    fn test_manifest_option_binds_params_then_set() {
        let manifest: OptionManifest = parse(
            Path::new("region.yml"),
            "params:\n  - name: region\nset:\n  pinned: true\n",
        )
        .unwrap();
        let option = ManifestOption::new(manifest);
        assert_eq!(option.params().len(), 1);

        let mut params = Params::new();
        params.insert("region".into(), "eu".into());
        let ctx = option.run(&params, Context::new()).unwrap();
        assert_eq!(ctx.get_str("region"), Some("eu"));
        assert_eq!(ctx.get("pinned"), Some(&ContextValue::Bool(true)));
    }

    #[test]
    fn test_load_option_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_option(dir.path(), "nope").unwrap(), None);
        assert_eq!(load_option(dir.path(), "../escape").unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_group_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_group(dir.path()).await.unwrap(), None);
    }
}
