//! Leading-flag interception.
//!
//! Before traversal starts, every leading token that looks like a flag
//! (`-name` or `--name`) is consumed together with the parameters its
//! interceptor declares. Each interceptor rewrites the [`Context`]. The pass
//! stops at the first token that is not a flag.
//!
//! ```
//! use action_runner_core::{intercept, Context, TableOptions, CommandTable, DEFAULT_LOCALE};
//!
//! let tokens: Vec<String> = ["--dry-run", "deploy"].iter().map(|s| s.to_string()).collect();
//! let table = CommandTable::new();
//! let source = TableOptions::new(&table);
//! let pass = intercept(&tokens, 0, &source, Context::new(), DEFAULT_LOCALE).unwrap();
//!
//! assert_eq!(pass.cursor, 1);
//! assert!(pass.context.has_flag("dry-run"));
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{OptionError, ResolveError, Result};
use crate::manifest::{ManifestOption, load_option};
use crate::messages::Message;
use crate::table::CommandTable;

static FLAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--?([\w\d-]*)").expect("static regex must compile"));

/// Returns the flag name if `token` is a flag.
///
/// ```
/// use action_runner_core::flag_name;
///
/// assert_eq!(flag_name("--register"), Some("register"));
/// assert_eq!(flag_name("-v"), Some("v"));
/// assert_eq!(flag_name("--option-test123"), Some("option-test123"));
/// assert_eq!(flag_name("deploy"), None);
/// ```
pub fn flag_name(token: &str) -> Option<&str> {
    FLAG_RE
        .captures(token)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// A parameter an interceptor consumes after its flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionParam {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl OptionParam {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Bound parameters, param name to token.
pub type Params = BTreeMap<String, String>;

/// A named flag handler.
pub trait OptionInterceptor: Send + Sync {
    fn description(&self) -> Option<&str> {
        None
    }

    /// Parameters consumed after the flag, in order.
    fn params(&self) -> &[OptionParam] {
        &[]
    }

    fn run(&self, params: &Params, context: Context) -> std::result::Result<Context, OptionError>;
}

/// Interceptor used for flags nothing is registered for.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOption;

impl OptionInterceptor for NoopOption {
    fn run(&self, _params: &Params, context: Context) -> std::result::Result<Context, OptionError> {
        Ok(context)
    }
}

/// Where interceptors are looked up by flag name.
pub trait OptionSource {
    /// `Ok(None)` means no interceptor is known for `name`.
    fn resolve(&self, name: &str) -> Result<Option<Arc<dyn OptionInterceptor>>>;
}

/// Resolves options from a [`CommandTable`] only.
#[derive(Clone, Copy)]
pub struct TableOptions<'a> {
    table: &'a CommandTable,
}

impl<'a> TableOptions<'a> {
    pub fn new(table: &'a CommandTable) -> Self {
        Self { table }
    }
}

impl OptionSource for TableOptions<'_> {
    fn resolve(&self, name: &str) -> Result<Option<Arc<dyn OptionInterceptor>>> {
        Ok(self.table.option(name))
    }
}

/// Resolves options for a tree root: the table first, then
/// `<root>/options/<name>.yml`.
#[derive(Clone, Copy)]
pub struct RootOptions<'a> {
    root: &'a Path,
    table: &'a CommandTable,
}

impl<'a> RootOptions<'a> {
    pub fn new(root: &'a Path, table: &'a CommandTable) -> Self {
        Self { root, table }
    }
}

impl OptionSource for RootOptions<'_> {
    fn resolve(&self, name: &str) -> Result<Option<Arc<dyn OptionInterceptor>>> {
        if let Some(option) = self.table.option(name) {
            return Ok(Some(option));
        }
        let manifest = load_option(self.root, name)?;
        Ok(manifest.map(|m| Arc::new(ManifestOption::new(m)) as Arc<dyn OptionInterceptor>))
    }
}

/// Result of the interceptor pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interception {
    /// Index of the first token not consumed.
    pub cursor: usize,
    pub context: Context,
}

/// Consumes leading flags from `tokens[cursor..]`.
///
/// Each flag is recorded in the context, its interceptor takes as many of the
/// following tokens as it declares parameters (fewer if the stream runs out)
/// and replaces the context with its result. Every iteration consumes at
/// least the flag itself, so the pass always terminates.
///
/// # Errors
///
/// Lookup failures from `source` and errors returned by an interceptor.
/// Unknown flags are not errors: they are logged in `locale` and skipped.
pub fn intercept(
    tokens: &[String],
    mut cursor: usize,
    source: &dyn OptionSource,
    mut context: Context,
    locale: &str,
) -> Result<Interception> {
    while let Some(name) = tokens.get(cursor).and_then(|t| flag_name(t)) {
        cursor += 1;
        context.push_flag(name);

        let option: Arc<dyn OptionInterceptor> = match source.resolve(name)? {
            Some(option) => option,
            None => {
                warn!(
                    code = %Message::UnknownOption.code(),
                    "{}",
                    Message::UnknownOption.render(locale, &[name])
                );
                Arc::new(NoopOption)
            }
        };

        let mut params = Params::new();
        for param in option.params() {
            let Some(value) = tokens.get(cursor) else {
                break;
            };
            params.insert(param.name.clone(), value.clone());
            cursor += 1;
        }
        debug!(option = name, ?params, "running option");

        context = option
            .run(&params, context)
            .map_err(|source| ResolveError::Interceptor {
                name: name.to_string(),
                source,
            })?;
    }

    Ok(Interception { cursor, context })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::messages::DEFAULT_LOCALE;

    /// Records the params it was called with.
    struct Recording {
        params: Vec<OptionParam>,
        calls: Mutex<Vec<Params>>,
    }

    impl Recording {
        fn new(names: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                params: names.iter().map(|n| OptionParam::new(n, "")).collect(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl OptionInterceptor for Recording {
        fn params(&self) -> &[OptionParam] {
            &self.params
        }

        fn run(
            &self,
            params: &Params,
            context: Context,
        ) -> std::result::Result<Context, OptionError> {
            self.calls.lock().unwrap().push(params.clone());
            Ok(context.with("seen", params.len() as i64))
        }
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn run_pass(input: &[String], cursor: usize, table: &CommandTable) -> Result<Interception> {
        intercept(input, cursor, &TableOptions::new(table), Context::new(), DEFAULT_LOCALE)
    }

    #[test]
    fn test_flag_grammar() {
        assert_eq!(flag_name("-"), Some(""));
        assert_eq!(flag_name("--"), Some(""));
        assert_eq!(flag_name("--name=value"), Some("name"));
        assert_eq!(flag_name("---x"), Some("-x"));
        assert_eq!(flag_name("x--"), None);
    }

    #[test]
    fn test_no_leading_flags_is_identity() {
        let table = CommandTable::new();
        let ctx = Context::new().with("k", "v");
        let input = tokens(&["deploy", "--late"]);
        let pass =
            intercept(&input, 0, &TableOptions::new(&table), ctx.clone(), DEFAULT_LOCALE).unwrap();
        assert_eq!(pass.cursor, 0);
        assert_eq!(pass.context, ctx);
    }

    #[test]
    fn test_consumes_declared_params() {
        let register = Recording::new(&["param0", "param1"]);
        let table = CommandTable::new().with_option("register", register.clone());
        let input = tokens(&["--register", "foo", "/path", "next-cmd"]);

        let pass = run_pass(&input, 0, &table).unwrap();
        assert_eq!(&input[pass.cursor..], ["next-cmd"]);
        assert_eq!(pass.context.flags(), ["register"]);

        let calls = register.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["param0"], "foo");
        assert_eq!(calls[0]["param1"], "/path");
    }

    #[test]
    fn test_missing_trailing_params_are_omitted() {
        let register = Recording::new(&["firstParam", "secondParam"]);
        let table = CommandTable::new().with_option("option1", register.clone());
        let input = tokens(&["--option1", "param1"]);

        let pass = run_pass(&input, 0, &table).unwrap();
        assert_eq!(pass.cursor, 2);

        let calls = register.calls.lock().unwrap();
        assert_eq!(calls[0].len(), 1);
        assert_eq!(calls[0]["firstParam"], "param1");
    }

    #[test]
    fn test_unknown_flags_are_recorded_and_skipped() {
        let table = CommandTable::new();
        let input = tokens(&["--option1", "-option2", "deploy"]);
        let pass = run_pass(&input, 0, &table).unwrap();
        assert_eq!(pass.cursor, 2);
        assert_eq!(pass.context.flags(), ["option1", "option2"]);
        assert!(pass.context.extensions().is_empty());
    }

    #[test]
    fn test_params_may_look_like_flags() {
        let register = Recording::new(&["value"]);
        let table = CommandTable::new().with_option("set", register.clone());
        let input = tokens(&["--set", "--weird", "deploy"]);
        let pass = run_pass(&input, 0, &table).unwrap();
        assert_eq!(pass.cursor, 2);
        assert_eq!(register.calls.lock().unwrap()[0]["value"], "--weird");
    }

    #[test]
    fn test_starts_at_cursor() {
        let table = CommandTable::new();
        let input = tokens(&["root", "--flag", "cmd"]);
        let pass = run_pass(&input, 1, &table).unwrap();
        assert_eq!(pass.cursor, 2);
    }

    #[test]
    fn test_root_options_prefer_table_then_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("options")).unwrap();
        std::fs::write(
            dir.path().join("options").join("region.yml"),
            "params:\n  - name: region\n",
        )
        .unwrap();

        let table = CommandTable::new().with_option("quiet", Arc::new(NoopOption));
        let source = RootOptions::new(dir.path(), &table);
        assert!(source.resolve("quiet").unwrap().is_some());
        assert!(source.resolve("missing").unwrap().is_none());

        let input = tokens(&["--region", "eu", "--quiet", "deploy"]);
        let pass = intercept(&input, 0, &source, Context::new(), DEFAULT_LOCALE).unwrap();
        assert_eq!(pass.cursor, 3);
        assert_eq!(pass.context.flags(), ["region", "quiet"]);
        assert_eq!(pass.context.get_str("region"), Some("eu"));
    }

    #[test]
    fn test_interceptor_error_aborts() {
        struct Failing;
        impl OptionInterceptor for Failing {
            fn run(&self, _: &Params, _: Context) -> std::result::Result<Context, OptionError> {
                Err(OptionError::Failed("nope".into()))
            }
        }

        let table = CommandTable::new().with_option("bad", Arc::new(Failing));
        let input = tokens(&["--bad"]);
        let err = run_pass(&input, 0, &table).unwrap_err();
        assert!(matches!(err, ResolveError::Interceptor { ref name, .. } if name == "bad"));
    }
}
