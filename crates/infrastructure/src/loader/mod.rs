//! Scenario loader
//!
//! Reads experiment documents (YAML) from disk and turns them into validated
//! domain scenarios. Everything that can be checked without touching the
//! network is checked here, including the action kind.
//!
//! Document shape:
//!
//! ```yaml
//! - disrupt_action:
//!     - name: disk-full
//!       listener: {regex: "ERROR.*disk", log: /var/log/app.log, host: h1}
//!       trigger:
//!         - action:
//!             name: restart_service
//!             params: httpd
//!             target_host: h2
//!             wait: 0
//!             timeout: 30
//! ```

mod document;
mod error;

use std::path::{Path, PathBuf};

use domain::{
    Action, ActionKind, Credentials, DomainError, ListenerSpec, LogPattern, RemoteTarget,
    Scenario,
};
use serde_yaml::Value;
use tracing::{debug, info, instrument, warn};

use document::{Fields, kind, parse_error};
pub use error::LoadError;

const DISRUPT_ACTION_KEY: &str = "disrupt_action";
const ACTION_KEY: &str = "action";
const NAME_KEY: &str = "name";
const LISTENER_KEY: &str = "listener";
const TRIGGER_KEY: &str = "trigger";
const REGEX_KEYS: &[&str] = &["regex", "re"];
const LOG_KEY: &str = "log";
const HOST_KEY: &str = "host";
const USERNAME_KEY: &str = "username";
const PASSWORD_KEY: &str = "password";
const PARAMS_KEY: &str = "params";
const TARGET_HOST_KEY: &str = "target_host";
const WAIT_KEY: &str = "wait";
const TIMEOUT_KEY: &str = "timeout";

/// Scenario document extensions, matched case-insensitively
const EXTENSIONS: [&str; 2] = ["yaml", "yml"];

fn has_scenario_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// Scenario documents directly inside `dir`, sorted by file name
///
/// Subdirectories are not searched; other files are ignored.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    let mut ignored = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() && has_scenario_extension(&path) {
            files.push(path);
        } else {
            ignored.push(path);
        }
    }

    if !ignored.is_empty() {
        debug!(?ignored, "The following files were found but ignored");
    }
    files.sort();
    Ok(files)
}

/// Load every scenario document in `dir`, concatenated in file order
#[instrument]
pub fn load_dir(dir: &Path) -> Result<Vec<Scenario>, LoadError> {
    let mut scenarios = Vec::new();
    for file in discover(dir)? {
        scenarios.extend(load_file(&file)?);
    }
    info!(
        count = scenarios.len(),
        registry_version = ActionKind::REGISTRY_VERSION,
        "Scenarios loaded"
    );
    Ok(scenarios)
}

/// Load the scenarios of one document
pub fn load_file(path: &Path) -> Result<Vec<Scenario>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let scenarios = load_str(&text, &path.display().to_string())?;
    debug!(file = %path.display(), count = scenarios.len(), "Scenario file parsed");
    Ok(scenarios)
}

/// Parse scenarios from document text; `origin` labels error messages
pub fn load_str(text: &str, origin: &str) -> Result<Vec<Scenario>, LoadError> {
    let doc: Value = serde_yaml::from_str(text).map_err(|source| LoadError::Yaml {
        origin: origin.to_string(),
        source,
    })?;

    let entries = match &doc {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(entries) => entries,
        other => {
            return Err(parse_error(
                origin,
                "document",
                format!("expected a list of entries, found {}", kind(other)),
            ));
        },
    };

    let mut scenarios = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let entry = Fields::new(entry, origin, format!("entry[{i}]"))?;
        for (j, scenario) in entry.sequence(DISRUPT_ACTION_KEY)?.iter().enumerate() {
            let context = format!("{}.{DISRUPT_ACTION_KEY}[{j}]", entry.context());
            scenarios.push(parse_scenario(&Fields::new(scenario, origin, context)?, origin)?);
        }
    }
    Ok(scenarios)
}

fn domain_error(origin: &str, context: &str, source: DomainError) -> LoadError {
    LoadError::Domain {
        origin: origin.to_string(),
        context: context.to_string(),
        source,
    }
}

fn parse_scenario(fields: &Fields<'_>, origin: &str) -> Result<Scenario, LoadError> {
    let name = fields.string(&[NAME_KEY])?;

    let listener_context = format!("{}.{LISTENER_KEY}", fields.context());
    let listener = parse_listener(
        &Fields::new(fields.required(&[LISTENER_KEY])?, origin, listener_context)?,
        origin,
    )?;

    let mut actions = Vec::new();
    for (i, trigger) in fields.sequence(TRIGGER_KEY)?.iter().enumerate() {
        let trigger_context = format!("{}.{TRIGGER_KEY}[{i}]", fields.context());
        let trigger = Fields::new(trigger, origin, trigger_context)?;
        let action_context = format!("{}.{ACTION_KEY}", trigger.context());
        let action = Fields::new(trigger.required(&[ACTION_KEY])?, origin, action_context)?;
        actions.push(parse_action(&action, origin)?);
    }

    let scenario = Scenario::new(name, listener, actions);
    for i in scenario.shadowed_actions() {
        let action = &scenario.actions[i];
        warn!(
            origin,
            scenario = %scenario.name,
            action = %action.label(),
            log = %scenario.log_target(action),
            "Action waits on a log already followed earlier in the scenario and can never trigger"
        );
    }
    Ok(scenario)
}

fn parse_credentials(fields: &Fields<'_>) -> Result<Credentials, LoadError> {
    Ok(Credentials::from_parts(
        fields.optional_string(USERNAME_KEY)?,
        fields.optional_string(PASSWORD_KEY)?,
    ))
}

fn parse_target(fields: &Fields<'_>, key: &str, origin: &str) -> Result<RemoteTarget, LoadError> {
    let host = fields.string(&[key])?;
    let credentials = parse_credentials(fields)?;
    RemoteTarget::parse(&host, credentials)
        .map_err(|e| domain_error(origin, &format!("{}.{key}", fields.context()), e))
}

fn parse_listener(fields: &Fields<'_>, origin: &str) -> Result<ListenerSpec, LoadError> {
    let regex = fields.string(REGEX_KEYS)?;
    let pattern = LogPattern::parse_non_empty(&regex)
        .map_err(|e| domain_error(origin, &format!("{}.regex", fields.context()), e))?;
    let log = fields.string(&[LOG_KEY])?;
    let target = parse_target(fields, HOST_KEY, origin)?;
    Ok(ListenerSpec::new(pattern, log, target))
}

fn parse_action(fields: &Fields<'_>, origin: &str) -> Result<Action, LoadError> {
    let kind: ActionKind = fields
        .string(&[NAME_KEY])?
        .parse()
        .map_err(|e| domain_error(origin, &format!("{}.{NAME_KEY}", fields.context()), e))?;
    let params = fields.string(&[PARAMS_KEY])?;
    let target = parse_target(fields, TARGET_HOST_KEY, origin)?;
    let wait = fields.seconds(WAIT_KEY)?;
    let timeout = fields.seconds(TIMEOUT_KEY)?;

    let action = Action::new(kind, params, target, wait, timeout)
        .map_err(|e| domain_error(origin, fields.context(), e))?;
    Ok(match fields.optional_string(LOG_KEY)? {
        Some(log) => action.with_log(log),
        None => action,
    })
}
