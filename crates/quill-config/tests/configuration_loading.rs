//! Behaviour tests for layered configuration loading.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use quill_config::{Config, ConfigError, LogFormat, default_log_filter, default_log_format};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const START_ROWS_VAR: &str = "QUILL_START_ROWS";

struct Harness {
    temp_dir: TempDir,
    cli_args: RefCell<Vec<OsString>>,
    env_previous: RefCell<Option<Option<OsString>>>,
    outcome: RefCell<Option<Result<Config, ConfigError>>>,
    _guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        Self {
            temp_dir,
            cli_args: RefCell::new(vec![OsString::from("quill")]),
            env_previous: RefCell::new(None),
            outcome: RefCell::new(None),
            _guard: guard,
        }
    }

    fn write_config(&self, contents: &str) {
        let path = self.temp_dir.path().join("quill.toml");
        if let Err(error) = fs::write(&path, contents) {
            panic!("failed to write configuration: {error}");
        }
        self.push_cli_arg("--config-path");
        self.push_cli_arg(path.into_os_string());
    }

    fn set_env(&self, value: &str) {
        let previous = std::env::var_os(START_ROWS_VAR);
        // Environment mutation is `unsafe` under edition 2024; `ENV_MUTEX`
        // serialises every test that touches it and `Drop` restores it.
        unsafe { std::env::set_var(START_ROWS_VAR, value) };
        self.env_previous.borrow_mut().get_or_insert(previous);
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.outcome.borrow().is_some() {
            return;
        }
        let args = self.cli_args.borrow().clone();
        *self.outcome.borrow_mut() = Some(Config::from_args(args));
    }

    fn config(&self) -> Config {
        self.load();
        match self.outcome.borrow().as_ref() {
            Some(Ok(config)) => config.clone(),
            Some(Err(error)) => panic!("configuration failed to load: {error}"),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if let Some(previous) = self.env_previous.borrow_mut().take() {
            match previous {
                Some(value) => unsafe { std::env::set_var(START_ROWS_VAR, value) },
                None => unsafe { std::env::remove_var(START_ROWS_VAR) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the start rows to {rows}")]
fn given_configuration_file(harness: &Harness, rows: u32) {
    harness.write_config(&format!("start_rows = {rows}\n"));
}

#[given("the environment sets the start rows to {rows}")]
fn given_environment_override(harness: &Harness, rows: u32) {
    harness.set_env(&rows.to_string());
}

#[when("the command line sets the start rows to {rows}")]
fn when_cli_override(harness: &Harness, rows: u32) {
    harness.push_cli_arg(format!("--start-rows={rows}"));
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("the start geometry is {cols} columns by {rows} rows")]
fn then_geometry(harness: &Harness, cols: u32, rows: u32) {
    let config = harness.config();
    assert_eq!((config.start_cols(), config.start_rows()), (cols, rows));
}

#[then("the editor executable is {binary}")]
fn then_editor_executable(harness: &Harness, binary: String) {
    let config = harness.config();
    assert_eq!(config.nvim_bin().as_str(), binary.trim_matches('"'));
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert!(!config.dump_grid_on_exit());
}

#[then("loading fails because the geometry is empty")]
fn then_geometry_rejected(harness: &Harness) {
    harness.load();
    match harness.outcome.borrow().as_ref() {
        Some(Err(ConfigError::EmptyGeometry { cols, rows })) => {
            assert_eq!((*cols, *rows), (160, 0));
        }
        Some(Err(error)) => panic!("unexpected error: {error}"),
        Some(Ok(config)) => panic!("configuration loaded: {config:?}"),
        None => panic!("configuration was not loaded"),
    }
}

#[scenario(path = "tests/features/configuration_loading.feature")]
fn configuration_loading(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[test]
fn log_format_parses_case_insensitively() {
    assert_eq!("COMPACT".parse::<LogFormat>().ok(), Some(LogFormat::Compact));
    assert!("yaml".parse::<LogFormat>().is_err());
    assert!(LogFormat::Compact.supports_ansi());
    assert!(!LogFormat::Json.supports_ansi());
}

#[test]
fn file_values_reach_every_accessor() {
    let harness = Harness::new();
    harness.write_config(concat!(
        "nvim_bin = \"/opt/nvim/bin/nvim\"\n",
        "start_cols = 100\n",
        "log_filter = \"quill=debug\"\n",
        "log_format = \"compact\"\n",
        "pending_request_warn_threshold = 8\n",
        "dump_grid_on_exit = true\n",
    ));

    let config = harness.config();

    assert_eq!(config.nvim_bin().as_str(), "/opt/nvim/bin/nvim");
    assert_eq!(config.start_cols(), 100);
    assert_eq!(config.log_filter(), "quill=debug");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.pending_request_warn_threshold(), 8);
    assert!(config.dump_grid_on_exit());
}
