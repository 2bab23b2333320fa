use std::fmt;
use std::path::Path;

use crate::api::{ApiError, StocklistApi};
use crate::config::{StocktakeConfig, load_config, resolve_config_path};
use crate::http::HttpStocklistApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Pass,
    Fail,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorCheck {
    pub name: String,
    pub state: CheckState,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    pub fn has_failures(&self) -> bool {
        self.checks
            .iter()
            .any(|check| check.state == CheckState::Fail)
    }

    pub fn summary(&self) -> String {
        let passed = self
            .checks
            .iter()
            .filter(|check| check.state == CheckState::Pass)
            .count();
        let failed = self.checks.len().saturating_sub(passed);
        format!("{passed} passed, {failed} failed")
    }
}

const CONFIG_EXISTS: &str = "config file exists";
const CONFIG_VALID: &str = "config parses and validates";
const SERVER_REACHABLE: &str = "server answers for store";

pub type ApiFactory<'a> = dyn Fn(&StocktakeConfig) -> Result<Box<dyn StocklistApi>, ApiError> + 'a;

pub fn run_doctor() -> DoctorReport {
    let connect = |config: &StocktakeConfig| {
        HttpStocklistApi::new(config.server.clone())
            .map(|api| Box::new(api) as Box<dyn StocklistApi>)
    };

    match resolve_config_path() {
        Ok(config_path) => run_doctor_at(&config_path, &connect),
        Err(error) => {
            let mut checks = vec![fail_check("config path resolves", error.to_string())];
            push_skipped_checks(
                &mut checks,
                &[CONFIG_EXISTS, CONFIG_VALID, SERVER_REACHABLE],
                "config path could not be resolved",
            );
            DoctorReport { checks }
        }
    }
}

pub fn run_doctor_at(config_path: &Path, connect: &ApiFactory<'_>) -> DoctorReport {
    let mut checks = Vec::new();

    if !config_path.exists() {
        checks.push(fail_check(
            CONFIG_EXISTS,
            format!("expected at {}", config_path.display()),
        ));
        push_skipped_checks(
            &mut checks,
            &[CONFIG_VALID, SERVER_REACHABLE],
            "config file is missing",
        );
        return DoctorReport { checks };
    }

    checks.push(pass_check(
        CONFIG_EXISTS,
        format!("found at {}", config_path.display()),
    ));

    match load_config(config_path) {
        Ok(config) => {
            checks.push(pass_check(CONFIG_VALID, "config is valid"));
            checks.push(match connect(&config) {
                Ok(api) => check_server(api.as_ref(), config.store.id),
                Err(error) => fail_check(SERVER_REACHABLE, error.to_string()),
            });
        }
        Err(error) => {
            checks.push(fail_check(CONFIG_VALID, error.to_string()));
            checks.push(skipped_check(SERVER_REACHABLE, "config is invalid"));
        }
    }

    DoctorReport { checks }
}

pub fn check_server(api: &dyn StocklistApi, store_id: u64) -> DoctorCheck {
    match api.fetch_items(store_id) {
        Ok(snapshot) => pass_check(
            SERVER_REACHABLE,
            format!(
                "store {store_id} has {} items and {} lists",
                snapshot.items.len(),
                snapshot.lists.len()
            ),
        ),
        Err(error) => fail_check(SERVER_REACHABLE, error.to_string()),
    }
}

fn pass_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Pass,
        details: details.into(),
    }
}

fn fail_check(name: &str, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck {
        name: name.to_string(),
        state: CheckState::Fail,
        details: details.into(),
    }
}

fn skipped_check(name: &str, reason: &str) -> DoctorCheck {
    fail_check(name, format!("skipped because {reason}"))
}

fn push_skipped_checks(checks: &mut Vec<DoctorCheck>, names: &[&str], reason: &str) {
    checks.extend(
        names
            .iter()
            .copied()
            .map(|name| skipped_check(name, reason)),
    );
}
