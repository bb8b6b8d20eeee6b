use advantagex::config::ExchangeConfig;
use advantagex::logger::Logger;
use std::error::Error;

/// Function type for scenario entry functions
pub type ScenarioFn = fn(scenario_name: &str, config: &ExchangeConfig, logger: &mut Logger) -> Result<(), Box<dyn Error>>;

/// Entry in the scenario catalog
#[derive(Clone)]
pub struct ScenarioEntry {
    pub short_name: &'static str,
    pub run: ScenarioFn,
}

inventory::collect!(ScenarioEntry);

/// Get all registered scenarios, sorted by name
pub fn get_scenario_catalog() -> Vec<ScenarioEntry> {
    let mut entries: Vec<ScenarioEntry> = inventory::iter::<ScenarioEntry>
        .into_iter()
        .cloned()
        .collect();
    entries.sort_by_key(|entry| entry.short_name);
    entries
}

/// Record one validation check as ✓ or ✗; failed messages are collected in `errors`
pub fn check(logger: &mut Logger, errors: &mut Vec<String>, passed: bool, msg: String) {
    use advantagex::logger::LogEvent;
    if passed {
        advantagex::logln!(logger, LogEvent::Scenario, "✓ {}", msg);
    } else {
        advantagex::errln!(logger, LogEvent::Scenario, "✗ {}", msg);
        errors.push(msg);
    }
}

/// Turn collected validation failures into the scenario result
pub fn finish(scenario_name: &str, errors: Vec<String>) -> Result<(), Box<dyn Error>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("Scenario '{}' validation failed:\n{}", scenario_name, errors.join("\n")).into())
    }
}

// Scenario modules
pub mod reference;
pub mod paced_campaign;
