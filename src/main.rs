mod charts;
mod scenarios;

use advantagex::config::ExchangeConfig;
use advantagex::logger::{sanitize_filename, ConsoleReceiver, FileReceiver, LogEvent, Logger, ReceiverId};
use advantagex::utils::{self, RAND_SEED, TOTAL_SIMULATION_RUNS};
use advantagex::{log, logln};
use scenarios::get_scenario_catalog;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

fn add_file_receiver(logger: &mut Logger, path: &str, events: Vec<LogEvent>) -> Option<ReceiverId> {
    match FileReceiver::new(&PathBuf::from(path), events) {
        Ok(receiver) => Some(logger.add_receiver(receiver)),
        Err(e) => {
            eprintln!("Warning: cannot open log file '{}': {}", path, e);
            None
        }
    }
}

fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    // Parse and filter out --verbose, --fastbreak and --config arguments
    let mut args = Vec::new();
    let mut skip_next = false;
    let mut fastbreak = false;
    let mut config_path: Option<String> = None;
    for (i, arg) in raw_args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--verbose" {
            if i + 1 < raw_args.len() && raw_args[i + 1] == "auction" {
                utils::VERBOSE_AUCTION.store(true, Ordering::Relaxed);
                skip_next = true;
            }
            continue;
        }
        if arg == "--fastbreak" {
            fastbreak = true;
            continue;
        }
        if arg == "--config" {
            match raw_args.get(i + 1) {
                Some(path) => config_path = Some(path.clone()),
                None => {
                    eprintln!("Error: --config expects a path to a JSON file.");
                    std::process::exit(1);
                }
            }
            skip_next = true;
            continue;
        }
        args.push(arg.clone());
    }

    let config = match &config_path {
        Some(path) => match ExchangeConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => ExchangeConfig::default(),
    };

    if args.len() > 1 && args[1] == "charts" {
        match charts::generate_all_charts(&config) {
            Ok(()) => {
                println!("Chart generation completed successfully.");
            }
            Err(e) => {
                eprintln!("Error generating charts: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if args.len() > 1 {
        let scenario_arg = &args[1];

        let iterations = if args.len() > 2 {
            match args[2].parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("Error: Invalid iterations parameter '{}'. Expected a number.", args[2]);
                    std::process::exit(1);
                }
            }
        } else {
            1
        };

        let start_iteration = if args.len() > 3 {
            match args[3].parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    eprintln!("Error: Invalid start iteration parameter '{}'. Expected a number.", args[3]);
                    std::process::exit(1);
                }
            }
        } else {
            0
        };

        let all_scenarios = get_scenario_catalog();
        let scenarios: Vec<_> = if scenario_arg == "all" {
            all_scenarios.clone()
        } else {
            match all_scenarios.iter().find(|s| s.short_name == scenario_arg) {
                Some(scenario) => vec![scenario.clone()],
                None => {
                    eprintln!("Error: Scenario '{}' not found.", scenario_arg);
                    eprintln!("Available scenarios:");
                    for s in &all_scenarios {
                        eprintln!("  - {}", s.short_name);
                    }
                    std::process::exit(1);
                }
            }
        };

        // Scenario details only make sense on the console for a single named run
        let mut logger = Logger::new();
        if scenario_arg != "all" && iterations == 1 {
            logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation, LogEvent::Scenario]));
        } else {
            logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation]));
        }
        let summary_receiver_id = add_file_receiver(&mut logger, "log/summary.log", vec![LogEvent::Validation]);

        TOTAL_SIMULATION_RUNS.store(0, Ordering::Relaxed);
        if iterations > 1 {
            logln!(&mut logger, LogEvent::Validation, "Running '{}' {} times...\n", scenario_arg, iterations);
        } else {
            logln!(&mut logger, LogEvent::Validation, "Running '{}'...\n", scenario_arg);
        }

        'scenarios: for scenario in &scenarios {
            log!(&mut logger, LogEvent::Validation, "{}: ", scenario.short_name);

            let scenario_log = format!("log/{}/scenario.log", sanitize_filename(scenario.short_name));
            let scenario_receiver_id = add_file_receiver(&mut logger, &scenario_log,
                vec![LogEvent::Scenario, LogEvent::Simulation, LogEvent::Report, LogEvent::Auction]);

            for i in start_iteration..(start_iteration + iterations) {
                if iterations > 1 {
                    log!(&mut logger, LogEvent::Validation, "[{}/{}] ", i - start_iteration + 1, iterations);
                }

                RAND_SEED.store(i, Ordering::Relaxed);

                match (scenario.run)(scenario.short_name, &config, &mut logger) {
                    Ok(()) => {
                        if iterations > 1 {
                            logln!(&mut logger, LogEvent::Validation, "✓");
                        } else {
                            logln!(&mut logger, LogEvent::Validation, "✓ PASSED");
                        }
                    }
                    Err(e) => {
                        if iterations > 1 {
                            logln!(&mut logger, LogEvent::Validation, "✗");
                        } else {
                            logln!(&mut logger, LogEvent::Validation, "✗ FAILED: {}", e);
                        }
                        if fastbreak {
                            if let Some(id) = scenario_receiver_id {
                                logger.remove_receiver(id);
                            }
                            logln!(&mut logger, LogEvent::Validation, "\nStopping scenario execution due to failure (--fastbreak enabled)");
                            logln!(&mut logger, LogEvent::Validation, "Error at iteration {}/{} (seed {}): {}",
                                i - start_iteration + 1, iterations, i, e);
                            break 'scenarios;
                        }
                    }
                }

                let _ = logger.flush();
            }

            if let Some(id) = scenario_receiver_id {
                logger.remove_receiver(id);
            }
        }

        let final_count = TOTAL_SIMULATION_RUNS.load(Ordering::Relaxed);
        logln!(&mut logger, LogEvent::Validation, "\nTotal simulation runs completed: {}", final_count);

        if let Some(id) = summary_receiver_id {
            logger.remove_receiver(id);
        }
    } else {
        // No arguments: the reference scenario with its reports on the console
        let mut logger = Logger::new();
        logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Simulation, LogEvent::Report, LogEvent::Scenario]));
        if let Err(e) = scenarios::reference::run("reference", &config, &mut logger) {
            eprintln!("Error running scenario: {}", e);
            std::process::exit(1);
        }
    }
}
