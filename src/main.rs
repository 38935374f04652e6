use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use log::LevelFilter;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};
use voucher_filter::decision::Evaluation;
use voucher_filter::{phone, Config, Decision, JsonLinesStore, LogNotifier, Message, Pipeline};

fn main() {
    let matches = Command::new("voucher-filter")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Classifies SMS messages into approved vouchers, pending vouchers and noise")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (.toml, .yaml or .yml)")
                .default_value("voucher-filter.toml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("normalize")
                .long("normalize")
                .value_name("PHONE")
                .help("Print the normalized form of a phone number and exit")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("sender")
                .short('s')
                .long("sender")
                .value_name("PHONE")
                .help("Sender phone number of the message to classify")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("name")
                .short('n')
                .long("name")
                .value_name("NAME")
                .help("Resolved contact name of the sender")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("body")
                .short('b')
                .long("body")
                .value_name("TEXT")
                .help("Message body")
                .conflicts_with("body-file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("body-file")
                .long("body-file")
                .value_name("FILE")
                .help("Read the message body from a file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("timestamp")
                .long("timestamp")
                .value_name("MS")
                .help("Reception time in milliseconds since the epoch (default: now)")
                .value_parser(clap::value_parser!(i64))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("approved")
                .long("approved")
                .help("Treat the sender as approved instead of checking the configured list")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("trusted-domain")
                .long("trusted-domain")
                .value_name("DOMAIN")
                .help("Additional trusted redemption domain (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the decision as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("explain")
                .long("explain")
                .help("Show the signals and the rule that decided")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .help("Append approved and pending vouchers to the configured store")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        init_logging(LevelFilter::Info);
        generate_default_config(generate_path);
        return;
    }

    if let Some(raw) = matches.get_one::<String>("normalize") {
        println!("{}", phone::normalize(raw));
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("voucher-filter.toml");

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        config.as_ref().map(Config::log_level).unwrap_or(LevelFilter::Info)
    };
    init_logging(log_level);

    let config = config.unwrap_or_else(|| {
        log::warn!("Configuration file '{config_path}' not found, using default configuration");
        Config::default()
    });

    if matches.get_flag("test-config") {
        println!("🔍 Testing configuration...");
        println!();
        println!("Approved senders: {}", config.approved_senders.len());
        println!("Extra trusted domains: {}", config.trusted_domains.len());
        for domain in &config.trusted_domains {
            println!("  • {domain}");
        }
        println!("Max scanned characters: {}", config.extraction.max_scan_chars);
        match &config.store {
            Some(store) => println!("Store: {}", store.path),
            None => println!("Store: disabled"),
        }
        println!("✅ Configuration is valid");
        return;
    }

    if let Err(e) = run_classification(&matches, config) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

/// `Ok(None)` when the file does not exist.
fn load_config(path: &str) -> anyhow::Result<Option<Config>> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path).map(Some)
    } else {
        Ok(None)
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Add your approved senders and trusted domains before use.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn run_classification(matches: &clap::ArgMatches, mut config: Config) -> anyhow::Result<()> {
    let Some(sender) = matches.get_one::<String>("sender") else {
        anyhow::bail!("--sender is required to classify a message");
    };

    let body = match (
        matches.get_one::<String>("body"),
        matches.get_one::<String>("body-file"),
    ) {
        (Some(body), _) => body.clone(),
        (None, Some(file)) => std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read body file {file}"))?,
        (None, None) => anyhow::bail!("Provide the message body with --body or --body-file"),
    };

    let mut message = Message::new(sender.clone(), body).with_timestamp(
        matches
            .get_one::<i64>("timestamp")
            .copied()
            .unwrap_or_else(now_ms),
    );
    if let Some(name) = matches.get_one::<String>("name") {
        message = message.with_sender_name(name.clone());
    }

    if let Some(extra) = matches.get_many::<String>("trusted-domain") {
        config.trusted_domains.extend(extra.cloned());
    }

    let store = match (matches.get_flag("store"), &config.store) {
        (true, Some(store_config)) => Some(JsonLinesStore::new(&store_config.path)),
        (true, None) => {
            log::warn!("No store configured, vouchers will not be saved");
            None
        }
        (false, _) => None,
    };

    let mut pipeline = Pipeline::from_config(&config, store, LogNotifier);
    let evaluation = pipeline.evaluate(&message, matches.get_flag("approved"));

    if matches.get_flag("json") {
        let output = if matches.get_flag("explain") {
            serde_json::to_string_pretty(&evaluation)?
        } else {
            serde_json::to_string_pretty(&evaluation.decision)?
        };
        println!("{output}");
    } else {
        print_evaluation(&evaluation, matches.get_flag("explain"));
    }

    pipeline.route(&message, &evaluation.decision)
}

fn print_evaluation(evaluation: &Evaluation, explain: bool) {
    match &evaluation.decision {
        Decision::Approved(data) | Decision::Pending(data) => {
            let icon = if matches!(evaluation.decision, Decision::Approved(_)) {
                "✅"
            } else {
                "⏳"
            };
            println!("{icon} {}", evaluation.decision.label().to_uppercase());
            println!("  Merchant: {}", data.merchant_name.as_deref().unwrap_or("-"));
            println!("  Amount:   {}", data.amount.as_deref().unwrap_or("-"));
            println!("  URL:      {}", data.redeem_url.as_deref().unwrap_or("-"));
            println!("  Code:     {}", data.redeem_code.as_deref().unwrap_or("-"));
        }
        Decision::Discard => println!("🗑️  DISCARD"),
    }

    if explain {
        let s = &evaluation.signals;
        println!();
        println!("Rule: {}", evaluation.rule);
        println!("  approved sender:      {}", s.is_approved_sender);
        println!("  strong voucher term:  {}", s.has_strong_voucher_word);
        println!("  promo term:           {}", s.has_coupon_promo_word);
        println!("  url:                  {}", s.has_url);
        println!("  trusted domain:       {}", s.has_trusted_voucher_domain);
        println!("  redemption code:      {}", s.has_redeem_code);
        println!("  access point:         {}", s.has_access_point());
    }
}
