use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use phish_detector::classifier::{ClassifierError, FixedScore};
use phish_detector::config::ClassifierMode;
use phish_detector::{ClassifierStatus, Config, DetectionReport, EmailMessage, PhishingDetector};
use std::io::{self, BufRead, Write};
use std::process;

const EXIT_WORDS: &[&str] = &["exit", "quit", "q"];

/// Exit status when the classifier is required but cannot be loaded.
const EXIT_MODEL_UNAVAILABLE: i32 = 1;

fn main() {
    let matches = Command::new("phish-detector")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Classify an email as phishing or legitimate")
        .long_about(
            "Combines keyword/URL heuristics with an optional text classifier.\n\
             Without --subject/--body/--from or --email, prompts for the message on stdin.",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("phish-detector.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Write the default configuration to FILE and exit")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("subject")
                .long("subject")
                .value_name("TEXT")
                .help("Message subject (non-interactive)"),
        )
        .arg(
            Arg::new("body")
                .long("body")
                .value_name("TEXT")
                .help("Message body (non-interactive)"),
        )
        .arg(
            Arg::new("from")
                .long("from")
                .value_name("ADDRESS")
                .help("Sender address (non-interactive)"),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .value_name("FILE")
                .help("Analyse a raw message file (headers, blank line, body)")
                .conflicts_with_all(["subject", "body", "from"]),
        )
        .arg(
            Arg::new("probability")
                .long("probability")
                .value_name("P")
                .help("Use this phishing probability instead of a model")
                .value_parser(clap::value_parser!(f64))
                .conflicts_with_all(["rules-only", "require-model"]),
        )
        .arg(
            Arg::new("rules-only")
                .long("rules-only")
                .help("Disable the classifier")
                .action(ArgAction::SetTrue)
                .conflicts_with("require-model"),
        )
        .arg(
            Arg::new("require-model")
                .long("require-model")
                .help("Fail if the trained model artifacts cannot be loaded")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("vectorizer")
                .long("vectorizer")
                .value_name("FILE")
                .help("Vectorizer artifact (overrides configuration)"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("FILE")
                .help("Classifier artifact (overrides configuration)"),
        )
        .arg(
            Arg::new("repeat")
                .long("repeat")
                .help("Keep prompting for messages until 'exit' is entered")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the report as JSON")
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

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("phish-detector.yaml");

    let mut config = match Config::load_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };
    apply_overrides(&mut config, &matches);

    if let Err(e) = config.validate() {
        eprintln!("❌ Configuration validation failed: {e:#}");
        process::exit(1);
    }

    if matches.get_flag("test-config") {
        println!("🔍 Configuration OK");
        println!("   Suspicious words: {}", config.rules.suspicious_words.len());
        println!("   Shorteners: {}", config.rules.shorteners.len());
        println!(
            "   Thresholds: base {} / adaptive {}",
            config.fusion.base_threshold, config.fusion.adaptive_threshold
        );
        println!("   Classifier mode: {:?}", config.classifier.mode);
        return;
    }

    let probability = matches.get_one::<f64>("probability").copied();
    let detector = match build_detector(&config, probability) {
        Ok(detector) => detector,
        Err(e) => {
            eprintln!("❌ {e}");
            eprintln!("   Train a model first or run with --rules-only.");
            process::exit(EXIT_MODEL_UNAVAILABLE);
        }
    };

    if let Some(warning) = detector.classifier_status().warning() {
        eprintln!("⚠️  {warning}");
    }

    let json = matches.get_flag("json");

    if let Some(email_file) = matches.get_one::<String>("email") {
        let raw = match std::fs::read_to_string(email_file) {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!("❌ Error reading email file {email_file}: {e}");
                process::exit(1);
            }
        };
        let message = EmailMessage::parse_raw(&raw);
        print_report(&mut io::stdout(), &message, &detector.detect(&message), json);
        return;
    }

    if ["subject", "body", "from"]
        .iter()
        .any(|id| matches.contains_id(id))
    {
        let field = |id: &str| {
            matches
                .get_one::<String>(id)
                .map(String::as_str)
                .unwrap_or_default()
        };
        let message = EmailMessage::new(field("subject"), field("body"), field("from"));
        print_report(&mut io::stdout(), &message, &detector.detect(&message), json);
        return;
    }

    run_interactive(&detector, matches.get_flag("repeat"), json);
}

/// An externally supplied probability replaces the model entirely.
fn build_detector(
    config: &Config,
    probability: Option<f64>,
) -> Result<PhishingDetector, ClassifierError> {
    match probability {
        Some(p) => Ok(PhishingDetector::with_classifier(
            config,
            Box::new(FixedScore(p)),
            ClassifierStatus::Loaded {
                name: "external".to_string(),
            },
        )),
        None => PhishingDetector::from_config(config),
    }
}

fn apply_overrides(config: &mut Config, matches: &ArgMatches) {
    if matches.get_flag("rules-only") {
        config.classifier.mode = ClassifierMode::Disabled;
    }
    if matches.get_flag("require-model") {
        config.classifier.mode = ClassifierMode::Required;
    }
    if let Some(path) = matches.get_one::<String>("vectorizer") {
        config.classifier.vectorizer_path = path.clone();
    }
    if let Some(path) = matches.get_one::<String>("model") {
        config.classifier.model_path = path.clone();
    }
}

fn generate_default_config(path: &str) {
    match Config::default().to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}

fn run_interactive(detector: &PhishingDetector, repeat: bool, json: bool) {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    // Keep stdout clean for the JSON reports.
    let mut out: Box<dyn Write> = if json {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };

    let _ = writeln!(out, "=== Phishing Email Detector ===");
    if repeat {
        let _ = writeln!(out, "Type 'exit' at any prompt to quit.");
    }

    loop {
        let Some(subject) = prompt(&mut input, &mut out, "Enter email subject: ", repeat) else {
            break;
        };
        let Some(body) = read_body(&mut input, &mut out, repeat) else {
            break;
        };
        let Some(from) = prompt(&mut input, &mut out, "Enter sender email address: ", repeat)
        else {
            break;
        };

        let message = EmailMessage::new(&subject, &body, &from);
        print_report(&mut io::stdout(), &message, &detector.detect(&message), json);

        if !repeat {
            break;
        }
        let _ = writeln!(out, "{}", "-".repeat(60));
    }
}

/// One line from stdin without its line ending. `None` on end of input.
fn read_line(input: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        Err(e) => {
            log::error!("Failed to read from stdin: {e}");
            None
        }
    }
}

fn is_exit_word(line: &str) -> bool {
    EXIT_WORDS.contains(&line.trim().to_lowercase().as_str())
}

/// One answer. `None` on end of input, or on an exit word when looping.
fn prompt(
    input: &mut impl BufRead,
    out: &mut impl Write,
    label: &str,
    repeat: bool,
) -> Option<String> {
    let _ = write!(out, "{label}");
    let _ = out.flush();

    let line = read_line(input)?;
    if repeat && is_exit_word(&line) {
        let _ = writeln!(out, "👋 Exiting...");
        return None;
    }
    Some(line)
}

/// The message body. When looping it spans several lines up to the first
/// empty one, joined with single spaces.
fn read_body(input: &mut impl BufRead, out: &mut impl Write, repeat: bool) -> Option<String> {
    if !repeat {
        return prompt(input, out, "Enter email body: ", false);
    }

    let _ = writeln!(out, "Enter email body (finish with an empty line):");
    let _ = out.flush();

    let mut lines = Vec::new();
    while let Some(line) = read_line(input) {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if is_exit_word(line) {
            let _ = writeln!(out, "👋 Exiting...");
            return None;
        }
        lines.push(line.to_string());
    }
    Some(lines.join(" "))
}

fn print_report(
    out: &mut impl Write,
    message: &EmailMessage,
    report: &DetectionReport,
    json: bool,
) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(text) => {
                let _ = writeln!(out, "{text}");
            }
            Err(e) => log::error!("Failed to serialize report: {e}"),
        }
        return;
    }

    log::debug!(
        "Analysed message from '{}' with subject '{}'",
        message.from_address,
        message.subject
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "--- Detection Result ---");
    if report.result.verdict {
        let _ = writeln!(out, "⚠️  This email looks like PHISHING (Spam)");
    } else {
        let _ = writeln!(out, "✅ This email looks SAFE (Ham)");
    }

    if !report.result.reasons.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Reasons:");
        for reason in &report.result.reasons {
            let _ = writeln!(out, " - {reason}");
        }
    }
}
