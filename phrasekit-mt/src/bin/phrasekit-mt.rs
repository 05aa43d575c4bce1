use clap::{Arg, ArgAction, Command};
use phrasekit::parse;
use phrasekit_mt::{Formality, MtConfig, ProviderKind, TranslationSession};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("phrasekit-mt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Machine-translate a placeholder string into one or more locales")
        .arg(
            Arg::new("message")
                .help("Source string, e.g. \"You have {count:plural:{} item|{} items}\"")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("targets")
                .help("Target locale codes (e.g., de fr ja)")
                .required_unless_present("tokens")
                .num_args(1..)
                .index(2),
        )
        .arg(
            Arg::new("source-locale")
                .long("source")
                .short('s')
                .help("Source language code (default: en, or the config's value)"),
        )
        .arg(
            Arg::new("context")
                .long("context")
                .short('c')
                .help("Context hint passed to the provider"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("JSON config file (default: environment variables)"),
        )
        .arg(
            Arg::new("formality")
                .long("formality")
                .help("default, more or less"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the mock translator instead of a real provider")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the tokenized source as JSON and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Debug logging and the full request log")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(message) = matches.get_one::<String>("message") else {
        return Err("missing message".into());
    };
    let targets: Vec<String> = matches
        .get_many::<String>("targets")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    if matches.get_flag("tokens") {
        println!("{}", serde_json::to_string_pretty(&parse(message))?);
        return Ok(());
    }

    // 1. Configuration: file or environment, then flags
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => MtConfig::from_json_file(path)?,
        None if matches.get_flag("mock") => MtConfig {
            provider: ProviderKind::Mock,
            ..MtConfig::default()
        },
        None => MtConfig::from_env()?,
    };
    if matches.get_flag("mock") {
        config.provider = ProviderKind::Mock;
    }
    if let Some(source) = matches.get_one::<String>("source-locale") {
        config.source_locale = source.clone();
    }
    if let Some(formality) = matches.get_one::<String>("formality") {
        config.formality = formality.parse::<Formality>()?;
    }
    config.validate()?;

    // 2. Provider and session
    let translator = match config.build_translator() {
        Ok(translator) => translator,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("   Set GOOGLE_TRANSLATE_API_KEY or DEEPL_API_KEY, or use --mock");
            return Err(e.into());
        }
    };
    if verbose {
        println!("📝 Source: \"{}\"", message);
        println!(
            "🌍 {} → {} via {}",
            config.source_locale,
            targets.join(", "),
            translator.provider_name()
        );
        println!();
    }
    let mut session = TranslationSession::new(config.build_client(translator));

    // 3. Translate and print
    let context = matches.get_one::<String>("context").map(|s| s.as_str());
    let results = session.translate_all(message, &targets, context).await;
    for (locale, text) in &results {
        match text {
            Some(text) => println!("{}: {}", locale, text),
            None => println!("{}: <untranslated>", locale),
        }
    }

    if verbose {
        println!();
        println!("📋 Request log:");
        for entry in session.log().entries() {
            println!("   {}", entry);
        }
    }

    Ok(())
}
