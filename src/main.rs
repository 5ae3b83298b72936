use clap::Parser;
use form_binder::config::parse_cli_value;
use form_binder::core::{EventKind, Headless};
use form_binder::utils::{logger, validation::Validate};
use form_binder::{BinderConfig, BindingSession, CliConfig, EventChannel, MemoryView, ViewSync};
use std::cell::RefCell;
use std::rc::Rc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.json_log {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting form-binder");
    tracing::info!("Loading configuration from: {}", cli.config);

    let mut config = match BinderConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Some(model_path) = &cli.model {
        tracing::info!("Model overridden from: {}", model_path);
        if let Err(e) = config.load_model_file(model_path) {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    match run(&config, &cli) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Err(e) => {
            tracing::error!(
                "Binding failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            std::process::exit(2);
        }
    }

    Ok(())
}

fn run(config: &BinderConfig, cli: &CliConfig) -> form_binder::Result<serde_json::Value> {
    let channel = EventChannel::new(config.session_id()?);
    let view = Rc::new(RefCell::new(config.build_view()));
    let sync = ViewSync::attach(&channel, Rc::clone(&view));

    let _trace_changes = channel.on_change(|change| {
        tracing::info!(
            "change {} = {} ({:?})",
            change.property,
            change.value,
            change.origin
        );
    });
    let updated_name = channel.event_name(EventKind::Updated);
    let _trace_updates = channel.on_updated(move || tracing::info!("{}", updated_name));

    let model = config.initial_model();
    let session = if config.has_view() {
        BindingSession::bind(&channel, &model, &sync)?
    } else {
        BindingSession::bind(&channel, &model, &Headless)?
    };

    for (name, raw) in &cli.sets {
        session.set(name, parse_cli_value(raw))?;
    }

    for (name, raw) in &cli.edits {
        apply_edit(&sync, &view, name, raw);
    }

    let model = if cli.raw {
        session.get_model()
    } else {
        session.resolved_model()
    };

    let output = serde_json::json!({
        "session": session.id().as_str(),
        "model": model,
        "skipped": session.load_report().skipped,
        "view": view.borrow().elements(),
    });

    session.dispose();
    Ok(output)
}

fn apply_edit(sync: &ViewSync<MemoryView>, view: &Rc<RefCell<MemoryView>>, name: &str, raw: &str) {
    let Some(element) = sync.locate(name) else {
        tracing::warn!("No element to edit for '{}'", name);
        return;
    };

    view.borrow_mut().type_into(element, raw);
    if !sync.edited(element, raw) {
        tracing::warn!("Element for '{}' is not bound in this session", name);
    }
}
