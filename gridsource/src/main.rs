//! # Gridsource CLI Entry Point
//!
//! The main executable for the Gridsource tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and loads the
//!    persisted [`config::Profile`].
//! 2. **Configuration**: Merges flags over the profile into a `gridsource_core::DataSource`.
//! 3. **Execution**: Delegates the page request to the data source.
//! 4. **Presentation**: Formats and prints the resulting page or error to standard output/error.

mod cli;
mod config;
mod formatter;

use clap::Parser;
use cli::{Cli, Commands, ConfigCommands};
use config::{ConfigManager, Profile};
use formatter::{ColumnList, FormattedString, GenericError, PageTable};
use gridsource_core::{
    COLUMNS, ClientFactory, ClientSettings, Credentials, DEFAULT_PAGE_SIZE, DataSource,
    DataSourceOptions, FilterModel, GridRequest, InitialState, ListMode, LogLevel,
    PaginationModel,
};
use std::{process, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let Cli {
        token,
        environment,
        log_level,
        base_url,
        command,
    } = Cli::parse();
    init_tracing(log_level);

    let globals = Globals {
        token,
        environment,
        log_level,
        base_url,
    };
    let config = ConfigManager::new().unwrap_or_else(|err| exit_with(err));

    match command {
        Commands::Rows {
            page,
            page_size,
            sort,
            filters,
            model,
            mode,
            json,
        } => {
            if globals.token.as_deref().is_none_or(|token| token.trim().is_empty()) {
                exit_with(GenericError(
                    "Missing API token",
                    "pass --token or set GRIDSOURCE_API_TOKEN",
                ));
            }

            let profile = config.load().unwrap_or_else(|err| exit_with(err));
            tracing::debug!(path = %config.path().display(), ?profile, "loaded profile");

            let source = build_source(&globals, &profile, model, mode);
            let page_size = page_size
                .or(profile.page_size)
                .unwrap_or(DEFAULT_PAGE_SIZE);

            let request = GridRequest {
                pagination_model: Some(PaginationModel::new(page, page_size)),
                sort_model: sort,
                filter_model: FilterModel { items: filters },
            };

            fetch_rows(&source, &request, json).await;
        }
        Commands::Columns => {
            println!("{}", FormattedString::from(ColumnList(COLUMNS)));
        }
        Commands::InitialState { page_size } => {
            let profile = config.load().unwrap_or_else(|err| exit_with(err));
            let page_size = page_size
                .or(profile.page_size)
                .unwrap_or(DEFAULT_PAGE_SIZE);

            print_json(&InitialState::new(page_size));
        }
        Commands::Config { sub } => run_config(&config, sub),
    }
}

/// Sets up `tracing` on stderr.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, plus the HTTP exchange logs
/// when `--log-level` asks for them.
fn init_tracing(log_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if log_level > LogLevel::None {
            EnvFilter::new("warn,gridsource::remote=trace")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct Globals {
    token: Option<String>,
    environment: Option<String>,
    log_level: LogLevel,
    base_url: Option<String>,
}

fn build_source(
    globals: &Globals,
    profile: &Profile,
    model: Option<String>,
    mode: ListMode,
) -> DataSource {
    let mut settings = ClientSettings::default();
    if let Some(base_url) = globals.base_url.as_ref().or(profile.base_url.as_ref()) {
        settings = settings
            .with_base_url(base_url)
            .unwrap_or_else(|err| exit_with(GenericError("Invalid base URL", err)));
    }

    // An empty token still reaches the data source, which reports it as a configuration error.
    let mut credentials = Credentials::new(globals.token.clone().unwrap_or_default())
        .with_log_level(globals.log_level);
    if let Some(environment) = &globals.environment {
        credentials = credentials.with_environment(environment);
    }

    let mut options = DataSourceOptions::default()
        .with_default_page_size(profile.page_size.unwrap_or(DEFAULT_PAGE_SIZE))
        .with_list_mode(mode);
    if let Some(model_ids) = model.or_else(|| profile.model_ids.clone()) {
        options = options.with_model_ids(model_ids);
    }

    tracing::debug!(
        base_url = %settings.base_url,
        environment = ?credentials.environment,
        ?mode,
        "configured data source"
    );

    DataSource::new(Arc::new(ClientFactory::new(settings)), credentials, options)
}

async fn fetch_rows(source: &DataSource, request: &GridRequest, json: bool) {
    match source.get_rows(request).await {
        Ok(page) if json => print_json(&page),
        Ok(page) => println!("{}", FormattedString::from(PageTable(page))),
        Err(err) => exit_with(err),
    }
}

fn run_config(config: &ConfigManager, sub: ConfigCommands) {
    let result = match sub {
        ConfigCommands::Show => config.load(),
        ConfigCommands::SetBaseUrl { url } => {
            if let Err(err) = ClientSettings::default().with_base_url(&url) {
                exit_with(GenericError("Invalid base URL", err));
            }
            config.update(|profile| profile.base_url = Some(url))
        }
        ConfigCommands::SetPageSize { page_size } => {
            config.update(|profile| profile.page_size = Some(page_size))
        }
        ConfigCommands::SetModel { model_ids } => {
            config.update(|profile| profile.model_ids = Some(model_ids))
        }
    };

    match result {
        Ok(profile) => {
            println!("Profile: {}", config.path().display());
            print_json(&profile);
        }
        Err(err) => exit_with(err),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_value(value) {
        Ok(value) => println!("{}", FormattedString::from(value)),
        Err(err) => exit_with(GenericError("Failed to serialize output", err)),
    }
}

fn exit_with(err: impl Into<FormattedString>) -> ! {
    eprintln!("{}", err.into());
    process::exit(1);
}
