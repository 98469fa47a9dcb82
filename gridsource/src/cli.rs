//! # CLI
//!
//! This module defines the command-line interface of `gridsource` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring sorts
//! are `field:asc|desc` and filters are `field:operator:value`).
use clap::{Parser, Subcommand};
use gridsource_core::{FilterItem, ListMode, LogLevel, SortItem};
use serde_json::Value;
use std::num::NonZeroU64;

#[derive(Parser)]
#[command(
    name = "gridsource",
    version,
    about = "Browse a remote record collection page by page, the way a data grid does"
)]
pub struct Cli {
    /// API token used to query the record API
    #[arg(long, global = true, env = "GRIDSOURCE_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Sandbox environment to query instead of the primary one
    #[arg(long, global = true, env = "GRIDSOURCE_ENVIRONMENT")]
    pub environment: Option<String>,

    /// How much of each HTTP exchange to log (none, basic, body, body-and-headers)
    #[arg(long, global = true, default_value = "none")]
    pub log_level: LogLevel,

    /// Record API host (overrides the profile)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one page of rows
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// gridsource rows --page 1 --page-size 20 --sort _updated_at:desc --filter status:equals:published
    /// ```
    Rows {
        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: u64,

        /// Rows per page (defaults to the profile, then 50)
        #[arg(long)]
        page_size: Option<NonZeroU64>,

        /// Sort column, in priority order (field:asc|desc)
        #[arg(long = "sort", value_parser = parse_sort)]
        sort: Vec<SortItem>,

        /// Filter predicate (field:operator:value)
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<FilterItem>,

        /// Comma-separated collection ids to restrict the listing to
        #[arg(long)]
        model: Option<String>,

        /// List call flavour (envelope or flat)
        #[arg(long, default_value = "envelope")]
        mode: ListMode,

        /// Print the page as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the grid column metadata
    Columns,

    /// Print the pagination state for the first render
    InitialState {
        #[arg(long)]
        page_size: Option<NonZeroU64>,
    },

    /// Show or edit the persisted profile
    Config {
        #[command(subcommand)]
        sub: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the profile and where it is stored
    Show,
    /// Set the record API host
    SetBaseUrl { url: String },
    /// Set the default page size
    SetPageSize { page_size: NonZeroU64 },
    /// Set the collections every listing is restricted to
    SetModel { model_ids: String },
}

fn parse_sort(value: &str) -> Result<SortItem, String> {
    let (field, direction) = value
        .split_once(':')
        .ok_or_else(|| format!("Invalid sort '{value}'. Expected 'field:asc' or 'field:desc'"))?;

    if field.trim().is_empty() {
        return Err("Sort field cannot be empty".to_string());
    }

    Ok(SortItem {
        field: field.trim().to_string(),
        sort: Some(direction.trim().parse()?),
    })
}

fn parse_filter(value: &str) -> Result<FilterItem, String> {
    let mut parts = value.splitn(3, ':');

    let (Some(field), Some(operator), Some(raw)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!(
            "Invalid filter '{value}'. Expected 'field:operator:value'"
        ));
    };

    if field.trim().is_empty() || operator.trim().is_empty() {
        return Err("Filter field and operator cannot be empty".to_string());
    }

    Ok(FilterItem {
        field: field.trim().to_string(),
        operator: operator.trim().to_string(),
        value: parse_filter_value(raw),
    })
}

/// Numbers and booleans are kept typed; anything else is a string.
fn parse_filter_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsource_core::SortDirection;
    use serde_json::json;

    #[test]
    fn test_parse_sort() {
        let item = parse_sort("_updated_at:DESC").unwrap();

        assert_eq!(item.field, "_updated_at");
        assert_eq!(item.sort, Some(SortDirection::Desc));
        assert!(parse_sort("title").is_err());
        assert!(parse_sort(":asc").is_err());
        assert!(parse_sort("title:sideways").is_err());
    }

    #[test]
    fn test_parse_filter() {
        let item = parse_filter("status:equals:published").unwrap();
        assert_eq!(item.field, "status");
        assert_eq!(item.operator, "equals");
        assert_eq!(item.value, json!("published"));

        let item = parse_filter("position:greaterThan:3").unwrap();
        assert_eq!(item.value, json!(3));

        // Only the first two colons separate parts.
        let item = parse_filter("_updated_at:lessThan:2024-01-01T00:00:00Z").unwrap();
        assert_eq!(item.value, json!("2024-01-01T00:00:00Z"));

        assert!(parse_filter("status:equals").is_err());
        assert!(parse_filter(":equals:x").is_err());
    }

    #[test]
    fn test_parse_rows_command() {
        let cli = Cli::try_parse_from([
            "gridsource",
            "--token",
            "secret",
            "rows",
            "--page",
            "2",
            "--sort",
            "title:asc",
            "--filter",
            "status:is:draft",
            "--mode",
            "flat",
            "--log-level",
            "body",
        ])
        .unwrap();

        assert_eq!(cli.token.as_deref(), Some("secret"));
        assert_eq!(cli.log_level, LogLevel::Body);

        let Commands::Rows {
            page,
            page_size,
            sort,
            filters,
            mode,
            json,
            ..
        } = cli.command
        else {
            panic!("Expected the rows command");
        };

        assert_eq!(page, 2);
        assert_eq!(page_size, None);
        assert_eq!(sort.len(), 1);
        assert_eq!(filters[0].operator, "is");
        assert_eq!(mode, ListMode::Flat);
        assert!(!json);
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let result = Cli::try_parse_from(["gridsource", "rows", "--page-size", "0"]);

        assert!(result.is_err());
    }
}
