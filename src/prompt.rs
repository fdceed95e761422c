use anyhow::{Context, Result};
use dialoguer::Input;
use tracing::warn;

use crate::{cli::Cli, region::{BoundaryKind, BoundaryRequest}};

/// Ask one free-text question on the terminal.
fn ask(prompt: &str) -> Result<String> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .with_context(|| format!("reading answer to {prompt:?}"))?;
    Ok(answer.trim().to_string())
}

/// Use the flag value if given, otherwise prompt for it.
fn flag_or_ask(flag: &Option<String>, prompt: &str) -> Result<String> {
    match flag {
        Some(value) => Ok(value.trim().to_string()),
        None => ask(prompt),
    }
}

/// Build the boundary request from flags, prompting for whatever is missing.
pub fn collect_request(cli: &Cli) -> Result<BoundaryRequest> {
    let kind = match cli.kind {
        Some(kind) => kind,
        None => {
            println!("Choose boundary type:");
            println!("  1) State  (by name or code, e.g., Texas or TX)");
            println!("  2) City   (requires city name AND state)");
            println!("  3) FIPS   (5-digit county FIPS, e.g., 48113)");
            ask("Enter 'state', 'city', or 'fips' (or 1/2/3)")?.parse::<BoundaryKind>()?
        }
    };

    if kind != BoundaryKind::City && cli.state.is_some() {
        warn!("--state is only used with --kind city; ignoring it");
    }

    Ok(match kind {
        BoundaryKind::State => BoundaryRequest::state(
            &flag_or_ask(&cli.value, "Enter state name or 2-letter code (e.g., Texas or TX)")?
        )?,
        BoundaryKind::City => {
            let city = flag_or_ask(&cli.value, "Enter city/place name (e.g., Dallas)")?;
            let state = flag_or_ask(&cli.state, "Enter state name or code for that city (e.g., Texas or TX)")?;
            BoundaryRequest::city(&city, &state)?
        }
        BoundaryKind::Fips => BoundaryRequest::county(
            &flag_or_ask(&cli.value, "Enter 5-digit county FIPS code (e.g., 48113)")?
        )?,
    })
}
