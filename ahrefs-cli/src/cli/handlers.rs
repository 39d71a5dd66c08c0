//! Command execution handlers

use std::future::Future;

use ahrefs_core::models::*;
use ahrefs_core::{Shape, LIMITS_AND_USAGE_ENDPOINT};
use anyhow::{anyhow, bail, Context, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::client::{AhrefsClient, Params, Request};
use crate::config::{mask_api_key, CliConfig, ConfigStore, Settings};
use crate::error::RequestError;
use crate::format::{format_success, Writer};

use super::commands::*;

/// Build the API request for a Site Explorer command
pub fn site_explorer_request(command: &SiteExplorerCommands) -> Request {
    use SiteExplorerCommands::*;

    let (name, params) = match command {
        DomainRating { target, date } => (
            "domain-rating",
            target.params().set_opt("date", date.as_deref()),
        ),
        BacklinksStats { target, date } => (
            "backlinks-stats",
            target.params().set_opt("date", date.as_deref()),
        ),
        Backlinks { target, list } => ("backlinks", list.apply(target.params())),
        Refdomains { target, list } => ("refdomains", list.apply(target.params())),
        Anchors { target, list } => ("anchors", list.apply(target.params())),
        OrganicKeywords {
            target,
            list,
            country,
        } => (
            "organic-keywords",
            list.apply(target.params())
                .set_opt("country", country.as_deref()),
        ),
        TopPages {
            target,
            list,
            country,
        } => (
            "top-pages",
            list.apply(target.params())
                .set_opt("country", country.as_deref()),
        ),
        BrokenBacklinks { target, list } => ("broken-backlinks", list.apply(target.params())),
        LinkedDomains { target, list } => ("linked-domains", list.apply(target.params())),
        Metrics {
            target,
            select,
            country,
        } => (
            "metrics",
            target
                .params()
                .set_opt("select", select.as_deref())
                .set_opt("country", country.as_deref()),
        ),
        MetricsHistory {
            target,
            select,
            country,
            date_from,
            date_to,
        } => (
            "metrics-history",
            target
                .params()
                .set_opt("select", select.as_deref())
                .set_opt("country", country.as_deref())
                .set_opt("date_from", date_from.as_deref())
                .set_opt("date_to", date_to.as_deref()),
        ),
        PagesByTraffic {
            target,
            list,
            country,
        } => (
            "pages-by-traffic",
            list.apply(target.params())
                .set_opt("country", country.as_deref()),
        ),
        BestByLinks { target, list } => ("best-by-links", list.apply(target.params())),
    };

    Request::get(format!("/site-explorer/{}", name), params)
}

/// Handle site-explorer commands
pub async fn handle_site_explorer<C>(
    command: SiteExplorerCommands,
    settings: &Settings,
    cancel: C,
) -> Result<()>
where
    C: Future<Output = ()>,
{
    use SiteExplorerCommands::*;

    let request = site_explorer_request(&command);
    match command {
        DomainRating { .. } => {
            run_endpoint::<DomainRatingResponse, _>(settings, &request, cancel).await
        }
        BacklinksStats { .. } => {
            run_endpoint::<BacklinksStatsResponse, _>(settings, &request, cancel).await
        }
        Backlinks { .. } => run_endpoint::<BacklinksResponse, _>(settings, &request, cancel).await,
        Refdomains { .. } => {
            run_endpoint::<RefDomainsResponse, _>(settings, &request, cancel).await
        }
        Anchors { .. } => run_endpoint::<AnchorsResponse, _>(settings, &request, cancel).await,
        OrganicKeywords { .. } => {
            run_endpoint::<OrganicKeywordsResponse, _>(settings, &request, cancel).await
        }
        TopPages { .. } => run_endpoint::<TopPagesResponse, _>(settings, &request, cancel).await,
        BrokenBacklinks { .. } => {
            run_endpoint::<BrokenBacklinksResponse, _>(settings, &request, cancel).await
        }
        LinkedDomains { .. } => {
            run_endpoint::<LinkedDomainsResponse, _>(settings, &request, cancel).await
        }
        Metrics { .. } => run_endpoint::<MetricsResponse, _>(settings, &request, cancel).await,
        MetricsHistory { .. } => {
            run_endpoint::<MetricsHistoryResponse, _>(settings, &request, cancel).await
        }
        PagesByTraffic { .. } => {
            run_endpoint::<PagesByTrafficResponse, _>(settings, &request, cancel).await
        }
        BestByLinks { .. } => {
            run_endpoint::<BestByLinksResponse, _>(settings, &request, cancel).await
        }
    }
}

/// Handle config commands
pub async fn handle_config<C>(
    command: ConfigCommands,
    store: &ConfigStore,
    settings: &Settings,
    cancel: C,
) -> Result<()>
where
    C: Future<Output = ()>,
{
    match command {
        ConfigCommands::SetKey { api_key } => {
            let api_key = api_key.trim();
            if api_key.is_empty() {
                bail!("API key must not be empty");
            }

            store.save(&CliConfig {
                api_key: api_key.to_string(),
            })?;
            info!(path = %store.path().display(), "Stored API key");
            if !settings.quiet {
                println!(
                    "{}",
                    format_success(&format!("API key saved to {}", store.path().display()))
                );
            }
        }
        ConfigCommands::Show => match store.api_key()? {
            Some(key) => {
                println!("API key:     {}", mask_api_key(&key));
                println!("Config file: {}", store.path().display());
            }
            None => {
                println!("No API key configured.");
                println!("Set one with: ahrefs config set-key <api-key>");
            }
        },
        ConfigCommands::Validate => {
            let client = connect(settings)?;
            let request = Request::get(LIMITS_AND_USAGE_ENDPOINT, Params::new());
            if settings.dry_run {
                print_dry_run(&request, &request.url(client.base_url())?);
                return Ok(());
            }

            client
                .execute_until(&request, cancel)
                .await
                .context("API key validation failed")?;
            println!("{}", format_success("API key is valid"));
        }
    }

    Ok(())
}

/// Generate shell completion script
pub fn generate_completion(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

/// Confirmation printed instead of calling the API
pub fn dry_run_message(request: &Request, url: &Url) -> String {
    format!("Valid request. Would call: {} {}", request.method, url)
}

fn print_dry_run(request: &Request, url: &Url) {
    println!("{}", format_success(&dry_run_message(request, url)));
}

fn connect(settings: &Settings) -> Result<AhrefsClient> {
    AhrefsClient::new(settings.client_config()).map_err(|e| match e {
        RequestError::MissingApiKey => anyhow!(
            "{}. Use --api-key, set AHREFS_API_KEY, or run 'ahrefs config set-key <api-key>'",
            e
        ),
        other => other.into(),
    })
}

/// Call an endpoint and render its typed payload
async fn run_endpoint<T, C>(settings: &Settings, request: &Request, cancel: C) -> Result<()>
where
    T: DeserializeOwned + Shape,
    C: Future<Output = ()>,
{
    let client = connect(settings)?;
    let url = request.url(client.base_url())?;

    if settings.dry_run {
        print_dry_run(request, &url);
        return Ok(());
    }

    debug!("Requesting: {} {}", request.method, url);
    let response = client.execute_until(request, cancel).await?;
    let payload: T = response
        .json()
        .with_context(|| format!("Failed to decode response from {}", request.endpoint))?;

    let mut writer = Writer::create(settings.format, settings.output.as_deref())?;
    writer.write_success(&payload, Some(&response.meta))?;
    writer.finish()?;

    if let Some(path) = &settings.output {
        if !settings.quiet {
            eprintln!(
                "{}",
                format_success(&format!("Output written to {}", path.display()))
            );
        }
    }

    Ok(())
}
