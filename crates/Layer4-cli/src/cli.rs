//! Command handlers

use anyhow::{anyhow, Context};
use refetch_core::{
    DedupResolver, FetchEngine, HttpQuery, Query, Requirement, ReqwestTransport, Resolved,
    TracingMonitor,
};
use refetch_foundation::{FetchConfig, MemoryCacheStore};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Options of `refetch get`
#[derive(Debug, Clone)]
pub struct GetOptions {
    pub urls: Vec<String>,
    pub service: String,
    pub headers: Vec<String>,
    pub environment: Option<String>,
    pub raw: bool,
}

/// Split a `Name: value` header argument
pub fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("Header must look like 'Name: value', got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Header name is empty in '{}'", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Build one query per URL from config and command line options
pub fn build_queries(config: &FetchConfig, options: &GetOptions) -> anyhow::Result<Vec<HttpQuery>> {
    let headers = options
        .headers
        .iter()
        .map(|raw| parse_header(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;

    options
        .urls
        .iter()
        .map(|url| {
            let mut query = HttpQuery::from_config(options.service.as_str(), url, config)?;
            if let Some(env) = &options.environment {
                query.set_environment_name(env)?;
            }
            for (name, value) in &headers {
                query = query.header(name.clone(), value.clone());
            }
            Ok(query)
        })
        .collect()
}

/// `refetch get`
pub async fn run_get(config: &FetchConfig, options: GetOptions) -> anyhow::Result<()> {
    if options.urls.is_empty() {
        return Err(anyhow!("At least one URL is required"));
    }

    let queries = build_queries(config, &options)?;
    let engine = FetchEngine::new(
        Arc::new(ReqwestTransport::from_config(config)),
        Arc::new(MemoryCacheStore::new()),
    )
    .with_monitoring(Arc::new(TracingMonitor));

    if options.raw {
        let boxed: Vec<Box<dyn Query>> = queries
            .into_iter()
            .map(|query| Box::new(query) as Box<dyn Query>)
            .collect();
        let payloads = engine.fetch_raw(boxed).await?;
        for (url, payload) in options.urls.iter().zip(payloads) {
            match payload {
                Some(payload) => {
                    println!("# {} ({})", url, payload.status);
                    println!("{}", payload.body);
                }
                None => println!("# {} (no data)", url),
            }
        }
        return Ok(());
    }

    let requirements: Vec<Requirement> = queries.into_iter().map(Requirement::from).collect();
    debug!("Resolving {} requirement(s)", requirements.len());

    let resolver = DedupResolver::new(Arc::new(engine));
    let results = resolver.resolve(requirements).await?;

    for (url, resolved) in options.urls.iter().zip(results) {
        println!("# {}", url);
        println!("{}", render(resolved)?);
    }
    Ok(())
}

fn render(resolved: Resolved) -> anyhow::Result<String> {
    let value = match resolved {
        Resolved::One(value) => value.unwrap_or(Value::Null),
        Resolved::Many(values) => {
            Value::Array(values.into_iter().map(|v| v.unwrap_or(Value::Null)).collect())
        }
    };
    serde_json::to_string_pretty(&value).context("Failed to render result")
}

/// `refetch config`
pub fn show_config(config: &FetchConfig) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    println!("{}", rendered);
    Ok(())
}
