//! Command handlers for insightctl.

use anyhow::Result;
use owo_colors::OwoColorize;

use insight_core::{Config, InsightRequest, InsightResponse, InsightService, OllamaGateway};

/// Handle the analyze command.
pub async fn analyze(
    config: &Config,
    request: &InsightRequest,
    json: bool,
    strict: bool,
) -> Result<()> {
    let service = InsightService::new(config);
    let response = if strict {
        service.analyze(request).await?
    } else {
        service.analyze_or_fallback(request).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_insight(&response);
    }
    Ok(())
}

fn print_insight(response: &InsightResponse) {
    println!();
    println!("{}", response.topic.bold());
    println!();
    println!("{}", response.summary);

    println!();
    println!("{}", "[KEY CONCEPTS]".cyan());
    for concept in &response.key_concepts {
        println!("  * {concept}");
    }

    println!();
    println!("{}", "[SOURCES]".cyan());
    for rec in &response.recommendations {
        println!("  * {}", rec.title);
        println!("    {}", rec.url.dimmed());
    }
    println!();
}

/// Handle the status command.
pub async fn status(config: &Config) -> Result<()> {
    let gateway = OllamaGateway::new(config.ollama.clone());
    gateway.probe().await;
    let status = gateway.status();

    let kw = 10; // key width
    println!();
    print_kv("host", &status.base_url, kw);
    print_kv("model", &status.model, kw);
    print_kv(
        "service",
        &availability_label(status.service_available),
        kw,
    );
    print_kv("model ok", &availability_label(status.model_available), kw);
    println!();
    Ok(())
}

/// Handle the check command. Exit code carries the verdict.
pub async fn check(config: &Config) -> Result<()> {
    let gateway = OllamaGateway::new(config.ollama.clone());
    if gateway.probe().await {
        println!("{} model '{}' is ready", "[OK]".bright_green(), config.ollama.model);
        Ok(())
    } else {
        let status = gateway.status();
        if status.service_available {
            anyhow::bail!("model '{}' is not installed on {}", status.model, status.base_url)
        } else {
            anyhow::bail!("Ollama is not reachable at {}", status.base_url)
        }
    }
}

fn availability_label(available: bool) -> String {
    if available {
        "UP".bright_green().to_string()
    } else {
        "DOWN".bright_red().to_string()
    }
}

fn print_kv(key: &str, value: &str, width: usize) {
    println!("{key:width$} {value}");
}
