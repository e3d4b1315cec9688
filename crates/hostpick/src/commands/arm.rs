//! Arm command: send one authenticated management API request.

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use serde_json::Value;
use tracing::{debug, instrument};

use hostpick_core::arm::{ArmClient, AzureCliCredential, Method};
use hostpick_core::config::Config;

/// Arguments for the `arm` subcommand.
#[derive(Args, Debug)]
pub struct ArmArgs {
    /// HTTP method (GET, PUT, POST, PATCH, DELETE, ...)
    #[arg(value_name = "METHOD")]
    pub method: String,

    /// Full request URL, including `api-version`
    #[arg(value_name = "URL")]
    pub url: String,

    /// JSON request body
    #[arg(long, value_name = "JSON")]
    pub body: Option<String>,
}

fn parse_method(method: &str) -> anyhow::Result<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method `{method}`"))
}

fn checked_body(body: Option<String>) -> anyhow::Result<String> {
    let Some(body) = body else {
        return Ok(String::new());
    };
    serde_json::from_str::<Value>(&body).context("--body is not valid JSON")?;
    Ok(body)
}

/// Send the request and print the response status and body.
#[instrument(name = "cmd_arm", skip_all, fields(json_output))]
pub fn cmd_arm(args: ArmArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing arm command");

    let method = parse_method(&args.method)?;
    let body = checked_body(args.body)?;
    let credential = AzureCliCredential::with_binary(config.az_binary());
    let client = ArmClient::new(&credential).with_scope(config.arm_scope());

    let response = client
        .send(method.clone(), &args.url, body)
        .with_context(|| format!("{method} {} failed", args.url))?;
    let status = response.status();
    let text = response.text().context("failed to read response body")?;

    if global_json {
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        let report = serde_json::json!({
            "status": status.as_u16(),
            "body": body,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let status_line = status.to_string();
        if status.is_success() {
            println!("{}", status_line.green());
        } else {
            println!("{}", status_line.red());
        }
        if !text.is_empty() {
            println!("{text}");
        }
    }

    Ok(())
}
