//! Raw request command implementation.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use jwtpipe::{HeaderName, HeaderValue, Method, Payload, RequestOptions};

use crate::commands::failure;
use crate::context::AppContext;
use crate::output;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Path relative to the API URL (e.g. /auth/profile/)
    pub path: String,

    /// JSON request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Extra header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(HeaderName, HeaderValue)>,

    /// Send without credentials and without renewal
    #[arg(long)]
    pub anonymous: bool,
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{}'", raw));
    }
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| format!("invalid header name '{}': {}", name, e))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|e| format!("invalid value for header '{}': {}", name, e))?;
    Ok((name, value))
}

const METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

fn parse_method(raw: &str) -> Result<Method> {
    let method = Method::from_bytes(raw.to_ascii_uppercase().as_bytes())?;
    if !METHODS.contains(&method) {
        anyhow::bail!("unsupported HTTP method '{}'", method);
    }
    Ok(method)
}

pub async fn run(args: RequestArgs, ctx: &AppContext) -> Result<()> {
    let method = parse_method(&args.method).context("Invalid method")?;

    let body = match &args.data {
        Some(data) => {
            let value: Value = serde_json::from_str(data).context("--data is not valid JSON")?;
            Some(serde_json::to_vec(&value)?)
        }
        None => None,
    };

    let session = ctx.session()?;
    let pipeline = session.pipeline();

    let result = if args.anonymous {
        pipeline.request_anonymous(method, &args.path, body).await
    } else {
        let options = args
            .headers
            .into_iter()
            .fold(RequestOptions::new(), |options, (name, value)| {
                options.header(name, value)
            });
        pipeline.request(method, &args.path, body, options).await
    };
    let payload = result.map_err(|e| failure(e, "Request failed"))?;

    match payload {
        Payload::Json(value) => output::json_pretty(&value)?,
        Payload::Text(text) => println!("{}", text),
        Payload::Empty => output::progress("(no content)"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_parsing() {
        let (name, value) = parse_header("X-Request-Id: 42").unwrap();
        assert_eq!(name, "x-request-id");
        assert_eq!(value, "42");

        let (name, value) = parse_header("Accept:application/json").unwrap();
        assert_eq!(name, "accept");
        assert_eq!(value, "application/json");

        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
        assert!(parse_header("Bad Name: x").is_err());
        assert!(parse_header("X-Bad: line\nbreak").is_err());
    }

    #[test]
    fn method_parsing() {
        assert_eq!(parse_method("put").unwrap(), Method::PUT);
        assert_eq!(parse_method("DELETE").unwrap(), Method::DELETE);
        assert!(parse_method("TRACE").is_err());
        assert!(parse_method("not a method").is_err());
    }
}
