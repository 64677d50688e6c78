// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Mustekala CLI - Proxy-Aware HTTP Client
//!
//! Example usage and demonstration of the mustekala library.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use mustekala::{
    keys, BypassMatcher, Envelope, EnvOsProxy, HttpClient, HttpMethod, MemoryConfigSource,
    ProxyAgentResolver, RequestOptions, ResponseData, SystemResolver,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mustekala=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "get" => {
            if args.len() < 3 {
                eprintln!("Usage: mustekala get <url> [OPTIONS]");
                return ExitCode::from(1);
            }
            run_request(HttpMethod::Get, &args[2], &args[3..]).await
        }
        "post" => {
            if args.len() < 3 {
                eprintln!("Usage: mustekala post <url> [--json <value> | --body <raw>] [OPTIONS]");
                return ExitCode::from(1);
            }
            run_request(HttpMethod::Post, &args[2], &args[3..]).await
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("mustekala {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"Mustekala - Proxy-Aware Outbound HTTP Client

USAGE:
    mustekala <COMMAND> <url> [OPTIONS]

COMMANDS:
    get <url>       Execute a GET request
    post <url>      Execute a POST request
    help            Show this help message
    version         Show version information

OPTIONS:
    --json <value>       POST body as JSON
    --body <raw>         POST body as raw text
    --proxy <host:port>  Use this proxy instead of the OS settings
    --bypass <list>      Semicolon-delimited bypass patterns
    --follow             Follow redirects (off by default)

EXAMPLES:
    mustekala get https://example.com/api/status
    mustekala get https://10.1.2.3/health --proxy proxy.local:8080 --bypass "10.0.0.0/8"
    mustekala post https://example.com/api/token --json '{{"challenge":"abc"}}'

For more information, see: https://github.com/bountyyfi/mustekala
"#
    );
}

async fn run_request(method: HttpMethod, url: &str, flags: &[String]) -> ExitCode {
    let config = Arc::new(MemoryConfigSource::new());
    let mut options = RequestOptions::new();
    let mut envelope = None;

    let mut iter = flags.iter();
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--json" => {
                let Some(value) = iter.next() else {
                    eprintln!("--json requires a value");
                    return ExitCode::from(1);
                };
                match serde_json::from_str(value) {
                    Ok(json) => envelope = Some(Envelope::Json(json)),
                    Err(e) => {
                        eprintln!("Invalid JSON body: {}", e);
                        return ExitCode::from(1);
                    }
                }
            }
            "--body" => {
                let Some(value) = iter.next() else {
                    eprintln!("--body requires a value");
                    return ExitCode::from(1);
                };
                envelope = Some(Envelope::raw(value.clone()));
            }
            "--proxy" => {
                let Some(value) = iter.next() else {
                    eprintln!("--proxy requires a host:port value");
                    return ExitCode::from(1);
                };
                config.set(keys::USE_OS_SETTINGS, false);
                match value.rsplit_once(':') {
                    Some((host, port)) if port.parse::<u16>().is_ok() => {
                        config.set(keys::PROXY_ADDRESS, host);
                        config.set(keys::PROXY_PORT, port.parse::<i64>().unwrap());
                    }
                    _ => {
                        eprintln!("Invalid proxy, expected host:port: {}", value);
                        return ExitCode::from(1);
                    }
                }
            }
            "--bypass" => {
                let Some(value) = iter.next() else {
                    eprintln!("--bypass requires a value");
                    return ExitCode::from(1);
                };
                config.set(keys::PROXY_IGNORE_LIST, value.as_str());
            }
            "--follow" => {
                options = options.follow_redirect(true);
            }
            other => {
                eprintln!("Unknown option: {}", other);
                return ExitCode::from(1);
            }
        }
    }

    let resolver = match SystemResolver::from_system() {
        Ok(r) => Arc::new(r),
        Err(e) => {
            eprintln!("Failed to initialize DNS resolver: {}", e);
            return ExitCode::from(1);
        }
    };

    let client = HttpClient::new(ProxyAgentResolver::new(
        config,
        Arc::new(EnvOsProxy),
        BypassMatcher::new(resolver),
    ));

    match client.execute(method, url, options, envelope).await {
        Ok(response) => {
            println!("Status: {}", response.status);
            for (name, value) in response.headers.iter() {
                println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
            }
            println!();
            match &response.data {
                ResponseData::Json(value) => {
                    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default())
                }
                ResponseData::Text(text) => println!("{}", text),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let normalized = e.normalized();
            eprintln!("Request failed: {}", normalized.message);
            if let Some(response) = normalized.response {
                if let Some(status) = response.status_code {
                    eprintln!("Status: {}", status);
                }
                if let Some(body) = response.body {
                    eprintln!("{}", body);
                }
            }
            ExitCode::from(1)
        }
    }
}
