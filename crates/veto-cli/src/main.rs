//! urlveto CLI
//!
//! Development stand-in for the host networking layer: loads filter lists,
//! evaluates URLs against them, and reports list statistics.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Serialize;

use veto_compiler::{build_ruleset_from_reader, parse_line};
use veto_core::types::{MatchDecision, RequestContext, RequestType};
use veto_core::RuleSet;

#[derive(Parser)]
#[command(name = "veto")]
#[command(about = "urlveto filter list tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate URLs against one or more filter lists
    Check {
        /// Input filter list files
        #[arg(short, long, required = true)]
        list: Vec<String>,

        /// URLs to evaluate
        #[arg(short, long, required = true)]
        url: Vec<String>,

        /// Originating page domain
        #[arg(short, long)]
        domain: Option<String>,

        /// Resource type (script, image, stylesheet, xhr, ...)
        #[arg(short = 't', long)]
        request_type: Option<String>,

        /// Emit one JSON object per URL instead of text
        #[arg(long)]
        json: bool,
    },

    /// Parse filter lists and report statistics
    Stats {
        /// Input filter list files
        #[arg(short, long, required = true)]
        list: Vec<String>,
    },
}

#[derive(Serialize)]
struct CheckReport<'a> {
    url: &'a str,
    decision: &'static str,
    matched_rule: Option<&'a str>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            list,
            url,
            domain,
            request_type,
            json,
        } => cmd_check(&list, &url, domain.as_deref(), request_type.as_deref(), json),
        Commands::Stats { list } => cmd_stats(&list),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_ruleset(lists: &[String]) -> Result<RuleSet, String> {
    let mut combined = String::new();
    for path in lists {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read '{path}': {e}"))?;
        combined.push_str(&content);
        if !combined.ends_with('\n') {
            combined.push('\n');
        }
    }
    build_ruleset_from_reader(Cursor::new(combined))
        .map_err(|e| format!("Failed to build ruleset: {e}"))
}

fn cmd_check(
    lists: &[String],
    urls: &[String],
    domain: Option<&str>,
    request_type: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let request_type = match request_type {
        Some(name) => Some(
            RequestType::parse(name).ok_or_else(|| format!("Unknown request type '{name}'"))?,
        ),
        None => None,
    };

    let ruleset = load_ruleset(lists)?;

    for url in urls {
        let ctx = RequestContext {
            url,
            site_domain: domain,
            request_type,
        };
        let outcome = ruleset.match_request(&ctx);
        let decision = match outcome.decision {
            MatchDecision::Block => "block",
            MatchDecision::Allow => "allow",
        };

        if json {
            let report = CheckReport {
                url,
                decision,
                matched_rule: outcome.rule,
            };
            let line = serde_json::to_string(&report)
                .map_err(|e| format!("Failed to serialize report: {e}"))?;
            println!("{line}");
        } else {
            match outcome.rule {
                Some(rule) => println!("{decision:<5}  {url}  ({rule})"),
                None => println!("{decision:<5}  {url}"),
            }
        }
    }

    Ok(())
}

fn cmd_stats(lists: &[String]) -> Result<(), String> {
    let start = Instant::now();
    let mut total_lines = 0usize;
    let mut all_lines: Vec<String> = Vec::new();

    for path in lists {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read '{path}': {e}"))?;

        let line_count = content.lines().count();
        let rule_count = content.lines().filter_map(parse_line).count();
        total_lines += line_count;

        println!(
            "  {} - {} lines, {} rules",
            Path::new(path)
                .file_name()
                .unwrap_or_default()
                .to_string_lossy(),
            line_count,
            rule_count
        );

        all_lines.extend(content.lines().map(str::to_string));
    }

    let ruleset = veto_compiler::build_ruleset(all_lines.iter());
    let build_time = start.elapsed();

    println!("Built ruleset from {} filter lists", lists.len());
    println!("  Lines:      {total_lines}");
    println!("  Block:      {}", ruleset.block_rule_count());
    println!("  Exception:  {}", ruleset.exception_rule_count());
    println!("  Bucketed:   {}", ruleset.bucketed_rule_count());
    println!("  Time:       {:.1}ms", build_time.as_secs_f64() * 1000.0);

    Ok(())
}
