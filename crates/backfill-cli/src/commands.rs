use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::{json, Value};

use backfill_cache::BackfillConfig;
use backfill_expand::{
    DispatchConfig, ExpansionPlan, Expander, FieldStatus, InMemoryTransport, JobKind, Neutralizer,
};
use backfill_schema::{ReferenceMap, Schema};
use backfill_types::Document;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Refmap(args) => cmd_refmap(args, &format),
        Command::Neutralize(args) => cmd_neutralize(args, &format),
        Command::Plan(args) => cmd_plan(args, &format),
        Command::Expand(args) => cmd_expand(args, &format),
    }
}

fn cmd_refmap(args: RefmapArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let map = load_refmap(&args.schema)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&map)?),
        OutputFormat::Text => {
            if map.is_empty() {
                println!("No references declared.");
            }
            for (path, reference) in map.iter() {
                let arity = if reference.is_array { "[]" } else { "" };
                println!("  {} → {}{}", path.to_string().bold(), reference.target.cyan(), arity);
            }
        }
    }
    Ok(())
}

fn cmd_neutralize(args: NeutralizeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let clauses = Neutralizer::neutralize(&args.expression);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&clauses)?),
        OutputFormat::Text => {
            for clause in &clauses {
                println!("  {}", clause.yellow());
            }
        }
    }
    Ok(())
}

fn cmd_plan(args: PlanArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let map = load_refmap(&args.schema)?;
    let plan = ExpansionPlan::from_expression(&map, &args.expression);
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plan_json(&plan, &args.fetch_op))?)
        }
        OutputFormat::Text => {
            if plan.is_empty() {
                println!("Nothing to expand.");
            }
            for job in plan.jobs() {
                let delegate = job.delegate_expression();
                println!(
                    "  {} [{}] {}{}",
                    job.path.to_string().bold(),
                    kind_label(job.kind()),
                    job.reference.operation(&args.fetch_op).cyan(),
                    if delegate.is_empty() { String::new() } else { format!(" expand={}", delegate.yellow()) },
                );
            }
        }
    }
    Ok(())
}

fn cmd_expand(args: ExpandArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let map = load_refmap(&args.schema)?;
    let document = match read_json(&args.document)? {
        Value::Object(doc) => doc,
        _ => bail!("{} does not hold a JSON object", args.document.display()),
    };
    let transport = Arc::new(InMemoryTransport::new());
    let served = load_fixtures(&transport, &read_json(&args.fixtures)?)?;
    tracing::debug!(served, "fixtures loaded");

    let dispatch = match &args.config {
        Some(path) => load_dispatch(path)?,
        None => DispatchConfig::default(),
    };

    let expander = Expander::new(Arc::new(map), transport, dispatch);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (expanded, report) =
        runtime.block_on(expander.expand_with_report(document, &args.expression));

    match format {
        OutputFormat::Json => {
            let out = if args.report {
                json!({"document": expanded, "report": report})
            } else {
                Value::Object(expanded)
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(&expanded)?);
            if args.report {
                for (path, status) in report.iter() {
                    let status = match status {
                        FieldStatus::Resolved => "resolved".green(),
                        FieldStatus::Skipped(reason) => format!("skipped: {reason}").dimmed(),
                        FieldStatus::Failed(reason) => format!("failed: {reason}").red(),
                    };
                    println!("  {} {}", path.to_string().bold(), status);
                }
            }
        }
    }
    Ok(())
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_refmap(path: &Path) -> anyhow::Result<ReferenceMap> {
    let schema = Schema::from_json(&read_json(path)?)
        .with_context(|| format!("invalid schema in {}", path.display()))?;
    Ok(ReferenceMap::build(&schema)?)
}

fn load_dispatch(path: &Path) -> anyhow::Result<DispatchConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(BackfillConfig::from_toml_str(&text)?.dispatch)
}

/// Serve every `{resource: {id: document}}` entry. Returns the document count.
fn load_fixtures(transport: &InMemoryTransport, fixtures: &Value) -> anyhow::Result<usize> {
    let Value::Object(resources) = fixtures else {
        bail!("fixtures must be a JSON object keyed by resource");
    };
    let mut served = 0;
    for (resource, table) in resources {
        let Value::Object(documents) = table else {
            bail!("fixtures for {resource} must be an object keyed by id");
        };
        for (id, document) in documents {
            transport.insert(resource, id, document.clone());
            served += 1;
        }
    }
    Ok(served)
}

fn plan_json(plan: &ExpansionPlan, fetch_op: &str) -> Value {
    let jobs: Document = plan
        .jobs()
        .map(|job| {
            (
                job.path.to_string(),
                json!({
                    "kind": kind_label(job.kind()),
                    "operation": job.reference.operation(fetch_op),
                    "expand": job.delegate_expression(),
                }),
            )
        })
        .collect();
    Value::Object(jobs)
}

fn kind_label(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Scalar => "scalar",
        JobKind::Array => "array",
        JobKind::WildcardArray => "wildcard",
    }
}
