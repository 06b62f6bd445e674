//! RoleGraph CLI — `rolegraph` command.
//!
//! Runs trust policies against an in-process ledger, discovers credential
//! chains on the local mirror, and verifies their proofs.

mod labels;
mod policy;
mod report;
mod scenario;
mod session;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use rolegraph::time::micros_to_rfc3339;
use rolegraph::{
    verify_claim_with, verify_proof_with, EventStore, Expression, ExpressionId,
    LedgerEventKind, Proof, Resolution, SearchConfig, VerifierConfig, Weight,
};

use labels::Labels;
use policy::Policy;
use report::{print_query, run_query, QueryReport};
use session::Session;

// ── Directory helpers ─────────────────────────────────────────────────────────

fn rolegraph_home(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    if let Ok(path) = std::env::var("ROLEGRAPH_HOME") {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var("HOME").context("HOME not set")?;
    Ok(PathBuf::from(home).join(".rolegraph"))
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// RoleGraph CLI — run trust policies, discover credential chains, and
/// verify proofs against canonical ledger state.
#[derive(Parser, Debug)]
#[command(
    name = "rolegraph",
    about = "RoleGraph CLI",
    version,
    long_about = "rolegraph — RoleGraph CLI\n\nRun role-based trust policies, discover credential chains,\nand verify compact proofs with a bounded stack machine."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Event store directory (default: $ROLEGRAPH_HOME or ~/.rolegraph)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Prune chains weaker than this weight (1-100)
    #[arg(long, global = true, default_value = "1")]
    min_weight: u8,

    /// Maximum number of roles on one descent
    #[arg(long, global = true, default_value = "32")]
    max_depth: usize,

    /// Largest stack a proof may declare
    #[arg(long, global = true, default_value = "64")]
    max_stack: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a policy file and verify every query
    Run {
        /// Policy document (JSON)
        policy: PathBuf,

        /// Persist the confirmed events to the event store
        #[arg(long)]
        persist: bool,
    },

    /// Run a built-in scenario
    Scenario {
        /// Persist the confirmed events to the event store
        #[arg(long)]
        persist: bool,

        /// Write the generated policy to this path
        #[arg(long)]
        export: Option<PathBuf>,

        #[command(subcommand)]
        scenario: ScenarioCommands,
    },

    /// Discover members of a role from the event store
    Search {
        /// Role to query (e.g. EPapers.canAccess)
        role: String,

        /// Write one proof file per solution into this directory
        #[arg(long)]
        proof_dir: Option<PathBuf>,
    },

    /// Verify a proof file against the event store
    Verify {
        /// Proof file written by `rolegraph search --proof-dir`
        proof: PathBuf,

        /// Role the proof must establish (overrides the file's claim)
        #[arg(long, requires_all = ["member", "weight"])]
        claim: Option<String>,

        /// Member the proof must establish
        #[arg(long, requires = "claim")]
        member: Option<String>,

        /// Weight the proof must establish
        #[arg(long, requires = "claim")]
        weight: Option<u8>,
    },

    /// List confirmed ledger events from the event store
    Events {
        /// Show only the most recent events
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
enum ScenarioCommands {
    /// University e-journal access (intersection of linked roles)
    Epapers {
        /// Number of eligible principals
        eligibles: usize,

        /// Number of accredited universities
        universities: usize,
    },

    /// Web of trust where every newcomer trusts its predecessor
    WebOfTrust {
        /// Number of participants
        participants: usize,
    },
}

/// On-disk proof, optionally carrying the tuple it claims to establish.
#[derive(Debug, Serialize, Deserialize)]
struct ProofFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    claim: Option<Resolution>,
    proof: Proof,
}

struct Options {
    verbose: bool,
    json: bool,
    home: Option<PathBuf>,
    search: SearchConfig,
    verifier: VerifierConfig,
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = options(&cli).and_then(|opts| match cli.command {
        Commands::Run { policy, persist } => cmd_run(&policy, persist, &opts),
        Commands::Scenario {
            persist,
            export,
            scenario,
        } => cmd_scenario(scenario, persist, export.as_deref(), &opts),
        Commands::Search { role, proof_dir } => cmd_search(&role, proof_dir.as_deref(), &opts),
        Commands::Verify {
            proof,
            claim,
            member,
            weight,
        } => cmd_verify(&proof, claim.as_deref(), member.as_deref(), weight, &opts),
        Commands::Events { limit } => cmd_events(limit, &opts),
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn options(cli: &Cli) -> Result<Options> {
    Ok(Options {
        verbose: cli.verbose,
        json: cli.json,
        home: cli.home.clone(),
        search: SearchConfig {
            min_weight: Weight::new(cli.min_weight)?,
            max_depth: cli.max_depth,
        },
        verifier: VerifierConfig {
            max_stack_size: cli.max_stack,
            ..VerifierConfig::default()
        },
    })
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// `rolegraph run <policy.json>`
fn cmd_run(path: &Path, persist: bool, opts: &Options) -> Result<()> {
    let policy = Policy::load(path)?;
    run_policy(&policy, persist, opts)
}

/// `rolegraph scenario epapers|web-of-trust`
fn cmd_scenario(
    scenario: ScenarioCommands,
    persist: bool,
    export: Option<&Path>,
    opts: &Options,
) -> Result<()> {
    let policy = match scenario {
        ScenarioCommands::Epapers {
            eligibles,
            universities,
        } => scenario::epapers(eligibles, universities)?,
        ScenarioCommands::WebOfTrust { participants } => scenario::web_of_trust(participants)?,
    };
    if let Some(path) = export {
        policy.save(path)?;
        if !opts.json {
            println!("Policy written to {}", path.display());
        }
    }
    run_policy(&policy, persist, opts)
}

fn run_policy(policy: &Policy, persist: bool, opts: &Options) -> Result<()> {
    let mut session = Session::new(policy, opts.search.clone(), opts.verifier.clone())?;
    let reports = session.run(policy)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        if let Some(name) = &policy.name {
            println!("Policy: {name}");
        }
        println!(
            "Ledger: {} events, {} principals",
            session.ledger().head(),
            policy.principals.len()
        );
        for report in &reports {
            println!();
            print_query(report, session.labels(), opts.verbose);
        }
    }

    if persist {
        let home = rolegraph_home(opts.home.clone())?;
        let store = EventStore::new(&home)?;
        if store.head()? != 0 {
            bail!(
                "event store at {} already holds events; choose another --home",
                home.display()
            );
        }
        let written = store.sync_from(session.ledger())?;
        store.save_labels(session.labels())?;
        if !opts.json {
            println!();
            println!("Persisted {written} events to {}", home.display());
        }
    }

    check_reports(&reports)
}

fn check_reports(reports: &[QueryReport]) -> Result<()> {
    let failures: usize = reports.iter().map(QueryReport::failures).sum();
    if failures > 0 {
        bail!("{failures} proof(s) failed verification");
    }
    Ok(())
}

/// `rolegraph search <P.r>`
fn cmd_search(role: &str, proof_dir: Option<&Path>, opts: &Options) -> Result<()> {
    let home = rolegraph_home(opts.home.clone())?;
    let store = EventStore::new(&home)?;
    if store.head()? == 0 {
        bail!("event store at {} is empty", home.display());
    }
    let ledger = store.restore_ledger(opts.verifier.clone())?;
    let mirror = store.load_mirror()?;
    let labels: Labels = store.load_labels()?.unwrap_or_default();

    let role = labels.parse_role(role)?;
    let report = run_query(&mirror, &ledger, &labels, &role, &opts.search);

    if let Some(dir) = proof_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        for (idx, sol) in report.solutions.iter().enumerate() {
            let file = ProofFile {
                claim: Some(Resolution::new(
                    &role,
                    sol.member.clone(),
                    Weight::new(sol.weight)?,
                )),
                proof: sol.proof.clone(),
            };
            let path = dir.join(format!("proof-{}.json", idx + 1));
            std::fs::write(&path, serde_json::to_string_pretty(&file)?)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_query(&report, &labels, opts.verbose);
        if let Some(dir) = proof_dir {
            println!();
            println!(
                "Wrote {} proof file(s) to {}",
                report.solutions.len(),
                dir.display()
            );
        }
    }

    check_reports(std::slice::from_ref(&report))
}

/// `rolegraph verify <proof.json>`
fn cmd_verify(
    path: &Path,
    claim: Option<&str>,
    member: Option<&str>,
    weight: Option<u8>,
    opts: &Options,
) -> Result<()> {
    let home = rolegraph_home(opts.home.clone())?;
    let store = EventStore::new(&home)?;
    let ledger = store.restore_ledger(opts.verifier.clone())?;
    let labels: Labels = store.load_labels()?.unwrap_or_default();

    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file: ProofFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse proof file {}", path.display()))?;

    let expected = match (claim, member, weight) {
        (Some(role), Some(member), Some(weight)) => {
            let role = labels.parse_role(role)?;
            let member = labels
                .find_principal(member)
                .ok_or_else(|| anyhow!("unknown principal '{member}'"))?;
            Some(Resolution::new(&role, member, Weight::new(weight)?))
        }
        _ => file.claim,
    };

    let resolution = match &expected {
        Some(expected) => verify_claim_with(ledger.state(), &file.proof, expected, &opts.verifier),
        None => verify_proof_with(ledger.state(), &file.proof, &opts.verifier),
    }
    .map_err(|rejection| anyhow!("proof rejected: {rejection}"))?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        println!("Proof: {} steps", file.proof.len());
        println!("Required stack size: {}", file.proof.req_stack_size);
        println!("Verified: {}", labels.resolution(&resolution));
    }
    Ok(())
}

/// `rolegraph events`
fn cmd_events(limit: Option<usize>, opts: &Options) -> Result<()> {
    let home = rolegraph_home(opts.home.clone())?;
    let store = EventStore::new(&home)?;
    let labels: Labels = store.load_labels()?.unwrap_or_default();
    let events = store.load_all()?;

    let skip = limit.map_or(0, |n| events.len().saturating_sub(n));

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&events[skip..])?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No events in {}", home.display());
        return Ok(());
    }

    let mut interned: BTreeMap<ExpressionId, Expression> = BTreeMap::new();
    for (idx, event) in events.iter().enumerate() {
        if let LedgerEventKind::ExpressionInterned { id, expression } = &event.kind {
            interned.insert(*id, expression.clone());
        }
        if idx < skip {
            continue;
        }
        let detail = match &event.kind {
            LedgerEventKind::RoleRegistered { role } => labels.role(role),
            LedgerEventKind::ExpressionInterned { id, expression } => {
                format!("{id} = {}", labels.expression(expression))
            }
            LedgerEventKind::AssertionRecorded {
                role,
                expression_id,
                weight,
                issuer,
            } => {
                let body = interned
                    .get(expression_id)
                    .map(|e| labels.expression(e))
                    .unwrap_or_else(|| expression_id.to_string());
                let mut line = format!("{} <- {body} (weight {weight})", labels.role(role));
                if opts.verbose {
                    line.push_str(&format!(" by {}", labels.principal(issuer)));
                }
                line
            }
        };
        println!(
            "{:>6}  {}  {:<20} {detail}",
            event.seq,
            micros_to_rfc3339(event.recorded_at),
            event.kind.as_tag()
        );
    }
    Ok(())
}
