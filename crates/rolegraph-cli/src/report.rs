//! Query reports: discover, prove, verify, render.

use serde::Serialize;

use rolegraph::{
    build_proof, CredentialGraph, DiscoveryEngine, EdgeKind, ExpressionId, LedgerClient,
    PrincipalId, Proof, Resolution, Role, SearchConfig, SearchStats, Solution,
};

use crate::labels::Labels;

#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub role: Role,
    pub stats: SearchStats,
    pub solutions: Vec<SolutionReport>,
    /// Assertions on the queried role that could not contribute members.
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolutionReport {
    pub member: PrincipalId,
    pub member_label: String,
    pub weight: u8,
    pub req_stack_size: usize,
    /// Rendered `to <- from` edges, top-down, structural linked edges left out.
    pub chain: Vec<String>,
    pub proof: Proof,
    pub outcome: Outcome,
}

/// What the ledger said about a solution's proof.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Verified { resolution: Resolution },
    Mismatch { resolution: Resolution },
    Rejected { reason: String },
}

impl QueryReport {
    /// Solutions whose proof did not verify to the expected tuple.
    pub fn failures(&self) -> usize {
        self.solutions
            .iter()
            .filter(|s| !matches!(s.outcome, Outcome::Verified { .. }))
            .count()
    }
}

/// Search `role` on `mirror` and verify every solution's proof on `ledger`.
pub fn run_query<L>(
    mirror: &CredentialGraph,
    ledger: &L,
    labels: &Labels,
    role: &Role,
    config: &SearchConfig,
) -> QueryReport
where
    L: LedgerClient + ?Sized,
{
    let engine = DiscoveryEngine::new(mirror, config.clone());
    let (solutions, stats) = engine.search_with_stats(role);

    let solutions = solutions
        .values()
        .map(|sol| {
            let proof = build_proof(sol);
            let expected = Resolution::new(role, sol.member.clone(), sol.weight);
            let outcome = match ledger.execute_verify_proof(&proof) {
                Ok(resolution) if resolution == expected => Outcome::Verified { resolution },
                Ok(resolution) => Outcome::Mismatch { resolution },
                Err(e) => Outcome::Rejected {
                    reason: e.to_string(),
                },
            };
            SolutionReport {
                member: sol.member.clone(),
                member_label: labels.principal(&sol.member),
                weight: sol.weight.get(),
                req_stack_size: sol.req_stack_size,
                chain: render_chain(mirror, labels, sol),
                proof,
                outcome,
            }
        })
        .collect();

    QueryReport {
        query: labels.role(role),
        role: role.clone(),
        notes: self_linked_notes(mirror, labels, role),
        stats,
        solutions,
    }
}

/// Linked inclusions whose first hop is the queried role itself. Discovery
/// prunes that hop as a cycle, so these assertions never add members.
fn self_linked_notes(mirror: &CredentialGraph, labels: &Labels, role: &Role) -> Vec<String> {
    mirror
        .assertions_of(role)
        .iter()
        .filter(|a| a.expression.linked_first_hop().as_ref() == Some(role))
        .map(|a| {
            format!(
                "{} <- {} re-enters {} and contributes no members",
                labels.role(role),
                labels.expression(&a.expression),
                labels.role(role)
            )
        })
        .collect()
}

fn render_id(mirror: &CredentialGraph, labels: &Labels, id: ExpressionId) -> String {
    mirror
        .expression(id)
        .map(|e| labels.expression(e))
        .unwrap_or_else(|| id.to_string())
}

fn render_chain(mirror: &CredentialGraph, labels: &Labels, solution: &Solution) -> Vec<String> {
    solution
        .path
        .iter()
        .filter(|edge| edge.kind != EdgeKind::Linked)
        .map(|edge| {
            format!(
                "{} <- {}",
                render_id(mirror, labels, edge.to),
                render_id(mirror, labels, edge.from)
            )
        })
        .collect()
}

/// Human-readable report on stdout.
pub fn print_query(report: &QueryReport, labels: &Labels, verbose: bool) {
    println!(
        "Query {}: {} solution(s)",
        report.query,
        report.solutions.len()
    );
    if verbose {
        let s = &report.stats;
        println!(
            "  Roles expanded: {}  Pruned: {} (unknown {}, cycles {}, budget {}, depth {}, intersection {})",
            s.roles_expanded,
            s.pruned(),
            s.unknown_roles,
            s.cycles_pruned,
            s.budget_pruned,
            s.depth_pruned,
            s.intersection_mismatches
        );
    }
    for note in &report.notes {
        println!("  Note: {note}");
    }

    for (idx, sol) in report.solutions.iter().enumerate() {
        println!();
        println!(
            "Solution #{}: member={}, weight={}",
            idx + 1,
            sol.member_label,
            sol.weight
        );
        println!("  Chain:");
        for line in &sol.chain {
            println!("    {line}");
        }
        println!("  Required stack size: {}", sol.req_stack_size);
        println!("  Proof: {} steps", sol.proof.len());
        if verbose {
            println!("    {:?}", sol.proof.to_flat());
        }
        match &sol.outcome {
            Outcome::Verified { resolution } => {
                println!("  Verification: {}", labels.resolution(resolution))
            }
            Outcome::Mismatch { resolution } => {
                println!("  Verification: MISMATCH {}", labels.resolution(resolution))
            }
            Outcome::Rejected { reason } => println!("  Verification: REJECTED ({reason})"),
        }
    }
}
