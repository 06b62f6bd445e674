//! EPapers Access — register a policy, discover who may read the journal,
//! and verify each proof on the ledger.
//!
//! Run with:
//!   cargo run --example epapers_access -p rolegraph

use rolegraph::{
    build_proof, sync_mirror, CredentialGraph, DiscoveryEngine, Expression, InMemoryLedger,
    LedgerClient, PrincipalKey, Role, RoleName, SearchConfig, TransactionBuilder,
};

const CAN_ACCESS: RoleName = RoleName::from_u16(0x000a);
const MEMBER: RoleName = RoleName::from_u16(0x000c);
const UNIVERSITY: RoleName = RoleName::from_u16(0x000d);
const STUDENT: RoleName = RoleName::from_u16(0x000e);

fn open(ledger: &mut InMemoryLedger, key: &PrincipalKey, name: RoleName) -> Role {
    let tx = TransactionBuilder::register_role(name)
        .sign(key)
        .expect("signing should succeed");
    ledger.register_role(&tx).expect("role should register")
}

fn assert_on(
    ledger: &mut InMemoryLedger,
    key: &PrincipalKey,
    role: &Role,
    expression: Expression,
    weight: u8,
) {
    let tx = TransactionBuilder::register_assertion(role.clone(), expression, weight)
        .sign(key)
        .expect("signing should succeed");
    ledger
        .register_assertion(&tx)
        .expect("assertion should be accepted");
}

fn main() {
    // ── 1. Principals ───────────────────────────────────────────────────────
    //
    // Every principal owns an Ed25519 key; its id is derived from the
    // public key, so the ledger can check who signed each registration.
    let epapers = PrincipalKey::new(Some("EPapers".into()));
    let eorg = PrincipalKey::new(Some("EOrg".into()));
    let state = PrincipalKey::new(Some("StateA".into()));
    let uni = PrincipalKey::new(Some("Uni".into()));
    let alice = PrincipalKey::new(Some("Alice".into()));
    let bob = PrincipalKey::new(Some("Bob".into()));

    // ── 2. Policy ───────────────────────────────────────────────────────────
    //
    // EPapers.canAccess ← EOrg.student ∩ EOrg.member
    // EOrg.student      ← EOrg.university.student
    // EOrg.university   ← StateA.university
    let mut ledger = InMemoryLedger::new();
    let can_access = open(&mut ledger, &epapers, CAN_ACCESS);
    let eorg_member = open(&mut ledger, &eorg, MEMBER);
    let eorg_student = open(&mut ledger, &eorg, STUDENT);
    let eorg_university = open(&mut ledger, &eorg, UNIVERSITY);
    let state_university = open(&mut ledger, &state, UNIVERSITY);
    let uni_student = open(&mut ledger, &uni, STUDENT);

    assert_on(&mut ledger, &eorg, &eorg_member, Expression::member(alice.id()), 100);
    assert_on(&mut ledger, &uni, &uni_student, Expression::member(alice.id()), 100);
    assert_on(&mut ledger, &uni, &uni_student, Expression::member(bob.id()), 100);
    assert_on(&mut ledger, &state, &state_university, Expression::member(uni.id()), 100);
    assert_on(
        &mut ledger,
        &eorg,
        &eorg_university,
        Expression::inclusion(state_university),
        100,
    );
    assert_on(
        &mut ledger,
        &eorg,
        &eorg_student,
        Expression::linked(eorg.id(), UNIVERSITY, STUDENT),
        100,
    );
    assert_on(
        &mut ledger,
        &epapers,
        &can_access,
        Expression::intersection(eorg_student, eorg_member),
        50,
    );
    println!("Ledger confirmed {} events", ledger.head());
    println!();

    // ── 3. Discovery on a local mirror ──────────────────────────────────────
    //
    // The mirror is rebuilt from the ledger's events. Searching it costs
    // nothing on the ledger.
    let mut mirror = CredentialGraph::new();
    sync_mirror(&ledger, &mut mirror, 0).expect("mirror should sync");

    let engine = DiscoveryEngine::new(&mirror, SearchConfig::default());
    let (solutions, stats) = engine.search_with_stats(&can_access);
    println!("Who can access EPapers?");
    println!(
        "  {} solution(s), {} roles expanded, {} branches pruned",
        solutions.len(),
        stats.roles_expanded,
        stats.pruned()
    );

    // ── 4. Proofs, verified by the ledger ───────────────────────────────────
    //
    // Only Alice is both a student and a member. Her chain is linearized
    // into a proof that the ledger replays against its own state.
    for sol in solutions.values() {
        let proof = build_proof(sol);
        println!();
        println!("  Member:     {}", sol.member);
        println!("  Weight:     {}", sol.weight);
        println!("  Proof:      {} steps, stack {}", proof.len(), proof.req_stack_size);
        println!("  Flat:       {:?}", proof.to_flat());
        match ledger.execute_verify_proof(&proof) {
            Ok(resolution) => println!("  Verified:   {resolution}"),
            Err(e) => println!("  Rejected:   {e}"),
        }
    }
    assert!(solutions.contains_key(&alice.id()));
    assert!(!solutions.contains_key(&bob.id()));
}
