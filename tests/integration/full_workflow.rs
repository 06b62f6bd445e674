//! Integration test: full workflow from signed registration to ledger-side
//! proof verification.
//!
//! Exercises the public API end to end: keys, transactions, the ledger,
//! mirror sync, discovery, proof building, verification and persistence.

use rolegraph::{
    build_proof, sync_mirror, verify_claim, verify_proof, CredentialGraph, DiscoveryEngine,
    EventStore, Expression, InMemoryLedger, LedgerClient, LedgerEventKind, PrincipalKey, Proof,
    ProofRejection, Resolution, Role, RoleGraphError, RoleName, SearchConfig, TransactionBuilder,
    VerifierConfig,
};

const CAN_ACCESS: RoleName = RoleName::from_u16(0x000a);
const MEMBER: RoleName = RoleName::from_u16(0x000c);
const UNIVERSITY: RoleName = RoleName::from_u16(0x000d);
const STUDENT: RoleName = RoleName::from_u16(0x000e);

fn open(ledger: &mut InMemoryLedger, key: &PrincipalKey, name: RoleName) -> Role {
    let tx = TransactionBuilder::register_role(name).sign(key).unwrap();
    ledger.register_role(&tx).unwrap()
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
        .unwrap();
    ledger.register_assertion(&tx).unwrap();
}

#[test]
fn test_full_workflow() {
    // ── Step 1: Keys ──────────────────────────────────────────────────────────
    let epapers = PrincipalKey::new(Some("EPapers".into()));
    let eorg = PrincipalKey::new(Some("EOrg".into()));
    let state = PrincipalKey::new(Some("StateA".into()));
    let uni = PrincipalKey::new(Some("Uni".into()));
    let alice = PrincipalKey::new(Some("Alice".into()));
    let bob = PrincipalKey::new(Some("Bob".into()));

    // ── Step 2: Register roles ────────────────────────────────────────────────
    let mut ledger = InMemoryLedger::new();
    let can_access = open(&mut ledger, &epapers, CAN_ACCESS);
    let eorg_member = open(&mut ledger, &eorg, MEMBER);
    let eorg_student = open(&mut ledger, &eorg, STUDENT);
    let eorg_university = open(&mut ledger, &eorg, UNIVERSITY);
    let state_university = open(&mut ledger, &state, UNIVERSITY);
    let uni_student = open(&mut ledger, &uni, STUDENT);
    assert_eq!(can_access.principal, epapers.id());

    // ── Step 3: Assertions ────────────────────────────────────────────────────
    // Alice is a student and a member; Bob is only a student.
    assert_on(&mut ledger, &eorg, &eorg_member, Expression::member(alice.id()), 100);
    assert_on(&mut ledger, &uni, &uni_student, Expression::member(alice.id()), 90);
    assert_on(&mut ledger, &uni, &uni_student, Expression::member(bob.id()), 90);
    assert_on(&mut ledger, &state, &state_university, Expression::member(uni.id()), 100);
    assert_on(
        &mut ledger,
        &eorg,
        &eorg_university,
        Expression::inclusion(state_university.clone()),
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
        Expression::intersection(eorg_student.clone(), eorg_member.clone()),
        50,
    );

    let assertions = ledger.read_assertions(&uni_student).unwrap();
    assert_eq!(assertions.len(), 2);
    assert!(assertions.iter().all(|a| a.issuer == uni.id()));

    // ── Step 4: Mirror ────────────────────────────────────────────────────────
    let mut mirror = CredentialGraph::new();
    let cursor = sync_mirror(&ledger, &mut mirror, 0).unwrap();
    assert_eq!(cursor, ledger.head());
    assert_eq!(mirror.len_expressions(), ledger.state().len_expressions());

    // ── Step 5: Discovery ─────────────────────────────────────────────────────
    let engine = DiscoveryEngine::new(&mirror, SearchConfig::default());
    let (solutions, stats) = engine.search_with_stats(&can_access);
    assert_eq!(solutions.len(), 1, "only Alice holds both roles");
    assert_eq!(stats.intersection_mismatches, 1, "Bob is a student but not a member");

    let sol = &solutions[&alice.id()];
    assert_eq!(sol.weight.get(), 50);
    assert_eq!(sol.req_stack_size, 3);

    let students = engine.search(&eorg_student);
    assert_eq!(students.len(), 2);
    assert_eq!(students[&bob.id()].weight.get(), 90);

    // ── Step 6: Proof ─────────────────────────────────────────────────────────
    let proof = build_proof(sol);
    assert_eq!(proof.len(), 8);

    let flat = proof.to_flat();
    let decoded = Proof::from_flat(&flat, proof.req_stack_size).unwrap();
    assert_eq!(decoded, proof);

    // ── Step 7: Verification ──────────────────────────────────────────────────
    let expected = Resolution::new(&can_access, alice.id(), sol.weight);
    assert_eq!(verify_proof(&mirror, &decoded).unwrap(), expected);
    assert_eq!(ledger.execute_verify_proof(&decoded).unwrap(), expected);
    assert!(verify_claim(ledger.state(), &decoded, &expected).is_ok());

    let bob_claim = Resolution::new(&can_access, bob.id(), sol.weight);
    assert!(matches!(
        verify_claim(ledger.state(), &decoded, &bob_claim),
        Err(ProofRejection::ResultMismatch { .. })
    ));

    // ── Step 8: Persist and restore ───────────────────────────────────────────
    let dir = tempfile::tempdir().unwrap();
    let store = EventStore::new(dir.path()).unwrap();
    assert_eq!(store.sync_from(&ledger).unwrap() as u64, ledger.head());

    let restored = store.restore_ledger(VerifierConfig::default()).unwrap();
    assert_eq!(restored.head(), ledger.head());
    assert_eq!(restored.execute_verify_proof(&decoded).unwrap(), expected);

    let reloaded = store.load_mirror().unwrap();
    assert_eq!(
        DiscoveryEngine::new(&reloaded, SearchConfig::default()).search(&can_access),
        solutions
    );
}

#[test]
fn test_ledger_rejects_forged_transactions() {
    let mut ledger = InMemoryLedger::new();
    let eorg = PrincipalKey::new(Some("EOrg".into()));
    let mallory = PrincipalKey::new(Some("Mallory".into()));
    let member = open(&mut ledger, &eorg, MEMBER);
    let head = ledger.head();

    // Mallory signs an assertion into EOrg's namespace.
    let forged = Expression::member(mallory.id());
    let tx = TransactionBuilder::register_assertion(member.clone(), forged.clone(), 100)
        .sign(&mallory)
        .unwrap();
    assert!(matches!(
        ledger.register_assertion(&tx),
        Err(RoleGraphError::Unauthorized { .. })
    ));

    // A valid transaction with its payload swapped after signing.
    let mut tx =
        TransactionBuilder::register_assertion(member.clone(), Expression::member("Carol"), 100)
            .sign(&eorg)
            .unwrap();
    let other = TransactionBuilder::register_assertion(member.clone(), forged, 100)
        .sign(&eorg)
        .unwrap();
    tx.payload = other.payload;
    assert!(ledger.register_assertion(&tx).is_err());

    // Nothing was confirmed.
    assert_eq!(ledger.head(), head);
    assert!(ledger.read_assertions(&member).unwrap().is_empty());
}

#[test]
fn test_events_describe_every_change() {
    let mut ledger = InMemoryLedger::new();
    let eorg = PrincipalKey::new(Some("EOrg".into()));
    let member = open(&mut ledger, &eorg, MEMBER);
    assert_on(&mut ledger, &eorg, &member, Expression::member("Alice"), 100);
    // Re-using an interned expression emits no new ExpressionInterned.
    let friends = open(&mut ledger, &eorg, RoleName::from_u16(0x0042));
    assert_on(&mut ledger, &eorg, &friends, Expression::member("Alice"), 60);

    let tags: Vec<&str> = ledger
        .events_since(0)
        .unwrap()
        .iter()
        .map(|e| e.kind.as_tag())
        .collect();
    assert_eq!(
        tags,
        vec![
            "expression_interned",
            "role_registered",
            "expression_interned",
            "assertion_recorded",
            "expression_interned",
            "role_registered",
            "assertion_recorded",
        ]
    );

    let later = ledger.events_since(4).unwrap();
    assert_eq!(later.len(), 3);
    assert_eq!(later[0].seq, 5);
    assert!(matches!(
        &later[2].kind,
        LedgerEventKind::AssertionRecorded { weight, .. } if weight.get() == 60
    ));
}
