//! Scale test: EPapers policy with 500 eligible principals, driven through
//! signed ledger transactions.

use std::time::Instant;

use rolegraph::{
    build_proof, search, sync_mirror, CredentialGraph, Expression, InMemoryLedger, LedgerClient,
    PrincipalKey, Resolution, Role, RoleName, TransactionBuilder,
};

const CAN_ACCESS: RoleName = RoleName::from_u16(0x000a);
const MEMBER: RoleName = RoleName::from_u16(0x000c);
const UNIVERSITY: RoleName = RoleName::from_u16(0x000d);
const STUDENT: RoleName = RoleName::from_u16(0x000e);

fn open(ledger: &mut InMemoryLedger, key: &PrincipalKey, name: RoleName) -> Role {
    let tx = TransactionBuilder::register_role(name)
        .sign(key)
        .expect("signing should succeed");
    ledger.register_role(&tx).expect("registration should succeed")
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

#[test]
fn stress_epapers_500_eligibles() {
    let n = 500;
    let k = 20;

    let epapers = PrincipalKey::new(Some("EPapers".into()));
    let eorg = PrincipalKey::new(Some("EOrg".into()));
    let state = PrincipalKey::new(Some("StateA".into()));
    let unis: Vec<PrincipalKey> = (0..k)
        .map(|i| PrincipalKey::new(Some(format!("Uni[{i}]"))))
        .collect();
    let eligibles: Vec<PrincipalKey> = (0..n)
        .map(|i| PrincipalKey::new(Some(format!("Principal[{i}]"))))
        .collect();

    let start = Instant::now();
    let mut ledger = InMemoryLedger::new();
    let can_access = open(&mut ledger, &epapers, CAN_ACCESS);
    let eorg_member = open(&mut ledger, &eorg, MEMBER);
    let eorg_student = open(&mut ledger, &eorg, STUDENT);
    let eorg_university = open(&mut ledger, &eorg, UNIVERSITY);
    let state_university = open(&mut ledger, &state, UNIVERSITY);
    let uni_students: Vec<Role> = unis.iter().map(|u| open(&mut ledger, u, STUDENT)).collect();

    for (i, p) in eligibles.iter().enumerate() {
        assert_on(&mut ledger, &eorg, &eorg_member, Expression::member(p.id()), 100);
        assert_on(&mut ledger, &unis[i % k], &uni_students[i % k], Expression::member(p.id()), 100);
    }
    for u in &unis {
        assert_on(&mut ledger, &state, &state_university, Expression::member(u.id()), 100);
    }
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
        Expression::intersection(eorg_student, eorg_member),
        50,
    );
    eprintln!("ledger built: {} events in {:?}", ledger.head(), start.elapsed());

    let mut mirror = CredentialGraph::new();
    let cursor = sync_mirror(&ledger, &mut mirror, 0).unwrap();
    assert_eq!(cursor, ledger.head());
    assert_eq!(mirror.len_assertions(), ledger.state().len_assertions());

    let start = Instant::now();
    let solutions = search(&mirror, &can_access);
    eprintln!("search found {} solutions in {:?}", solutions.len(), start.elapsed());
    assert_eq!(solutions.len(), n);

    let start = Instant::now();
    for sol in solutions.values() {
        assert_eq!(sol.weight.get(), 50);
        assert_eq!(sol.req_stack_size, 3);
        let proof = build_proof(sol);
        let resolution = ledger
            .execute_verify_proof(&proof)
            .expect("ledger should accept the proof");
        assert_eq!(
            resolution,
            Resolution::new(&can_access, sol.member.clone(), sol.weight)
        );
    }
    eprintln!("verified {n} proofs in {:?}", start.elapsed());
}
