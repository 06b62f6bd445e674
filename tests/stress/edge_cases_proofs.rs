//! Edge cases: tampered, truncated and replayed proofs are all rejected.

use rolegraph::{
    build_proof, search, verify_claim, verify_proof, verify_proof_with, CredentialGraph,
    Expression, ExpressionId, PrincipalId, Proof, ProofRejection, ProofStep, Resolution, Role,
    RoleName, VerifierConfig, Weight,
};

const CAN_ACCESS: RoleName = RoleName::from_u16(0x000a);
const MEMBER: RoleName = RoleName::from_u16(0x000c);
const UNIVERSITY: RoleName = RoleName::from_u16(0x000d);
const STUDENT: RoleName = RoleName::from_u16(0x000e);

fn add(graph: &mut CredentialGraph, role: &Role, expression: Expression, weight: u8) {
    graph
        .record_assertion(
            role.clone(),
            expression,
            Weight::new(weight).unwrap(),
            role.principal.clone(),
        )
        .unwrap();
}

/// Two universities, S1 at Uni1 and S2 at Uni2, both EOrg members.
fn epapers() -> (CredentialGraph, Role) {
    epapers_without_member(None)
}

fn epapers_without_member(skip: Option<&str>) -> (CredentialGraph, Role) {
    let mut graph = CredentialGraph::new();
    let can_access = Role::new("EPapers", CAN_ACCESS);
    let eorg_member = Role::new("EOrg", MEMBER);
    let eorg_student = Role::new("EOrg", STUDENT);
    let eorg_university = Role::new("EOrg", UNIVERSITY);
    let state_university = Role::new("StateA", UNIVERSITY);

    for (student, uni) in [("S1", "Uni1"), ("S2", "Uni2")] {
        if skip != Some(student) {
            add(&mut graph, &eorg_member, Expression::member(student), 100);
        }
        add(&mut graph, &Role::new(uni, STUDENT), Expression::member(student), 90);
        add(&mut graph, &state_university, Expression::member(uni), 100);
    }
    add(&mut graph, &eorg_university, Expression::inclusion(state_university), 100);
    add(&mut graph, &eorg_student, Expression::linked("EOrg", UNIVERSITY, STUDENT), 100);
    add(&mut graph, &can_access, Expression::intersection(eorg_student, eorg_member), 50);
    (graph, can_access)
}

fn proof_for(graph: &CredentialGraph, role: &Role, member: &str) -> Proof {
    let solutions = search(graph, role);
    build_proof(&solutions[&PrincipalId::from(member)])
}

#[test]
fn edge_every_single_id_substitution_is_contained() {
    let (graph, can_access) = epapers();
    let proof = proof_for(&graph, &can_access, "S1");
    let original = verify_proof(&graph, &proof).unwrap();
    let max_id = graph.len_expressions() as u64 + 2;

    let mut rejected = 0;
    for index in 0..proof.len() {
        for id in 1..=max_id {
            for swap_to in [true, false] {
                let mut tampered = proof.clone();
                let step = &mut tampered.steps[index];
                let slot = if swap_to { &mut step.to } else { &mut step.from };
                if slot.0 == id {
                    continue;
                }
                *slot = ExpressionId(id);
                match verify_proof(&graph, &tampered) {
                    Ok(resolution) => assert_eq!(
                        resolution, original,
                        "substitution at step {index} proved something else"
                    ),
                    Err(_) => rejected += 1,
                }
            }
        }
    }
    assert!(rejected > 0);
}

#[test]
fn edge_swapped_adjacent_steps_rejected() {
    let (graph, can_access) = epapers();
    let proof = proof_for(&graph, &can_access, "S2");
    for index in 0..proof.len() - 1 {
        let mut tampered = proof.clone();
        if tampered.steps[index] == tampered.steps[index + 1] {
            continue;
        }
        tampered.steps.swap(index, index + 1);
        assert!(
            verify_proof(&graph, &tampered).is_err(),
            "swap at {index} should be rejected"
        );
    }
}

#[test]
fn edge_truncated_proofs_rejected() {
    let (graph, can_access) = epapers();
    let proof = proof_for(&graph, &can_access, "S1");
    let claim = verify_proof(&graph, &proof).unwrap();
    for len in 1..proof.len() {
        let truncated = Proof {
            steps: proof.steps[..len].to_vec(),
            req_stack_size: proof.req_stack_size,
        };
        // A prefix may prove a sub-role, never the full claim.
        assert!(
            verify_claim(&graph, &truncated, &claim).is_err(),
            "prefix of {len} steps should not prove {claim}"
        );
    }
}

#[test]
fn edge_concatenated_proofs_leave_two_entries() {
    let (graph, can_access) = epapers();
    let p1 = proof_for(&graph, &can_access, "S1");
    let p2 = proof_for(&graph, &can_access, "S2");
    let joined = Proof {
        steps: p1.steps.iter().chain(p2.steps.iter()).copied().collect(),
        req_stack_size: p1.req_stack_size + p2.req_stack_size,
    };
    assert!(matches!(
        verify_proof(&graph, &joined),
        Err(ProofRejection::UnresolvedStack(2))
    ));
}

#[test]
fn edge_claim_for_other_member_rejected() {
    let (graph, can_access) = epapers();
    let proof = proof_for(&graph, &can_access, "S1");
    let claim = Resolution::new(&can_access, "S2", Weight::new(50).unwrap());
    assert!(matches!(
        verify_claim(&graph, &proof, &claim),
        Err(ProofRejection::ResultMismatch { .. })
    ));
}

#[test]
fn edge_claim_with_inflated_weight_rejected() {
    let (graph, can_access) = epapers();
    let proof = proof_for(&graph, &can_access, "S1");
    let claim = Resolution::new(&can_access, "S1", Weight::MAX);
    assert!(verify_claim(&graph, &proof, &claim).is_err());
    let honest = Resolution::new(&can_access, "S1", Weight::new(50).unwrap());
    assert_eq!(verify_claim(&graph, &proof, &honest).unwrap(), honest);
}

#[test]
fn edge_proof_against_state_missing_an_assertion() {
    let (graph, can_access) = epapers();
    let proof = proof_for(&graph, &can_access, "S1");

    // Same policy, but S1 is not an EOrg member.
    let (partial, _) = epapers_without_member(Some("S1"));
    assert!(!search(&partial, &can_access).contains_key(&PrincipalId::from("S1")));
    assert!(verify_proof(&partial, &proof).is_err());
}

#[test]
fn edge_stack_limits() {
    let (graph, can_access) = epapers();
    let proof = proof_for(&graph, &can_access, "S1");
    assert_eq!(proof.req_stack_size, 3);

    let understated = Proof {
        req_stack_size: 2,
        ..proof.clone()
    };
    assert!(matches!(
        verify_proof(&graph, &understated),
        Err(ProofRejection::StackOverflow { limit: 2, .. })
    ));

    let tight = VerifierConfig {
        max_stack_size: 2,
        ..VerifierConfig::default()
    };
    assert!(matches!(
        verify_proof_with(&graph, &proof, &tight),
        Err(ProofRejection::StackSizeTooLarge {
            declared: 3,
            limit: 2
        })
    ));

    let few_steps = VerifierConfig {
        max_steps: proof.len() - 1,
        ..VerifierConfig::default()
    };
    assert!(matches!(
        verify_proof_with(&graph, &proof, &few_steps),
        Err(ProofRejection::TooManySteps { .. })
    ));
}

#[test]
fn edge_flat_encoding() {
    let (graph, can_access) = epapers();
    let proof = proof_for(&graph, &can_access, "S2");
    let mut flat = proof.to_flat();
    assert_eq!(flat.len(), proof.len() * 2);

    let decoded = Proof::from_flat(&flat, proof.req_stack_size).unwrap();
    assert_eq!(verify_proof(&graph, &decoded).unwrap().member, PrincipalId::from("S2"));

    flat.pop();
    assert!(matches!(
        Proof::from_flat(&flat, proof.req_stack_size),
        Err(ProofRejection::OddLength(_))
    ));
}

#[test]
fn edge_lone_step_shapes() {
    let (graph, can_access) = epapers();
    let access_id = graph.role_id(&can_access).unwrap();
    let member_leaf = graph.id_of(&Expression::member("S1")).unwrap();

    // A member leaf can never be a target.
    let reversed = Proof {
        steps: vec![ProofStep {
            to: member_leaf,
            from: access_id,
        }],
        req_stack_size: 1,
    };
    assert!(matches!(
        verify_proof(&graph, &reversed),
        Err(ProofRejection::UnexpectedStep { .. })
    ));

    // No stored assertion EPapers.canAccess ← S1.
    let shortcut = Proof {
        steps: vec![ProofStep {
            to: access_id,
            from: member_leaf,
        }],
        req_stack_size: 1,
    };
    assert!(matches!(
        verify_proof(&graph, &shortcut),
        Err(ProofRejection::MissingCredential { .. })
    ));
}
