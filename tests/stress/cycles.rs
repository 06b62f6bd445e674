//! Stress test: cyclic policies terminate and still find every real member.

use rolegraph::{
    build_proof, search, verify_proof, CredentialGraph, DiscoveryEngine, Expression, PrincipalId,
    Role, RoleName, SearchConfig, Weight,
};

const FRIEND: RoleName = RoleName::from_u16(0x0200);

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

fn roles(n: usize) -> Vec<Role> {
    (0..n)
        .map(|i| Role::new(format!("peer-{i}"), FRIEND))
        .collect()
}

#[test]
fn stress_ring_of_100_inclusions() {
    let n = 100;
    let ring = roles(n);
    let mut graph = CredentialGraph::new();
    for i in 0..n {
        add(&mut graph, &ring[i], Expression::inclusion(ring[(i + 1) % n].clone()), 100);
    }
    add(&mut graph, &ring[n - 1], Expression::member("M"), 90);

    let config = SearchConfig {
        max_depth: n,
        ..SearchConfig::default()
    };
    let (solutions, stats) = DiscoveryEngine::new(&graph, config).search_with_stats(&ring[0]);

    assert_eq!(solutions.len(), 1);
    let sol = &solutions[&PrincipalId::from("M")];
    assert_eq!(sol.weight.get(), 90);
    assert_eq!(sol.path.len(), n);
    // Only the edge from the last peer back to the first closes the ring.
    assert_eq!(stats.cycles_pruned, 1);
    assert_eq!(stats.roles_expanded, n);

    verify_proof(&graph, &build_proof(sol)).expect("ring proof should verify");
}

#[test]
fn stress_complete_inclusion_graph() {
    let n = 6;
    let peers = roles(n);
    let mut graph = CredentialGraph::new();
    for i in 0..n {
        add(&mut graph, &peers[i], Expression::member(format!("m-{i}")), 100);
        for j in 0..n {
            if i != j {
                add(&mut graph, &peers[i], Expression::inclusion(peers[j].clone()), 80);
            }
        }
    }

    for peer in &peers {
        let solutions = search(&graph, peer);
        assert_eq!(solutions.len(), n, "{peer} should reach every member");
        for (member, sol) in &solutions {
            if member.as_str() == format!("m-{}", &peer.principal.as_str()["peer-".len()..]) {
                // Own member: direct, full weight.
                assert_eq!(sol.weight.get(), 100);
                assert_eq!(sol.path.len(), 1);
            } else {
                // Everyone else: one hop through their peer.
                assert_eq!(sol.weight.get(), 80);
                assert_eq!(sol.path.len(), 2);
            }
            let resolution = verify_proof(&graph, &build_proof(sol)).unwrap();
            assert_eq!(&resolution.member, member);
        }
    }
}

#[test]
fn stress_self_linked_web_of_trust_terminates() {
    // P.trust ← P.trust.trust on every peer, plus a direct ring of trust.
    let n = 10;
    let peers = roles(n);
    let mut graph = CredentialGraph::new();
    for i in 0..n {
        let principal = peers[i].principal.clone();
        add(&mut graph, &peers[i], Expression::linked(principal, FRIEND, FRIEND), 80);
        add(&mut graph, &peers[i], Expression::member(peers[(i + 1) % n].principal.clone()), 100);
    }

    let engine = DiscoveryEngine::new(&graph, SearchConfig::default());
    for (i, peer) in peers.iter().enumerate() {
        let (solutions, stats) = engine.search_with_stats(peer);
        // The linked hop re-enters the queried role, so only direct trust remains.
        assert_eq!(solutions.len(), 1);
        assert!(solutions.contains_key(&peers[(i + 1) % n].principal));
        assert!(stats.cycles_pruned >= 1);
    }
}

#[test]
fn stress_cycle_through_intersection() {
    // A ← A ∩ B, A ← M1, B ← M1, B ← M2
    let a = Role::new("A", FRIEND);
    let b = Role::new("B", FRIEND);
    let mut graph = CredentialGraph::new();
    add(&mut graph, &a, Expression::intersection(a.clone(), b.clone()), 100);
    add(&mut graph, &a, Expression::member("M1"), 70);
    add(&mut graph, &b, Expression::member("M1"), 100);
    add(&mut graph, &b, Expression::member("M2"), 100);

    let (solutions, stats) =
        DiscoveryEngine::new(&graph, SearchConfig::default()).search_with_stats(&a);

    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[&PrincipalId::from("M1")].weight.get(), 70);
    assert_eq!(stats.cycles_pruned, 1);
}
