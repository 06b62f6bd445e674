//! Stress test: long simple-inclusion chains against the depth limit.

use rolegraph::{
    build_proof, verify_proof, CredentialGraph, DiscoveryEngine, Expression, PrincipalId, Role,
    RoleName, SearchConfig, Weight,
};

/// `R[0] ← R[1] ← ... ← R[n-1] ← M`, every link at weight 100 except one
/// at 75 in the middle.
fn build_chain(n: usize) -> (CredentialGraph, Role) {
    let mut graph = CredentialGraph::new();
    let roles: Vec<Role> = (0..n)
        .map(|i| Role::new(format!("node-{i}"), RoleName::from_u16(0x0100)))
        .collect();

    for i in 0..n - 1 {
        let weight = if i == n / 2 { 75 } else { 100 };
        graph
            .record_assertion(
                roles[i].clone(),
                Expression::inclusion(roles[i + 1].clone()),
                Weight::new(weight).unwrap(),
                roles[i].principal.clone(),
            )
            .unwrap();
    }
    graph
        .record_assertion(
            roles[n - 1].clone(),
            Expression::member("M"),
            Weight::MAX,
            roles[n - 1].principal.clone(),
        )
        .unwrap();

    (graph, roles[0].clone())
}

#[test]
fn stress_chain_at_default_depth_limit() {
    let depth = SearchConfig::default().max_depth;
    let (graph, root) = build_chain(depth);

    let engine = DiscoveryEngine::new(&graph, SearchConfig::default());
    let (solutions, stats) = engine.search_with_stats(&root);

    assert_eq!(solutions.len(), 1);
    let sol = &solutions[&PrincipalId::from("M")];
    assert_eq!(sol.weight.get(), 75);
    assert_eq!(sol.path.len(), depth);
    assert_eq!(sol.req_stack_size, 1);
    assert_eq!(stats.roles_expanded, depth);
    assert_eq!(stats.depth_pruned, 0);

    let proof = build_proof(sol);
    assert_eq!(proof.len(), depth);
    let resolution = verify_proof(&graph, &proof).expect("chain proof should verify");
    assert_eq!(resolution.member, PrincipalId::from("M"));
    assert_eq!(resolution.weight.get(), 75);
}

#[test]
fn stress_chain_one_past_depth_limit_is_pruned() {
    let depth = SearchConfig::default().max_depth;
    let (graph, root) = build_chain(depth + 1);

    let engine = DiscoveryEngine::new(&graph, SearchConfig::default());
    let (solutions, stats) = engine.search_with_stats(&root);

    assert!(solutions.is_empty());
    assert_eq!(stats.depth_pruned, 1);
    assert_eq!(stats.roles_expanded, depth);
}

#[test]
fn stress_chain_200_with_raised_limit() {
    let n = 200;
    let (graph, root) = build_chain(n);

    let config = SearchConfig {
        max_depth: n,
        ..SearchConfig::default()
    };
    let solutions = DiscoveryEngine::new(&graph, config).search(&root);

    let sol = &solutions[&PrincipalId::from("M")];
    assert_eq!(sol.path.len(), n);

    let proof = build_proof(sol);
    let resolution = verify_proof(&graph, &proof).expect("200-link proof should verify");
    assert_eq!(resolution.role(), root);
    assert_eq!(resolution.weight.get(), 75);
}

#[test]
fn stress_min_weight_prunes_weak_link() {
    let (graph, root) = build_chain(20);

    let config = SearchConfig {
        min_weight: Weight::new(80).unwrap(),
        ..SearchConfig::default()
    };
    let (solutions, stats) = DiscoveryEngine::new(&graph, config).search_with_stats(&root);

    assert!(solutions.is_empty());
    assert_eq!(stats.budget_pruned, 1);
}
