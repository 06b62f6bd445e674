//! Built-in scenarios.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

use rolegraph::RoleName;

use crate::policy::{BodySpec, Policy};

fn member(label: impl Into<String>) -> BodySpec {
    BodySpec::SimpleMember {
        member: label.into(),
    }
}

/// EPapers access policy.
///
/// `EPapers.canAccess ← EOrg.student ∩ EOrg.member`, where EOrg students
/// are the students of every university StateA accredits. Eligible
/// principals are spread round-robin over the universities and are all
/// EOrg members, so every one of them ends up with access at weight 50.
pub fn epapers(n_eligibles: usize, n_universities: usize) -> Result<Policy> {
    if n_universities == 0 {
        bail!("at least one university is needed");
    }

    let eligibles: Vec<String> = (1..=n_eligibles).map(|i| format!("Principal[{i}]")).collect();
    let universities: Vec<String> = (1..=n_universities).map(|i| format!("Uni[{i}]")).collect();

    let mut principals = vec!["EPapers".to_string(), "EOrg".into(), "StateA".into()];
    principals.extend(eligibles.iter().cloned());
    principals.extend(universities.iter().cloned());

    let role_names = BTreeMap::from([
        ("canAccess".to_string(), RoleName::from_u16(0x000a)),
        ("member".to_string(), RoleName::from_u16(0x000c)),
        ("university".to_string(), RoleName::from_u16(0x000d)),
        ("student".to_string(), RoleName::from_u16(0x000e)),
    ]);

    let mut policy = Policy {
        name: Some(format!("epapers-{n_eligibles}-{n_universities}")),
        principals,
        role_names,
        steps: Vec::new(),
    };

    policy.register("EPapers.canAccess");
    policy.register("EOrg.student");
    policy.register("EOrg.member");
    policy.register("EOrg.university");
    policy.register("StateA.university");
    for uni in &universities {
        policy.register(format!("{uni}.student"));
    }

    for (idx, principal) in eligibles.iter().enumerate() {
        policy.assert("EOrg.member", member(principal), 100);
        let uni = &universities[idx % universities.len()];
        policy.assert(format!("{uni}.student"), member(principal), 100);
    }
    for uni in &universities {
        policy.assert("StateA.university", member(uni), 100);
    }
    policy.assert(
        "EOrg.university",
        BodySpec::SimpleInclusion {
            target: "StateA.university".into(),
        },
        100,
    );
    policy.assert(
        "EOrg.student",
        BodySpec::LinkedInclusion {
            principal: "EOrg".into(),
            name_a: "university".into(),
            name_b: "student".into(),
        },
        100,
    );
    policy.assert(
        "EPapers.canAccess",
        BodySpec::IntersectionInclusion {
            a: "EOrg.student".into(),
            b: "EOrg.member".into(),
        },
        50,
    );

    policy.query("EPapers.canAccess");
    Ok(policy)
}

/// Web of trust with active participation.
///
/// Each newcomer `P[i]` trusts whoever its trusted principals trust (80),
/// trusts its predecessor directly, and is trusted back by it. `P[i].trust`
/// is queried after every addition.
pub fn web_of_trust(n: usize) -> Result<Policy> {
    if n < 2 {
        bail!("at least 2 participants are needed");
    }

    let participants: Vec<String> = (1..=n).map(|i| format!("Principal[{i}]")).collect();
    let mut policy = Policy {
        name: Some(format!("web-of-trust-{n}")),
        principals: participants.clone(),
        role_names: BTreeMap::from([("trust".to_string(), RoleName::from_u16(0x200a))]),
        steps: Vec::new(),
    };

    policy.register(format!("{}.trust", participants[0]));
    for i in 1..n {
        let current = &participants[i];
        let previous = &participants[i - 1];
        let trust = format!("{current}.trust");

        policy.register(trust.clone());
        policy.assert(
            trust.clone(),
            BodySpec::LinkedInclusion {
                principal: current.clone(),
                name_a: "trust".into(),
                name_b: "trust".into(),
            },
            80,
        );
        policy.assert(trust.clone(), member(previous), 100);
        policy.assert(format!("{previous}.trust"), member(current), 100);
        policy.query(trust);
    }
    Ok(policy)
}
