//! Sankey builder — per-brand pure-user sets, cross-brand membership, and
//! the three-column flow graph of user distribution across brands.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use opsdash_core::types::{TransactionRecord, ALL_BRANDS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyNode {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

/// Directed, acyclic, exactly three layers: the deduplicated total, one
/// node per brand, and the single/multiple-brand split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SankeyGraph {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
}

/// Build the brand-flow graph from depositing rows already scoped to a
/// currency and window.
pub fn build_brand_flow(rows: &[TransactionRecord]) -> SankeyGraph {
    // Pure-identity sets and GGR per brand; BTreeMap keeps the brand
    // columns in alphabetical order.
    let mut members_by_brand: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    let mut ggr_by_brand: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.deposit_cases > 0) {
        if row.brand.is_empty() || row.brand == ALL_BRANDS {
            continue;
        }
        members_by_brand
            .entry(row.brand.as_str())
            .or_default()
            .insert(row.unique_code.as_str());
        *ggr_by_brand.entry(row.brand.as_str()).or_insert(0.0) +=
            row.deposit_amount - row.withdraw_amount;
    }

    // Brands per identity, to split single- from multi-brand users.
    let mut brand_count: HashMap<&str, u32> = HashMap::new();
    for members in members_by_brand.values() {
        for code in members {
            *brand_count.entry(code).or_insert(0) += 1;
        }
    }

    let total_pure = brand_count.len();
    let single_total = brand_count.values().filter(|n| **n == 1).count();
    let multiple_total = brand_count.values().filter(|n| **n >= 2).count();

    let mut nodes = vec![SankeyNode {
        label: format!("All Brands ({total_pure} users)"),
        value: total_pure as f64,
    }];
    let mut links = Vec::new();

    let single_index = 1 + members_by_brand.len();
    let multiple_index = single_index + 1;

    for (i, (brand, members)) in members_by_brand.iter().enumerate() {
        let node_index = 1 + i;
        let ggr = ggr_by_brand.get(brand).copied().unwrap_or(0.0);
        nodes.push(SankeyNode {
            label: format!("{brand}: {} users, GGR {ggr:.2}", members.len()),
            value: members.len() as f64,
        });
        links.push(SankeyLink {
            source: 0,
            target: node_index,
            value: members.len() as f64,
        });

        let exclusive = members
            .iter()
            .filter(|code| brand_count.get(**code) == Some(&1))
            .count();
        let shared = members.len() - exclusive;
        if exclusive > 0 {
            links.push(SankeyLink {
                source: node_index,
                target: single_index,
                value: exclusive as f64,
            });
        }
        // One Multiple-Brand link per brand a shared user belongs to; the
        // inbound link total may exceed the node's distinct-user value.
        if shared > 0 {
            links.push(SankeyLink {
                source: node_index,
                target: multiple_index,
                value: shared as f64,
            });
        }
    }

    nodes.push(SankeyNode {
        label: "Single Brand".to_string(),
        value: single_total as f64,
    });
    nodes.push(SankeyNode {
        label: "Multiple Brand".to_string(),
        value: multiple_total as f64,
    });

    SankeyGraph { nodes, links }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    fn row(code: &str, brand: &str, deposit: f64, withdraw: f64) -> TransactionRecord {
        TransactionRecord {
            user_key: format!("{code}-{brand}"),
            unique_code: code.into(),
            currency: "MYR".into(),
            brand: brand.into(),
            date: d(1, 15),
            deposit_amount: deposit,
            deposit_cases: 1,
            withdraw_amount: withdraw,
            withdraw_cases: 0,
            bonus: 0.0,
            add_bonus: 0.0,
            deduct_bonus: 0.0,
            first_deposit_date: None,
        }
    }

    #[test]
    fn cross_brand_user_counted_once_in_total() {
        // user U deposits under both X and Y in the window
        let rows = vec![
            row("U", "X", 500.0, 100.0),
            row("U", "Y", 300.0, 0.0),
            row("V", "X", 200.0, 50.0),
        ];
        let graph = build_brand_flow(&rows);

        // Node 0 is the deduplicated union: U once, V once.
        assert_eq!(graph.nodes[0].value, 2.0);
        // Brand nodes follow alphabetically: X then Y.
        assert_eq!(graph.nodes[1].value, 2.0); // X: U, V
        assert_eq!(graph.nodes[2].value, 1.0); // Y: U
        assert!(graph.nodes[1].label.contains("550.00")); // X GGR = 400 + 150
        assert!(graph.nodes[2].label.contains("300.00"));

        let single_index = 3;
        let multiple_index = 4;
        assert_eq!(graph.nodes[single_index].value, 1.0); // V
        assert_eq!(graph.nodes[multiple_index].value, 1.0); // U

        // U appears in both X->Multiple and Y->Multiple links.
        let multi_links: Vec<&SankeyLink> = graph
            .links
            .iter()
            .filter(|l| l.target == multiple_index)
            .collect();
        assert_eq!(multi_links.len(), 2);
        assert!(multi_links.iter().any(|l| l.source == 1 && l.value == 1.0));
        assert!(multi_links.iter().any(|l| l.source == 2 && l.value == 1.0));

        // Fan-out preserved: inbound Multiple-Brand link total exceeds the
        // node's distinct-user value.
        let inbound: f64 = multi_links.iter().map(|l| l.value).sum();
        assert!(inbound > graph.nodes[multiple_index].value);
    }

    #[test]
    fn node_zero_equals_union_of_brand_sets() {
        let rows = vec![
            row("a", "X", 100.0, 0.0),
            row("a", "Y", 100.0, 0.0),
            row("b", "Y", 100.0, 0.0),
            row("c", "Z", 100.0, 0.0),
        ];
        let graph = build_brand_flow(&rows);
        assert_eq!(graph.nodes[0].value, 3.0);
        // The per-brand values overlap but never inflate node 0.
        let brand_sum: f64 = graph.nodes[1..=3].iter().map(|n| n.value).sum();
        assert!(brand_sum >= graph.nodes[0].value);
    }

    #[test]
    fn three_layers_with_root_links_per_brand() {
        let rows = vec![row("a", "X", 100.0, 0.0), row("b", "Y", 100.0, 0.0)];
        let graph = build_brand_flow(&rows);
        // total + 2 brands + single + multiple
        assert_eq!(graph.nodes.len(), 5);
        let root_links: Vec<&SankeyLink> =
            graph.links.iter().filter(|l| l.source == 0).collect();
        assert_eq!(root_links.len(), 2);
        // all-single population: no links into the Multiple-Brand node
        assert!(graph.links.iter().all(|l| l.target != 4));
        assert_eq!(graph.nodes[3].value, 2.0);
        assert_eq!(graph.nodes[4].value, 0.0);
    }

    #[test]
    fn empty_rows_build_an_empty_frame() {
        let graph = build_brand_flow(&[]);
        assert_eq!(graph.nodes[0].value, 0.0);
        assert!(graph.links.is_empty());
    }
}
