//! Connector network and firing-time propagation
//!
//! The detonator network is a directed forest: each hole has at most one
//! predecessor (`Connector::from`) and an edge delay in milliseconds.
//! Holes without a predecessor are roots and fire at 0 ms. The network is
//! user-edited and may be malformed — cycles and references to nonexistent
//! holes must degrade to warnings, never abort or hang.
//!
//! The adjacency structure (identity → index map plus children lists) is
//! built exactly once; propagation is an iterative BFS from all roots with
//! a visited set, so traversal terminates on any input.

use std::collections::{HashMap, VecDeque};

use crate::error::EngineIssue;
use crate::hole::{Hole, HoleRef};

/// Firing times for one hole snapshot
#[derive(Debug, Clone)]
pub struct TimingResult {
    /// Absolute firing time per hole, parallel to the input order;
    /// `None` marks an unresolved hole (cycle or broken chain)
    pub firing_times_ms: Vec<Option<f64>>,
    /// Indices of unresolved holes
    pub unresolved: Vec<usize>,
}

impl TimingResult {
    /// Whether every hole received a firing time
    #[inline]
    pub fn fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Index-based adjacency over a hole snapshot
///
/// Built once per computation so propagation never re-scans string
/// identities per step.
struct ConnectorNetwork {
    /// Children of each hole: (child index, edge delay ms)
    children: Vec<Vec<(usize, f64)>>,
    /// Holes that start the traversal (no parent, or dangling parent)
    roots: Vec<usize>,
}

impl ConnectorNetwork {
    fn build(holes: &[Hole], issues: &mut Vec<EngineIssue>) -> Self {
        let index: HashMap<HoleRef, usize> = holes
            .iter()
            .enumerate()
            .map(|(i, h)| (h.href(), i))
            .collect();

        let mut children = vec![Vec::new(); holes.len()];
        let mut roots = Vec::new();

        for (i, hole) in holes.iter().enumerate() {
            let Some(connector) = &hole.connector else {
                roots.push(i);
                continue;
            };

            let Some(&parent) = index.get(&connector.from) else {
                // Documented default policy: a dangling reference does not
                // suppress the hole, it becomes a root
                issues.push(EngineIssue::DanglingReference {
                    hole: hole.href(),
                    target: connector.from.clone(),
                });
                roots.push(i);
                continue;
            };

            let delay = if connector.delay_ms < 0.0 {
                issues.push(EngineIssue::NegativeDelay {
                    hole: hole.href(),
                    delay_ms: connector.delay_ms,
                });
                0.0
            } else {
                connector.delay_ms
            };
            children[parent].push((i, delay));
        }

        Self { children, roots }
    }
}

/// Compute absolute firing times for a hole snapshot
///
/// All roots start at 0 ms simultaneously; each child fires at its parent's
/// time plus the edge delay. Holes never reached from a root — members of a
/// cycle, or chains feeding into one — are reported unresolved with an
/// [`EngineIssue::UnresolvedConnector`] each, alongside the otherwise
/// successful partial result.
///
/// A resolved time of `Some(0.0)` (true initiation point) is always
/// distinguishable from `None` (unresolved).
///
/// # Example
///
/// ```
/// use blast_geometry::{propagate_firing_times, Hole, HoleRef};
/// use glam::DVec3;
///
/// let mk = |id: &str| Hole::new("Shot1", id, DVec3::ZERO, DVec3::ZERO, DVec3::ZERO);
/// let holes = vec![
///     mk("H1"),
///     mk("H2").with_connector(HoleRef::new("Shot1", "H1"), 25.0),
///     mk("H3").with_connector(HoleRef::new("Shot1", "H2"), 25.0),
/// ];
///
/// let (timing, issues) = propagate_firing_times(&holes);
/// assert_eq!(timing.firing_times_ms, vec![Some(0.0), Some(25.0), Some(50.0)]);
/// assert!(issues.is_empty());
/// ```
pub fn propagate_firing_times(holes: &[Hole]) -> (TimingResult, Vec<EngineIssue>) {
    let mut issues = Vec::new();
    let network = ConnectorNetwork::build(holes, &mut issues);

    let mut firing_times_ms: Vec<Option<f64>> = vec![None; holes.len()];
    let mut visited = vec![false; holes.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();

    for &root in &network.roots {
        firing_times_ms[root] = Some(0.0);
        visited[root] = true;
        queue.push_back(root);
    }

    while let Some(current) = queue.pop_front() {
        let base = firing_times_ms[current].unwrap_or(0.0);
        for &(child, delay) in &network.children[current] {
            // The forest shape makes a revisit impossible from a second
            // parent, but the visited set also bounds malformed input
            if visited[child] {
                continue;
            }
            visited[child] = true;
            firing_times_ms[child] = Some(base + delay);
            queue.push_back(child);
        }
    }

    let unresolved: Vec<usize> = (0..holes.len()).filter(|&i| !visited[i]).collect();
    for &i in &unresolved {
        issues.push(EngineIssue::UnresolvedConnector {
            hole: holes[i].href(),
        });
    }

    (
        TimingResult {
            firing_times_ms,
            unresolved,
        },
        issues,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn hole(id: &str) -> Hole {
        Hole::new("Shot1", id, DVec3::ZERO, DVec3::ZERO, DVec3::ZERO)
    }

    fn connected(id: &str, from: &str, delay: f64) -> Hole {
        hole(id).with_connector(HoleRef::new("Shot1", from), delay)
    }

    #[test]
    fn test_no_connectors_all_roots() {
        let holes: Vec<Hole> = (0..5).map(|i| hole(&format!("H{}", i))).collect();
        let (timing, issues) = propagate_firing_times(&holes);

        assert!(issues.is_empty());
        assert!(timing.fully_resolved());
        assert!(timing.firing_times_ms.iter().all(|t| *t == Some(0.0)));
    }

    #[test]
    fn test_chain_accumulates_delay() {
        let mut holes = vec![hole("H0")];
        for i in 1..6 {
            holes.push(connected(&format!("H{}", i), &format!("H{}", i - 1), 25.0));
        }
        let (timing, issues) = propagate_firing_times(&holes);

        assert!(issues.is_empty());
        for (k, t) in timing.firing_times_ms.iter().enumerate() {
            assert_eq!(*t, Some(25.0 * k as f64));
        }
    }

    #[test]
    fn test_branching_from_one_parent() {
        let holes = vec![
            hole("root"),
            connected("left", "root", 17.0),
            connected("right", "root", 42.0),
            connected("leaf", "left", 8.0),
        ];
        let (timing, issues) = propagate_firing_times(&holes);

        assert!(issues.is_empty());
        assert_eq!(timing.firing_times_ms[1], Some(17.0));
        assert_eq!(timing.firing_times_ms[2], Some(42.0));
        assert_eq!(timing.firing_times_ms[3], Some(25.0));
    }

    #[test]
    fn test_cycle_terminates_and_reports_unresolved() {
        let holes = vec![
            connected("A", "C", 10.0),
            connected("B", "A", 10.0),
            connected("C", "B", 10.0),
        ];
        let (timing, issues) = propagate_firing_times(&holes);

        assert_eq!(timing.unresolved, vec![0, 1, 2]);
        assert!(timing.firing_times_ms.iter().all(Option::is_none));
        assert_eq!(
            issues
                .iter()
                .filter(|i| matches!(i, EngineIssue::UnresolvedConnector { .. }))
                .count(),
            3
        );
    }

    #[test]
    fn test_self_reference_is_unresolved() {
        let holes = vec![hole("root"), connected("loop", "loop", 5.0)];
        let (timing, _) = propagate_firing_times(&holes);

        assert_eq!(timing.firing_times_ms[0], Some(0.0));
        assert_eq!(timing.firing_times_ms[1], None);
        assert_eq!(timing.unresolved, vec![1]);
    }

    #[test]
    fn test_chain_into_cycle_is_unresolved() {
        // D hangs off a cycle; nothing in the component reaches a root
        let holes = vec![
            connected("A", "B", 10.0),
            connected("B", "A", 10.0),
            connected("D", "A", 10.0),
            hole("lonely"),
        ];
        let (timing, _) = propagate_firing_times(&holes);

        assert_eq!(timing.firing_times_ms[3], Some(0.0));
        assert_eq!(timing.unresolved, vec![0, 1, 2]);
    }

    #[test]
    fn test_dangling_reference_becomes_root() {
        let holes = vec![
            hole("H1"),
            connected("H2", "missing", 30.0),
            connected("H3", "H2", 12.0),
        ];
        let (timing, issues) = propagate_firing_times(&holes);

        // H2 fires at 0 despite its bad connector, and its subtree follows
        assert_eq!(timing.firing_times_ms[1], Some(0.0));
        assert_eq!(timing.firing_times_ms[2], Some(12.0));
        assert!(timing.fully_resolved());
        assert_eq!(
            issues,
            vec![EngineIssue::DanglingReference {
                hole: HoleRef::new("Shot1", "H2"),
                target: HoleRef::new("Shot1", "missing"),
            }]
        );
    }

    #[test]
    fn test_cross_entity_connector() {
        let mut other = Hole::new("Shot2", "H1", DVec3::ZERO, DVec3::ZERO, DVec3::ZERO);
        other.connector = Some(crate::hole::Connector {
            from: HoleRef::new("Shot1", "H1"),
            delay_ms: 100.0,
        });
        let holes = vec![hole("H1"), other];
        let (timing, issues) = propagate_firing_times(&holes);

        assert!(issues.is_empty());
        assert_eq!(timing.firing_times_ms[1], Some(100.0));
    }

    #[test]
    fn test_negative_delay_clamped() {
        let holes = vec![hole("H1"), connected("H2", "H1", -20.0)];
        let (timing, issues) = propagate_firing_times(&holes);

        assert_eq!(timing.firing_times_ms[1], Some(0.0));
        assert!(matches!(issues[0], EngineIssue::NegativeDelay { .. }));
    }

    #[test]
    fn test_firing_times_non_decreasing_along_paths() {
        let holes = vec![
            hole("H0"),
            connected("H1", "H0", 0.0),
            connected("H2", "H1", 25.0),
            connected("H3", "H2", 0.0),
        ];
        let (timing, _) = propagate_firing_times(&holes);
        let times: Vec<f64> = timing.firing_times_ms.iter().map(|t| t.unwrap()).collect();
        for pair in times.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }
}
