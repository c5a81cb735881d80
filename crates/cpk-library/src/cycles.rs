//! Circular dependency detection over the profile reference graph.
//!
//! A context reference of the form `profiles/<name>.yaml` is an ownership
//! edge between profiles. DFS with recursion-stack coloring finds back
//! edges; each distinct minimal cycle is reported exactly once regardless
//! of which node the traversal entered it from.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use cpk_core::{Diagnostic, DiagnosticKind};

use crate::profile::ProfileConfig;

/// A discovered profile participating in the reference graph.
#[derive(Debug, Clone)]
pub struct ProfileNode {
    pub path: PathBuf,
    pub profile: ProfileConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

/// Detect reference cycles among profiles, one diagnostic per minimal
/// cycle, members named in traversal order.
pub fn detect_cycles(profiles: &BTreeMap<String, ProfileNode>) -> Vec<Diagnostic> {
    let names: Vec<&String> = profiles.keys().collect();
    let index_of: BTreeMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect();

    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); names.len()];
    for (from, name) in names.iter().enumerate() {
        for context in &profiles[*name].profile.contexts {
            if let Some(target) = profile_reference(context)
                && let Some(&to) = index_of.get(target)
            {
                edges[from].push(to);
            }
        }
    }

    let mut walk = Walk {
        edges: &edges,
        colors: vec![Color::White; names.len()],
        stack: Vec::new(),
        cycles: Vec::new(),
        seen: BTreeSet::new(),
    };
    // BTreeMap order makes traversal (and thus reported member order)
    // deterministic.
    for start in 0..names.len() {
        if walk.colors[start] == Color::White {
            walk.visit(start);
        }
    }

    walk.cycles
        .into_iter()
        .map(|cycle| {
            let members: Vec<&str> = cycle.iter().map(|&i| names[i].as_str()).collect();
            let first = names[cycle[0]];
            Diagnostic::error(
                DiagnosticKind::CircularDependency,
                &profiles[first].path,
                format!(
                    "circular profile dependency: {} -> {}",
                    members.join(" -> "),
                    members[0]
                ),
            )
        })
        .collect()
}

struct Walk<'a> {
    edges: &'a [Vec<usize>],
    colors: Vec<Color>,
    stack: Vec<usize>,
    cycles: Vec<Vec<usize>>,
    seen: BTreeSet<Vec<usize>>,
}

impl Walk<'_> {
    fn visit(&mut self, node: usize) {
        self.colors[node] = Color::Grey;
        self.stack.push(node);

        for &next in &self.edges[node] {
            match self.colors[next] {
                Color::White => self.visit(next),
                Color::Grey => self.record_cycle(next),
                Color::Black => {}
            }
        }

        self.stack.pop();
        self.colors[node] = Color::Black;
    }

    /// A back edge to `entry` closes a cycle consisting of the stack
    /// suffix starting at `entry`.
    fn record_cycle(&mut self, entry: usize) {
        let Some(position) = self.stack.iter().position(|&n| n == entry) else {
            return;
        };
        let cycle: Vec<usize> = self.stack[position..].to_vec();
        if self.seen.insert(canonical(&cycle)) {
            self.cycles.push(cycle);
        }
    }
}

/// Rotate a cycle so its smallest member comes first, giving the same
/// signature for the same cycle found from any start node.
fn canonical(cycle: &[usize]) -> Vec<usize> {
    let pivot = cycle
        .iter()
        .enumerate()
        .min_by_key(|&(_, &node)| node)
        .map(|(position, _)| position)
        .unwrap_or(0);
    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[pivot..]);
    rotated.extend_from_slice(&cycle[..pivot]);
    rotated
}

/// Extract the profile name from a `profiles/<name>.yaml|.yml` context
/// reference; plain context paths are not graph edges.
fn profile_reference(context: &str) -> Option<&str> {
    let path = Path::new(context);
    if path.parent() != Some(Path::new("profiles")) {
        return None;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => path.file_stem().and_then(|s| s.to_str()),
        _ => None,
    }
}
