//! Dependency graph over a candidate arena (indices, no pointers).
//!
//! Cycle detection is an iterative Tarjan walk with visited/on-stack marks, so
//! long dependency chains cannot blow the call stack.

use std::collections::HashMap;

use crate::candidate::Candidate;

#[derive(Debug, Clone)]
pub(crate) struct DependencyGraph {
    /// deps[i] = arena indices candidate i waits on (only ids present in the set).
    deps: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub(crate) fn build(candidates: &[Candidate]) -> Self {
        let index: HashMap<&str, usize> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.as_str(), i))
            .collect();

        let deps = candidates
            .iter()
            .map(|c| {
                let mut v: Vec<usize> = c
                    .dependencies
                    .iter()
                    .filter_map(|d| {
                        let found = index.get(d.as_str()).copied();
                        if found.is_none() {
                            tracing::debug!(
                                candidate = %c.id,
                                dependency = %d,
                                "dependency not in set; treated as done"
                            );
                        }
                        found
                    })
                    .collect();
                v.sort_unstable();
                v.dedup();
                v
            })
            .collect();

        Self { deps }
    }

    pub(crate) fn deps(&self, i: usize) -> &[usize] {
        &self.deps[i]
    }

    /// Strongly connected components with more than one member, each sorted
    /// by arena index, ordered by their first member.
    pub(crate) fn cycles(&self) -> Vec<Vec<usize>> {
        let n = self.deps.len();
        let mut next_index = 0usize;
        let mut index: Vec<Option<usize>> = vec![None; n];
        let mut low = vec![0usize; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut out: Vec<Vec<usize>> = Vec::new();

        for root in 0..n {
            if index[root].is_some() {
                continue;
            }

            // (node, next edge to explore)
            let mut call: Vec<(usize, usize)> = vec![(root, 0)];
            index[root] = Some(next_index);
            low[root] = next_index;
            next_index += 1;
            stack.push(root);
            on_stack[root] = true;

            while let Some(&(node, edge)) = call.last() {
                if let Some(&w) = self.deps[node].get(edge) {
                    if let Some(top) = call.last_mut() {
                        top.1 += 1;
                    }
                    match index[w] {
                        None => {
                            index[w] = Some(next_index);
                            low[w] = next_index;
                            next_index += 1;
                            stack.push(w);
                            on_stack[w] = true;
                            call.push((w, 0));
                        }
                        Some(wi) if on_stack[w] => {
                            low[node] = low[node].min(wi);
                        }
                        Some(_) => {}
                    }
                    continue;
                }

                // All edges explored.
                call.pop();
                if let Some(&(parent, _)) = call.last() {
                    low[parent] = low[parent].min(low[node]);
                }

                if Some(low[node]) == index[node] {
                    let mut component = Vec::new();
                    while let Some(w) = stack.pop() {
                        on_stack[w] = false;
                        component.push(w);
                        if w == node {
                            break;
                        }
                    }
                    if component.len() > 1 {
                        component.sort_unstable();
                        out.push(component);
                    }
                }
            }
        }

        out.sort_by_key(|c| c[0]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(id: &str, deps: &[&str]) -> Candidate {
        let mut c = Candidate::task(id, format!("Item {id}"));
        c.dependencies = deps.iter().map(|d| d.to_string()).collect();
        c
    }

    #[test]
    fn test_no_cycles_in_chain() {
        let g = DependencyGraph::build(&[c("a", &[]), c("b", &["a"]), c("c", &["b"])]);
        assert!(g.cycles().is_empty());
        assert_eq!(g.deps(2), &[1]);
    }

    #[test]
    fn test_simple_cycle() {
        let g = DependencyGraph::build(&[c("a", &["b"]), c("b", &["a"]), c("x", &[])]);
        assert_eq!(g.cycles(), vec![vec![0, 1]]);
    }

    #[test]
    fn test_cycle_member_reached_through_finished_node() {
        // a -> b -> c -> a, and a -> d -> b: d is in the same component.
        let g = DependencyGraph::build(&[
            c("a", &["b", "d"]),
            c("b", &["c"]),
            c("c", &["a"]),
            c("d", &["b"]),
        ]);
        assert_eq!(g.cycles(), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_dependent_on_cycle_is_not_a_member() {
        let g = DependencyGraph::build(&[c("a", &["b"]), c("b", &["a"]), c("z", &["a"])]);
        assert_eq!(g.cycles(), vec![vec![0, 1]]);
    }

    #[test]
    fn test_unknown_dependency_ignored() {
        let g = DependencyGraph::build(&[c("a", &["gone"])]);
        assert!(g.deps(0).is_empty());
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let n = 50_000;
        let items: Vec<Candidate> = (0..n)
            .map(|i| {
                if i == 0 {
                    c("n0", &[])
                } else {
                    let prev = format!("n{}", i - 1);
                    c(&format!("n{i}"), &[prev.as_str()])
                }
            })
            .collect();
        assert!(DependencyGraph::build(&items).cycles().is_empty());
    }
}
