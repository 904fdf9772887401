use indexmap::IndexMap;
use instant::{Duration, Instant};
use log::*;

use crate::{EGraph, Id, Pattern, Rewrite, SearchMatch};

/** Runs [`Rewrite`]s over an [`EGraph`] until it saturates or a limit
is hit.

Each round is split into phases that never interleave:

- every rule is searched against the graph as it stood at the start
  of the round, so all rules see the same snapshot,
- every match has its righthand side instantiated and merged with the
  matched class,
- the graph is rebuilt once with [`EGraph::rebuild`].

A round that ends with the hash-cons table the same size it started
with is a fixpoint, and the runner stops with [`StopReason::Saturated`].
With [`with_merge_aware_fixpoint`](Runner::with_merge_aware_fixpoint)
the round must also have merged nothing, so rounds that only join
existing classes keep the run going.
The iteration, node and time limits are checked at the start of each
round.

[`Runner`] records an [`Iteration`] for every round.

# Example

```
use eqsat::*;

let rules = &[
    rewrite!("comm-add"; "(add a b)" => "(add b a)"),
    // a leaf matches anything, so a literal is written as a nullary compound
    rewrite!("add-zero"; "(add a (zero))" => "a"),
];

let runner = Runner::default()
    .with_iter_limit(10)
    .with_expr(&"(add zero x)".parse().unwrap())
    .run(rules);

let root = runner.roots[0];
let x = runner.egraph.lookup(&ENode::leaf("x")).unwrap();
assert!(runner.egraph.equal(root, x));
assert!(matches!(runner.stop_reason, Some(StopReason::Saturated)));
```
*/
pub struct Runner {
    /// The [`EGraph`] being saturated.
    pub egraph: EGraph,
    /// One entry per round that ran.
    pub iterations: Vec<Iteration>,
    /// The roots of expressions added by
    /// [`with_expr`](Runner::with_expr), in insertion order.
    pub roots: Vec<Id>,
    /// Why the `Runner` stopped. `None` until [`run`](Runner::run) returns.
    pub stop_reason: Option<StopReason>,

    // limits
    iter_limit: usize,
    node_limit: usize,
    time_limit: Duration,
    merge_aware_fixpoint: bool,

    start_time: Option<Instant>,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            iter_limit: 30,
            node_limit: 10_000,
            time_limit: Duration::from_secs(5),
            merge_aware_fixpoint: false,

            egraph: EGraph::default(),
            iterations: vec![],
            roots: vec![],
            stop_reason: None,

            start_time: None,
        }
    }
}

/// Why a [`Runner`] stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// A round learned nothing new.
    Saturated,
    /// The iteration limit was hit. The data is the iteration limit.
    IterationLimit(usize),
    /// The node limit was hit. The data is the hash-cons size seen.
    NodeLimit(usize),
    /// The time limit was hit. The data is the elapsed time in seconds.
    TimeLimit(f64),
}

/// Data recorded for one round of a [`Runner`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Iteration {
    /// Hash-cons size at the start of the round.
    pub egraph_nodes: usize,
    /// Number of classes at the start of the round.
    pub egraph_classes: usize,
    /// Rule name to the number of merges it caused that joined two
    /// distinct classes.
    pub applied: IndexMap<String, usize>,
    /// Seconds spent searching.
    pub search_time: f64,
    /// Seconds spent instantiating and merging.
    pub apply_time: f64,
    /// Seconds spent in [`rebuild`](EGraph::rebuild).
    pub rebuild_time: f64,
    /// Seconds for the whole round.
    pub total_time: f64,
    /// Worklist passes the rebuild needed.
    pub n_rebuilds: usize,
    /// Set on the last round if the runner stopped after it.
    pub stop_reason: Option<StopReason>,
}

type RunnerResult<T> = std::result::Result<T, StopReason>;

impl Runner {
    /// Sets the iteration limit. Default: 30
    pub fn with_iter_limit(self, iter_limit: usize) -> Self {
        Self { iter_limit, ..self }
    }

    /// Sets the hash-cons size limit. Default: 10,000
    pub fn with_node_limit(self, node_limit: usize) -> Self {
        Self { node_limit, ..self }
    }

    /// Sets the runner time limit. Default: 5 seconds
    pub fn with_time_limit(self, time_limit: Duration) -> Self {
        Self { time_limit, ..self }
    }

    /// Also require a round to merge nothing before calling it a
    /// fixpoint. Default: false
    pub fn with_merge_aware_fixpoint(self, merge_aware_fixpoint: bool) -> Self {
        Self {
            merge_aware_fixpoint,
            ..self
        }
    }

    /// Replace the [`EGraph`] of this `Runner`.
    pub fn with_egraph(self, egraph: EGraph) -> Self {
        Self { egraph, ..self }
    }

    /// Add a ground term to the egraph and record its id in
    /// [`roots`](Runner::roots).
    pub fn with_expr(mut self, expr: &Pattern) -> Self {
        let id = self.egraph.add_expr(expr);
        self.roots.push(id);
        self
    }

    /// Run this `Runner` until it stops.
    /// After this, [`stop_reason`](Runner::stop_reason) is set.
    pub fn run<'a, R>(mut self, rules: R) -> Self
    where
        R: IntoIterator<Item = &'a Rewrite>,
    {
        let rules: Vec<&Rewrite> = rules.into_iter().collect();
        check_rules(&rules);
        self.egraph.rebuild();
        loop {
            if let Err(stop_reason) = self.run_one(&rules) {
                info!("Stopping: {:?}", stop_reason);
                if let Some(last) = self.iterations.last_mut() {
                    last.stop_reason = Some(stop_reason.clone());
                }
                self.stop_reason = Some(stop_reason);
                break;
            }
        }
        self
    }

    #[rustfmt::skip]
    /// Prints some information about a runner's run.
    pub fn print_report(&self) {
        let search_time: f64 = self.iterations.iter().map(|i| i.search_time).sum();
        let apply_time: f64 = self.iterations.iter().map(|i| i.apply_time).sum();
        let rebuild_time: f64 = self.iterations.iter().map(|i| i.rebuild_time).sum();
        let total_time: f64 = self.iterations.iter().map(|i| i.total_time).sum();

        let iters = self.iterations.len();
        let rebuilds: usize = self.iterations.iter().map(|i| i.n_rebuilds).sum();

        let eg = &self.egraph;
        println!("Runner report");
        println!("=============");
        println!("  Stop reason: {:?}", self.stop_reason);
        println!("  Iterations: {}", iters);
        println!("  Egraph size: {} memo, {} classes", eg.size(), eg.number_of_classes());
        println!("  Rebuilds: {}, {:.2} per iter", rebuilds, (rebuilds as f64) / (iters.max(1) as f64));
        println!("  Total time: {}", total_time);
        println!("    Search:  ({:.2}) {}", search_time / total_time, search_time);
        println!("    Apply:   ({:.2}) {}", apply_time / total_time, apply_time);
        println!("    Rebuild: ({:.2}) {}", rebuild_time / total_time, rebuild_time);
    }

    fn run_one(&mut self, rules: &[&Rewrite]) -> RunnerResult<()> {
        info!("\nIteration {}", self.iterations.len());

        self.start_time.get_or_insert_with(Instant::now);
        self.check_limits()?;

        let egraph_nodes = self.egraph.size();
        let egraph_classes = self.egraph.number_of_classes();
        trace!("EGraph {:?}", self.egraph.dump());

        let start_time = Instant::now();

        let matches: Vec<Vec<SearchMatch>> = rules
            .iter()
            .map(|rw| {
                let ms = rw.search(&self.egraph);
                debug!("Searched {}: {} matches", rw.name(), ms.len());
                ms
            })
            .collect();

        let search_time = start_time.elapsed().as_secs_f64();
        info!("Search time: {}", search_time);

        let apply_time = Instant::now();

        let mut applied = IndexMap::new();
        for (rw, ms) in rules.iter().zip(matches) {
            if ms.is_empty() {
                continue;
            }

            debug!("Applying {} {} times", rw.name(), ms.len());

            let mut actually_matched = 0;
            for m in ms {
                let id = rw.apply(&mut self.egraph, &m.subst);
                if !self.egraph.equal(id, m.eclass) {
                    self.egraph.merge(id, m.eclass);
                    actually_matched += 1;
                }
            }

            if actually_matched > 0 {
                *applied.entry(rw.name().to_owned()).or_insert(0) += actually_matched;
                debug!("Applied {} {} times", rw.name(), actually_matched);
            }
        }

        let apply_time = apply_time.elapsed().as_secs_f64();
        info!("Apply time: {}", apply_time);

        let rebuild_time = Instant::now();
        let n_rebuilds = self.egraph.rebuild();

        let rebuild_time = rebuild_time.elapsed().as_secs_f64();
        info!("Rebuild time: {}", rebuild_time);
        info!(
            "Size: n={}, e={}",
            self.egraph.size(),
            self.egraph.number_of_classes()
        );

        let saturated = self.egraph.size() == egraph_nodes
            && (!self.merge_aware_fixpoint || applied.is_empty());

        self.iterations.push(Iteration {
            egraph_nodes,
            egraph_classes,
            applied,
            search_time,
            apply_time,
            rebuild_time,
            n_rebuilds,
            total_time: start_time.elapsed().as_secs_f64(),
            stop_reason: None,
        });

        if saturated {
            Err(StopReason::Saturated)
        } else {
            Ok(())
        }
    }

    fn check_limits(&self) -> RunnerResult<()> {
        if let Some(start) = self.start_time {
            let elapsed = start.elapsed();
            if elapsed > self.time_limit {
                return Err(StopReason::TimeLimit(elapsed.as_secs_f64()));
            }
        }

        let size = self.egraph.size();
        if size > self.node_limit {
            return Err(StopReason::NodeLimit(size));
        }

        if self.iterations.len() >= self.iter_limit {
            return Err(StopReason::IterationLimit(self.iterations.len()));
        }

        Ok(())
    }
}

fn check_rules(rules: &[&Rewrite]) {
    let mut name_counts: IndexMap<&str, usize> = IndexMap::new();
    for rw in rules {
        *name_counts.entry(rw.name()).or_default() += 1
    }

    name_counts.retain(|_, count| *count > 1);
    if !name_counts.is_empty() {
        warn!("Duplicated rule names may affect rule reporting.");
        for (name, &count) in name_counts.iter() {
            warn!("Rule '{}' appears {} times", name, count);
        }
    }
}

/// Saturates `egraph` with `rewrites`, running at most `max_iters` rounds.
///
/// Returns the 0-based index of the round that found nothing new, or
/// `max_iters` if the budget ran out first; the two cannot otherwise be
/// told apart. Only the iteration limit applies here; use a [`Runner`]
/// for node and time limits.
///
/// # Example
/// ```
/// use eqsat::*;
/// let mut egraph = EGraph::default();
/// let x = egraph.make("x", &[]);
/// let y = egraph.make("y", &[]);
/// let xy = egraph.make("add", &[x, y]);
///
/// let rules = [rewrite!("comm-add"; "(add a b)" => "(add b a)")];
/// assert_eq!(saturate(&mut egraph, &rules, 10), 1);
///
/// let yx = egraph.make("add", &[y, x]);
/// assert!(egraph.equal(xy, yx));
/// ```
pub fn saturate(egraph: &mut EGraph, rewrites: &[Rewrite], max_iters: usize) -> usize {
    let runner = Runner::default()
        .with_iter_limit(max_iters)
        .with_node_limit(usize::MAX)
        .with_time_limit(Duration::MAX)
        .with_egraph(std::mem::take(egraph))
        .run(rewrites);

    let Runner {
        egraph: saturated,
        iterations,
        stop_reason,
        ..
    } = runner;
    *egraph = saturated;

    match stop_reason {
        Some(StopReason::Saturated) => iterations.len() - 1,
        _ => max_iters,
    }
}
