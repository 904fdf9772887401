#![warn(missing_docs)]
/*!

`eqsat` is a small e-graph library for equality saturation.

An [`EGraph`] interns [`ENode`]s, groups them into equivalence classes
with a union-find, and restores congruence closure lazily in
[`EGraph::rebuild`].
[`Pattern`]s search the graph for [`Subst`]itutions, and a [`Rewrite`]
instantiates its right-hand side from each one.
[`saturate`] (or the configurable [`Runner`]) repeats search, apply and
rebuild until the graph stops growing.

## Logging

Most parts of `eqsat` log through the [`log`](https://docs.rs/log/) crate.
Install a logger such as [`env_logger`](https://docs.rs/env_logger/) in your
binary and set `RUST_LOG=eqsat=info` (or `debug`, `trace`) to see it.

## Example

```
use eqsat::*;

let mut egraph = EGraph::default();
let x = egraph.make("x", &[]);
let y = egraph.make("y", &[]);
let fx = egraph.make("f", &[x]);
let fy = egraph.make("f", &[y]);
assert!(!egraph.equal(fx, fy));

egraph.merge(x, y);
egraph.rebuild();
assert!(egraph.equal(fx, fy));
```

*/

mod macros;

#[doc(hidden)]
pub mod test;

mod egraph;
mod enode;
mod pattern;
mod rewrite;
mod run;
mod subst;
mod unionfind;
mod util;

/// A key to identify e-classes within an [`EGraph`].
///
/// Every interned node gets a fresh `Id`; it names a class once it is
/// passed through [`EGraph::find`].
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Id(u32);

impl From<usize> for Id {
    fn from(n: usize) -> Id {
        Id(n as u32)
    }
}

impl From<Id> for usize {
    fn from(id: Id) -> usize {
        id.0 as usize
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) use unionfind::UnionFind;

pub use {
    egraph::EGraph,
    enode::ENode,
    pattern::{Pattern, PatternParseError, SearchMatch},
    rewrite::{Rewrite, RewriteError},
    run::{saturate, Iteration, Runner, StopReason},
    subst::Subst,
    util::Symbol,
};

#[cfg(test)]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
