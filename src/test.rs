/*! Utilities for testing and timing eqsat.

These are not considered part of the public api.
*/

use std::time::{Duration, Instant};

use crate::{Pattern, Runner};

fn mean_stdev(data: &[f64]) -> (f64, f64) {
    assert_ne!(data.len(), 0);

    let sum = data.iter().sum::<f64>();
    let n = data.len() as f64;
    let mean = sum / n;

    let variance = data
        .iter()
        .map(|value| {
            let diff = mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / n;

    (mean, variance.sqrt())
}

fn var<T>(s: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Debug,
{
    use std::env::VarError;
    match std::env::var(s) {
        Err(VarError::NotPresent) => None,
        Err(VarError::NotUnicode(_)) => panic!("Environment variable {} isn't unicode", s),
        Ok(v) => match v.parse() {
            Ok(v) => Some(v),
            Err(err) => panic!("Couldn't parse environment variable {}={}, {:?}", s, v, err),
        },
    }
}

/// Runs `f` once, or repeatedly for `EQSAT_BENCH` seconds if that is
/// set, printing timing statistics. Returns the last result.
pub fn run<T>(name: impl Into<String>, mut f: impl FnMut() -> T) -> T {
    let name = name.into();
    let seconds: f64 = match var("EQSAT_BENCH") {
        Some(s) => s,
        None => return f(),
    };

    let duration = Duration::from_secs_f64(seconds);

    let start = Instant::now();
    let mut times = vec![];

    println!("benching {} for {} seconds...", name, seconds);

    let result = loop {
        let i = Instant::now();
        let result = f();
        times.push(i.elapsed().as_secs_f64());

        if start.elapsed() > duration {
            break result;
        }
    };

    let (mean, stdev) = mean_stdev(&times);
    println!("bench    {}:", name);
    println!("  n = {}", times.len());
    println!("  μ = {}", mean);
    println!("  σ = {}", stdev);

    result
}

impl Runner {
    /// Panics unless every goal is in the class of the last root.
    ///
    /// Goals are ground terms; they are looked up, never added.
    pub fn check_goals(&self, goals: &[Pattern]) {
        let egraph = &self.egraph;
        let root = match self.roots.last() {
            Some(&root) => egraph.find(root),
            None => panic!("Runner has no roots to check goals against"),
        };

        for (i, goal) in goals.iter().enumerate() {
            println!("Trying to prove goal {}: {}", i, goal);
            match egraph.lookup_expr(goal) {
                Some(id) if id == root => {}
                found => {
                    let in_class: Vec<String> = egraph
                        .class_nodes(root)
                        .into_iter()
                        .map(|n| n.to_string())
                        .collect();
                    panic!(
                        "Could not prove goal {}: {}\nfound: {:?}\nstart class {}: {:?}",
                        i, goal, found, root, in_class,
                    );
                }
            }
        }
    }
}

/// Make a test function that saturates a start term and checks that
/// every goal ends up in its class.
#[macro_export]
macro_rules! test_fn {
    (
        $(#[$meta:meta])*
        $name:ident, $rules:expr,
        $start:literal
        =>
        $($goal:literal),+ $(,)?
        $(@check $check_fn:expr)?
    ) => {
        $crate::test_fn! {
            $(#[$meta])*
            $name, $rules,
            runner = $crate::Runner::default(),
            $start => $( $goal ),+
            $(@check $check_fn)?
        }
    };

    (
        $(#[$meta:meta])*
        $name:ident, $rules:expr,
        runner = $runner:expr,
        $start:literal
        =>
        $($goal:literal),+ $(,)?
        $(@check $check_fn:expr)?
    ) => {
        $(#[$meta])*
        #[test]
        fn $name() {
            let _ = env_logger::builder().is_test(true).try_init();
            let name = stringify!($name);
            let start: $crate::Pattern = $start.parse().unwrap();
            let rules = $rules;

            let runner = $crate::test::run(name, || {
                $runner.with_expr(&start).run(&rules)
            });
            runner.print_report();

            let goals: &[$crate::Pattern] = &[$(
                $goal.parse().unwrap()
            ),+];

            runner.check_goals(goals);

            $( ($check_fn)(runner) )?
        }
    };
}
