use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Mutex;

use once_cell::sync::Lazy;

pub(crate) type BuildHasher = fxhash::FxBuildHasher;

pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasher>;

pub(crate) type IndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
pub(crate) type IndexSet<K> = indexmap::IndexSet<K, BuildHasher>;

/// Moves everything in `from` onto the end of `to`, reusing whichever
/// allocation is bigger.
pub(crate) fn concat_vecs<T>(to: &mut Vec<T>, mut from: Vec<T>) {
    if to.len() < from.len() {
        std::mem::swap(to, &mut from)
    }
    to.extend(from);
}

static SYMBOLS: Lazy<Mutex<IndexSet<&'static str>>> = Lazy::new(Default::default);

/// An interned operator or atom label.
///
/// Both e-node operators and pattern leaf names are [`Symbol`]s.
/// A [`Symbol`] is an index into a process-wide table of strings, so it
/// is `Copy` and compares and hashes as a single integer.
/// Interned strings are leaked; only put labels in here, not data.
///
/// # Example
/// ```rust
/// use eqsat::Symbol;
///
/// assert_eq!(Symbol::from("add"), Symbol::from("add"));
/// assert_eq!(Symbol::from("add"), "add".parse().unwrap());
/// assert_ne!(Symbol::from("add"), Symbol::from("mul"));
/// assert_eq!(Symbol::from("mul").as_str(), "mul");
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// The string this symbol was interned from.
    pub fn as_str(self) -> &'static str {
        let symbols = SYMBOLS
            .lock()
            .unwrap_or_else(|err| panic!("Symbol table poisoned: {}", err));
        symbols
            .get_index(self.0 as usize)
            .copied()
            .unwrap_or_else(|| panic!("Symbol {} was never interned", self.0))
    }
}

fn intern(s: &str) -> Symbol {
    let mut symbols = SYMBOLS
        .lock()
        .unwrap_or_else(|err| panic!("Symbol table poisoned: {}", err));
    let index = match symbols.get_full(s) {
        Some((index, _)) => index,
        None => {
            let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
            symbols.insert_full(leaked).0
        }
    };
    Symbol(index as u32)
}

impl<S: AsRef<str>> From<S> for Symbol {
    fn from(s: S) -> Self {
        intern(s.as_ref())
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self.as_str(), f)
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.as_str(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let a1 = Symbol::from("interning_is_stable_a");
        let b = Symbol::from(String::from("interning_is_stable_b"));
        let a2: Symbol = "interning_is_stable_a".parse().unwrap();

        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert_eq!(a1.to_string(), "interning_is_stable_a");
        assert_eq!(format!("{:?}", b), "\"interning_is_stable_b\"");
    }

    #[test]
    fn concat_keeps_everything() {
        let mut small = vec![1, 2];
        concat_vecs(&mut small, vec![3, 4, 5]);
        small.sort_unstable();
        assert_eq!(small, vec![1, 2, 3, 4, 5]);
    }
}
