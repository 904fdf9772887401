/** A macro to easily make [`Rewrite`]s.

The simplest form `rewrite!(a; b => c)` creates a [`Rewrite`] named `a`
with lefthand side `b` and righthand side `c`, keeping every lefthand
variable's name (see [`Rewrite::simple`]).
In the `b` and `c` position the macro only accepts a single token tree:
a string literal is parsed as a [`Pattern`] (panicking if that fails),
anything else must be a braced or parenthesized expression that
evaluates to a [`Pattern`].

The form `rewrite!(a; b <=> c)` returns a `Vec` of two rules, the
second named `a` followed by `-rev` and going from `c` to `b`.

# Example
```
use eqsat::*;

let mut rules: Vec<Rewrite> = vec![
    rewrite!("comm-add"; "(add a b)" => "(add b a)"),
    rewrite!("comm-mul"; "(mul a b)" => "(mul b a)"),
    rewrite!("mul-zero"; "(mul a (zero))" => { Pattern::leaf("zero") }),
];

rules.extend(rewrite!("assoc-add"; "(add a (add b c))" <=> "(add (add a b) c)"));
assert_eq!(rules[4].name(), "assoc-add-rev");
```
**/
#[macro_export]
macro_rules! rewrite {
    (
        $name:expr;
        $lhs:tt => $rhs:tt
    ) => {{
        let lhs = $crate::__rewrite!(@parse $lhs);
        let rhs = $crate::__rewrite!(@parse $rhs);
        $crate::Rewrite::simple($name.to_string(), lhs, rhs)
    }};
    (
        $name:expr;
        $lhs:tt <=> $rhs:tt
    ) => {{
        let name = $name.to_string();
        let name2 = format!("{}-rev", name);
        vec![
            $crate::rewrite!(name;  $lhs => $rhs),
            $crate::rewrite!(name2; $rhs => $lhs),
        ]
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __rewrite {
    (@parse $pat:literal) => {
        $pat.parse::<$crate::Pattern>()
            .unwrap_or_else(|err| panic!("bad pattern {:?}: {}", $pat, err))
    };
    (@parse $pat:expr) => {
        $pat
    };
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn some_rewrites() {
        let mut rws: Vec<Rewrite> = vec![
            // here it should parse the rhs
            rewrite!("rule"; "(cons a b)" => "(f b)"),
            // here it should just accept the rhs without trying to parse
            rewrite!("rule"; "(f a)" => { Pattern::compound("g", vec![Pattern::leaf("a")]) }),
        ];
        rws.extend(rewrite!("two-way"; "(foo a)" <=> "(bar a)"));

        assert_eq!(rws.len(), 4);
        assert_eq!(rws[1].rhs().to_string(), "(g a)");
        assert_eq!(rws[2].name(), "two-way");
        assert_eq!(rws[3].name(), "two-way-rev");
        assert_eq!(rws[3].lhs(), rws[2].rhs());
    }

    #[test]
    #[should_panic(expected = "bad pattern")]
    fn rewrite_bad_pattern_panics() {
        let _: Rewrite = rewrite!("bad"; "(f a" => "a");
    }
}
