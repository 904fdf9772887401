use eqsat::*;

fn rules() -> Vec<Rewrite> {
    let mut rules = vec![
        rewrite!("comm-add"; "(add a b)" => "(add b a)"),
        rewrite!("comm-mul"; "(mul a b)" => "(mul b a)"),
        rewrite!("add-zero"; "(add a (zero))" => "a"),
        rewrite!("mul-one"; "(mul a (one))" => "a"),
        rewrite!("mul-zero"; "(mul a (zero))" => "zero"),
    ];
    rules.extend(rewrite!("assoc-add"; "(add a (add b c))" <=> "(add (add a b) c)"));
    rules
}

test_fn! {
    drop_units, rules(),
    "(mul (add x zero) one)"
    =>
    "x",
    "(add zero x)",
    "(mul one x)",
}

test_fn! {
    absorb_zero, rules(),
    "(add y (mul x zero))"
    =>
    "y",
    "(add zero y)",
}

test_fn! {
    reassociate, rules(),
    runner = Runner::default().with_merge_aware_fixpoint(true),
    "(add a (add b (add c d)))"
    =>
    "(add d (add (add a b) c))",
    "(add (add (add a b) c) d)",
    @check |r: Runner| assert_eq!(r.stop_reason, Some(StopReason::Saturated))
}

test_fn! {
    small_budget, rules(),
    runner = Runner::default().with_iter_limit(1),
    "(add x zero)"
    =>
    "x",
    @check |r: Runner| assert_eq!(r.stop_reason, Some(StopReason::IterationLimit(1)))
}
