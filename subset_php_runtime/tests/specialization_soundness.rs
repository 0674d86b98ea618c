//! The compiler replaces generic operator calls with raw `i64`/`f64`
//! arithmetic when it can prove operand types. These tests check that the
//! raw forms agree with the generic `Value` forms over edge values and a
//! deterministic pseudo-random sample of the long range.

use subset_php_runtime::prelude::*;

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn next_long(&mut self) -> i64 {
        let raw = self.next() as i64;
        // Mix full-range values with small ones so shifts and exact
        // division are exercised too.
        match self.next() % 4 {
            0 => raw,
            1 => raw % 1000,
            2 => raw % 70,
            _ => raw >> 40,
        }
    }
}

const EDGES: [i64; 11] = [
    0,
    1,
    -1,
    2,
    63,
    64,
    i64::MAX,
    i64::MIN,
    i64::MAX - 1,
    i64::MIN + 1,
    9_007_199_254_740_993,
];

fn long_pairs() -> Vec<(i64, i64)> {
    let mut pairs = Vec::new();
    for &a in &EDGES {
        for &b in &EDGES {
            pairs.push((a, b));
        }
    }
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    for _ in 0..20_000 {
        pairs.push((rng.next_long(), rng.next_long()));
    }
    pairs
}

#[test]
fn generic_and_raw_long_operators_agree() {
    for (a, b) in long_pairs() {
        for op in BinOp::ALL {
            let generic = dynamic_binop(op, &Value::from_long(a), &Value::from_long(b));
            let raw = raw_long_binop(op, a, b);
            assert!(
                generic.eql(&raw),
                "{} {} {}: generic {:?}, raw {:?}",
                a,
                op.as_str(),
                b,
                generic,
                raw
            );
        }
    }
}

#[test]
fn float_comparisons_agree_for_mixed_numbers() {
    let mut rng = XorShift(42);
    for _ in 0..5_000 {
        let x = (rng.next_long() as f64) / 7.0;
        let y = rng.next_long();
        let (dx, ly) = (Value::from_double(x), Value::from_long(y));
        let yf = y as f64;
        assert_eq!(dx.lt(&ly), x < yf);
        assert_eq!(dx.leq(&ly), x <= yf);
        assert_eq!(dx.gt(&ly), x > yf);
        assert_eq!(dx.geq(&ly), x >= yf);
        assert_eq!(dx.eq(&ly), x == yf);
        assert_eq!(ly.lt(&dx), yf < x);
    }
}

#[test]
fn float_comparisons_agree_for_double_and_string() {
    let strings = [
        "", "0", "1", "-1.5", "1e3", " 12", "12abc", "abc", "9007199254740993", "0.1",
    ];
    let doubles = [0.0, 1.0, -1.5, 1000.0, 12.0, 0.1, 9.007_199_254_740_992e15, f64::NAN];
    for s in strings {
        let sv = Value::from_string(PhpStr::new(s));
        let sd = PhpStr::new(s).to_double();
        for d in doubles {
            let dv = Value::from_double(d);
            assert_eq!(dv.lt(&sv), d < sd, "{} < {:?}", d, s);
            assert_eq!(dv.eq(&sv), d == sd, "{} == {:?}", d, s);
            assert_eq!(sv.geq(&dv), sd >= d, "{:?} >= {}", s, d);
        }
    }
}

#[test]
fn float_arithmetic_agrees_for_mixed_numbers() {
    let mut rng = XorShift(7);
    for _ in 0..5_000 {
        let x = (rng.next_long() as f64) / 3.0;
        let y = rng.next_long();
        let (dx, ly) = (Value::from_double(x), Value::from_long(y));
        assert!(dx.add(&ly).eql(&Value::from_double(x + y as f64)));
        assert!(dx.sub(&ly).eql(&Value::from_double(x - y as f64)));
        assert!(ly.mul(&dx).eql(&Value::from_double(y as f64 * x)));
        assert!(dx.div(&ly).eql(&div_double(x, y as f64)));
    }
}
