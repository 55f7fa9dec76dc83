//! Monomial sums: the only algebra the ODE system needs.
//!
//! Expressions are never simplified. A sum keeps every term it was built
//! from, so a Jacobian cell whose terms cancel numerically is still a sum of
//! live terms rather than a literal zero.

use core::fmt;
use core::ops::Mul;

use nn_core::{NuclideId, RateId, Real};

/// Exact rational coefficient, kept in lowest terms with a positive
/// denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ratio {
    num: i64,
    den: i64,
}

impl Ratio {
    pub const ZERO: Ratio = Ratio { num: 0, den: 1 };
    pub const ONE: Ratio = Ratio { num: 1, den: 1 };

    /// `num / den`; a zero denominator yields zero.
    pub fn new(num: i64, den: i64) -> Self {
        if den == 0 || num == 0 {
            return Self::ZERO;
        }
        let g = gcd(num.unsigned_abs(), den.unsigned_abs()) as i64;
        let sign = if den < 0 { -1 } else { 1 };
        Self {
            num: sign * num / g,
            den: sign * den / g,
        }
    }

    pub fn integer(n: i64) -> Self {
        Self { num: n, den: 1 }
    }

    pub fn num(self) -> i64 {
        self.num
    }

    pub fn den(self) -> i64 {
        self.den
    }

    pub fn is_zero(self) -> bool {
        self.num == 0
    }

    pub fn is_negative(self) -> bool {
        self.num < 0
    }

    pub fn abs(self) -> Self {
        Self {
            num: self.num.abs(),
            den: self.den,
        }
    }

    pub fn to_real(self) -> Real {
        self.num as Real / self.den as Real
    }
}

impl Mul for Ratio {
    type Output = Ratio;

    fn mul(self, rhs: Ratio) -> Ratio {
        Ratio::new(self.num * rhs.num, self.den * rhs.den)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

/// A named runtime quantity in the generated code.
///
/// Variant order is the factor order within a printed term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// Screened rate coefficient of a graph entry.
    Rate(RateId),
    /// Molar abundance of a network nuclide.
    Abundance(NuclideId),
    Density,
    ElectronFraction,
}

/// `coeff * prod(symbol^power)`, factors sorted by symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    coeff: Ratio,
    factors: Vec<(Symbol, u32)>,
}

impl Term {
    pub fn constant(coeff: Ratio) -> Self {
        Self {
            coeff,
            factors: Vec::new(),
        }
    }

    /// Multiply in `symbol^power`; a zero power is a no-op.
    pub fn times(mut self, symbol: Symbol, power: u32) -> Self {
        if power == 0 {
            return self;
        }
        match self.factors.binary_search_by(|(s, _)| s.cmp(&symbol)) {
            Ok(i) => self.factors[i].1 += power,
            Err(i) => self.factors.insert(i, (symbol, power)),
        }
        self
    }

    pub fn scaled(mut self, by: Ratio) -> Self {
        self.coeff = self.coeff * by;
        self
    }

    pub fn coeff(&self) -> Ratio {
        self.coeff
    }

    pub fn factors(&self) -> &[(Symbol, u32)] {
        &self.factors
    }

    pub fn power_of(&self, symbol: Symbol) -> u32 {
        self.factors
            .iter()
            .find(|(s, _)| *s == symbol)
            .map_or(0, |(_, p)| *p)
    }

    /// Partial derivative with respect to `symbol`, or `None` when the term
    /// does not depend on it.
    pub fn derivative(&self, symbol: Symbol) -> Option<Term> {
        let i = self.factors.iter().position(|(s, _)| *s == symbol)?;
        let power = self.factors[i].1;
        let mut out = self.clone();
        out.coeff = out.coeff * Ratio::integer(i64::from(power));
        if power == 1 {
            out.factors.remove(i);
        } else {
            out.factors[i].1 = power - 1;
        }
        Some(out)
    }

    pub fn eval(&self, value: &impl Fn(Symbol) -> Real) -> Real {
        self.factors
            .iter()
            .fold(self.coeff.to_real(), |acc, (s, p)| acc * value(*s).powi(*p as i32))
    }
}

/// Unsimplified sum of terms. No terms is the literal zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Expr {
    terms: Vec<Term>,
}

impl Expr {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_literal_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn push(&mut self, term: Term) {
        self.terms.push(term);
    }

    pub fn eval(&self, value: impl Fn(Symbol) -> Real) -> Real {
        self.terms.iter().map(|t| t.eval(&value)).sum()
    }
}

impl From<Term> for Expr {
    fn from(term: Term) -> Self {
        Self { terms: vec![term] }
    }
}

impl FromIterator<Term> for Expr {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}
