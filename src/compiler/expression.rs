//! Quadratic expressions over binary decision variables.
//!
//! An [`Expression`] is `constant + Σ cᵢ·xᵢ + Σ cᵢⱼ·xᵢ·xⱼ` with every `x`
//! binary. Because `x² = x` for binaries, squaring a variable folds into
//! the linear part.

use serde::{Deserialize, Serialize};

/// Comparison tolerance for constraint checks.
pub const TOLERANCE: f64 = 1e-9;

/// Dense decision-variable index (`employee * shift_count + shift`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VarId(pub usize);

/// A linear term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTerm {
    pub var: VarId,
    pub coef: f64,
}

/// A product term over two distinct variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticTerm {
    pub a: VarId,
    pub b: VarId,
    pub coef: f64,
}

/// Quadratic polynomial over binary variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub linear: Vec<LinearTerm>,
    pub quadratic: Vec<QuadraticTerm>,
    pub constant: f64,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Σ x` over the given variables.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        let mut expr = Self::new();
        for var in vars {
            expr.add_linear(var, 1.0);
        }
        expr
    }

    /// `(Σ x - target)²` expanded over distinct binary variables:
    /// `Σ (1 - 2t)·xᵢ + 2·Σᵢ<ⱼ xᵢ·xⱼ + t²`.
    pub fn squared_deviation(vars: &[VarId], target: f64) -> Self {
        let mut expr = Self::new();
        for (i, &a) in vars.iter().enumerate() {
            expr.add_linear(a, 1.0 - 2.0 * target);
            for &b in &vars[i + 1..] {
                expr.add_quadratic(a, b, 2.0);
            }
        }
        expr.constant = target * target;
        expr
    }

    pub fn add_linear(&mut self, var: VarId, coef: f64) {
        self.linear.push(LinearTerm { var, coef });
    }

    /// Adds `coef·a·b`; `a == b` folds into the linear part.
    pub fn add_quadratic(&mut self, a: VarId, b: VarId, coef: f64) {
        if a == b {
            self.add_linear(a, coef);
        } else {
            self.quadratic.push(QuadraticTerm { a, b, coef });
        }
    }

    /// Adds `coef·(Σ a)·(Σ b)`.
    pub fn add_product(&mut self, a: &[VarId], b: &[VarId], coef: f64) {
        for &x in a {
            for &y in b {
                self.add_quadratic(x, y, coef);
            }
        }
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Appends every term of `other`.
    pub fn extend(&mut self, other: Expression) {
        self.linear.extend(other.linear);
        self.quadratic.extend(other.quadratic);
        self.constant += other.constant;
    }

    /// Multiplies every term by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        for t in &mut self.linear {
            t.coef *= factor;
        }
        for t in &mut self.quadratic {
            t.coef *= factor;
        }
        self.constant *= factor;
        self
    }

    /// Value under a dense sample. Variables outside the sample read 0.
    pub fn evaluate(&self, values: &[bool]) -> f64 {
        let on = |v: VarId| values.get(v.0).copied().unwrap_or(false);
        let linear: f64 = self
            .linear
            .iter()
            .filter(|t| on(t.var))
            .map(|t| t.coef)
            .sum();
        let quadratic: f64 = self
            .quadratic
            .iter()
            .filter(|t| on(t.a) && on(t.b))
            .map(|t| t.coef)
            .sum();
        self.constant + linear + quadratic
    }

    #[inline]
    pub fn is_linear(&self) -> bool {
        self.quadratic.is_empty()
    }

    /// Number of terms, constant excluded.
    #[inline]
    pub fn term_count(&self) -> usize {
        self.linear.len() + self.quadratic.len()
    }
}

/// Constraint comparison sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sense {
    /// `lhs <= rhs`
    Le,
    /// `lhs >= rhs`
    Ge,
    /// `lhs == rhs`
    Eq,
}

impl Sense {
    /// How far `lhs` is from satisfying the comparison (0 when it holds).
    pub fn deficit(self, lhs: f64, rhs: f64) -> f64 {
        let d = match self {
            Sense::Le => lhs - rhs,
            Sense::Ge => rhs - lhs,
            Sense::Eq => (lhs - rhs).abs(),
        };
        if d > TOLERANCE {
            d
        } else {
            0.0
        }
    }

    #[inline]
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        self.deficit(lhs, rhs) == 0.0
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "==",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(n: usize) -> Vec<VarId> {
        (0..n).map(VarId).collect()
    }

    #[test]
    fn test_sum() {
        let e = Expression::sum(vars(3));
        assert!((e.evaluate(&[true, false, true]) - 2.0).abs() < 1e-10);
        assert!(e.is_linear());
    }

    #[test]
    fn test_squared_deviation_matches_direct_square() {
        let v = vars(4);
        for target in [0.0, 1.5, 2.0, 3.25] {
            let e = Expression::squared_deviation(&v, target);
            for mask in 0u32..16 {
                let sample: Vec<bool> = (0..4).map(|i| mask & (1 << i) != 0).collect();
                let count = sample.iter().filter(|&&b| b).count() as f64;
                let direct = (count - target).powi(2);
                assert!(
                    (e.evaluate(&sample) - direct).abs() < 1e-10,
                    "mask {mask} target {target}"
                );
            }
        }
    }

    #[test]
    fn test_product_folds_self_terms() {
        let mut e = Expression::new();
        e.add_product(&[VarId(0)], &[VarId(0), VarId(1)], 1.0);
        assert_eq!(e.linear.len(), 1);
        assert_eq!(e.quadratic.len(), 1);
        assert!((e.evaluate(&[true, true]) - 2.0).abs() < 1e-10);
        assert!((e.evaluate(&[true, false]) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_scaled_and_extend() {
        let mut e = Expression::sum(vars(2)).scaled(3.0);
        e.extend(Expression::squared_deviation(&[VarId(2)], 1.0));
        // 3·(1 + 1) + (0 - 1)² = 7
        assert!((e.evaluate(&[true, true, false]) - 7.0).abs() < 1e-10);
    }

    #[test]
    fn test_missing_variables_read_false() {
        let e = Expression::sum([VarId(10)]);
        assert!(e.evaluate(&[true]).abs() < 1e-10);
    }

    #[test]
    fn test_sense() {
        assert!(Sense::Le.holds(2.0, 2.0));
        assert!(!Sense::Le.holds(3.0, 2.0));
        assert!((Sense::Ge.deficit(1.0, 3.0) - 2.0).abs() < 1e-10);
        assert!(Sense::Eq.holds(1.0 + 1e-12, 1.0));
        assert!((Sense::Eq.deficit(0.0, 1.0) - 1.0).abs() < 1e-10);
    }
}
