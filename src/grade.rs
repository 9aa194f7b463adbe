//! Letter grades shared by the readability grader, the rights assessor and the URI engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter grade. `A` is the best outcome for the user, `F` the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
    /// Not enough input to grade.
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score (0..=100, higher is better) to letter thresholds.
/// A score earns the first letter whose minimum it reaches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeScale {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl GradeScale {
    /// Scale used for the User Rights Index; a neutral 50 lands on C.
    pub const URI: GradeScale = GradeScale {
        a: 85.0,
        b: 70.0,
        c: 50.0,
        d: 35.0,
    };

    /// Scale used for the overall rights score.
    pub const RIGHTS: GradeScale = GradeScale {
        a: 85.0,
        b: 75.0,
        c: 65.0,
        d: 50.0,
    };

    pub fn grade(&self, score: f64) -> Grade {
        if !score.is_finite() {
            return Grade::NotApplicable;
        }
        if score >= self.a {
            Grade::A
        } else if score >= self.b {
            Grade::B
        } else if score >= self.c {
            Grade::C
        } else if score >= self.d {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn validate(&self, name: &str) -> anyhow::Result<()> {
        let ordered = self.a > self.b && self.b > self.c && self.c > self.d;
        let in_range = [self.a, self.b, self.c, self.d]
            .iter()
            .all(|v| v.is_finite() && (0.0..=100.0).contains(v));
        if !ordered || !in_range {
            anyhow::bail!(
                "{name} grade scale must be strictly descending within 0..=100 (got a={}, b={}, c={}, d={})",
                self.a,
                self.b,
                self.c,
                self.d
            );
        }
        Ok(())
    }
}

/// Round to two decimals, the precision used for every reported score.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_scale_puts_neutral_on_c() {
        assert_eq!(GradeScale::URI.grade(50.0), Grade::C);
        assert_eq!(GradeScale::URI.grade(85.0), Grade::A);
        assert_eq!(GradeScale::URI.grade(69.99), Grade::C);
        assert_eq!(GradeScale::URI.grade(0.0), Grade::F);
    }

    #[test]
    fn non_finite_score_is_not_graded() {
        assert_eq!(GradeScale::RIGHTS.grade(f64::NAN), Grade::NotApplicable);
    }

    #[test]
    fn grade_serializes_as_letter() {
        let v = serde_json::to_value([Grade::B, Grade::NotApplicable]).unwrap();
        assert_eq!(v, serde_json::json!(["B", "N/A"]));
    }

    #[test]
    fn unordered_scale_is_rejected() {
        let bad = GradeScale {
            a: 50.0,
            b: 70.0,
            c: 40.0,
            d: 10.0,
        };
        assert!(bad.validate("test").is_err());
        assert!(GradeScale::URI.validate("uri").is_ok());
    }
}
