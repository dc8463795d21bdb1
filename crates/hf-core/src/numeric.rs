use crate::HfError;

/// ln(10), used for every log10 <-> ln conversion.
pub const LN10: f64 = std::f64::consts::LN_10;

/// Lower bound for the exponent when converting ln-concentrations.
pub const LN_CONC_MIN: f64 = -103.0;

/// Upper bound for the exponent when converting ln-concentrations.
pub const LN_CONC_MAX: f64 = 81.0;

/// Ceiling for any concentration handled by the solver.
pub const CONC_MAX: f64 = 1.0e35;

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, HfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(HfError::NonFinite { what, value: v })
    }
}

pub fn ensure_len(actual: usize, expected: usize, what: &'static str) -> Result<(), HfError> {
    if actual == expected {
        Ok(())
    } else {
        Err(HfError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}

/// Concentration from its natural logarithm, with the exponent clamped to
/// `[LN_CONC_MIN, LN_CONC_MAX]` and the result to `[0, CONC_MAX]`.
#[inline]
pub fn exp_conc(ln_c: f64) -> f64 {
    if ln_c.is_nan() {
        return 0.0;
    }
    ln_c.clamp(LN_CONC_MIN, LN_CONC_MAX).exp().min(CONC_MAX)
}

/// Clamp a concentration into `[0, ceiling]`; NaN maps to zero.
#[inline]
pub fn clamp_conc(c: f64, ceiling: f64) -> f64 {
    if c.is_nan() || c <= 0.0 {
        0.0
    } else {
        c.min(ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(f64::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_len_reports_both_sizes() {
        assert!(ensure_len(3, 3, "charges").is_ok());
        let msg = ensure_len(2, 3, "charges").unwrap_err().to_string();
        assert!(msg.contains("expected 3"));
        assert!(msg.contains("got 2"));
    }

    #[test]
    fn exp_conc_clamps_exponent() {
        assert_eq!(exp_conc(500.0), CONC_MAX);
        assert_eq!(exp_conc(LN_CONC_MAX), CONC_MAX);
        let below: f64 = 80.0;
        assert_eq!(exp_conc(below), below.exp());
        assert!(exp_conc(below) < CONC_MAX);
        assert_eq!(exp_conc(-500.0), LN_CONC_MIN.exp());
        assert_eq!(exp_conc(f64::NAN), 0.0);
        assert!((exp_conc(0.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn clamp_conc_bounds() {
        assert_eq!(clamp_conc(-1.0, 20.0), 0.0);
        assert_eq!(clamp_conc(50.0, 20.0), 20.0);
        assert_eq!(clamp_conc(0.5, 20.0), 0.5);
    }
}
