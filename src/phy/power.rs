/// Convert dBm to linear power (milliwatts)
pub fn dbm_to_linear(dbm: f32) -> f32 {
    10f32.powf(dbm / 10.0)
}

/// Convert linear power (milliwatts) to dBm
///
/// Returns `None` when the power is zero, negative or NaN.
pub fn linear_to_dbm(linear: f32) -> Option<f32> {
    if linear > 0.0 {
        Some(10.0 * linear.log10())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert!((dbm_to_linear(0.0) - 1.0).abs() < 0.01);
        assert!((dbm_to_linear(10.0) - 10.0).abs() < 0.01);
        assert!((dbm_to_linear(20.0) - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_round_trip() {
        for dbm in [-90.0f32, -42.5, -3.0, 0.0, 7.25, 10.0, 30.0] {
            let back = linear_to_dbm(dbm_to_linear(dbm)).unwrap();
            assert!((back - dbm).abs() < 1e-3, "{} -> {}", dbm, back);
        }
    }

    #[test]
    fn test_non_positive_input() {
        assert_eq!(linear_to_dbm(0.0), None);
        assert_eq!(linear_to_dbm(-1.0), None);
        assert_eq!(linear_to_dbm(f32::NAN), None);
    }
}
