use crate::errors::DecisionTreeError;
use std::fmt::Display;

// Validation
pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), DecisionTreeError> {
    if value.is_nan() || value < min || max < value {
        let ex_msg = format!("real value within range {} and {}", min, max);
        Err(DecisionTreeError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

pub fn validate_int_parameter(value: usize, min: usize, max: usize, parameter: &str) -> Result<(), DecisionTreeError> {
    if value < min || max < value {
        let ex_msg = format!("integer value within range {} and {}", min, max);
        Err(DecisionTreeError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Create a string of all available items.
pub fn items_to_strings<T: Display>(items: &[T]) -> String {
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

pub fn precision_round(n: f64, precision: i32) -> f64 {
    let p = (10.0_f64).powi(precision);
    (n * p).round() / p
}

/// `numerator / denominator`, zero when there is nothing to divide.
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_float_parameter() {
        assert!(validate_float_parameter(0.5, 0.0, 1.0, "x").is_ok());
        assert!(validate_float_parameter(1.5, 0.0, 1.0, "x").is_err());
        assert!(validate_float_parameter(f64::NAN, 0.0, 1.0, "x").is_err());
    }

    #[test]
    fn test_validate_int_parameter() {
        assert!(validate_int_parameter(2, 2, 10, "x").is_ok());
        match validate_int_parameter(1, 2, 10, "scale") {
            Err(DecisionTreeError::InvalidParameter(name, _, given)) => {
                assert_eq!(name, "scale");
                assert_eq!(given, "1");
            }
            _ => panic!("expected an invalid parameter error"),
        }
    }

    #[test]
    fn test_items_to_strings() {
        assert_eq!(items_to_strings(&["a", "b", "c"]), "a, b, c");
        assert_eq!(items_to_strings::<&str>(&[]), "");
    }

    #[test]
    fn test_precision_round_and_ratio() {
        assert_eq!(precision_round(0.123456, 3), 0.123);
        assert_eq!(ratio(1, 4), 0.25);
        assert_eq!(ratio(1, 0), 0.0);
    }
}
