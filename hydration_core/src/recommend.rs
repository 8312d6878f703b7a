//! Body-measurement helpers for choosing a daily goal.

use crate::{Error, Result};
use serde::Serialize;

/// Suggested intake per kilogram of body weight
pub const ML_PER_KG: f64 = 35.0;

/// WHO adult BMI categories
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

fn positive(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidMeasurement(format!(
            "{} must be a positive number, got {}",
            what, value
        )))
    }
}

/// Body-mass index from weight in kilograms and height in centimeters
pub fn bmi(weight_kg: f64, height_cm: f64) -> Result<f64> {
    let weight = positive(weight_kg, "weight")?;
    let height_m = positive(height_cm, "height")? / 100.0;
    Ok(weight / (height_m * height_m))
}

/// Daily goal suggested for a body weight
pub fn recommended_goal(weight_kg: f64) -> Result<f64> {
    Ok(positive(weight_kg, "weight")? * ML_PER_KG)
}
