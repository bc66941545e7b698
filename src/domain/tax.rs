use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Inclusive upper bound of the bracket; `None` for the top bracket.
    pub up_to: Option<f64>,
    pub rate: f64,
}

/// Progressive corporate income tax schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRegime {
    pub brackets: Vec<TaxBracket>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxAssessment {
    pub tax_owed: f64,
    pub applied_rate: String,
}

impl Default for TaxRegime {
    /// Dutch vennootschapsbelasting: 19% up to 200k, 25.8% above.
    fn default() -> Self {
        Self {
            brackets: vec![
                TaxBracket {
                    up_to: Some(200_000.0),
                    rate: 0.19,
                },
                TaxBracket {
                    up_to: None,
                    rate: 0.258,
                },
            ],
        }
    }
}

impl TaxRegime {
    pub fn validate(&self) -> Result<()> {
        if self.brackets.is_empty() {
            return Err(AppError::ConfigError(
                "Tax regime needs at least one bracket".to_string(),
            ));
        }
        let mut previous = 0.0;
        for (idx, bracket) in self.brackets.iter().enumerate() {
            if !(0.0..=1.0).contains(&bracket.rate) {
                return Err(AppError::ConfigError(format!(
                    "Tax bracket {} has rate {} outside 0..1",
                    idx + 1,
                    bracket.rate
                )));
            }
            let is_last = idx + 1 == self.brackets.len();
            match bracket.up_to {
                None if !is_last => {
                    return Err(AppError::ConfigError(
                        "Only the last tax bracket may be unbounded".to_string(),
                    ));
                }
                Some(limit) if limit <= previous => {
                    return Err(AppError::ConfigError(format!(
                        "Tax bracket limits must ascend (bracket {} ends at {})",
                        idx + 1,
                        limit
                    )));
                }
                Some(limit) => previous = limit,
                None => {}
            }
        }
        Ok(())
    }

    pub fn assess(&self, net_taxable_income: f64) -> TaxAssessment {
        if net_taxable_income <= 0.0 || self.brackets.is_empty() {
            return TaxAssessment {
                tax_owed: 0.0,
                applied_rate: "0%".to_string(),
            };
        }

        let first = &self.brackets[0];
        if first.up_to.map_or(true, |limit| net_taxable_income <= limit) {
            return TaxAssessment {
                tax_owed: net_taxable_income * first.rate,
                applied_rate: format!("{:.1}%", first.rate * 100.0),
            };
        }

        let mut tax_owed = 0.0;
        let mut lower = 0.0;
        for bracket in &self.brackets {
            let upper = bracket.up_to.unwrap_or(f64::INFINITY);
            if net_taxable_income > lower {
                tax_owed += (net_taxable_income.min(upper) - lower) * bracket.rate;
            }
            lower = upper;
        }
        // Income above a bounded top bracket stays at that bracket's rate.
        if let Some(last) = self.brackets.last() {
            if let Some(limit) = last.up_to {
                if net_taxable_income > limit {
                    tax_owed += (net_taxable_income - limit) * last.rate;
                }
            }
        }

        let effective_rate = tax_owed / net_taxable_income * 100.0;
        TaxAssessment {
            tax_owed,
            applied_rate: format!("Progressive (Effective: {:.1}%)", effective_rate),
        }
    }
}
