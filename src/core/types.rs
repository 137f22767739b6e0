use serde::Serialize;
use thiserror::Error;

/// One projection year's deposit into the personal account, ordered
/// chronologically from the current year through the retirement year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionYear {
    pub amount: f64,
}

#[derive(Debug, Clone)]
pub struct Inputs {
    pub past_years: u32,
    pub opening_balance: f64,
    pub base_pension: f64,
    pub bonus_rate_per_year: f64,
    pub annual_interest_rate: f64,
    pub contributions: Vec<ContributionYear>,
}

/// Payout age brackets: 60-64, 65-74, and 75 upward.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AgeBracket {
    From60,
    From65,
    From75,
}

impl AgeBracket {
    pub fn for_age(age: u32) -> Self {
        if age >= 75 {
            AgeBracket::From75
        } else if age >= 65 {
            AgeBracket::From65
        } else {
            AgeBracket::From60
        }
    }
}

/// One monthly value per payout bracket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketTable {
    pub from_60: f64,
    pub from_65: f64,
    pub from_75: f64,
}

impl BracketTable {
    pub fn get(self, bracket: AgeBracket) -> f64 {
        match bracket {
            AgeBracket::From60 => self.from_60,
            AgeBracket::From65 => self.from_65,
            AgeBracket::From75 => self.from_75,
        }
    }

    pub fn for_age(self, age: u32) -> f64 {
        self.get(AgeBracket::for_age(age))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub total_years: u32,
    pub final_balance: f64,
    pub monthly_personal_annuity: f64,
    pub long_term_bonus: f64,
    pub base_by_bracket: BracketTable,
    pub total_by_bracket: BracketTable,
}

/// One point on the cumulative payout curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurvePoint {
    pub age: u32,
    pub cumulative: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("retirement year is already past; there are no future contribution years to plan")]
    RetirementAlreadyReached,
}
