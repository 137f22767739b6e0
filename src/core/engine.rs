use super::types::{BracketTable, CurvePoint, Inputs, ProjectionError, ProjectionResult};

/// Fixed actuarial divisor converting the final account balance into a
/// monthly annuity (139 payout months for retirement at 60).
const ANNUITY_DIVISOR: f64 = 139.0;

/// Government subsidy tiers as (minimum qualifying deposit, subsidy),
/// highest threshold first so the first match wins.
const SUBSIDY_TIERS: [(f64, f64); 3] = [(800.0, 80.0), (500.0, 50.0), (350.0, 30.0)];

/// Contribution years beyond this count earn the long-term bonus.
const LONG_TERM_THRESHOLD_YEARS: u32 = 15;

/// Monthly base-pension increments for the older payout brackets.
const BRACKET_65_INCREMENT: f64 = 5.0;
const BRACKET_75_INCREMENT: f64 = 10.0;

pub const PAYOUT_START_AGE: u32 = 60;
pub const PAYOUT_END_AGE: u32 = 90;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Tiered government top-up for one qualifying contribution year.
pub fn subsidy(amount: f64) -> f64 {
    SUBSIDY_TIERS
        .iter()
        .find(|(threshold, _)| amount >= *threshold)
        .map(|(_, value)| *value)
        .unwrap_or(0.0)
}

/// Projects the retirement payout for one contribution schedule.
///
/// Interest is credited to the pre-existing balance before the year's own
/// deposit and subsidy are added, so a deposit earns nothing in its own
/// year and the final-year deposit compounds zero times. Years with a zero
/// amount still accrue interest but add no deposit, no subsidy, and do not
/// count toward the contribution-year total.
pub fn project(inputs: &Inputs) -> Result<ProjectionResult, ProjectionError> {
    validate(inputs)?;

    let mut balance = inputs.opening_balance;
    for year in &inputs.contributions {
        balance *= 1.0 + inputs.annual_interest_rate;
        if year.amount > 0.0 {
            balance += year.amount + subsidy(year.amount);
        }
    }

    let future_pay_years = inputs
        .contributions
        .iter()
        .filter(|year| year.amount > 0.0)
        .count() as u32;
    let total_years = inputs
        .past_years
        .checked_add(future_pay_years)
        .ok_or_else(|| {
            ProjectionError::InvalidInput(
                "past_years is too large to combine with the contribution schedule".to_string(),
            )
        })?;

    let monthly_personal_annuity = balance / ANNUITY_DIVISOR;
    let long_term_bonus = if total_years > LONG_TERM_THRESHOLD_YEARS {
        f64::from(total_years - LONG_TERM_THRESHOLD_YEARS) * inputs.bonus_rate_per_year
    } else {
        0.0
    };
    let base_total = inputs.base_pension + long_term_bonus;

    let base_by_bracket = BracketTable {
        from_60: base_total,
        from_65: base_total + BRACKET_65_INCREMENT,
        from_75: base_total + BRACKET_75_INCREMENT,
    };
    let total_by_bracket = BracketTable {
        from_60: base_by_bracket.from_60 + monthly_personal_annuity,
        from_65: base_by_bracket.from_65 + monthly_personal_annuity,
        from_75: base_by_bracket.from_75 + monthly_personal_annuity,
    };

    Ok(ProjectionResult {
        total_years,
        final_balance: balance,
        monthly_personal_annuity,
        long_term_bonus,
        base_by_bracket,
        total_by_bracket,
    })
}

fn validate(inputs: &Inputs) -> Result<(), ProjectionError> {
    for (name, value) in [
        ("opening_balance", inputs.opening_balance),
        ("base_pension", inputs.base_pension),
        ("bonus_rate_per_year", inputs.bonus_rate_per_year),
        ("annual_interest_rate", inputs.annual_interest_rate),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ProjectionError::InvalidInput(format!(
                "{name} must be finite and >= 0"
            )));
        }
    }

    for (index, year) in inputs.contributions.iter().enumerate() {
        if !year.amount.is_finite() || year.amount < 0.0 {
            return Err(ProjectionError::InvalidInput(format!(
                "contribution amount for year {index} must be finite and >= 0"
            )));
        }
    }

    Ok(())
}

/// Cumulative payout curve over ages 60..=90 for one projection result.
///
/// A lazy, finite iterator of 31 `(age, cumulative)` points. Each age's
/// monthly total is the flat personal annuity plus the base pension for
/// that age's bracket, paid twelve times per year.
#[derive(Debug, Clone, Copy)]
pub struct BreakEvenCurve {
    monthly_annuity: f64,
    base: BracketTable,
    final_balance: f64,
    next_age: u32,
    cumulative: f64,
}

impl BreakEvenCurve {
    pub fn new(result: &ProjectionResult) -> Self {
        Self {
            monthly_annuity: result.monthly_personal_annuity,
            base: result.base_by_bracket,
            final_balance: result.final_balance,
            next_age: PAYOUT_START_AGE,
            cumulative: 0.0,
        }
    }

    /// Fresh copy positioned back at age 60, however far this one has
    /// advanced.
    pub fn restarted(&self) -> Self {
        Self {
            next_age: PAYOUT_START_AGE,
            cumulative: 0.0,
            ..*self
        }
    }

    /// First age whose cumulative payout reaches the final account
    /// balance, or `None` when the 90-age horizon is exhausted without
    /// crossing it.
    pub fn break_even_age(&self) -> Option<u32> {
        self.restarted()
            .find(|point| point.cumulative >= self.final_balance)
            .map(|point| point.age)
    }
}

impl Iterator for BreakEvenCurve {
    type Item = CurvePoint;

    fn next(&mut self) -> Option<CurvePoint> {
        if self.next_age > PAYOUT_END_AGE {
            return None;
        }
        let age = self.next_age;
        self.next_age += 1;

        let monthly_total = self.monthly_annuity + self.base.for_age(age);
        self.cumulative += monthly_total * MONTHS_PER_YEAR;
        Some(CurvePoint {
            age,
            cumulative: self.cumulative,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (PAYOUT_END_AGE + 1).saturating_sub(self.next_age) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BreakEvenCurve {}
