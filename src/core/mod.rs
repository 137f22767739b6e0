mod engine;
mod types;

pub use engine::{BreakEvenCurve, PAYOUT_END_AGE, PAYOUT_START_AGE, project, subsidy};
pub use types::{
    AgeBracket, BracketTable, ContributionYear, CurvePoint, Inputs, ProjectionError,
    ProjectionResult,
};
