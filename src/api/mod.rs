use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    BracketTable, BreakEvenCurve, ContributionYear, CurvePoint, Inputs, ProjectionError,
    ProjectionResult, project,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Retirement is assumed at this age; retire_year = birth_year + 60.
const RETIREMENT_AGE: u32 = 60;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliScheduleMode {
    Simple,
    Detailed,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiScheduleMode {
    Simple,
    #[serde(alias = "perYear", alias = "per_year")]
    Detailed,
}

impl From<ApiScheduleMode> for CliScheduleMode {
    fn from(value: ApiScheduleMode) -> Self {
        match value {
            ApiScheduleMode::Simple => CliScheduleMode::Simple,
            ApiScheduleMode::Detailed => CliScheduleMode::Detailed,
        }
    }
}

impl From<CliScheduleMode> for ApiScheduleMode {
    fn from(value: CliScheduleMode) -> Self {
        match value {
            CliScheduleMode::Simple => ApiScheduleMode::Simple,
            CliScheduleMode::Detailed => ApiScheduleMode::Detailed,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    current_year: Option<u32>,
    birth_year: Option<u32>,
    past_years: Option<u32>,
    #[serde(alias = "currentBalance")]
    opening_balance: Option<f64>,
    base_pension: Option<f64>,
    bonus_rate: Option<f64>,
    interest_rate: Option<f64>,

    #[serde(alias = "mode")]
    schedule_mode: Option<ApiScheduleMode>,
    #[serde(alias = "simplePersonal")]
    personal_amount: Option<f64>,
    #[serde(alias = "simpleChild")]
    child_amount: Option<f64>,
    yearly_amounts: Option<Vec<f64>>,
}

#[derive(Parser, Debug)]
#[command(
    name = "pension",
    about = "Resident pension payout projector (tiered subsidies, 139-month annuity, break-even curve)"
)]
struct Cli {
    #[arg(long, help = "Calendar year the projection starts from")]
    current_year: u32,
    #[arg(long, help = "Birth year; retirement is assumed at age 60")]
    birth_year: u32,
    #[arg(
        long,
        default_value_t = 0,
        help = "Contribution years already completed before the current year"
    )]
    past_years: u32,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Personal account balance already accumulated"
    )]
    opening_balance: f64,
    #[arg(long, default_value_t = 220.0, help = "Monthly base pension at age 60")]
    base_pension: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Extra monthly base pension per contribution year beyond 15"
    )]
    bonus_rate: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Annual account interest rate in percent, e.g. 3"
    )]
    interest_rate: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliScheduleMode::Simple,
        help = "Schedule mode: one amount repeated every year, or a per-year list"
    )]
    schedule_mode: CliScheduleMode,
    #[arg(
        long,
        default_value_t = 5_000.0,
        help = "Personal deposit repeated every projected year (simple mode)"
    )]
    personal_amount: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Child top-up repeated every projected year (simple mode)"
    )]
    child_amount: f64,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Per-year deposit list (detailed mode); one entry per year through the retirement year"
    )]
    yearly_amounts: Option<Vec<f64>>,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: Inputs,
    schedule_mode: CliScheduleMode,
    retire_year: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    schedule_mode: ApiScheduleMode,
    retire_year: u32,
    projected_years: u32,
    total_years: u32,
    final_balance: f64,
    monthly_personal_annuity: f64,
    long_term_bonus: f64,
    base_by_bracket: BracketTable,
    total_by_bracket: BracketTable,
    break_even_age: Option<u32>,
    payout_curve: Vec<CurvePoint>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn invalid(msg: impl Into<String>) -> ProjectionError {
    ProjectionError::InvalidInput(msg.into())
}

fn build_request(cli: Cli) -> Result<ApiRequest, ProjectionError> {
    for (name, value) in [
        ("--opening-balance", cli.opening_balance),
        ("--base-pension", cli.base_pension),
        ("--bonus-rate", cli.bonus_rate),
        ("--personal-amount", cli.personal_amount),
        ("--child-amount", cli.child_amount),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(format!("{name} must be >= 0")));
        }
    }

    if !(0.0..=100.0).contains(&cli.interest_rate) {
        return Err(invalid("--interest-rate must be between 0 and 100"));
    }

    for (name, year) in [
        ("--current-year", cli.current_year),
        ("--birth-year", cli.birth_year),
    ] {
        if !(1900..=2200).contains(&year) {
            return Err(invalid(format!("{name} must be between 1900 and 2200")));
        }
    }

    if cli.past_years > 100 {
        return Err(invalid("--past-years must be <= 100"));
    }

    let retire_year = cli.birth_year + RETIREMENT_AGE;
    if retire_year < cli.current_year {
        return Err(ProjectionError::RetirementAlreadyReached);
    }
    // Includes the retirement year itself, matching the schedule the UI
    // renders one row per year for.
    let schedule_len = (retire_year - cli.current_year + 1) as usize;

    let contributions = match cli.schedule_mode {
        CliScheduleMode::Simple => {
            let amount = cli.personal_amount + cli.child_amount;
            vec![ContributionYear { amount }; schedule_len]
        }
        CliScheduleMode::Detailed => {
            let amounts = cli
                .yearly_amounts
                .ok_or_else(|| invalid("--yearly-amounts is required in detailed mode"))?;
            if amounts.len() != schedule_len {
                return Err(invalid(format!(
                    "--yearly-amounts must list exactly {schedule_len} years ({} through {retire_year})",
                    cli.current_year
                )));
            }
            amounts
                .into_iter()
                .map(|amount| ContributionYear { amount })
                .collect()
        }
    };

    Ok(ApiRequest {
        inputs: Inputs {
            past_years: cli.past_years,
            opening_balance: cli.opening_balance,
            base_pension: cli.base_pension,
            bonus_rate_per_year: cli.bonus_rate,
            annual_interest_rate: cli.interest_rate / 100.0,
            contributions,
        },
        schedule_mode: cli.schedule_mode,
        retire_year,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Pension projector HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return projection_error_response(err),
    };

    let result = match project(&request.inputs) {
        Ok(result) => result,
        Err(err) => return projection_error_response(err),
    };

    json_response(StatusCode::OK, build_project_response(&request, &result))
}

fn build_project_response(request: &ApiRequest, result: &ProjectionResult) -> ProjectResponse {
    let curve = BreakEvenCurve::new(result);
    ProjectResponse {
        schedule_mode: request.schedule_mode.into(),
        retire_year: request.retire_year,
        projected_years: request.inputs.contributions.len() as u32,
        total_years: result.total_years,
        final_balance: result.final_balance,
        monthly_personal_annuity: result.monthly_personal_annuity,
        long_term_bonus: result.long_term_bonus,
        base_by_bracket: result.base_by_bracket,
        total_by_bracket: result.total_by_bracket,
        break_even_age: curve.break_even_age(),
        payout_curve: curve.collect(),
    }
}

fn projection_error_response(err: ProjectionError) -> Response {
    let status = match err {
        ProjectionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ProjectionError::RetirementAlreadyReached => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, &err.to_string())
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, ProjectionError> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| ProjectionError::InvalidInput(format!("Invalid API JSON payload: {e}")))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectPayload) -> Result<ApiRequest, ProjectionError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_year {
        cli.current_year = v;
    }
    if let Some(v) = payload.birth_year {
        cli.birth_year = v;
    }
    if let Some(v) = payload.past_years {
        cli.past_years = v;
    }
    if let Some(v) = payload.opening_balance {
        cli.opening_balance = v;
    }
    if let Some(v) = payload.base_pension {
        cli.base_pension = v;
    }
    if let Some(v) = payload.bonus_rate {
        cli.bonus_rate = v;
    }
    if let Some(v) = payload.interest_rate {
        cli.interest_rate = v;
    }
    if let Some(v) = payload.schedule_mode {
        cli.schedule_mode = v.into();
    }
    if let Some(v) = payload.personal_amount {
        cli.personal_amount = v;
    }
    if let Some(v) = payload.child_amount {
        cli.child_amount = v;
    }
    if let Some(v) = payload.yearly_amounts {
        cli.yearly_amounts = Some(v);
    }

    build_request(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_year: 2025,
        birth_year: 1980,
        past_years: 0,
        opening_balance: 0.0,
        base_pension: 220.0,
        bonus_rate: 2.0,
        interest_rate: 3.0,
        schedule_mode: CliScheduleMode::Simple,
        personal_amount: 5_000.0,
        child_amount: 0.0,
        yearly_amounts: None,
    }
}
