use crate::infra::{build_scoring_service, parse_sector_mapping, ApiScoringService};
use clap::Args;
use org_air::config::AppConfig;
use org_air::error::AppError;
use org_air::intake::EvidenceImporter;
use org_air::scoring::portfolio::{all_in_range, expected_composite, validate_ranges, PORTFOLIO_PRIORS};
use org_air::scoring::router::RunResponse;
use org_air::scoring::{
    CompanyProfile, CompanyScoringInput, EvidenceItem, ModelVersion, OrgAirScore, RunSummary,
};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Collector CSV export with one evidence item per row
    #[arg(long)]
    pub(crate) evidence: PathBuf,
    /// Sector for a company, as COMPANY=SECTOR (repeatable)
    #[arg(long, value_parser = parse_sector_mapping)]
    pub(crate) sector_map: Vec<(String, String)>,
    /// Override the configured model version (org-air-v1 or org-air-v2)
    #[arg(long)]
    pub(crate) model_version: Option<ModelVersion>,
    /// Print the run as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the configured model version (org-air-v1 or org-air-v2)
    #[arg(long)]
    pub(crate) model_version: Option<ModelVersion>,
    /// Print the second pass as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        evidence,
        sector_map,
        model_version,
        json,
    } = args;

    let mut settings = AppConfig::load()?.scoring;
    if let Some(model_version) = model_version {
        settings.model_version = model_version;
    }
    let service = build_scoring_service(&settings)?;

    let import = EvidenceImporter::from_path(&evidence)?;
    let sectors: HashMap<String, String> = sector_map.into_iter().collect();
    let skipped_rows = import.skipped_rows;
    let companies: Vec<CompanyScoringInput> = import
        .companies
        .into_iter()
        .map(|company| {
            let sector = sectors.get(&company.company_id).cloned();
            company.into_input(sector.as_deref())
        })
        .collect();

    let summary = service.run_batch(companies)?;
    if json {
        print_json(summary);
    } else {
        println!(
            "Evidence import: {} ({} rows skipped)",
            evidence.display(),
            skipped_rows
        );
        render_summary(&summary);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        model_version,
        json,
    } = args;

    let mut settings = AppConfig::load()?.scoring;
    if let Some(model_version) = model_version {
        settings.model_version = model_version;
    }
    let service = build_scoring_service(&settings)?;

    println!("Org-AI-R portfolio demo ({})", settings.model_version);
    println!("\nCalibration priors (blended formula, neutral hiring)");
    for prior in &PORTFOLIO_PRIORS {
        println!(
            "  - {:<5} VR target {:>5.1} | position factor {:>5.2} | expected composite {:>6.2}",
            prior.ticker,
            prior.vr_target,
            prior.position_factor_target,
            expected_composite(prior)
        );
    }

    let first = service.run_batch(synthetic_portfolio())?;
    println!(
        "\nFirst pass seeds {} scores as confidence-band history",
        first.scores.len()
    );

    let second = service.run_batch(synthetic_portfolio())?;
    if json {
        print_json(second);
        return Ok(());
    }
    render_summary(&second);
    render_calibration(&second, &service);
    Ok(())
}

fn print_json(summary: RunSummary) {
    match serde_json::to_string_pretty(&RunResponse::from(summary)) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("Run payload unavailable: {err}"),
    }
}

fn render_summary(summary: &RunSummary) {
    let run = &summary.run;
    println!(
        "\nScoring run {} ({}) -> {} | {} scored | {} failed",
        run.id,
        run.model_version,
        run.status.label(),
        run.companies_scored,
        summary.failures.len()
    );
    println!(
        "  {:<8} {:<12} {:>9} {:<12} {:>6} {:>6} {:>15} {:<22}",
        "company", "sector", "composite", "band", "VR", "HR", "SEM band", "SEM method"
    );

    let mut scores: Vec<&OrgAirScore> = summary.scores.iter().collect();
    scores.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    for score in scores {
        let hr = score
            .hr_score
            .map(|hr| format!("{hr:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<8} {:<12} {:>9.2} {:<12} {:>6.1} {:>6} {:>15} {:<22}",
            score.company_id.0,
            score.breakdown.sector,
            score.composite_score,
            score.score_band.label(),
            score.vr_score,
            hr,
            format!("{:.1}-{:.1}", score.sem_lower, score.sem_upper),
            score.breakdown.sem.method_used.label()
        );
    }

    for failure in &summary.failures {
        println!("  ! {} failed: {}", failure.company_id, failure.error);
    }
}

fn render_calibration(summary: &RunSummary, service: &ApiScoringService) {
    let composites: BTreeMap<String, f64> = summary
        .scores
        .iter()
        .map(|score| (score.company_id.0.clone(), score.composite_score))
        .collect();
    let checks = validate_ranges(&composites);

    println!("\nCalibration check against expected composite ranges");
    for check in &checks {
        let score = check
            .score
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| "missing".to_string());
        println!(
            "  - {:<5} {:>7} in [{:.0}, {:.0}] -> {}",
            check.ticker,
            score,
            check.lower_bound,
            check.upper_bound,
            if check.in_range { "ok" } else { "outside" }
        );
    }
    println!(
        "  Portfolio {} under {}",
        if all_in_range(&checks) {
            "within calibration"
        } else {
            "needs recalibration"
        },
        service.engine().model_version()
    );
}

/// Five companies with evidence volume falling from NVDA to DG.
pub(crate) fn synthetic_portfolio() -> Vec<CompanyScoringInput> {
    const SECTORS: [(&str, &str); 5] = [
        ("NVDA", "Services"),
        ("JPM", "Financial"),
        ("WMT", "Consumer"),
        ("GE", "Industrials"),
        ("DG", "Consumer"),
    ];

    SECTORS
        .iter()
        .zip(PORTFOLIO_PRIORS.iter())
        .enumerate()
        .map(|(rank, ((ticker, sector), prior))| {
            let intensity = SECTORS.len() - 1 - rank;
            CompanyScoringInput::new(
                CompanyProfile::new(*ticker)
                    .in_sector(*sector)
                    .with_market_cap_percentile(prior.market_cap_percentile),
                synthetic_evidence(intensity),
            )
        })
        .collect()
}

fn synthetic_evidence(intensity: usize) -> Vec<EvidenceItem> {
    const ML_POSTINGS: [usize; 5] = [1, 3, 6, 10, 16];
    const DATA_POSTINGS: [usize; 5] = [1, 2, 3, 5, 7];
    let level = intensity.min(4);
    let mut items = Vec::new();

    for i in 0..ML_POSTINGS[level] {
        items.push(
            EvidenceItem::new(
                "jobs",
                format!("Machine learning engineer {i}: Python, PyTorch and MLOps on Kubernetes"),
            )
            .with_title("Machine Learning Engineer")
            .with_job_function("ml_engineering"),
        );
    }
    for i in 0..DATA_POSTINGS[level] {
        items.push(
            EvidenceItem::new(
                "jobs",
                format!("Data engineer {i} building Spark pipelines and the data lake"),
            )
            .with_job_function("data_engineering"),
        );
    }
    for _ in 0..level {
        items.push(EvidenceItem::new(
            "sec_item_1",
            "AI strategy and roadmap sponsored by the CEO; predictive use case deployment in production",
        ));
        items.push(EvidenceItem::new(
            "tech",
            "Cloud platform on AWS with Snowflake, a vector database and LLM APIs",
        ));
    }
    if level >= 2 {
        items.push(EvidenceItem::new(
            "sec_item_1a",
            "Responsible AI policy, model risk management and privacy controls overseen by audit",
        ));
    }
    if level >= 1 {
        items.push(EvidenceItem::new(
            "glassdoor_reviews",
            "Culture of experimentation and learning; leadership supports innovation",
        ));
    }
    items.push(EvidenceItem::new(
        "news",
        "Company outlines digital transformation priorities for the year",
    ));
    items
}
