use crate::scoring::domain::Dimension;

pub(crate) const MAX_KEYWORDS_PER_HIT: usize = 8;

pub(crate) fn keywords(dimension: Dimension) -> &'static [&'static str] {
    match dimension {
        Dimension::DataInfrastructure => &[
            "data lake",
            "data warehouse",
            "etl",
            "pipeline",
            "spark",
            "snowflake",
            "databricks",
            "governance of data",
            "data quality",
            "master data",
            "metadata",
            "lineage",
        ],
        Dimension::AiGovernance => &[
            "model risk",
            "responsible ai",
            "ai governance",
            "policy",
            "compliance",
            "privacy",
            "security",
            "bias",
            "audit",
            "controls",
            "risk management",
        ],
        Dimension::TechnologyStack => &[
            "cloud",
            "aws",
            "azure",
            "gcp",
            "kubernetes",
            "mlops",
            "api",
            "microservice",
            "vector database",
            "llm",
            "cortex",
            "bedrock",
            "sagemaker",
        ],
        Dimension::TalentSkills => &[
            "data scientist",
            "machine learning engineer",
            "ml engineer",
            "data engineer",
            "ai engineer",
            "mlops",
            "analytics",
            "python",
            "sql",
        ],
        Dimension::LeadershipVision => &[
            "strategy",
            "roadmap",
            "executive",
            "ceo",
            "cio",
            "chief data",
            "chief ai",
            "investment",
            "transformation",
            "innovation",
        ],
        Dimension::UseCasePortfolio => &[
            "use case",
            "pilot",
            "production",
            "deployment",
            "predictive",
            "forecast",
            "recommendation",
            "fraud",
            "optimization",
            "automation",
            "genai",
        ],
        Dimension::CultureChange => &[
            "training",
            "change management",
            "culture",
            "adoption",
            "upskilling",
            "reskilling",
            "agile",
            "cross-functional",
            "center of excellence",
            "coe",
        ],
    }
}

/// Keywords of `dimension` found in already-lowercased text, in taxonomy order.
pub(crate) fn matched_keywords(lowered: &str, dimension: Dimension) -> Vec<&'static str> {
    keywords(dimension)
        .iter()
        .copied()
        .filter(|keyword| lowered.contains(keyword))
        .take(MAX_KEYWORDS_PER_HIT)
        .collect()
}
