//! Seeder for exportflow development and testing.
//!
//! Builds the workflow engine from configuration, then populates an in-memory
//! ledger with users, region mode mappings, and sample export cases driven
//! through the workflow. Every committed event is logged.
//!
//! Usage: cargo run --bin seeder

mod lifecycle;

use std::sync::Arc;

use anyhow::Context;
use exportflow_core::clock::{Clock, SystemClock};
use exportflow_core::documents::{
    DocumentKind, DocumentPolicy, DocumentService, ExportMode, RegionModeMapping,
};
use exportflow_core::workflow::{
    CapabilityMap, NewCase, Operation, TransitionPayload, TransitionTable, TransitionTableSpec,
    WorkflowEngine,
};
use exportflow_ledger::repositories::{NewUser, SkippedRecordCounter};
use exportflow_ledger::{
    CaseQueries, CaseRepository, DocumentRepository, MemoryLedger, StaticIdentity,
    TracingEventSink, UserRegistry,
};
use exportflow_shared::config::{WorkflowConfig, load_document};
use exportflow_shared::{AppConfig, CaseId, UserId};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const REGIONS: [(&str, ExportMode); 4] = [
    ("Sidama", ExportMode::Vertical),
    ("Yirgacheffe", ExportMode::Vertical),
    ("Jimma", ExportMode::Horizontal),
    ("Harrar", ExportMode::Horizontal),
];

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = build_engine(&config.workflow, Arc::clone(&clock))?;
    let ledger = Arc::new(MemoryLedger::new(
        Arc::clone(&clock),
        Arc::new(TracingEventSink),
    ));

    let cases = CaseRepository::new(Arc::clone(&ledger), engine);
    let documents = DocumentRepository::new(
        cases.clone(),
        DocumentService::new(
            Arc::clone(cases.engine().capabilities()),
            DocumentPolicy::default(),
            Arc::clone(&clock),
        ),
    );
    let users = UserRegistry::new(Arc::clone(&ledger), clock);

    info!("Seeding users...");
    seed_users(&users)?;

    info!("Seeding region mode mappings...");
    seed_regions(&documents)?;

    info!(count = config.seeder.sample_cases, "Seeding export cases...");
    for sequence in 1..=config.seeder.sample_cases {
        seed_case(&cases, &documents, sequence)
            .with_context(|| format!("failed to seed case {sequence}"))?;
    }

    let skipped = Arc::new(SkippedRecordCounter::new());
    let queries = CaseQueries::new(Arc::clone(&ledger), skipped.clone());
    let report = queries.mode_usage_report(chrono::Utc::now())?;
    info!(
        total = report.total_exports,
        vertical = report.vertical_mode,
        vertical_pct = %report.vertical_percentage,
        horizontal = report.horizontal_mode,
        horizontal_pct = %report.horizontal_percentage,
        "Mode usage"
    );
    info!(records = ledger.len()?, skipped = skipped.count(), "Seeding complete!");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Builds the engine from the configured table and organizations, falling
/// back to the standard ones.
fn build_engine(config: &WorkflowConfig, clock: Arc<dyn Clock>) -> anyhow::Result<WorkflowEngine> {
    let table = match &config.table_file {
        Some(path) => {
            let spec: TransitionTableSpec = load_document(path)
                .with_context(|| format!("failed to read transition table {}", path.display()))?;
            TransitionTable::try_from(spec).context("invalid transition table")?
        }
        None => TransitionTable::standard(),
    };
    let capabilities = if config.organizations.is_empty() {
        CapabilityMap::standard()
    } else {
        CapabilityMap::from_entries(
            config
                .organizations
                .iter()
                .map(|org| (org.msp_id.clone(), org.capabilities.clone())),
        )
        .context("invalid organization capabilities")?
    };
    info!(rules = table.len(), organizations = capabilities.len(), "Workflow engine ready");
    Ok(WorkflowEngine::new(
        Arc::new(table),
        Arc::new(capabilities),
        clock,
    ))
}

fn seed_users(users: &UserRegistry<MemoryLedger>) -> anyhow::Result<()> {
    let seeds = [
        ("USR-ADMIN", "admin", "admin@exportflow.dev", "AdminMSP", "administrator"),
        ("USR-EXP-1", "exporter.one", "exporter@exportflow.dev", "ExporterMSP", "exporter"),
        ("USR-ECTA-1", "ecta.inspector", "inspector@exportflow.dev", "ECTAMSP", "inspector"),
    ];
    for (id, username, email, organization, role) in seeds {
        users.register(NewUser {
            id: UserId::new(id),
            username: username.to_string(),
            email: email.to_string(),
            organization_id: organization.to_string(),
            role: role.to_string(),
        })?;
    }
    Ok(())
}

fn seed_regions(documents: &DocumentRepository<MemoryLedger>) -> anyhow::Result<()> {
    let admin = StaticIdentity::new("AdminMSP", "seeder");
    for (region, mode) in REGIONS {
        documents.store_region_mapping(
            &admin,
            &RegionModeMapping {
                region: region.to_string(),
                recommended_mode: mode,
                notes: None,
            },
        )?;
    }
    Ok(())
}

/// Quantity for the `sequence`th case. Cycles through 800 lot sizes so any
/// sequence stays within the quantity limit.
fn sample_quantity(sequence: u32) -> Decimal {
    Decimal::from(1200 * (sequence % 800 + 1))
}

/// Creates one case. Odd cases stop after submission; even cases run to
/// completion.
fn seed_case(
    cases: &CaseRepository<MemoryLedger>,
    documents: &DocumentRepository<MemoryLedger>,
    sequence: u32,
) -> anyhow::Result<()> {
    let exporter = StaticIdentity::new("ExporterMSP", "seeder");
    let case_id = format!("EXP-SEED-{sequence:03}");
    let quantity = sample_quantity(sequence);
    let estimated_value = quantity * Decimal::new(540, 2);
    cases.create(
        &exporter,
        NewCase {
            export_id: CaseId::new(case_id.clone()),
            exporter_id: format!("EXPORTER-{}", sequence % 3 + 1),
            exporter_name: "Seeder Coffee Exporters".to_string(),
            coffee_type: "Arabica Washed".to_string(),
            quantity,
            destination_country: "Germany".to_string(),
            estimated_value,
        },
    )?;

    let (region, _) = REGIONS[sequence as usize % REGIONS.len()];
    let mode = documents.recommended_mode(region)?;
    documents.select_mode(&exporter, &case_id, mode, region)?;
    for kind in DocumentKind::ALL.into_iter().filter(|k| k.is_required_for(mode)) {
        documents.upload(&exporter, &case_id, kind, lifecycle::SAMPLE_CID)?;
    }

    cases.transition(&exporter, &case_id, Operation::Submit, &TransitionPayload::new())?;
    if sequence % 2 == 1 {
        return Ok(());
    }
    for step in lifecycle::forward_steps(sequence, estimated_value) {
        let identity = StaticIdentity::new(step.organization, "seeder");
        cases.transition(&identity, &case_id, step.operation, &step.payload)?;
    }
    Ok(())
}
