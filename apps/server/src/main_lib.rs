use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    auth::{Argon2PasswordHasher, AuthManager},
    config::Config,
    rate_limit::LoginRateLimiter,
    secrets::ChaChaTokenCipher,
};
use kgiq_connect::{PlaidClient, PlaidConfig};
use kgiq_core::{
    attribution::{AttributionService, AttributionServiceTrait},
    bank::{
        BankAccountService, BankAccountServiceTrait, BankDataProvider, SyncService,
        SyncServiceTrait, TokenCipher, TransactionService, TransactionServiceTrait,
    },
    budget::{BudgetService, BudgetServiceTrait},
    dashboard::{DashboardService, DashboardServiceTrait},
    families::{
        AuthService, AuthServiceTrait, FamilyRepositoryTrait, FamilyService, FamilyServiceTrait,
        PasswordHasherTrait,
    },
    income::{IncomeService, IncomeServiceTrait},
    payments::{PaymentService, PaymentServiceTrait},
    reports::{ReportService, ReportServiceTrait},
};
use kgiq_storage_sqlite::{
    db, AttributionRepository, BankAccountRepository, BankConnectionRepository, BudgetRepository,
    FamilyRepository, IncomeRepository, PaymentRepository, ReportRepository,
    TransactionRepository,
};

pub struct AppState {
    pub auth: Arc<AuthManager>,
    pub login_limiter: Arc<LoginRateLimiter>,
    pub auth_service: Arc<dyn AuthServiceTrait>,
    pub family_service: Arc<dyn FamilyServiceTrait>,
    /// Used by the scheduler to walk every family.
    pub family_repository: Arc<dyn FamilyRepositoryTrait>,
    pub account_service: Arc<dyn BankAccountServiceTrait>,
    pub transaction_service: Arc<dyn TransactionServiceTrait>,
    pub sync_service: Arc<dyn SyncServiceTrait>,
    pub income_service: Arc<dyn IncomeServiceTrait>,
    pub payment_service: Arc<dyn PaymentServiceTrait>,
    pub attribution_service: Arc<dyn AttributionServiceTrait>,
    pub budget_service: Arc<dyn BudgetServiceTrait>,
    pub report_service: Arc<dyn ReportServiceTrait>,
    pub dashboard_service: Arc<dyn DashboardServiceTrait>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("KGIQ_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

fn build_provider(config: &Config) -> anyhow::Result<Option<Arc<dyn BankDataProvider>>> {
    let Some(plaid) = &config.plaid else {
        tracing::warn!("PLAID_CLIENT_ID/PLAID_SECRET not set; bank sync is disabled");
        return Ok(None);
    };
    let client = PlaidClient::new(PlaidConfig::new(
        plaid.client_id.clone(),
        plaid.secret.clone(),
        plaid.environment,
    ))?;
    Ok(Some(Arc::new(client)))
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = config.db_path.clone();
    tracing::info!("Database path in use: {}", db_path);
    let (pool, writer) = db::open(&db_path)?;

    let family_repo = Arc::new(FamilyRepository::new(pool.clone(), writer.clone()));
    let account_repo = Arc::new(BankAccountRepository::new(pool.clone(), writer.clone()));
    let connection_repo = Arc::new(BankConnectionRepository::new(pool.clone(), writer.clone()));
    let transaction_repo = Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
    let income_repo = Arc::new(IncomeRepository::new(pool.clone(), writer.clone()));
    let payment_repo = Arc::new(PaymentRepository::new(pool.clone(), writer.clone()));
    let attribution_repo = Arc::new(AttributionRepository::new(pool.clone(), writer.clone()));
    let budget_repo = Arc::new(BudgetRepository::new(pool.clone(), writer.clone()));
    let report_repo = Arc::new(ReportRepository::new(pool.clone(), writer.clone()));

    let hasher: Arc<dyn PasswordHasherTrait> = Arc::new(Argon2PasswordHasher);
    let auth_service = Arc::new(AuthService::new(family_repo.clone(), hasher.clone()));
    let family_service = Arc::new(FamilyService::new(family_repo.clone(), hasher));

    let cipher: Arc<dyn TokenCipher> = Arc::new(ChaChaTokenCipher::new(&config.secret_key)?);
    let sync_service = Arc::new(SyncService::new(
        connection_repo,
        build_provider(config)?,
        cipher,
    ));

    let account_service: Arc<dyn BankAccountServiceTrait> =
        Arc::new(BankAccountService::new(account_repo.clone()));
    let transaction_service = Arc::new(TransactionService::new(
        transaction_repo.clone(),
        account_repo.clone(),
        budget_repo.clone(),
    ));
    let income_service: Arc<dyn IncomeServiceTrait> =
        Arc::new(IncomeService::new(income_repo.clone()));
    let payment_service: Arc<dyn PaymentServiceTrait> = Arc::new(PaymentService::new(
        payment_repo.clone(),
        budget_repo.clone(),
    ));
    let attribution_service = Arc::new(AttributionService::new(
        attribution_repo,
        payment_repo.clone(),
        income_repo.clone(),
    ));
    let budget_service: Arc<dyn BudgetServiceTrait> = Arc::new(BudgetService::new(
        budget_repo.clone(),
        income_repo.clone(),
        transaction_repo.clone(),
    ));
    let report_service = Arc::new(ReportService::new(
        report_repo,
        income_repo,
        payment_repo,
        transaction_repo.clone(),
        account_repo,
        budget_repo,
    ));
    let dashboard_service = Arc::new(DashboardService::new(
        account_service.clone(),
        payment_service.clone(),
        income_service.clone(),
        budget_service.clone(),
        transaction_repo,
    ));

    let auth = Arc::new(AuthManager::new(
        &config.jwt_secret,
        config.access_token_ttl,
        config.refresh_token_ttl,
    ));
    let login_limiter = Arc::new(LoginRateLimiter::new(
        config.login_max_attempts,
        config.login_window,
    ));

    Ok(Arc::new(AppState {
        auth,
        login_limiter,
        auth_service,
        family_service,
        family_repository: family_repo,
        account_service,
        transaction_service,
        sync_service,
        income_service,
        payment_service,
        attribution_service,
        budget_service,
        report_service,
        dashboard_service,
        db_path,
    }))
}
