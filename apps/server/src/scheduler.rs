//! Background jobs: overdue marking, scheduled reports and bank sync.

use std::sync::Arc;

use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use kgiq_core::utils::today_in;

use crate::main_lib::AppState;

/// Overdue marking and scheduled reports run hourly.
const HOUSEKEEPING_INTERVAL_SECS: u64 = 60 * 60;

/// Bank sync interval: 4 hours
const SYNC_INTERVAL_SECS: u64 = 4 * 60 * 60;

/// Initial delay before the first run so the server can finish starting
const INITIAL_DELAY_SECS: u64 = 60;

pub fn start_schedulers(state: Arc<AppState>) {
    let housekeeping_state = state.clone();
    tokio::spawn(async move {
        info!("Housekeeping scheduler started (hourly)");
        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;
        let mut ticker = interval(Duration::from_secs(HOUSEKEEPING_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            run_housekeeping(&housekeeping_state).await;
        }
    });

    if !state.sync_service.is_configured() {
        debug!("Bank sync scheduler not started: no provider configured");
        return;
    }
    tokio::spawn(async move {
        info!("Bank sync scheduler started (4-hour interval)");
        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;
        let mut ticker = interval(Duration::from_secs(SYNC_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            run_bank_sync(&state).await;
        }
    });
}

/// Marks overdue payments and runs due reports, each family on its local date.
pub async fn run_housekeeping(state: &Arc<AppState>) {
    let families = match state.family_repository.list_families() {
        Ok(families) => families,
        Err(e) => {
            warn!("Housekeeping skipped: cannot list families: {}", e);
            return;
        }
    };

    let mut overdue = 0;
    let mut reports = 0;
    for family in &families {
        let today = today_in(&family.timezone);
        match state.payment_service.mark_overdue(&family.id, today).await {
            Ok(count) => overdue += count,
            Err(e) => warn!("Marking overdue payments failed for family {}: {}", family.id, e),
        }
        match state.report_service.run_due(&family.id, today).await {
            Ok(count) => reports += count,
            Err(e) => warn!("Scheduled report run failed for family {}: {}", family.id, e),
        }
    }
    if overdue > 0 {
        info!("Updated {} payment statuses", overdue);
    }
    if reports > 0 {
        info!("Generated {} scheduled reports", reports);
    } else {
        debug!("No scheduled reports due");
    }
}

async fn run_bank_sync(state: &Arc<AppState>) {
    info!("Running scheduled bank sync...");
    match state.sync_service.sync_all().await {
        Ok(count) => info!("Scheduled bank sync completed: {} connections synced", count),
        Err(e) => warn!("Scheduled bank sync failed: {}", e),
    }
}
