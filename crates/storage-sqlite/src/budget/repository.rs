use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use kgiq_core::budget::{
    check_category_update, check_new_category, AllocationLine, BudgetAllocation, BudgetCategory,
    BudgetCategoryUpdate, BudgetRepositoryTrait, NewBudgetCategory,
};
use kgiq_core::errors::Error;
use kgiq_core::income::IncomeStatus;
use kgiq_core::Result;

use super::model::{BudgetAllocationDB, BudgetCategoryDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{OptionalRow, StorageError};
use crate::schema::{budget_allocations, budget_categories, income_events};

pub struct BudgetRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BudgetRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn load_categories(
    conn: &mut SqliteConnection,
    family: &str,
    include_inactive: bool,
) -> Result<Vec<BudgetCategory>> {
    let mut query = budget_categories::table
        .filter(budget_categories::family_id.eq(family))
        .into_boxed();
    if !include_inactive {
        query = query.filter(budget_categories::is_active.eq(true));
    }
    let rows = query
        .order((
            budget_categories::sort_order.asc(),
            budget_categories::name.asc(),
        ))
        .load::<BudgetCategoryDB>(conn)
        .map_err(StorageError::from)?;
    Ok(rows.into_iter().map(BudgetCategory::from).collect())
}

fn load_category(
    conn: &mut SqliteConnection,
    family: &str,
    category_id: &str,
) -> Result<BudgetCategoryDB> {
    budget_categories::table
        .filter(budget_categories::id.eq(category_id))
        .filter(budget_categories::family_id.eq(family))
        .first::<BudgetCategoryDB>(conn)
        .or_not_found("Budget category", category_id)
}

#[async_trait]
impl BudgetRepositoryTrait for BudgetRepository {
    fn list_categories(
        &self,
        family_id: &str,
        include_inactive: bool,
    ) -> Result<Vec<BudgetCategory>> {
        let mut conn = get_connection(&self.pool)?;
        load_categories(&mut conn, family_id, include_inactive)
    }

    fn get_category(&self, family_id: &str, category_id: &str) -> Result<BudgetCategory> {
        let mut conn = get_connection(&self.pool)?;
        load_category(&mut conn, family_id, category_id).map(BudgetCategory::from)
    }

    async fn create_category(
        &self,
        family_id: &str,
        category: NewBudgetCategory,
    ) -> Result<BudgetCategory> {
        let family_id = family_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BudgetCategory> {
                let active = load_categories(conn, &family_id, false)?;
                check_new_category(&active, &category)?;

                let next_order = active.iter().map(|c| c.sort_order + 1).max().unwrap_or(0);
                let now = Utc::now().naive_utc();
                let row = BudgetCategoryDB {
                    id: Uuid::new_v4().to_string(),
                    family_id,
                    name: category.name.trim().to_string(),
                    target_percentage: category.target_percentage.normalize().to_string(),
                    color: category.color,
                    sort_order: category.sort_order.unwrap_or(next_order),
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(budget_categories::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(BudgetCategory::from(row))
            })
            .await
    }

    async fn update_category(
        &self,
        family_id: &str,
        category_id: &str,
        update: BudgetCategoryUpdate,
    ) -> Result<BudgetCategory> {
        let family_id = family_id.to_string();
        let category_id = category_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BudgetCategory> {
                let current = BudgetCategory::from(load_category(conn, &family_id, &category_id)?);
                let active = load_categories(conn, &family_id, false)?;
                check_category_update(&current, &active, &update)?;

                let name = update
                    .name
                    .map(|n| n.trim().to_string())
                    .unwrap_or(current.name);
                let percentage = update
                    .target_percentage
                    .unwrap_or(current.target_percentage);
                let color = update.color.or(current.color);
                let is_active = update.is_active.unwrap_or(current.is_active);
                let now = Utc::now().naive_utc();

                diesel::update(budget_categories::table.find(&category_id))
                    .set((
                        budget_categories::name.eq(&name),
                        budget_categories::target_percentage
                            .eq(percentage.normalize().to_string()),
                        budget_categories::color.eq(&color),
                        budget_categories::is_active.eq(is_active),
                        budget_categories::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                load_category(conn, &family_id, &category_id).map(BudgetCategory::from)
            })
            .await
    }

    async fn deactivate_category(&self, family_id: &str, category_id: &str) -> Result<()> {
        let family_id = family_id.to_string();
        let category_id = category_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                load_category(conn, &family_id, &category_id)?;
                diesel::update(budget_categories::table.find(&category_id))
                    .set((
                        budget_categories::is_active.eq(false),
                        budget_categories::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn reorder_categories(
        &self,
        family_id: &str,
        ordered_ids: Vec<String>,
    ) -> Result<Vec<BudgetCategory>> {
        let family_id = family_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vec<BudgetCategory>> {
                let existing = load_categories(conn, &family_id, true)?;
                if let Some(unknown) = ordered_ids
                    .iter()
                    .find(|id| !existing.iter().any(|c| &c.id == *id))
                {
                    return Err(Error::invalid_input(format!(
                        "Budget category '{}' does not exist",
                        unknown
                    )));
                }

                // Categories missing from the list keep their relative order
                // after the listed ones.
                let mut positions: HashMap<&str, i32> = HashMap::new();
                for (index, id) in ordered_ids.iter().enumerate() {
                    positions.insert(id.as_str(), index as i32);
                }
                let mut next = ordered_ids.len() as i32;
                for category in &existing {
                    if !positions.contains_key(category.id.as_str()) {
                        positions.insert(category.id.as_str(), next);
                        next += 1;
                    }
                }

                let now = Utc::now().naive_utc();
                for (id, position) in positions {
                    diesel::update(budget_categories::table.find(id))
                        .set((
                            budget_categories::sort_order.eq(position),
                            budget_categories::updated_at.eq(now),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                load_categories(conn, &family_id, true)
            })
            .await
    }

    async fn replace_allocations(
        &self,
        family_id: &str,
        income_event_id: &str,
        lines: Vec<AllocationLine>,
    ) -> Result<Vec<BudgetAllocation>> {
        let family_id = family_id.to_string();
        let income_event_id = income_event_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vec<BudgetAllocation>> {
                income_events::table
                    .filter(income_events::id.eq(&income_event_id))
                    .filter(income_events::family_id.eq(&family_id))
                    .select(income_events::id)
                    .first::<String>(conn)
                    .or_not_found("Income event", &income_event_id)?;

                diesel::delete(
                    budget_allocations::table
                        .filter(budget_allocations::income_event_id.eq(&income_event_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;

                let now = Utc::now().naive_utc();
                let rows: Vec<BudgetAllocationDB> = lines
                    .into_iter()
                    .map(|line| BudgetAllocationDB {
                        id: Uuid::new_v4().to_string(),
                        family_id: family_id.clone(),
                        income_event_id: income_event_id.clone(),
                        budget_category_id: line.budget_category_id,
                        percentage: line.percentage.normalize().to_string(),
                        amount: line.amount.to_string(),
                        created_at: now,
                    })
                    .collect();
                diesel::insert_into(budget_allocations::table)
                    .values(&rows)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(rows.into_iter().map(BudgetAllocation::from).collect())
            })
            .await
    }

    fn list_allocations(
        &self,
        family_id: &str,
        income_event_id: &str,
    ) -> Result<Vec<BudgetAllocation>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = budget_allocations::table
            .inner_join(budget_categories::table)
            .filter(budget_allocations::family_id.eq(family_id))
            .filter(budget_allocations::income_event_id.eq(income_event_id))
            .order((
                budget_categories::sort_order.asc(),
                budget_categories::name.asc(),
            ))
            .select(BudgetAllocationDB::as_select())
            .load::<BudgetAllocationDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(BudgetAllocation::from).collect())
    }

    fn list_allocations_between(
        &self,
        family_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<BudgetAllocation>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = budget_allocations::table
            .inner_join(income_events::table)
            .filter(budget_allocations::family_id.eq(family_id))
            .filter(
                income_events::scheduled_date
                    .between(start_date, end_date)
                    .or(income_events::actual_date.is_not_null()),
            )
            .select((
                BudgetAllocationDB::as_select(),
                income_events::status,
                income_events::scheduled_date,
                income_events::actual_date,
            ))
            .load::<(BudgetAllocationDB, String, NaiveDate, Option<NaiveDate>)>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(rows
            .into_iter()
            .filter(|(_, status, scheduled, actual)| {
                let effective = match actual {
                    Some(actual) if status == IncomeStatus::Received.as_str() => *actual,
                    _ => *scheduled,
                };
                effective >= start_date && effective <= end_date
            })
            .map(|(row, ..)| BudgetAllocation::from(row))
            .collect())
    }
}
