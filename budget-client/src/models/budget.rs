use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseStats {
    pub total_amount: f64,
    pub count: u64,
    pub average_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    #[serde(rename = "_id")]
    pub id: String,
    pub key: String,
    pub name: String,
    pub amount_budgeted: f64,
    pub amount_spent: f64,
    pub expenses_stats: ExpenseStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSource {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub description: String,
    pub recurring: bool,
    pub frequency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub currency: String,
    pub currency_sym: String,
    pub year: i32,
    pub month: u32,
    pub amount_spent: f64,
    pub amount_budgeted: f64,
    pub budget_variance: f64,
    pub categories: Vec<BudgetCategory>,
    pub budget_sources: Vec<BudgetSource>,
    pub last_expense_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPage {
    pub budgets: Vec<Budget>,
    pub total: u64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query parameters for the budget list, mirroring the dashboard's
/// filter bar.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetListQuery {
    pub page: u32,
    pub limit: u32,
    pub sort_field: String,
    pub sort_order: SortOrder,
    pub budget_amount_filter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_filter: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_filter: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl Default for BudgetListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort_field: "year".to_string(),
            sort_order: SortOrder::Desc,
            budget_amount_filter: "all".to_string(),
            year_filter: None,
            month_filter: None,
            search_query: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MonthYearQuery {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekStats {
    pub total_spent: f64,
    pub count: u64,
    pub week: u32,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub average_weekly_spending: f64,
    pub peak_spending_week: WeekStats,
    pub weeks: Vec<WeekStats>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDate {
    pub date: String,
    pub amount: f64,
    pub count: u64,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub daily_average_transaction: f64,
    pub total_day_count: u64,
    pub unique_expense_dates: Vec<ExpenseDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCategory {
    #[serde(rename = "_id")]
    pub id: String,
    pub category_name: String,
    pub total_spent: f64,
    pub count: u64,
}

/// Aggregate the dashboard renders for the current month.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthAnalytics {
    pub year: i32,
    pub month_name: String,
    pub weekly_stats: WeeklyStats,
    pub monthly_trend: f64,
    pub top_category: TopCategory,
    pub daily_stats: DailyStats,
    pub total_expenses_count: u64,
    pub total_expenses_sum: f64,
    pub avg_expense_amount: f64,
    pub largest_transaction: f64,
}
