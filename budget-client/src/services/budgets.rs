//! Read-side budget operations backing the dashboard.

use std::sync::Arc;

use client_core::error::ClientError;

use crate::http::ApiClient;
use crate::models::budget::{
    Budget, BudgetListQuery, BudgetPage, MonthAnalytics, MonthYearQuery,
};

pub struct BudgetsApi {
    api: Arc<ApiClient>,
}

impl BudgetsApi {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &BudgetListQuery) -> Result<BudgetPage, ClientError> {
        self.api.get_query("/user/budget/get-all", query).await
    }

    pub async fn current_month(&self) -> Result<Budget, ClientError> {
        self.api.get("/user/budget/current-budget").await
    }

    pub async fn by_id(&self, id: &str) -> Result<Budget, ClientError> {
        self.api.get(&format!("/user/budget/{}", id)).await
    }

    pub async fn by_month_and_year(&self, month: u32, year: i32) -> Result<Budget, ClientError> {
        self.api
            .get_query(
                "/user/budget/get-by-month-and-year",
                &MonthYearQuery { month, year },
            )
            .await
    }

    pub async fn current_month_analytics(
        &self,
        month: u32,
        year: i32,
    ) -> Result<MonthAnalytics, ClientError> {
        self.api
            .get_query(
                "/user/budget/current-month-analytics",
                &MonthYearQuery { month, year },
            )
            .await
    }
}
