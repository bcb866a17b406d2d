pub mod auth;
pub mod budgets;
pub mod notifications;

pub use auth::AuthService;
pub use budgets::BudgetsApi;
pub use notifications::{FeedState, NotificationFeed, NotificationsApi};
