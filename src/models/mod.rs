pub mod user;
pub mod watchlist;
pub mod alert;
pub mod quote;

pub use user::CurrentUser;
pub use watchlist::WatchlistEntry;
pub use alert::{Alert, AlertCondition, AlertNotification};
pub use quote::Quote;
