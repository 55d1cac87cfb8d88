pub mod db;
pub mod dispatch;
pub mod models;
pub mod sender;
pub mod vapid;
pub use db::*;
pub use dispatch::Dispatcher;
pub use models::*;
pub use sender::{DeliveryOutcome, PushSender, WebPushSender};
pub use vapid::VapidKeys;
