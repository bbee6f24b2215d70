pub mod entities;

pub use entities::account::Role;
pub use entities::delivery::DeliveryStatus;
