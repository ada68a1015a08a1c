pub mod agent_webhook;
pub mod health;
pub mod messages;
pub mod rooms;
