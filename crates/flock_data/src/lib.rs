//! Plain data types shared by the flock engine and its hosts.

pub mod data;

pub use data::agent::{heading_of, Agent, AgentId};
pub use data::group::{Group, GroupTable};
pub use glam::DVec2;
