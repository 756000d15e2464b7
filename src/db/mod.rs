pub mod chatdb;
pub mod db;
pub mod escrowdb;
pub mod marketdb;
pub mod userdb;
