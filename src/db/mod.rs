pub mod chatdb;
pub mod db;
pub mod jobdb;
pub mod userdb;
