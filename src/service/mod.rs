pub mod background_jobs;
pub mod chat_service;
pub mod error;
pub mod realtime;
