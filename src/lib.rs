//! Study companion backend: quizzes generated from study material, a
//! scripted tutor, a demo summarizer, and a signed-in front for the remote
//! summaries API.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod generator;
pub mod logic;
pub mod openai;
pub mod protocol;
pub mod quiz;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod store;
pub mod summary;
pub mod task;
pub mod telemetry;
pub mod tutor;
pub mod util;
