pub mod ai;
pub mod gemini;
pub mod image_payload;
pub mod prompts;
pub mod recommend;
pub mod scheduler;
pub mod studio;
