pub mod llm;
pub mod rounds;
