pub mod chat_llm;
pub mod evaluation_llm;
pub mod sse;
pub mod store;

pub use chat_llm::OpenAiChatAdapter;
pub use evaluation_llm::GeminiEvaluationAdapter;
pub use store::JsonFileStore;
