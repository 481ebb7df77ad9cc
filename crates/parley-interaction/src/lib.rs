pub mod chat_completions;
mod http;
pub mod summarizer;
pub mod token_counter;
pub mod weather;

pub use chat_completions::ChatCompletionsClient;
pub use summarizer::InferenceSummarizer;
pub use token_counter::HeuristicTokenCounter;
pub use weather::OpenWeatherMapClient;
