pub mod fanout;
pub mod gateway;
pub mod http_client;

pub use fanout::{invoke_all, CompareOutcome};
pub use gateway::ChatGatewayClient;
pub use http_client::{HttpClient, HttpClientTrait};
