pub mod file_sink;
pub mod http_client;

pub use file_sink::FileRecordSink;
pub use http_client::ReqwestDataSource;
