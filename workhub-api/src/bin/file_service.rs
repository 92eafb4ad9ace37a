//! File upload service

use workhub_api::{config::ServiceKind, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::run(ServiceKind::File).await
}
