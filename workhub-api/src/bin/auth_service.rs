//! Authentication service: registration, login and JWT issuance

use workhub_api::{config::ServiceKind, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::run(ServiceKind::Auth).await
}
