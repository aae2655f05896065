#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hotel_admin_lib::run().await
}
