use rupture_bot::BoxError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), BoxError> {
    rupture_bot::run().await
}
