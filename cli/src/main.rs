use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    chanwatch_cli::run().await
}
