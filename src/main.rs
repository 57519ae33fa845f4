use std::process::ExitCode;

#[rocket::main]
async fn main() -> ExitCode {
    match iot_stats::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // The subscriber may not be installed yet if configuration failed.
            tracing::error!(error = %err, "startup failed");
            eprintln!("iot-stats: {err}");
            ExitCode::from(1)
        }
    }
}
