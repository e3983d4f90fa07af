pub mod config;
pub mod list;
pub mod plan;
pub mod run;

pub use config::{ConfigAction, ConfigArgs};
pub use plan::PlanArgs;
pub use run::RunArgs;

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Token that is cancelled on the first Ctrl-C
pub fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, force-closing running injector");
            trigger.cancel();
        }
    });
    token
}
