pub mod handlers;
pub mod monitor;
pub mod state;

pub use state::AppState;

use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// Sirve la API RPC hasta que el job termina.
///
/// Al terminar espera un intervalo de polling más, para que los workers que
/// siguen preguntando reciban EXIT, y cierra el servidor.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    poll_interval: Duration,
) -> anyhow::Result<()> {
    let app = handlers::build_router(state.clone());

    let shutdown = async move {
        tokio::select! {
            _ = monitor::wait_for_completion(state, poll_interval) => {
                info!("cerrando el coordinator en {:?}", poll_interval);
                tokio::time::sleep(poll_interval).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c recibido, cerrando el coordinator");
            }
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
