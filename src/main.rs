use folioscan::{
    api::{self, AppState},
    assets::MemoryAssetStore,
    config,
    logging,
    metrics::PipelineMetrics,
    outline::IndexGenerator,
    pipeline::{PipelineOptions, PipelineService},
    recognition::HttpRecognitionClient,
    search::HybridSearchEngine,
    split::BundleSplitter,
    store::MemoryStore,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    config::init_config();

    let app = api::create_router(build_state());
    let (listener, port) = bind_listener().await?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state() -> Arc<AppState> {
    let config = config::get_config();

    let store: Arc<dyn folioscan::store::DocumentStore> = Arc::new(MemoryStore::new());
    let assets: Arc<dyn folioscan::assets::AssetStore> = Arc::new(MemoryAssetStore::new());
    let recognition: Arc<dyn folioscan::recognition::RecognitionClient> =
        Arc::new(HttpRecognitionClient::from_config());
    let metrics = Arc::new(PipelineMetrics::new());

    let generator = Arc::new(IndexGenerator::new(
        store.clone(),
        recognition.clone(),
        config.outline_input_budget(),
    ));
    let pipeline = Arc::new(PipelineService::new(
        store.clone(),
        assets.clone(),
        recognition.clone(),
        Arc::new(BundleSplitter::new()),
        generator,
        metrics.clone(),
        PipelineOptions {
            embedding_dimension: config.embedding_dimension,
            count_failed_pages: config.count_failed_pages(),
        },
    ));
    let search = Arc::new(HybridSearchEngine::new(
        store.clone(),
        recognition.clone(),
        config.search_top_k(),
        config.search_result_limit(),
    ));

    Arc::new(AppState {
        store,
        assets,
        pipeline,
        search,
        metrics,
    })
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let config = config::get_config();
    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 7300..=7399;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 7300-7399",
    ))
}
