use clap::Parser;
use digitalocean_exporter::digitalocean::{
    DigitalOceanCollector, DigitalOceanService, Droplet, FloatingIp, Inventory, LoadBalancer, Tag,
    TaggedResources, Volume,
};
use digitalocean_exporter::encoding::text::{encode, CONTENT_TYPE};
use digitalocean_exporter::registry::Registry;
use http_body_util::{combinators, BodyExt, Full};
use hyper::{
    body::{Bytes, Incoming},
    server::conn::http1,
    service::service_fn,
    Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use std::{future::Future, io, net::SocketAddr, pin::Pin, sync::Arc};
use tokio::{
    net::TcpListener,
    pin,
    signal::unix::{signal, SignalKind},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Serves the metrics of a fixed, in-memory DigitalOcean account.
#[derive(Debug, Parser)]
struct Args {
    /// Address to serve metrics on.
    #[arg(long, default_value = "127.0.0.1:9212")]
    listen_address: SocketAddr,

    /// Path to serve metrics on.
    #[arg(long, default_value = "/metrics")]
    metrics_path: String,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let inventory = Inventory {
        droplets: vec![
            Droplet::new("nyc1", "s-1vcpu-1gb", "active"),
            Droplet::new("nyc1", "s-1vcpu-1gb", "active"),
            Droplet::new("ams3", "s-2vcpu-4gb", "off"),
        ],
        floating_ips: vec![FloatingIp::new("nyc1", Some(1)), FloatingIp::new("nyc1", None)],
        load_balancers: vec![LoadBalancer::new("nyc1", "active")],
        tags: vec![Tag::new("web", vec![TaggedResources::new("droplets", 2)])],
        volumes: vec![Volume::new("nyc1", 100, vec![1])],
    };

    let registry = Registry::default();
    registry
        .register(Box::new(DigitalOceanCollector::new(DigitalOceanService::new(
            inventory,
        ))))
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    start_metrics_server(args.listen_address, args.metrics_path, registry).await
}

/// Start a HTTP server to report metrics.
pub async fn start_metrics_server(
    metrics_addr: SocketAddr,
    metrics_path: String,
    registry: Registry,
) -> io::Result<()> {
    info!(%metrics_addr, %metrics_path, "starting metrics server");

    let registry = Arc::new(registry);
    let metrics_path = Arc::new(metrics_path);

    let tcp_listener = TcpListener::bind(metrics_addr).await?;
    let server = http1::Builder::new();
    while let Ok((stream, _)) = tcp_listener.accept().await {
        let mut shutdown_stream = signal(SignalKind::terminate())?;
        let io = TokioIo::new(stream);
        let server_clone = server.clone();
        let handler = make_handler(registry.clone(), metrics_path.clone());
        tokio::task::spawn(async move {
            let conn = server_clone.serve_connection(io, service_fn(handler));
            pin!(conn);
            tokio::select! {
                _ = conn.as_mut() => {}
                _ = shutdown_stream.recv() => {
                    conn.as_mut().graceful_shutdown();
                }
            }
        });
    }

    Ok(())
}

/// Boxed HTTP body for responses
type BoxBody = combinators::BoxBody<Bytes, hyper::Error>;

/// This function returns a HTTP handler (i.e. another function)
pub fn make_handler(
    registry: Arc<Registry>,
    metrics_path: Arc<String>,
) -> impl Fn(Request<Incoming>) -> Pin<Box<dyn Future<Output = io::Result<Response<BoxBody>>> + Send>>
{
    // Gathering queries the account; run it off the async workers.
    move |req: Request<Incoming>| {
        let reg = registry.clone();
        let path_matches = req.uri().path() == metrics_path.as_str();

        Box::pin(async move {
            if !path_matches {
                return respond(StatusCode::NOT_FOUND, "text/plain", "not found\n".to_string());
            }

            let gathered = tokio::task::spawn_blocking(move || reg.gather())
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

            // Any collection error fails the whole scrape.
            if let Some(e) = gathered.errors().first() {
                error!(error = %e, "scrape failed");
                return respond(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain",
                    format!("error gathering metrics: {e}\n"),
                );
            }

            let mut buf = String::new();
            encode(&mut buf, gathered.families())
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            respond(StatusCode::OK, CONTENT_TYPE, buf)
        })
    }
}

fn respond(status: StatusCode, content_type: &str, body: String) -> io::Result<Response<BoxBody>> {
    Response::builder()
        .status(status)
        .header(hyper::header::CONTENT_TYPE, content_type)
        .body(full(Bytes::from(body)))
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// helper function to build a full boxed body
pub fn full(body: Bytes) -> BoxBody {
    Full::new(body).map_err(|never| match never {}).boxed()
}
