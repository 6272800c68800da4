use asic_scout::MinerFactory;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let target = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.1.0/24".to_string());

    let factory = MinerFactory::from_subnet(&target).expect("invalid subnet");
    println!("scanning {} ({} addresses)", target, factory.ip_count());

    let stream = factory.scan_stream_with_ip().expect("no targets");
    futures::pin_mut!(stream);
    let mut found = 0usize;
    while let Some((ip, miner)) = stream.next().await {
        found += 1;
        println!(
            "{ip}: {} {} ({}), hashing: {}",
            miner.device_info.make,
            miner.device_info.model,
            miner.firmware_version.as_deref().unwrap_or("unknown"),
            miner.is_mining,
        );
    }
    println!("done, {found} miners found");
}
