//! Print the retrievable properties of a Marketing Cloud object type.
//!
//! ```sh
//! export MC_CLIENT_ID=... MC_CLIENT_SECRET=... MC_WSDL_LOCAL_PATH=/tmp/etframework.wsdl
//! RUST_LOG=busbar_mc_soap=debug cargo run --bin describe-object -- Subscriber
//! ```

use busbar_mc_resources::{ClientFactory, ClientSettings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let resource = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: describe-object <resource name>");
        std::process::exit(2);
    });

    let settings = ClientSettings::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!();
        eprintln!("  Set MC_CLIENT_ID, MC_CLIENT_SECRET and MC_WSDL_LOCAL_PATH.");
        std::process::exit(1);
    });

    let mut factory = ClientFactory::new(settings).unwrap_or_else(|e| fail(e));
    let mut client = factory.make().await.unwrap_or_else(|e| fail(e));
    let mut handle = client.resource(&resource).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("Known resources: {}", known_resources());
        std::process::exit(1);
    });

    let definition = handle.describe().await.unwrap_or_else(|e| fail(e));
    tracing::debug!(
        object_type = definition.object_type(),
        properties = definition.properties().len(),
        "Described"
    );
    println!("{} ({})", resource, definition.object_type());
    for name in definition.retrievable_property_names() {
        println!("  {name}");
    }
}

fn known_resources() -> String {
    busbar_mc_resources::ResourceRegistry::standard()
        .names()
        .join(", ")
}

fn fail(err: busbar_mc_resources::Error) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}
