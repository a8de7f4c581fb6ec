//! Demo client for the multiplexer's gRPC surface.
//!
//! Dials the greeter over cleartext h2c by default, or over TLS when given
//! the server's certificate as a trust anchor.

use std::path::PathBuf;

use clap::Parser;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

use portmux::rpc::pb::greeter_client::GreeterClient;
use portmux::rpc::pb::HelloRequest;

#[derive(Parser)]
#[command(name = "greet")]
#[command(about = "Call SayHello on a portmux server", long_about = None)]
struct Cli {
    /// Server address (host:port).
    #[arg(short, long, default_value = "127.0.0.1:56789")]
    addr: String,

    /// Dial over TLS, trusting exactly this PEM certificate.
    #[arg(long)]
    ca: Option<PathBuf>,

    /// Hostname to verify the server certificate against.
    #[arg(long, default_value = "localhost")]
    domain: String,

    /// Name to greet.
    #[arg(default_value = "world")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let channel: Channel = match &cli.ca {
        Some(path) => {
            let anchor = Certificate::from_pem(std::fs::read(path)?);
            let tls = ClientTlsConfig::new()
                .ca_certificate(anchor)
                .domain_name(cli.domain.clone());

            Endpoint::from_shared(format!("https://{}", cli.addr))?
                .tls_config(tls)?
                .connect()
                .await?
        }
        None => {
            Endpoint::from_shared(format!("http://{}", cli.addr))?
                .connect()
                .await?
        }
    };

    let reply = GreeterClient::new(channel)
        .say_hello(HelloRequest {
            name: cli.name.clone(),
        })
        .await?
        .into_inner();

    println!("{}", reply.message);

    Ok(())
}
