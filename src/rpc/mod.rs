//! The gRPC engine boundary.
//!
//! The dispatcher hands classified RPC exchanges to the tonic service built
//! here; tonic owns framing, multiplexing, and response encoding from that
//! point forward, including per-exchange cancellation.

use tonic::{Request, Response, Status};

pub mod pb {
    tonic::include_proto!("greeter");
}

use pb::greeter_server::{Greeter, GreeterServer};
use pb::{HelloReply, HelloRequest};

/// Echo-style greeter standing in for a real RPC surface.
#[derive(Debug, Default, Clone)]
pub struct GreeterService;

#[tonic::async_trait]
impl Greeter for GreeterService {
    async fn say_hello(
        &self,
        request: Request<HelloRequest>,
    ) -> Result<Response<HelloReply>, Status> {
        let name = request.into_inner().name;

        Ok(Response::new(HelloReply {
            message: format!("Hello {name}"),
        }))
    }
}

/// Build the service the dispatcher forwards classified RPC traffic to.
pub fn service() -> GreeterServer<GreeterService> {
    GreeterServer::new(GreeterService)
}
