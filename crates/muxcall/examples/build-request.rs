//! Build a JSON request and walk its fields.
//!
//! Run with:
//!   cargo run --example build-request

use muxcall::buffer::BufferAllocator;
use muxcall::encoding::keys;
use muxcall::request::RequestBuilder;
use serde::Serialize;

#[derive(Serialize)]
struct Login<'a> {
    user: &'a str,
    token: &'a str,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .with_target(false)
        .init();

    let alloc = BufferAllocator::new();

    let mut builder = RequestBuilder::json("auth", "Login");
    builder
        .set_allocator(alloc.clone())?
        .set_timeout_ms(500)?
        .set_retry_limit(2)?
        .set_caller_name("gateway")?
        .set_header("tenant", "acme")?
        .set_body(&Login {
            user: "ada",
            token: "s3cr3t",
        })?;

    let request = builder.build()?;

    println!("built {request}");
    println!("  scheme        = {}", request.arg_scheme());
    println!(
        "  caller        = {}",
        request.transport_header(keys::CALLER_NAME_KEY).unwrap_or("-")
    );
    println!("  arg2 bytes    = {}", request.arg2().len());
    println!("  arg3 bytes    = {}", request.arg3().len());
    println!("  outstanding   = {}", alloc.outstanding());

    // The transport releases after the frame hits the wire.
    request.release();
    println!("  after release = {}", alloc.outstanding());

    Ok(())
}
